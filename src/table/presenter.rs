use std::fmt;

use super::actions::{ActionOutcome, RowAction, RowActions};
use super::column::Column;
use crate::dialog::{Choice, Dialog};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSize {
    Five,
    Ten,
    Twenty,
    Fifty,
    Hundred,
    All,
}

impl PageSize {
    pub const CHOICES: [PageSize; 6] = [
        PageSize::Five,
        PageSize::Ten,
        PageSize::Twenty,
        PageSize::Fifty,
        PageSize::Hundred,
        PageSize::All,
    ];

    /// Rows per page; `None` shows everything on one page.
    pub fn limit(&self) -> Option<usize> {
        match self {
            PageSize::Five => Some(5),
            PageSize::Ten => Some(10),
            PageSize::Twenty => Some(20),
            PageSize::Fifty => Some(50),
            PageSize::Hundred => Some(100),
            PageSize::All => None,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "5" => Some(PageSize::Five),
            "10" => Some(PageSize::Ten),
            "20" => Some(PageSize::Twenty),
            "50" => Some(PageSize::Fifty),
            "100" => Some(PageSize::Hundred),
            "all" => Some(PageSize::All),
            _ => None,
        }
    }

    pub fn from_limit(n: usize) -> Option<Self> {
        Self::CHOICES.into_iter().find(|p| p.limit() == Some(n))
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.limit() {
            Some(n) => write!(f, "{n}"),
            None => f.write_str("all"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderCell {
    pub label: String,
    pub sort: Option<SortDirection>,
    pub sortable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowView {
    pub cells: Vec<String>,
    pub actions: Vec<RowAction>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableView {
    Empty {
        headers: Vec<HeaderCell>,
        message: String,
    },
    Rows {
        headers: Vec<HeaderCell>,
        rows: Vec<RowView>,
        page: usize,
        page_count: usize,
        total: usize,
    },
}

/// Client-side table state: records, search, sort and the current page.
///
/// Search runs over the full collection; sorting and paging apply to the
/// filtered result.
pub struct TablePresenter<T> {
    columns: Vec<Column<T>>,
    records: Vec<T>,
    search: String,
    sort: Option<(usize, SortDirection)>,
    page_size: PageSize,
    page: usize,
    actions: RowActions<T>,
    empty_message: String,
}

impl<T> TablePresenter<T> {
    pub fn new(columns: Vec<Column<T>>, page_size: PageSize) -> Self {
        TablePresenter {
            columns,
            records: Vec::new(),
            search: String::new(),
            sort: None,
            page_size,
            page: 1,
            actions: RowActions::default(),
            empty_message: "No records found".to_string(),
        }
    }

    pub fn with_actions(mut self, actions: RowActions<T>) -> Self {
        self.actions = actions;
        self
    }

    pub fn with_empty_message(mut self, message: &str) -> Self {
        self.empty_message = message.to_string();
        self
    }

    pub fn columns(&self) -> &[Column<T>] {
        &self.columns
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    /// Replaces the collection and goes back to the first page.
    pub fn set_records(&mut self, records: Vec<T>) {
        self.records = records;
        self.page = 1;
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, query: &str) {
        let query = query.trim().to_string();
        if query != self.search {
            self.search = query;
            self.page = 1;
        }
    }

    pub fn sort_state(&self) -> Option<(usize, SortDirection)> {
        self.sort
    }

    /// Ascending, then descending, then back to insertion order. Another column starts at ascending.
    pub fn toggle_sort(&mut self, column: usize) -> Option<(usize, SortDirection)> {
        if !self.columns.get(column).is_some_and(|c| c.is_sortable()) {
            return self.sort;
        }
        self.sort = match self.sort {
            Some((c, SortDirection::Ascending)) if c == column => Some((column, SortDirection::Descending)),
            Some((c, SortDirection::Descending)) if c == column => None,
            _ => Some((column, SortDirection::Ascending)),
        };
        self.sort
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub fn set_page_size(&mut self, size: PageSize) {
        self.page_size = size;
        self.page = 1;
    }

    pub fn page(&self) -> usize {
        self.page.clamp(1, self.page_count())
    }

    /// Clamped to `[1, page_count]`.
    pub fn set_page(&mut self, page: usize) -> usize {
        self.page = page.clamp(1, self.page_count());
        self.page
    }

    pub fn page_count(&self) -> usize {
        let n = self.filtered_indices().len();
        match self.page_size.limit() {
            _ if n == 0 => 1,
            Some(p) => n.div_ceil(p),
            None => 1,
        }
    }

    fn matches(&self, record: &T, needle: &str) -> bool {
        self.columns
            .iter()
            .filter_map(|c| c.value(record).search_text())
            .any(|text| text.to_lowercase().contains(needle))
    }

    /// Indices into `records` after filtering and (stable) sorting.
    pub fn filtered_indices(&self) -> Vec<usize> {
        let needle = self.search.to_lowercase();
        let mut idx: Vec<usize> = (0..self.records.len())
            .filter(|&i| needle.is_empty() || self.matches(&self.records[i], &needle))
            .collect();

        if let Some((col, dir)) = self.sort {
            if let Some(column) = self.columns.get(col) {
                let descending = dir == SortDirection::Descending;
                idx.sort_by(|&a, &b| column.compare_directed(&self.records[a], &self.records[b], descending));
            }
        }
        idx
    }

    pub fn filtered_records(&self) -> Vec<&T> {
        self.filtered_indices().into_iter().map(|i| &self.records[i]).collect()
    }

    fn page_indices(&self) -> Vec<usize> {
        let all = self.filtered_indices();
        match self.page_size.limit() {
            None => all,
            Some(p) => {
                let start = (self.page() - 1) * p;
                all.into_iter().skip(start).take(p).collect()
            }
        }
    }

    pub fn page_records(&self) -> Vec<&T> {
        self.page_indices().into_iter().map(|i| &self.records[i]).collect()
    }

    fn headers(&self) -> Vec<HeaderCell> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, c)| HeaderCell {
                label: c.header.clone(),
                sort: self.sort.filter(|(col, _)| *col == i).map(|(_, d)| d),
                sortable: c.is_sortable(),
            })
            .collect()
    }

    pub fn view(&self) -> TableView {
        let headers = self.headers();
        let total = self.filtered_indices().len();
        if total == 0 {
            return TableView::Empty {
                headers,
                message: self.empty_message.clone(),
            };
        }

        let actions = self.actions.available();
        let rows = self
            .page_records()
            .into_iter()
            .map(|r| RowView {
                cells: self.columns.iter().map(|c| c.value(r).display()).collect(),
                actions: actions.clone(),
            })
            .collect();

        TableView::Rows {
            headers,
            rows,
            page: self.page(),
            page_count: self.page_count(),
            total,
        }
    }

    /// Record shown at `row` on the current page.
    pub fn row(&self, row: usize) -> Option<&T> {
        self.page_indices().get(row).map(|&i| &self.records[i])
    }
}

impl<T: Clone + Send + 'static> TablePresenter<T> {
    /// Runs a row action. Delete asks `dialog` first; cancelling leaves the
    /// table untouched and the handler is never called.
    pub async fn trigger(&self, action: RowAction, row: usize, dialog: &dyn Dialog) -> Result<ActionOutcome> {
        let (Some(handler), Some(record)) = (self.actions.handler(action), self.row(row)) else {
            return Ok(ActionOutcome::Unavailable);
        };

        if action == RowAction::Delete
            && dialog.confirm("Are you sure you want to delete this record?").await == Choice::Cancel
        {
            tracing::debug!(row, "delete cancelled");
            return Ok(ActionOutcome::Cancelled);
        }

        let handler = handler.clone();
        handler(record.clone()).await?;
        Ok(ActionOutcome::Performed)
    }

    pub async fn request_delete(&self, row: usize, dialog: &dyn Dialog) -> Result<ActionOutcome> {
        self.trigger(RowAction::Delete, row, dialog).await
    }
}

impl fmt::Display for TableView {
    /// Plain-text rendering with padded columns, used by the CLI.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (headers, rows) = match self {
            TableView::Empty { headers, message } => {
                let labels: Vec<&str> = headers.iter().map(|h| h.label.as_str()).collect();
                writeln!(f, "{}", labels.join(" | "))?;
                return writeln!(f, "{message}");
            }
            TableView::Rows { headers, rows, .. } => (headers, rows),
        };

        let label = |h: &HeaderCell| match h.sort {
            Some(SortDirection::Ascending) => format!("{} ^", h.label),
            Some(SortDirection::Descending) => format!("{} v", h.label),
            None => h.label.clone(),
        };
        let mut widths: Vec<usize> = headers.iter().map(|h| label(h).chars().count()).collect();
        for row in rows {
            for (w, cell) in widths.iter_mut().zip(&row.cells) {
                *w = (*w).max(cell.chars().count());
            }
        }

        let line = |cells: Vec<String>| -> String {
            cells
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{:<width$}", c, width = *w))
                .collect::<Vec<_>>()
                .join(" | ")
        };

        writeln!(f, "{}", line(headers.iter().map(label).collect()))?;
        writeln!(f, "{}", widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("-+-"))?;
        for row in rows {
            let mut text = line(row.cells.clone());
            if !row.actions.is_empty() {
                let actions: Vec<&str> = row.actions.iter().map(|a| a.label()).collect();
                text.push_str(&format!("  [{}]", actions.join(", ")));
            }
            writeln!(f, "{}", text.trim_end())?;
        }

        if let TableView::Rows { page, page_count, total, .. } = self {
            writeln!(f, "page {page} of {page_count} ({total} records)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::{FixedAnswer, ScriptedDialog};
    use crate::table::{handler, CellValue, RowActions};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        name: &'static str,
        kind: &'static str,
        qty: f64,
    }

    fn items() -> Vec<Item> {
        vec![
            Item { name: "Bolt", kind: "direct", qty: 10.0 },
            Item { name: "Nut", kind: "indirect", qty: 9.0 },
            Item { name: "Washer", kind: "direct", qty: 100.0 },
            Item { name: "Grease", kind: "Indirect", qty: 9.0 },
            Item { name: "Rivet", kind: "direct", qty: 2.0 },
        ]
    }

    fn columns() -> Vec<Column<Item>> {
        vec![
            Column::new("Name", |i: &Item| CellValue::text(i.name)),
            Column::new("Kind", |i: &Item| CellValue::text(i.kind)),
            Column::new("Qty", |i: &Item| CellValue::Number(i.qty)),
        ]
    }

    fn presenter(size: PageSize) -> TablePresenter<Item> {
        let mut p = TablePresenter::new(columns(), size);
        p.set_records(items());
        p
    }

    fn names(p: &TablePresenter<Item>) -> Vec<&'static str> {
        p.filtered_records().iter().map(|i| i.name).collect()
    }

    #[test]
    fn page_count_is_ceiling_and_pages_cover_everything_once() {
        for size in PageSize::CHOICES {
            for n in 0..=23usize {
                let records: Vec<Item> = (0..n).map(|_| items()[0].clone()).collect();
                let mut p = TablePresenter::new(columns(), size);
                p.set_records(records);

                let expected = match size.limit() {
                    _ if n == 0 => 1,
                    Some(limit) => n.div_ceil(limit),
                    None => 1,
                };
                assert_eq!(p.page_count(), expected, "n={n} size={size}");

                let mut seen = 0;
                for page in 1..=p.page_count() {
                    p.set_page(page);
                    seen += p.page_records().len();
                }
                assert_eq!(seen, n);
            }
        }
    }

    #[test]
    fn concatenated_pages_reproduce_sorted_collection() {
        let mut p = presenter(PageSize::Five);
        p.set_records(items().into_iter().cycle().take(12).collect());
        p.toggle_sort(2);
        let full: Vec<Item> = p.filtered_records().into_iter().cloned().collect();
        let mut joined = Vec::new();
        for page in 1..=p.page_count() {
            p.set_page(page);
            joined.extend(p.page_records().into_iter().cloned());
        }
        assert_eq!(joined, full);
    }

    #[test]
    fn three_toggles_restore_insertion_order() {
        let mut p = presenter(PageSize::All);
        let original = names(&p);
        assert_eq!(p.toggle_sort(0), Some((0, SortDirection::Ascending)));
        assert_eq!(names(&p), vec!["Bolt", "Grease", "Nut", "Rivet", "Washer"]);
        assert_eq!(p.toggle_sort(0), Some((0, SortDirection::Descending)));
        assert_eq!(p.toggle_sort(0), None);
        assert_eq!(names(&p), original);
    }

    #[test]
    fn numeric_sort_is_stable() {
        let mut p = presenter(PageSize::All);
        p.toggle_sort(2);
        // Nut and Grease share qty 9 and keep their original order.
        assert_eq!(names(&p), vec!["Rivet", "Nut", "Grease", "Bolt", "Washer"]);
        p.toggle_sort(2);
        assert_eq!(names(&p), vec!["Washer", "Bolt", "Nut", "Grease", "Rivet"]);
    }

    #[test]
    fn search_is_case_insensitive_and_applied_before_paging() {
        let mut p = presenter(PageSize::Five);
        p.set_page(1);
        p.set_search("INDIRECT");
        assert_eq!(names(&p), vec!["Nut", "Grease"]);
        assert_eq!(p.page_count(), 1);
    }

    #[derive(Debug, Clone)]
    struct Doc {
        no: &'static str,
        hsn: Option<&'static str>,
    }

    fn docs() -> TablePresenter<Doc> {
        let mut p = TablePresenter::new(
            vec![
                Column::new("No", |d: &Doc| CellValue::text(d.no)),
                Column::new("HSN", |d: &Doc| CellValue::opt_text(d.hsn)),
            ],
            PageSize::All,
        );
        p.set_records(vec![
            Doc { no: "INV-001", hsn: Some("8544") },
            Doc { no: "PO7", hsn: None },
            Doc { no: "INV-003", hsn: Some("7318") },
        ]);
        p
    }

    fn doc_numbers(p: &TablePresenter<Doc>) -> Vec<&'static str> {
        p.filtered_records().iter().map(|d| d.no).collect()
    }

    #[test]
    fn placeholder_of_empty_cells_is_not_searchable() {
        let mut p = docs();
        p.set_search("-");
        assert_eq!(doc_numbers(&p), vec!["INV-001", "INV-003"]);
    }

    #[test]
    fn empty_cells_stay_last_in_both_directions() {
        let mut p = docs();
        p.toggle_sort(1);
        assert_eq!(doc_numbers(&p), vec!["INV-003", "INV-001", "PO7"]);
        p.toggle_sort(1);
        assert_eq!(doc_numbers(&p), vec!["INV-001", "INV-003", "PO7"]);
    }

    #[test]
    fn changing_records_or_search_resets_page() {
        let mut p = TablePresenter::new(columns(), PageSize::Five);
        p.set_records(items().into_iter().cycle().take(20).collect());
        assert_eq!(p.set_page(3), 3);
        p.set_search("bolt");
        assert_eq!(p.page(), 1);
        p.set_search("");
        p.set_page(4);
        p.set_records(items());
        assert_eq!(p.page(), 1);
    }

    #[test]
    fn page_is_clamped() {
        let mut p = presenter(PageSize::Five);
        assert_eq!(p.set_page(0), 1);
        assert_eq!(p.set_page(99), 1);
    }

    #[test]
    fn empty_collection_renders_empty_state() {
        let mut p = presenter(PageSize::Ten);
        p.set_search("no such thing");
        match p.view() {
            TableView::Empty { headers, message } => {
                assert_eq!(headers.len(), 3);
                assert_eq!(message, "No records found");
            }
            other => panic!("expected empty state, got {other:?}"),
        }
    }

    #[test]
    fn only_registered_actions_are_offered() {
        let noop = handler(|_: Item| async { Ok(()) });
        let p = presenter(PageSize::Ten).with_actions(RowActions::new().on(RowAction::Edit, noop));
        match p.view() {
            TableView::Rows { rows, .. } => assert_eq!(rows[0].actions, vec![RowAction::Edit]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancelled_delete_leaves_records_and_skips_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let on_delete = handler(move |_: Item| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        });
        let p = presenter(PageSize::Ten).with_actions(RowActions::new().on(RowAction::Delete, on_delete));

        let dialog = ScriptedDialog::new().with_confirm(Choice::Cancel);
        let outcome = p.request_delete(0, &dialog).await.unwrap();
        assert_eq!(outcome, ActionOutcome::Cancelled);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(p.records(), items().as_slice());
        assert_eq!(dialog.asked().len(), 1);

        let outcome = p.request_delete(0, &FixedAnswer(Choice::Confirm)).await.unwrap();
        assert_eq!(outcome, ActionOutcome::Performed);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_action_is_unavailable() {
        let p = presenter(PageSize::Ten);
        let outcome = p.trigger(RowAction::Approve, 0, &FixedAnswer(Choice::Confirm)).await.unwrap();
        assert_eq!(outcome, ActionOutcome::Unavailable);
    }
}
