use std::cmp::Ordering;
use std::sync::Arc;

use time::Date;

use crate::format::{display_date, format_currency};

/// Typed cell content. Sorting compares the typed value, so numbers and dates
/// order numerically and chronologically rather than by their display text.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Money(f64),
    Date(Date),
}

impl CellValue {
    pub fn text(v: impl Into<String>) -> Self {
        CellValue::Text(v.into())
    }

    pub fn opt_text(v: Option<&str>) -> Self {
        match v.map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => CellValue::Text(s.to_string()),
            None => CellValue::Empty,
        }
    }

    pub fn display(&self) -> String {
        match self {
            CellValue::Empty => "-".to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{:.2}", n)
                }
            }
            CellValue::Money(n) => format_currency(*n),
            CellValue::Date(d) => display_date(*d),
        }
    }

    /// Text the search box matches against. Empty cells never match.
    pub fn search_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            other => Some(other.display()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            CellValue::Number(_) | CellValue::Money(_) => 0,
            CellValue::Date(_) => 1,
            CellValue::Text(_) => 2,
            CellValue::Empty => 3,
        }
    }

    /// Total order: numbers, then dates, then text (case-insensitive), then empty cells.
    pub fn compare(&self, other: &CellValue) -> Ordering {
        use CellValue::*;
        match (self, other) {
            (Number(a) | Money(a), Number(b) | Money(b)) => a.total_cmp(b),
            (Date(a), Date(b)) => a.cmp(b),
            (Text(a), Text(b)) => a
                .to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b)),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

type Accessor<T> = Arc<dyn Fn(&T) -> CellValue + Send + Sync>;
type Comparator<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// Header label plus how to read and order the column's value from a record.
pub struct Column<T> {
    pub header: String,
    accessor: Accessor<T>,
    comparator: Option<Comparator<T>>,
    sortable: bool,
}

impl<T> Clone for Column<T> {
    fn clone(&self) -> Self {
        Column {
            header: self.header.clone(),
            accessor: self.accessor.clone(),
            comparator: self.comparator.clone(),
            sortable: self.sortable,
        }
    }
}

impl<T> std::fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Column")
            .field("header", &self.header)
            .field("sortable", &self.sortable)
            .finish()
    }
}

impl<T> Column<T> {
    pub fn new(header: &str, accessor: impl Fn(&T) -> CellValue + Send + Sync + 'static) -> Self {
        Column {
            header: header.to_string(),
            accessor: Arc::new(accessor),
            comparator: None,
            sortable: true,
        }
    }

    pub fn with_comparator(mut self, cmp: impl Fn(&T, &T) -> Ordering + Send + Sync + 'static) -> Self {
        self.comparator = Some(Arc::new(cmp));
        self
    }

    pub fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    pub fn is_sortable(&self) -> bool {
        self.sortable
    }

    pub fn value(&self, record: &T) -> CellValue {
        (self.accessor)(record)
    }

    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        match &self.comparator {
            Some(cmp) => cmp(a, b),
            None => self.value(a).compare(&self.value(b)),
        }
    }

    /// Like [`Column::compare`], reversed when `descending`. Empty cells stay
    /// last in both directions.
    pub fn compare_directed(&self, a: &T, b: &T, descending: bool) -> Ordering {
        if let Some(cmp) = &self.comparator {
            let ord = cmp(a, b);
            return if descending { ord.reverse() } else { ord };
        }
        let (va, vb) = (self.value(a), self.value(b));
        match (&va, &vb) {
            (CellValue::Empty, CellValue::Empty) => Ordering::Equal,
            (CellValue::Empty, _) => Ordering::Greater,
            (_, CellValue::Empty) => Ordering::Less,
            _ if descending => va.compare(&vb).reverse(),
            _ => va.compare(&vb),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn numbers_compare_numerically() {
        let nine = CellValue::Number(9.0);
        let ten = CellValue::Number(10.0);
        assert_eq!(nine.compare(&ten), Ordering::Less);
        assert_eq!(CellValue::text("9").compare(&CellValue::text("10")), Ordering::Greater);
    }

    #[test]
    fn dates_compare_chronologically() {
        let a = CellValue::Date(date!(2023 - 12 - 31));
        let b = CellValue::Date(date!(2024 - 01 - 01));
        assert_eq!(a.compare(&b), Ordering::Less);
    }

    #[test]
    fn empty_cells_sort_last() {
        assert_eq!(CellValue::Empty.compare(&CellValue::text("a")), Ordering::Greater);
        assert_eq!(CellValue::opt_text(Some("  ")), CellValue::Empty);
    }

    #[test]
    fn display_formats_by_kind() {
        assert_eq!(CellValue::Number(12.0).display(), "12");
        assert_eq!(CellValue::Number(2.5).display(), "2.50");
        assert_eq!(CellValue::Money(1234.0).display(), "1,234.00");
        assert_eq!(CellValue::Empty.display(), "-");
    }

    #[test]
    fn empty_cells_have_no_search_text() {
        assert_eq!(CellValue::Empty.search_text(), None);
        assert_eq!(CellValue::Money(10.0).search_text().as_deref(), Some("10.00"));
    }
}
