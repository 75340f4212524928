use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use super::{Listing, LoadTicket, Notice};
use crate::api::Backend;
use crate::dialog::Dialog;
use crate::document::{render_invoice, InvoiceDocument};
use crate::error::{DashboardError, Result};
use crate::format::parse_date;
use crate::models::InvoiceRecord;
use crate::table::{handler, ActionOutcome, CellValue, Column, PageSize, RowAction, RowActions, TablePresenter};

fn invoice_columns() -> Vec<Column<InvoiceRecord>> {
    vec![
        Column::new("Invoice No", |i: &InvoiceRecord| CellValue::opt_text(i.invoice_no.as_deref())),
        Column::new("Date", |i: &InvoiceRecord| match i.invoice_date.as_deref() {
            Some(raw) => parse_date(raw).map(CellValue::Date).unwrap_or_else(|| CellValue::text(raw)),
            None => CellValue::Empty,
        }),
        Column::new("Party", |i: &InvoiceRecord| {
            CellValue::opt_text(i.counterparty.as_ref().and_then(|c| c.party().name.as_deref()))
        }),
        Column::new("Store", |i: &InvoiceRecord| {
            CellValue::opt_text(i.store.as_ref().and_then(|s| s.label()))
        }),
        Column::new("Category", |i: &InvoiceRecord| CellValue::opt_text(i.category.as_deref())),
        Column::new("Total", |i: &InvoiceRecord| CellValue::Money(i.total)),
        Column::new("Balance", |i: &InvoiceRecord| CellValue::Money(i.balance)),
    ]
}

/// Invoice listing. "Download" renders the PDF locally and saves it.
pub struct InvoicesPage {
    backend: Arc<dyn Backend>,
    listing: Listing<InvoiceRecord>,
    viewing: Arc<Mutex<Option<InvoiceRecord>>>,
}

impl InvoicesPage {
    pub fn new(backend: Arc<dyn Backend>, page_size: PageSize) -> Self {
        let viewing: Arc<Mutex<Option<InvoiceRecord>>> = Arc::new(Mutex::new(None));
        let slot = viewing.clone();
        let remover = backend.clone();

        let actions = RowActions::new()
            .on(
                RowAction::View,
                handler(move |inv: InvoiceRecord| {
                    if let Ok(mut s) = slot.lock() {
                        *s = Some(inv);
                    }
                    async { Ok(()) }
                }),
            )
            .on(
                RowAction::Delete,
                handler(move |inv: InvoiceRecord| {
                    let backend = remover.clone();
                    async move {
                        let id = inv
                            .id
                            .clone()
                            .ok_or_else(|| DashboardError::validation("id", "invoice has no id"))?;
                        backend.delete_invoice(&id).await?;
                        tracing::info!(id = %id, "invoice deleted");
                        Ok(())
                    }
                }),
            );

        let table = TablePresenter::new(invoice_columns(), page_size)
            .with_actions(actions)
            .with_empty_message("No invoices found");

        InvoicesPage {
            backend,
            listing: Listing::new(table),
            viewing,
        }
    }

    pub fn table(&self) -> &TablePresenter<InvoiceRecord> {
        &self.listing.table
    }

    pub fn table_mut(&mut self) -> &mut TablePresenter<InvoiceRecord> {
        &mut self.listing.table
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.listing.notice()
    }

    pub fn begin_load(&mut self) -> LoadTicket {
        self.listing.begin()
    }

    pub fn fetch(&self) -> BoxFuture<'static, Result<Vec<InvoiceRecord>>> {
        let backend = self.backend.clone();
        async move { backend.list_invoices().await }.boxed()
    }

    pub fn finish_load(&mut self, ticket: LoadTicket, result: Result<Vec<InvoiceRecord>>) -> bool {
        self.listing.finish(ticket, result)
    }

    pub async fn refresh(&mut self) {
        let ticket = self.begin_load();
        let result = self.fetch().await;
        self.finish_load(ticket, result);
    }

    pub fn close(&mut self) {
        self.listing.close();
    }

    /// Invoice shown in the view drawer, if the row exists.
    pub async fn view(&mut self, row: usize, dialog: &dyn Dialog) -> Option<InvoiceRecord> {
        match self.listing.table.trigger(RowAction::View, row, dialog).await {
            Ok(ActionOutcome::Performed) => self.viewing.lock().ok().and_then(|mut s| s.take()),
            _ => None,
        }
    }

    /// Confirms, deletes, refetches. Returns whether the invoice was deleted.
    pub async fn request_delete(&mut self, row: usize, dialog: &dyn Dialog) -> bool {
        match self.listing.table.request_delete(row, dialog).await {
            Ok(ActionOutcome::Performed) => {
                self.refresh().await;
                true
            }
            Ok(_) => false,
            Err(err) => {
                self.listing.set_notice(&err);
                false
            }
        }
    }

    async fn render_and_save(&self, invoice: &InvoiceRecord, dir: &Path) -> Result<PathBuf> {
        let issuer = self.backend.current_user().await?.issuer_profile();
        let InvoiceDocument {
            file_name, bytes, ..
        } = render_invoice(invoice, &issuer)?;

        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(file_name);
        tokio::fs::write(&path, &bytes).await?;
        tracing::info!(path = %path.display(), size = bytes.len(), "saved invoice");
        Ok(path)
    }

    /// Renders the invoice at `row` of the current page into `dir`.
    pub async fn download(&mut self, row: usize, dir: &Path) -> Result<PathBuf> {
        let invoice = self
            .listing
            .table
            .row(row)
            .cloned()
            .ok_or_else(|| DashboardError::validation("row", format!("no invoice at row {}", row + 1)))?;
        let saved = self.render_and_save(&invoice, dir).await;
        if let Err(err) = &saved {
            self.listing.set_notice(err);
        }
        saved
    }

    /// Fetches one invoice by id and renders it; used when the list is not loaded.
    pub async fn download_by_id(&mut self, id: &str, dir: &Path) -> Result<PathBuf> {
        let saved = match self.backend.get_invoice(id).await {
            Ok(invoice) => self.render_and_save(&invoice, dir).await,
            Err(err) => Err(err),
        };
        if let Err(err) = &saved {
            self.listing.set_notice(err);
        }
        saved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::{Choice, FixedAnswer};
    use crate::models::{AuthUser, IssuerProfile};
    use serde_json::json;

    use crate::testing::FakeBackend;

    fn invoices() -> Vec<InvoiceRecord> {
        vec![
            serde_json::from_value(json!({
                "_id": "i1", "invoiceNo": "INV/2024/001", "invoiceDate": "2024-03-05",
                "buyer": {"name": "Zen Traders"}, "subtotal": 100.0, "taxAmount": 18.0,
                "total": 118.0, "balance": 0.0,
                "items": [{"product": {"name": "Bolt"}, "quantity": 2, "amount": 100.0}]
            }))
            .unwrap(),
            serde_json::from_value(json!({
                "_id": "i2", "invoiceNo": "INV-002", "invoiceDate": "2023-12-30",
                "supplier": {"name": "Acme Metals"}, "subtotal": 50.0, "total": 50.0, "balance": 50.0
            }))
            .unwrap(),
        ]
    }

    fn backend() -> Arc<FakeBackend> {
        Arc::new(
            FakeBackend::default().with_invoices(invoices()).with_user(AuthUser {
                name: Some("Ravi".into()),
                profile: IssuerProfile {
                    business_name: Some("Ravi Industries".into()),
                    ..IssuerProfile::default()
                },
                ..AuthUser::default()
            }),
        )
    }

    #[tokio::test]
    async fn date_column_sorts_chronologically() {
        let mut page = InvoicesPage::new(backend(), PageSize::Ten);
        page.refresh().await;
        page.table_mut().toggle_sort(1);
        let order: Vec<_> = page
            .table()
            .filtered_records()
            .iter()
            .map(|i| i.id.clone().unwrap_or_default())
            .collect();
        assert_eq!(order, vec!["i2", "i1"]);
    }

    #[tokio::test]
    async fn download_writes_named_pdf() {
        let backend = backend();
        let dir = tempfile::tempdir().unwrap();
        let mut page = InvoicesPage::new(backend.clone(), PageSize::Ten);
        page.refresh().await;

        let path = page.download(0, dir.path()).await.unwrap();
        assert_eq!(path.file_name().unwrap(), "Invoice-INV_2024_001.pdf");
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert_eq!(backend.calls(), vec!["list_invoices", "current_user"]);
    }

    #[tokio::test]
    async fn download_by_id_fetches_the_record() {
        let dir = tempfile::tempdir().unwrap();
        let mut page = InvoicesPage::new(backend(), PageSize::Ten);
        let path = page.download_by_id("i2", dir.path()).await.unwrap();
        assert!(path.ends_with("Invoice-INV-002.pdf"));

        let missing = page.download_by_id("nope", dir.path()).await;
        assert!(missing.is_err());
        assert_eq!(page.notice().unwrap().message, "Invoice not found");
    }

    #[tokio::test]
    async fn view_and_delete() {
        let backend = backend();
        let mut page = InvoicesPage::new(backend.clone(), PageSize::Ten);
        page.refresh().await;

        let seen = page.view(1, &FixedAnswer(Choice::Cancel)).await.unwrap();
        assert_eq!(seen.invoice_no.as_deref(), Some("INV-002"));
        assert!(seen.counterparty.unwrap().is_supplier());

        assert!(!page.request_delete(0, &FixedAnswer(Choice::Cancel)).await);
        assert!(page.request_delete(0, &FixedAnswer(Choice::Confirm)).await);
        assert_eq!(backend.deleted(), vec!["i1"]);
        assert_eq!(page.table().records().len(), 1);
    }
}
