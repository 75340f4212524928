use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use super::{Listing, LoadTicket, Notice};
use crate::api::{Backend, Download};
use crate::dialog::Dialog;
use crate::error::{DashboardError, Result};
use crate::export::{write_products_csv, EXPORT_FILE_NAME};
use crate::forms::{FormOutcome, ProductForm, StockUpdateForm};
use crate::models::{InventoryCategory, ProductRecord};
use crate::options::OptionStore;
use crate::table::{handler, ActionOutcome, CellValue, Column, PageSize, RowAction, RowActions, TablePresenter};

/// What a row action led to.
#[derive(Debug)]
pub enum ProductEvent {
    Viewing(ProductRecord),
    Editing(ProductForm),
    Deleted,
    Cancelled,
    Unavailable,
    /// The action ran and failed; the message is also in the page notice.
    Failed(Notice),
}

enum Selection {
    View(ProductRecord),
    Edit(ProductRecord),
}

pub(crate) fn product_columns() -> Vec<Column<ProductRecord>> {
    vec![
        Column::new("Name", |p: &ProductRecord| CellValue::text(&p.name)),
        Column::new("Category", |p: &ProductRecord| CellValue::opt_text(p.category.as_deref())),
        Column::new("Sub-category", |p: &ProductRecord| {
            CellValue::opt_text(p.sub_category.as_deref())
        }),
        Column::new("Type", |p: &ProductRecord| {
            CellValue::opt_text(p.inventory_category.as_ref().map(|k| k.as_str()))
        }),
        Column::new("UOM", |p: &ProductRecord| CellValue::opt_text(p.uom.as_ref().map(|u| u.as_str()))),
        Column::new("Stock", |p: &ProductRecord| CellValue::Number(p.stock.current)),
        Column::new("Min", |p: &ProductRecord| {
            p.stock.min.map(CellValue::Number).unwrap_or(CellValue::Empty)
        }),
        Column::new("MRP", |p: &ProductRecord| p.prices.mrp.map(CellValue::Money).unwrap_or(CellValue::Empty)),
        Column::new("Store", |p: &ProductRecord| {
            CellValue::opt_text(p.store.as_ref().and_then(|s| s.label()))
        }),
        Column::new("HSN", |p: &ProductRecord| CellValue::opt_text(p.hsn_code.as_deref())),
    ]
}

fn record_id(p: &ProductRecord) -> Result<String> {
    p.id.clone()
        .ok_or_else(|| DashboardError::validation("id", format!("{} has no id", p.name)))
}

/// Direct or indirect product listing with its drawers and bulk tools.
pub struct ProductsPage {
    backend: Arc<dyn Backend>,
    category: InventoryCategory,
    listing: Listing<ProductRecord>,
    selection: Arc<Mutex<Option<Selection>>>,
}

impl ProductsPage {
    pub fn new(backend: Arc<dyn Backend>, category: InventoryCategory, page_size: PageSize) -> Self {
        let selection: Arc<Mutex<Option<Selection>>> = Arc::new(Mutex::new(None));

        let select = |slot: Arc<Mutex<Option<Selection>>>, edit: bool| {
            handler(move |p: ProductRecord| {
                if let Ok(mut s) = slot.lock() {
                    *s = Some(if edit { Selection::Edit(p) } else { Selection::View(p) });
                }
                async { Ok(()) }
            })
        };
        let remover = backend.clone();
        let actions = RowActions::new()
            .on(RowAction::View, select(selection.clone(), false))
            .on(RowAction::Edit, select(selection.clone(), true))
            .on(
                RowAction::Delete,
                handler(move |p: ProductRecord| {
                    let backend = remover.clone();
                    async move {
                        let id = record_id(&p)?;
                        backend.delete_product(&id).await?;
                        tracing::info!(product = %p.name, id = %id, "product deleted");
                        Ok(())
                    }
                }),
            );

        let table = TablePresenter::new(product_columns(), page_size)
            .with_actions(actions)
            .with_empty_message(&format!("No {category} products found"));

        ProductsPage {
            backend,
            category,
            listing: Listing::new(table),
            selection,
        }
    }

    pub fn category(&self) -> InventoryCategory {
        self.category
    }

    pub fn table(&self) -> &TablePresenter<ProductRecord> {
        &self.listing.table
    }

    pub fn table_mut(&mut self) -> &mut TablePresenter<ProductRecord> {
        &mut self.listing.table
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.listing.notice()
    }

    pub fn is_loading(&self) -> bool {
        self.listing.is_loading()
    }

    /// Switching category drops any load still in flight for the old one.
    pub fn set_category(&mut self, category: InventoryCategory) {
        if category != self.category {
            self.listing.invalidate();
        }
        self.category = category;
    }

    pub fn begin_load(&mut self) -> LoadTicket {
        self.listing.begin()
    }

    /// The request for the current category. Owns what it needs, so the page
    /// may be mutated or closed while it runs.
    pub fn fetch(&self) -> BoxFuture<'static, Result<Vec<ProductRecord>>> {
        let backend = self.backend.clone();
        let category = self.category;
        async move { backend.list_products(category).await }.boxed()
    }

    pub fn finish_load(&mut self, ticket: LoadTicket, result: Result<Vec<ProductRecord>>) -> bool {
        self.listing.finish(ticket, result)
    }

    pub async fn refresh(&mut self) {
        let ticket = self.begin_load();
        let result = self.fetch().await;
        self.finish_load(ticket, result);
    }

    /// Navigation away: later completions are ignored.
    pub fn close(&mut self) {
        self.listing.close();
    }

    fn take_selection(&self) -> Option<Selection> {
        self.selection.lock().ok().and_then(|mut s| s.take())
    }

    /// Runs a row action from the current page. Delete confirms first and
    /// refetches after the backend accepts it.
    pub async fn act(&mut self, action: RowAction, row: usize, dialog: &dyn Dialog) -> ProductEvent {
        let outcome = match self.listing.table.trigger(action, row, dialog).await {
            Ok(outcome) => outcome,
            Err(err) => {
                self.listing.set_notice(&err);
                return ProductEvent::Failed(Notice::from(&err));
            }
        };

        match (outcome, self.take_selection()) {
            (ActionOutcome::Cancelled, _) => ProductEvent::Cancelled,
            (ActionOutcome::Unavailable, _) => ProductEvent::Unavailable,
            (ActionOutcome::Performed, Some(Selection::View(p))) => ProductEvent::Viewing(p),
            (ActionOutcome::Performed, Some(Selection::Edit(p))) => match self.open_editor(&p).await {
                Ok(form) => ProductEvent::Editing(form),
                Err(err) => {
                    self.listing.set_notice(&err);
                    ProductEvent::Failed(Notice::from(&err))
                }
            },
            (ActionOutcome::Performed, None) => {
                self.refresh().await;
                ProductEvent::Deleted
            }
        }
    }

    pub async fn request_delete(&mut self, row: usize, dialog: &dyn Dialog) -> ProductEvent {
        self.act(RowAction::Delete, row, dialog).await
    }

    async fn open_editor(&self, p: &ProductRecord) -> Result<ProductForm> {
        let id = record_id(p)?;
        ProductForm::edit(self.backend.as_ref(), &id).await
    }

    /// Submits a create/edit drawer; a save refetches the listing.
    pub async fn save(&mut self, form: &mut ProductForm, options: &OptionStore) -> FormOutcome {
        let backend = self.backend.clone();
        form.submit(backend.as_ref(), options, move |_| {
            let page = self;
            page.refresh()
        })
        .await
    }

    /// Stock drawer over the rows currently matching the search.
    pub fn stock_form(&self) -> StockUpdateForm {
        StockUpdateForm::from_products(self.listing.table.filtered_records())
    }

    pub async fn save_stock(&mut self, form: &mut StockUpdateForm) -> FormOutcome {
        let backend = self.backend.clone();
        form.submit(backend.as_ref(), move |_| {
            let page = self;
            page.refresh()
        })
        .await
    }

    /// Client-side CSV of the filtered, sorted rows.
    pub async fn export_csv(&self, dir: &Path) -> Result<PathBuf> {
        let mut buf = Vec::new();
        write_products_csv(&mut buf, self.listing.table.filtered_records())?;
        let path = dir.join(EXPORT_FILE_NAME);
        tokio::fs::write(&path, buf).await?;
        tracing::info!(path = %path.display(), "exported products");
        Ok(path)
    }

    /// Server-side spreadsheet export for the current category.
    pub async fn download_export(&self, dir: &Path) -> Result<PathBuf> {
        let download = self.backend.export_products(Some(self.category)).await?;
        save_download(dir, download).await
    }

    pub async fn download_template(&self, dir: &Path) -> Result<PathBuf> {
        let download = self.backend.sample_template().await?;
        save_download(dir, download).await
    }

    /// Bulk creation from a `.csv`/`.xlsx` file, then a refetch.
    pub async fn import(&mut self, file: &Path) -> Result<Option<String>> {
        let file_name = file
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| DashboardError::validation("file", "file name is not valid UTF-8"))?
            .to_string();
        let bytes = tokio::fs::read(file).await?;
        match self.backend.bulk_upload(&file_name, bytes).await {
            Ok(ack) => {
                self.refresh().await;
                Ok(ack.message)
            }
            Err(err) => {
                self.listing.set_notice(&err);
                Err(err)
            }
        }
    }
}

pub(crate) async fn save_download(dir: &Path, download: Download) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(&download.file_name);
    tokio::fs::write(&path, &download.bytes).await?;
    tracing::info!(path = %path.display(), size = download.bytes.len(), "saved download");
    Ok(path)
}
