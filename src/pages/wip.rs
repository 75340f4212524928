use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use super::products::product_columns;
use super::{Listing, LoadTicket, Notice};
use crate::api::Backend;
use crate::error::Result;
use crate::models::ProductRecord;
use crate::table::{PageSize, TablePresenter};

/// Products currently held in bill-of-materials builds. Read-only.
pub struct WipPage {
    backend: Arc<dyn Backend>,
    listing: Listing<ProductRecord>,
}

impl WipPage {
    pub fn new(backend: Arc<dyn Backend>, page_size: PageSize) -> Self {
        let table =
            TablePresenter::new(product_columns(), page_size).with_empty_message("No work-in-progress items");
        WipPage {
            backend,
            listing: Listing::new(table),
        }
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

    pub fn begin_load(&mut self) -> LoadTicket {
        self.listing.begin()
    }

    pub fn fetch(&self) -> BoxFuture<'static, Result<Vec<ProductRecord>>> {
        let backend = self.backend.clone();
        async move { backend.list_wip().await }.boxed()
    }

    pub fn finish_load(&mut self, ticket: LoadTicket, result: Result<Vec<ProductRecord>>) -> bool {
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
}
