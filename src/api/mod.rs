//! Backend collaborator: every call returns the `{success, message?, ...}`
//! envelope already unwrapped.

mod client;
mod download;

pub use client::BackendClient;
pub use download::{filename_from_disposition, Download, EXPORT_DEFAULT_NAME, TEMPLATE_DEFAULT_NAME};

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    AuthUser, DashboardSummary, InventoryCategory, InvoiceRecord, ProductRecord, StockUpdate, StoreRecord,
};

/// Acknowledgement of a mutating call; `message` is whatever the backend said.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutationAck {
    pub message: Option<String>,
}

#[async_trait]
pub trait Backend: Send + Sync {
    async fn list_products(&self, category: InventoryCategory) -> Result<Vec<ProductRecord>>;
    async fn list_wip(&self) -> Result<Vec<ProductRecord>>;
    async fn get_product(&self, id: &str) -> Result<ProductRecord>;
    async fn create_product(&self, product: &ProductRecord) -> Result<MutationAck>;
    async fn update_product(&self, product: &ProductRecord) -> Result<MutationAck>;
    async fn delete_product(&self, id: &str) -> Result<MutationAck>;
    /// Sets current stock; the backend recomputes shortages.
    async fn update_stock(&self, updates: &[StockUpdate]) -> Result<MutationAck>;

    async fn list_stores(&self) -> Result<Vec<StoreRecord>>;
    async fn current_user(&self) -> Result<AuthUser>;

    async fn list_invoices(&self) -> Result<Vec<InvoiceRecord>>;
    async fn get_invoice(&self, id: &str) -> Result<InvoiceRecord>;
    async fn create_invoice(&self, invoice: &InvoiceRecord) -> Result<MutationAck>;
    async fn update_invoice(&self, invoice: &InvoiceRecord) -> Result<MutationAck>;
    async fn delete_invoice(&self, id: &str) -> Result<MutationAck>;

    async fn dashboard_summary(&self) -> Result<DashboardSummary>;

    /// Uploads a `.csv`/`.xlsx` sheet for bulk product creation.
    async fn bulk_upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<MutationAck>;
    async fn sample_template(&self) -> Result<Download>;
    async fn export_products(&self, category: Option<InventoryCategory>) -> Result<Download>;
}
