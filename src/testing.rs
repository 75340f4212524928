//! In-memory [`Backend`] for unit tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::api::{Backend, Download, MutationAck};
use crate::error::{DashboardError, Result};
use crate::models::{
    AuthUser, DashboardSummary, InventoryCategory, InvoiceRecord, ProductRecord, StockUpdate, StoreRecord,
};

#[derive(Default)]
struct State {
    products: Vec<ProductRecord>,
    wip: Vec<ProductRecord>,
    invoices: Vec<InvoiceRecord>,
    stores: Vec<StoreRecord>,
    user: AuthUser,
    summary: DashboardSummary,
    failure: Option<DashboardError>,
    calls: Vec<String>,
    created: Vec<ProductRecord>,
    updated: Vec<ProductRecord>,
    deleted: Vec<String>,
    stock_updates: Vec<StockUpdate>,
    uploads: Vec<(String, usize)>,
}

#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<State>,
}

fn clone_error(err: &DashboardError) -> DashboardError {
    match err {
        DashboardError::Transport(m) => DashboardError::Transport(m.clone()),
        DashboardError::Unauthorized => DashboardError::Unauthorized,
        DashboardError::Server(m) => DashboardError::Server(m.clone()),
        other => DashboardError::Decode(other.to_string()),
    }
}

impl FakeBackend {
    fn with(self, f: impl FnOnce(&mut State)) -> Self {
        if let Ok(mut s) = self.state.lock() {
            f(&mut s);
        }
        self
    }

    pub fn with_products(self, products: Vec<ProductRecord>) -> Self {
        self.with(|s| s.products = products)
    }

    pub fn with_wip(self, products: Vec<ProductRecord>) -> Self {
        self.with(|s| s.wip = products)
    }

    pub fn with_invoices(self, invoices: Vec<InvoiceRecord>) -> Self {
        self.with(|s| s.invoices = invoices)
    }

    pub fn with_stores(self, stores: Vec<StoreRecord>) -> Self {
        self.with(|s| s.stores = stores)
    }

    pub fn with_user(self, user: AuthUser) -> Self {
        self.with(|s| s.user = user)
    }

    pub fn with_summary(self, summary: DashboardSummary) -> Self {
        self.with(|s| s.summary = summary)
    }

    /// Every call fails with `success: false` and this message.
    pub fn failing_with(self, message: &str) -> Self {
        let message = message.to_string();
        self.with(|s| s.failure = Some(DashboardError::Server(message)))
    }

    pub fn offline(self) -> Self {
        self.with(|s| s.failure = Some(DashboardError::Transport("connection refused".into())))
    }

    pub fn calls(&self) -> Vec<String> {
        self.read(|s| s.calls.clone())
    }

    pub fn created_products(&self) -> Vec<ProductRecord> {
        self.read(|s| s.created.clone())
    }

    pub fn updated_products(&self) -> Vec<ProductRecord> {
        self.read(|s| s.updated.clone())
    }

    pub fn deleted(&self) -> Vec<String> {
        self.read(|s| s.deleted.clone())
    }

    pub fn stock_updates(&self) -> Vec<StockUpdate> {
        self.read(|s| s.stock_updates.clone())
    }

    pub fn uploads(&self) -> Vec<(String, usize)> {
        self.read(|s| s.uploads.clone())
    }

    fn read<T>(&self, f: impl FnOnce(&State) -> T) -> T {
        let guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&guard)
    }

    /// Records the call, then applies `f` unless a failure is configured.
    async fn call<T>(&self, name: &str, f: impl FnOnce(&mut State) -> Result<T>) -> Result<T> {
        let mut s = self.state.lock().unwrap_or_else(|e| e.into_inner());
        s.calls.push(name.to_string());
        if let Some(err) = &s.failure {
            return Err(clone_error(err));
        }
        f(&mut s)
    }
}

fn saved() -> Result<MutationAck> {
    Ok(MutationAck {
        message: Some("Saved".into()),
    })
}

#[async_trait]
impl Backend for FakeBackend {
    async fn list_products(&self, category: InventoryCategory) -> Result<Vec<ProductRecord>> {
        self.call("list_products", |s| {
            Ok(s.products
                .iter()
                .filter(|p| p.inventory_category.as_ref().and_then(|k| k.category()) == Some(category))
                .cloned()
                .collect())
        })
        .await
    }

    async fn list_wip(&self) -> Result<Vec<ProductRecord>> {
        self.call("list_wip", |s| Ok(s.wip.clone())).await
    }

    async fn get_product(&self, id: &str) -> Result<ProductRecord> {
        self.call("get_product", |s| {
            s.products
                .iter()
                .find(|p| p.id.as_deref() == Some(id))
                .cloned()
                .ok_or_else(|| DashboardError::Server("Product not found".into()))
        })
        .await
    }

    async fn create_product(&self, product: &ProductRecord) -> Result<MutationAck> {
        self.call("create_product", |s| {
            s.created.push(product.clone());
            saved()
        })
        .await
    }

    async fn update_product(&self, product: &ProductRecord) -> Result<MutationAck> {
        self.call("update_product", |s| {
            s.updated.push(product.clone());
            saved()
        })
        .await
    }

    async fn delete_product(&self, id: &str) -> Result<MutationAck> {
        self.call("delete_product", |s| {
            s.deleted.push(id.to_string());
            s.products.retain(|p| p.id.as_deref() != Some(id));
            saved()
        })
        .await
    }

    async fn update_stock(&self, updates: &[StockUpdate]) -> Result<MutationAck> {
        self.call("update_stock", |s| {
            s.stock_updates.extend_from_slice(updates);
            saved()
        })
        .await
    }

    async fn list_stores(&self) -> Result<Vec<StoreRecord>> {
        self.call("list_stores", |s| Ok(s.stores.clone())).await
    }

    async fn current_user(&self) -> Result<AuthUser> {
        self.call("current_user", |s| Ok(s.user.clone())).await
    }

    async fn list_invoices(&self) -> Result<Vec<InvoiceRecord>> {
        self.call("list_invoices", |s| Ok(s.invoices.clone())).await
    }

    async fn get_invoice(&self, id: &str) -> Result<InvoiceRecord> {
        self.call("get_invoice", |s| {
            s.invoices
                .iter()
                .find(|i| i.id.as_deref() == Some(id))
                .cloned()
                .ok_or_else(|| DashboardError::Server("Invoice not found".into()))
        })
        .await
    }

    async fn create_invoice(&self, invoice: &InvoiceRecord) -> Result<MutationAck> {
        self.call("create_invoice", |s| {
            s.invoices.push(invoice.clone());
            saved()
        })
        .await
    }

    async fn update_invoice(&self, _invoice: &InvoiceRecord) -> Result<MutationAck> {
        self.call("update_invoice", |_| saved()).await
    }

    async fn delete_invoice(&self, id: &str) -> Result<MutationAck> {
        self.call("delete_invoice", |s| {
            s.deleted.push(id.to_string());
            s.invoices.retain(|i| i.id.as_deref() != Some(id));
            saved()
        })
        .await
    }

    async fn dashboard_summary(&self) -> Result<DashboardSummary> {
        self.call("dashboard_summary", |s| Ok(s.summary.clone())).await
    }

    async fn bulk_upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<MutationAck> {
        self.call("bulk_upload", |s| {
            s.uploads.push((file_name.to_string(), bytes.len()));
            saved()
        })
        .await
    }

    async fn sample_template(&self) -> Result<Download> {
        self.call("sample_template", |_| {
            Ok(Download {
                file_name: crate::api::TEMPLATE_DEFAULT_NAME.to_string(),
                content_type: None,
                bytes: b"name,category\n".to_vec(),
            })
        })
        .await
    }

    async fn export_products(&self, _category: Option<InventoryCategory>) -> Result<Download> {
        self.call("export_products", |_| {
            Ok(Download {
                file_name: crate::api::EXPORT_DEFAULT_NAME.to_string(),
                content_type: None,
                bytes: vec![0x50, 0x4b],
            })
        })
        .await
    }
}
