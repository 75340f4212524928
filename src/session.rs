use std::path::Path;
use std::sync::Arc;

use crate::api::{Backend, BackendClient};
use crate::config::AppConfig;
use crate::error::Result;
use crate::models::InventoryCategory;
use crate::options::OptionStore;
use crate::pages::{DashboardPage, InvoicesPage, ProductsPage, WipPage};

/// Everything a page needs: validated settings, the backend and the option
/// vocabularies. Pages are cheap to build and each owns its own load state.
pub struct Session {
    config: AppConfig,
    backend: Arc<dyn Backend>,
    options: OptionStore,
}

impl Session {
    pub fn connect(config: AppConfig) -> Result<Self> {
        let client = BackendClient::new(&config.backend)?;
        let options = OptionStore::from_path(config.ui.options_db.as_deref())?;
        tracing::info!(base_url = %client.base_url(), "session ready");
        Ok(Session::with_backend(config, Arc::new(client), options))
    }

    pub fn with_backend(config: AppConfig, backend: Arc<dyn Backend>, options: OptionStore) -> Self {
        Session {
            config,
            backend,
            options,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn backend(&self) -> Arc<dyn Backend> {
        self.backend.clone()
    }

    pub fn options(&self) -> &OptionStore {
        &self.options
    }

    pub fn output_dir(&self) -> &Path {
        &self.config.ui.output_dir
    }

    pub fn products(&self, category: InventoryCategory) -> ProductsPage {
        ProductsPage::new(self.backend(), category, self.config.page_size())
    }

    pub fn wip(&self) -> WipPage {
        WipPage::new(self.backend(), self.config.page_size())
    }

    pub fn invoices(&self) -> InvoicesPage {
        InvoicesPage::new(self.backend(), self.config.page_size())
    }

    pub fn dashboard(&self) -> DashboardPage {
        DashboardPage::new(self.backend())
    }
}
