use std::sync::Arc;

use super::{LoadGuard, Notice};
use crate::api::Backend;
use crate::models::DashboardSummary;

/// Landing page figures.
pub struct DashboardPage {
    backend: Arc<dyn Backend>,
    guard: LoadGuard,
    summary: Option<DashboardSummary>,
    notice: Option<Notice>,
}

impl DashboardPage {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        DashboardPage {
            backend,
            guard: LoadGuard::default(),
            summary: None,
            notice: None,
        }
    }

    pub fn summary(&self) -> Option<&DashboardSummary> {
        self.summary.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub async fn refresh(&mut self) {
        let ticket = self.guard.begin();
        let backend = self.backend.clone();
        let result = backend.dashboard_summary().await;
        if !self.guard.accepts(ticket) {
            tracing::debug!(?ticket, "dropping stale summary");
            return;
        }
        match result {
            Ok(summary) => {
                self.summary = Some(summary);
                self.notice = None;
            }
            Err(err) => {
                tracing::warn!(error = %err, "summary load failed");
                self.notice = Some(Notice::from(&err));
            }
        }
    }

    pub fn close(&mut self) {
        self.guard.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeBackend;

    #[tokio::test]
    async fn loads_summary() {
        let summary = DashboardSummary {
            direct_products: 12,
            outstanding_balance: 150000.0,
            ..DashboardSummary::default()
        };
        let backend = Arc::new(FakeBackend::default().with_summary(summary.clone()));
        let mut page = DashboardPage::new(backend);
        page.refresh().await;
        assert_eq!(page.summary(), Some(&summary));
        assert!(page.summary().unwrap().to_string().contains("1,50,000.00"));
    }

    #[tokio::test]
    async fn closed_page_ignores_results() {
        let backend = Arc::new(FakeBackend::default().offline());
        let mut page = DashboardPage::new(backend);
        page.close();
        page.refresh().await;
        assert!(page.notice().is_none());
        assert!(page.summary().is_none());
    }

    #[tokio::test]
    async fn network_failure_is_retryable_and_recovers() {
        let mut page = DashboardPage::new(Arc::new(FakeBackend::default().offline()));
        page.refresh().await;
        assert!(page.notice().unwrap().retryable);

        page.backend = Arc::new(FakeBackend::default());
        page.refresh().await;
        assert!(page.notice().is_none());
        assert!(page.summary().is_some());
    }
}
