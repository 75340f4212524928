//! Page controllers: fetch a collection, feed the table, run row actions,
//! and refetch after every mutation.

mod dashboard;
mod invoices;
mod products;
mod wip;

pub use dashboard::DashboardPage;
pub use invoices::InvoicesPage;
pub use products::{ProductEvent, ProductsPage};
pub use wip::WipPage;

use crate::error::{DashboardError, Result};
use crate::table::TablePresenter;

/// Error banner. `retryable` shows the retry control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub retryable: bool,
}

impl From<&DashboardError> for Notice {
    fn from(err: &DashboardError) -> Self {
        Notice {
            message: err.user_message(),
            retryable: err.is_retryable(),
        }
    }
}

/// Identifies one load. Only the most recent ticket may apply its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

#[derive(Debug, Default)]
pub struct LoadGuard {
    latest: u64,
    closed: bool,
}

impl LoadGuard {
    pub fn begin(&mut self) -> LoadTicket {
        self.latest += 1;
        LoadTicket(self.latest)
    }

    /// False for superseded tickets and for anything after [`LoadGuard::close`].
    pub fn accepts(&self, ticket: LoadTicket) -> bool {
        !self.closed && ticket.0 == self.latest
    }

    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Table plus load bookkeeping shared by the list pages.
pub struct Listing<T> {
    pub table: TablePresenter<T>,
    guard: LoadGuard,
    loading: bool,
    notice: Option<Notice>,
}

impl<T> Listing<T> {
    pub fn new(table: TablePresenter<T>) -> Self {
        Listing {
            table,
            guard: LoadGuard::default(),
            loading: false,
            notice: None,
        }
    }

    pub fn begin(&mut self) -> LoadTicket {
        self.loading = true;
        self.guard.begin()
    }

    /// Any load in flight becomes stale; nothing is loading afterwards.
    pub fn invalidate(&mut self) {
        self.guard.begin();
        self.loading = false;
    }

    /// Applies a completed load if it is still current. Returns whether it was applied.
    pub fn finish(&mut self, ticket: LoadTicket, result: Result<Vec<T>>) -> bool {
        if !self.guard.accepts(ticket) {
            tracing::debug!(?ticket, closed = self.guard.is_closed(), "dropping stale response");
            return false;
        }
        self.loading = false;
        match result {
            Ok(records) => {
                tracing::debug!(count = records.len(), "collection loaded");
                self.table.set_records(records);
                self.notice = None;
            }
            Err(err) => {
                tracing::warn!(error = %err, "load failed");
                self.notice = Some(Notice::from(&err));
            }
        }
        true
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn set_notice(&mut self, err: &DashboardError) {
        self.notice = Some(Notice::from(err));
    }

    pub fn close(&mut self) {
        self.guard.close();
        self.loading = false;
    }

    pub fn is_closed(&self) -> bool {
        self.guard.is_closed()
    }
}
