use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::{Future, FutureExt};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowAction {
    View,
    Edit,
    Delete,
    Approve,
}

impl RowAction {
    pub fn label(&self) -> &'static str {
        match self {
            RowAction::View => "view",
            RowAction::Edit => "edit",
            RowAction::Delete => "delete",
            RowAction::Approve => "approve",
        }
    }
}

impl fmt::Display for RowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub type ActionHandler<T> = Arc<dyn Fn(T) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// Wraps an async closure as a row action handler.
pub fn handler<T, F, Fut>(f: F) -> ActionHandler<T>
where
    T: 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Arc::new(move |record| f(record).boxed())
}

/// Per-row capabilities supplied by the page. Unset handlers are not offered.
pub struct RowActions<T> {
    view: Option<ActionHandler<T>>,
    edit: Option<ActionHandler<T>>,
    delete: Option<ActionHandler<T>>,
    approve: Option<ActionHandler<T>>,
}

impl<T> Default for RowActions<T> {
    fn default() -> Self {
        RowActions {
            view: None,
            edit: None,
            delete: None,
            approve: None,
        }
    }
}

impl<T> Clone for RowActions<T> {
    fn clone(&self) -> Self {
        RowActions {
            view: self.view.clone(),
            edit: self.edit.clone(),
            delete: self.delete.clone(),
            approve: self.approve.clone(),
        }
    }
}

impl<T> RowActions<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, action: RowAction, handler: ActionHandler<T>) -> Self {
        let slot = match action {
            RowAction::View => &mut self.view,
            RowAction::Edit => &mut self.edit,
            RowAction::Delete => &mut self.delete,
            RowAction::Approve => &mut self.approve,
        };
        *slot = Some(handler);
        self
    }

    pub fn handler(&self, action: RowAction) -> Option<&ActionHandler<T>> {
        match action {
            RowAction::View => self.view.as_ref(),
            RowAction::Edit => self.edit.as_ref(),
            RowAction::Delete => self.delete.as_ref(),
            RowAction::Approve => self.approve.as_ref(),
        }
    }

    /// Offered actions in display order.
    pub fn available(&self) -> Vec<RowAction> {
        [RowAction::View, RowAction::Edit, RowAction::Delete, RowAction::Approve]
            .into_iter()
            .filter(|a| self.handler(*a).is_some())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Performed,
    /// The confirmation was declined; nothing ran.
    Cancelled,
    /// No handler registered or no row at that position.
    Unavailable,
}
