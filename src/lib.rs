pub mod api;
pub mod config;
pub mod dialog;
pub mod document;
pub mod error;
pub mod export;
pub mod format;
pub mod forms;
pub mod logging;
pub mod models;
pub mod options;
pub mod pages;
pub mod session;
pub mod table;

#[cfg(test)]
mod testing;

pub use crate::config::AppConfig;
pub use crate::error::{DashboardError, Result};
pub use crate::session::Session;
