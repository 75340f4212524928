//! Generic sortable, searchable, paginated tables.

mod actions;
mod column;
mod presenter;

pub use actions::{handler, ActionHandler, ActionOutcome, RowAction, RowActions};
pub use column::{CellValue, Column};
pub use presenter::{HeaderCell, PageSize, RowView, SortDirection, TablePresenter, TableView};
