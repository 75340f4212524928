pub mod envelope;
pub mod invoice;
pub mod product;
pub mod store;
pub mod user;

pub use envelope::ApiEnvelope;
pub use invoice::{BankDetails, Counterparty, InvoiceRecord, IssuerProfile, LineItem, Party, ProductRef};
pub use product::{
    InventoryCategory, InventoryType, PriceTiers, ProductRecord, StockLevels, StockUpdate, Uom, DEFAULT_INVENTORY_TYPES,
    DEFAULT_UOMS,
};
pub use store::{StoreRecord, StoreRef};
pub use user::{AuthUser, DashboardSummary};
