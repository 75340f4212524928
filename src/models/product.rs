use std::fmt;

use serde::{Deserialize, Serialize};

use super::store::StoreRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InventoryCategory {
    Direct,
    Indirect,
}

impl InventoryCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            InventoryCategory::Direct => "direct",
            InventoryCategory::Indirect => "indirect",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "direct" => Some(InventoryCategory::Direct),
            "indirect" => Some(InventoryCategory::Indirect),
            _ => None,
        }
    }
}

impl fmt::Display for InventoryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inventory type as stored on a product. Open like [`Uom`]; the two values
/// the listing endpoint filters on map to [`InventoryCategory`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InventoryType(pub String);

impl InventoryType {
    pub fn new(raw: &str) -> Self {
        InventoryType(raw.trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn category(&self) -> Option<InventoryCategory> {
        InventoryCategory::parse(&self.0)
    }
}

impl From<InventoryCategory> for InventoryType {
    fn from(c: InventoryCategory) -> Self {
        InventoryType(c.as_str().to_string())
    }
}

impl fmt::Display for InventoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unit of measure. The vocabulary is open: users may add units at runtime
/// (see [`crate::options::OptionStore`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uom(pub String);

impl Uom {
    pub fn new(raw: &str) -> Self {
        Uom(raw.trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Uom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub const DEFAULT_UOMS: &[&str] = &["pcs", "kg", "ltr", "mtr", "box", "set", "nos"];
pub const DEFAULT_INVENTORY_TYPES: &[&str] = &["direct", "indirect"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockLevels {
    #[serde(default, rename = "currentStock", alias = "current", alias = "current_stock")]
    pub current: f64,
    #[serde(default, rename = "minStock", alias = "min", alias = "min_stock")]
    pub min: Option<f64>,
    #[serde(default, rename = "maxStock", alias = "max", alias = "max_stock")]
    pub max: Option<f64>,
}

impl StockLevels {
    pub fn is_low(&self) -> bool {
        self.min.is_some_and(|min| self.current < min)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceTiers {
    #[serde(default, rename = "defaultPrice", alias = "default", alias = "default_price")]
    pub default: Option<f64>,
    #[serde(default, rename = "regularBuyingPrice", alias = "regular_buying", alias = "regular_buying_price")]
    pub regular_buying: Option<f64>,
    #[serde(default, rename = "wholesaleBuyingPrice", alias = "wholesale_buying", alias = "wholesale_buying_price")]
    pub wholesale_buying: Option<f64>,
    #[serde(default)]
    pub mrp: Option<f64>,
    #[serde(default, rename = "dealerPrice", alias = "dealer", alias = "dealer_price")]
    pub dealer: Option<f64>,
    #[serde(default, rename = "distributorPrice", alias = "distributor", alias = "distributor_price")]
    pub distributor: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    #[serde(default, rename = "_id", alias = "id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, alias = "sub_category")]
    pub sub_category: Option<String>,
    #[serde(default, alias = "inventory_category")]
    pub inventory_category: Option<InventoryType>,
    #[serde(default)]
    pub uom: Option<Uom>,
    #[serde(default)]
    pub stock: StockLevels,
    #[serde(default)]
    pub prices: PriceTiers,
    #[serde(default)]
    pub store: Option<StoreRef>,
    #[serde(default, alias = "hsn_code")]
    pub hsn_code: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// One row of the stock-and-shortage update request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockUpdate {
    #[serde(rename = "productId")]
    pub product_id: String,
    #[serde(rename = "currentStock")]
    pub current_stock: f64,
}
