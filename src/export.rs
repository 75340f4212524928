//! Client-side CSV export of product listings.

use std::io::Write;

use serde::Serialize;

use crate::error::Result;
use crate::models::ProductRecord;

pub const EXPORT_FILE_NAME: &str = "products-export.csv";

#[derive(Serialize)]
struct ProductRow<'a> {
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Category")]
    category: &'a str,
    #[serde(rename = "Sub-category")]
    sub_category: &'a str,
    #[serde(rename = "Inventory type")]
    inventory_type: &'a str,
    #[serde(rename = "UOM")]
    uom: &'a str,
    #[serde(rename = "Current stock")]
    current_stock: f64,
    #[serde(rename = "Min stock")]
    min_stock: Option<f64>,
    #[serde(rename = "Max stock")]
    max_stock: Option<f64>,
    #[serde(rename = "Default price")]
    default_price: Option<f64>,
    #[serde(rename = "MRP")]
    mrp: Option<f64>,
    #[serde(rename = "Dealer price")]
    dealer_price: Option<f64>,
    #[serde(rename = "Distributor price")]
    distributor_price: Option<f64>,
    #[serde(rename = "Store")]
    store: &'a str,
    #[serde(rename = "HSN")]
    hsn_code: &'a str,
    #[serde(rename = "Color")]
    color: &'a str,
}

impl<'a> From<&'a ProductRecord> for ProductRow<'a> {
    fn from(p: &'a ProductRecord) -> Self {
        ProductRow {
            name: &p.name,
            category: p.category.as_deref().unwrap_or_default(),
            sub_category: p.sub_category.as_deref().unwrap_or_default(),
            inventory_type: p.inventory_category.as_ref().map(|t| t.as_str()).unwrap_or_default(),
            uom: p.uom.as_ref().map(|u| u.as_str()).unwrap_or_default(),
            current_stock: p.stock.current,
            min_stock: p.stock.min,
            max_stock: p.stock.max,
            default_price: p.prices.default,
            mrp: p.prices.mrp,
            dealer_price: p.prices.dealer,
            distributor_price: p.prices.distributor,
            store: p.store.as_ref().and_then(|s| s.label()).unwrap_or_default(),
            hsn_code: p.hsn_code.as_deref().unwrap_or_default(),
            color: p.color.as_deref().unwrap_or_default(),
        }
    }
}

/// Writes a header row and one row per product, in iteration order.
pub fn write_products_csv<'a, W: Write>(
    writer: W,
    products: impl IntoIterator<Item = &'a ProductRecord>,
) -> Result<usize> {
    let mut out = csv::Writer::from_writer(writer);
    let mut count = 0;
    for product in products {
        out.serialize(ProductRow::from(product))?;
        count += 1;
    }
    if count == 0 {
        // serialize() only emits the header alongside the first record
        out.write_record([
            "Name",
            "Category",
            "Sub-category",
            "Inventory type",
            "UOM",
            "Current stock",
            "Min stock",
            "Max stock",
            "Default price",
            "MRP",
            "Dealer price",
            "Distributor price",
            "Store",
            "HSN",
            "Color",
        ])?;
    }
    out.flush()?;
    Ok(count)
}
