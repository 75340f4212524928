use serde::{Deserialize, Deserializer, Serialize};

use super::store::StoreRef;

/// Tolerance used when checking display invariants on backend totals.
const TOTALS_EPSILON: f64 = 0.005;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, alias = "phoneNumber", alias = "mobile")]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "gst_number", alias = "gstin")]
    pub gst_number: Option<String>,
}

/// The other side of an invoice. The backend sends `buyer` or `supplier`;
/// exactly one of them describes the party.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Counterparty {
    Buyer { buyer: Party },
    Supplier { supplier: Party },
}

impl Counterparty {
    pub fn party(&self) -> &Party {
        match self {
            Counterparty::Buyer { buyer } => buyer,
            Counterparty::Supplier { supplier } => supplier,
        }
    }

    pub fn is_supplier(&self) -> bool {
        matches!(self, Counterparty::Supplier { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRef {
    #[serde(default, rename = "_id", alias = "id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "hsn_code", alias = "hsn")]
    pub hsn_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default, deserialize_with = "product_ref")]
    pub product: Option<ProductRef>,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub amount: f64,
}

impl LineItem {
    /// Unit rate shown in the item table; `None` for a zero quantity.
    pub fn rate(&self) -> Option<f64> {
        if self.quantity == 0 {
            None
        } else {
            Some(self.amount / self.quantity as f64)
        }
    }
}

/// Populated references arrive as objects, unpopulated ones as a bare id.
fn product_ref<'de, D>(deserializer: D) -> Result<Option<ProductRef>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        Populated(ProductRef),
        Id(String),
    }

    Ok(match Option::<Wire>::deserialize(deserializer)? {
        Some(Wire::Populated(p)) => Some(p),
        Some(Wire::Id(id)) => Some(ProductRef {
            id: Some(id),
            ..ProductRef::default()
        }),
        None => None,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "InvoiceWire", into = "InvoiceWire")]
pub struct InvoiceRecord {
    pub id: Option<String>,
    pub invoice_no: Option<String>,
    pub invoice_date: Option<String>,
    pub document_date: Option<String>,
    pub sales_order_date: Option<String>,
    pub counterparty: Option<Counterparty>,
    pub store: Option<StoreRef>,
    pub category: Option<String>,
    pub items: Vec<LineItem>,
    pub subtotal: f64,
    pub tax_rate: f64,
    pub tax_amount: f64,
    pub total: f64,
    pub balance: f64,
    pub note: Option<String>,
}

impl InvoiceRecord {
    /// `subtotal + tax_amount`, recomputed for display only.
    pub fn display_total(&self) -> f64 {
        self.subtotal + self.tax_amount
    }

    /// Whether the backend totals satisfy `total == subtotal + tax` and `balance <= total`.
    pub fn totals_consistent(&self) -> bool {
        (self.total - self.display_total()).abs() < TOTALS_EPSILON
            && self.balance <= self.total + TOTALS_EPSILON
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InvoiceWire {
    #[serde(default, rename = "_id", alias = "id", skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, alias = "invoice_no", alias = "invoice_number")]
    invoice_no: Option<String>,
    #[serde(default, alias = "invoice_date")]
    invoice_date: Option<String>,
    #[serde(default, alias = "document_date")]
    document_date: Option<String>,
    #[serde(default, alias = "sales_order_date")]
    sales_order_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    buyer: Option<Party>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    supplier: Option<Party>,
    #[serde(default)]
    store: Option<StoreRef>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    items: Vec<LineItem>,
    #[serde(default)]
    subtotal: f64,
    #[serde(default, alias = "tax_rate")]
    tax_rate: f64,
    #[serde(default, alias = "tax_amount")]
    tax_amount: f64,
    #[serde(default)]
    total: f64,
    #[serde(default)]
    balance: f64,
    #[serde(default)]
    note: Option<String>,
}

impl From<InvoiceWire> for InvoiceRecord {
    fn from(w: InvoiceWire) -> Self {
        let counterparty = match (w.buyer, w.supplier) {
            (Some(buyer), Some(_)) => {
                tracing::warn!(
                    invoice_no = w.invoice_no.as_deref().unwrap_or_default(),
                    "invoice carries both buyer and supplier; using buyer"
                );
                Some(Counterparty::Buyer { buyer })
            }
            (Some(buyer), None) => Some(Counterparty::Buyer { buyer }),
            (None, Some(supplier)) => Some(Counterparty::Supplier { supplier }),
            (None, None) => None,
        };

        InvoiceRecord {
            id: w.id,
            invoice_no: w.invoice_no,
            invoice_date: w.invoice_date,
            document_date: w.document_date,
            sales_order_date: w.sales_order_date,
            counterparty,
            store: w.store,
            category: w.category,
            items: w.items,
            subtotal: w.subtotal,
            tax_rate: w.tax_rate,
            tax_amount: w.tax_amount,
            total: w.total,
            balance: w.balance,
            note: w.note,
        }
    }
}

impl From<InvoiceRecord> for InvoiceWire {
    fn from(r: InvoiceRecord) -> Self {
        let (buyer, supplier) = match r.counterparty {
            Some(Counterparty::Buyer { buyer }) => (Some(buyer), None),
            Some(Counterparty::Supplier { supplier }) => (None, Some(supplier)),
            None => (None, None),
        };
        InvoiceWire {
            id: r.id,
            invoice_no: r.invoice_no,
            invoice_date: r.invoice_date,
            document_date: r.document_date,
            sales_order_date: r.sales_order_date,
            buyer,
            supplier,
            store: r.store,
            category: r.category,
            items: r.items,
            subtotal: r.subtotal,
            tax_rate: r.tax_rate,
            tax_amount: r.tax_amount,
            total: r.total,
            balance: r.balance,
            note: r.note,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankDetails {
    #[serde(default, alias = "bank_name")]
    pub bank_name: Option<String>,
    #[serde(default, alias = "account_name")]
    pub account_name: Option<String>,
    #[serde(default, alias = "account_number")]
    pub account_number: Option<String>,
    #[serde(default, alias = "ifscCode", alias = "ifsc_code")]
    pub ifsc: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
}

/// Seller details printed on every invoice; fetched from `GET /auth/user`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuerProfile {
    #[serde(default, alias = "business_name", alias = "company_name")]
    pub business_name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, alias = "phoneNumber", alias = "mobile")]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "gst_number", alias = "gstin")]
    pub gst_number: Option<String>,
    #[serde(default, rename = "bankDetails", alias = "bank")]
    pub bank: Option<BankDetails>,
    #[serde(default, alias = "signatoryName", alias = "name")]
    pub signatory: Option<String>,
    /// `data:image/*;base64,...` logo as stored by the settings screen.
    #[serde(default, alias = "logoUrl")]
    pub logo: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn supplier_only_invoice_maps_to_supplier_variant() {
        let raw = json!({
            "_id": "65f",
            "invoiceNo": "PUR-7",
            "supplier": {"name": "Acme Metals", "gstNumber": "27AAAAA0000A1Z5"},
            "items": [],
            "subtotal": 100.0,
            "taxAmount": 18.0,
            "total": 118.0,
            "balance": 18.0
        });
        let inv: InvoiceRecord = serde_json::from_value(raw).unwrap();
        let cp = inv.counterparty.as_ref().unwrap();
        assert!(cp.is_supplier());
        assert_eq!(cp.party().name.as_deref(), Some("Acme Metals"));
        assert!(inv.totals_consistent());
    }

    #[test]
    fn product_reference_may_be_a_bare_id() {
        let raw = json!({"product": "p-1", "quantity": 2, "amount": 50.0});
        let item: LineItem = serde_json::from_value(raw).unwrap();
        assert_eq!(item.product.as_ref().unwrap().id.as_deref(), Some("p-1"));
        assert_eq!(item.rate(), Some(25.0));
    }

    #[test]
    fn zero_quantity_has_no_rate() {
        let item = LineItem {
            quantity: 0,
            amount: 10.0,
            ..LineItem::default()
        };
        assert_eq!(item.rate(), None);
    }

    #[test]
    fn balance_above_total_is_inconsistent() {
        let inv: InvoiceRecord = serde_json::from_value(json!({
            "subtotal": 10.0, "tax_amount": 0.0, "total": 10.0, "balance": 12.0
        }))
        .unwrap();
        assert!(!inv.totals_consistent());
        assert!(inv.counterparty.is_none());
    }
}
