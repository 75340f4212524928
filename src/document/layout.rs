//! Declarative invoice layout.
//!
//! [`InvoiceLayout::build`] maps an invoice and the issuer profile onto a list
//! of [`Section`]s. It is pure: the only wall-clock input is the injected
//! [`PreparedOn`] date, which is excluded from layout equality.

use time::{Date, OffsetDateTime};

use crate::format::{
    amount_in_words, display_date, format_currency, format_date, tax_percent_label,
    NOT_AVAILABLE, NOT_AVAILABLE_SHORT,
};
use crate::models::{InvoiceRecord, IssuerProfile, LineItem, Party};

pub const BUYER_HEADING: &str = "Buyer Details:";
pub const SELLER_HEADING: &str = "Seller Details:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub title: String,
    pub width_mm: f32,
    pub align: Align,
    /// Wrap width for multi-line cells.
    pub max_chars: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableSection {
    pub columns: Vec<ColumnSpec>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub label: String,
    pub value: String,
}

impl Field {
    fn new(label: &str, value: impl Into<String>) -> Self {
        Field {
            label: label.to_string(),
            value: value.into(),
        }
    }
}

/// One boxed cell of the header grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridCell {
    pub heading: String,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub title: String,
    pub name: String,
    /// Printed with the prepared-on date.
    pub dated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Section {
    Title { text: String, subtitle: String },
    Grid { cells: Vec<GridCell> },
    Table(TableSection),
    Summary { rows: Vec<Field> },
    Text { heading: String, lines: Vec<String> },
    Fields { heading: String, rows: Vec<Field> },
    Signatures { blocks: Vec<Signature> },
}

/// Date stamped on the "Prepared by" signature. Depends on the wall clock.
#[derive(Debug, Clone, Copy)]
pub struct PreparedOn(pub Date);

impl PreparedOn {
    pub fn today() -> Self {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        PreparedOn(now.date())
    }

    pub fn display(&self) -> String {
        display_date(self.0)
    }
}

#[derive(Debug, Clone)]
pub struct InvoiceLayout {
    pub invoice_no: String,
    pub sections: Vec<Section>,
    pub logo: Option<String>,
    pub prepared_on: PreparedOn,
}

impl PartialEq for InvoiceLayout {
    fn eq(&self, other: &Self) -> bool {
        self.invoice_no == other.invoice_no
            && self.sections == other.sections
            && self.logo == other.logo
    }
}

fn or_short(v: Option<&str>) -> String {
    v.map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(NOT_AVAILABLE_SHORT)
        .to_string()
}

fn or_long(v: Option<&str>) -> String {
    v.map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(NOT_AVAILABLE)
        .to_string()
}

fn item_columns() -> Vec<ColumnSpec> {
    let col = |title: &str, width_mm: f32, align: Align, max_chars: usize| ColumnSpec {
        title: title.to_string(),
        width_mm,
        align,
        max_chars,
    };
    vec![
        col("#", 8.0, Align::Left, 4),
        col("Item", 38.0, Align::Left, 22),
        col("Description", 48.0, Align::Left, 30),
        col("HSN", 18.0, Align::Left, 10),
        col("Qty", 14.0, Align::Right, 8),
        col("Rate", 27.0, Align::Right, 16),
        col("Amount", 27.0, Align::Right, 16),
    ]
}

fn item_row(index: usize, item: &LineItem) -> Vec<String> {
    let product = item.product.as_ref();
    vec![
        (index + 1).to_string(),
        or_short(product.and_then(|p| p.name.as_deref())),
        or_short(product.and_then(|p| p.description.as_deref())),
        or_short(product.and_then(|p| p.hsn_code.as_deref())),
        item.quantity.to_string(),
        item.rate()
            .map(format_currency)
            .unwrap_or_else(|| NOT_AVAILABLE_SHORT.to_string()),
        format_currency(item.amount),
    ]
}

fn party_cell(heading: &str, party: Option<&Party>) -> GridCell {
    GridCell {
        heading: heading.to_string(),
        fields: vec![
            Field::new("Name", or_long(party.and_then(|p| p.name.as_deref()))),
            Field::new("Address", or_long(party.and_then(|p| p.address.as_deref()))),
            Field::new("Phone", or_long(party.and_then(|p| p.phone.as_deref()))),
            Field::new("Email", or_long(party.and_then(|p| p.email.as_deref()))),
            Field::new("GSTIN", or_long(party.and_then(|p| p.gst_number.as_deref()))),
        ],
    }
}

fn seller_cell(issuer: &IssuerProfile) -> GridCell {
    GridCell {
        heading: SELLER_HEADING.to_string(),
        fields: vec![
            Field::new("Name", or_long(issuer.business_name.as_deref())),
            Field::new("Address", or_long(issuer.address.as_deref())),
            Field::new("Phone", or_long(issuer.phone.as_deref())),
            Field::new("Email", or_long(issuer.email.as_deref())),
            Field::new("GSTIN", or_long(issuer.gst_number.as_deref())),
        ],
    }
}

impl InvoiceLayout {
    pub fn build(invoice: &InvoiceRecord, issuer: &IssuerProfile, prepared_on: PreparedOn) -> Self {
        let invoice_no = or_short(invoice.invoice_no.as_deref());
        let total = invoice.display_total();

        if !invoice.totals_consistent() {
            tracing::warn!(
                invoice_no = %invoice_no,
                backend_total = invoice.total,
                display_total = total,
                balance = invoice.balance,
                "invoice totals do not add up; showing recomputed total"
            );
        }

        let mut sections = Vec::with_capacity(9);

        sections.push(Section::Title {
            text: "INVOICE".to_string(),
            subtitle: format!("Invoice No: {}", invoice_no),
        });

        // Supplier invoices still print under the buyer heading, with the supplier's details.
        let counterparty = invoice.counterparty.as_ref().map(|c| c.party());
        sections.push(Section::Grid {
            cells: vec![
                seller_cell(issuer),
                party_cell(BUYER_HEADING, counterparty),
                GridCell {
                    heading: "Invoice Details:".to_string(),
                    fields: vec![
                        Field::new("Invoice No", invoice_no.clone()),
                        Field::new("Invoice Date", format_date(invoice.invoice_date.as_deref())),
                        Field::new("Document Date", format_date(invoice.document_date.as_deref())),
                        Field::new(
                            "Sales Order Date",
                            format_date(invoice.sales_order_date.as_deref()),
                        ),
                    ],
                },
                GridCell {
                    heading: "Store / Category:".to_string(),
                    fields: vec![
                        Field::new(
                            "Store",
                            or_short(invoice.store.as_ref().and_then(|s| s.label())),
                        ),
                        Field::new("Category", or_short(invoice.category.as_deref())),
                        Field::new("Balance", format_currency(invoice.balance)),
                    ],
                },
            ],
        });

        sections.push(Section::Table(TableSection {
            columns: item_columns(),
            rows: invoice
                .items
                .iter()
                .enumerate()
                .map(|(i, item)| item_row(i, item))
                .collect(),
        }));

        sections.push(Section::Summary {
            rows: vec![
                Field::new("Subtotal", format_currency(invoice.subtotal)),
                Field::new(
                    &format!("Tax ({})", tax_percent_label(invoice.tax_rate)),
                    format_currency(invoice.tax_amount),
                ),
                Field::new("Total", format_currency(total)),
                Field::new("Balance", format_currency(invoice.balance)),
            ],
        });

        sections.push(Section::Text {
            heading: "Amount in Words:".to_string(),
            lines: vec![amount_in_words(total)],
        });

        sections.push(Section::Text {
            heading: "Note:".to_string(),
            lines: vec![or_short(invoice.note.as_deref())],
        });

        let bank = issuer.bank.as_ref();
        sections.push(Section::Fields {
            heading: "Bank Details:".to_string(),
            rows: vec![
                Field::new("Bank Name", or_long(bank.and_then(|b| b.bank_name.as_deref()))),
                Field::new("Account Name", or_long(bank.and_then(|b| b.account_name.as_deref()))),
                Field::new("Account No.", or_long(bank.and_then(|b| b.account_number.as_deref()))),
                Field::new("IFSC", or_long(bank.and_then(|b| b.ifsc.as_deref()))),
                Field::new("Branch", or_long(bank.and_then(|b| b.branch.as_deref()))),
            ],
        });

        sections.push(Section::Signatures {
            blocks: vec![
                Signature {
                    title: "Prepared by".to_string(),
                    name: or_long(issuer.signatory.as_deref()),
                    dated: true,
                },
                Signature {
                    title: "Authorised Signatory".to_string(),
                    name: format!("For {}", or_long(issuer.business_name.as_deref())),
                    dated: false,
                },
            ],
        });

        InvoiceLayout {
            invoice_no,
            sections,
            logo: issuer.logo.clone().filter(|l| !l.trim().is_empty()),
            prepared_on,
        }
    }

    pub fn item_table(&self) -> Option<&TableSection> {
        self.sections.iter().find_map(|s| match s {
            Section::Table(t) => Some(t),
            _ => None,
        })
    }

    pub fn summary(&self) -> Option<&[Field]> {
        self.sections.iter().find_map(|s| match s {
            Section::Summary { rows } => Some(rows.as_slice()),
            _ => None,
        })
    }

    pub fn grid(&self) -> Option<&[GridCell]> {
        self.sections.iter().find_map(|s| match s {
            Section::Grid { cells } => Some(cells.as_slice()),
            _ => None,
        })
    }

    /// `Invoice-{invoice_no}.pdf`, made safe for file systems.
    pub fn file_name(&self) -> String {
        crate::format::sanitize_filename(&format!("Invoice-{}.pdf", self.invoice_no))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BankDetails, Counterparty, ProductRef};
    use time::macros::date;

    fn item(name: &str, qty: u32, amount: f64) -> LineItem {
        LineItem {
            product: Some(ProductRef {
                id: None,
                name: Some(name.to_string()),
                description: Some(format!("{name} description")),
                hsn_code: Some("8544".to_string()),
            }),
            quantity: qty,
            amount,
        }
    }

    fn invoice(items: Vec<LineItem>) -> InvoiceRecord {
        let subtotal: f64 = items.iter().map(|i| i.amount).sum();
        InvoiceRecord {
            id: Some("inv-1".into()),
            invoice_no: Some("INV-001".into()),
            invoice_date: Some("2024-04-01".into()),
            document_date: None,
            sales_order_date: None,
            counterparty: Some(Counterparty::Buyer {
                buyer: Party {
                    name: Some("Ravi Traders".into()),
                    ..Party::default()
                },
            }),
            store: None,
            category: Some("Electrical".into()),
            items,
            subtotal,
            tax_rate: 0.18,
            tax_amount: subtotal * 0.18,
            total: subtotal * 1.18,
            balance: 0.0,
            note: None,
        }
    }

    fn issuer() -> IssuerProfile {
        IssuerProfile {
            business_name: Some("Shree Fabricators".into()),
            bank: Some(BankDetails {
                bank_name: Some("State Bank".into()),
                ..BankDetails::default()
            }),
            ..IssuerProfile::default()
        }
    }

    #[test]
    fn one_row_per_item_plus_header() {
        let inv = invoice(vec![item("Cable", 2, 100.0), item("Switch", 1, 40.0), item("Bulb", 4, 80.0)]);
        let layout = InvoiceLayout::build(&inv, &issuer(), PreparedOn(date!(2024 - 04 - 02)));
        let table = layout.item_table().unwrap();
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.columns.len(), table.rows[0].len());
    }

    #[test]
    fn each_row_uses_its_own_product() {
        let inv = invoice(vec![item("Cable", 2, 100.0), item("Switch", 1, 40.0)]);
        let layout = InvoiceLayout::build(&inv, &issuer(), PreparedOn(date!(2024 - 04 - 02)));
        let rows = &layout.item_table().unwrap().rows;
        assert_eq!(rows[0][1], "Cable");
        assert_eq!(rows[1][1], "Switch");
        assert_eq!(rows[1][2], "Switch description");
        assert_eq!(rows[0][5], "50.00");
    }

    #[test]
    fn empty_invoice_renders_zero_totals() {
        let mut inv = invoice(Vec::new());
        inv.tax_rate = 0.0;
        let layout = InvoiceLayout::build(&inv, &IssuerProfile::default(), PreparedOn(date!(2024 - 01 - 01)));
        assert!(layout.item_table().unwrap().rows.is_empty());
        let summary = layout.summary().unwrap();
        assert!(summary.iter().all(|f| f.value == "0.00"));
        assert_eq!(summary[1].label, "Tax (0%)");
    }

    #[test]
    fn supplier_is_printed_under_buyer_heading() {
        let mut inv = invoice(vec![item("Sheet", 1, 10.0)]);
        inv.counterparty = Some(Counterparty::Supplier {
            supplier: Party {
                name: Some("Metal Mart".into()),
                gst_number: Some("29ABCDE1234F1Z5".into()),
                ..Party::default()
            },
        });
        let layout = InvoiceLayout::build(&inv, &issuer(), PreparedOn(date!(2024 - 01 - 01)));
        let party = &layout.grid().unwrap()[1];
        assert_eq!(party.heading, "Buyer Details:");
        assert_eq!(party.fields[0].value, "Metal Mart");
        assert_eq!(party.fields[4].value, "29ABCDE1234F1Z5");
    }

    #[test]
    fn missing_fields_use_placeholders() {
        let mut inv = invoice(vec![LineItem::default()]);
        inv.counterparty = None;
        inv.invoice_no = None;
        let layout = InvoiceLayout::build(&inv, &IssuerProfile::default(), PreparedOn(date!(2024 - 01 - 01)));
        let party = &layout.grid().unwrap()[1];
        assert!(party.fields.iter().all(|f| f.value == "Not Available"));
        let row = &layout.item_table().unwrap().rows[0];
        assert_eq!(row[1], "N/A");
        assert_eq!(row[5], "N/A");
        assert_eq!(layout.file_name(), "Invoice-N_A.pdf");
    }

    #[test]
    fn prepared_on_is_ignored_by_equality() {
        let inv = invoice(vec![item("Cable", 1, 10.0)]);
        let a = InvoiceLayout::build(&inv, &issuer(), PreparedOn(date!(2024 - 01 - 01)));
        let b = InvoiceLayout::build(&inv, &issuer(), PreparedOn(date!(2030 - 12 - 31)));
        assert_eq!(a, b);
    }
}
