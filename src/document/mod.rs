//! Invoice document generation: layout first, then PDF.

pub mod layout;
pub mod pdf;

pub use layout::{InvoiceLayout, PreparedOn, Section};
pub use pdf::{plan_pages, PagePlan};

use crate::error::Result;
use crate::models::{InvoiceRecord, IssuerProfile};

/// A freshly rendered invoice, ready to be saved as `file_name`.
#[derive(Debug, Clone)]
pub struct InvoiceDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub page_count: usize,
    pub layout: InvoiceLayout,
}

/// Renders the invoice with today's date on the "Prepared by" line.
pub fn render_invoice(invoice: &InvoiceRecord, issuer: &IssuerProfile) -> Result<InvoiceDocument> {
    render_invoice_on(invoice, issuer, PreparedOn::today())
}

pub fn render_invoice_on(
    invoice: &InvoiceRecord,
    issuer: &IssuerProfile,
    prepared_on: PreparedOn,
) -> Result<InvoiceDocument> {
    let layout = InvoiceLayout::build(invoice, issuer, prepared_on);
    let rendered = pdf::render_pdf(&layout)?;

    tracing::info!(
        invoice_no = %layout.invoice_no,
        items = invoice.items.len(),
        pages = rendered.page_count,
        bytes = rendered.bytes.len(),
        "rendered invoice pdf"
    );

    Ok(InvoiceDocument {
        file_name: layout.file_name(),
        bytes: rendered.bytes,
        page_count: rendered.page_count,
        layout,
    })
}
