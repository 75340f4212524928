//! Drawer forms: local field state, required-field checks, submit, then hand
//! control back to the page through a refetch-and-close callback.

mod product;
mod stock;

pub use product::{FormChoices, FormMode, ProductField, ProductForm};
pub use stock::{StockRow, StockUpdateForm};

use crate::error::DashboardError;

#[derive(Debug, Clone, PartialEq)]
pub enum FormOutcome {
    /// Saved; the success callback has run and the form is closed.
    Saved { message: Option<String> },
    /// Caught before submission; nothing was sent.
    Invalid { field: String, message: String },
    /// The backend or the network refused. The form stays open and is not retried.
    Failed { message: String },
}

impl FormOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, FormOutcome::Saved { .. })
    }

    fn from_error(err: DashboardError) -> Self {
        match err {
            DashboardError::Validation { field, message } => FormOutcome::Invalid { field, message },
            other => FormOutcome::Failed {
                message: other.user_message(),
            },
        }
    }
}

/// Empty input is `None`; anything else must be a finite, non-negative number.
fn parse_amount(field: &str, raw: &str) -> Result<Option<f64>, DashboardError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    match raw.replace(',', "").parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(Some(v)),
        _ => Err(DashboardError::validation(field, format!("{field} must be a non-negative number"))),
    }
}

fn amount_text(value: Option<f64>) -> String {
    match value {
        Some(v) if v.fract() == 0.0 => format!("{}", v as i64),
        Some(v) => v.to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_parse_leniently_but_reject_garbage() {
        assert_eq!(parse_amount("mrp", "").unwrap(), None);
        assert_eq!(parse_amount("mrp", " 1,250.5 ").unwrap(), Some(1250.5));
        assert!(parse_amount("mrp", "-3").is_err());
        assert!(parse_amount("mrp", "abc").is_err());
        assert!(parse_amount("mrp", "NaN").is_err());
    }

    #[test]
    fn amount_text_drops_trailing_zeroes() {
        assert_eq!(amount_text(Some(40.0)), "40");
        assert_eq!(amount_text(Some(2.5)), "2.5");
        assert_eq!(amount_text(None), "");
    }

    #[test]
    fn server_errors_stay_verbatim() {
        let outcome = FormOutcome::from_error(DashboardError::Server("HSN code already in use".into()));
        assert_eq!(
            outcome,
            FormOutcome::Failed {
                message: "HSN code already in use".into()
            }
        );
    }
}
