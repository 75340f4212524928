use std::future::Future;

use super::{amount_text, parse_amount, FormOutcome};
use crate::api::{Backend, MutationAck};
use crate::error::DashboardError;
use crate::models::{ProductRecord, StockUpdate};

#[derive(Debug, Clone, PartialEq)]
pub struct StockRow {
    pub product_id: String,
    pub name: String,
    pub original: f64,
    pub input: String,
}

/// Bulk "update current stock" drawer. Only rows whose value changed are
/// sent; the backend recomputes shortages from them.
#[derive(Debug, Clone, Default)]
pub struct StockUpdateForm {
    rows: Vec<StockRow>,
    open: bool,
}

impl StockUpdateForm {
    /// Products without an id cannot be updated and are skipped.
    pub fn from_products<'a>(products: impl IntoIterator<Item = &'a ProductRecord>) -> Self {
        let rows = products
            .into_iter()
            .filter_map(|p| {
                p.id.as_ref().map(|id| StockRow {
                    product_id: id.clone(),
                    name: p.name.clone(),
                    original: p.stock.current,
                    input: amount_text(Some(p.stock.current)),
                })
            })
            .collect();
        StockUpdateForm { rows, open: true }
    }

    pub fn rows(&self) -> &[StockRow] {
        &self.rows
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// Returns false when no row has that product id.
    pub fn set(&mut self, product_id: &str, value: &str) -> bool {
        match self.rows.iter_mut().find(|r| r.product_id == product_id) {
            Some(row) => {
                row.input = value.to_string();
                true
            }
            None => false,
        }
    }

    pub fn changes(&self) -> Result<Vec<StockUpdate>, DashboardError> {
        let mut updates = Vec::new();
        for row in &self.rows {
            let value = parse_amount("currentStock", &row.input)?.ok_or_else(|| {
                DashboardError::validation("currentStock", format!("current stock for {} is required", row.name))
            })?;
            if (value - row.original).abs() > f64::EPSILON {
                updates.push(StockUpdate {
                    product_id: row.product_id.clone(),
                    current_stock: value,
                });
            }
        }
        Ok(updates)
    }

    pub async fn submit<F, Fut>(&mut self, backend: &dyn Backend, on_saved: F) -> FormOutcome
    where
        F: FnOnce(MutationAck) -> Fut,
        Fut: Future<Output = ()>,
    {
        let updates = match self.changes() {
            Ok(u) if u.is_empty() => {
                return FormOutcome::Invalid {
                    field: "currentStock".into(),
                    message: "no stock values were changed".into(),
                }
            }
            Ok(u) => u,
            Err(err) => return FormOutcome::from_error(err),
        };

        match backend.update_stock(&updates).await {
            Ok(ack) => {
                tracing::info!(rows = updates.len(), "stock updated");
                let message = ack.message.clone();
                on_saved(ack).await;
                self.close();
                FormOutcome::Saved { message }
            }
            Err(err) => FormOutcome::from_error(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StockLevels;
    use crate::testing::FakeBackend;

    fn products() -> Vec<ProductRecord> {
        ["a", "b", "c"]
            .iter()
            .enumerate()
            .map(|(i, id)| ProductRecord {
                id: Some(id.to_string()),
                name: format!("Item {id}"),
                stock: StockLevels {
                    current: i as f64,
                    ..StockLevels::default()
                },
                ..ProductRecord::default()
            })
            .chain(std::iter::once(ProductRecord::default()))
            .collect()
    }

    #[tokio::test]
    async fn sends_only_changed_rows() {
        let backend = FakeBackend::default();
        let list = products();
        let mut form = StockUpdateForm::from_products(&list);
        assert_eq!(form.rows().len(), 3);
        assert!(form.set("b", "7.5"));
        assert!(!form.set("zzz", "1"));

        assert!(form.submit(&backend, |_| async {}).await.is_saved());
        assert!(!form.is_open());
        assert_eq!(
            backend.stock_updates(),
            vec![StockUpdate {
                product_id: "b".into(),
                current_stock: 7.5
            }]
        );
    }

    #[tokio::test]
    async fn unchanged_or_invalid_input_sends_nothing() {
        let backend = FakeBackend::default();
        let list = products();
        let mut form = StockUpdateForm::from_products(&list);
        assert!(matches!(form.submit(&backend, |_| async {}).await, FormOutcome::Invalid { .. }));

        form.set("a", "-1");
        assert!(matches!(form.submit(&backend, |_| async {}).await, FormOutcome::Invalid { .. }));
        assert!(backend.calls().is_empty());
        assert!(form.is_open());
    }
}
