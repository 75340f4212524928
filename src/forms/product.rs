use std::future::Future;

use super::{amount_text, parse_amount, FormOutcome};
use crate::api::{Backend, MutationAck};
use crate::dialog::Dialog;
use crate::error::{DashboardError, Result};
use crate::models::{InventoryType, PriceTiers, ProductRecord, StockLevels, StoreRecord, StoreRef, Uom};
use crate::options::{OptionKind, OptionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductField {
    Name,
    Description,
    Category,
    SubCategory,
    InventoryCategory,
    Uom,
    Store,
    HsnCode,
    Color,
    CurrentStock,
    MinStock,
    MaxStock,
    DefaultPrice,
    RegularBuyingPrice,
    WholesaleBuyingPrice,
    Mrp,
    DealerPrice,
    DistributorPrice,
}

impl ProductField {
    pub const ALL: [ProductField; 18] = [
        ProductField::Name,
        ProductField::Description,
        ProductField::Category,
        ProductField::SubCategory,
        ProductField::InventoryCategory,
        ProductField::Uom,
        ProductField::Store,
        ProductField::HsnCode,
        ProductField::Color,
        ProductField::CurrentStock,
        ProductField::MinStock,
        ProductField::MaxStock,
        ProductField::DefaultPrice,
        ProductField::RegularBuyingPrice,
        ProductField::WholesaleBuyingPrice,
        ProductField::Mrp,
        ProductField::DealerPrice,
        ProductField::DistributorPrice,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            ProductField::Name => "name",
            ProductField::Description => "description",
            ProductField::Category => "category",
            ProductField::SubCategory => "subCategory",
            ProductField::InventoryCategory => "inventoryCategory",
            ProductField::Uom => "uom",
            ProductField::Store => "store",
            ProductField::HsnCode => "hsnCode",
            ProductField::Color => "color",
            ProductField::CurrentStock => "currentStock",
            ProductField::MinStock => "minStock",
            ProductField::MaxStock => "maxStock",
            ProductField::DefaultPrice => "defaultPrice",
            ProductField::RegularBuyingPrice => "regularBuyingPrice",
            ProductField::WholesaleBuyingPrice => "wholesaleBuyingPrice",
            ProductField::Mrp => "mrp",
            ProductField::DealerPrice => "dealerPrice",
            ProductField::DistributorPrice => "distributorPrice",
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key().eq_ignore_ascii_case(key.trim()))
    }

    fn required(&self) -> bool {
        matches!(
            self,
            ProductField::Name
                | ProductField::Category
                | ProductField::InventoryCategory
                | ProductField::Uom
                | ProductField::Store
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit { id: String },
}

/// Dropdown contents for the drawer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormChoices {
    pub stores: Vec<StoreRecord>,
    pub uoms: Vec<String>,
    pub inventory_types: Vec<String>,
}

impl FormChoices {
    pub async fn load(backend: &dyn Backend, options: &OptionStore) -> Result<Self> {
        Ok(FormChoices {
            stores: backend.list_stores().await?,
            uoms: options.list(OptionKind::Uom).await?,
            inventory_types: options.list(OptionKind::InventoryType).await?,
        })
    }
}

/// Create/edit product drawer. Every editable attribute is a text field.
#[derive(Debug, Clone)]
pub struct ProductForm {
    mode: FormMode,
    values: Vec<String>,
    /// Values as loaded for an edit; empty for a new product.
    loaded: Vec<String>,
    open: bool,
}

impl ProductForm {
    pub fn create() -> Self {
        ProductForm {
            mode: FormMode::Create,
            values: vec![String::new(); ProductField::ALL.len()],
            loaded: Vec::new(),
            open: true,
        }
    }

    /// Edit form pre-filled from the backend's copy of the product.
    pub async fn edit(backend: &dyn Backend, id: &str) -> Result<Self> {
        let product = backend.get_product(id).await?;
        Ok(Self::from_record(id, &product))
    }

    pub fn from_record(id: &str, p: &ProductRecord) -> Self {
        let mut form = ProductForm {
            mode: FormMode::Edit { id: id.to_string() },
            values: vec![String::new(); ProductField::ALL.len()],
            loaded: Vec::new(),
            open: true,
        };
        let text = |v: &Option<String>| v.clone().unwrap_or_default();

        form.set(ProductField::Name, &p.name);
        form.set(ProductField::Description, &text(&p.description));
        form.set(ProductField::Category, &text(&p.category));
        form.set(ProductField::SubCategory, &text(&p.sub_category));
        if let Some(kind) = &p.inventory_category {
            form.set(ProductField::InventoryCategory, kind.as_str());
        }
        if let Some(uom) = &p.uom {
            form.set(ProductField::Uom, uom.as_str());
        }
        if let Some(id) = p.store.as_ref().and_then(|s| s.id.as_deref()) {
            form.set(ProductField::Store, id);
        }
        form.set(ProductField::HsnCode, &text(&p.hsn_code));
        form.set(ProductField::Color, &text(&p.color));
        form.set(ProductField::CurrentStock, &amount_text(Some(p.stock.current)));
        form.set(ProductField::MinStock, &amount_text(p.stock.min));
        form.set(ProductField::MaxStock, &amount_text(p.stock.max));
        form.set(ProductField::DefaultPrice, &amount_text(p.prices.default));
        form.set(ProductField::RegularBuyingPrice, &amount_text(p.prices.regular_buying));
        form.set(ProductField::WholesaleBuyingPrice, &amount_text(p.prices.wholesale_buying));
        form.set(ProductField::Mrp, &amount_text(p.prices.mrp));
        form.set(ProductField::DealerPrice, &amount_text(p.prices.dealer));
        form.set(ProductField::DistributorPrice, &amount_text(p.prices.distributor));
        form.loaded = form.values.clone();
        form
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    fn slot(field: ProductField) -> usize {
        ProductField::ALL.iter().position(|f| *f == field).unwrap_or_default()
    }

    pub fn get(&self, field: ProductField) -> &str {
        &self.values[Self::slot(field)]
    }

    pub fn set(&mut self, field: ProductField, value: &str) {
        self.values[Self::slot(field)] = value.to_string();
    }

    /// Whether `field` still holds the value the product was loaded with.
    fn unchanged(&self, field: ProductField) -> bool {
        self.loaded
            .get(Self::slot(field))
            .is_some_and(|v| v.trim().eq_ignore_ascii_case(self.get(field).trim()))
    }

    /// The "add new unit" affordance: prompts, stores the unit and selects it.
    pub async fn add_uom(&mut self, options: &OptionStore, dialog: &dyn Dialog) -> Result<Option<String>> {
        let added = options.add_via_prompt(OptionKind::Uom, dialog).await?;
        if let Some(uom) = &added {
            self.set(ProductField::Uom, uom);
        }
        Ok(added)
    }

    pub async fn add_inventory_type(&mut self, options: &OptionStore, dialog: &dyn Dialog) -> Result<Option<String>> {
        let added = options.add_via_prompt(OptionKind::InventoryType, dialog).await?;
        if let Some(kind) = &added {
            self.set(ProductField::InventoryCategory, kind);
        }
        Ok(added)
    }

    fn text(&self, field: ProductField) -> Option<String> {
        Some(self.get(field).trim().to_string()).filter(|s| !s.is_empty())
    }

    fn amount(&self, field: ProductField) -> Result<Option<f64>> {
        parse_amount(field.key(), self.get(field))
    }

    /// Checks required fields and numbers, and builds the request body.
    pub async fn validate(&self, options: &OptionStore) -> Result<ProductRecord> {
        if let Some(missing) = ProductField::ALL
            .into_iter()
            .find(|f| f.required() && self.get(*f).trim().is_empty())
        {
            return Err(DashboardError::validation(missing.key(), format!("{} is required", missing.key())));
        }

        // A product keeps the unit and type it was stored with, even when this
        // session's vocabulary lacks them.
        let uom = Uom::new(self.get(ProductField::Uom));
        if !self.unchanged(ProductField::Uom) && !options.contains(OptionKind::Uom, uom.as_str()).await? {
            return Err(DashboardError::validation("uom", format!("unknown unit of measure `{uom}`")));
        }
        let kind = InventoryType::new(self.get(ProductField::InventoryCategory));
        if !self.unchanged(ProductField::InventoryCategory)
            && !options.contains(OptionKind::InventoryType, kind.as_str()).await?
        {
            return Err(DashboardError::validation(
                "inventoryCategory",
                format!("unknown inventory type `{kind}`"),
            ));
        }

        let stock = StockLevels {
            current: self.amount(ProductField::CurrentStock)?.unwrap_or(0.0),
            min: self.amount(ProductField::MinStock)?,
            max: self.amount(ProductField::MaxStock)?,
        };
        if let (Some(min), Some(max)) = (stock.min, stock.max) {
            if min > max {
                return Err(DashboardError::validation("minStock", "minimum stock cannot exceed maximum stock"));
            }
        }

        Ok(ProductRecord {
            id: match &self.mode {
                FormMode::Edit { id } => Some(id.clone()),
                FormMode::Create => None,
            },
            name: self.get(ProductField::Name).trim().to_string(),
            description: self.text(ProductField::Description),
            category: self.text(ProductField::Category),
            sub_category: self.text(ProductField::SubCategory),
            inventory_category: Some(kind),
            uom: Some(uom),
            stock,
            prices: PriceTiers {
                default: self.amount(ProductField::DefaultPrice)?,
                regular_buying: self.amount(ProductField::RegularBuyingPrice)?,
                wholesale_buying: self.amount(ProductField::WholesaleBuyingPrice)?,
                mrp: self.amount(ProductField::Mrp)?,
                dealer: self.amount(ProductField::DealerPrice)?,
                distributor: self.amount(ProductField::DistributorPrice)?,
            },
            store: self.text(ProductField::Store).map(|id| StoreRef { id: Some(id), name: None }),
            hsn_code: self.text(ProductField::HsnCode),
            color: self.text(ProductField::Color),
        })
    }

    /// Validates, then creates or updates. On success runs `on_saved`
    /// (the page's refetch) and closes the drawer. Failures leave it open.
    pub async fn submit<F, Fut>(&mut self, backend: &dyn Backend, options: &OptionStore, on_saved: F) -> FormOutcome
    where
        F: FnOnce(MutationAck) -> Fut,
        Fut: Future<Output = ()>,
    {
        let record = match self.validate(options).await {
            Ok(record) => record,
            Err(err) => return FormOutcome::from_error(err),
        };

        let result = match &self.mode {
            FormMode::Create => backend.create_product(&record).await,
            FormMode::Edit { .. } => backend.update_product(&record).await,
        };

        match result {
            Ok(ack) => {
                tracing::info!(product = %record.name, mode = ?self.mode, "product saved");
                let message = ack.message.clone();
                on_saved(ack).await;
                self.close();
                FormOutcome::Saved { message }
            }
            Err(err) => {
                tracing::warn!(product = %record.name, error = %err, "product save failed");
                FormOutcome::from_error(err)
            }
        }
    }
}
