use std::fmt;

use serde::{Deserialize, Serialize};

use super::invoice::IssuerProfile;
use crate::format::format_currency;

/// Signed-in user as returned by `GET /auth/user`; the business fields double
/// as the invoice issuer profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    #[serde(default, rename = "_id", alias = "id")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(flatten)]
    pub profile: IssuerProfile,
}

impl AuthUser {
    pub fn issuer_profile(&self) -> IssuerProfile {
        let mut profile = self.profile.clone();
        if profile.email.is_none() {
            profile.email = self.email.clone();
        }
        if profile.signatory.is_none() {
            profile.signatory = self.name.clone();
        }
        profile
    }
}

/// Figures shown on the dashboard landing page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    #[serde(default, alias = "direct_products")]
    pub direct_products: u64,
    #[serde(default, alias = "indirect_products")]
    pub indirect_products: u64,
    #[serde(default, alias = "wip_products")]
    pub wip_products: u64,
    #[serde(default, alias = "low_stock")]
    pub low_stock: u64,
    #[serde(default)]
    pub invoices: u64,
    #[serde(default, alias = "outstanding_balance")]
    pub outstanding_balance: f64,
}

impl fmt::Display for DashboardSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Direct products:     {}", self.direct_products)?;
        writeln!(f, "Indirect products:   {}", self.indirect_products)?;
        writeln!(f, "Work in progress:    {}", self.wip_products)?;
        writeln!(f, "Low stock:           {}", self.low_stock)?;
        writeln!(f, "Invoices:            {}", self.invoices)?;
        writeln!(f, "Outstanding balance: {}", format_currency(self.outstanding_balance))
    }
}
