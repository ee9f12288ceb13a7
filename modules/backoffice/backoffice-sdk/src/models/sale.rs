use serde::{Deserialize, Serialize};

use crate::error::BackofficeError;
use crate::resource::{RecordId, Resource};
use crate::validate::{Validate, require_positive, require_text};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "Option<String>")]
pub enum SaleStatus {
    Pending,
    Completed,
    Cancelled,
    #[default]
    Unknown,
}

impl From<Option<String>> for SaleStatus {
    fn from(raw: Option<String>) -> Self {
        let raw = raw.unwrap_or_default();
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" | "in_progress" => Self::Pending,
            "completed" | "closed" => Self::Completed,
            "cancelled" | "canceled" => Self::Cancelled,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    #[serde(alias = "_id")]
    pub id: RecordId,
    #[serde(default)]
    pub property_id: Option<RecordId>,
    #[serde(default)]
    pub client_id: Option<RecordId>,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub status: SaleStatus,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSale {
    pub property_id: String,
    pub client_id: String,
    pub amount: Option<f64>,
    pub status: SaleStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl Validate for NewSale {
    fn validate(&self) -> Result<(), BackofficeError> {
        require_text("propertyId", &self.property_id)?;
        require_text("clientId", &self.client_id)?;
        require_positive("amount", self.amount)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SaleStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    /// Sum of completed sale amounts.
    pub revenue: f64,
}

impl Resource for Sale {
    const COLLECTION: &'static str = "sales";
    const NUMERIC_FILTERS: &'static [&'static str] = &["amount", "minAmount", "maxAmount"];

    type New = NewSale;
    type Stats = SaleStats;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn stats(items: &[Self]) -> SaleStats {
        let completed: Vec<&Sale> = items
            .iter()
            .filter(|s| s.status == SaleStatus::Completed)
            .collect();
        SaleStats {
            total: items.len(),
            completed: completed.len(),
            pending: items
                .iter()
                .filter(|s| s.status == SaleStatus::Pending)
                .count(),
            revenue: completed.iter().map(|s| s.amount).sum(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(alias = "_id")]
    pub id: RecordId,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(alias = "_id")]
    pub id: RecordId,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Payments and documents attached to one sale.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SaleDetails {
    pub payments: Vec<Payment>,
    pub documents: Vec<Document>,
}

impl SaleDetails {
    #[must_use]
    pub fn paid_total(&self) -> f64 {
        self.payments.iter().map(|p| p.amount).sum()
    }
}
