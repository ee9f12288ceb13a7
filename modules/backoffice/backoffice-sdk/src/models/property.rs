use serde::{Deserialize, Serialize};

use crate::error::BackofficeError;
use crate::resource::{RecordId, Resource};
use crate::validate::{Validate, require_positive, require_text};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "Option<String>")]
pub enum PropertyStatus {
    Available,
    Reserved,
    Sold,
    Rented,
    #[default]
    Unknown,
}

impl From<Option<String>> for PropertyStatus {
    fn from(raw: Option<String>) -> Self {
        let raw = raw.unwrap_or_default();
        match raw.trim().to_ascii_lowercase().as_str() {
            "available" => Self::Available,
            "reserved" => Self::Reserved,
            "sold" => Self::Sold,
            "rented" => Self::Rented,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    #[serde(alias = "_id")]
    pub id: RecordId,
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "type")]
    pub property_type: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub bedrooms: Option<u32>,
    #[serde(default)]
    pub bathrooms: Option<u32>,
    #[serde(default)]
    pub area: Option<f64>,
    #[serde(default)]
    pub status: PropertyStatus,
}

/// Create-form payload for a property.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProperty {
    pub title: String,
    #[serde(rename = "type")]
    pub property_type: String,
    pub city: String,
    pub address: String,
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,
    pub status: PropertyStatus,
}

impl Validate for NewProperty {
    fn validate(&self) -> Result<(), BackofficeError> {
        require_text("title", &self.title)?;
        require_text("type", &self.property_type)?;
        require_text("city", &self.city)?;
        require_text("address", &self.address)?;
        require_positive("price", self.price)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PropertyStats {
    pub total: usize,
    pub available: usize,
    pub sold: usize,
    pub average_price: f64,
}

impl Resource for Property {
    const COLLECTION: &'static str = "properties";
    const NUMERIC_FILTERS: &'static [&'static str] = &[
        "price",
        "minPrice",
        "maxPrice",
        "bedrooms",
        "bathrooms",
        "area",
        "minArea",
        "maxArea",
    ];

    type New = NewProperty;
    type Stats = PropertyStats;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn stats(items: &[Self]) -> PropertyStats {
        let count = |status: PropertyStatus| items.iter().filter(|p| p.status == status).count();
        #[allow(clippy::cast_precision_loss)]
        let average_price = if items.is_empty() {
            0.0
        } else {
            items.iter().map(|p| p.price).sum::<f64>() / items.len() as f64
        };
        PropertyStats {
            total: items.len(),
            available: count(PropertyStatus::Available),
            sold: count(PropertyStatus::Sold),
            average_price,
        }
    }
}
