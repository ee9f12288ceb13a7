use serde::{Deserialize, Serialize};

/// Headline counters from `GET /dashboard/stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardStats {
    pub total_properties: u64,
    pub total_clients: u64,
    pub total_sales: u64,
    pub revenue: f64,
}

/// One point of a monthly series (`sales-per-month`, `new-clients`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyCount {
    pub month: String,
    #[serde(alias = "sales", alias = "clients", alias = "total")]
    pub count: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyTypeCount {
    #[serde(rename = "type", alias = "name")]
    pub property_type: String,
    #[serde(alias = "value")]
    pub count: u64,
}

/// Free-form backend health report.
pub type Diagnostics = serde_json::Value;
