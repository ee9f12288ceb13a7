use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::BackofficeError;
use crate::resource::{RecordId, Resource};
use crate::validate::{Validate, require_text};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    #[serde(alias = "_id")]
    pub id: RecordId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// Buyer, seller, tenant...
    #[serde(default, rename = "type")]
    pub client_type: Option<String>,
    #[serde(default)]
    pub budget: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClient {
    pub name: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub client_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
}

impl Validate for NewClient {
    fn validate(&self) -> Result<(), BackofficeError> {
        require_text("name", &self.name)?;
        require_text("phone", &self.phone)?;
        if self.email.as_deref().is_some_and(|e| !e.contains('@')) {
            return Err(BackofficeError::validation("email", "is not an email address"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClientStats {
    pub total: usize,
    pub by_type: BTreeMap<String, usize>,
}

impl Resource for Client {
    const COLLECTION: &'static str = "clients";
    const NUMERIC_FILTERS: &'static [&'static str] = &["budget", "minBudget", "maxBudget"];

    type New = NewClient;
    type Stats = ClientStats;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn stats(items: &[Self]) -> ClientStats {
        let mut by_type = BTreeMap::new();
        for client in items {
            let key = client
                .client_type
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .unwrap_or("other")
                .to_ascii_lowercase();
            *by_type.entry(key).or_insert(0) += 1;
        }
        ClientStats {
            total: items.len(),
            by_type,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn stats_group_by_type() {
        let clients: Vec<Client> = serde_json::from_str(
            r#"[
                {"id":1,"name":"A","type":"Buyer"},
                {"id":2,"name":"B","type":"buyer"},
                {"id":3,"name":"C"}
            ]"#,
        )
        .unwrap();
        let stats = Client::stats(&clients);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_type.get("buyer"), Some(&2));
        assert_eq!(stats.by_type.get("other"), Some(&1));
    }

    #[test]
    fn new_client_checks_required_and_email() {
        let mut form = NewClient {
            name: "Ana".to_owned(),
            phone: String::new(),
            ..NewClient::default()
        };
        assert_eq!(
            form.validate(),
            Err(BackofficeError::validation("phone", "is required"))
        );
        form.phone = "+33 6 00 00 00 00".to_owned();
        form.email = Some("ana.example.com".to_owned());
        assert!(form.validate().unwrap_err().is_validation());
        form.email = Some("ana@example.com".to_owned());
        assert!(form.validate().is_ok());
    }
}
