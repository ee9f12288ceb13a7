//! REST lookup of role records: `GET /users/clerk/{external_user_id}`.

use async_trait::async_trait;
use estate_kit::{HttpClient, HttpError};
use role_resolver_sdk::{Role, RoleLookupError, RoleRecord, RoleSource};
use serde::Deserialize;
use tracing::instrument;

#[derive(Debug, Deserialize)]
struct RoleEnvelope {
    data: RolePayload,
}

#[derive(Debug, Deserialize)]
struct RolePayload {
    role: String,
}

/// Role source backed by the back-office REST API.
#[derive(Debug, Clone)]
pub struct HttpRoleSource {
    http: HttpClient,
}

impl HttpRoleSource {
    #[must_use]
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    fn path(external_user_id: &str) -> String {
        format!("users/clerk/{}", urlencoding::encode(external_user_id))
    }
}

fn lookup_error(external_user_id: &str, e: HttpError) -> RoleLookupError {
    match e {
        HttpError::Status { status: 404, .. } => {
            RoleLookupError::NotFound(external_user_id.to_owned())
        }
        HttpError::Status { status, body, .. } => RoleLookupError::Status {
            status,
            message: body,
        },
        HttpError::Decode { message, .. } => RoleLookupError::Decode(message),
        HttpError::Network { message, .. } => RoleLookupError::Network(message),
        other @ (HttpError::InvalidPath { .. } | HttpError::Encode { .. }) => {
            RoleLookupError::Network(other.to_string())
        }
    }
}

#[async_trait]
impl RoleSource for HttpRoleSource {
    #[instrument(skip(self))]
    async fn fetch_role(&self, external_user_id: &str) -> Result<RoleRecord, RoleLookupError> {
        let envelope: RoleEnvelope = self
            .http
            .get_json(&Self::path(external_user_id))
            .await
            .map_err(|e| lookup_error(external_user_id, e))?;

        Ok(RoleRecord {
            external_user_id: external_user_id.to_owned(),
            role: Role::from_backend(&envelope.data.role),
        })
    }
}
