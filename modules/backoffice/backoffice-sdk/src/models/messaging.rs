use serde::{Deserialize, Serialize};

use crate::error::BackofficeError;
use crate::validate::{Validate, require_text};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageChannel {
    #[default]
    Sms,
    Email,
    Whatsapp,
}

/// Body of `POST /messages/send`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMessage {
    /// Phone number or e-mail address, depending on the channel.
    pub to: String,
    pub channel: MessageChannel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

impl Validate for OutgoingMessage {
    fn validate(&self) -> Result<(), BackofficeError> {
        require_text("to", &self.to)?;
        if self.channel == MessageChannel::Email {
            require_text("subject", self.subject.as_deref().unwrap_or_default())?;
        }
        require_text("body", &self.body)
    }
}

/// Body of `POST /calls/initiate`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRequest {
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

impl Validate for CallRequest {
    fn validate(&self) -> Result<(), BackofficeError> {
        require_text("to", &self.to)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MessageReceipt {
    #[serde(alias = "sid", alias = "messageId")]
    pub id: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CallReceipt {
    #[serde(alias = "sid", alias = "callId")]
    pub id: Option<String>,
    pub status: Option<String>,
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn email_needs_a_subject() {
        let msg = OutgoingMessage {
            to: "ana@example.com".to_owned(),
            channel: MessageChannel::Email,
            body: "Visit confirmed".to_owned(),
            ..OutgoingMessage::default()
        };
        assert_eq!(
            msg.validate(),
            Err(BackofficeError::validation("subject", "is required"))
        );
    }

    #[test]
    fn sms_serializes_without_optional_fields() {
        let msg = OutgoingMessage {
            to: "+33600000000".to_owned(),
            body: "Hello".to_owned(),
            ..OutgoingMessage::default()
        };
        assert!(msg.validate().is_ok());
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({ "to": "+33600000000", "channel": "sms", "body": "Hello" })
        );
    }

    #[test]
    fn call_needs_a_number() {
        assert!(CallRequest::default().validate().unwrap_err().is_validation());
    }

    #[test]
    fn receipts_accept_provider_ids() {
        let r: MessageReceipt = serde_json::from_str(r#"{"sid":"SM1","status":"queued"}"#).unwrap();
        assert_eq!(r.id.as_deref(), Some("SM1"));
        let c: CallReceipt = serde_json::from_str("{}").unwrap();
        assert_eq!(c, CallReceipt::default());
    }
}
