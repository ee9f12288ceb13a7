//! Outgoing messages and phone calls.
//!
//! Requests are validated before anything is sent; every outcome is
//! reported through the notifier.

use std::sync::Arc;

use backoffice_sdk::{
    BackofficeError, CallReceipt, CallRequest, MessageReceipt, MessagingApi, OutgoingMessage,
    Validate,
};
use estate_kit::{Notification, Notifier};
use tracing::{info, instrument, warn};

/// Sends messages and starts calls on behalf of an employee.
#[derive(Clone)]
pub struct MessagingService {
    api: Arc<dyn MessagingApi>,
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for MessagingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessagingService").finish_non_exhaustive()
    }
}

impl MessagingService {
    #[must_use]
    pub fn new(api: Arc<dyn MessagingApi>, notifier: Arc<dyn Notifier>) -> Self {
        Self { api, notifier }
    }

    /// # Errors
    ///
    /// [`BackofficeError::Validation`] before any request when `to`, `body`
    /// (or `subject` for e-mail) is blank; otherwise the backend failure.
    #[instrument(skip_all, fields(channel = ?message.channel))]
    pub async fn send_message(
        &self,
        message: &OutgoingMessage,
    ) -> Result<MessageReceipt, BackofficeError> {
        message.validate()?;
        match self.api.send_message(message).await {
            Ok(receipt) => {
                info!(id = ?receipt.id, "message sent");
                self.notifier
                    .notify(Notification::success(format!("Message sent to {}", message.to)));
                Ok(receipt)
            }
            Err(e) => Err(self.report("send message", e)),
        }
    }

    /// # Errors
    ///
    /// [`BackofficeError::Validation`] before any request when `to` is blank;
    /// otherwise the backend failure.
    #[instrument(skip_all)]
    pub async fn initiate_call(&self, call: &CallRequest) -> Result<CallReceipt, BackofficeError> {
        call.validate()?;
        match self.api.initiate_call(call).await {
            Ok(receipt) => {
                info!(id = ?receipt.id, "call initiated");
                self.notifier
                    .notify(Notification::success(format!("Calling {}", call.to)));
                Ok(receipt)
            }
            Err(e) => Err(self.report("start call", e)),
        }
    }

    fn report(&self, op: &str, e: BackofficeError) -> BackofficeError {
        warn!(operation = op, error = %e, "messaging failed");
        self.notifier
            .notify(Notification::error(format!("Could not {op}: {e}")));
        e
    }
}
