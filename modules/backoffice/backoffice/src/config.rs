//! Configuration for the back-office module.

use std::time::Duration;

use estate_kit::ResponseOrdering;
use serde::Deserialize;

/// Module configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackofficeConfig {
    /// How often the dashboard re-fetches its aggregates.
    #[serde(deserialize_with = "estate_kit::duration::deserialize")]
    pub dashboard_poll_interval: Duration,

    /// Which of several overlapping store requests wins.
    pub ordering: ResponseOrdering,
}

impl Default for BackofficeConfig {
    fn default() -> Self {
        Self {
            dashboard_poll_interval: Duration::from_secs(30),
            ordering: ResponseOrdering::default(),
        }
    }
}
