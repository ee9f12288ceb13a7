#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Estate Kit
//!
//! Small building blocks shared by the role resolver and the back-office
//! stores:
//!
//! - [`BackendConfig`] - base URL and timeout of the back-office REST API
//! - [`HttpClient`] - JSON-over-HTTP client bound to the backend base URL
//! - [`ResponseOrdering`], [`Dispatcher`] - how overlapping responses are applied
//! - [`Notifier`] - injected user-visible notification channel
//! - [`duration`] - humantime (de)serialization helpers for config structs

pub mod config;
pub mod duration;
pub mod http;
pub mod notify;
pub mod ordering;

pub use config::{BackendConfig, ConfigError, DEFAULT_API_BASE_URL};
pub use http::{HttpClient, HttpError};
pub use notify::{Notification, NotificationLevel, Notifier, RecordingNotifier, TracingNotifier};
pub use ordering::{Dispatch, Dispatcher, ResponseOrdering, Ticket};
