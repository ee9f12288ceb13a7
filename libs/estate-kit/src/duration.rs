//! Humantime duration helpers for `serde(deserialize_with = ...)`.
//!
//! Config files spell durations as `"30s"`, `"1m 30s"`, `"250ms"`.

use std::time::Duration;

use serde::{Deserialize, Deserializer, de::Error as _};

/// Deserialize a required humantime duration.
///
/// # Errors
///
/// Fails when the value is not a string or not a valid humantime duration.
pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(&raw).map_err(D::Error::custom)
}

/// Deserialize an optional humantime duration; `null` or `"off"` means `None`.
///
/// # Errors
///
/// Fails when the value is present but not a valid humantime duration.
pub fn deserialize_opt<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) if raw.eq_ignore_ascii_case("off") => Ok(None),
        Some(raw) => humantime::parse_duration(&raw)
            .map(Some)
            .map_err(D::Error::custom),
    }
}
