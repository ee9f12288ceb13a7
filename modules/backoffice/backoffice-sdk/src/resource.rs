//! Collection item contract and tolerant payload wrappers.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::validate::Validate;

/// An item of a REST collection (`/properties`, `/clients`, `/sales`).
pub trait Resource: Clone + fmt::Debug + DeserializeOwned + Serialize + Send + Sync + 'static {
    /// Collection path segment, e.g. `properties`.
    const COLLECTION: &'static str;

    /// Filter keys whose values are sent as numbers.
    const NUMERIC_FILTERS: &'static [&'static str];

    /// Create-form payload.
    type New: Serialize + Validate + fmt::Debug + Send + Sync;

    /// Aggregates derived from the whole collection.
    type Stats: Clone + Default + fmt::Debug + PartialEq + Serialize + Send + Sync;

    fn id(&self) -> &RecordId;

    fn stats(items: &[Self]) -> Self::Stats;
}

/// Backend identifier. Accepts both JSON strings and numbers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct RecordId(String);

impl RecordId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Integer(i64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Self(s),
            Raw::Integer(n) => Self(n.to_string()),
        })
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// A collection payload: either a bare array or `{ "data": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Collection<T> {
    Bare(Vec<T>),
    Wrapped { data: Vec<T> },
}

impl<T> Collection<T> {
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Bare(items) | Self::Wrapped { data: items } => items,
        }
    }
}

/// A single-record payload: either the record or `{ "data": record }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Single<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Single<T> {
    #[must_use]
    pub fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data } | Self::Bare(data) => data,
        }
    }
}
