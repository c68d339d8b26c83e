//! `FlagBackend` trait — single async interface behind both flag lifetimes.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// How long a flag lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifetime {
    /// Gone after logout (or when the process exits).
    Session,
    /// Survives restarts until explicitly cleared.
    Durable,
}

impl std::fmt::Display for Lifetime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Session => write!(f, "session"),
            Self::Durable => write!(f, "durable"),
        }
    }
}

/// A flag value.
///
/// Serialized untagged, so the stored JSON is the bare value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl FlagValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Text(s) => match s.as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            Self::Int(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Text(s) => s.parse().ok(),
            Self::Bool(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for FlagValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FlagValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u8> for FlagValue {
    fn from(value: u8) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<&str> for FlagValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FlagValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Backend-agnostic key/value storage for one flag lifetime.
#[async_trait]
pub trait FlagBackend: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Read one flag.
    async fn get(&self, key: &str) -> Result<Option<FlagValue>, StorageError>;

    /// Insert or replace one flag.
    async fn set(&self, key: &str, value: &FlagValue) -> Result<(), StorageError>;

    /// Remove one flag. Returns whether it existed.
    async fn remove(&self, key: &str) -> Result<bool, StorageError>;

    /// Remove every flag. Returns the number removed.
    async fn clear(&self) -> Result<usize, StorageError>;

    /// All flags, ordered by key.
    async fn entries(&self) -> Result<BTreeMap<String, FlagValue>, StorageError>;
}
