//! Flag store — the two-lifetime facade every component reads and writes.
//!
//! Backend failures never escape: reads come back absent, writes become
//! no-ops, and the failure is logged. Callers fall back to seed values.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::store::memory::MemoryBackend;
use crate::store::traits::{FlagBackend, FlagValue, Lifetime};

/// Canonical flag keys.
pub mod keys {
    use crate::journey::Stage;

    /// Logged-in email (session).
    pub const AUTH_EMAIL: &str = "auth.email";
    /// Assist/autonomous preference (durable).
    pub const USER_MODE: &str = "user_mode";
    /// Seed data version the durable flags were written against (durable).
    pub const SEED_VERSION: &str = "seed_version";

    pub fn journey_stage(case_id: &str) -> String {
        format!("journey.{case_id}.stage")
    }

    pub fn journey_progress(case_id: &str) -> String {
        format!("journey.{case_id}.progress")
    }

    pub fn journey_exceptions(case_id: &str) -> String {
        format!("journey.{case_id}.exceptions")
    }

    pub fn journey_completed(case_id: &str) -> String {
        format!("journey.{case_id}.completed")
    }

    /// Apply-once marker for the transition leaving `from`.
    pub fn transition_applied(case_id: &str, from: Stage) -> String {
        format!("journey.{case_id}.applied.{from}")
    }
}

/// Snapshot of one lifetime's flags, ordered by key.
pub type FlagSnapshot = BTreeMap<String, FlagValue>;

/// Session + durable flags behind one interface.
pub struct FlagStore {
    session: Arc<dyn FlagBackend>,
    durable: Arc<dyn FlagBackend>,
}

impl FlagStore {
    pub fn new(session: Arc<dyn FlagBackend>, durable: Arc<dyn FlagBackend>) -> Self {
        Self { session, durable }
    }

    /// Both lifetimes in memory. Durable flags then only outlive logouts,
    /// not the process.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryBackend::new("session")),
            Arc::new(MemoryBackend::new("durable")),
        )
    }

    fn backend(&self, lifetime: Lifetime) -> &Arc<dyn FlagBackend> {
        match lifetime {
            Lifetime::Session => &self.session,
            Lifetime::Durable => &self.durable,
        }
    }

    pub async fn get(&self, key: &str, lifetime: Lifetime) -> Option<FlagValue> {
        let backend = self.backend(lifetime);
        match backend.get(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key, %lifetime, backend = backend.name(), error = %e, "Flag read failed");
                None
            }
        }
    }

    pub async fn set(&self, key: &str, value: impl Into<FlagValue>, lifetime: Lifetime) {
        let backend = self.backend(lifetime);
        let value = value.into();
        if let Err(e) = backend.set(key, &value).await {
            warn!(key, %lifetime, backend = backend.name(), error = %e, "Flag write failed");
        }
    }

    pub async fn clear(&self, key: &str, lifetime: Lifetime) {
        let backend = self.backend(lifetime);
        if let Err(e) = backend.remove(key).await {
            warn!(key, %lifetime, backend = backend.name(), error = %e, "Flag clear failed");
        }
    }

    pub async fn clear_all(&self, lifetime: Lifetime) {
        let backend = self.backend(lifetime);
        match backend.clear().await {
            Ok(count) => info!(%lifetime, count, "Cleared flags"),
            Err(e) => warn!(%lifetime, backend = backend.name(), error = %e, "Flag clear-all failed"),
        }
    }

    pub async fn snapshot(&self, lifetime: Lifetime) -> FlagSnapshot {
        let backend = self.backend(lifetime);
        match backend.entries().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(%lifetime, backend = backend.name(), error = %e, "Flag snapshot failed");
                FlagSnapshot::new()
            }
        }
    }

    pub async fn get_bool(&self, key: &str, lifetime: Lifetime) -> Option<bool> {
        self.get(key, lifetime).await.and_then(|v| v.as_bool())
    }

    pub async fn get_int(&self, key: &str, lifetime: Lifetime) -> Option<i64> {
        self.get(key, lifetime).await.and_then(|v| v.as_int())
    }

    pub async fn get_text(&self, key: &str, lifetime: Lifetime) -> Option<String> {
        self.get(key, lifetime)
            .await
            .and_then(|v| v.as_text().map(str::to_string))
    }

    /// First-load reset check: wipe durable flags written against another
    /// seed version, then record the current one. Returns whether a reset
    /// happened.
    pub async fn reset_if_stale(&self, seed_version: i64) -> bool {
        let stored = self.get_int(keys::SEED_VERSION, Lifetime::Durable).await;
        if stored == Some(seed_version) {
            return false;
        }
        info!(?stored, seed_version, "Durable flags are stale, resetting");
        self.clear_all(Lifetime::Durable).await;
        self.set(keys::SEED_VERSION, seed_version, Lifetime::Durable)
            .await;
        true
    }
}
