//! Persisted mock server settings and override validation.

use super::types::MockServerError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

pub const DEFAULT_PORT: u16 = 3001;
pub const MIN_PORT: u16 = 1024;
pub const MAX_DELAY_MS: u64 = 30_000;
pub const MIN_STATUS: u16 = 100;
pub const MAX_STATUS: u16 = 599;

/// Key under which per-endpoint overrides are stored.
pub fn endpoint_key(collection_id: &str, endpoint_id: &str) -> String {
    format!("{collection_id}_{endpoint_id}")
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MockServerSettings {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub enabled_collections: BTreeSet<String>,
    #[serde(default, deserialize_with = "without_nulls")]
    pub endpoint_delays: BTreeMap<String, u64>,
    #[serde(default, deserialize_with = "without_nulls")]
    pub custom_responses: BTreeMap<String, Value>,
    #[serde(default, deserialize_with = "without_nulls")]
    pub custom_status_codes: BTreeMap<String, u16>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Cleared overrides may have been persisted as `null`; drop them on load.
fn without_nulls<'de, D, T>(deserializer: D) -> Result<BTreeMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let raw = BTreeMap::<String, Option<T>>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect())
}

impl Default for MockServerSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            enabled_collections: BTreeSet::new(),
            endpoint_delays: BTreeMap::new(),
            custom_responses: BTreeMap::new(),
            custom_status_codes: BTreeMap::new(),
        }
    }
}

impl MockServerSettings {
    pub fn is_enabled(&self, collection_id: &str) -> bool {
        self.enabled_collections.contains(collection_id)
    }

    pub fn delay_for(&self, key: &str) -> u64 {
        self.endpoint_delays.get(key).copied().unwrap_or(0)
    }

    pub fn status_for(&self, key: &str) -> Option<u16> {
        self.custom_status_codes.get(key).copied()
    }

    pub fn response_for(&self, key: &str) -> Option<&Value> {
        self.custom_responses.get(key)
    }

    /// Drop values that could not have been written through the validated
    /// setters (hand-edited store files).
    pub fn sanitized(mut self) -> Self {
        if self.port < MIN_PORT {
            warn!(
                "Persisted mock port {} is out of range, using {}",
                self.port, DEFAULT_PORT
            );
            self.port = DEFAULT_PORT;
        }
        self.endpoint_delays.retain(|key, ms| {
            let keep = *ms <= MAX_DELAY_MS;
            if !keep {
                warn!("Dropping out-of-range delay {}ms for {}", ms, key);
            }
            keep
        });
        self.custom_status_codes.retain(|key, code| {
            let keep = (MIN_STATUS..=MAX_STATUS).contains(code);
            if !keep {
                warn!("Dropping out-of-range status {} for {}", code, key);
            }
            keep
        });
        self
    }
}

pub fn validate_port(port: i64) -> Result<u16, MockServerError> {
    u16::try_from(port)
        .ok()
        .filter(|p| *p >= MIN_PORT)
        .ok_or(MockServerError::InvalidPort(port))
}

pub fn validate_delay(ms: i64) -> Result<u64, MockServerError> {
    u64::try_from(ms)
        .ok()
        .filter(|d| *d <= MAX_DELAY_MS)
        .ok_or(MockServerError::InvalidDelay(ms))
}

pub fn validate_status_code(code: i64) -> Result<u16, MockServerError> {
    u16::try_from(code)
        .ok()
        .filter(|c| (MIN_STATUS..=MAX_STATUS).contains(c))
        .ok_or(MockServerError::InvalidStatusCode(code))
}
