//! Local store plus mirrored remote replica
//!
//! Every document is wrapped in a versioned envelope:
//!
//! ```json
//! { "schema_version": 1, "data": [ ... ] }
//! ```
//!
//! Writes go to the local tier first and are then mirrored to the remote
//! replica. Failures on either tier are logged and swallowed; the in-memory
//! repositories stay authoritative for the session.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::blob::BlobStore;
use super::keys::StorageKey;

/// Envelope version written by this build
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    schema_version: u32,
    data: Value,
}

pub struct TieredStore {
    local: Box<dyn BlobStore>,
    remote: Option<Box<dyn BlobStore>>,
}

impl TieredStore {
    pub fn new(local: Box<dyn BlobStore>, remote: Option<Box<dyn BlobStore>>) -> Self {
        Self { local, remote }
    }

    pub fn local_only(local: Box<dyn BlobStore>) -> Self {
        Self::new(local, None)
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Serialize `data`, write it locally and mirror it to the replica
    pub fn persist<T: Serialize>(&self, key: StorageKey, data: &T) {
        let payload = match serde_json::to_value(data) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "failed to serialize document");
                return;
            }
        };

        let envelope = wrap(payload);
        let name = key.to_string();

        if let Err(e) = self.local.put(&name, &envelope) {
            tracing::warn!(key = %key, error = %e, "local write failed");
        }

        if let Some(remote) = &self.remote {
            if let Err(e) = remote.put(&name, &envelope) {
                tracing::warn!(key = %key, error = %e, "remote mirror failed");
            }
        }
    }

    /// Write a payload to the local tier only (used when adopting remote state)
    pub fn write_local(&self, key: StorageKey, payload: &Value) {
        if let Err(e) = self.local.put(&key.to_string(), &wrap(payload.clone())) {
            tracing::warn!(key = %key, error = %e, "local write failed");
        }
    }

    /// Decode a local document, or `None` if it is missing or unreadable
    pub fn load<T: DeserializeOwned>(&self, key: StorageKey) -> Option<T> {
        let payload = read_payload(&*self.local, key)?;
        match serde_json::from_value(payload) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "malformed local snapshot, treating as empty");
                None
            }
        }
    }

    /// Decode a local document, falling back to the type's default
    pub fn load_or_default<T: DeserializeOwned + Default>(&self, key: StorageKey) -> T {
        self.load(key).unwrap_or_default()
    }

    /// Raw payload stored under `key` in the remote replica
    pub fn remote_payload(&self, key: StorageKey) -> Option<Value> {
        read_payload(self.remote.as_deref()?, key)
    }

    /// Every recognised key present in the remote replica
    pub fn remote_keys(&self) -> Vec<StorageKey> {
        let Some(remote) = &self.remote else {
            return Vec::new();
        };
        match remote.keys() {
            Ok(keys) => keys.iter().filter_map(|k| k.parse().ok()).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to list remote keys");
                Vec::new()
            }
        }
    }

    /// Remove a key from both tiers
    pub fn purge(&self, key: StorageKey) {
        let name = key.to_string();
        if let Err(e) = self.local.remove(&name) {
            tracing::warn!(key = %key, error = %e, "local remove failed");
        }
        if let Some(remote) = &self.remote {
            if let Err(e) = remote.remove(&name) {
                tracing::warn!(key = %key, error = %e, "remote remove failed");
            }
        }
    }
}

fn wrap(data: Value) -> Value {
    serde_json::json!({ "schema_version": SCHEMA_VERSION, "data": data })
}

fn read_payload(tier: &dyn BlobStore, key: StorageKey) -> Option<Value> {
    let document = match tier.get(&key.to_string()) {
        Ok(document) => document?,
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "unreadable snapshot, treating as empty");
            return None;
        }
    };

    match serde_json::from_value::<Envelope>(document) {
        Ok(envelope) if envelope.schema_version == SCHEMA_VERSION => Some(envelope.data),
        Ok(envelope) => {
            tracing::warn!(
                key = %key,
                version = envelope.schema_version,
                "unsupported schema version, treating as empty"
            );
            None
        }
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "snapshot is not an envelope, treating as empty");
            None
        }
    }
}
