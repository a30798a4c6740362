//! Storage layer
//!
//! Blob tiers hold one JSON document per logical key. Repositories keep the
//! decoded state in memory and persist through the shared [`TieredStore`],
//! which mirrors every local write to the remote replica.

pub mod blob;
pub mod keys;
pub mod lists;
pub mod records;
pub mod tiered;
pub mod vocabularies;

pub use blob::{BlobStore, FileBlobStore, MemoryBlobStore};
pub use keys::StorageKey;
pub use lists::ListRepository;
pub use records::RecordRepository;
pub use tiered::TieredStore;
pub use vocabularies::VocabularyRepository;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::audit::{diff_entities, generate_diff, AuditEntry, AuditLogger, EntityType, Operation};
use crate::config::{CouponPaths, Settings};
use crate::error::CouponResult;
use crate::models::{CouponList, DeletedRecord, ListId, Record, Vocabulary};
use crate::services::events::EventBus;

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: Option<CouponPaths>,
    store: Arc<TieredStore>,
    pub records: RecordRepository,
    pub lists: ListRepository,
    pub vocabularies: VocabularyRepository,
    pub events: EventBus,
    audit: Option<AuditLogger>,
}

impl Storage {
    /// File-backed storage under the data directory
    pub fn new(paths: CouponPaths, settings: &Settings) -> CouponResult<Self> {
        paths.ensure_directories()?;

        let local: Box<dyn BlobStore> = Box::new(FileBlobStore::new(paths.local_dir()));
        let remote: Option<Box<dyn BlobStore>> = if settings.remote_mirror_enabled {
            Some(Box::new(FileBlobStore::new(paths.remote_dir())))
        } else {
            None
        };

        let mut storage = Self::with_tiers(local, remote);
        storage.audit = Some(AuditLogger::new(paths.audit_log()));
        storage.paths = Some(paths);
        Ok(storage)
    }

    /// Storage over arbitrary tiers, without an audit log
    pub fn with_tiers(local: Box<dyn BlobStore>, remote: Option<Box<dyn BlobStore>>) -> Self {
        let store = Arc::new(TieredStore::new(local, remote));
        Self {
            paths: None,
            records: RecordRepository::new(Arc::clone(&store)),
            lists: ListRepository::new(Arc::clone(&store)),
            vocabularies: VocabularyRepository::new(Arc::clone(&store)),
            events: EventBus::new(),
            audit: None,
            store,
        }
    }

    /// Ephemeral storage with no remote replica
    pub fn in_memory() -> Self {
        Self::with_tiers(Box::new(MemoryBlobStore::new()), None)
    }

    pub fn with_audit(mut self, logger: AuditLogger) -> Self {
        self.audit = Some(logger);
        self
    }

    pub fn paths(&self) -> Option<&CouponPaths> {
        self.paths.as_ref()
    }

    pub fn tiers(&self) -> &TieredStore {
        &self.store
    }

    pub fn audit_logger(&self) -> Option<&AuditLogger> {
        self.audit.as_ref()
    }

    /// Load all repositories from the local tier
    pub fn load_all(&self) -> CouponResult<()> {
        self.records.load()?;
        self.lists.load()?;
        self.vocabularies.load()?;
        Ok(())
    }

    /// Every key the registry currently implies, plus the global keys
    pub fn tracked_keys(&self) -> CouponResult<Vec<StorageKey>> {
        let mut keys = vec![
            StorageKey::ListsInfo,
            StorageKey::ListsSelected,
            StorageKey::Types,
            StorageKey::DeletedRecords,
        ];
        for list in self.lists.get_all()? {
            keys.push(StorageKey::Records(list.id));
            keys.push(StorageKey::Categories(list.id));
            keys.push(StorageKey::DefaultCurrency(list.id));
        }
        Ok(keys)
    }

    /// In-memory value of a key, in its persisted JSON shape
    pub fn current_payload(&self, key: StorageKey) -> CouponResult<Value> {
        let value = match key {
            StorageKey::Records(id) => serde_json::to_value(self.records.get_scope(id)?)?,
            StorageKey::DeletedRecords => serde_json::to_value(self.records.get_deleted()?)?,
            StorageKey::Categories(id) => serde_json::to_value(self.vocabularies.categories(id)?)?,
            StorageKey::Types => serde_json::to_value(self.vocabularies.types()?)?,
            StorageKey::DefaultCurrency(id) => {
                serde_json::to_value(self.vocabularies.default_currency(id)?)?
            }
            StorageKey::ListsInfo => serde_json::to_value(self.lists.get_all()?)?,
            StorageKey::ListsSelected => serde_json::to_value(self.lists.selected()?)?,
        };
        Ok(value)
    }

    /// Replace in-memory state with a remote payload if it differs
    ///
    /// Returns `true` when the key was replaced. The adopted payload is
    /// written to the local tier only; mirroring it back would be a no-op.
    pub fn apply_remote(&self, key: StorageKey, payload: &Value) -> CouponResult<bool> {
        let current = self.current_payload(key)?;

        let applied = match key {
            StorageKey::Records(id) => match decode_changed::<Vec<Record>>(key, payload, &current) {
                Some(records) => {
                    self.records.set_scope(id, records)?;
                    true
                }
                None => false,
            },
            StorageKey::DeletedRecords => {
                match decode_changed::<Vec<DeletedRecord>>(key, payload, &current) {
                    Some(deleted) => {
                        self.records.set_deleted(deleted)?;
                        true
                    }
                    None => false,
                }
            }
            StorageKey::Categories(id) => {
                match decode_changed::<Vocabulary>(key, payload, &current) {
                    Some(vocabulary) => {
                        self.vocabularies.set_categories(id, vocabulary)?;
                        true
                    }
                    None => false,
                }
            }
            StorageKey::Types => match decode_changed::<Vocabulary>(key, payload, &current) {
                Some(vocabulary) => {
                    self.vocabularies.set_types(vocabulary)?;
                    true
                }
                None => false,
            },
            StorageKey::DefaultCurrency(id) => {
                match decode_changed::<Option<String>>(key, payload, &current) {
                    Some(code) => {
                        self.vocabularies.set_default_currency(id, code)?;
                        true
                    }
                    None => false,
                }
            }
            StorageKey::ListsInfo => {
                match decode_changed::<Vec<CouponList>>(key, payload, &current) {
                    Some(lists) => {
                        self.lists.set_all(lists)?;
                        true
                    }
                    None => false,
                }
            }
            StorageKey::ListsSelected => match decode_changed::<ListId>(key, payload, &current) {
                Some(id) => {
                    self.lists.set_selected(id)?;
                    true
                }
                None => false,
            },
        };

        if applied {
            self.store.write_local(key, payload);
            tracing::info!(key = %key, "adopted remote snapshot");
            self.audit(AuditEntry::change(
                Operation::Replace,
                entity_type_for(key),
                key.to_string(),
                None,
                &current,
                payload,
                generate_diff(&current, payload),
            ));
        }

        Ok(applied)
    }

    /// Append an entry to the audit log; failures are logged and ignored
    pub fn audit(&self, entry: AuditEntry) {
        if let Some(logger) = &self.audit {
            if let Err(e) = logger.log(&entry) {
                tracing::warn!(error = %e, "failed to write audit entry");
            }
        }
    }

    pub fn log_create<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) {
        self.audit(AuditEntry::create(entity_type, entity_id, entity_name, entity));
    }

    pub fn log_update<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        before: &T,
        after: &T,
    ) {
        let diff = diff_entities(before, after);
        self.audit(AuditEntry::change(
            Operation::Update,
            entity_type,
            entity_id,
            entity_name,
            before,
            after,
            diff,
        ));
    }

    pub fn log_delete<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) {
        self.audit(AuditEntry::removal(
            Operation::Delete,
            entity_type,
            entity_id,
            entity_name,
            entity,
        ));
    }
}

fn entity_type_for(key: StorageKey) -> EntityType {
    match key {
        StorageKey::Records(_) => EntityType::Record,
        StorageKey::DeletedRecords => EntityType::DeletedRecord,
        StorageKey::Categories(_) | StorageKey::Types | StorageKey::DefaultCurrency(_) => {
            EntityType::Vocabulary
        }
        StorageKey::ListsInfo => EntityType::List,
        StorageKey::ListsSelected => EntityType::Selection,
    }
}

/// Decode a remote payload, returning it only if it differs from `current`
///
/// Both sides are compared in canonical form (decoded then re-encoded), so a
/// payload that omits optional fields equals local state that spells them out.
fn decode_changed<T: DeserializeOwned + Serialize>(
    key: StorageKey,
    payload: &Value,
    current: &Value,
) -> Option<T> {
    let value: T = match serde_json::from_value(payload.clone()) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "undecodable remote payload, skipped");
            return None;
        }
    };
    match serde_json::to_value(&value) {
        Ok(canonical) if &canonical == current => None,
        Ok(_) => Some(value),
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "failed to re-encode remote payload");
            None
        }
    }
}
