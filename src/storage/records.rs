//! Record repository
//!
//! Holds the record scopes (one ordered array per list id) and the global
//! Recently Deleted collection. Scopes are read from the local tier the
//! first time they are touched.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use crate::error::CouponError;
use crate::models::{DeletedRecord, ListId, Record, RecordId};

use super::keys::StorageKey;
use super::tiered::TieredStore;

pub struct RecordRepository {
    store: Arc<TieredStore>,
    scopes: RwLock<HashMap<ListId, Vec<Record>>>,
    deleted: RwLock<Vec<DeletedRecord>>,
}

fn lock_err(e: impl std::fmt::Display, kind: &str) -> CouponError {
    CouponError::Storage(format!("Failed to acquire {} lock: {}", kind, e))
}

impl RecordRepository {
    pub fn new(store: Arc<TieredStore>) -> Self {
        Self {
            store,
            scopes: RwLock::new(HashMap::new()),
            deleted: RwLock::new(Vec::new()),
        }
    }

    /// Load the deleted collection and forget cached scopes
    pub fn load(&self) -> Result<(), CouponError> {
        let deleted: Vec<DeletedRecord> = self.store.load_or_default(StorageKey::DeletedRecords);
        *self.deleted.write().map_err(|e| lock_err(e, "write"))? = deleted;
        self.scopes.write().map_err(|e| lock_err(e, "write"))?.clear();
        Ok(())
    }

    fn with_scope<R>(
        &self,
        list_id: ListId,
        f: impl FnOnce(&mut Vec<Record>) -> R,
    ) -> Result<R, CouponError> {
        let mut scopes = self.scopes.write().map_err(|e| lock_err(e, "write"))?;
        let scope = scopes
            .entry(list_id)
            .or_insert_with(|| self.store.load_or_default(StorageKey::Records(list_id)));
        Ok(f(scope))
    }

    /// Records stored under a list, in backing order; empty if none exist
    pub fn get_scope(&self, list_id: ListId) -> Result<Vec<Record>, CouponError> {
        {
            let scopes = self.scopes.read().map_err(|e| lock_err(e, "read"))?;
            if let Some(scope) = scopes.get(&list_id) {
                return Ok(scope.clone());
            }
        }
        self.with_scope(list_id, |scope| scope.clone())
    }

    pub fn get(&self, list_id: ListId, id: RecordId) -> Result<Option<Record>, CouponError> {
        Ok(self.get_scope(list_id)?.into_iter().find(|r| r.id == id))
    }

    pub fn count(&self, list_id: ListId) -> Result<usize, CouponError> {
        Ok(self.get_scope(list_id)?.len())
    }

    pub fn append(&self, list_id: ListId, record: Record) -> Result<(), CouponError> {
        self.with_scope(list_id, |scope| scope.push(record))
    }

    /// Replace the record with the same id; false if it isn't in the scope
    pub fn replace(&self, list_id: ListId, record: Record) -> Result<bool, CouponError> {
        self.with_scope(list_id, |scope| match scope.iter_mut().find(|r| r.id == record.id) {
            Some(slot) => {
                *slot = record;
                true
            }
            None => false,
        })
    }

    /// Replace if present, else append
    pub fn upsert(&self, list_id: ListId, record: Record) -> Result<(), CouponError> {
        self.with_scope(list_id, |scope| match scope.iter_mut().find(|r| r.id == record.id) {
            Some(slot) => *slot = record,
            None => scope.push(record),
        })
    }

    pub fn remove(&self, list_id: ListId, id: RecordId) -> Result<Option<Record>, CouponError> {
        self.with_scope(list_id, |scope| {
            scope
                .iter()
                .position(|r| r.id == id)
                .map(|index| scope.remove(index))
        })
    }

    /// Replace a whole scope (reorders, remote adoption)
    pub fn set_scope(&self, list_id: ListId, records: Vec<Record>) -> Result<(), CouponError> {
        let mut scopes = self.scopes.write().map_err(|e| lock_err(e, "write"))?;
        scopes.insert(list_id, records);
        Ok(())
    }

    /// Drop a scope from memory and both tiers, returning its records
    pub fn drop_scope(&self, list_id: ListId) -> Result<Vec<Record>, CouponError> {
        let records = self.get_scope(list_id)?;
        self.scopes
            .write()
            .map_err(|e| lock_err(e, "write"))?
            .remove(&list_id);
        self.store.purge(StorageKey::Records(list_id));
        Ok(records)
    }

    pub fn save_scope(&self, list_id: ListId) -> Result<(), CouponError> {
        let records = self.get_scope(list_id)?;
        self.store.persist(StorageKey::Records(list_id), &records);
        Ok(())
    }

    // Recently Deleted

    /// Deleted records, most recent first
    pub fn get_deleted(&self) -> Result<Vec<DeletedRecord>, CouponError> {
        Ok(self.deleted.read().map_err(|e| lock_err(e, "read"))?.clone())
    }

    pub fn deleted_count(&self) -> Result<usize, CouponError> {
        Ok(self.deleted.read().map_err(|e| lock_err(e, "read"))?.len())
    }

    pub fn get_deleted_by_id(&self, id: RecordId) -> Result<Option<DeletedRecord>, CouponError> {
        let deleted = self.deleted.read().map_err(|e| lock_err(e, "read"))?;
        Ok(deleted.iter().find(|d| d.id() == id).cloned())
    }

    /// Insert at the head, replacing any older entry with the same id
    pub fn push_deleted(&self, entry: DeletedRecord) -> Result<(), CouponError> {
        let mut deleted = self.deleted.write().map_err(|e| lock_err(e, "write"))?;
        deleted.retain(|d| d.id() != entry.id());
        deleted.insert(0, entry);
        Ok(())
    }

    pub fn remove_deleted(&self, id: RecordId) -> Result<Option<DeletedRecord>, CouponError> {
        let mut deleted = self.deleted.write().map_err(|e| lock_err(e, "write"))?;
        Ok(deleted
            .iter()
            .position(|d| d.id() == id)
            .map(|index| deleted.remove(index)))
    }

    pub fn set_deleted(&self, entries: Vec<DeletedRecord>) -> Result<(), CouponError> {
        *self.deleted.write().map_err(|e| lock_err(e, "write"))? = entries;
        Ok(())
    }

    /// Remove entries older than the retention window
    pub fn take_expired(
        &self,
        now: DateTime<Utc>,
        retention_days: i64,
    ) -> Result<Vec<DeletedRecord>, CouponError> {
        let mut deleted = self.deleted.write().map_err(|e| lock_err(e, "write"))?;
        let (expired, kept): (Vec<_>, Vec<_>) = deleted
            .drain(..)
            .partition(|d| d.is_expired(now, retention_days));
        *deleted = kept;
        Ok(expired)
    }

    pub fn save_deleted(&self) -> Result<(), CouponError> {
        let deleted = self.get_deleted()?;
        self.store.persist(StorageKey::DeletedRecords, &deleted);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Money, RecordDraft};
    use crate::storage::blob::MemoryBlobStore;

    fn create_test_repo() -> (Arc<TieredStore>, RecordRepository) {
        let store = Arc::new(TieredStore::local_only(Box::new(MemoryBlobStore::new())));
        let repo = RecordRepository::new(Arc::clone(&store));
        repo.load().unwrap();
        (store, repo)
    }

    fn record(name: &str) -> Record {
        Record::new(RecordDraft::new(name, "CODE").with_value(Money::from_cents(500), "USD"))
    }

    #[test]
    fn test_empty_scope() {
        let (_store, repo) = create_test_repo();
        assert!(repo.get_scope(ListId::new()).unwrap().is_empty());
    }

    #[test]
    fn test_append_replace_remove() {
        let (_store, repo) = create_test_repo();
        let list = ListId::new();
        let mut coffee = record("Coffee");

        repo.append(list, coffee.clone()).unwrap();
        coffee.name = "Espresso".into();
        assert!(repo.replace(list, coffee.clone()).unwrap());
        assert_eq!(repo.get(list, coffee.id).unwrap().unwrap().name, "Espresso");

        assert!(!repo.replace(list, record("Stranger")).unwrap());
        assert_eq!(repo.count(list).unwrap(), 1);

        assert!(repo.remove(list, coffee.id).unwrap().is_some());
        assert!(repo.remove(list, coffee.id).unwrap().is_none());
    }

    #[test]
    fn test_save_and_reload_scope() {
        let (store, repo) = create_test_repo();
        let list = ListId::new();
        repo.append(list, record("Books")).unwrap();
        repo.append(list, record("Apps")).unwrap();
        repo.save_scope(list).unwrap();

        let reloaded = RecordRepository::new(store);
        reloaded.load().unwrap();
        let names: Vec<_> = reloaded
            .get_scope(list)
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["Books", "Apps"]);
    }

    #[test]
    fn test_push_deleted_dedups_by_id() {
        let (_store, repo) = create_test_repo();
        let r = record("Coffee");
        repo.push_deleted(DeletedRecord::new(r.clone(), Utc::now())).unwrap();
        repo.push_deleted(DeletedRecord::new(record("Tea"), Utc::now())).unwrap();
        repo.push_deleted(DeletedRecord::new(r.clone(), Utc::now())).unwrap();

        let deleted = repo.get_deleted().unwrap();
        assert_eq!(deleted.len(), 2);
        assert_eq!(deleted[0].id(), r.id);
    }

    #[test]
    fn test_take_expired() {
        let (_store, repo) = create_test_repo();
        let now = Utc::now();
        repo.push_deleted(DeletedRecord::new(record("Old"), now - chrono::Duration::days(41)))
            .unwrap();
        repo.push_deleted(DeletedRecord::new(record("New"), now)).unwrap();

        let expired = repo.take_expired(now, 40).unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].record.name, "Old");
        assert_eq!(repo.deleted_count().unwrap(), 1);
    }
}
