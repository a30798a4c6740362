//! Remote replica reconciliation
//!
//! Pulls replace local state key by key whenever the remote payload differs
//! (remote wins). The same pass also runs the Recently Deleted retention
//! sweep on foreground events.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::audit::{AuditEntry, EntityType, Operation};
use crate::config::settings::DEFAULT_RETENTION_DAYS;
use crate::error::CouponResult;
use crate::models::{DeletedRecord, ListId};
use crate::storage::{Storage, StorageKey};

use super::entitlement::{EntitlementGuard, GatedAction};
use super::events::CouponEvent;

/// Outcome of a foreground pass
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Keys whose local state was replaced by the remote payload
    pub applied: Vec<StorageKey>,
    /// Deleted records removed by the retention sweep
    pub purged: Vec<DeletedRecord>,
}

impl SyncReport {
    pub fn is_empty(&self) -> bool {
        self.applied.is_empty() && self.purged.is_empty()
    }
}

/// Merges the remote replica into local state
pub struct SyncReconciler<'a> {
    storage: &'a Storage,
    guard: Option<&'a EntitlementGuard>,
    retention_days: i64,
}

impl<'a> SyncReconciler<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self {
            storage,
            guard: None,
            retention_days: DEFAULT_RETENTION_DAYS,
        }
    }

    /// Re-check a pulled selection against this device's entitlement
    pub fn with_guard(mut self, guard: &'a EntitlementGuard) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn with_retention_days(mut self, days: i64) -> Self {
        self.retention_days = days;
        self
    }

    /// Adopt every remote payload that differs from local state
    ///
    /// The list registry is pulled first so scopes of lists created on
    /// another device are reconciled in the same pass. Keys absent from the
    /// replica are left alone. Pulling twice is a no-op.
    pub fn pull(&self) -> CouponResult<Vec<StorageKey>> {
        if !self.storage.tiers().has_remote() {
            return Ok(Vec::new());
        }

        let mut applied = Vec::new();
        let mut visited = BTreeSet::new();

        for key in [StorageKey::ListsInfo, StorageKey::ListsSelected] {
            visited.insert(key);
            if self.pull_key(key)? {
                applied.push(key);
            }
        }

        for key in self.storage.tracked_keys()? {
            if !visited.insert(key) {
                continue;
            }
            if self.pull_key(key)? {
                applied.push(key);
            }
        }

        self.repair_selection()?;

        if !applied.is_empty() {
            tracing::info!(keys = applied.len(), "pulled remote changes");
            self.storage
                .events
                .publish(CouponEvent::RemoteApplied(applied.clone()));
        }
        Ok(applied)
    }

    fn pull_key(&self, key: StorageKey) -> CouponResult<bool> {
        match self.storage.tiers().remote_payload(key) {
            Some(payload) => self.storage.apply_remote(key, &payload),
            None => Ok(false),
        }
    }

    /// A pulled selection may point at a vanished list, or at a custom
    /// list this device is not entitled to select
    fn repair_selection(&self) -> CouponResult<()> {
        let Some(selected) = self.storage.lists.selected()? else {
            return Ok(());
        };
        if selected.is_recently_deleted() {
            return Ok(());
        }

        let lists = self.storage.lists.get_all()?;
        let reason = match lists.iter().find(|l| l.id == selected) {
            None => "selected list vanished after pull",
            Some(list) if list.is_default => return Ok(()),
            Some(_) => {
                let entitled = self.guard.map_or(true, |guard| {
                    guard
                        .check(GatedAction::SelectList { is_default: false })
                        .is_allowed()
                });
                if entitled {
                    return Ok(());
                }
                "pulled selection needs an upgrade"
            }
        };

        let fallback: Option<ListId> = lists
            .iter()
            .find(|l| l.is_default)
            .or_else(|| lists.first())
            .map(|l| l.id);
        if let Some(fallback) = fallback {
            tracing::debug!(from = %selected, to = %fallback, "{}", reason);
            self.storage.lists.set_selected(fallback)?;
            self.storage.lists.save_selected()?;
            self.storage
                .events
                .publish(CouponEvent::SelectionChanged(fallback));
        }
        Ok(())
    }

    /// Remote-change notification
    pub fn on_remote_change(&self) -> CouponResult<Vec<StorageKey>> {
        self.pull()
    }

    /// App-resume: pull, then sweep expired deleted records
    pub fn on_foreground(&self, now: DateTime<Utc>) -> CouponResult<SyncReport> {
        let applied = self.pull()?;
        let purged = self.sweep_retention(now)?;
        Ok(SyncReport { applied, purged })
    }

    /// Permanently remove deleted records older than the retention window
    ///
    /// The trimmed collection is written to both tiers.
    pub fn sweep_retention(&self, now: DateTime<Utc>) -> CouponResult<Vec<DeletedRecord>> {
        let expired = self.storage.records.take_expired(now, self.retention_days)?;
        if expired.is_empty() {
            return Ok(expired);
        }

        self.storage.records.save_deleted()?;
        for entry in &expired {
            self.storage.audit(AuditEntry::removal(
                Operation::Purge,
                EntityType::DeletedRecord,
                entry.id().to_string(),
                Some(entry.record.name.clone()),
                entry,
            ));
        }

        tracing::info!(
            purged = expired.len(),
            retention_days = self.retention_days,
            "retention sweep"
        );
        self.storage.events.publish(CouponEvent::DeletedChanged);
        Ok(expired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CouponList, DefaultList, Money, Record, RecordDraft};
    use crate::services::entitlement::{EntitlementGuard, StaticEntitlement};
    use crate::services::list::ListService;
    use crate::services::record::RecordService;
    use crate::storage::{BlobStore, MemoryBlobStore};
    use chrono::Duration;
    use std::sync::{Arc, Mutex};

    fn device(remote: &Arc<MemoryBlobStore>) -> Storage {
        let storage = Storage::with_tiers(
            Box::new(MemoryBlobStore::new()),
            Some(Box::new(Arc::clone(remote))),
        );
        storage.load_all().unwrap();
        storage
    }

    #[test]
    fn test_pull_adopts_other_device_changes() {
        let remote = Arc::new(MemoryBlobStore::new());
        let phone = device(&remote);
        let tablet = device(&remote);
        let guard = EntitlementGuard::unlocked();

        ListService::new(&phone, &guard).ensure_defaults().unwrap();
        ListService::new(&tablet, &guard).ensure_defaults().unwrap();

        let travel = ListService::new(&phone, &guard)
            .create_list(CouponList::new("Travel"))
            .unwrap();
        let record = RecordService::new(&phone, &guard)
            .add(
                travel.id,
                RecordDraft::new("Lounge", "L-1").with_value(Money::from_cents(5000), "EUR"),
            )
            .unwrap();

        let applied = SyncReconciler::new(&tablet).pull().unwrap();
        assert!(applied.contains(&StorageKey::ListsInfo));
        assert!(applied.contains(&StorageKey::Records(travel.id)));
        assert_eq!(tablet.records.get_scope(travel.id).unwrap(), vec![record]);

        assert!(SyncReconciler::new(&tablet).pull().unwrap().is_empty());
    }

    #[test]
    fn test_identical_defaults_do_not_churn() {
        let remote = Arc::new(MemoryBlobStore::new());
        let phone = device(&remote);
        let tablet = device(&remote);
        let guard = EntitlementGuard::unlocked();

        ListService::new(&phone, &guard).ensure_defaults().unwrap();
        ListService::new(&tablet, &guard).ensure_defaults().unwrap();

        assert!(SyncReconciler::new(&phone).pull().unwrap().is_empty());
    }

    #[test]
    fn test_pull_without_remote_is_noop() {
        let storage = Storage::in_memory();
        storage.load_all().unwrap();
        assert!(SyncReconciler::new(&storage).pull().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_remote_payload_is_skipped() {
        let remote = Arc::new(MemoryBlobStore::new());
        let storage = device(&remote);
        let guard = EntitlementGuard::unlocked();
        ListService::new(&storage, &guard).ensure_defaults().unwrap();

        remote
            .put(
                "lists.info",
                &serde_json::json!({ "schema_version": 1, "data": "not a list" }),
            )
            .unwrap();

        SyncReconciler::new(&storage).pull().unwrap();
        assert_eq!(storage.lists.count().unwrap(), 3);
    }

    #[test]
    fn test_selection_repaired_when_list_vanishes() {
        let remote = Arc::new(MemoryBlobStore::new());
        let phone = device(&remote);
        let tablet = device(&remote);
        let guard = EntitlementGuard::unlocked();

        ListService::new(&phone, &guard).ensure_defaults().unwrap();
        let travel = ListService::new(&phone, &guard)
            .create_list(CouponList::new("Travel"))
            .unwrap();
        SyncReconciler::new(&tablet).pull().unwrap();
        ListService::new(&tablet, &guard).select_list(travel.id).unwrap();

        ListService::new(&phone, &guard).delete_list(travel.id).unwrap();
        SyncReconciler::new(&tablet).pull().unwrap();

        let selected = ListService::new(&tablet, &guard).selected().unwrap();
        assert_eq!(selected.id, DefaultList::GiftCards.id());
    }

    #[test]
    fn test_pulled_custom_selection_needs_entitlement() {
        let remote = Arc::new(MemoryBlobStore::new());
        let phone = device(&remote);
        let tablet = device(&remote);
        let unlocked = EntitlementGuard::unlocked();
        let free = EntitlementGuard::new(Box::new(StaticEntitlement(false)), 10);

        ListService::new(&phone, &unlocked).ensure_defaults().unwrap();
        ListService::new(&tablet, &free).ensure_defaults().unwrap();
        let travel = ListService::new(&phone, &unlocked)
            .create_list(CouponList::new("Travel"))
            .unwrap();
        ListService::new(&phone, &unlocked).select_list(travel.id).unwrap();

        SyncReconciler::new(&tablet).with_guard(&free).pull().unwrap();

        let selected = ListService::new(&tablet, &free).selected().unwrap();
        assert_eq!(selected.id, DefaultList::GiftCards.id());
        assert!(tablet.lists.get(travel.id).unwrap().is_some());

        // An entitled device keeps the pulled selection
        let laptop = device(&remote);
        SyncReconciler::new(&laptop).with_guard(&unlocked).pull().unwrap();
        assert_eq!(laptop.lists.selected().unwrap(), Some(travel.id));
    }

    #[test]
    fn test_remote_applied_event() {
        let remote = Arc::new(MemoryBlobStore::new());
        let phone = device(&remote);
        let tablet = device(&remote);
        let guard = EntitlementGuard::unlocked();
        ListService::new(&phone, &guard).ensure_defaults().unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        tablet.events.subscribe(move |event| {
            sink.lock().unwrap().push(event.event_type());
        });

        SyncReconciler::new(&tablet).on_remote_change().unwrap();
        assert!(seen.lock().unwrap().contains(&"remote.applied"));
    }

    #[test]
    fn test_retention_sweep() {
        let storage = Storage::in_memory();
        storage.load_all().unwrap();
        let t0 = Utc::now();

        let old = Record::new(RecordDraft::new("Old", "O"));
        let recent = Record::new(RecordDraft::new("Recent", "R"));
        storage
            .records
            .push_deleted(DeletedRecord::new(old.clone(), t0))
            .unwrap();
        storage
            .records
            .push_deleted(DeletedRecord::new(recent.clone(), t0 + Duration::days(30)))
            .unwrap();

        let reconciler = SyncReconciler::new(&storage);
        let purged = reconciler.sweep_retention(t0 + Duration::days(41)).unwrap();
        assert_eq!(purged.len(), 1);
        assert_eq!(purged[0].id(), old.id);

        let remaining = storage.records.get_deleted().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id(), recent.id);

        assert!(reconciler
            .sweep_retention(t0 + Duration::days(41))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_foreground_pulls_then_sweeps() {
        let remote = Arc::new(MemoryBlobStore::new());
        let phone = device(&remote);
        let tablet = device(&remote);
        let guard = EntitlementGuard::unlocked();
        ListService::new(&phone, &guard).ensure_defaults().unwrap();

        let t0 = Utc::now();
        let coupon = RecordService::new(&phone, &guard)
            .add(DefaultList::Coupons.id(), RecordDraft::new("Shoes", "S"))
            .unwrap();
        RecordService::new(&phone, &guard)
            .delete_at(DefaultList::Coupons.id(), coupon.id, t0)
            .unwrap();

        let report = SyncReconciler::new(&tablet)
            .on_foreground(t0 + Duration::days(41))
            .unwrap();
        assert!(report.applied.contains(&StorageKey::DeletedRecords));
        assert_eq!(report.purged.len(), 1);
        assert_eq!(tablet.records.deleted_count().unwrap(), 0);

        SyncReconciler::new(&phone).pull().unwrap();
        assert_eq!(phone.records.deleted_count().unwrap(), 0);
    }
}
