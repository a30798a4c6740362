//! Record service
//!
//! Mutations on record scopes and on the Recently Deleted collection. Every
//! successful mutation persists the affected keys, appends an audit entry
//! and publishes a change event.

use chrono::{DateTime, Utc};

use crate::audit::{diff_entities, AuditEntry, EntityType, Operation};
use crate::error::{CouponError, CouponResult};
use crate::models::{CouponList, DeletedRecord, ListId, Money, Record, RecordDraft, RecordId};
use crate::storage::Storage;

use super::aggregation::AggregationService;
use super::entitlement::{Access, EntitlementGuard, GatedAction};
use super::events::CouponEvent;
use super::grouping::{self, MoveIntent};

/// Currency used when neither the draft nor the list names one
pub const FALLBACK_CURRENCY: &str = "USD";

/// Service for record management
pub struct RecordService<'a> {
    storage: &'a Storage,
    guard: &'a EntitlementGuard,
    fallback_currency: String,
}

impl<'a> RecordService<'a> {
    pub fn new(storage: &'a Storage, guard: &'a EntitlementGuard) -> Self {
        Self {
            storage,
            guard,
            fallback_currency: FALLBACK_CURRENCY.to_string(),
        }
    }

    pub fn with_fallback_currency(mut self, code: impl Into<String>) -> Self {
        self.fallback_currency = code.into();
        self
    }

    /// Records stored under a list, in backing order
    pub fn load(&self, list_id: ListId) -> CouponResult<Vec<Record>> {
        self.storage.records.get_scope(list_id)
    }

    /// Locate a record in any registered scope
    pub fn find(&self, id: RecordId) -> CouponResult<Option<(ListId, Record)>> {
        for list in self.storage.lists.get_all()? {
            if let Some(record) = self.storage.records.get(list.id, id)? {
                return Ok(Some((list.id, record)));
            }
        }
        Ok(None)
    }

    /// Find a record by id string or by exact name (case-insensitive)
    pub fn find_by_identifier(&self, identifier: &str) -> CouponResult<Option<(ListId, Record)>> {
        if let Ok(id) = identifier.parse::<RecordId>() {
            if let Some(found) = self.find(id)? {
                return Ok(Some(found));
            }
        }

        let needle = identifier.trim().to_lowercase();
        for list in self.storage.lists.get_all()? {
            for record in self.storage.records.get_scope(list.id)? {
                if record.name.trim().to_lowercase() == needle
                    || record.id.to_string() == identifier
                {
                    return Ok(Some((list.id, record)));
                }
            }
        }
        Ok(None)
    }

    fn gate(&self, action: GatedAction) -> CouponResult<()> {
        let access = self.guard.check(action);
        if let Access::Denied(reason) = &access {
            self.storage
                .events
                .publish(CouponEvent::UpsellRequested(reason.clone()));
        }
        access.into_result()
    }

    fn require_list(&self, list_id: ListId) -> CouponResult<CouponList> {
        if list_id.is_recently_deleted() {
            return Err(CouponError::Validation(
                "Records cannot be stored in Recently Deleted".into(),
            ));
        }
        self.storage
            .lists
            .get(list_id)?
            .ok_or_else(|| CouponError::list_not_found(list_id.to_string()))
    }

    fn check_quota(&self) -> CouponResult<()> {
        let existing = AggregationService::new(self.storage).stored_record_count()?;
        self.gate(GatedAction::AddRecord { existing })
    }

    /// Create a record in a list scope
    ///
    /// A blank currency takes the list default; records created from a smart
    /// list take its implied type so they show up in it.
    pub fn add(&self, list_id: ListId, mut draft: RecordDraft) -> CouponResult<Record> {
        let list = self.require_list(list_id)?;
        self.check_quota()?;

        if draft.currency_code.trim().is_empty() {
            draft.currency_code = self
                .storage
                .vocabularies
                .default_currency(list_id)?
                .unwrap_or_else(|| self.fallback_currency.clone());
        }
        if draft.record_type.is_none() {
            draft.record_type = list.implied_type().map(str::to_string);
        }

        let record = Record::new(draft);
        record
            .validate()
            .map_err(|e| CouponError::Validation(e.to_string()))?;

        self.storage.records.append(list_id, record.clone())?;
        self.storage.records.save_scope(list_id)?;

        tracing::debug!(record = %record.id, list = %list_id, "record added");
        self.storage.audit(
            AuditEntry::create(
                EntityType::Record,
                record.id.to_string(),
                Some(record.name.clone()),
                &record,
            )
            .in_scope(list_id.to_string()),
        );
        self.storage.events.publish(CouponEvent::RecordsChanged(list_id));

        Ok(record)
    }

    /// Replace a record by id; `Ok(false)` if it isn't in the scope
    ///
    /// The stored creation time is kept whatever the replacement carries.
    pub fn update(&self, list_id: ListId, mut record: Record) -> CouponResult<bool> {
        record
            .validate()
            .map_err(|e| CouponError::Validation(e.to_string()))?;

        let Some(before) = self.storage.records.get(list_id, record.id)? else {
            return Ok(false);
        };
        record.created_at = before.created_at;

        self.storage.records.replace(list_id, record.clone())?;
        self.storage.records.save_scope(list_id)?;

        self.storage.audit(
            AuditEntry::change(
                Operation::Update,
                EntityType::Record,
                record.id.to_string(),
                Some(record.name.clone()),
                &before,
                &record,
                diff_entities(&before, &record),
            )
            .in_scope(list_id.to_string()),
        );
        self.storage.events.publish(CouponEvent::RecordsChanged(list_id));
        Ok(true)
    }

    /// Move a record to Recently Deleted
    ///
    /// Deleting from the Recently Deleted pseudo-list removes the entry for
    /// good. `Ok(false)` if the record isn't in the scope.
    pub fn delete(&self, list_id: ListId, id: RecordId) -> CouponResult<bool> {
        self.delete_at(list_id, id, Utc::now())
    }

    pub fn delete_at(&self, list_id: ListId, id: RecordId, now: DateTime<Utc>) -> CouponResult<bool> {
        if list_id.is_recently_deleted() {
            return self.permanently_delete(id);
        }

        let Some(record) = self.storage.records.remove(list_id, id)? else {
            return Ok(false);
        };

        let entry = DeletedRecord::new(record, now);
        self.storage.records.push_deleted(entry.clone())?;
        self.storage.records.save_scope(list_id)?;
        self.storage.records.save_deleted()?;

        tracing::debug!(record = %id, list = %list_id, "record moved to Recently Deleted");
        self.storage.audit(
            AuditEntry::removal(
                Operation::Delete,
                EntityType::Record,
                id.to_string(),
                Some(entry.record.name.clone()),
                &entry.record,
            )
            .in_scope(list_id.to_string()),
        );
        self.storage.events.publish(CouponEvent::RecordsChanged(list_id));
        self.storage.events.publish(CouponEvent::DeletedChanged);
        Ok(true)
    }

    /// Remove an entry from Recently Deleted for good
    pub fn permanently_delete(&self, id: RecordId) -> CouponResult<bool> {
        let Some(entry) = self.storage.records.remove_deleted(id)? else {
            return Ok(false);
        };
        self.storage.records.save_deleted()?;

        self.storage.audit(AuditEntry::removal(
            Operation::Purge,
            EntityType::DeletedRecord,
            id.to_string(),
            Some(entry.record.name.clone()),
            &entry,
        ));
        self.storage.events.publish(CouponEvent::DeletedChanged);
        Ok(true)
    }

    /// Debit a record's balance, clamping at zero
    ///
    /// A non-positive amount is a validation error. `Ok(false)` if the
    /// record is missing or has no tracked balance.
    pub fn use_amount(&self, list_id: ListId, id: RecordId, amount: Money) -> CouponResult<bool> {
        if !amount.is_positive() {
            return Err(CouponError::Validation(
                "Amount used must be greater than zero".into(),
            ));
        }

        let Some(before) = self.storage.records.get(list_id, id)? else {
            return Ok(false);
        };
        let mut record = before.clone();
        if !record.debit(amount) {
            return Ok(false);
        }

        self.storage.records.replace(list_id, record.clone())?;
        self.storage.records.save_scope(list_id)?;

        self.storage.audit(
            AuditEntry::change(
                Operation::Debit,
                EntityType::Record,
                id.to_string(),
                Some(record.name.clone()),
                &before,
                &record,
                diff_entities(&before, &record),
            )
            .in_scope(list_id.to_string()),
        );
        self.storage.events.publish(CouponEvent::RecordsChanged(list_id));
        Ok(true)
    }

    /// Move a record between scopes
    ///
    /// The record is removed from `from` and upserted into `to`; both scopes
    /// are persisted. Moving within one scope is an update.
    pub fn move_record(&self, record: Record, from: ListId, to: ListId) -> CouponResult<bool> {
        if from == to {
            return self.update(from, record);
        }

        self.require_list(to)?;
        record
            .validate()
            .map_err(|e| CouponError::Validation(e.to_string()))?;

        let before = self.storage.records.remove(from, record.id)?;
        self.storage.records.upsert(to, record.clone())?;
        self.storage.records.save_scope(from)?;
        self.storage.records.save_scope(to)?;

        tracing::debug!(record = %record.id, from = %from, to = %to, "record moved");
        self.storage.audit(
            AuditEntry::change(
                Operation::Move,
                EntityType::Record,
                record.id.to_string(),
                Some(record.name.clone()),
                &before,
                &Some(record.clone()),
                Some(format!("scope: {} -> {}", from, to)),
            )
            .in_scope(to.to_string()),
        );
        self.storage.events.publish(CouponEvent::RecordsChanged(from));
        self.storage.events.publish(CouponEvent::RecordsChanged(to));
        Ok(true)
    }

    /// Bring a record back from Recently Deleted into a list
    pub fn restore(&self, id: RecordId, to: ListId) -> CouponResult<bool> {
        self.require_list(to)?;
        if self.storage.records.get_deleted_by_id(id)?.is_none() {
            return Ok(false);
        }
        self.check_quota()?;

        let Some(entry) = self.storage.records.remove_deleted(id)? else {
            return Ok(false);
        };
        self.storage.records.upsert(to, entry.record.clone())?;
        self.storage.records.save_scope(to)?;
        self.storage.records.save_deleted()?;

        self.storage.audit(
            AuditEntry::create(
                EntityType::Record,
                id.to_string(),
                Some(entry.record.name.clone()),
                &entry.record,
            )
            .in_scope(to.to_string()),
        );
        self.storage.audit(AuditEntry::removal(
            Operation::Restore,
            EntityType::DeletedRecord,
            id.to_string(),
            Some(entry.record.name.clone()),
            &entry,
        ));
        self.storage.events.publish(CouponEvent::RecordsChanged(to));
        self.storage.events.publish(CouponEvent::DeletedChanged);
        Ok(true)
    }

    /// Deleted records, most recent first
    pub fn list_deleted(&self) -> CouponResult<Vec<DeletedRecord>> {
        self.storage.records.get_deleted()
    }

    /// Apply a drag-and-drop intent to a scope's backing order
    pub fn reorder(&self, list_id: ListId, intent: &MoveIntent) -> CouponResult<bool> {
        let vocabulary = self.storage.vocabularies.categories(list_id)?;
        let mut records = self.storage.records.get_scope(list_id)?;
        if !grouping::apply_move(&mut records, &vocabulary, intent) {
            return Ok(false);
        }
        self.write_back(list_id, records)
    }

    /// Reorder records inside one group of a scope
    pub fn reorder_within_group(
        &self,
        list_id: ListId,
        group: &str,
        from: &[usize],
        to: usize,
    ) -> CouponResult<bool> {
        let vocabulary = self.storage.vocabularies.categories(list_id)?;
        let mut records = self.storage.records.get_scope(list_id)?;
        if !grouping::move_within_group(&mut records, &vocabulary, group, from, to) {
            return Ok(false);
        }
        self.write_back(list_id, records)
    }

    fn write_back(&self, list_id: ListId, records: Vec<Record>) -> CouponResult<bool> {
        self.storage.records.set_scope(list_id, records)?;
        self.storage.records.save_scope(list_id)?;
        self.storage.events.publish(CouponEvent::RecordsChanged(list_id));
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ComparisonOperator, Condition, ConditionField};
    use crate::services::entitlement::{StaticEntitlement, UpsellReason};
    use std::sync::{Arc, Mutex};

    fn setup() -> (Storage, EntitlementGuard, CouponList) {
        let storage = Storage::in_memory();
        storage.load_all().unwrap();
        let list = CouponList::new("Wallet");
        storage.lists.upsert(list.clone()).unwrap();
        (storage, EntitlementGuard::unlocked(), list)
    }

    fn coffee() -> RecordDraft {
        RecordDraft::new("Coffee", "C1").with_value(Money::from_cents(1000), "USD")
    }

    #[test]
    fn test_add_and_load() {
        let (storage, guard, list) = setup();
        let service = RecordService::new(&storage, &guard);

        let record = service.add(list.id, coffee()).unwrap();
        assert_eq!(service.load(list.id).unwrap(), vec![record]);
    }

    #[test]
    fn test_add_validation() {
        let (storage, guard, list) = setup();
        let service = RecordService::new(&storage, &guard);

        let err = service.add(list.id, RecordDraft::new("", "C1")).unwrap_err();
        assert!(err.is_validation());
        assert!(service.load(list.id).unwrap().is_empty());

        let err = service
            .add(ListId::recently_deleted(), coffee())
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_add_uses_list_currency_and_implied_type() {
        let (storage, guard, _list) = setup();
        let smart = CouponList::smart(
            "Cards",
            true,
            vec![Condition::text(ConditionField::Type, ComparisonOperator::Equals, "Gift Cards")],
        );
        storage.lists.upsert(smart.clone()).unwrap();
        storage
            .vocabularies
            .set_default_currency(smart.id, Some("EUR".into()))
            .unwrap();

        let service = RecordService::new(&storage, &guard);
        let record = service.add(smart.id, RecordDraft::new("Book", "B1")).unwrap();
        assert_eq!(record.currency_code, "EUR");
        assert_eq!(record.record_type.as_deref(), Some("Gift Cards"));
    }

    #[test]
    fn test_free_tier_quota() {
        let (storage, _guard, list) = setup();
        let guard = EntitlementGuard::new(Box::new(StaticEntitlement(false)), 2);
        let upsells = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&upsells);
        storage.events.subscribe(move |event| {
            if let CouponEvent::UpsellRequested(reason) = event {
                sink.lock().unwrap().push(reason.clone());
            }
        });

        let service = RecordService::new(&storage, &guard);
        service.add(list.id, coffee()).unwrap();
        service.add(list.id, coffee()).unwrap();
        let err = service.add(list.id, coffee()).unwrap_err();

        assert!(err.is_upsell());
        assert_eq!(service.load(list.id).unwrap().len(), 2);
        assert_eq!(
            *upsells.lock().unwrap(),
            vec![UpsellReason::RecordLimit { limit: 2 }]
        );
    }

    #[test]
    fn test_update_unknown_is_noop() {
        let (storage, guard, list) = setup();
        let service = RecordService::new(&storage, &guard);
        let stranger = Record::new(coffee());
        assert!(!service.update(list.id, stranger).unwrap());
    }

    #[test]
    fn test_update_replaces() {
        let (storage, guard, list) = setup();
        let service = RecordService::new(&storage, &guard);
        let mut record = service.add(list.id, coffee()).unwrap();
        record.name = "Espresso".into();
        assert!(service.update(list.id, record.clone()).unwrap());
        assert_eq!(service.load(list.id).unwrap()[0].name, "Espresso");
    }

    #[test]
    fn test_update_keeps_created_at() {
        let (storage, guard, list) = setup();
        let service = RecordService::new(&storage, &guard);
        let original = service.add(list.id, coffee()).unwrap();

        let mut edited = original.clone();
        edited.created_at = original.created_at - chrono::Duration::days(30);
        edited.code = "C2".into();
        assert!(service.update(list.id, edited).unwrap());

        let stored = service.load(list.id).unwrap().remove(0);
        assert_eq!(stored.code, "C2");
        assert_eq!(stored.created_at, original.created_at);
    }

    #[test]
    fn test_delete_twice_dedups() {
        let (storage, guard, list) = setup();
        let service = RecordService::new(&storage, &guard);
        let record = service.add(list.id, coffee()).unwrap();

        assert!(service.delete(list.id, record.id).unwrap());
        assert!(!service.delete(list.id, record.id).unwrap());

        let deleted = service.list_deleted().unwrap();
        assert_eq!(deleted.len(), 1);
        assert_eq!(deleted[0].id(), record.id);
        assert!(service.load(list.id).unwrap().is_empty());
    }

    #[test]
    fn test_delete_from_recently_deleted_purges() {
        let (storage, guard, list) = setup();
        let service = RecordService::new(&storage, &guard);
        let record = service.add(list.id, coffee()).unwrap();
        service.delete(list.id, record.id).unwrap();

        assert!(service.delete(ListId::recently_deleted(), record.id).unwrap());
        assert!(service.list_deleted().unwrap().is_empty());
        assert!(!service.permanently_delete(record.id).unwrap());
    }

    #[test]
    fn test_use_amount_clamps() {
        let (storage, guard, list) = setup();
        let service = RecordService::new(&storage, &guard);
        let record = service.add(list.id, coffee()).unwrap();

        assert!(service
            .use_amount(list.id, record.id, Money::from_cents(1500))
            .unwrap());
        assert_eq!(
            service.load(list.id).unwrap()[0].remaining_value,
            Some(Money::zero())
        );
    }

    #[test]
    fn test_use_amount_rejections() {
        let (storage, guard, list) = setup();
        let service = RecordService::new(&storage, &guard);
        let record = service.add(list.id, coffee()).unwrap();
        let untracked = service.add(list.id, RecordDraft::new("Free", "F")).unwrap();

        assert!(service
            .use_amount(list.id, record.id, Money::zero())
            .unwrap_err()
            .is_validation());
        assert!(!service
            .use_amount(list.id, untracked.id, Money::from_cents(100))
            .unwrap());
        assert!(!service
            .use_amount(list.id, RecordId::new(), Money::from_cents(100))
            .unwrap());
        assert_eq!(
            service.load(list.id).unwrap()[0].remaining_value,
            Some(Money::from_cents(1000))
        );
    }

    #[test]
    fn test_move_between_scopes() {
        let (storage, guard, list) = setup();
        let other = CouponList::new("Other");
        storage.lists.upsert(other.clone()).unwrap();
        let service = RecordService::new(&storage, &guard);
        let record = service.add(list.id, coffee()).unwrap();

        assert!(service.move_record(record.clone(), list.id, other.id).unwrap());
        assert!(service.load(list.id).unwrap().is_empty());
        assert_eq!(service.load(other.id).unwrap(), vec![record.clone()]);

        // moving again upserts rather than duplicating
        service.move_record(record.clone(), list.id, other.id).unwrap();
        assert_eq!(service.load(other.id).unwrap().len(), 1);
        assert_eq!(service.find(record.id).unwrap().unwrap().0, other.id);
    }

    #[test]
    fn test_restore() {
        let (storage, guard, list) = setup();
        let service = RecordService::new(&storage, &guard);
        let record = service.add(list.id, coffee()).unwrap();
        service.delete(list.id, record.id).unwrap();

        assert!(service.restore(record.id, list.id).unwrap());
        assert_eq!(service.load(list.id).unwrap(), vec![record.clone()]);
        assert!(service.list_deleted().unwrap().is_empty());
        assert!(!service.restore(record.id, list.id).unwrap());
    }

    #[test]
    fn test_reorder_within_group() {
        let (storage, guard, list) = setup();
        let service = RecordService::new(&storage, &guard);
        let first = service.add(list.id, coffee().with_category("Food")).unwrap();
        let second = service.add(list.id, coffee().with_category("Food")).unwrap();

        assert!(service.reorder_within_group(list.id, "Food", &[1], 0).unwrap());
        let ids: Vec<_> = service.load(list.id).unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[test]
    fn test_find_by_identifier() {
        let (storage, guard, list) = setup();
        let service = RecordService::new(&storage, &guard);
        let record = service.add(list.id, coffee()).unwrap();

        assert_eq!(service.find_by_identifier("coffee").unwrap().unwrap().1.id, record.id);
        assert_eq!(
            service
                .find_by_identifier(&record.id.to_string())
                .unwrap()
                .unwrap()
                .1
                .id,
            record.id
        );
        assert!(service.find_by_identifier("nothing").unwrap().is_none());
    }
}
