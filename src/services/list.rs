//! List registry service
//!
//! Creation, editing, deletion, ordering and selection of lists. The
//! Recently Deleted pseudo-list is synthesized here and never stored.

use chrono::Utc;

use crate::audit::EntityType;
use crate::error::{CouponError, CouponResult};
use crate::models::{CouponList, DefaultList, DeletedRecord, ListId, RECENTLY_DELETED_NAME};
use crate::storage::Storage;

use super::entitlement::{Access, EntitlementGuard, GatedAction};
use super::events::CouponEvent;

/// Service for list management
pub struct ListService<'a> {
    storage: &'a Storage,
    guard: &'a EntitlementGuard,
}

impl<'a> ListService<'a> {
    pub fn new(storage: &'a Storage, guard: &'a EntitlementGuard) -> Self {
        Self { storage, guard }
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

    /// Seed the built-in smart lists into an empty registry and make sure a
    /// valid list is selected. Returns true if the registry was seeded.
    pub fn ensure_defaults(&self) -> CouponResult<bool> {
        let seeded = self.storage.lists.count()? == 0;
        if seeded {
            for default in DefaultList::all() {
                self.storage.lists.upsert(default.to_list())?;
            }
            self.storage.lists.save_lists()?;
            tracing::info!("seeded default lists");
            self.storage.events.publish(CouponEvent::ListsChanged);
        }

        let valid = match self.storage.lists.selected()? {
            Some(id) if id.is_recently_deleted() => true,
            Some(id) => self.storage.lists.get(id)?.is_some(),
            None => false,
        };
        if !valid {
            if let Some(first) = self.storage.lists.get_all()?.first() {
                self.set_selection(first.id)?;
            }
        }

        Ok(seeded)
    }

    /// Registered lists in registry order
    pub fn list_all(&self) -> CouponResult<Vec<CouponList>> {
        self.storage.lists.get_all()
    }

    pub fn recently_deleted(&self) -> CouponList {
        CouponList::recently_deleted()
    }

    pub fn get(&self, id: ListId) -> CouponResult<Option<CouponList>> {
        if id.is_recently_deleted() {
            return Ok(Some(CouponList::recently_deleted()));
        }
        self.storage.lists.get(id)
    }

    /// Find a list by name or id string, including Recently Deleted
    pub fn find(&self, identifier: &str) -> CouponResult<Option<CouponList>> {
        if identifier.trim().eq_ignore_ascii_case(RECENTLY_DELETED_NAME) {
            return Ok(Some(CouponList::recently_deleted()));
        }
        if let Some(list) = self.storage.lists.get_by_name(identifier)? {
            return Ok(Some(list));
        }
        if let Ok(id) = identifier.parse::<ListId>() {
            return self.get(id);
        }
        Ok(self
            .storage
            .lists
            .get_all()?
            .into_iter()
            .find(|l| l.id.to_string() == identifier))
    }

    fn check_name_free(&self, name: &str, except: Option<ListId>) -> CouponResult<()> {
        if let Some(existing) = self.storage.lists.get_by_name(name)? {
            if Some(existing.id) != except {
                return Err(CouponError::Duplicate {
                    entity_type: "List",
                    identifier: name.trim().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Register a new list
    pub fn create_list(&self, mut list: CouponList) -> CouponResult<CouponList> {
        list.name = list.name.trim().to_string();
        list.validate()
            .map_err(|e| CouponError::Validation(e.to_string()))?;
        self.check_name_free(&list.name, None)?;
        self.gate(GatedAction::EditList)?;

        list.is_default = false;
        self.storage.lists.upsert(list.clone())?;
        self.storage.lists.save_lists()?;

        self.storage
            .log_create(EntityType::List, list.id.to_string(), Some(list.name.clone()), &list);
        self.storage.events.publish(CouponEvent::ListsChanged);
        Ok(list)
    }

    /// Replace a list's metadata and conditions
    ///
    /// Built-in lists stay default and smart. `Ok(false)` if the list is
    /// not registered.
    pub fn update_list(&self, mut list: CouponList) -> CouponResult<bool> {
        let Some(before) = self.storage.lists.get(list.id)? else {
            return Ok(false);
        };

        list.name = list.name.trim().to_string();
        if before.is_default {
            list.is_default = true;
            list.is_smart = true;
        }
        list.validate()
            .map_err(|e| CouponError::Validation(e.to_string()))?;
        self.check_name_free(&list.name, Some(list.id))?;
        self.gate(GatedAction::EditList)?;

        self.storage.lists.upsert(list.clone())?;
        self.storage.lists.save_lists()?;

        self.storage.log_update(
            EntityType::List,
            list.id.to_string(),
            Some(list.name.clone()),
            &before,
            &list,
        );
        self.storage.events.publish(CouponEvent::ListsChanged);
        Ok(true)
    }

    /// Remove a list; its records move to Recently Deleted
    ///
    /// Built-in lists, the Recently Deleted entry and the last remaining
    /// list are protected.
    pub fn delete_list(&self, id: ListId) -> CouponResult<bool> {
        if id.is_recently_deleted() {
            return Err(CouponError::Protected(format!(
                "'{}' cannot be deleted",
                RECENTLY_DELETED_NAME
            )));
        }
        let Some(list) = self.storage.lists.get(id)? else {
            return Ok(false);
        };
        if list.is_default {
            return Err(CouponError::Protected(format!(
                "Built-in list '{}' cannot be deleted",
                list.name
            )));
        }
        if self.storage.lists.count()? <= 1 {
            return Err(CouponError::Protected("The last list cannot be deleted".into()));
        }
        self.gate(GatedAction::DeleteList)?;

        let now = Utc::now();
        let orphans = self.storage.records.drop_scope(id)?;
        let orphan_count = orphans.len();
        for record in orphans {
            self.storage.records.push_deleted(DeletedRecord::new(record, now))?;
        }
        if orphan_count > 0 {
            self.storage.records.save_deleted()?;
        }
        self.storage.vocabularies.drop_list(id)?;
        self.storage.lists.remove(id)?;
        self.storage.lists.save_lists()?;

        tracing::info!(list = %id, records = orphan_count, "list deleted");
        self.storage
            .log_delete(EntityType::List, id.to_string(), Some(list.name.clone()), &list);
        self.storage.events.publish(CouponEvent::ListsChanged);
        if orphan_count > 0 {
            self.storage.events.publish(CouponEvent::DeletedChanged);
        }

        if self.storage.lists.selected()? == Some(id) {
            if let Some(first) = self.storage.lists.get_all()?.first() {
                self.set_selection(first.id)?;
            }
        }
        Ok(true)
    }

    /// Move the list at `from` to index `to` in the registry
    pub fn reorder_lists(&self, from: usize, to: usize) -> CouponResult<bool> {
        let mut lists = self.storage.lists.get_all()?;
        if from >= lists.len() || to >= lists.len() {
            return Ok(false);
        }
        self.gate(GatedAction::ReorderLists)?;

        let list = lists.remove(from);
        lists.insert(to, list);
        self.storage.lists.set_all(lists)?;
        self.storage.lists.save_lists()?;
        self.storage.events.publish(CouponEvent::ListsChanged);
        Ok(true)
    }

    fn set_selection(&self, id: ListId) -> CouponResult<()> {
        let before = self.storage.lists.selected()?;
        self.storage.lists.set_selected(id)?;
        self.storage.lists.save_selected()?;
        self.storage
            .log_update(EntityType::Selection, "lists.selected", None, &before, &Some(id));
        self.storage.events.publish(CouponEvent::SelectionChanged(id));
        Ok(())
    }

    /// Select a list
    ///
    /// Recently Deleted is always selectable. A custom list without the
    /// entitlement forces the selection back to the first built-in list and
    /// returns the upsell error.
    pub fn select_list(&self, id: ListId) -> CouponResult<ListId> {
        if id.is_recently_deleted() {
            self.set_selection(id)?;
            return Ok(id);
        }

        let list = self
            .storage
            .lists
            .get(id)?
            .ok_or_else(|| CouponError::list_not_found(id.to_string()))?;

        if let Access::Denied(reason) = self.guard.check(GatedAction::SelectList {
            is_default: list.is_default,
        }) {
            let fallback = self.first_default()?;
            if let Some(fallback) = fallback {
                self.set_selection(fallback)?;
            }
            self.storage
                .events
                .publish(CouponEvent::UpsellRequested(reason.clone()));
            return Err(CouponError::Upsell(reason));
        }

        self.set_selection(id)?;
        Ok(id)
    }

    fn first_default(&self) -> CouponResult<Option<ListId>> {
        let lists = self.storage.lists.get_all()?;
        Ok(lists
            .iter()
            .find(|l| l.is_default)
            .or_else(|| lists.first())
            .map(|l| l.id))
    }

    /// The selected list, falling back to the first registered one
    pub fn selected(&self) -> CouponResult<CouponList> {
        if let Some(id) = self.storage.lists.selected()? {
            if let Some(list) = self.get(id)? {
                return Ok(list);
            }
        }
        self.storage
            .lists
            .get_all()?
            .into_iter()
            .next()
            .ok_or_else(|| CouponError::list_not_found("selected"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ComparisonOperator, Condition, ConditionField, Money, Record, RecordDraft};
    use crate::services::entitlement::{StaticEntitlement, UpsellReason};

    fn setup() -> Storage {
        let storage = Storage::in_memory();
        storage.load_all().unwrap();
        storage
    }

    fn free_tier() -> EntitlementGuard {
        EntitlementGuard::new(Box::new(StaticEntitlement(false)), 10)
    }

    #[test]
    fn test_ensure_defaults_seeds_once() {
        let storage = setup();
        let guard = EntitlementGuard::unlocked();
        let service = ListService::new(&storage, &guard);

        assert!(service.ensure_defaults().unwrap());
        assert!(!service.ensure_defaults().unwrap());

        let names: Vec<_> = service.list_all().unwrap().into_iter().map(|l| l.name).collect();
        assert_eq!(names, vec!["Gift Cards", "Coupons", "Vouchers"]);
        assert_eq!(service.selected().unwrap().id, DefaultList::GiftCards.id());
    }

    #[test]
    fn test_create_rejects_reserved_and_duplicate_names() {
        let storage = setup();
        let guard = EntitlementGuard::unlocked();
        let service = ListService::new(&storage, &guard);
        service.ensure_defaults().unwrap();

        assert!(service
            .create_list(CouponList::new("Recently Deleted"))
            .unwrap_err()
            .is_validation());
        assert!(matches!(
            service.create_list(CouponList::new("coupons")),
            Err(CouponError::Duplicate { .. })
        ));
        assert!(service.create_list(CouponList::new("  Travel ")).is_ok());
        assert!(service.find("travel").unwrap().is_some());
    }

    #[test]
    fn test_update_keeps_default_smart() {
        let storage = setup();
        let guard = EntitlementGuard::unlocked();
        let service = ListService::new(&storage, &guard);
        service.ensure_defaults().unwrap();

        let mut cards = service.get(DefaultList::GiftCards.id()).unwrap().unwrap();
        cards.is_smart = false;
        cards.color_tag = "red".into();
        assert!(service.update_list(cards).unwrap());

        let cards = service.get(DefaultList::GiftCards.id()).unwrap().unwrap();
        assert!(cards.is_smart);
        assert!(cards.is_default);
        assert_eq!(cards.color_tag, "red");

        assert!(!service.update_list(CouponList::new("Ghost")).unwrap());
    }

    #[test]
    fn test_delete_protections() {
        let storage = setup();
        let guard = EntitlementGuard::unlocked();
        let service = ListService::new(&storage, &guard);
        service.ensure_defaults().unwrap();

        assert!(matches!(
            service.delete_list(ListId::recently_deleted()),
            Err(CouponError::Protected(_))
        ));
        assert!(matches!(
            service.delete_list(DefaultList::Coupons.id()),
            Err(CouponError::Protected(_))
        ));
        assert!(!service.delete_list(ListId::new()).unwrap());
    }

    #[test]
    fn test_last_list_cannot_be_deleted() {
        let storage = setup();
        let only = CouponList::new("Only");
        storage.lists.upsert(only.clone()).unwrap();
        let guard = EntitlementGuard::unlocked();
        let service = ListService::new(&storage, &guard);

        assert!(matches!(
            service.delete_list(only.id),
            Err(CouponError::Protected(_))
        ));
    }

    #[test]
    fn test_delete_moves_records_to_recently_deleted() {
        let storage = setup();
        let guard = EntitlementGuard::unlocked();
        let service = ListService::new(&storage, &guard);
        service.ensure_defaults().unwrap();
        let travel = service.create_list(CouponList::new("Travel")).unwrap();
        service.select_list(travel.id).unwrap();

        let record = Record::new(RecordDraft::new("Train", "T").with_value(Money::from_cents(100), "EUR"));
        storage.records.append(travel.id, record.clone()).unwrap();

        assert!(service.delete_list(travel.id).unwrap());
        assert!(service.find("Travel").unwrap().is_none());
        assert_eq!(storage.records.get_deleted().unwrap()[0].id(), record.id);
        assert_eq!(service.selected().unwrap().id, DefaultList::GiftCards.id());
    }

    #[test]
    fn test_free_tier_selection_falls_back() {
        let storage = setup();
        let unlocked = EntitlementGuard::unlocked();
        let travel = {
            let service = ListService::new(&storage, &unlocked);
            service.ensure_defaults().unwrap();
            let travel = service.create_list(CouponList::new("Travel")).unwrap();
            service.select_list(DefaultList::Vouchers.id()).unwrap();
            travel
        };

        let guard = free_tier();
        let service = ListService::new(&storage, &guard);
        let err = service.select_list(travel.id).unwrap_err();
        assert!(matches!(err, CouponError::Upsell(UpsellReason::CustomListSelection)));
        assert_eq!(service.selected().unwrap().id, DefaultList::GiftCards.id());

        assert!(service.select_list(DefaultList::Coupons.id()).is_ok());
        assert_eq!(
            service.select_list(ListId::recently_deleted()).unwrap(),
            ListId::recently_deleted()
        );
        assert_eq!(service.selected().unwrap().name, RECENTLY_DELETED_NAME);
    }

    #[test]
    fn test_free_tier_cannot_mutate_lists() {
        let storage = setup();
        let guard = free_tier();
        let service = ListService::new(&storage, &guard);
        service.ensure_defaults().unwrap();

        assert!(service.create_list(CouponList::new("Travel")).unwrap_err().is_upsell());
        assert!(service.reorder_lists(0, 2).unwrap_err().is_upsell());
        assert_eq!(service.list_all().unwrap().len(), 3);
    }

    #[test]
    fn test_reorder_lists() {
        let storage = setup();
        let guard = EntitlementGuard::unlocked();
        let service = ListService::new(&storage, &guard);
        service.ensure_defaults().unwrap();

        assert!(service.reorder_lists(2, 0).unwrap());
        assert!(!service.reorder_lists(5, 0).unwrap());
        assert_eq!(service.list_all().unwrap()[0].name, "Vouchers");
    }

    #[test]
    fn test_smart_list_validation() {
        let storage = setup();
        let guard = EntitlementGuard::unlocked();
        let service = ListService::new(&storage, &guard);

        let bad = CouponList::smart(
            "Broken",
            true,
            vec![Condition::text(ConditionField::Type, ComparisonOperator::GreaterThan, "x")],
        );
        assert!(service.create_list(bad).unwrap_err().is_validation());
    }
}
