//! Category and type vocabulary service
//!
//! Categories are kept per list, types globally. Every mutation is gated on
//! the entitlement provider; reads are not.

use crate::audit::EntityType;
use crate::error::{CouponError, CouponResult};
use crate::models::{ListId, Vocabulary, VocabularyError};
use crate::storage::Storage;

use super::entitlement::{Access, EntitlementGuard, GatedAction};
use super::events::CouponEvent;

/// Which vocabulary an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VocabularyKind {
    Categories(ListId),
    Types,
}

impl VocabularyKind {
    fn entity_id(&self) -> String {
        match self {
            Self::Categories(id) => format!("categories.{}", id.key_fragment()),
            Self::Types => "types".to_string(),
        }
    }
}

/// Service for vocabulary management
pub struct VocabularyService<'a> {
    storage: &'a Storage,
    guard: &'a EntitlementGuard,
}

impl<'a> VocabularyService<'a> {
    pub fn new(storage: &'a Storage, guard: &'a EntitlementGuard) -> Self {
        Self { storage, guard }
    }

    pub fn get(&self, kind: VocabularyKind) -> CouponResult<Vocabulary> {
        match kind {
            VocabularyKind::Categories(id) => self.storage.vocabularies.categories(id),
            VocabularyKind::Types => self.storage.vocabularies.types(),
        }
    }

    fn gate(&self) -> CouponResult<()> {
        let access = self.guard.check(GatedAction::MutateVocabulary);
        if let Access::Denied(reason) = &access {
            self.storage
                .events
                .publish(CouponEvent::UpsellRequested(reason.clone()));
        }
        access.into_result()
    }

    fn require_list(&self, kind: VocabularyKind) -> CouponResult<()> {
        if let VocabularyKind::Categories(id) = kind {
            if self.storage.lists.get(id)?.is_none() {
                return Err(CouponError::list_not_found(id.to_string()));
            }
        }
        Ok(())
    }

    /// Run a mutation against a copy and persist it if it succeeds
    fn mutate<F>(&self, kind: VocabularyKind, f: F) -> CouponResult<Vocabulary>
    where
        F: FnOnce(&mut Vocabulary) -> Result<(), VocabularyError>,
    {
        self.require_list(kind)?;
        self.gate()?;

        let before = self.get(kind)?;
        let mut after = before.clone();
        f(&mut after).map_err(vocabulary_error)?;

        match kind {
            VocabularyKind::Categories(id) => {
                self.storage.vocabularies.set_categories(id, after.clone())?;
                self.storage.vocabularies.save_categories(id)?;
            }
            VocabularyKind::Types => {
                self.storage.vocabularies.set_types(after.clone())?;
                self.storage.vocabularies.save_types()?;
            }
        }

        self.storage
            .log_update(EntityType::Vocabulary, kind.entity_id(), None, &before, &after);
        self.storage.events.publish(CouponEvent::ListsChanged);
        Ok(after)
    }

    pub fn add(&self, kind: VocabularyKind, name: &str) -> CouponResult<Vocabulary> {
        self.mutate(kind, |v| v.add(name))
    }

    /// Rename an entry
    ///
    /// Renaming a category also rewrites the matching records of that list.
    pub fn rename(&self, kind: VocabularyKind, old: &str, new: &str) -> CouponResult<Vocabulary> {
        let vocabulary = self.mutate(kind, |v| v.rename(old, new))?;

        if let VocabularyKind::Categories(id) = kind {
            let new_name = new.trim();
            let mut records = self.storage.records.get_scope(id)?;
            let mut changed = false;
            for record in records.iter_mut() {
                if record
                    .category_name()
                    .is_some_and(|c| c.eq_ignore_ascii_case(old.trim()))
                {
                    record.category = Some(new_name.to_string());
                    changed = true;
                }
            }
            if changed {
                self.storage.records.set_scope(id, records)?;
                self.storage.records.save_scope(id)?;
                self.storage.events.publish(CouponEvent::RecordsChanged(id));
            }
        }

        Ok(vocabulary)
    }

    /// Remove an entry; records keep their value and sort as unmanaged
    pub fn remove(&self, kind: VocabularyKind, name: &str) -> CouponResult<Vocabulary> {
        self.mutate(kind, |v| {
            if v.remove(name) {
                Ok(())
            } else {
                Err(VocabularyError::NotFound(name.to_string()))
            }
        })
    }

    pub fn move_item(&self, kind: VocabularyKind, from: usize, to: usize) -> CouponResult<Vocabulary> {
        self.mutate(kind, |v| {
            if v.move_item(from, to) {
                Ok(())
            } else {
                Err(VocabularyError::NotFound(format!("position {}", from + 1)))
            }
        })
    }

    pub fn default_currency(&self, list_id: ListId) -> CouponResult<Option<String>> {
        self.storage.vocabularies.default_currency(list_id)
    }

    /// Set or clear the currency new records in this list receive
    pub fn set_default_currency(&self, list_id: ListId, code: Option<&str>) -> CouponResult<()> {
        self.require_list(VocabularyKind::Categories(list_id))?;

        let code = match code.map(str::trim) {
            Some("") | None => None,
            Some(code) if code.chars().count() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) => {
                Some(code.to_ascii_uppercase())
            }
            Some(code) => {
                return Err(CouponError::Validation(format!(
                    "Currency code must be three letters: {}",
                    code
                )))
            }
        };

        let before = self.storage.vocabularies.default_currency(list_id)?;
        self.storage
            .vocabularies
            .set_default_currency(list_id, code.clone())?;
        self.storage.vocabularies.save_default_currency(list_id)?;
        self.storage.log_update(
            EntityType::Vocabulary,
            format!("defaultCurrency.{}", list_id.key_fragment()),
            None,
            &before,
            &code,
        );
        Ok(())
    }
}

fn vocabulary_error(err: VocabularyError) -> CouponError {
    match err {
        VocabularyError::Duplicate(name) => CouponError::Duplicate {
            entity_type: "Vocabulary entry",
            identifier: name,
        },
        VocabularyError::NotFound(name) => CouponError::NotFound {
            entity_type: "Vocabulary entry",
            identifier: name,
        },
        other => CouponError::Validation(other.to_string()),
    }
}
