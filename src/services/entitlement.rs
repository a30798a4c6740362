//! Entitlement guard
//!
//! Product policy for the free tier lives here and nowhere else. Services
//! describe the action they are about to perform; the guard answers with
//! `Access::Allowed` or `Access::Denied` plus the reason to show.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CouponError, CouponResult};

/// Source of the "pro unlocked" flag
pub trait Entitlement: Send + Sync {
    fn is_unlocked(&self) -> bool;
}

/// Fixed entitlement, used by the CLI (from settings) and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticEntitlement(pub bool);

impl Entitlement for StaticEntitlement {
    fn is_unlocked(&self) -> bool {
        self.0
    }
}

/// Why an upgrade prompt is being shown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpsellReason {
    RecordLimit { limit: usize },
    CustomListSelection,
    VocabularyEditing,
    ListEditing,
    ListDeletion,
    ListReordering,
}

impl fmt::Display for UpsellReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RecordLimit { limit } => write!(f, "free tier is limited to {} records", limit),
            Self::CustomListSelection => write!(f, "custom lists require an upgrade"),
            Self::VocabularyEditing => write!(f, "editing categories and types requires an upgrade"),
            Self::ListEditing => write!(f, "editing lists requires an upgrade"),
            Self::ListDeletion => write!(f, "deleting lists requires an upgrade"),
            Self::ListReordering => write!(f, "reordering lists requires an upgrade"),
        }
    }
}

/// A gated operation about to be performed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatedAction {
    /// Adding a record when `existing` records are already stored
    AddRecord { existing: usize },
    SelectList { is_default: bool },
    MutateVocabulary,
    EditList,
    DeleteList,
    ReorderLists,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Allowed,
    Denied(UpsellReason),
}

impl Access {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// Convert a denial into `CouponError::Upsell`
    pub fn into_result(self) -> CouponResult<()> {
        match self {
            Self::Allowed => Ok(()),
            Self::Denied(reason) => Err(CouponError::Upsell(reason)),
        }
    }
}

pub struct EntitlementGuard {
    provider: Box<dyn Entitlement>,
    free_record_limit: usize,
}

impl EntitlementGuard {
    pub fn new(provider: Box<dyn Entitlement>, free_record_limit: usize) -> Self {
        Self {
            provider,
            free_record_limit,
        }
    }

    /// Guard with everything unlocked
    pub fn unlocked() -> Self {
        Self::new(Box::new(StaticEntitlement(true)), usize::MAX)
    }

    pub fn is_unlocked(&self) -> bool {
        self.provider.is_unlocked()
    }

    pub fn free_record_limit(&self) -> usize {
        self.free_record_limit
    }

    pub fn check(&self, action: GatedAction) -> Access {
        if self.provider.is_unlocked() {
            return Access::Allowed;
        }

        match action {
            GatedAction::AddRecord { existing } if existing >= self.free_record_limit => {
                Access::Denied(UpsellReason::RecordLimit {
                    limit: self.free_record_limit,
                })
            }
            GatedAction::AddRecord { .. } => Access::Allowed,
            GatedAction::SelectList { is_default: true } => Access::Allowed,
            GatedAction::SelectList { is_default: false } => {
                Access::Denied(UpsellReason::CustomListSelection)
            }
            GatedAction::MutateVocabulary => Access::Denied(UpsellReason::VocabularyEditing),
            GatedAction::EditList => Access::Denied(UpsellReason::ListEditing),
            GatedAction::DeleteList => Access::Denied(UpsellReason::ListDeletion),
            GatedAction::ReorderLists => Access::Denied(UpsellReason::ListReordering),
        }
    }
}

impl fmt::Debug for EntitlementGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntitlementGuard")
            .field("unlocked", &self.provider.is_unlocked())
            .field("free_record_limit", &self.free_record_limit)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn free_tier() -> EntitlementGuard {
        EntitlementGuard::new(Box::new(StaticEntitlement(false)), 10)
    }

    #[test]
    fn test_record_quota() {
        let guard = free_tier();
        assert!(guard.check(GatedAction::AddRecord { existing: 9 }).is_allowed());
        assert_eq!(
            guard.check(GatedAction::AddRecord { existing: 10 }),
            Access::Denied(UpsellReason::RecordLimit { limit: 10 })
        );
    }

    #[test]
    fn test_default_list_selection_is_free() {
        let guard = free_tier();
        assert!(guard.check(GatedAction::SelectList { is_default: true }).is_allowed());
        assert!(!guard.check(GatedAction::SelectList { is_default: false }).is_allowed());
    }

    #[test]
    fn test_list_and_vocabulary_mutations_denied() {
        let guard = free_tier();
        for action in [
            GatedAction::MutateVocabulary,
            GatedAction::EditList,
            GatedAction::DeleteList,
            GatedAction::ReorderLists,
        ] {
            assert!(!guard.check(action).is_allowed());
        }
    }

    #[test]
    fn test_unlocked_allows_everything() {
        let guard = EntitlementGuard::new(Box::new(StaticEntitlement(true)), 10);
        assert!(guard.check(GatedAction::AddRecord { existing: 500 }).is_allowed());
        assert!(guard.check(GatedAction::DeleteList).is_allowed());
    }

    #[test]
    fn test_denial_into_error() {
        let err = free_tier()
            .check(GatedAction::EditList)
            .into_result()
            .unwrap_err();
        assert!(err.is_upsell());
        assert_eq!(err.to_string(), "Upgrade required: editing lists requires an upgrade");
    }
}
