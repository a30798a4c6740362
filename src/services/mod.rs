//! Service layer for the coupon tracker
//!
//! The service layer provides business logic on top of the storage layer:
//! entitlement checks, smart-list membership, grouping, and reconciliation
//! with the remote replica.

pub mod aggregation;
pub mod conditions;
pub mod entitlement;
pub mod events;
pub mod grouping;
pub mod list;
pub mod record;
pub mod sync;
pub mod vocabulary;

pub use aggregation::{totals_by_currency, AggregationService, CurrencyTotal, ListSummary, MemberRecord};
pub use entitlement::{
    Access, Entitlement, EntitlementGuard, GatedAction, StaticEntitlement, UpsellReason,
};
pub use events::{CouponEvent, EventBus};
pub use grouping::{MoveIntent, RecordGroup};
pub use list::ListService;
pub use record::RecordService;
pub use sync::{SyncReconciler, SyncReport};
pub use vocabulary::{VocabularyKind, VocabularyService};
