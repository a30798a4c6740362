//! Core data models
//!
//! Records (gift cards, coupons, credits), the lists that hold or filter
//! them, and the vocabularies used to group them.

pub mod currency;
pub mod ids;
pub mod list;
pub mod money;
pub mod record;
pub mod vocabulary;

pub use currency::{BuiltinCurrencies, CurrencyInfo, CurrencyLookup, CURRENCIES};
pub use ids::{ListId, RecordId};
pub use list::{
    ComparisonOperator, Condition, ConditionField, CouponList, DefaultList, FieldKind,
    ListValidationError, RECENTLY_DELETED_NAME,
};
pub use money::Money;
pub use record::{DeletedRecord, Record, RecordDraft, RecordValidationError};
pub use vocabulary::{Vocabulary, VocabularyError, UNCATEGORIZED};
