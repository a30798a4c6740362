//! Record model: a single gift card, coupon or store credit
//!
//! Records live in exactly one list scope at a time. Deleting a record wraps
//! it in a [`DeletedRecord`] that sits in the global Recently Deleted
//! collection until it ages out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::RecordId;
use super::money::Money;

/// Maximum length of a record description, in characters
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// A tracked value unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,

    pub name: String,

    /// Redemption code or card number
    #[serde(default)]
    pub code: String,

    /// Remaining balance; `None` means the record has no tracked balance
    #[serde(default)]
    pub remaining_value: Option<Money>,

    #[serde(default)]
    pub currency_code: String,

    #[serde(default)]
    pub description: Option<String>,

    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub expiration_date: Option<DateTime<Utc>>,

    /// Free-text category used for grouping
    #[serde(default)]
    pub category: Option<String>,

    /// Free-text type ("Gift Cards", "Coupons", ...) used by smart lists
    #[serde(default, rename = "type")]
    pub record_type: Option<String>,
}

/// Caller-supplied fields for a new record
///
/// The store assigns the id and creation timestamp.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordDraft {
    pub name: String,
    pub code: String,
    pub remaining_value: Option<Money>,
    pub currency_code: String,
    pub description: Option<String>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub record_type: Option<String>,
}

impl RecordDraft {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            ..Self::default()
        }
    }

    pub fn with_value(mut self, value: Money, currency_code: impl Into<String>) -> Self {
        self.remaining_value = Some(value);
        self.currency_code = currency_code.into();
        self
    }

    pub fn with_type(mut self, record_type: impl Into<String>) -> Self {
        self.record_type = Some(record_type.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_expiration(mut self, expiration: DateTime<Utc>) -> Self {
        self.expiration_date = Some(expiration);
        self
    }
}

impl Record {
    /// Create a record from a draft, stamping a fresh id and `created_at`
    pub fn new(draft: RecordDraft) -> Self {
        Self {
            id: RecordId::new(),
            name: draft.name,
            code: draft.code,
            remaining_value: draft.remaining_value,
            currency_code: draft.currency_code,
            description: draft.description,
            created_at: Utc::now(),
            expiration_date: draft.expiration_date,
            category: draft.category,
            record_type: draft.record_type,
        }
    }

    /// True when a balance is tracked and still above zero
    pub fn has_balance(&self) -> bool {
        self.remaining_value.is_some_and(|v| v.is_positive())
    }

    pub fn has_description(&self) -> bool {
        self.description
            .as_deref()
            .is_some_and(|d| !d.trim().is_empty())
    }

    /// Debit the remaining value, clamping at zero
    ///
    /// Returns false (and changes nothing) for a non-positive amount or a
    /// record without a tracked balance.
    pub fn debit(&mut self, amount: Money) -> bool {
        if !amount.is_positive() {
            return false;
        }
        match self.remaining_value {
            Some(value) => {
                self.remaining_value = Some(value.saturating_debit(amount));
                true
            }
            None => false,
        }
    }

    /// Trimmed category, if any non-blank one is set
    pub fn category_name(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// Validate the record before it is saved
    pub fn validate(&self) -> Result<(), RecordValidationError> {
        if self.name.trim().is_empty() {
            return Err(RecordValidationError::EmptyName);
        }
        if self.code.trim().is_empty() {
            return Err(RecordValidationError::EmptyCode);
        }
        if self.currency_code.trim().is_empty() {
            return Err(RecordValidationError::EmptyCurrency);
        }
        if self.remaining_value.is_some_and(|v| v.is_negative()) {
            return Err(RecordValidationError::NegativeValue);
        }
        if let Some(description) = &self.description {
            let len = description.chars().count();
            if len > MAX_DESCRIPTION_LEN {
                return Err(RecordValidationError::DescriptionTooLong(len));
            }
        }
        Ok(())
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.code)
    }
}

/// A record in the Recently Deleted collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletedRecord {
    pub record: Record,
    pub deleted_at: DateTime<Utc>,
}

impl DeletedRecord {
    pub fn new(record: Record, deleted_at: DateTime<Utc>) -> Self {
        Self { record, deleted_at }
    }

    pub fn id(&self) -> RecordId {
        self.record.id
    }

    /// Whether the retention window has elapsed at `now`
    pub fn is_expired(&self, now: DateTime<Utc>, retention_days: i64) -> bool {
        now - self.deleted_at > chrono::Duration::days(retention_days)
    }
}

/// Validation errors for records
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordValidationError {
    EmptyName,
    EmptyCode,
    EmptyCurrency,
    NegativeValue,
    DescriptionTooLong(usize),
}

impl fmt::Display for RecordValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Record name cannot be empty"),
            Self::EmptyCode => write!(f, "Record code cannot be empty"),
            Self::EmptyCurrency => write!(f, "Currency code cannot be empty"),
            Self::NegativeValue => write!(f, "Remaining value cannot be negative"),
            Self::DescriptionTooLong(len) => write!(
                f,
                "Description too long ({} chars, max {})",
                len, MAX_DESCRIPTION_LEN
            ),
        }
    }
}

impl std::error::Error for RecordValidationError {}
