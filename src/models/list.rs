//! List registry entries and smart-list conditions
//!
//! An ordinary list owns a storage scope of records. A smart list owns no
//! membership of its own; its members are derived by scanning every scope
//! and filtering with its conditions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::ids::ListId;
use super::money::Money;

/// Display name of the synthesized pseudo-list over deleted records
pub const RECENTLY_DELETED_NAME: &str = "Recently Deleted";

/// Record attribute a smart-list condition tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionField {
    #[serde(rename = "type")]
    Type,
    #[serde(rename = "amountPresentOrValue")]
    AmountPresentOrValue,
    #[serde(rename = "hasBalance")]
    HasBalance,
    #[serde(rename = "expirationDate")]
    ExpirationDate,
    #[serde(rename = "hasDescription")]
    HasDescription,
    #[serde(rename = "hasExpirationDate")]
    HasExpirationDate,
    #[serde(rename = "sourceListName")]
    SourceListName,
}

/// How a field's value is compared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Amount,
    Date,
    Presence,
}

impl ConditionField {
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Type | Self::SourceListName => FieldKind::Text,
            Self::AmountPresentOrValue => FieldKind::Amount,
            Self::ExpirationDate => FieldKind::Date,
            Self::HasBalance | Self::HasDescription | Self::HasExpirationDate => {
                FieldKind::Presence
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Type => "Type",
            Self::AmountPresentOrValue => "Amount",
            Self::HasBalance => "Has balance",
            Self::ExpirationDate => "Expiration date",
            Self::HasDescription => "Has description",
            Self::HasExpirationDate => "Has expiration date",
            Self::SourceListName => "List",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComparisonOperator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    GreaterOrEqual,
    LessOrEqual,
}

impl ComparisonOperator {
    /// Text and presence fields only support equality
    pub fn supports(&self, kind: FieldKind) -> bool {
        match kind {
            FieldKind::Amount | FieldKind::Date => true,
            FieldKind::Text | FieldKind::Presence => {
                matches!(self, Self::Equals | Self::NotEquals)
            }
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Equals => "==",
            Self::NotEquals => "!=",
            Self::GreaterThan => ">",
            Self::LessThan => "<",
            Self::GreaterOrEqual => ">=",
            Self::LessOrEqual => "<=",
        }
    }
}

/// One rule of a smart list
///
/// Presence fields ignore operands: `Equals` tests that the attribute is
/// present, `NotEquals` that it is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: ConditionField,
    pub operator: ComparisonOperator,
    #[serde(default)]
    pub string_operand: Option<String>,
    #[serde(default)]
    pub numeric_operand: Option<Money>,
    #[serde(default)]
    pub date_operand: Option<DateTime<Utc>>,
}

impl Condition {
    fn bare(field: ConditionField, operator: ComparisonOperator) -> Self {
        Self {
            field,
            operator,
            string_operand: None,
            numeric_operand: None,
            date_operand: None,
        }
    }

    pub fn text(field: ConditionField, operator: ComparisonOperator, value: impl Into<String>) -> Self {
        Self {
            string_operand: Some(value.into()),
            ..Self::bare(field, operator)
        }
    }

    pub fn amount(operator: ComparisonOperator, value: Money) -> Self {
        Self {
            numeric_operand: Some(value),
            ..Self::bare(ConditionField::AmountPresentOrValue, operator)
        }
    }

    pub fn expires(operator: ComparisonOperator, at: DateTime<Utc>) -> Self {
        Self {
            date_operand: Some(at),
            ..Self::bare(ConditionField::ExpirationDate, operator)
        }
    }

    /// Presence test: `present == true` matches when the attribute is set
    pub fn presence(field: ConditionField, present: bool) -> Self {
        let operator = if present {
            ComparisonOperator::Equals
        } else {
            ComparisonOperator::NotEquals
        };
        Self::bare(field, operator)
    }

    pub fn validate(&self) -> Result<(), ListValidationError> {
        let kind = self.field.kind();
        if !self.operator.supports(kind) {
            return Err(ListValidationError::UnsupportedOperator {
                field: self.field,
                operator: self.operator,
            });
        }
        let has_operand = match kind {
            FieldKind::Text => self.string_operand.is_some(),
            FieldKind::Amount => self.numeric_operand.is_some(),
            FieldKind::Date => self.date_operand.is_some(),
            FieldKind::Presence => true,
        };
        if !has_operand {
            return Err(ListValidationError::MissingOperand(self.field));
        }
        Ok(())
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.field.kind() {
            FieldKind::Presence => {
                let verb = if self.operator == ComparisonOperator::Equals {
                    "is"
                } else {
                    "is not"
                };
                write!(f, "{} {} set", self.field.label(), verb)
            }
            FieldKind::Text => write!(
                f,
                "{} {} \"{}\"",
                self.field.label(),
                self.operator.symbol(),
                self.string_operand.as_deref().unwrap_or_default()
            ),
            FieldKind::Amount => write!(
                f,
                "{} {} {}",
                self.field.label(),
                self.operator.symbol(),
                self.numeric_operand.unwrap_or_default()
            ),
            FieldKind::Date => match self.date_operand {
                Some(at) => write!(
                    f,
                    "{} {} {}",
                    self.field.label(),
                    self.operator.symbol(),
                    at.format("%Y-%m-%d")
                ),
                None => write!(f, "{} {} ?", self.field.label(), self.operator.symbol()),
            },
        }
    }
}

/// A registry entry: ordinary or smart list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponList {
    pub id: ListId,
    pub name: String,
    #[serde(default = "default_color_tag")]
    pub color_tag: String,
    #[serde(default = "default_icon_tag")]
    pub icon_tag: String,
    /// Built-in lists cannot be deleted and stay smart
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub is_smart: bool,
    /// AND (`true`) or OR (`false`) combination of conditions
    #[serde(default = "default_match_all")]
    pub match_all: bool,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

fn default_color_tag() -> String {
    "blue".to_string()
}

fn default_icon_tag() -> String {
    "ticket".to_string()
}

fn default_match_all() -> bool {
    true
}

impl CouponList {
    /// Create an ordinary list
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ListId::new(),
            name: name.into(),
            color_tag: default_color_tag(),
            icon_tag: default_icon_tag(),
            is_default: false,
            is_smart: false,
            match_all: true,
            conditions: Vec::new(),
        }
    }

    /// Create a smart list from a condition set
    pub fn smart(name: impl Into<String>, match_all: bool, conditions: Vec<Condition>) -> Self {
        Self {
            is_smart: true,
            match_all,
            conditions,
            ..Self::new(name)
        }
    }

    /// The synthesized Recently Deleted entry; never part of the registry
    pub fn recently_deleted() -> Self {
        Self {
            id: ListId::recently_deleted(),
            name: RECENTLY_DELETED_NAME.to_string(),
            color_tag: "gray".to_string(),
            icon_tag: "trash".to_string(),
            is_default: true,
            is_smart: false,
            match_all: true,
            conditions: Vec::new(),
        }
    }

    /// First `type == X` operand, used to prefill records created from a smart list
    pub fn implied_type(&self) -> Option<&str> {
        if !self.is_smart {
            return None;
        }
        self.conditions
            .iter()
            .find(|c| c.field == ConditionField::Type && c.operator == ComparisonOperator::Equals)
            .and_then(|c| c.string_operand.as_deref())
    }

    pub fn validate(&self) -> Result<(), ListValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ListValidationError::EmptyName);
        }
        if name.chars().count() > 50 {
            return Err(ListValidationError::NameTooLong(name.chars().count()));
        }
        if name.eq_ignore_ascii_case(RECENTLY_DELETED_NAME) {
            return Err(ListValidationError::ReservedName);
        }
        if self.id.is_recently_deleted() {
            return Err(ListValidationError::ReservedName);
        }
        if self.is_smart {
            for condition in &self.conditions {
                condition.validate()?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for CouponList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Built-in smart lists seeded on first run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultList {
    GiftCards,
    Coupons,
    Vouchers,
}

impl DefaultList {
    pub fn all() -> &'static [Self] {
        &[Self::GiftCards, Self::Coupons, Self::Vouchers]
    }

    /// Canonical type name the list filters on
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::GiftCards => "Gift Cards",
            Self::Coupons => "Coupons",
            Self::Vouchers => "Vouchers",
        }
    }

    /// Fixed id so independently seeded devices agree on the built-ins
    pub fn id(&self) -> ListId {
        let n = match self {
            Self::GiftCards => 1,
            Self::Coupons => 2,
            Self::Vouchers => 3,
        };
        ListId::from_uuid(Uuid::from_u128(n))
    }

    pub fn to_list(&self) -> CouponList {
        let (color, icon) = match self {
            Self::GiftCards => ("purple", "giftcard"),
            Self::Coupons => ("orange", "ticket"),
            Self::Vouchers => ("green", "tag"),
        };
        CouponList {
            id: self.id(),
            name: self.type_name().to_string(),
            color_tag: color.to_string(),
            icon_tag: icon.to_string(),
            is_default: true,
            is_smart: true,
            match_all: true,
            conditions: vec![Condition::text(
                ConditionField::Type,
                ComparisonOperator::Equals,
                self.type_name(),
            )],
        }
    }
}

/// Validation errors for lists
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListValidationError {
    EmptyName,
    NameTooLong(usize),
    ReservedName,
    UnsupportedOperator {
        field: ConditionField,
        operator: ComparisonOperator,
    },
    MissingOperand(ConditionField),
}

impl fmt::Display for ListValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "List name cannot be empty"),
            Self::NameTooLong(len) => write!(f, "List name too long ({} chars, max 50)", len),
            Self::ReservedName => write!(f, "'{}' is reserved", RECENTLY_DELETED_NAME),
            Self::UnsupportedOperator { field, operator } => write!(
                f,
                "Operator {} is not supported for {}",
                operator.symbol(),
                field.label()
            ),
            Self::MissingOperand(field) => {
                write!(f, "Condition on {} is missing its value", field.label())
            }
        }
    }
}

impl std::error::Error for ListValidationError {}
