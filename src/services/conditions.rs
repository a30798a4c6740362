//! Smart-list condition evaluation
//!
//! `matches` is a pure function of the record, the name of the list the
//! record is physically stored under, and the target list.

use std::cmp::Ordering;

use crate::models::{ComparisonOperator, Condition, ConditionField, CouponList, Record};

/// Whether `record`, stored under `source_list_name`, belongs to `list`
///
/// Ordinary lists always match; their membership is their storage scope.
/// A smart list with no conditions matches everything.
pub fn matches(record: &Record, source_list_name: &str, list: &CouponList) -> bool {
    if !list.is_smart || list.conditions.is_empty() {
        return true;
    }

    let mut results = list
        .conditions
        .iter()
        .map(|condition| evaluate(record, source_list_name, condition));

    if list.match_all {
        results.all(|hit| hit)
    } else {
        results.any(|hit| hit)
    }
}

/// Evaluate a single condition
///
/// A condition on a missing optional attribute does not match; the
/// presence fields test for the attribute directly.
pub fn evaluate(record: &Record, source_list_name: &str, condition: &Condition) -> bool {
    match condition.field {
        ConditionField::Type => compare_text(
            record.record_type.as_deref(),
            condition.operator,
            condition.string_operand.as_deref(),
        ),
        ConditionField::SourceListName => compare_text(
            Some(source_list_name),
            condition.operator,
            condition.string_operand.as_deref(),
        ),
        ConditionField::AmountPresentOrValue => match (record.remaining_value, condition.numeric_operand) {
            (Some(value), Some(operand)) => ordered(value.cmp(&operand), condition.operator),
            _ => false,
        },
        ConditionField::ExpirationDate => match (record.expiration_date, condition.date_operand) {
            (Some(expires), Some(operand)) => match condition.operator {
                ComparisonOperator::Equals => expires.date_naive() == operand.date_naive(),
                ComparisonOperator::NotEquals => expires.date_naive() != operand.date_naive(),
                op => ordered(expires.cmp(&operand), op),
            },
            _ => false,
        },
        ConditionField::HasBalance => presence(record.has_balance(), condition.operator),
        ConditionField::HasDescription => presence(record.has_description(), condition.operator),
        ConditionField::HasExpirationDate => {
            presence(record.expiration_date.is_some(), condition.operator)
        }
    }
}

fn compare_text(value: Option<&str>, operator: ComparisonOperator, operand: Option<&str>) -> bool {
    let (Some(value), Some(operand)) = (value, operand) else {
        return false;
    };
    let equal = value.trim().to_lowercase() == operand.trim().to_lowercase();
    match operator {
        ComparisonOperator::Equals => equal,
        ComparisonOperator::NotEquals => !equal,
        _ => false,
    }
}

fn ordered(ordering: Ordering, operator: ComparisonOperator) -> bool {
    match operator {
        ComparisonOperator::Equals => ordering == Ordering::Equal,
        ComparisonOperator::NotEquals => ordering != Ordering::Equal,
        ComparisonOperator::GreaterThan => ordering == Ordering::Greater,
        ComparisonOperator::LessThan => ordering == Ordering::Less,
        ComparisonOperator::GreaterOrEqual => ordering != Ordering::Less,
        ComparisonOperator::LessOrEqual => ordering != Ordering::Greater,
    }
}

fn presence(present: bool, operator: ComparisonOperator) -> bool {
    match operator {
        ComparisonOperator::Equals => present,
        ComparisonOperator::NotEquals => !present,
        _ => false,
    }
}
