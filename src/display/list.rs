//! List display formatting
//!
//! Formats the list registry and single-list summaries.

use crate::models::{ComparisonOperator, Condition, CouponList, CurrencyLookup, FieldKind, ListId};
use crate::services::ListSummary;

use super::totals::{format_totals, format_totals_inline};

fn kind_label(list: &CouponList) -> &'static str {
    if list.id.is_recently_deleted() {
        "Deleted"
    } else if list.is_smart {
        "Smart"
    } else {
        "List"
    }
}

/// Format the registry with counts and totals, marking the selected list
pub fn format_list_table(
    summaries: &[ListSummary],
    selected: Option<ListId>,
    lookup: &dyn CurrencyLookup,
) -> String {
    if summaries.is_empty() {
        return "No lists found.".to_string();
    }

    let name_width = summaries
        .iter()
        .map(|s| s.list.name.chars().count())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "  {:<name_width$}  {:<7}  {:>5}  {}\n",
        "Name",
        "Kind",
        "Count",
        "Totals",
        name_width = name_width,
    ));
    output.push_str(&format!(
        "  {:-<name_width$}  {:-<7}  {:->5}  {:-<12}\n",
        "",
        "",
        "",
        "",
        name_width = name_width,
    ));

    for summary in summaries {
        let marker = if Some(summary.list.id) == selected { "*" } else { " " };
        let built_in = if summary.list.is_default && !summary.list.id.is_recently_deleted() {
            " (built-in)"
        } else {
            ""
        };
        output.push_str(&format!(
            "{} {:<name_width$}  {:<7}  {:>5}  {}{}\n",
            marker,
            summary.list.name,
            kind_label(&summary.list),
            summary.count,
            format_totals_inline(&summary.totals, lookup),
            built_in,
            name_width = name_width,
        ));
    }

    output
}

/// Human-readable form of a condition, e.g. `Type == "Gift Cards"`
pub fn format_condition(condition: &Condition) -> String {
    let field = condition.field.label();
    match condition.field.kind() {
        FieldKind::Text => format!(
            "{} {} \"{}\"",
            field,
            condition.operator.symbol(),
            condition.string_operand.as_deref().unwrap_or_default()
        ),
        FieldKind::Amount => format!(
            "{} {} {}",
            field,
            condition.operator.symbol(),
            condition.numeric_operand.unwrap_or_default()
        ),
        FieldKind::Date => format!(
            "{} {} {}",
            field,
            condition.operator.symbol(),
            condition
                .date_operand
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default()
        ),
        FieldKind::Presence => match condition.operator {
            ComparisonOperator::Equals => format!("{} is set", field),
            _ => format!("{} is not set", field),
        },
    }
}

/// Format a single list's details
pub fn format_list_details(summary: &ListSummary, lookup: &dyn CurrencyLookup) -> String {
    let list = &summary.list;
    let mut output = String::new();

    output.push_str(&format!("List: {}\n", list.name));
    output.push_str(&format!("  ID:       {}\n", list.id));
    output.push_str(&format!("  Kind:     {}\n", kind_label(list)));
    output.push_str(&format!("  Color:    {}\n", list.color_tag));
    output.push_str(&format!("  Icon:     {}\n", list.icon_tag));
    output.push_str(&format!("  Records:  {}\n", summary.count));

    if list.is_smart {
        output.push('\n');
        let joiner = if list.match_all { "all" } else { "any" };
        if list.conditions.is_empty() {
            output.push_str("  Matches every record\n");
        } else {
            output.push_str(&format!("  Matches {} of:\n", joiner));
            for condition in &list.conditions {
                output.push_str(&format!("    - {}\n", format_condition(condition)));
            }
        }
    }

    output.push('\n');
    output.push_str("  Totals:\n");
    for line in format_totals(&summary.totals, lookup).lines() {
        output.push_str(&format!("    {}\n", line));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BuiltinCurrencies, ConditionField, DefaultList, Money};
    use crate::services::CurrencyTotal;

    fn summary(list: CouponList, count: usize) -> ListSummary {
        ListSummary {
            list,
            count,
            totals: vec![CurrencyTotal {
                currency_code: "USD".into(),
                total: Money::from_cents(2500),
            }],
        }
    }

    #[test]
    fn test_format_list_table() {
        let cards = DefaultList::GiftCards.to_list();
        let travel = CouponList::new("Travel");
        let output = format_list_table(
            &[summary(cards.clone(), 2), summary(travel, 0)],
            Some(cards.id),
            &BuiltinCurrencies,
        );

        assert!(output.contains("* Gift Cards"));
        assert!(output.contains("(built-in)"));
        assert!(output.contains("Travel"));
        assert!(output.contains("$25.00 USD"));
    }

    #[test]
    fn test_format_empty_registry() {
        assert!(format_list_table(&[], None, &BuiltinCurrencies).contains("No lists found"));
    }

    #[test]
    fn test_format_smart_details() {
        let list = CouponList::smart(
            "Funded cards",
            true,
            vec![
                Condition::text(ConditionField::Type, ComparisonOperator::Equals, "Gift Cards"),
                Condition::presence(ConditionField::HasBalance, true),
            ],
        );
        let output = format_list_details(&summary(list, 1), &BuiltinCurrencies);
        assert!(output.contains("Matches all of:"));
        assert!(output.contains("\"Gift Cards\""));
        assert!(output.contains("is set"));
        assert!(output.contains("$25.00 USD"));
    }
}
