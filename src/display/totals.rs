//! Totals formatting
//!
//! Amounts render as symbol, value and code ("€12.50 EUR"). A list with
//! no members shows a single zero in dollars.

use crate::models::{CurrencyLookup, Money};
use crate::services::CurrencyTotal;

/// Shown when there is nothing to total
pub const EMPTY_TOTAL: &str = "$0.00";

/// Format an amount with its currency symbol and code
pub fn format_amount(amount: Money, currency_code: &str, lookup: &dyn CurrencyLookup) -> String {
    let symbol = lookup.symbol_for(currency_code);
    if symbol.eq_ignore_ascii_case(currency_code) {
        format!("{} {}", amount, currency_code)
    } else {
        format!("{} {}", amount.format_with_symbol(symbol), currency_code)
    }
}

/// One line per currency, ascending by code
pub fn format_totals(totals: &[CurrencyTotal], lookup: &dyn CurrencyLookup) -> String {
    if totals.is_empty() {
        return format!("{}\n", EMPTY_TOTAL);
    }

    let mut output = String::new();
    for total in totals {
        output.push_str(&format_amount(total.total, &total.currency_code, lookup));
        output.push('\n');
    }
    output
}

/// Totals on a single line, for list summaries
pub fn format_totals_inline(totals: &[CurrencyTotal], lookup: &dyn CurrencyLookup) -> String {
    if totals.is_empty() {
        return EMPTY_TOTAL.to_string();
    }
    totals
        .iter()
        .map(|t| format_amount(t.total, &t.currency_code, lookup))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BuiltinCurrencies;

    fn total(code: &str, cents: i64) -> CurrencyTotal {
        CurrencyTotal {
            currency_code: code.into(),
            total: Money::from_cents(cents),
        }
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(Money::from_cents(1250), "EUR", &BuiltinCurrencies), "€12.50 EUR");
        assert_eq!(format_amount(Money::from_cents(500), "XBT", &BuiltinCurrencies), "5.00 XBT");
        assert_eq!(format_amount(Money::from_cents(900), "CHF", &BuiltinCurrencies), "9.00 CHF");
    }

    #[test]
    fn test_empty_totals() {
        assert_eq!(format_totals(&[], &BuiltinCurrencies), "$0.00\n");
        assert_eq!(format_totals_inline(&[], &BuiltinCurrencies), "$0.00");
    }

    #[test]
    fn test_multiple_currencies() {
        let output = format_totals(&[total("CAD", 300), total("USD", 1250)], &BuiltinCurrencies);
        assert_eq!(output, "C$3.00 CAD\n$12.50 USD\n");
    }
}
