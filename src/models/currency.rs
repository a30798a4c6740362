//! Currency display lookup
//!
//! Codes are free-form and never validated; unknown codes display as the
//! code itself.

/// A known currency and its display symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrencyInfo {
    pub code: &'static str,
    pub symbol: &'static str,
    pub name: &'static str,
}

pub const CURRENCIES: &[CurrencyInfo] = &[
    CurrencyInfo { code: "USD", symbol: "$", name: "US Dollar" },
    CurrencyInfo { code: "EUR", symbol: "€", name: "Euro" },
    CurrencyInfo { code: "GBP", symbol: "£", name: "British Pound" },
    CurrencyInfo { code: "JPY", symbol: "¥", name: "Japanese Yen" },
    CurrencyInfo { code: "CAD", symbol: "C$", name: "Canadian Dollar" },
    CurrencyInfo { code: "AUD", symbol: "A$", name: "Australian Dollar" },
    CurrencyInfo { code: "CHF", symbol: "CHF", name: "Swiss Franc" },
    CurrencyInfo { code: "CNY", symbol: "¥", name: "Chinese Yuan" },
    CurrencyInfo { code: "INR", symbol: "₹", name: "Indian Rupee" },
    CurrencyInfo { code: "ILS", symbol: "₪", name: "Israeli Shekel" },
];

/// Maps a currency code to the symbol used when displaying amounts
pub trait CurrencyLookup {
    fn symbol_for<'a>(&'a self, code: &'a str) -> &'a str;
}

/// Lookup over the built-in [`CURRENCIES`] table
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinCurrencies;

impl BuiltinCurrencies {
    pub fn find(&self, code: &str) -> Option<&'static CurrencyInfo> {
        let code = code.trim();
        CURRENCIES.iter().find(|c| c.code.eq_ignore_ascii_case(code))
    }
}

impl CurrencyLookup for BuiltinCurrencies {
    fn symbol_for<'a>(&'a self, code: &'a str) -> &'a str {
        self.find(code).map(|c| c.symbol).unwrap_or(code)
    }
}
