use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

static PRICE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$?(\d+(\.\d+)?)").expect("valid price regex"));

/// Extracts the first number (optionally `$`-prefixed) from rendered price
/// text. Text without digits yields `None`, which callers treat as
/// "unknown price". A number too large for `Decimal` saturates to
/// `Decimal::MAX` so it still fails any budget.
pub fn parse_price(text: &str) -> Option<Decimal> {
    let caps = PRICE_RE.captures(text.trim())?;
    let digits = caps.get(1)?.as_str();
    Some(Decimal::from_str(digits).unwrap_or(Decimal::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn parses_dollar_prefixed_amounts() {
        assert_eq!(parse_price("$250"), Some(Decimal::from(250)));
        assert_eq!(parse_price("  $99.50 "), Decimal::from_str("99.50").ok());
    }

    #[test]
    fn takes_first_number_in_text() {
        assert_eq!(parse_price("Desde $120 - $300"), Some(Decimal::from(120)));
        assert_eq!(parse_price("USD 45 + fees"), Some(Decimal::from(45)));
    }

    #[test]
    fn thousands_separator_stops_the_match() {
        assert_eq!(parse_price("$1,200"), Some(Decimal::from(1)));
    }

    #[test]
    fn oversized_number_is_never_affordable() {
        let huge = format!("${}", "9".repeat(40));
        assert_eq!(parse_price(&huge), Some(Decimal::MAX));
        assert!(parse_price(&huge).unwrap() > Decimal::from(1_000_000));
    }

    #[test]
    fn text_without_digits_is_unknown() {
        assert_eq!(parse_price("Agotado"), None);
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("$"), None);
    }
}
