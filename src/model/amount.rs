//! Amount type for monetary values written in the German locale.
//!
//! The export writes amounts like `-1.234,56`: `.` separates thousands and `,` separates the
//! decimal places. This module parses such strings into `Decimal` values, sums them and
//! normalizes the sign of the sum.

use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// Represents how an amount was (or should be) formatted.
///
/// # Examples
///  - `AmountFormat{ grouped: true }` -> `-60.000,00`
///  - `AmountFormat{ grouped: false }` -> `-60000,00`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AmountFormat {
    /// Whether `.` is present as a thousands separator in the formatting.
    grouped: bool,
}

impl Default for AmountFormat {
    fn default() -> Self {
        DEFAULT_FORMAT
    }
}

/// The default format groups thousands: e.g. `-60.000,00`.
const DEFAULT_FORMAT: AmountFormat = AmountFormat { grouped: true };

/// Represents one amount cell of the export.
///
/// Formatting is considered significant for the purposes of equality, so for numeric comparisons,
/// you should access the `Decimal` value and use that.
///
/// # Examples
///
/// ```
/// # use cashflow_sankey::model::Amount;
/// # use rust_decimal::Decimal;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("1.234,56").unwrap();
/// assert_eq!(amount.value(), Decimal::new(123456, 2));
/// assert_eq!(amount.to_string(), "1.234,56");
/// ```
///
/// Value equivalency, but not absolute equivalency
/// ```
/// # use cashflow_sankey::model::Amount;
/// # use std::str::FromStr;
/// let a = Amount::from_str("-5000,00").unwrap();
/// let b = Amount::from_str("-5.000,00").unwrap();
/// assert_ne!(a, b);
/// assert_eq!(a.value(), b.value());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount {
    /// The parsed numerical value.
    value: Decimal,
    /// The way the numerical value was parsed from, or should be written to, a `String`.
    format: AmountFormat,
}

impl Amount {
    /// Creates a new Amount from a Decimal value with default `String` formatting.
    pub const fn new(value: Decimal) -> Self {
        Self {
            value,
            format: DEFAULT_FORMAT,
        }
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.value
    }

    pub fn is_zero(&self) -> bool {
        self.value().is_zero()
    }

    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.value().is_sign_negative()
    }
}

/// An amount cell that does not follow the locale number format.
#[derive(Clone, PartialEq, Eq)]
pub struct AmountError {
    text: String,
    reason: &'static str,
}

impl AmountError {
    pub(crate) fn new(text: &str, reason: &'static str) -> Self {
        Self {
            text: text.to_string(),
            reason,
        }
    }

    /// The offending cell text.
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "AmountError({:?}: {})", self.text, self.reason)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a valid amount: {}", self.text, self.reason)
    }
}

impl std::error::Error for AmountError {}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(AmountError::new(s, "the cell is empty"));
        }

        let (sign, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => ("-", rest),
            None => ("", trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };

        let (integer, fraction) = match unsigned.split_once(',') {
            Some((integer, fraction)) => (integer, Some(fraction)),
            None => (unsigned, None),
        };

        let grouped = integer.contains('.');
        let digits = if grouped {
            ungroup(integer).ok_or_else(|| {
                AmountError::new(s, "thousands must be grouped in blocks of three")
            })?
        } else if is_digits(integer) {
            integer.to_string()
        } else {
            return Err(AmountError::new(s, "expected digits before the decimal comma"));
        };

        let canonical = match fraction {
            Some(fraction) if is_digits(fraction) => format!("{sign}{digits}.{fraction}"),
            Some(_) => {
                return Err(AmountError::new(s, "expected digits after the decimal comma"));
            }
            None => format!("{sign}{digits}"),
        };

        let value = Decimal::from_str(&canonical)
            .map_err(|_| AmountError::new(s, "the number is out of range"))?;
        Ok(Amount {
            value,
            format: AmountFormat { grouped },
        })
    }
}

/// Removes `.` thousands separators, returning `None` if the grouping is malformed.
fn ungroup(integer: &str) -> Option<String> {
    let mut groups = integer.split('.');
    let first = groups.next()?;
    if first.is_empty() || first.len() > 3 || !is_digits(first) {
        return None;
    }
    let mut digits = first.to_string();
    for group in groups {
        if group.len() != 3 || !is_digits(group) {
            return None;
        }
        digits.push_str(group);
    }
    Some(digits)
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        let cents = self
            .value()
            .abs()
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let plain = format!("{cents:.2}");
        let (integer, fraction) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));
        if self.format.grouped {
            write!(f, "{sign}{},{fraction}", group_thousands(integer))
        } else {
            write!(f, "{sign}{integer},{fraction}")
        }
    }
}

/// Inserts `.` between blocks of three digits, counting from the right.
fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (ix, c) in digits.chars().enumerate() {
        if ix > 0 && (digits.len() - ix) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    grouped
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

/// Sums locale-formatted amount cells and returns the magnitude of the sum.
///
/// The export records outflows as negative values, the flow graph only cares about the size of
/// each flow. An empty input sums to zero.
///
/// # Errors
/// Returns the first cell that does not parse, or the cell at which the sum leaves the range of
/// `Decimal`. No partial sum is returned.
pub fn normalized_sum<I, S>(cells: I) -> Result<Decimal, AmountError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut sum = Decimal::ZERO;
    for cell in cells {
        let cell = cell.as_ref();
        sum = sum
            .checked_add(Amount::from_str(cell)?.value())
            .ok_or_else(|| AmountError::new(cell, "the sum is out of range"))?;
    }
    Ok(sum.abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_grouped() {
        let amount = Amount::from_str("1.234,56").unwrap();
        assert_eq!(amount.value(), dec("1234.56"));
    }

    #[test]
    fn test_parse_negative() {
        let amount = Amount::from_str("-50,00").unwrap();
        assert_eq!(amount.value(), dec("-50.00"));
        assert!(amount.is_negative());
    }

    #[test]
    fn test_parse_explicit_plus() {
        let amount = Amount::from_str("+2000,00").unwrap();
        assert_eq!(amount.value(), dec("2000"));
    }

    #[test]
    fn test_parse_integer_without_fraction() {
        let amount = Amount::from_str("800").unwrap();
        assert_eq!(amount.value(), dec("800"));
    }

    #[test]
    fn test_parse_multiple_groups() {
        let amount = Amount::from_str("-1.234.567,89").unwrap();
        assert_eq!(amount.value(), dec("-1234567.89"));
    }

    #[test]
    fn test_parse_whitespace() {
        let amount = Amount::from_str("  12,30 ").unwrap();
        assert_eq!(amount.value(), dec("12.3"));
    }

    #[test]
    fn test_reject_empty_placeholder() {
        let err = Amount::from_str("empty").unwrap_err();
        assert_eq!(err.text(), "empty");
    }

    #[test]
    fn test_reject_empty_string() {
        assert!(Amount::from_str("").is_err());
        assert!(Amount::from_str("   ").is_err());
    }

    #[test]
    fn test_reject_us_format() {
        assert!(Amount::from_str("1,234.56").is_err());
        assert!(Amount::from_str("1234.56").is_err());
    }

    #[test]
    fn test_reject_bad_grouping() {
        assert!(Amount::from_str("12.34,00").is_err());
        assert!(Amount::from_str(".123,00").is_err());
        assert!(Amount::from_str("1234.567,00").is_err());
    }

    #[test]
    fn test_reject_missing_fraction_digits() {
        assert!(Amount::from_str("12,").is_err());
        assert!(Amount::from_str(",50").is_err());
        assert!(Amount::from_str("12,5a").is_err());
    }

    #[test]
    fn test_display_grouped() {
        let amount = Amount::new(dec("-60000.5"));
        assert_eq!(amount.to_string(), "-60.000,50");
    }

    #[test]
    fn test_display_retains_ungrouped() {
        let s = "-1000000,00";
        let amount = Amount::from_str(s).unwrap();
        assert_eq!(amount.to_string(), s);
    }

    #[test]
    fn test_display_zero() {
        assert_eq!(Amount::new(Decimal::ZERO).to_string(), "0,00");
    }

    #[test]
    fn test_display_rounds_to_cents() {
        assert_eq!(Amount::new(dec("1234.565")).to_string(), "1.234,57");
        assert_eq!(Amount::new(dec("999")).to_string(), "999,00");
        assert_eq!(Amount::new(dec("100000")).to_string(), "100.000,00");
    }

    #[test]
    fn test_display_keeps_every_digit() {
        let amount = Amount::new(dec("12345678901234567890.12"));
        assert_eq!(amount.to_string(), "12.345.678.901.234.567.890,12");
    }

    #[test]
    fn test_normalized_sum_flips_sign() {
        assert_eq!(normalized_sum(["-50,00"]).unwrap(), dec("50"));
        assert_eq!(normalized_sum(["1.234,56"]).unwrap(), dec("1234.56"));
    }

    #[test]
    fn test_normalized_sum_mixed_signs() {
        let sum = normalized_sum(["-800,00", "-150,50", "100,00"]).unwrap();
        assert_eq!(sum, dec("850.50"));
    }

    #[test]
    fn test_normalized_sum_empty() {
        let sum = normalized_sum(Vec::<&str>::new()).unwrap();
        assert_eq!(sum, Decimal::ZERO);
    }

    #[test]
    fn test_normalized_sum_overflow_is_an_error() {
        let max = "-79.228.162.514.264.337.593.543.950.335";
        assert_eq!(normalized_sum([max]).unwrap(), Decimal::MAX);
        let err = normalized_sum([max, "-1,00"]).unwrap_err();
        assert_eq!(err.text(), "-1,00");
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_normalized_sum_fails_on_bad_cell() {
        let err = normalized_sum(["10,00", "abc", "5,00"]).unwrap_err();
        assert_eq!(err.text(), "abc");
    }
}
