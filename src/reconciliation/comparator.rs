//! Comparator rule set: the typed equality rules applied to each mapped field
//!
//! Every rule is total. Absent, blank or malformed input never raises; it
//! only ever produces a [`Verdict`]. An absent value ([`Value::Empty`]) can
//! never be proven equal to anything, another absent value included.

use bigdecimal::{BigDecimal, RoundingMode};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::types::*;

/// Tokens that coerce to `false` under the boolean rule (compared lowercase)
pub const FALSE_TOKENS: [&str; 5] = ["false", "f", "0", "n", "no"];

/// Largest decimal exponent accepted when parsing a number
const MAX_DECIMAL_SCALE: i64 = 1_000;

/// How a NEX value and an FCA value are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComparisonRule {
    /// Text equality after trimming
    Exact,
    /// Text equality after dropping trailing `Z` characters from the FCA value
    DateSuffixTolerant,
    /// Decimal equality after rounding both sides half-to-even
    NumericRounded { precision: u32 },
    /// Truthiness equality
    BooleanNormalized,
}

impl ComparisonRule {
    /// Compare one NEX value against its FCA counterpart
    ///
    /// `fallback` is only consulted by [`ComparisonRule::NumericRounded`],
    /// and only when `fca` is blank.
    pub fn compare(&self, nex: &Value, fca: &Value, fallback: &Value) -> Verdict {
        match self {
            ComparisonRule::Exact => exact(nex, fca),
            ComparisonRule::DateSuffixTolerant => date_suffix_tolerant(nex, fca),
            ComparisonRule::NumericRounded { precision } => {
                numeric_rounded(nex, fca, fallback, *precision)
            }
            ComparisonRule::BooleanNormalized => boolean_normalized(nex, fca),
        }
    }
}

/// Text equality after trimming both sides
pub fn exact(nex: &Value, fca: &Value) -> Verdict {
    match (nex.as_text(), fca.as_text()) {
        (Some(left), Some(right)) => Verdict::from_match(left.trim() == right.trim()),
        _ => Verdict::Check,
    }
}

/// Text equality ignoring any run of trailing `Z` on the FCA side
///
/// This is a suffix strip, not a timestamp parse: no timezone arithmetic.
pub fn date_suffix_tolerant(nex: &Value, fca: &Value) -> Verdict {
    match (nex.as_text(), fca.as_text()) {
        (Some(left), Some(right)) => {
            Verdict::from_match(left.trim() == right.trim().trim_end_matches('Z'))
        }
        _ => Verdict::Check,
    }
}

/// Decimal equality at `precision` digits, with the treasury bill fallback
///
/// When the primary FCA value is blank or absent, the fallback FCA value is
/// compared instead. A side that does not parse as a number is a mismatch.
pub fn numeric_rounded(nex: &Value, fca: &Value, fallback: &Value, precision: u32) -> Verdict {
    let fca = if fca.is_blank() { fallback } else { fca };

    match (parse_decimal(nex), parse_decimal(fca)) {
        (Some(left), Some(right)) => {
            let scale = i64::from(precision);
            Verdict::from_match(
                left.with_scale_round(scale, RoundingMode::HalfEven)
                    == right.with_scale_round(scale, RoundingMode::HalfEven),
            )
        }
        _ => Verdict::Check,
    }
}

/// Truthiness equality
pub fn boolean_normalized(nex: &Value, fca: &Value) -> Verdict {
    match (coerce_bool(nex), coerce_bool(fca)) {
        (Some(left), Some(right)) => Verdict::from_match(left == right),
        _ => Verdict::Check,
    }
}

/// Best-effort decimal parse; `None` for absent, blank or malformed values
pub fn parse_decimal(value: &Value) -> Option<BigDecimal> {
    let parsed = match value {
        Value::Number(n) => n.clone(),
        Value::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            BigDecimal::from_str(trimmed).ok()?
        }
        Value::Date(_) | Value::Boolean(_) | Value::Empty => return None,
    };

    // Trailing zeros never count towards the exponent limit
    let parsed = parsed.normalized();
    let (_, scale) = parsed.as_bigint_and_exponent();
    if scale.abs() > MAX_DECIMAL_SCALE {
        return None;
    }
    Some(parsed)
}

/// Truthiness of a value; `None` only for absent values
///
/// Any non-blank text that is not one of [`FALSE_TOKENS`] is true.
pub fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Empty => None,
        Value::Boolean(b) => Some(*b),
        Value::Number(n) => Some(*n != BigDecimal::from(0)),
        Value::Date(_) => Some(true),
        Value::Text(s) => {
            let token = s.trim().to_lowercase();
            Some(!token.is_empty() && !FALSE_TOKENS.contains(&token.as_str()))
        }
    }
}
