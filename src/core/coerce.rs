//! Numeric coercion of element text.
//!
//! SIFEN sends amounts as decimal text (`"10000"`, `"10000.0"`, occasionally
//! `"1.5E+4"`). Document-level coercions never fail: unparsable text is zero.
//! The strict variants exist for callers that need to tell "absent" from
//! "garbled".

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use super::SifenError;

/// Parse decimal text, accepting plain and scientific notation.
///
/// Empty or whitespace-only text is zero.
pub fn parse_decimal(text: &str) -> Result<Decimal, SifenError> {
    let t = text.trim();
    if t.is_empty() {
        return Ok(Decimal::ZERO);
    }
    Decimal::from_str(t)
        .or_else(|_| Decimal::from_scientific(t))
        .map_err(|e| SifenError::Numeric(format!("'{t}' is not a number: {e}")))
}

/// Parse an amount in integer minor units, truncating any fraction toward zero.
pub fn parse_amount(text: &str) -> Result<i64, SifenError> {
    let d = parse_decimal(text)?;
    d.trunc()
        .to_i64()
        .ok_or_else(|| SifenError::Numeric(format!("'{}' does not fit an amount", text.trim())))
}

/// [`parse_decimal`], or zero.
pub fn decimal_or_zero(text: &str) -> Decimal {
    parse_decimal(text).unwrap_or(Decimal::ZERO)
}

/// [`parse_amount`], or zero.
pub fn amount_or_zero(text: &str) -> i64 {
    parse_amount(text).unwrap_or(0)
}
