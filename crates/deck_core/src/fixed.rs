//! Fixed-point helpers for on-chain percentages.
//!
//! Contracts store percentages with 18 decimals of precision where
//! `10^18` is 100%, so one percentage point is `10^16`.

use std::str::FromStr;

use alloy_primitives::U256;
use rust_decimal::Decimal;

use crate::error_handler::DeckError;

/// Decimals of one percentage point: 1% == 10^16.
pub const PERCENT_DECIMALS: u32 = 16;

/// `10^18`, the fixed-point value of 100%.
pub fn full_proportion() -> U256 {
    U256::from(1_000_000_000_000_000_000u128)
}

/// Parse a decimal integer string the way the contracts' callers do:
/// surrounding whitespace is ignored and an empty string reads as zero.
pub fn parse_uint(input: &str) -> Option<U256> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Some(U256::ZERO);
    }
    U256::from_str_radix(trimmed, 10).ok()
}

/// Convert a human percentage such as `"25.5"` into its fixed-point value.
pub fn percent_to_fixed(input: &str) -> Result<U256, DeckError> {
    let invalid = || DeckError::Validation(format!("'{input}' is not a valid percentage"));

    let value = Decimal::from_str(input.trim()).map_err(|_| invalid())?.normalize();
    if value.is_sign_negative() && !value.is_zero() {
        return Err(DeckError::Validation(format!(
            "Percentage cannot be negative: {input}"
        )));
    }
    if value > Decimal::ONE_HUNDRED {
        return Err(DeckError::Validation(format!(
            "Percentage cannot exceed 100: {input}"
        )));
    }
    if value.scale() > PERCENT_DECIMALS {
        return Err(DeckError::Validation(format!(
            "Percentage supports at most {PERCENT_DECIMALS} decimal places: {input}"
        )));
    }

    let mantissa = u128::try_from(value.mantissa()).map_err(|_| invalid())?;
    let factor = 10u128.pow(PERCENT_DECIMALS - value.scale());
    let fixed = mantissa.checked_mul(factor).ok_or_else(invalid)?;
    Ok(U256::from(fixed))
}

/// Render a fixed-point percentage with trailing zeros trimmed.
pub fn fixed_to_percent(value: U256) -> String {
    let digits = value.to_string();
    let width = PERCENT_DECIMALS as usize;
    let padded = format!("{digits:0>w$}", w = width + 1);
    let (int_part, frac_part) = padded.split_at(padded.len() - width);
    let frac = frac_part.trim_end_matches('0');
    if frac.is_empty() {
        int_part.to_string()
    } else {
        format!("{int_part}.{frac}")
    }
}

/// Strategy proportion string back to a human percentage.
pub fn proportion_to_percent(proportion: &str) -> Result<String, DeckError> {
    parse_uint(proportion)
        .map(fixed_to_percent)
        .ok_or_else(|| DeckError::Validation(format!("'{proportion}' is not an integer")))
}
