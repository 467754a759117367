use std::str::FromStr;

use alloy_primitives::utils::{ParseUnits, Unit};
use alloy_primitives::{Address, U256};

use crate::error::{CandyError, Result};

fn unit_for(decimals: u32) -> Result<Unit> {
    u8::try_from(decimals)
        .ok()
        .and_then(Unit::new)
        .ok_or_else(|| CandyError::Validation(format!("unsupported token decimals: {decimals}")))
}

/// Convert a display amount (e.g. `"1.5"`) into base units.
///
/// # Errors
///
/// Returns `CandyError::Validation` if the input is empty, not a plain
/// decimal number, not strictly positive, has more significant fractional
/// digits than `decimals`, or does not fit in 256 bits once scaled.
pub fn parse_amount(input: &str, decimals: u32) -> Result<U256> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CandyError::Validation("enter an amount".into()));
    }
    let invalid = || CandyError::Validation(format!("invalid amount: {trimmed}"));

    let unsigned = match trimmed.strip_prefix('-') {
        Some(rest) => {
            // Still a number, just not a positive one.
            if is_plain_decimal(rest) {
                return Err(CandyError::Validation(
                    "amount must be greater than zero".into(),
                ));
            }
            return Err(invalid());
        }
        None => trimmed,
    };
    if !is_plain_decimal(unsigned) {
        return Err(invalid());
    }

    // Trailing fractional zeros carry no precision.
    let normalized = match unsigned.split_once('.') {
        Some((whole, frac)) => {
            let frac = frac.trim_end_matches('0');
            let whole = if whole.is_empty() { "0" } else { whole };
            if frac.len() > decimals as usize {
                return Err(CandyError::Validation(format!(
                    "amount {trimmed} has more than {decimals} decimal places"
                )));
            }
            if frac.is_empty() {
                whole.to_string()
            } else {
                format!("{whole}.{frac}")
            }
        }
        None => unsigned.to_string(),
    };

    let value: U256 = ParseUnits::parse_units(&normalized, unit_for(decimals)?)
        .map_err(|_| CandyError::Validation(format!("amount too large: {trimmed}")))?
        .into();
    if value.is_zero() {
        return Err(CandyError::Validation(
            "amount must be greater than zero".into(),
        ));
    }
    Ok(value)
}

/// Digits with at most one `.` and at least one digit somewhere.
fn is_plain_decimal(s: &str) -> bool {
    let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
    !(whole.is_empty() && frac.is_empty())
        && whole.bytes().all(|b| b.is_ascii_digit())
        && frac.bytes().all(|b| b.is_ascii_digit())
}

/// Render base units as a display amount.
///
/// Trailing fractional zeros are trimmed but one digit is always kept, so
/// `1.5 * 10^18` renders as `"1.5"` and zero as `"0.0"`.
pub fn format_units(value: U256, decimals: u32) -> String {
    let Ok(unit) = unit_for(decimals) else {
        return value.to_string();
    };
    let mut formatted = ParseUnits::U256(value).format_units(unit);
    while formatted.ends_with('0') {
        formatted.pop();
    }
    if formatted.ends_with('.') {
        formatted.push('0');
    }
    formatted
}

/// Parse a user-supplied recipient address.
pub fn parse_address(input: &str) -> Result<Address> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CandyError::Validation("enter a recipient address".into()));
    }
    Address::from_str(trimmed)
        .map_err(|_| CandyError::Validation(format!("invalid recipient address: {trimmed}")))
}

/// `0x1234...abcd` (first 6, last 4 characters of the checksummed form).
pub fn short_address(address: &Address) -> String {
    let full = address.to_string();
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}
