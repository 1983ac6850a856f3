use alloy_primitives::U256;
use rust_decimal::prelude::FromStr;
use rust_decimal::Decimal;

use crate::models::errors::ActionError;

/// Renders a smallest-unit value as a decimal string, scaled by the token's
/// decimals. Lossless: works on the base-10 digits, so the full 256-bit
/// range survives. Trailing fractional zeros are trimmed.
pub fn format_units(raw: U256, decimals: u8) -> String {
    let digits = raw.to_string();
    if decimals == 0 {
        return digits;
    }

    let scale = decimals as usize;
    let padded = if digits.len() <= scale {
        format!("{}{}", "0".repeat(scale - digits.len() + 1), digits)
    } else {
        digits
    };

    let split = padded.len() - scale;
    let (int_part, frac_part) = padded.split_at(split);
    let frac_part = frac_part.trim_end_matches('0');

    if frac_part.is_empty() {
        int_part.to_string()
    } else {
        format!("{}.{}", int_part, frac_part)
    }
}

/// Converts user decimal input into smallest units. Rejects empty input,
/// non-digit characters, and more fractional digits than the token carries.
pub fn parse_units(input: &str, decimals: u8) -> Result<U256, ActionError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ActionError::InvalidAmount("empty amount".to_string()));
    }

    let (int_part, frac_part) = match trimmed.split_once('.') {
        Some((i, f)) => (i, f),
        None => (trimmed, ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return Err(ActionError::InvalidAmount(trimmed.to_string()));
    }
    if !int_part.chars().all(|c| c.is_ascii_digit())
        || !frac_part.chars().all(|c| c.is_ascii_digit())
    {
        return Err(ActionError::InvalidAmount(trimmed.to_string()));
    }
    if frac_part.len() > decimals as usize {
        return Err(ActionError::InvalidAmount(format!(
            "{} exceeds {} decimals",
            trimmed, decimals
        )));
    }

    let mut joined = format!("{}{}", int_part, frac_part);
    joined.push_str(&"0".repeat(decimals as usize - frac_part.len()));

    U256::from_str(&joined).map_err(|_| ActionError::InvalidAmount(trimmed.to_string()))
}

/// Decimal view of a formatted amount string, for comparisons in decimal
/// space. Values beyond rust_decimal's range clamp to MAX, which keeps an
/// effectively-unlimited allowance passing the strict checks.
pub fn to_decimal(formatted: &str) -> Decimal {
    Decimal::from_str(formatted).unwrap_or(Decimal::MAX)
}
