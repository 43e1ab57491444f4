//! Fixed-point conversion between decimal strings and base units

use alloy::primitives::utils::{format_units as format_base, parse_units as parse_base};
use alloy::primitives::U256;

use crate::error::UnitsError;

/// Largest exponent alloy's `Unit` accepts
const MAX_DECIMALS: u8 = 77;

/// Format a base-unit amount as a decimal string, trimming trailing zeros.
/// Returns `None` when `decimals` is too large to represent.
pub fn format_units(value: U256, decimals: u8) -> Option<String> {
    let formatted = format_base(value, decimals).ok()?;
    match formatted.split_once('.') {
        Some((whole, frac)) => match frac.trim_end_matches('0') {
            "" => Some(whole.to_string()),
            frac => Some(format!("{whole}.{frac}")),
        },
        None => Some(formatted),
    }
}

/// Parse a non-negative decimal string into base units.
///
/// Fractional digits beyond `decimals` are rounded half-up, so a string like
/// `0.0000000000000000001` with 18 decimals becomes zero.
pub fn parse_units(input: &str, decimals: u8) -> Result<U256, UnitsError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UnitsError::Empty);
    }
    if decimals > MAX_DECIMALS {
        return Err(UnitsError::Decimals(decimals));
    }

    let (int_part, frac_part) = trimmed.split_once('.').unwrap_or((trimmed, ""));
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty()) || !all_digits(int_part) || !all_digits(frac_part)
    {
        return Err(UnitsError::Invalid(trimmed.to_string()));
    }

    let places = decimals as usize;
    let (kept, round_up) = if frac_part.len() > places {
        (&frac_part[..places], frac_part.as_bytes()[places] >= b'5')
    } else {
        (frac_part, false)
    };
    let whole = if int_part.is_empty() { "0" } else { int_part };
    let normalized = if kept.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{kept}")
    };

    let value = parse_base(&normalized, decimals)
        .map_err(|_| UnitsError::Overflow)?
        .get_absolute();
    if round_up {
        value
            .checked_add(U256::from(1u64))
            .ok_or(UnitsError::Overflow)
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE_ETHER: u128 = 1_000_000_000_000_000_000;

    #[test]
    fn test_parse_units() {
        assert_eq!(parse_units("1", 18).unwrap(), U256::from(ONE_ETHER));
        assert_eq!(
            parse_units("0.5", 18).unwrap(),
            U256::from(500_000_000_000_000_000u128)
        );
        assert_eq!(
            parse_units("1.5", 18).unwrap(),
            U256::from(1_500_000_000_000_000_000u128)
        );
        assert_eq!(parse_units("12.", 6).unwrap(), U256::from(12_000_000u64));
        assert_eq!(parse_units("100", 0).unwrap(), U256::from(100u64));
    }

    #[test]
    fn test_parse_units_rounds_excess_digits() {
        assert_eq!(parse_units("0.0000000000000000001", 18).unwrap(), U256::ZERO);
        assert_eq!(
            parse_units("0.0000000000000000005", 18).unwrap(),
            U256::from(1u64)
        );
        assert_eq!(parse_units("1.2345", 2).unwrap(), U256::from(123u64));
        assert_eq!(parse_units("1.235", 2).unwrap(), U256::from(124u64));
        assert_eq!(parse_units("0.999", 2).unwrap(), U256::from(100u64));
        assert_eq!(parse_units(".5", 0).unwrap(), U256::from(1u64));
    }

    #[test]
    fn test_parse_units_rejects_garbage() {
        assert_eq!(parse_units("", 18), Err(UnitsError::Empty));
        assert_eq!(parse_units(".", 18), Err(UnitsError::Invalid(".".into())));
        assert_eq!(parse_units("-1", 18), Err(UnitsError::Invalid("-1".into())));
        assert_eq!(
            parse_units("1.2.3", 18),
            Err(UnitsError::Invalid("1.2.3".into()))
        );
        assert_eq!(parse_units("1", 80), Err(UnitsError::Decimals(80)));
        let huge = "9".repeat(90);
        assert_eq!(parse_units(&huge, 0), Err(UnitsError::Overflow));
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(U256::from(ONE_ETHER), 18).unwrap(), "1");
        assert_eq!(
            format_units(U256::from(1_500_000_000_000_000_000u128), 18).unwrap(),
            "1.5"
        );
        assert_eq!(
            format_units(U256::from(100_000_000_000_000_000u128), 18).unwrap(),
            "0.1"
        );
        assert_eq!(format_units(U256::from(1u64), 18).unwrap(), "0.000000000000000001");
        assert_eq!(format_units(U256::from(1_234_567u64), 6).unwrap(), "1.234567");
        assert_eq!(format_units(U256::ZERO, 18).unwrap(), "0");
        assert_eq!(format_units(U256::from(7u64), 0).unwrap(), "7");
        assert!(format_units(U256::from(7u64), 90).is_none());
    }

    #[test]
    fn test_one_ether_survives_format_and_parse() {
        let formatted = format_units(U256::from(ONE_ETHER), 18).unwrap();
        assert_eq!(formatted, "1");
        assert_eq!(parse_units(&formatted, 18).unwrap(), U256::from(ONE_ETHER));
    }
}
