//! Field-level validation for the proposal form

use alloy::primitives::{Address, U256};

use crate::domain::units::parse_units;
use crate::domain::contract::NATIVE_DECIMALS;
use crate::error::{Field, FieldError};

/// `^0x[0-9a-fA-F]{40}$`
pub fn is_address(value: &str) -> bool {
    let Some(payload) = value.strip_prefix("0x") else {
        return false;
    };
    payload.len() == 40 && payload.bytes().all(|b| b.is_ascii_hexdigit())
}

/// `^\d+\.?\d*$`
pub fn is_decimal_amount(value: &str) -> bool {
    let (int_part, frac_part) = value.split_once('.').unwrap_or((value, ""));
    !int_part.is_empty()
        && int_part.bytes().all(|b| b.is_ascii_digit())
        && frac_part.bytes().all(|b| b.is_ascii_digit())
}

/// True when a well-formed decimal amount has at least one non-zero digit
pub fn is_positive_amount(value: &str) -> bool {
    is_decimal_amount(value) && value.bytes().any(|b| matches!(b, b'1'..=b'9'))
}

pub fn parse_address(value: &str) -> Option<Address> {
    if !is_address(value) {
        return None;
    }
    let bytes = hex::decode(&value[2..]).ok()?;
    Some(Address::from_slice(&bytes))
}

pub fn validate_recipient(value: &str) -> Result<Address, FieldError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(FieldError::new(Field::Recipient, "Recipient address is required"));
    }
    parse_address(value).ok_or_else(|| FieldError::new(Field::Recipient, "Invalid Ethereum address"))
}

pub fn validate_custom_token(value: &str) -> Result<Address, FieldError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(FieldError::new(Field::CustomToken, "Token address is required"));
    }
    parse_address(value).ok_or_else(|| FieldError::new(Field::CustomToken, "Invalid token address"))
}

/// Validate the amount text. `native_cap` is a soft sanity bound in wei that
/// only applies to native-currency transfers.
pub fn validate_amount(value: &str, native_cap: Option<U256>) -> Result<(), FieldError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(FieldError::new(Field::Amount, "Amount is required"));
    }
    if !is_decimal_amount(value) {
        return Err(FieldError::new(Field::Amount, "Invalid amount format"));
    }
    if !is_positive_amount(value) {
        return Err(FieldError::new(Field::Amount, "Amount must be greater than zero"));
    }
    if let Some(cap) = native_cap {
        let too_large = match parse_units(value, NATIVE_DECIMALS) {
            Ok(wei) => wei > cap,
            Err(_) => true,
        };
        if too_large {
            return Err(FieldError::new(
                Field::Amount,
                "Amount is implausibly large for ETH; check the value",
            ));
        }
    }
    Ok(())
}
