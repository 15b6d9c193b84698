//! Request field checks that mirror the column limits in `migrations/`.

use bigdecimal::{BigDecimal, Zero};

use crate::app_error::AppError;

pub const NAME_MAX_LEN: usize = 255;
pub const CATEGORY_MAX_LEN: usize = 64;
pub const ORDER_NO_MAX_LEN: usize = 32;

/// Catalog prices are stored as `NUMERIC(10, 2)`.
pub const PRICE_SCALE: i64 = 2;
const PRICE_MAX_INTEGER_DIGITS: u32 = 8;

/// Trims `value` and rejects it when blank or longer than `max_len` characters.
pub fn required(field: &str, value: String, max_len: usize) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{} is required", field)));
    }
    max_len_check(field, value, max_len)?;
    Ok(value.to_string())
}

pub fn max_len_check(field: &str, value: &str, max_len: usize) -> Result<(), AppError> {
    if value.chars().count() > max_len {
        return Err(AppError::BadRequest(format!(
            "{} must be at most {} characters",
            field, max_len
        )));
    }
    Ok(())
}

/// Accepts prices that fit the catalog columns exactly: non-negative, at most
/// two decimal places and below 100,000,000.
pub fn check_price(field: &str, price: Option<&BigDecimal>) -> Result<(), AppError> {
    let Some(price) = price else {
        return Ok(());
    };

    if *price < BigDecimal::zero() {
        return Err(AppError::BadRequest(format!(
            "{} must not be negative",
            field
        )));
    }
    if price.with_scale(PRICE_SCALE) != *price {
        return Err(AppError::BadRequest(format!(
            "{} must have at most {} decimal places",
            field, PRICE_SCALE
        )));
    }
    if *price >= BigDecimal::from(10_u64.pow(PRICE_MAX_INTEGER_DIGITS)) {
        return Err(AppError::BadRequest(format!(
            "{} must be less than {}",
            field,
            10_u64.pow(PRICE_MAX_INTEGER_DIGITS)
        )));
    }
    Ok(())
}
