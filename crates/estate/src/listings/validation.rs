use std::cmp::Ordering;

use super::domain::{PropertyId, PropertyTypeId, TagId};

/// Monetary amounts are compared at cent precision.
pub const PRICE_PRECISION_DIGITS: i32 = 2;

/// Share of the expected price a nonzero selling price must reach.
pub const MINIMUM_SELLING_RATIO: f64 = 0.9;

/// Validation errors raised before a write is committed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("a property requires a title")]
    MissingTitle,
    #[error("{kind} name cannot be blank")]
    BlankName { kind: &'static str },
    #[error("expected price must be strictly positive (found {found})")]
    NonPositiveExpectedPrice { found: f64 },
    #[error("selling price must not be negative (found {found})")]
    NegativeSellingPrice { found: f64 },
    #[error(
        "selling price cannot be lower than 90% of the expected price (selling {selling}, minimum {minimum})"
    )]
    SellingPriceTooLow { selling: f64, minimum: f64 },
    #[error("offer validity of {validity} days falls outside the supported date range")]
    DeadlineOutOfRange { validity: i32 },
    #[error("property {0:?} does not exist")]
    UnknownProperty(PropertyId),
    #[error("property type {0:?} does not exist")]
    UnknownPropertyType(PropertyTypeId),
    #[error("tag {0:?} does not exist")]
    UnknownTag(TagId),
}

/// Round half away from zero to `digits` decimal places.
pub fn round_to_precision(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

/// True when `value` rounds to zero at `digits` decimal places.
pub fn float_is_zero(value: f64, digits: i32) -> bool {
    let epsilon = 10f64.powi(-digits);
    round_to_precision(value, digits).abs() < epsilon
}

/// Compare two amounts after rounding their difference to `digits` decimal places.
pub fn float_compare(left: f64, right: f64, digits: i32) -> Ordering {
    let delta = round_to_precision(left - right, digits);
    if float_is_zero(delta, digits) {
        Ordering::Equal
    } else if delta < 0.0 {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

pub fn validate_title(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::MissingTitle);
    }
    Ok(())
}

pub fn validate_reference_name(kind: &'static str, name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::BlankName { kind });
    }
    Ok(())
}

/// Price constraints checked whenever the expected or selling price is written.
///
/// A selling price of zero means "not sold yet" and is exempt from the 90% floor.
pub fn validate_prices(expected_price: f64, selling_price: f64) -> Result<(), ValidationError> {
    let digits = PRICE_PRECISION_DIGITS;

    if float_compare(expected_price, 0.0, digits) != Ordering::Greater {
        return Err(ValidationError::NonPositiveExpectedPrice {
            found: expected_price,
        });
    }

    if float_compare(selling_price, 0.0, digits) == Ordering::Less {
        return Err(ValidationError::NegativeSellingPrice {
            found: selling_price,
        });
    }

    if float_is_zero(selling_price, digits) {
        return Ok(());
    }

    let minimum = expected_price * MINIMUM_SELLING_RATIO;
    if float_compare(selling_price, minimum, digits) == Ordering::Less {
        return Err(ValidationError::SellingPriceTooLow {
            selling: selling_price,
            minimum: round_to_precision(minimum, digits),
        });
    }

    Ok(())
}
