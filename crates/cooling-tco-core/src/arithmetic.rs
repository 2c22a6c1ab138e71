//! Checked decimal operations that report overflow as `TcoError::Calculation`.
//!
//! `Decimal`'s operator impls panic on overflow. Every amount that depends on
//! caller-supplied magnitudes goes through these helpers instead.

use rust_decimal::Decimal;

use crate::error::TcoError;
use crate::TcoResult;

pub(crate) fn mul(a: Decimal, b: Decimal, operation: &str) -> TcoResult<Decimal> {
    a.checked_mul(b)
        .ok_or_else(|| overflow(operation, format!("{a} x {b}")))
}

pub(crate) fn add(a: Decimal, b: Decimal, operation: &str) -> TcoResult<Decimal> {
    a.checked_add(b)
        .ok_or_else(|| overflow(operation, format!("{a} + {b}")))
}

pub(crate) fn sub(a: Decimal, b: Decimal, operation: &str) -> TcoResult<Decimal> {
    a.checked_sub(b)
        .ok_or_else(|| overflow(operation, format!("{a} - {b}")))
}

/// Division; a zero divisor is reported the same way as overflow.
pub(crate) fn div(a: Decimal, b: Decimal, operation: &str) -> TcoResult<Decimal> {
    a.checked_div(b)
        .ok_or_else(|| overflow(operation, format!("{a} / {b}")))
}

pub(crate) fn sum<'a, I>(values: I, operation: &str) -> TcoResult<Decimal>
where
    I: IntoIterator<Item = &'a Decimal>,
{
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| add(acc, *v, operation))
}

fn overflow(operation: &str, expression: String) -> TcoError {
    TcoError::calculation(operation, format!("{expression} is outside the decimal range"))
}
