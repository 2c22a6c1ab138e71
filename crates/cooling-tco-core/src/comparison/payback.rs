use rust_decimal::Decimal;

use crate::arithmetic::add;
use crate::types::{Money, Years};
use crate::TcoResult;

/// Running total where `cumulative[0] = savings[0]`.
pub fn cumulative_savings(savings: &[Money]) -> TcoResult<Vec<Money>> {
    let mut running = Decimal::ZERO;
    savings
        .iter()
        .map(|s| {
            running = add(running, *s, "cumulative savings")?;
            Ok(running)
        })
        .collect()
}

/// First whole year whose cumulative savings are non-negative.
pub fn breakeven_year(cumulative: &[Money]) -> Option<u32> {
    cumulative
        .iter()
        .position(|c| *c >= Decimal::ZERO)
        .map(|i| i as u32)
}

/// Fractional payback period in years, or `None` if cumulative savings stay
/// negative through the last year of the series.
///
/// Within the crossing year the cumulative value is interpolated linearly:
/// `(i - 1) + (-cumulative[i-1]) / savings[i]`. No extrapolation past the
/// horizon.
pub fn payback_period(savings: &[Money], cumulative: &[Money]) -> Option<Years> {
    let year = breakeven_year(cumulative)? as usize;
    if year == 0 {
        return Some(Decimal::ZERO);
    }

    let shortfall = -cumulative[year - 1];
    let recovered = savings[year];
    // Crossing from negative to non-negative implies savings[year] > 0.
    if recovered <= Decimal::ZERO {
        return Some(Decimal::from(year as u32));
    }
    Some(Decimal::from(year as u32 - 1) + shortfall / recovered)
}
