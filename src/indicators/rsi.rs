//! Relative Strength Index (RSI).
//!
//! Simple-moving-average variant over the trailing `window` differences:
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Needs `window + 1` prices.
//! Edge cases: avg_loss == 0 → 100; avg_gain == avg_loss == 0 → 50.

use rust_decimal::Decimal;

use super::IndicatorError;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;
const NEUTRAL: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

/// Computes the RSI at the most recent position of `prices`.
///
/// # Errors
///
/// Returns [`IndicatorError::InvalidWindow`] for a zero window and
/// [`IndicatorError::InsufficientData`] when fewer than `window + 1`
/// prices are supplied.
pub fn rolling_rsi(prices: &[Decimal], window: usize) -> Result<Decimal, IndicatorError> {
    if window == 0 {
        return Err(IndicatorError::InvalidWindow);
    }
    let needed = window + 1;
    if prices.len() < needed {
        return Err(IndicatorError::InsufficientData {
            needed,
            actual: prices.len(),
        });
    }

    let tail = &prices[prices.len() - needed..];
    let (mut gains, mut losses) = (Decimal::ZERO, Decimal::ZERO);
    for pair in tail.windows(2) {
        let change = pair[1] - pair[0];
        if change > Decimal::ZERO {
            gains += change;
        } else {
            losses -= change;
        }
    }

    let n = Decimal::from(window);
    Ok(rsi_from_averages(gains / n, losses / n))
}

fn rsi_from_averages(avg_gain: Decimal, avg_loss: Decimal) -> Decimal {
    if avg_loss.is_zero() {
        return if avg_gain.is_zero() { NEUTRAL } else { HUNDRED };
    }
    if avg_gain.is_zero() {
        return Decimal::ZERO;
    }

    let rsi = avg_gain
        .checked_div(avg_loss)
        .and_then(|rs| HUNDRED.checked_div(Decimal::ONE + rs))
        .map(|x| HUNDRED - x);

    // A ratio too large to represent is indistinguishable from no losses.
    rsi.unwrap_or(HUNDRED).clamp(Decimal::ZERO, HUNDRED)
}
