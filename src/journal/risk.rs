//! Risk sizing: derive the currency amount at risk from the entry setup.

use rust_decimal::Decimal;

use crate::models::Instrument;

/// Derive the suggested risk amount for a position.
///
/// Linear instruments risk the stop distance: `|entry - stop| * size`.
/// Options risk the full premium paid (`premium * 100 * contracts`),
/// since a long option's maximum loss is the premium; the stop-distance
/// model does not apply and `stop_loss` is ignored.
///
/// Returns `None` while any required input is missing or non-positive, so
/// the caller leaves the field blank instead of showing zero. Any edit to
/// entry, stop, or size re-runs this derivation; the dependency is not
/// one-way.
pub fn risk_amount(
    instrument: Instrument,
    entry_price: Option<Decimal>,
    stop_loss: Option<Decimal>,
    position_size: Option<Decimal>,
) -> Option<Decimal> {
    let entry = entry_price.filter(|p| *p > Decimal::ZERO)?;
    let size = position_size.filter(|s| *s > Decimal::ZERO)?;

    match instrument {
        Instrument::Option { .. } => Some(entry * instrument.contract_multiplier() * size),
        Instrument::Linear { .. } => {
            let stop = stop_loss.filter(|s| *s > Decimal::ZERO)?;
            Some((entry - stop).abs() * size)
        }
    }
}

/// Risk as a percentage of account size, when both are known and positive.
pub fn risk_percentage(risk_amount: Decimal, account_size: Option<Decimal>) -> Option<Decimal> {
    let account = account_size.filter(|a| *a > Decimal::ZERO)?;
    Some((risk_amount / account * Decimal::from(100)).round_dp(2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Direction, Market, OptionType};
    use rust_decimal_macros::dec;

    fn stock() -> Instrument {
        Instrument::Linear {
            market: Market::Stocks,
            direction: Direction::Long,
        }
    }

    fn call() -> Instrument {
        Instrument::Option {
            option_type: OptionType::Call,
        }
    }

    #[test]
    fn test_stop_distance_risk() {
        let risk = risk_amount(stock(), Some(dec!(100)), Some(dec!(95)), Some(dec!(10)));
        assert_eq!(risk, Some(dec!(50)));
    }

    #[test]
    fn test_recompute_on_any_field_change() {
        // Doubling the size doubles the risk; widening the stop widens it.
        assert_eq!(
            risk_amount(stock(), Some(dec!(100)), Some(dec!(95)), Some(dec!(20))),
            Some(dec!(100))
        );
        assert_eq!(
            risk_amount(stock(), Some(dec!(100)), Some(dec!(90)), Some(dec!(10))),
            Some(dec!(100))
        );
        assert_eq!(
            risk_amount(stock(), Some(dec!(105)), Some(dec!(95)), Some(dec!(10))),
            Some(dec!(100))
        );
    }

    #[test]
    fn test_stop_above_entry_uses_absolute_distance() {
        // Short setups place the stop above the entry.
        let risk = risk_amount(stock(), Some(dec!(100)), Some(dec!(104)), Some(dec!(25)));
        assert_eq!(risk, Some(dec!(100)));
    }

    #[test]
    fn test_option_risk_is_full_premium() {
        // $3.50 premium, 2 contracts: 3.50 * 100 * 2 = $700, stop ignored.
        let risk = risk_amount(call(), Some(dec!(3.50)), None, Some(dec!(2)));
        assert_eq!(risk, Some(dec!(700.00)));

        let with_stop = risk_amount(call(), Some(dec!(3.50)), Some(dec!(2.00)), Some(dec!(2)));
        assert_eq!(with_stop, Some(dec!(700.00)));
    }

    #[test]
    fn test_missing_inputs_yield_none() {
        assert_eq!(risk_amount(stock(), None, Some(dec!(95)), Some(dec!(10))), None);
        assert_eq!(risk_amount(stock(), Some(dec!(100)), None, Some(dec!(10))), None);
        assert_eq!(risk_amount(stock(), Some(dec!(100)), Some(dec!(95)), None), None);
        assert_eq!(
            risk_amount(stock(), Some(Decimal::ZERO), Some(dec!(95)), Some(dec!(10))),
            None
        );
    }

    #[test]
    fn test_risk_percentage() {
        assert_eq!(risk_percentage(dec!(50), Some(dec!(10000))), Some(dec!(0.50)));
        assert_eq!(risk_percentage(dec!(50), None), None);
        assert_eq!(risk_percentage(dec!(50), Some(Decimal::ZERO)), None);
    }
}
