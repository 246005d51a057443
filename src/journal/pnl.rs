//! P&L calculator: preview figures for a trade at a given exit price.
//!
//! The backend recomputes and persists the final results on close; these
//! functions exist so the journal can show an estimate before and during
//! the close flow.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{Direction, Instrument};

/// Inputs to one P&L computation. Prices are per share; for options the
/// entry/exit values are premiums per share and `position_size` is the
/// number of contracts.
#[derive(Debug, Clone, Copy)]
pub struct PnlInputs {
    pub instrument: Instrument,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub position_size: Decimal,
    pub commission: Decimal,
    /// Currency amount risked; R-multiple is only derived when positive
    pub risk_amount: Option<Decimal>,
}

/// Computed P&L breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PnlBreakdown {
    pub price_diff: Decimal,
    pub gross_pnl: Decimal,
    pub net_pnl: Decimal,
    pub r_multiple: Decimal,
    pub percentage: Decimal,
    pub is_winner: bool,
}

/// Compute the P&L breakdown for a trade.
///
/// Returns `None` when entry price, exit price, or position size is zero or
/// negative so callers suppress display instead of showing a misleading
/// $0.00.
///
/// Options use `exit - entry` regardless of call/put: profit on a long
/// premium position is premium received minus premium paid, independent of
/// direction.
pub fn compute(inputs: &PnlInputs) -> Option<PnlBreakdown> {
    if inputs.entry_price <= Decimal::ZERO
        || inputs.exit_price <= Decimal::ZERO
        || inputs.position_size <= Decimal::ZERO
    {
        return None;
    }

    let price_diff = match inputs.instrument {
        Instrument::Option { .. } => inputs.exit_price - inputs.entry_price,
        Instrument::Linear { direction, .. } => match direction {
            Direction::Long => inputs.exit_price - inputs.entry_price,
            Direction::Short => inputs.entry_price - inputs.exit_price,
        },
    };

    let gross_pnl = price_diff * inputs.position_size * inputs.instrument.contract_multiplier();
    let net_pnl = gross_pnl - inputs.commission;

    let r_multiple = match inputs.risk_amount {
        Some(risk) if risk > Decimal::ZERO => net_pnl / risk,
        _ => Decimal::ZERO,
    };

    // entry_price > 0 already guaranteed above
    let percentage = price_diff / inputs.entry_price * Decimal::from(100);

    Some(PnlBreakdown {
        price_diff,
        gross_pnl,
        net_pnl,
        r_multiple,
        percentage,
        is_winner: net_pnl > Decimal::ZERO,
    })
}
