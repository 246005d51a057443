//! Journal statistics computed from closed trades.

use std::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::journal::pnl::{self, PnlInputs};
use crate::models::Trade;

/// Aggregate performance figures over the journal.
#[derive(Debug, Clone, Default)]
pub struct JournalStats {
    pub total_trades: usize,
    pub open_trades: usize,
    pub closed_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub total_net_pnl: Decimal,
    pub avg_win: Decimal,
    pub avg_loss: Decimal,
    pub profit_factor: f64,
    pub expectancy: Decimal,
    pub avg_r_multiple: Decimal,
    pub max_drawdown: Decimal,
    pub max_drawdown_pct: f64,
    pub avg_holding_minutes: i64,
}

impl JournalStats {
    /// Compute stats from a trade list in entry order. Open trades only
    /// contribute to the counts; every P&L figure comes from closed trades,
    /// preferring the backend's stored results over the local preview.
    pub fn calculate(trades: &[Trade]) -> Self {
        let mut stats = Self {
            total_trades: trades.len(),
            open_trades: trades.iter().filter(|t| t.is_open()).count(),
            ..Self::default()
        };
        stats.closed_trades = stats.total_trades - stats.open_trades;

        let mut pnls = Vec::with_capacity(stats.closed_trades);
        let mut r_multiples = Vec::new();
        let mut holding = Vec::new();

        for trade in trades.iter().filter(|t| !t.is_open()) {
            let (net_pnl, r) = match &trade.results {
                Some(results) => (results.net_pnl, Some(results.r_multiple)),
                None => match Self::preview_pnl(trade) {
                    Some(breakdown) => (breakdown.net_pnl, Some(breakdown.r_multiple)),
                    None => continue,
                },
            };

            pnls.push(net_pnl);
            if let Some(r) = r {
                r_multiples.push(r);
            }
            if let Some(minutes) = trade.holding_minutes() {
                holding.push(minutes);
            }
        }

        if pnls.is_empty() {
            return stats;
        }

        let (wins, losses): (Vec<Decimal>, Vec<Decimal>) =
            pnls.iter().copied().partition(|p| *p > Decimal::ZERO);

        stats.winning_trades = wins.len();
        stats.losing_trades = losses.len();
        stats.total_net_pnl = pnls.iter().copied().sum();
        stats.win_rate = wins.len() as f64 / pnls.len() as f64;

        if !wins.is_empty() {
            stats.avg_win = wins.iter().copied().sum::<Decimal>() / Decimal::from(wins.len() as u32);
        }
        if !losses.is_empty() {
            stats.avg_loss =
                losses.iter().map(|l| l.abs()).sum::<Decimal>() / Decimal::from(losses.len() as u32);
        }

        let gross_profit: Decimal = wins.iter().copied().sum();
        let gross_loss: Decimal = losses.iter().map(|l| l.abs()).sum();
        if gross_loss > Decimal::ZERO {
            stats.profit_factor =
                gross_profit.to_f64().unwrap_or(0.0) / gross_loss.to_f64().unwrap_or(1.0);
        }

        stats.expectancy = stats.total_net_pnl / Decimal::from(pnls.len() as u32);

        if !r_multiples.is_empty() {
            stats.avg_r_multiple = r_multiples.iter().copied().sum::<Decimal>()
                / Decimal::from(r_multiples.len() as u32);
        }

        if !holding.is_empty() {
            stats.avg_holding_minutes = holding.iter().sum::<i64>() / holding.len() as i64;
        }

        Self::calculate_drawdown(&mut stats, &pnls);

        stats
    }

    fn preview_pnl(trade: &Trade) -> Option<pnl::PnlBreakdown> {
        let exit = trade.exit.as_ref()?;
        pnl::compute(&PnlInputs {
            instrument: trade.instrument,
            entry_price: trade.entry_price,
            exit_price: exit.exit_price,
            position_size: trade.position_size,
            commission: trade.commission,
            risk_amount: trade.risk_amount,
        })
    }

    /// Walk the cumulative P&L curve and record the worst peak-to-trough
    /// drop, in currency and as a fraction of the peak.
    fn calculate_drawdown(stats: &mut JournalStats, pnls: &[Decimal]) {
        let mut equity = Decimal::ZERO;
        let mut peak = Decimal::ZERO;
        let mut max_dd = Decimal::ZERO;
        let mut max_dd_pct = 0.0f64;

        for pnl in pnls {
            equity += pnl;

            if equity > peak {
                peak = equity;
            }

            if peak > Decimal::ZERO {
                let dd = peak - equity;
                if dd > max_dd {
                    max_dd = dd;
                }

                let dd_pct = dd.to_f64().unwrap_or(0.0) / peak.to_f64().unwrap_or(1.0);
                if dd_pct > max_dd_pct {
                    max_dd_pct = dd_pct;
                }
            }
        }

        stats.max_drawdown = max_dd;
        stats.max_drawdown_pct = max_dd_pct;
    }
}

impl fmt::Display for JournalStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Journal Statistics ===")?;
        writeln!(f, "Total Trades:   {}", self.total_trades)?;
        writeln!(f, "Open:           {}", self.open_trades)?;
        writeln!(f, "Closed:         {}", self.closed_trades)?;
        writeln!(f)?;
        writeln!(f, "Win Rate:       {:.1}%", self.win_rate * 100.0)?;
        writeln!(f, "Winners:        {}", self.winning_trades)?;
        writeln!(f, "Losers:         {}", self.losing_trades)?;
        writeln!(f, "Net P&L:        ${:.2}", self.total_net_pnl)?;
        writeln!(f, "Avg Win:        ${:.2}", self.avg_win)?;
        writeln!(f, "Avg Loss:       ${:.2}", self.avg_loss)?;
        writeln!(f, "Profit Factor:  {:.2}", self.profit_factor)?;
        writeln!(f, "Expectancy:     ${:.2}", self.expectancy)?;
        writeln!(f, "Avg R-Multiple: {:.2}", self.avg_r_multiple)?;
        writeln!(f, "Max Drawdown:   ${:.2} ({:.1}%)", self.max_drawdown, self.max_drawdown_pct * 100.0)?;
        write!(f, "Avg Hold:       {} min", self.avg_holding_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Direction, ExitDetails, ExitReason, Instrument, Market, Trade, TradeResults,
    };
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;

    fn closed_trade(net_pnl: Decimal, r_multiple: Decimal) -> Trade {
        let entry_time = Utc::now() - Duration::hours(3);
        Trade {
            id: "t".to_string(),
            symbol: "SPY".to_string(),
            instrument: Instrument::Linear {
                market: Market::Stocks,
                direction: Direction::Long,
            },
            setup: String::new(),
            entry_price: dec!(100),
            entry_time,
            position_size: dec!(10),
            stop_loss: None,
            take_profit: None,
            risk_amount: None,
            risk_percentage: None,
            confidence: None,
            commission: Decimal::ZERO,
            emotion_before: String::new(),
            pre_trade_analysis: String::new(),
            tags: vec![],
            exit: Some(ExitDetails {
                exit_price: dec!(110),
                exit_time: entry_time + Duration::hours(2),
                reason: ExitReason::ManualExit,
                notes: String::new(),
                emotional_state: String::new(),
                lessons_learned: String::new(),
                would_repeat: true,
                underlying_price_at_exit: None,
            }),
            results: Some(TradeResults {
                net_pnl,
                pnl_percentage: Decimal::ZERO,
                r_multiple,
                holding_minutes: 120,
            }),
        }
    }

    #[test]
    fn test_win_loss_partition() {
        let trades = vec![
            closed_trade(dec!(100), dec!(2)),
            closed_trade(dec!(-50), dec!(-1)),
            closed_trade(dec!(200), dec!(4)),
            closed_trade(dec!(-30), dec!(-0.6)),
            closed_trade(dec!(150), dec!(3)),
        ];

        let stats = JournalStats::calculate(&trades);

        assert_eq!(stats.winning_trades, 3);
        assert_eq!(stats.losing_trades, 2);
        assert_eq!(stats.total_net_pnl, dec!(370));
        assert!((stats.win_rate - 0.6).abs() < 0.001);
        assert_eq!(stats.avg_win, dec!(150));
        assert_eq!(stats.avg_loss, dec!(40));
        assert_eq!(stats.expectancy, dec!(74));
    }

    #[test]
    fn test_drawdown_over_pnl_curve() {
        let trades = vec![
            closed_trade(dec!(100), dec!(1)),  // Equity: 100, Peak: 100
            closed_trade(dec!(50), dec!(1)),   // Equity: 150, Peak: 150
            closed_trade(dec!(-80), dec!(-1)), // Equity: 70,  DD: 80
            closed_trade(dec!(-20), dec!(-1)), // Equity: 50,  DD: 100
            closed_trade(dec!(100), dec!(1)),  // Equity: 150
            closed_trade(dec!(50), dec!(1)),   // Equity: 200, Peak: 200
        ];

        let stats = JournalStats::calculate(&trades);

        assert_eq!(stats.max_drawdown, dec!(100));
        assert!(stats.max_drawdown_pct > 0.65 && stats.max_drawdown_pct < 0.68);
    }

    #[test]
    fn test_open_trades_only_counted() {
        let mut open = closed_trade(Decimal::ZERO, Decimal::ZERO);
        open.exit = None;
        open.results = None;

        let trades = vec![open, closed_trade(dec!(100), dec!(2))];
        let stats = JournalStats::calculate(&trades);

        assert_eq!(stats.total_trades, 2);
        assert_eq!(stats.open_trades, 1);
        assert_eq!(stats.closed_trades, 1);
        assert_eq!(stats.total_net_pnl, dec!(100));
    }

    #[test]
    fn test_falls_back_to_preview_without_results() {
        let mut trade = closed_trade(Decimal::ZERO, Decimal::ZERO);
        trade.results = None;
        trade.risk_amount = Some(dec!(50));

        // 10 shares from 100 to 110 = $100 net, 2R against $50 risked
        let stats = JournalStats::calculate(&[trade]);
        assert_eq!(stats.total_net_pnl, dec!(100));
        assert_eq!(stats.avg_r_multiple, dec!(2));
    }

    #[test]
    fn test_empty_journal() {
        let stats = JournalStats::calculate(&[]);
        assert_eq!(stats.total_trades, 0);
        assert_eq!(stats.total_net_pnl, Decimal::ZERO);
        assert_eq!(stats.win_rate, 0.0);
    }
}
