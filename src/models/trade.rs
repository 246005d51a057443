//! Trade model for the journal: one position from entry to (optional) exit.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Market classification of an instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    Stocks,
    Options,
    Futures,
    Forex,
    Crypto,
}

impl Market {
    pub fn as_str(&self) -> &'static str {
        match self {
            Market::Stocks => "stocks",
            Market::Options => "options",
            Market::Futures => "futures",
            Market::Forex => "forex",
            Market::Crypto => "crypto",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "stocks" | "stock" | "equity" => Some(Market::Stocks),
            "options" | "option" => Some(Market::Options),
            "futures" => Some(Market::Futures),
            "forex" | "fx" => Some(Market::Forex),
            "crypto" => Some(Market::Crypto),
            _ => None,
        }
    }
}

/// Direction of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "long",
            Direction::Short => "short",
        }
    }
}

/// Option contract type. Determines the stored direction (call is long
/// exposure, put is short exposure); the premium P&L formula itself is
/// direction-independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    pub fn implied_direction(&self) -> Direction {
        match self {
            OptionType::Call => Direction::Long,
            OptionType::Put => Direction::Short,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OptionType::Call => "call",
            OptionType::Put => "put",
        }
    }
}

/// What the trade actually holds. Linear instruments carry an explicit
/// direction; option positions derive theirs from the contract type, so an
/// option with a contradictory direction is unrepresentable.
///
/// Only long-premium option positions are modeled: premium is paid at entry
/// and received at exit. Sold (short) options would need the sign inverted
/// and are not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Instrument {
    Linear {
        market: Market,
        direction: Direction,
    },
    Option {
        option_type: OptionType,
    },
}

impl Instrument {
    /// Standard 100-shares-per-contract convention for equity options.
    pub fn contract_multiplier(&self) -> Decimal {
        match self {
            Instrument::Option { .. } => Decimal::from(100),
            Instrument::Linear { .. } => Decimal::ONE,
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            Instrument::Linear { direction, .. } => *direction,
            Instrument::Option { option_type } => option_type.implied_direction(),
        }
    }

    pub fn market(&self) -> Market {
        match self {
            Instrument::Linear { market, .. } => *market,
            Instrument::Option { .. } => Market::Options,
        }
    }

    pub fn is_option(&self) -> bool {
        matches!(self, Instrument::Option { .. })
    }
}

/// Why a trade was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    ManualExit,
    HitTakeProfit,
    HitStopLoss,
    TimeStop,
    ReversalSignal,
    Other,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::ManualExit => "manual_exit",
            ExitReason::HitTakeProfit => "hit_take_profit",
            ExitReason::HitStopLoss => "hit_stop_loss",
            ExitReason::TimeStop => "time_stop",
            ExitReason::ReversalSignal => "reversal_signal",
            ExitReason::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "manual_exit" | "manual" => Some(ExitReason::ManualExit),
            "hit_take_profit" | "take_profit" => Some(ExitReason::HitTakeProfit),
            "hit_stop_loss" | "stop_loss" => Some(ExitReason::HitStopLoss),
            "time_stop" => Some(ExitReason::TimeStop),
            "reversal_signal" | "reversal" => Some(ExitReason::ReversalSignal),
            "other" => Some(ExitReason::Other),
            _ => None,
        }
    }
}

/// Exit-side attributes, present only once a trade is closed. Once set they
/// are immutable inputs to the stored results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitDetails {
    /// Exit price per share, or exit premium per share for options
    pub exit_price: Decimal,

    /// When the position was closed
    pub exit_time: DateTime<Utc>,

    pub reason: ExitReason,

    #[serde(default)]
    pub notes: String,

    #[serde(default)]
    pub emotional_state: String,

    #[serde(default)]
    pub lessons_learned: String,

    /// Mandatory reflection answer: would the trader take this trade again
    pub would_repeat: bool,

    /// Underlying price at exit, informational only (options)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underlying_price_at_exit: Option<Decimal>,
}

/// Derived results persisted by the backend once a trade closes. The local
/// calculator produces the same figures as a preview; these are the values
/// of record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TradeResults {
    pub net_pnl: Decimal,
    pub pnl_percentage: Decimal,
    pub r_multiple: Decimal,
    /// Holding time in minutes
    pub holding_minutes: i64,
}

/// One journaled position, open or closed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    /// Backend-assigned identifier
    pub id: String,

    pub symbol: String,

    pub instrument: Instrument,

    /// Setup / strategy name the trade was taken on
    #[serde(default)]
    pub setup: String,

    /// Entry price per share (premium per share for options)
    pub entry_price: Decimal,

    pub entry_time: DateTime<Utc>,

    /// Units held: shares, or number of contracts for options
    pub position_size: Decimal,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take_profit: Option<Decimal>,

    /// Currency amount at risk on the trade
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_amount: Option<Decimal>,

    /// Risk as a percentage of account size
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_percentage: Option<Decimal>,

    /// Pre-trade conviction, 1-10
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<u8>,

    #[serde(default)]
    pub commission: Decimal,

    #[serde(default)]
    pub emotion_before: String,

    #[serde(default)]
    pub pre_trade_analysis: String,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit: Option<ExitDetails>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<TradeResults>,
}

impl Trade {
    /// A trade is open until exit price and time are set.
    pub fn is_open(&self) -> bool {
        self.exit.is_none()
    }

    pub fn status_str(&self) -> &'static str {
        if self.is_open() {
            "open"
        } else {
            "closed"
        }
    }

    /// Holding time in minutes for closed trades.
    pub fn holding_minutes(&self) -> Option<i64> {
        self.exit
            .as_ref()
            .map(|e| (e.exit_time - self.entry_time).num_minutes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn sample_trade(instrument: Instrument) -> Trade {
        Trade {
            id: "t1".to_string(),
            symbol: "AAPL".to_string(),
            instrument,
            setup: "breakout".to_string(),
            entry_price: dec!(100),
            entry_time: Utc::now(),
            position_size: dec!(10),
            stop_loss: Some(dec!(95)),
            take_profit: Some(dec!(115)),
            risk_amount: Some(dec!(50)),
            risk_percentage: None,
            confidence: Some(7),
            commission: Decimal::ZERO,
            emotion_before: String::new(),
            pre_trade_analysis: String::new(),
            tags: vec![],
            exit: None,
            results: None,
        }
    }

    #[test]
    fn test_option_direction_implied_by_type() {
        let call = Instrument::Option {
            option_type: OptionType::Call,
        };
        let put = Instrument::Option {
            option_type: OptionType::Put,
        };

        assert_eq!(call.direction(), Direction::Long);
        assert_eq!(put.direction(), Direction::Short);
        assert_eq!(call.contract_multiplier(), dec!(100));
        assert_eq!(call.market(), Market::Options);
    }

    #[test]
    fn test_linear_multiplier_is_one() {
        let stock = Instrument::Linear {
            market: Market::Stocks,
            direction: Direction::Long,
        };
        assert_eq!(stock.contract_multiplier(), Decimal::ONE);
        assert!(!stock.is_option());
    }

    #[test]
    fn test_open_until_exit_set() {
        let mut trade = sample_trade(Instrument::Linear {
            market: Market::Stocks,
            direction: Direction::Long,
        });
        assert!(trade.is_open());
        assert_eq!(trade.holding_minutes(), None);

        trade.exit = Some(ExitDetails {
            exit_price: dec!(110),
            exit_time: trade.entry_time + Duration::minutes(90),
            reason: ExitReason::HitTakeProfit,
            notes: String::new(),
            emotional_state: String::new(),
            lessons_learned: String::new(),
            would_repeat: true,
            underlying_price_at_exit: None,
        });

        assert!(!trade.is_open());
        assert_eq!(trade.holding_minutes(), Some(90));
    }

    #[test]
    fn test_exit_reason_parse() {
        assert_eq!(ExitReason::parse("take-profit"), Some(ExitReason::HitTakeProfit));
        assert_eq!(ExitReason::parse("manual"), Some(ExitReason::ManualExit));
        assert_eq!(ExitReason::parse("unknown"), None);
    }
}
