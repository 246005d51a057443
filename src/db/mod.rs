//! Local SQLite cache of trades and registrations.
//!
//! The backend owns the data; this cache exists so `list`, `show`, and
//! `stats` work from the last fetch. Rows are upserted whenever the API
//! returns fresh records. Money columns are TEXT-encoded decimals so the
//! cache never reintroduces float rounding.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

use crate::models::{
    Direction, ExitDetails, ExitReason, Instrument, Market, OptionType, PaymentMode, Registration,
    Trade, TradeResults,
};

/// Database connection pool for the journal cache.
pub struct Database {
    pool: SqlitePool,
}

/// Trade row as stored. Nullable exit/result columns cover open trades.
#[derive(Debug, Clone, sqlx::FromRow)]
struct StoredTrade {
    pub id: String,
    pub symbol: String,
    pub market: String,
    pub direction: String,
    pub option_type: Option<String>,
    pub setup: String,
    pub entry_price: String,
    pub entry_time: String,
    pub position_size: String,
    pub stop_loss: Option<String>,
    pub take_profit: Option<String>,
    pub risk_amount: Option<String>,
    pub risk_percentage: Option<String>,
    pub confidence: Option<i64>,
    pub commission: String,
    pub emotion_before: String,
    pub pre_trade_analysis: String,
    pub tags: String,
    pub exit_price: Option<String>,
    pub exit_time: Option<String>,
    pub exit_reason: Option<String>,
    pub exit_notes: Option<String>,
    pub exit_emotion: Option<String>,
    pub lessons_learned: Option<String>,
    pub would_repeat: Option<bool>,
    pub underlying_at_exit: Option<String>,
    pub net_pnl: Option<String>,
    pub pnl_percentage: Option<String>,
    pub r_multiple: Option<String>,
    pub holding_minutes: Option<i64>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct StoredRegistration {
    pub id: String,
    pub event_id: String,
    pub email: String,
    pub attendee_name: String,
    pub payment_mode: String,
    pub total_amount: String,
    pub total_paid: String,
    pub created_at: String,
}

fn parse_decimal(s: &str, what: &str) -> Result<Decimal> {
    s.parse()
        .map_err(|_| anyhow!("Corrupt {} value in cache: {}", what, s))
}

fn parse_opt_decimal(s: &Option<String>, what: &str) -> Result<Option<Decimal>> {
    s.as_deref().map(|v| parse_decimal(v, what)).transpose()
}

fn parse_time(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| anyhow!("Corrupt timestamp in cache: {} ({})", s, e))
}

impl StoredTrade {
    fn into_trade(self) -> Result<Trade> {
        let market = Market::parse(&self.market)
            .ok_or_else(|| anyhow!("Unknown market in cache: {}", self.market))?;

        let instrument = match (market, self.option_type.as_deref()) {
            (Market::Options, Some("put")) => Instrument::Option {
                option_type: OptionType::Put,
            },
            (Market::Options, _) => Instrument::Option {
                option_type: OptionType::Call,
            },
            (market, _) => Instrument::Linear {
                market,
                direction: if self.direction == "short" {
                    Direction::Short
                } else {
                    Direction::Long
                },
            },
        };

        let exit = match (&self.exit_price, &self.exit_time) {
            (Some(price), Some(time)) => Some(ExitDetails {
                exit_price: parse_decimal(price, "exit price")?,
                exit_time: parse_time(time)?,
                reason: self
                    .exit_reason
                    .as_deref()
                    .and_then(ExitReason::parse)
                    .unwrap_or(ExitReason::Other),
                notes: self.exit_notes.clone().unwrap_or_default(),
                emotional_state: self.exit_emotion.clone().unwrap_or_default(),
                lessons_learned: self.lessons_learned.clone().unwrap_or_default(),
                would_repeat: self.would_repeat.unwrap_or(false),
                underlying_price_at_exit: parse_opt_decimal(
                    &self.underlying_at_exit,
                    "underlying price",
                )?,
            }),
            _ => None,
        };

        let results = match (&self.net_pnl, &self.r_multiple) {
            (Some(net), Some(r)) => Some(TradeResults {
                net_pnl: parse_decimal(net, "net P&L")?,
                pnl_percentage: parse_opt_decimal(&self.pnl_percentage, "P&L percentage")?
                    .unwrap_or_default(),
                r_multiple: parse_decimal(r, "R-multiple")?,
                holding_minutes: self.holding_minutes.unwrap_or(0),
            }),
            _ => None,
        };

        Ok(Trade {
            id: self.id,
            symbol: self.symbol,
            instrument,
            setup: self.setup,
            entry_price: parse_decimal(&self.entry_price, "entry price")?,
            entry_time: parse_time(&self.entry_time)?,
            position_size: parse_decimal(&self.position_size, "position size")?,
            stop_loss: parse_opt_decimal(&self.stop_loss, "stop loss")?,
            take_profit: parse_opt_decimal(&self.take_profit, "take profit")?,
            risk_amount: parse_opt_decimal(&self.risk_amount, "risk amount")?,
            risk_percentage: parse_opt_decimal(&self.risk_percentage, "risk percentage")?,
            confidence: self.confidence.map(|c| c as u8),
            commission: parse_decimal(&self.commission, "commission")?,
            emotion_before: self.emotion_before,
            pre_trade_analysis: self.pre_trade_analysis,
            tags: serde_json::from_str(&self.tags).unwrap_or_default(),
            exit,
            results,
        })
    }
}

impl StoredRegistration {
    fn into_registration(self) -> Result<Registration> {
        Ok(Registration {
            payment_mode: if self.payment_mode == "full" {
                PaymentMode::Full
            } else {
                PaymentMode::Partial
            },
            total_amount: parse_decimal(&self.total_amount, "total amount")?,
            total_paid: parse_decimal(&self.total_paid, "total paid")?,
            created_at: parse_time(&self.created_at)?,
            id: self.id,
            event_id: self.event_id,
            email: self.email,
            attendee_name: self.attendee_name,
            payments: vec![],
        })
    }
}

impl Database {
    /// Open (or create) the cache database and run migrations.
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .context("Failed to connect to database")?;

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS trades (
                id TEXT PRIMARY KEY,
                symbol TEXT NOT NULL,
                market TEXT NOT NULL,
                direction TEXT NOT NULL,
                option_type TEXT,
                setup TEXT NOT NULL DEFAULT '',
                entry_price TEXT NOT NULL,
                entry_time TEXT NOT NULL,
                position_size TEXT NOT NULL,
                stop_loss TEXT,
                take_profit TEXT,
                risk_amount TEXT,
                risk_percentage TEXT,
                confidence INTEGER,
                commission TEXT NOT NULL DEFAULT '0',
                emotion_before TEXT NOT NULL DEFAULT '',
                pre_trade_analysis TEXT NOT NULL DEFAULT '',
                tags TEXT NOT NULL DEFAULT '[]',
                exit_price TEXT,
                exit_time TEXT,
                exit_reason TEXT,
                exit_notes TEXT,
                exit_emotion TEXT,
                lessons_learned TEXT,
                would_repeat INTEGER,
                underlying_at_exit TEXT,
                net_pnl TEXT,
                pnl_percentage TEXT,
                r_multiple TEXT,
                holding_minutes INTEGER,
                cached_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS registrations (
                id TEXT PRIMARY KEY,
                event_id TEXT NOT NULL,
                email TEXT NOT NULL,
                attendee_name TEXT NOT NULL DEFAULT '',
                payment_mode TEXT NOT NULL,
                total_amount TEXT NOT NULL,
                total_paid TEXT NOT NULL,
                created_at TEXT NOT NULL,
                cached_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS payment_history (
                id TEXT PRIMARY KEY,
                registration_id TEXT NOT NULL,
                amount TEXT NOT NULL,
                method TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                paid_at TEXT NOT NULL,
                FOREIGN KEY (registration_id) REFERENCES registrations(id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert or replace a trade from the backend.
    pub async fn upsert_trade(&self, trade: &Trade) -> Result<()> {
        let (market, direction, option_type) = match trade.instrument {
            Instrument::Linear { market, direction } => {
                (market.as_str(), direction.as_str(), None)
            }
            Instrument::Option { option_type } => (
                Market::Options.as_str(),
                option_type.implied_direction().as_str(),
                Some(option_type.as_str()),
            ),
        };

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO trades (
                id, symbol, market, direction, option_type, setup,
                entry_price, entry_time, position_size,
                stop_loss, take_profit, risk_amount, risk_percentage,
                confidence, commission, emotion_before, pre_trade_analysis, tags,
                exit_price, exit_time, exit_reason, exit_notes, exit_emotion,
                lessons_learned, would_repeat, underlying_at_exit,
                net_pnl, pnl_percentage, r_multiple, holding_minutes
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&trade.id)
        .bind(&trade.symbol)
        .bind(market)
        .bind(direction)
        .bind(option_type)
        .bind(&trade.setup)
        .bind(trade.entry_price.to_string())
        .bind(trade.entry_time.to_rfc3339())
        .bind(trade.position_size.to_string())
        .bind(trade.stop_loss.map(|d| d.to_string()))
        .bind(trade.take_profit.map(|d| d.to_string()))
        .bind(trade.risk_amount.map(|d| d.to_string()))
        .bind(trade.risk_percentage.map(|d| d.to_string()))
        .bind(trade.confidence.map(|c| c as i64))
        .bind(trade.commission.to_string())
        .bind(&trade.emotion_before)
        .bind(&trade.pre_trade_analysis)
        .bind(serde_json::to_string(&trade.tags).unwrap_or_else(|_| "[]".to_string()))
        .bind(trade.exit.as_ref().map(|e| e.exit_price.to_string()))
        .bind(trade.exit.as_ref().map(|e| e.exit_time.to_rfc3339()))
        .bind(trade.exit.as_ref().map(|e| e.reason.as_str()))
        .bind(trade.exit.as_ref().map(|e| e.notes.clone()))
        .bind(trade.exit.as_ref().map(|e| e.emotional_state.clone()))
        .bind(trade.exit.as_ref().map(|e| e.lessons_learned.clone()))
        .bind(trade.exit.as_ref().map(|e| e.would_repeat))
        .bind(
            trade
                .exit
                .as_ref()
                .and_then(|e| e.underlying_price_at_exit.map(|d| d.to_string())),
        )
        .bind(trade.results.as_ref().map(|r| r.net_pnl.to_string()))
        .bind(trade.results.as_ref().map(|r| r.pnl_percentage.to_string()))
        .bind(trade.results.as_ref().map(|r| r.r_multiple.to_string()))
        .bind(trade.results.as_ref().map(|r| r.holding_minutes))
        .execute(&self.pool)
        .await
        .context("Failed to cache trade")?;

        Ok(())
    }

    pub async fn get_trade(&self, id: &str) -> Result<Option<Trade>> {
        let row: Option<StoredTrade> = sqlx::query_as("SELECT * FROM trades WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to read trade from cache")?;

        row.map(StoredTrade::into_trade).transpose()
    }

    /// All cached trades in entry order (oldest first), which is the order
    /// the stats drawdown walk expects.
    pub async fn list_trades(&self) -> Result<Vec<Trade>> {
        let rows: Vec<StoredTrade> = sqlx::query_as("SELECT * FROM trades ORDER BY entry_time ASC")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list trades from cache")?;

        rows.into_iter().map(StoredTrade::into_trade).collect()
    }

    pub async fn delete_trade(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM trades WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete trade from cache")?;
        Ok(())
    }

    pub async fn upsert_registration(&self, registration: &Registration) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO registrations (
                id, event_id, email, attendee_name, payment_mode,
                total_amount, total_paid, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&registration.id)
        .bind(&registration.event_id)
        .bind(&registration.email)
        .bind(&registration.attendee_name)
        .bind(registration.payment_mode.as_str())
        .bind(registration.total_amount.to_string())
        .bind(registration.total_paid.to_string())
        .bind(registration.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to cache registration")?;

        for payment in &registration.payments {
            sqlx::query(
                r#"
                INSERT OR REPLACE INTO payment_history (
                    id, registration_id, amount, method, description, paid_at
                ) VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&payment.id)
            .bind(&registration.id)
            .bind(payment.amount.to_string())
            .bind(&payment.method)
            .bind(&payment.description)
            .bind(payment.paid_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .context("Failed to cache payment record")?;
        }

        Ok(())
    }

    pub async fn get_registration(&self, id: &str) -> Result<Option<Registration>> {
        let row: Option<StoredRegistration> =
            sqlx::query_as("SELECT * FROM registrations WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .context("Failed to read registration from cache")?;

        row.map(StoredRegistration::into_registration).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExitDetails;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    async fn test_db() -> Database {
        Database::new("sqlite::memory:")
            .await
            .expect("in-memory database")
    }

    fn sample_trade(id: &str) -> Trade {
        Trade {
            id: id.to_string(),
            symbol: "TSLA".to_string(),
            instrument: Instrument::Linear {
                market: Market::Stocks,
                direction: Direction::Long,
            },
            setup: "gap fill".to_string(),
            entry_price: dec!(250.50),
            entry_time: Utc::now(),
            position_size: dec!(20),
            stop_loss: Some(dec!(245)),
            take_profit: None,
            risk_amount: Some(dec!(110)),
            risk_percentage: Some(dec!(1.1)),
            confidence: Some(8),
            commission: dec!(1.25),
            emotion_before: "focused".to_string(),
            pre_trade_analysis: String::new(),
            tags: vec!["momentum".to_string()],
            exit: None,
            results: None,
        }
    }

    #[tokio::test]
    async fn test_trade_round_trip() {
        let db = test_db().await;
        let trade = sample_trade("t1");

        db.upsert_trade(&trade).await.expect("upsert");
        let cached = db.get_trade("t1").await.expect("get").expect("present");

        assert_eq!(cached.symbol, "TSLA");
        assert_eq!(cached.entry_price, dec!(250.50));
        assert_eq!(cached.risk_amount, Some(dec!(110)));
        assert_eq!(cached.tags, vec!["momentum".to_string()]);
        assert!(cached.is_open());
    }

    #[tokio::test]
    async fn test_closed_trade_round_trip() {
        let db = test_db().await;
        let mut trade = sample_trade("t2");
        trade.exit = Some(ExitDetails {
            exit_price: dec!(260),
            exit_time: trade.entry_time + Duration::hours(1),
            reason: ExitReason::HitTakeProfit,
            notes: "clean move".to_string(),
            emotional_state: "calm".to_string(),
            lessons_learned: String::new(),
            would_repeat: true,
            underlying_price_at_exit: None,
        });
        trade.results = Some(TradeResults {
            net_pnl: dec!(188.75),
            pnl_percentage: dec!(3.79),
            r_multiple: dec!(1.72),
            holding_minutes: 60,
        });

        db.upsert_trade(&trade).await.expect("upsert");
        let cached = db.get_trade("t2").await.expect("get").expect("present");

        assert!(!cached.is_open());
        let exit = cached.exit.expect("exit details");
        assert_eq!(exit.exit_price, dec!(260));
        assert_eq!(exit.reason, ExitReason::HitTakeProfit);
        assert!(exit.would_repeat);

        let results = cached.results.expect("results");
        assert_eq!(results.net_pnl, dec!(188.75));
        assert_eq!(results.holding_minutes, 60);
    }

    #[tokio::test]
    async fn test_option_trade_round_trip() {
        let db = test_db().await;
        let mut trade = sample_trade("t3");
        trade.instrument = Instrument::Option {
            option_type: OptionType::Put,
        };

        db.upsert_trade(&trade).await.expect("upsert");
        let cached = db.get_trade("t3").await.expect("get").expect("present");

        assert_eq!(
            cached.instrument,
            Instrument::Option {
                option_type: OptionType::Put
            }
        );
        assert_eq!(cached.instrument.direction(), Direction::Short);
    }

    #[tokio::test]
    async fn test_delete_trade() {
        let db = test_db().await;
        db.upsert_trade(&sample_trade("t4")).await.expect("upsert");

        db.delete_trade("t4").await.expect("delete");
        assert!(db.get_trade("t4").await.expect("get").is_none());
    }

    #[tokio::test]
    async fn test_registration_round_trip() {
        let db = test_db().await;
        let registration = Registration {
            id: "r1".to_string(),
            event_id: "evt1".to_string(),
            email: "student@example.com".to_string(),
            attendee_name: "Sam".to_string(),
            payment_mode: PaymentMode::Partial,
            total_amount: dec!(1200),
            total_paid: dec!(450),
            payments: vec![],
            created_at: Utc::now(),
        };

        db.upsert_registration(&registration).await.expect("upsert");
        let cached = db
            .get_registration("r1")
            .await
            .expect("get")
            .expect("present");

        assert_eq!(cached.total_amount, dec!(1200));
        assert_eq!(cached.remaining_balance(), dec!(750));
    }
}
