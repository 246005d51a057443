//! Trading journal CLI for the trading-education platform.
//!
//! Journals trades against the platform backend (which stores the records
//! and computes the persisted results), previews P&L and risk locally, and
//! drives event-registration installment payments.

mod api;
mod db;
mod journal;
mod models;
mod payments;
mod stats;

use anyhow::{anyhow, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use uuid::Uuid;

use crate::api::{
    CloseTradeRequest, CreateTradeRequest, JournalClient, PaymentRequest, RegistrationQuery,
    RequestGuard,
};
use crate::db::Database;
use crate::journal::{pnl, risk, CloseForm, JournalConfig, PnlInputs};
use crate::models::{
    Direction, ExitReason, Instrument, Market, OptionType, Registration, Trade,
};
use crate::payments::{BalanceTracker, PaymentPhase};
use crate::stats::JournalStats;

/// Trading journal CLI.
#[derive(Parser)]
#[command(name = "tradejournal")]
#[command(about = "Journal trades, preview P&L and risk, and manage event payments", long_about = None)]
struct Cli {
    /// Cache database file path
    #[arg(short, long, default_value = "sqlite:./journal.db?mode=rwc")]
    database: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a new trade in the journal
    Open {
        /// Ticker symbol
        symbol: String,

        /// Market (stocks, options, futures, forex, crypto)
        #[arg(short, long, default_value = "stocks")]
        market: String,

        /// Direction (long, short); ignored for options
        #[arg(long, default_value = "long")]
        direction: String,

        /// Option type (call, put); required when market is options
        #[arg(long)]
        option_type: Option<String>,

        /// Entry price per share (premium per share for options)
        #[arg(short, long)]
        entry: Decimal,

        /// Position size: shares, or contracts for options
        #[arg(short, long)]
        size: Decimal,

        /// Stop loss price
        #[arg(long)]
        stop: Option<Decimal>,

        /// Take profit price
        #[arg(long)]
        target: Option<Decimal>,

        /// Pre-trade confidence, 1-10
        #[arg(short, long)]
        confidence: Option<u8>,

        /// Setup / strategy name
        #[arg(long, default_value = "")]
        setup: String,

        /// Emotional state before entering
        #[arg(long, default_value = "")]
        emotion: String,

        /// Pre-trade analysis notes
        #[arg(long, default_value = "")]
        analysis: String,

        /// Post-trade notes journaled with the entry
        #[arg(long, default_value = "")]
        post_notes: String,

        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,

        /// Screenshot URL or path; repeat the flag for several
        #[arg(long = "screenshot")]
        screenshots: Vec<String>,
    },

    /// Close an open trade
    Close {
        /// Trade id
        id: String,

        /// Exit price (exit premium for options)
        #[arg(short, long)]
        price: Option<Decimal>,

        /// Exit reason (manual, take-profit, stop-loss, time-stop, reversal, other)
        #[arg(short, long)]
        reason: Option<String>,

        /// Exit notes
        #[arg(long, default_value = "")]
        notes: String,

        /// Emotional state at exit
        #[arg(long, default_value = "")]
        emotion: String,

        /// Lessons learned
        #[arg(long, default_value = "")]
        lessons: String,

        /// You would take this trade again
        #[arg(long, conflicts_with = "no_repeat")]
        repeat: bool,

        /// You would not take this trade again
        #[arg(long)]
        no_repeat: bool,

        /// Underlying price at exit (options, informational)
        #[arg(long)]
        underlying: Option<Decimal>,
    },

    /// Show one trade with mentor feedback
    Show {
        /// Trade id
        id: String,

        /// Re-fetch from the backend instead of the cache
        #[arg(long)]
        refresh: bool,
    },

    /// Show mentor feedback for a trade
    Feedback {
        /// Trade id
        id: String,
    },

    /// List journaled trades
    List {
        /// Re-fetch from the backend instead of the cache
        #[arg(long)]
        refresh: bool,
    },

    /// Delete a trade
    Delete {
        /// Trade id
        id: String,

        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },

    /// Show journal statistics
    Stats {
        /// Re-fetch from the backend first
        #[arg(long)]
        refresh: bool,
    },

    /// Event registration payments
    #[command(subcommand)]
    Payment(PaymentCommands),

    /// Show current configuration
    Config,
}

#[derive(Subcommand)]
enum PaymentCommands {
    /// Submit an installment payment
    Pay {
        /// Registration id
        registration: String,

        /// Payment amount
        #[arg(short, long)]
        amount: Decimal,

        /// Payment method
        #[arg(short, long, default_value = "card")]
        method: String,

        /// Payment description
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Show the payment plan status of a registration
    Status {
        /// Registration id
        registration: String,

        /// Re-fetch from the backend instead of the cache
        #[arg(long)]
        refresh: bool,
    },

    /// Find registrations by email or id
    Find {
        /// Attendee email
        #[arg(short, long)]
        email: Option<String>,

        /// Registration id
        #[arg(short, long)]
        registration: Option<String>,

        /// Scope the search to one event
        #[arg(long)]
        event: Option<String>,
    },
}

/// One duplicate-submission guard per mutating operation, held across the
/// whole dispatch so a retrying caller hits the same guard.
#[derive(Default)]
struct SubmissionGuards {
    create: RequestGuard,
    close: RequestGuard,
    payment: RequestGuard,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = JournalConfig::from_env();
    let db = Database::new(&cli.database).await?;
    let client = JournalClient::new(config.api_url.clone(), config.api_token.clone())?;
    let mut guards = SubmissionGuards::default();

    match cli.command {
        Commands::Open {
            symbol,
            market,
            direction,
            option_type,
            entry,
            size,
            stop,
            target,
            confidence,
            setup,
            emotion,
            analysis,
            post_notes,
            tags,
            screenshots,
        } => {
            let instrument =
                build_instrument(&market, &direction, option_type.as_deref())?;

            if let Some(c) = confidence {
                if !config.confidence_in_bounds(c) {
                    anyhow::bail!(
                        "confidence must be between {} and {}",
                        config.min_confidence,
                        config.max_confidence
                    );
                }
            }

            let risk_amount = risk::risk_amount(instrument, Some(entry), stop, Some(size));
            let risk_percentage = risk_amount
                .and_then(|r| risk::risk_percentage(r, config.account_size));

            let entry_time = Utc::now();
            let request = CreateTradeRequest {
                symbol: symbol.clone(),
                market: instrument.market().as_str().to_string(),
                direction: instrument.direction().as_str().to_string(),
                option_type: match instrument {
                    Instrument::Option { option_type } => {
                        Some(option_type.as_str().to_string())
                    }
                    Instrument::Linear { .. } => None,
                },
                setup,
                entry_price: entry,
                position_size: size,
                stop_loss: stop,
                take_profit: target,
                entry_time,
                trade_date: entry_time.date_naive().to_string(),
                risk_amount,
                risk_percentage,
                confidence,
                emotion_before: emotion,
                pre_trade_analysis: analysis,
                post_trade_notes: post_notes,
                tags: tags
                    .map(|t| t.split(',').map(|s| s.trim().to_string()).collect())
                    .unwrap_or_default(),
                screenshots,
                idempotency_key: Uuid::new_v4().to_string(),
            };

            let trade = guards.create.run(client.create_trade(&request)).await??;

            db.upsert_trade(&trade).await?;
            info!(id = %trade.id, symbol = %symbol, "Trade opened");

            println!("Opened trade {} ({} {})", trade.id, symbol, trade.status_str());
            if let Some(risk) = risk_amount {
                println!("Risk amount:    ${:.2}", risk);
            }
            if let Some(pct) = risk_percentage {
                println!("Risk percent:   {:.2}%", pct);
            }
        }

        Commands::Close {
            id,
            price,
            reason,
            notes,
            emotion,
            lessons,
            repeat,
            no_repeat,
            underlying,
        } => {
            let trade = match db.get_trade(&id).await? {
                Some(t) => t,
                None => {
                    let t = client.get_trade(&id).await?;
                    db.upsert_trade(&t).await?;
                    t
                }
            };

            let reason = match reason.as_deref() {
                Some(r) => Some(
                    ExitReason::parse(r)
                        .ok_or_else(|| anyhow!("unknown exit reason: {}", r))?,
                ),
                None => None,
            };
            let would_repeat = if repeat {
                Some(true)
            } else if no_repeat {
                Some(false)
            } else {
                None
            };

            let form = CloseForm {
                exit_price: price,
                exit_time: None,
                reason,
                notes,
                emotional_state: emotion,
                lessons_learned: lessons,
                would_repeat,
                underlying_price_at_exit: underlying,
            };

            // Validation failures stop here; nothing is submitted and the
            // trade stays open.
            let details = form.validate(&trade)?;

            let commission = if trade.commission.is_zero() {
                config.default_commission
            } else {
                trade.commission
            };
            if let Some(preview) = pnl::compute(&PnlInputs {
                instrument: trade.instrument,
                entry_price: trade.entry_price,
                exit_price: details.exit_price,
                position_size: trade.position_size,
                commission,
                risk_amount: trade.risk_amount,
            }) {
                println!("Estimated P&L:  ${:.2} ({:.2}%)", preview.net_pnl, preview.percentage);
            }

            let request =
                CloseTradeRequest::from_exit(&details, trade.instrument.is_option());

            let closed = guards.close.run(client.close_trade(&id, &request)).await??;

            db.upsert_trade(&closed).await?;
            info!(id = %id, "Trade closed");

            println!("Closed trade {}", id);
            if let Some(results) = &closed.results {
                print_results(results);
            }
        }

        Commands::Show { id, refresh } => {
            let trade = if refresh {
                let t = client.get_trade(&id).await?;
                db.upsert_trade(&t).await?;
                t
            } else {
                match db.get_trade(&id).await? {
                    Some(t) => t,
                    None => {
                        let t = client.get_trade(&id).await?;
                        db.upsert_trade(&t).await?;
                        t
                    }
                }
            };

            print_trade(&trade);

            match client.get_feedback(&id).await {
                Ok(feedback) if !feedback.is_empty() => print_feedback(&feedback),
                Ok(_) => {}
                Err(e) => tracing::debug!(error = %e, "No feedback available"),
            }
        }

        Commands::Feedback { id } => {
            let feedback = client.get_feedback(&id).await?;
            if feedback.is_empty() {
                println!("No feedback for trade {} yet.", id);
            } else {
                print_feedback(&feedback);
            }
        }

        Commands::List { refresh } => {
            let trades = if refresh {
                let fetched = client.list_trades(Some(500)).await?;
                for t in &fetched {
                    db.upsert_trade(t).await?;
                }
                fetched
            } else {
                db.list_trades().await?
            };

            if trades.is_empty() {
                println!("No trades journaled yet. Use 'tradejournal open' to add one.");
                return Ok(());
            }

            println!(
                "\n{:<12} {:<8} {:<8} {:<6} {:>12} {:>8} {:>12}",
                "ID", "SYMBOL", "MARKET", "DIR", "ENTRY", "SIZE", "NET P&L"
            );
            println!("{}", "-".repeat(72));

            for trade in &trades {
                let pnl_display = trade
                    .results
                    .as_ref()
                    .map(|r| format!("${:.2}", r.net_pnl))
                    .unwrap_or_else(|| trade.status_str().to_string());

                println!(
                    "{:<12} {:<8} {:<8} {:<6} {:>12} {:>8} {:>12}",
                    truncate(&trade.id, 12),
                    truncate(&trade.symbol, 8),
                    trade.instrument.market().as_str(),
                    trade.instrument.direction().as_str(),
                    format!("{:.2}", trade.entry_price),
                    trade.position_size,
                    pnl_display
                );
            }
        }

        Commands::Delete { id, yes } => {
            if !yes {
                println!("Deleting trade {} is permanent. Re-run with --yes to confirm.", id);
                return Ok(());
            }

            client.delete_trade(&id).await?;
            db.delete_trade(&id).await?;
            info!(id = %id, "Trade deleted");
            println!("Deleted trade {}", id);
        }

        Commands::Stats { refresh } => {
            if refresh {
                let fetched = client.list_trades(Some(500)).await?;
                for t in &fetched {
                    db.upsert_trade(t).await?;
                }
            }

            let trades = db.list_trades().await?;
            let stats = JournalStats::calculate(&trades);
            println!("{}", stats);
        }

        Commands::Payment(payment) => {
            handle_payment(payment, &config, &db, &client, &mut guards.payment).await?;
        }

        Commands::Config => {
            println!("\n=== Journal Configuration ===\n");
            println!("API URL:              {}", config.api_url);
            println!(
                "API Token:            {}",
                if config.api_token.is_some() { "set" } else { "not set" }
            );
            println!("Minimum Installment:  ${}", config.minimum_installment);
            println!("Default Commission:   ${}", config.default_commission);
            match config.account_size {
                Some(size) => println!("Account Size:         ${}", size),
                None => println!("Account Size:         not set"),
            }
            println!(
                "Confidence Range:     {}-{}",
                config.min_confidence, config.max_confidence
            );
        }
    }

    Ok(())
}

async fn handle_payment(
    command: PaymentCommands,
    config: &JournalConfig,
    db: &Database,
    client: &JournalClient,
    guard: &mut RequestGuard,
) -> Result<()> {
    match command {
        PaymentCommands::Pay {
            registration,
            amount,
            method,
            description,
        } => {
            let reg = client.get_registration(&registration).await?;
            db.upsert_registration(&reg).await?;

            let tracker = BalanceTracker::new(reg.remaining_balance(), config.minimum_installment);

            // Optimistic pre-check; the backend re-enforces these rules and
            // its message wins if it still rejects.
            tracker.validate_amount(amount)?;

            let request = PaymentRequest {
                amount: amount.round_dp(2),
                payment_method: method,
                description,
            };

            let checkout = guard
                .run(client.submit_payment(&registration, &request))
                .await??;

            info!(registration = %registration, amount = %amount, "Payment submitted");
            println!("Complete your payment at:\n  {}", checkout.checkout_url);

            // Refresh the cached balance after the payment round-trip.
            if let Ok(updated) = client.get_registration(&registration).await {
                db.upsert_registration(&updated).await?;
                print_plan_status(&updated, config);
            }
        }

        PaymentCommands::Status {
            registration,
            refresh,
        } => {
            let reg = if refresh {
                let r = client.get_registration(&registration).await?;
                db.upsert_registration(&r).await?;
                r
            } else {
                match db.get_registration(&registration).await? {
                    Some(r) => r,
                    None => {
                        let r = client.get_registration(&registration).await?;
                        db.upsert_registration(&r).await?;
                        r
                    }
                }
            };

            print_plan_status(&reg, config);
        }

        PaymentCommands::Find {
            email,
            registration,
            event,
        } => {
            if email.is_none() && registration.is_none() {
                anyhow::bail!("provide --email or --registration to search");
            }

            let query = RegistrationQuery {
                email,
                registration_id: registration,
                event_id: event,
            };

            let results = client.find_registrations(&query).await?;
            if results.is_empty() {
                println!("No registrations found.");
                return Ok(());
            }

            println!(
                "\n{:<14} {:<12} {:<28} {:>10} {:>10}",
                "ID", "EVENT", "EMAIL", "TOTAL", "REMAINING"
            );
            println!("{}", "-".repeat(78));

            for reg in &results {
                db.upsert_registration(reg).await?;
                println!(
                    "{:<14} {:<12} {:<28} {:>10} {:>10}",
                    truncate(&reg.id, 14),
                    truncate(&reg.event_id, 12),
                    truncate(&reg.email, 28),
                    format!("${:.2}", reg.total_amount),
                    format!("${:.2}", reg.remaining_balance())
                );
            }
        }
    }

    Ok(())
}

fn build_instrument(
    market: &str,
    direction: &str,
    option_type: Option<&str>,
) -> Result<Instrument> {
    let market = Market::parse(market).ok_or_else(|| anyhow!("unknown market: {}", market))?;

    if market == Market::Options {
        let option_type = match option_type
            .ok_or_else(|| anyhow!("--option-type (call or put) is required for options"))?
            .to_lowercase()
            .as_str()
        {
            "call" => OptionType::Call,
            "put" => OptionType::Put,
            other => anyhow::bail!("unknown option type: {}", other),
        };
        return Ok(Instrument::Option { option_type });
    }

    let direction = match direction.to_lowercase().as_str() {
        "long" | "buy" => Direction::Long,
        "short" | "sell" => Direction::Short,
        other => anyhow::bail!("unknown direction: {}", other),
    };

    Ok(Instrument::Linear { market, direction })
}

fn print_trade(trade: &Trade) {
    println!("\n=== Trade {} ===", trade.id);
    println!("Symbol:     {}", trade.symbol);
    println!("Market:     {}", trade.instrument.market().as_str());
    println!("Direction:  {}", trade.instrument.direction().as_str());
    println!("Status:     {}", trade.status_str());
    println!("Entry:      {:.2} x {}", trade.entry_price, trade.position_size);
    if let Some(stop) = trade.stop_loss {
        println!("Stop:       {:.2}", stop);
    }
    if let Some(target) = trade.take_profit {
        println!("Target:     {:.2}", target);
    }
    if let Some(risk) = trade.risk_amount {
        println!("Risk:       ${:.2}", risk);
    }
    if let Some(confidence) = trade.confidence {
        println!("Confidence: {}/10", confidence);
    }

    if let Some(exit) = &trade.exit {
        println!("\n--- Exit ---");
        println!("Price:      {:.2}", exit.exit_price);
        println!("Reason:     {}", exit.reason.as_str());
        println!("Repeat:     {}", if exit.would_repeat { "yes" } else { "no" });
        if !exit.lessons_learned.is_empty() {
            println!("Lessons:    {}", exit.lessons_learned);
        }
    }

    if let Some(results) = &trade.results {
        println!();
        print_results(results);
    }
}

fn print_feedback(feedback: &[models::Feedback]) {
    println!("\n--- Mentor Feedback ---");
    for fb in feedback {
        if !fb.mentor_name.is_empty() {
            println!("From {}:", fb.mentor_name);
        }
        for s in &fb.strengths {
            println!("  + {}", s);
        }
        for i in &fb.improvements {
            println!("  - {}", i);
        }
        if !fb.recommendations.is_empty() {
            println!("  => {}", fb.recommendations);
        }
    }
}

fn print_results(results: &models::TradeResults) {
    println!("Net P&L:    ${:.2}", results.net_pnl);
    println!("Return:     {:.2}%", results.pnl_percentage);
    println!("R-Multiple: {:.2}", results.r_multiple);
    println!("Held:       {} min", results.holding_minutes);
}

fn print_plan_status(reg: &Registration, config: &JournalConfig) {
    let tracker = BalanceTracker::new(reg.remaining_balance(), config.minimum_installment);

    println!("\n=== Registration {} ===", reg.id);
    println!("Event:      {}", reg.event_id);
    println!("Email:      {}", reg.email);
    println!("Mode:       {}", reg.payment_mode.as_str());
    println!("Total:      ${:.2}", reg.total_amount);
    println!("Paid:       ${:.2}", reg.total_paid);
    println!("Remaining:  ${:.2}", reg.remaining_balance());

    match tracker.phase() {
        PaymentPhase::FullyPaid => println!("Status:     fully paid"),
        PaymentPhase::FinalPaymentDue => println!(
            "Status:     final payment due, pay exactly ${:.2}",
            reg.remaining_balance().round_dp(2)
        ),
        PaymentPhase::Partial => println!(
            "Status:     partial, pay between ${:.2} and ${:.2}",
            config.minimum_installment,
            reg.remaining_balance().round_dp(2)
        ),
    }
}

/// Truncate a string with ellipsis if too long. Counts chars, not bytes,
/// so multibyte emails and symbols never split mid-character.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_instrument_options_require_type() {
        assert!(build_instrument("options", "long", None).is_err());
        assert!(matches!(
            build_instrument("options", "long", Some("put")).unwrap(),
            Instrument::Option {
                option_type: OptionType::Put
            }
        ));
    }

    #[test]
    fn test_build_instrument_linear() {
        let i = build_instrument("futures", "short", None).unwrap();
        assert_eq!(i.market(), Market::Futures);
        assert_eq!(i.direction(), Direction::Short);
    }

    #[test]
    fn test_build_instrument_rejects_unknown() {
        assert!(build_instrument("bonds", "long", None).is_err());
        assert!(build_instrument("stocks", "sideways", None).is_err());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a-very-long-identifier", 10), "a-very-...");
    }

    #[test]
    fn test_truncate_multibyte_email() {
        let email = "abпппппппппппппппп@example.com";
        let cut = truncate(email, 28);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), 28);
    }
}
