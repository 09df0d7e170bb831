//! # Tote CLI
//!
//! Command-line interface for the tote parimutuel settlement engine.

use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use colored::*;
use tote_core::utils::{format_price, format_timestamp, parse_price};
use tote_core::{
    oracle, payout_share, ActorId, FixedClock, PriceReading, SettlementEngine, StaticPolicy,
};

#[derive(Parser)]
#[command(name = "tote")]
#[command(about = "Parimutuel prediction-market settlement engine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scripted settlement walkthrough on an in-memory engine
    Demo,
    /// Compute the payout for a winning stake
    Payout {
        /// Net stake on the winning outcome
        #[arg(short, long)]
        stake: u64,
        /// Total pool frozen at resolution
        #[arg(short, long)]
        total_pool: u64,
        /// Winning pool frozen at resolution
        #[arg(short, long)]
        winning_pool: u64,
    },
    /// Normalize a feed quote and optionally settle it against a target
    Normalize {
        /// Quoted mantissa
        mantissa: u64,
        /// Quoted exponent (price = mantissa * 10^exponent)
        #[arg(short, long, default_value = "-8", allow_hyphen_values = true)]
        exponent: i32,
        /// Target price as a decimal string, e.g. "65000"
        #[arg(short, long)]
        target: Option<String>,
    },
    /// Preview the fees charged on a stake
    Fee {
        /// Gross stake offered
        stake: u64,
        /// Platform fee in basis points
        #[arg(short, long, default_value = "200")]
        fee_bps: u16,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Demo => run_demo()?,

        Commands::Payout {
            stake,
            total_pool,
            winning_pool,
        } => {
            let payout = payout_share(stake, total_pool, winning_pool);
            println!(
                "{}: {} of a {} winning pool against {} total pays {}",
                "Payout".green().bold(),
                stake.to_string().cyan(),
                winning_pool.to_string().yellow(),
                total_pool.to_string().yellow(),
                payout.to_string().green().bold()
            );
        }

        Commands::Normalize {
            mantissa,
            exponent,
            target,
        } => {
            let normalized = oracle::normalize(mantissa, exponent, tote_core::PRICE_DECIMALS)?;
            println!(
                "{}: {}e{} = {} ({} units)",
                "Normalized".green().bold(),
                mantissa.to_string().cyan(),
                exponent,
                format_price(normalized).yellow().bold(),
                normalized
            );
            if let Some(target) = target {
                let target_units = parse_price(&target)?;
                let winner = match oracle::verdict(normalized, target_units) {
                    oracle::OUTCOME_ABOVE => "Above".green().bold(),
                    _ => "Below".red().bold(),
                };
                println!(
                    "{}: {} vs target {} settles {}",
                    "Verdict".yellow().bold(),
                    format_price(normalized),
                    format_price(target_units),
                    winner
                );
            }
        }

        Commands::Fee { stake, fee_bps } => {
            let split = fee_breakdown(stake, fee_bps)?;
            println!(
                "{}: {} gross at {} bps",
                "Stake".green().bold(),
                stake.to_string().cyan(),
                fee_bps
            );
            println!("{}: {}", "Platform fee".yellow().bold(), split.fee);
            println!("{}: {}", "Net pooled".yellow().bold(), split.net);
            println!(
                "{}: {} (refund {} if withdrawn while open)",
                "Cancellation fee".yellow().bold(),
                split.cancel,
                split.net - split.cancel
            );
        }
    }

    Ok(())
}

struct FeeBreakdown {
    fee: u64,
    net: u64,
    cancel: u64,
}

/// Split a gross stake the way bet placement does. Rates of 100% or more
/// are rejected up front, matching what market creation accepts.
fn fee_breakdown(stake: u64, fee_bps: u16) -> Result<FeeBreakdown> {
    if u64::from(fee_bps) >= tote_core::BPS_DENOMINATOR {
        bail!(
            "fee_bps {fee_bps} must be below {}",
            tote_core::BPS_DENOMINATOR
        );
    }
    let fee =
        (u128::from(stake) * u128::from(fee_bps) / u128::from(tote_core::BPS_DENOMINATOR)) as u64;
    let net = stake - fee;
    Ok(FeeBreakdown {
        fee,
        net,
        cancel: tote_core::position::cancel_fee(net),
    })
}

/// Walk one manual and one price-driven event through the full lifecycle
/// on a deterministic clock, narrating every ledger movement.
fn run_demo() -> Result<()> {
    let admin = ActorId::new();
    let oracle_id = ActorId::new();
    let alice = ActorId::new();
    let bob = ActorId::new();
    let carol = ActorId::new();

    let clock = Arc::new(FixedClock::new(1_735_689_600));
    let policy = Arc::new(StaticPolicy::new().with_admin(admin));
    let engine = SettlementEngine::new(clock.clone(), policy);

    println!("{}", "Tote settlement demo".green().bold());
    println!("{}", "═".repeat(60).bright_black());

    let market_id = engine.create_market(admin, 10, 1_000_000_000, 200)?.market_id;
    engine.add_oracle(admin, market_id, oracle_id)?;
    println!("{}: {}", "Market".yellow().bold(), market_id);
    println!("{}: 2% platform fee, oracle authorized", "Config".yellow().bold());

    // --- manual event ---

    println!();
    println!("{}", "Manual event: match winner".green().bold());
    let event_id = engine
        .create_manual_event(
            admin,
            market_id,
            "Who takes the final?".to_string(),
            vec!["Home".to_string(), "Away".to_string()],
            3_600,
        )?
        .event_id;
    let window = engine.open_event(admin, event_id)?;
    println!(
        "{}: {} until {}",
        "Betting open".yellow().bold(),
        format_timestamp(window.betting_start),
        format_timestamp(window.betting_end)
    );

    let a = engine.place_bet(alice, event_id, 0, 100)?;
    let b = engine.place_bet(bob, event_id, 0, 200)?;
    let c = engine.place_bet(carol, event_id, 1, 300)?;
    for (name, bet) in [("alice", &a), ("bob", &b), ("carol", &c)] {
        println!(
            "  {} stakes {} ({} net after {} fee) on {}",
            name.cyan(),
            bet.stake,
            bet.net_stake.to_string().green(),
            bet.fee,
            if bet.outcome_index == 0 { "Home" } else { "Away" }
        );
    }
    let event = engine
        .event(event_id)
        .ok_or_else(|| anyhow::anyhow!("event vanished"))?;
    println!(
        "{}: Home pays {:.2}x, Away pays {:.2}x",
        "Odds".yellow().bold(),
        event.odds(0),
        event.odds(1)
    );

    clock.advance(3_600);
    let resolved = engine.resolve_manual(oracle_id, event_id, 0)?;
    println!(
        "{}: Home wins; {} total against a {} winning pool",
        "Resolved".yellow().bold(),
        resolved.total_pool.to_string().green(),
        resolved.winning_pool
    );

    let claim_a = engine.claim_winnings(alice, event_id, a.position_id)?;
    let claim_b = engine.claim_winnings(bob, event_id, b.position_id)?;
    println!("  {} claims {}", "alice".cyan(), claim_a.payout.to_string().green().bold());
    println!("  {} claims {}", "bob".cyan(), claim_b.payout.to_string().green().bold());
    if let Err(e) = engine.claim_winnings(bob, event_id, b.position_id) {
        println!("  {} second claim: {}", "bob".cyan(), e.to_string().red());
    }

    // --- price-driven event ---

    println!();
    println!("{}", "Price event: BTC above $65,000".green().bold());
    let feed_id = tote_core::FeedId::new([42; 32]);
    let target = parse_price("65000")?;
    let event_id = engine
        .create_price_event(
            admin,
            market_id,
            "BTC above 65k at close?".to_string(),
            feed_id,
            target,
            3_600,
        )?
        .event_id;
    engine.open_event(admin, event_id)?;

    let d = engine.place_bet(alice, event_id, 0, 500)?;
    engine.place_bet(bob, event_id, 1, 500)?;
    println!("  {} backs Above, {} backs Below, 500 each", "alice".cyan(), "bob".cyan());

    clock.advance(3_600);
    let due = engine.due_for_resolution();
    println!(
        "{}: {} event(s) waiting on a feed",
        "Keeper poll".yellow().bold(),
        due.len()
    );

    // The feed reads exactly 65,000: an exact hit settles Above.
    let reading = PriceReading::new(feed_id, 65_000, 0);
    let resolved = engine.resolve_price(oracle_id, event_id, &reading)?;
    println!(
        "{}: feed read {}, target {}, outcome {}",
        "Resolved".yellow().bold(),
        format_price(resolved.resolved_price.unwrap_or_default()).green(),
        format_price(target),
        if resolved.winning_outcome == 0 {
            "Above".green().bold()
        } else {
            "Below".red().bold()
        }
    );
    let claim_d = engine.claim_winnings(alice, event_id, d.position_id)?;
    println!("  {} claims {}", "alice".cyan(), claim_d.payout.to_string().green().bold());

    // --- ledger summary ---

    println!();
    println!("{}", "═".repeat(60).bright_black());
    println!(
        "{}: {} held, {} collected lifetime",
        "Treasury".yellow().bold(),
        engine.treasury_balance().to_string().green(),
        engine.treasury_total_collected()
    );
    println!("{}", "Outbox records for the indexer:".bright_blue());
    for record in engine.drain_events() {
        println!("  {}", serde_json::to_string(&record)?.bright_black());
    }

    Ok(())
}
