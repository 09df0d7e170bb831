//! # Tote Core
//!
//! Core settlement engine for parimutuel prediction markets.
//!
//! Stakes on each outcome of an event pool together. When the event
//! resolves, by an oracle's explicit verdict or by a price feed measured
//! against a target, the losing pools merge into the winner's and every
//! winning position claims floor(stake * total_pool / winning_pool),
//! computed over the totals frozen at resolution so claim order never
//! changes a payout.
//!
//! ## Features
//!
//! - **Market registry**: per-market stake bounds, fee rate, and oracle set
//! - **Event lifecycle**: created, open, resolved or cancelled, with a
//!   half-open betting window and an all-or-nothing resolve
//! - **Conserved pools**: outcome pools partition the total until
//!   resolution merges the losers into the winner
//! - **Oracle prices**: fixed 8-decimal normalization, exact hits settle
//!   "Above"
//! - **Take-once positions**: winning claims flag the receipt,
//!   cancellations and refunds consume it
//! - **Domain event outbox**: one record per mutation for indexers and
//!   keepers
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tote_core::{ActorId, FixedClock, SettlementEngine, StaticPolicy};
//!
//! let admin = ActorId::new();
//! let alice = ActorId::new();
//! let oracle = ActorId::new();
//!
//! let clock = Arc::new(FixedClock::new(1_000));
//! let policy = Arc::new(StaticPolicy::new().with_admin(admin));
//! let engine = SettlementEngine::new(clock.clone(), policy);
//!
//! let market = engine.create_market(admin, 10, 1_000_000, 200)?.market_id;
//! engine.add_oracle(admin, market, oracle)?;
//!
//! let event = engine
//!     .create_manual_event(
//!         admin,
//!         market,
//!         "Who wins the final?".to_string(),
//!         vec!["Home".to_string(), "Away".to_string()],
//!         3_600,
//!     )?
//!     .event_id;
//! engine.open_event(admin, event)?;
//!
//! let bet = engine.place_bet(alice, event, 0, 1_000)?;
//! clock.advance(3_600);
//! engine.resolve_manual(oracle, event, 0)?;
//!
//! let claim = engine.claim_winnings(alice, event, bet.position_id)?;
//! assert_eq!(claim.payout, 980);
//! # Ok::<(), tote_core::EngineError>(())
//! ```

pub mod auth;
pub mod clock;
pub mod engine;
pub mod error;
pub mod event;
pub mod id;
pub mod market;
pub mod oracle;
pub mod outbox;
pub mod pool;
pub mod position;
pub mod test_utils;
pub mod treasury;
pub mod utils;

pub use auth::{AccessPolicy, Role, StaticPolicy};
pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::SettlementEngine;
pub use error::{EngineError, Result};
pub use event::{EventKind, EventStatus, PredictionEvent};
pub use id::{ActorId, EventId, FeedId, MarketId, PositionId};
pub use market::Market;
pub use oracle::PriceReading;
pub use outbox::DomainEvent;
pub use pool::{payout_share, OutcomePools};
pub use position::Position;
pub use treasury::Treasury;

/// Basis-point denominator: a fee rate is its numerator over 10 000.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Flat cancellation fee charged when a bet is withdrawn from an open
/// event (1%), independent of the market's platform fee.
pub const CANCEL_FEE_BPS: u64 = 100;

/// Decimal precision every oracle price is normalized to.
pub const PRICE_DECIMALS: u32 = 8;

/// Smallest number of outcomes an event may declare.
pub const MIN_OUTCOMES: usize = 2;

/// Largest number of outcomes an event may declare.
pub const MAX_OUTCOMES: usize = 10;
