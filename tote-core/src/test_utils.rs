//! Common test utilities for tote-core tests.
//!
//! Shared fixtures for exercising the settlement engine: deterministic
//! actors, a configured market with an authorized oracle, opened events,
//! and an engine harness wired to a manually driven clock.

use crate::auth::StaticPolicy;
use crate::clock::FixedClock;
use crate::engine::SettlementEngine;
use crate::event::PredictionEvent;
use crate::id::{ActorId, EventId, FeedId, MarketId};
use crate::market::Market;
use std::sync::Arc;

/// Test constants used across tests
pub mod constants {
    /// Betting window length used by fixture events (1 hour).
    pub const TEST_DURATION: u64 = 3_600;
    /// Clock origin for fixture engines (2025-01-01 00:00:00 UTC).
    pub const TEST_START: u64 = 1_735_689_600;
    /// Platform fee used by fixture markets (2%).
    pub const TEST_FEE_BPS: u16 = 200;
    /// Stake bounds used by fixture markets.
    pub const TEST_MIN_STAKE: u64 = 10;
    pub const TEST_MAX_STAKE: u64 = 1_000_000_000;
    /// Feed id used by price-driven fixtures.
    pub const TEST_FEED_HEX: &str =
        "ee96d4b9c5e16f3b11e33bb27fe39ae7a57daa6b24210de5b39237993742cc0a";
}

/// Deterministic cast of actors for a test run.
#[derive(Clone, Copy, Debug)]
pub struct Actors {
    pub admin: ActorId,
    pub creator: ActorId,
    pub oracle: ActorId,
    pub alice: ActorId,
    pub bob: ActorId,
    pub carol: ActorId,
}

impl Actors {
    pub fn new() -> Self {
        Self {
            admin: ActorId::new(),
            creator: ActorId::new(),
            oracle: ActorId::new(),
            alice: ActorId::new(),
            bob: ActorId::new(),
            carol: ActorId::new(),
        }
    }
}

impl Default for Actors {
    fn default() -> Self {
        Self::new()
    }
}

/// Engine harness: an engine, its clock, the actor cast, and one active
/// market (2% fee) with `actors.oracle` authorized.
pub struct Harness {
    pub engine: SettlementEngine,
    pub clock: Arc<FixedClock>,
    pub actors: Actors,
    pub market_id: MarketId,
}

/// Build the standard harness. The clock starts at
/// [`constants::TEST_START`] and only moves when a test advances it.
pub fn harness() -> Harness {
    let actors = Actors::new();
    let clock = Arc::new(FixedClock::new(constants::TEST_START));
    let policy = StaticPolicy::new()
        .with_admin(actors.admin)
        .with_event_creator(actors.creator);
    let engine = SettlementEngine::new(clock.clone(), Arc::new(policy));
    let market_id = engine
        .create_market(
            actors.admin,
            constants::TEST_MIN_STAKE,
            constants::TEST_MAX_STAKE,
            constants::TEST_FEE_BPS,
        )
        .unwrap()
        .market_id;
    engine
        .add_oracle(actors.admin, market_id, actors.oracle)
        .unwrap();
    Harness {
        engine,
        clock,
        actors,
        market_id,
    }
}

impl Harness {
    /// Create and open a manual Yes/No event; the window starts at the
    /// current clock reading.
    pub fn open_manual_event(&self) -> EventId {
        let event_id = self
            .engine
            .create_manual_event(
                self.actors.creator,
                self.market_id,
                "Will it settle?".to_string(),
                vec!["Yes".to_string(), "No".to_string()],
                constants::TEST_DURATION,
            )
            .unwrap()
            .event_id;
        self.engine
            .open_event(self.actors.creator, event_id)
            .unwrap();
        event_id
    }

    /// Create and open a price-driven event against the fixture feed.
    /// `target_price` is in normalized units.
    pub fn open_price_event(&self, target_price: u128) -> EventId {
        let event_id = self
            .engine
            .create_price_event(
                self.actors.creator,
                self.market_id,
                "Above the target?".to_string(),
                self.feed_id(),
                target_price,
                constants::TEST_DURATION,
            )
            .unwrap()
            .event_id;
        self.engine
            .open_event(self.actors.creator, event_id)
            .unwrap();
        event_id
    }

    /// Advance past the betting window so resolution becomes legal.
    pub fn close_window(&self) {
        self.clock.advance(constants::TEST_DURATION);
    }

    /// The fixture feed id.
    pub fn feed_id(&self) -> FeedId {
        FeedId::from_hex(constants::TEST_FEED_HEX).unwrap()
    }
}

/// Standalone market record for pure-layer tests, fee 2%.
pub fn test_market() -> Market {
    Market::new(
        MarketId::new(),
        constants::TEST_MIN_STAKE,
        constants::TEST_MAX_STAKE,
        constants::TEST_FEE_BPS,
    )
    .unwrap()
}

/// Standalone two-outcome event on `market`, already open; the window
/// starts at [`constants::TEST_START`].
pub fn open_event_on(market: &Market) -> PredictionEvent {
    let mut event = PredictionEvent::new_manual(
        market.id,
        ActorId::new(),
        "fixture event".to_string(),
        vec!["Yes".to_string(), "No".to_string()],
        constants::TEST_DURATION,
    )
    .unwrap();
    event.open(constants::TEST_START).unwrap();
    event
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Clock;

    #[test]
    fn test_harness_wiring() {
        let h = harness();
        let market = h.engine.market(h.market_id).unwrap();
        assert!(market.active);
        assert!(market.is_oracle(h.actors.oracle));
        assert_eq!(h.clock.now(), constants::TEST_START);
    }

    #[test]
    fn test_fixture_event_is_bettable() {
        let market = test_market();
        let event = open_event_on(&market);
        assert!(event.window_contains(constants::TEST_START));
    }
}
