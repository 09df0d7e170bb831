//! # Prediction Events
//!
//! An event is one bettable question: a set of labeled outcomes, a pool
//! per outcome, and a lifecycle state machine gating every operation.
//!
//! ```text
//! Created ──open──> Open ──resolve──> Locked ──> Resolved
//!    │                │                (internal only)
//!    └────cancel──────┴──cancel──> Cancelled
//! ```
//!
//! `Locked` never escapes a resolve call: the status moves Open to Locked
//! to Resolved before the call returns, under the event's exclusive guard.

use crate::error::{EngineError, Result};
use crate::id::{ActorId, EventId, FeedId, MarketId};
use crate::oracle::{self, PriceReading};
use crate::pool::OutcomePools;
use crate::{MAX_OUTCOMES, MIN_OUTCOMES};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a prediction event.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventStatus {
    /// Declared but not yet accepting bets.
    Created,
    /// Betting window is live (or has elapsed, pending resolution).
    Open,
    /// Mid-resolution. Exists only inside the resolve call.
    Locked,
    /// Settled with a winning outcome; winners may claim.
    Resolved,
    /// Called off; bettors may claim full refunds.
    Cancelled,
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventStatus::Created => "created",
            EventStatus::Open => "open",
            EventStatus::Locked => "locked",
            EventStatus::Resolved => "resolved",
            EventStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// What settles the event: a trusted verdict, or a price feed measured
/// against a target.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum EventKind {
    /// An authorized oracle supplies the winning outcome index directly.
    Manual,
    /// The feed's normalized price against `target_price` picks between
    /// the fixed Above/Below outcome pair.
    PriceDriven {
        feed_id: FeedId,
        /// Target in normalized units ([`crate::PRICE_DECIMALS`] decimals).
        target_price: u128,
        /// Normalized reading recorded at resolution.
        resolved_price: Option<u128>,
    },
}

/// Snapshot returned by a successful resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionSummary {
    pub winning_outcome: usize,
    /// Net pool total frozen as the payout numerator.
    pub total_pool: u64,
    /// Winner pool balance frozen as the payout divisor.
    pub winning_pool: u64,
    /// Normalized price, for price-driven events.
    pub resolved_price: Option<u128>,
}

/// One bettable event and its pool ledger.
///
/// Identity fields are public and immutable; lifecycle state is private
/// behind accessors so it can only move through the state machine.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PredictionEvent {
    /// Unique event identifier.
    pub id: EventId,
    /// Market whose configuration governs this event.
    pub market_id: MarketId,
    /// Identity that created the event; may open and cancel it.
    pub creator: ActorId,
    /// Human-readable question, e.g. "BTC above 100k by Friday?".
    pub description: String,
    /// Betting window length in seconds, applied when the event opens.
    pub duration: u64,
    pub(crate) outcomes: Vec<String>,
    pub(crate) kind: EventKind,
    pub(crate) status: EventStatus,
    pub(crate) pools: OutcomePools,
    pub(crate) betting_start: Option<u64>,
    pub(crate) betting_end: Option<u64>,
    pub(crate) winning_outcome: Option<usize>,
    pub(crate) resolved_at: Option<u64>,
    pub(crate) winning_pool_at_resolution: Option<u64>,
}

impl PredictionEvent {
    /// Create a manually resolved event with caller-supplied outcome labels.
    pub fn new_manual(
        market_id: MarketId,
        creator: ActorId,
        description: String,
        outcomes: Vec<String>,
        duration: u64,
    ) -> Result<Self> {
        if outcomes.len() < MIN_OUTCOMES || outcomes.len() > MAX_OUTCOMES {
            return Err(EngineError::Validation(format!(
                "events take {MIN_OUTCOMES} to {MAX_OUTCOMES} outcomes, got {}",
                outcomes.len()
            )));
        }
        Self::build(
            market_id,
            creator,
            description,
            outcomes,
            EventKind::Manual,
            duration,
        )
    }

    /// Create a price-driven event with the fixed Above/Below outcomes.
    ///
    /// `target_price` is in normalized units; use [`crate::utils::parse_price`]
    /// to convert a decimal string.
    pub fn new_price_driven(
        market_id: MarketId,
        creator: ActorId,
        description: String,
        feed_id: FeedId,
        target_price: u128,
        duration: u64,
    ) -> Result<Self> {
        if target_price == 0 {
            return Err(EngineError::Validation(
                "target price must be positive".to_string(),
            ));
        }
        Self::build(
            market_id,
            creator,
            description,
            oracle::price_outcome_labels(),
            EventKind::PriceDriven {
                feed_id,
                target_price,
                resolved_price: None,
            },
            duration,
        )
    }

    fn build(
        market_id: MarketId,
        creator: ActorId,
        description: String,
        outcomes: Vec<String>,
        kind: EventKind,
        duration: u64,
    ) -> Result<Self> {
        if duration == 0 {
            return Err(EngineError::Validation(
                "betting duration must be positive".to_string(),
            ));
        }
        let pools = OutcomePools::new(outcomes.len());
        Ok(Self {
            id: EventId::new(),
            market_id,
            creator,
            description,
            duration,
            outcomes,
            kind,
            status: EventStatus::Created,
            pools,
            betting_start: None,
            betting_end: None,
            winning_outcome: None,
            resolved_at: None,
            winning_pool_at_resolution: None,
        })
    }

    // --- accessors ---

    pub fn status(&self) -> EventStatus {
        self.status
    }

    /// Outcome labels in index order.
    pub fn outcomes(&self) -> &[String] {
        &self.outcomes
    }

    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    /// Pool ledger (read-only view).
    pub fn pools(&self) -> &OutcomePools {
        &self.pools
    }

    pub fn betting_start(&self) -> Option<u64> {
        self.betting_start
    }

    pub fn betting_end(&self) -> Option<u64> {
        self.betting_end
    }

    pub fn winning_outcome(&self) -> Option<usize> {
        self.winning_outcome
    }

    pub fn resolved_at(&self) -> Option<u64> {
        self.resolved_at
    }

    /// Winner pool balance frozen at resolution (the payout divisor).
    pub fn winning_pool_at_resolution(&self) -> Option<u64> {
        self.winning_pool_at_resolution
    }

    /// Whether `now` falls inside the half-open betting window
    /// `[betting_start, betting_end)`.
    pub fn window_contains(&self, now: u64) -> bool {
        match (self.betting_start, self.betting_end) {
            (Some(start), Some(end)) => now >= start && now < end,
            _ => false,
        }
    }

    /// Multiplier-style odds for one outcome: total over the outcome's
    /// pool. An empty (or unknown) pool shows even odds.
    pub fn odds(&self, outcome: usize) -> f64 {
        match self.pools.balance(outcome) {
            Some(balance) if balance > 0 => self.pools.total() as f64 / balance as f64,
            _ => 1.0,
        }
    }

    /// Human-readable status line for display surfaces.
    pub fn status_line(&self) -> String {
        match self.status {
            EventStatus::Created => "Created - not yet open".to_string(),
            EventStatus::Open => "Open - accepting bets".to_string(),
            EventStatus::Locked => "Locking".to_string(),
            EventStatus::Resolved => match self.winning_outcome {
                Some(i) => format!("Resolved - {} won", self.outcomes[i]),
                None => "Resolved".to_string(),
            },
            EventStatus::Cancelled => "Cancelled - refunds open".to_string(),
        }
    }

    // --- lifecycle ---

    /// Open the betting window at `now`; it runs for `duration` seconds.
    ///
    /// Returns the `(betting_start, betting_end)` pair.
    pub fn open(&mut self, now: u64) -> Result<(u64, u64)> {
        self.require_status(EventStatus::Created, "open")?;
        let end = now.checked_add(self.duration).ok_or_else(|| {
            EngineError::Validation("betting window overflows the clock".to_string())
        })?;
        self.status = EventStatus::Open;
        self.betting_start = Some(now);
        self.betting_end = Some(end);
        Ok((now, end))
    }

    /// Call the event off. Valid from Created or Open, including after the
    /// window has elapsed but before anyone resolves.
    ///
    /// Pools are left in place; bettors recover stakes via refund claims.
    pub fn cancel(&mut self) -> Result<()> {
        match self.status {
            EventStatus::Created | EventStatus::Open => {
                self.status = EventStatus::Cancelled;
                Ok(())
            }
            other => Err(EngineError::InvalidState(format!(
                "cannot cancel an event in status {other}"
            ))),
        }
    }

    /// Resolve with an explicit verdict from a trusted oracle.
    ///
    /// Checks run before any write; once they pass, the lock-merge-record
    /// tail cannot fail, so the transition is all-or-nothing.
    pub fn resolve_manual(&mut self, winning_outcome: usize, now: u64) -> Result<ResolutionSummary> {
        self.check_resolvable(now)?;
        if winning_outcome >= self.pools.len() {
            return Err(EngineError::Validation(format!(
                "winning outcome {winning_outcome} out of range for {} outcomes",
                self.pools.len()
            )));
        }
        Ok(self.commit_resolution(winning_outcome, None, now))
    }

    /// Resolve from a price feed reading.
    ///
    /// The reading's feed id must match the feed pinned at creation; the
    /// price is normalized and measured against the target only after the
    /// cheap status and timing checks pass.
    pub fn resolve_price(&mut self, reading: &PriceReading, now: u64) -> Result<ResolutionSummary> {
        self.check_resolvable(now)?;
        let (feed_id, target_price) = match &self.kind {
            EventKind::PriceDriven {
                feed_id,
                target_price,
                ..
            } => (*feed_id, *target_price),
            EventKind::Manual => {
                return Err(EngineError::Validation(
                    "manual events take an explicit verdict, not a price feed".to_string(),
                ))
            }
        };
        if reading.feed_id != feed_id {
            return Err(EngineError::Consistency(format!(
                "reading from feed {} does not match the event's feed {}",
                reading.feed_id, feed_id
            )));
        }
        let normalized = reading.normalized()?;
        let winner = oracle::verdict(normalized, target_price);
        Ok(self.commit_resolution(winner, Some(normalized), now))
    }

    fn check_resolvable(&self, now: u64) -> Result<()> {
        self.require_status(EventStatus::Open, "resolve")?;
        let end = self.betting_end.ok_or_else(|| {
            EngineError::InvalidState("open event is missing its betting window".to_string())
        })?;
        if now < end {
            return Err(EngineError::Timing(format!(
                "betting closes at {end}, cannot resolve at {now}"
            )));
        }
        Ok(())
    }

    /// Irreversible tail of a resolve; runs only after every check passed.
    fn commit_resolution(
        &mut self,
        winner: usize,
        resolved_price: Option<u128>,
        now: u64,
    ) -> ResolutionSummary {
        self.status = EventStatus::Locked;
        let winning_pool = self.pools.balances()[winner];
        self.winning_pool_at_resolution = Some(winning_pool);
        self.pools.merge_losers_into(winner);
        if let EventKind::PriceDriven {
            resolved_price: slot,
            ..
        } = &mut self.kind
        {
            *slot = resolved_price;
        }
        self.winning_outcome = Some(winner);
        self.resolved_at = Some(now);
        self.status = EventStatus::Resolved;
        ResolutionSummary {
            winning_outcome: winner,
            total_pool: self.pools.total(),
            winning_pool,
            resolved_price,
        }
    }

    fn require_status(&self, required: EventStatus, action: &str) -> Result<()> {
        if self.status != required {
            return Err(EngineError::InvalidState(format!(
                "cannot {action} an event in status {}, requires {required}",
                self.status
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::constants::TEST_DURATION;

    const NOW: u64 = 1_000_000;

    fn manual_event() -> PredictionEvent {
        PredictionEvent::new_manual(
            MarketId::new(),
            ActorId::new(),
            "fixture".to_string(),
            vec!["Yes".to_string(), "No".to_string()],
            TEST_DURATION,
        )
        .unwrap()
    }

    fn price_event(target: u128) -> (PredictionEvent, FeedId) {
        let feed = FeedId::new([9; 32]);
        let event = PredictionEvent::new_price_driven(
            MarketId::new(),
            ActorId::new(),
            "BTC above target?".to_string(),
            feed,
            target,
            TEST_DURATION,
        )
        .unwrap();
        (event, feed)
    }

    #[test]
    fn test_outcome_count_bounds() {
        let one = PredictionEvent::new_manual(
            MarketId::new(),
            ActorId::new(),
            "x".to_string(),
            vec!["only".to_string()],
            60,
        );
        assert!(one.is_err(), "a single outcome is not bettable");

        let eleven: Vec<String> = (0..11).map(|i| format!("o{i}")).collect();
        assert!(
            PredictionEvent::new_manual(MarketId::new(), ActorId::new(), "x".to_string(), eleven, 60)
                .is_err(),
            "eleven outcomes exceed the cap"
        );

        let ten: Vec<String> = (0..10).map(|i| format!("o{i}")).collect();
        assert!(
            PredictionEvent::new_manual(MarketId::new(), ActorId::new(), "x".to_string(), ten, 60)
                .is_ok()
        );
    }

    #[test]
    fn test_price_events_fix_binary_outcomes() {
        let (event, _) = price_event(100);
        assert_eq!(event.outcomes(), &["Above".to_string(), "Below".to_string()]);
        assert!(
            PredictionEvent::new_price_driven(
                MarketId::new(),
                ActorId::new(),
                "x".to_string(),
                FeedId::new([0; 32]),
                0,
                60,
            )
            .is_err(),
            "zero target should be rejected"
        );
    }

    #[test]
    fn test_open_sets_window() {
        let mut event = manual_event();
        assert_eq!(event.status(), EventStatus::Created);
        assert!(!event.window_contains(NOW));

        let (start, end) = event.open(NOW).unwrap();
        assert_eq!(start, NOW);
        assert_eq!(end, NOW + TEST_DURATION);
        assert_eq!(event.status(), EventStatus::Open);

        assert!(event.window_contains(NOW), "window includes its start");
        assert!(event.window_contains(end - 1));
        assert!(!event.window_contains(end), "window excludes its end");

        assert!(event.open(NOW).is_err(), "reopening must fail");
    }

    #[test]
    fn test_cancel_paths() {
        let mut created = manual_event();
        assert!(created.cancel().is_ok(), "created events can be cancelled");

        let mut open = manual_event();
        open.open(NOW).unwrap();
        assert!(open.cancel().is_ok(), "open events can be cancelled");

        let mut resolved = manual_event();
        resolved.open(NOW).unwrap();
        resolved.resolve_manual(0, NOW + TEST_DURATION).unwrap();
        let err = resolved.cancel().unwrap_err();
        assert!(
            matches!(err, EngineError::InvalidState(_)),
            "resolution is final, got {err}"
        );

        let mut cancelled = manual_event();
        cancelled.cancel().unwrap();
        assert!(cancelled.cancel().is_err(), "cancel is not idempotent");
    }

    #[test]
    fn test_resolve_requires_elapsed_window() {
        let mut event = manual_event();
        assert!(
            event.resolve_manual(0, NOW).is_err(),
            "cannot resolve before opening"
        );

        event.open(NOW).unwrap();
        let err = event.resolve_manual(0, NOW + TEST_DURATION - 1).unwrap_err();
        assert!(
            matches!(err, EngineError::Timing(_)),
            "mid-window resolve must be a timing error, got {err}"
        );

        let summary = event.resolve_manual(0, NOW + TEST_DURATION).unwrap();
        assert_eq!(summary.winning_outcome, 0);
        assert_eq!(event.status(), EventStatus::Resolved);
        assert_eq!(event.resolved_at(), Some(NOW + TEST_DURATION));
    }

    #[test]
    fn test_resolve_merges_pools_and_freezes_divisor() {
        let mut event = manual_event();
        event.open(NOW).unwrap();
        event.pools.add(0, 300).unwrap();
        event.pools.add(1, 700).unwrap();

        let summary = event.resolve_manual(0, NOW + TEST_DURATION).unwrap();
        assert_eq!(summary.total_pool, 1_000);
        assert_eq!(summary.winning_pool, 300);
        assert_eq!(event.pools().balances(), &[1_000, 0]);
        assert_eq!(event.winning_pool_at_resolution(), Some(300));
    }

    #[test]
    fn test_resolve_is_final() {
        let mut event = manual_event();
        event.open(NOW).unwrap();
        event.resolve_manual(1, NOW + TEST_DURATION).unwrap();

        let err = event.resolve_manual(0, NOW + TEST_DURATION).unwrap_err();
        assert!(
            matches!(err, EngineError::InvalidState(_)),
            "second resolve must fail, got {err}"
        );
        assert_eq!(event.winning_outcome(), Some(1), "first verdict stands");
    }

    #[test]
    fn test_resolve_manual_validates_index() {
        let mut event = manual_event();
        event.open(NOW).unwrap();
        assert!(event.resolve_manual(2, NOW + TEST_DURATION).is_err());
        assert_eq!(
            event.status(),
            EventStatus::Open,
            "failed resolve leaves the event open"
        );
    }

    #[test]
    fn test_resolve_price_checks_feed_id() {
        let (mut event, _) = price_event(6_500_000_000_000);
        event.open(NOW).unwrap();

        let wrong = PriceReading::new(FeedId::new([1; 32]), 1, -8);
        let err = event
            .resolve_price(&wrong, NOW + TEST_DURATION)
            .unwrap_err();
        assert!(
            matches!(err, EngineError::Consistency(_)),
            "foreign feed must be rejected, got {err}"
        );
        assert_eq!(event.status(), EventStatus::Open);
    }

    #[test]
    fn test_resolve_price_verdicts() {
        // Target 65000 at 8 decimals.
        let target = 6_500_000_000_000_u128;

        let (mut event, feed) = price_event(target);
        event.open(NOW).unwrap();
        let above = PriceReading::new(feed, 6_512_345_000_000, -8);
        let summary = event.resolve_price(&above, NOW + TEST_DURATION).unwrap();
        assert_eq!(summary.winning_outcome, oracle::OUTCOME_ABOVE);
        assert_eq!(summary.resolved_price, Some(6_512_345_000_000));

        let (mut event, feed) = price_event(target);
        event.open(NOW).unwrap();
        let below = PriceReading::new(feed, 6_499_999_999_999, -8);
        let summary = event.resolve_price(&below, NOW + TEST_DURATION).unwrap();
        assert_eq!(summary.winning_outcome, oracle::OUTCOME_BELOW);

        // Exact hit settles Above.
        let (mut event, feed) = price_event(target);
        event.open(NOW).unwrap();
        let exact = PriceReading::new(feed, 65_000, 0);
        let summary = event.resolve_price(&exact, NOW + TEST_DURATION).unwrap();
        assert_eq!(summary.winning_outcome, oracle::OUTCOME_ABOVE);
    }

    #[test]
    fn test_resolve_price_rejects_manual_events() {
        let mut event = manual_event();
        event.open(NOW).unwrap();
        let reading = PriceReading::new(FeedId::new([9; 32]), 1, -8);
        assert!(event.resolve_price(&reading, NOW + TEST_DURATION).is_err());
    }

    #[test]
    fn test_odds_track_pool_ratio() {
        let mut event = manual_event();
        event.open(NOW).unwrap();
        assert_eq!(event.odds(0), 1.0, "empty pools show even odds");

        event.pools.add(0, 250).unwrap();
        event.pools.add(1, 750).unwrap();
        assert_eq!(event.odds(0), 4.0);
        assert!((event.odds(1) - 1.333).abs() < 0.001);
    }
}
