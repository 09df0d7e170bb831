//! # Settlement Engine
//!
//! Concurrent facade over markets, events, positions, and the treasury.
//! Entities live in sharded maps; a mutating call holds its event's
//! exclusive guard from the first validation through its outbox append,
//! so operations on the same event serialize and their records land in
//! settlement order, while different events proceed in parallel.
//!
//! Lock order: events, then markets, then the treasury, then positions,
//! then the outbox. Every operation acquires a subset of these in that
//! order, which rules out lock cycles.

use crate::auth::{AccessPolicy, Role};
use crate::clock::Clock;
use crate::error::{EngineError, Result};
use crate::event::{EventKind, EventStatus, PredictionEvent, ResolutionSummary};
use crate::id::{ActorId, EventId, FeedId, MarketId, PositionId};
use crate::market::Market;
use crate::oracle::PriceReading;
use crate::outbox::{
    BetCancelled, BetPlaced, DomainEvent, EventCancelled, EventCreated, EventOpened,
    EventResolved, MarketCreated, Outbox, RefundClaimed, WinningsClaimed,
};
use crate::position::{self, Position};
use crate::treasury::Treasury;
use dashmap::mapref::one::{Ref, RefMut};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

/// Shared settlement engine. Cheap to share behind an `Arc`; every method
/// takes `&self`.
pub struct SettlementEngine {
    markets: DashMap<MarketId, Market>,
    events: DashMap<EventId, PredictionEvent>,
    positions: DashMap<PositionId, Position>,
    treasury: Mutex<Treasury>,
    outbox: Outbox,
    clock: Arc<dyn Clock>,
    policy: Arc<dyn AccessPolicy>,
}

impl SettlementEngine {
    pub fn new(clock: Arc<dyn Clock>, policy: Arc<dyn AccessPolicy>) -> Self {
        Self {
            markets: DashMap::new(),
            events: DashMap::new(),
            positions: DashMap::new(),
            treasury: Mutex::new(Treasury::new()),
            outbox: Outbox::new(),
            clock,
            policy,
        }
    }

    // --- market administration ---

    /// Register a market (admin only).
    pub fn create_market(
        &self,
        actor: ActorId,
        min_stake: u64,
        max_stake: u64,
        fee_bps: u16,
    ) -> Result<MarketCreated> {
        let market_id = MarketId::new();
        self.require_role(actor, market_id, Role::Admin, "create a market")?;
        let market = Market::new(market_id, min_stake, max_stake, fee_bps)?;
        self.markets.insert(market_id, market);
        let record = MarketCreated {
            market_id,
            min_stake,
            max_stake,
            fee_bps,
        };
        self.outbox.push(record.clone());
        info!(%market_id, min_stake, max_stake, fee_bps, "market created");
        Ok(record)
    }

    /// Toggle whether a market accepts new events and bets (admin only).
    pub fn set_market_active(
        &self,
        actor: ActorId,
        market_id: MarketId,
        active: bool,
    ) -> Result<()> {
        self.require_role(actor, market_id, Role::Admin, "administer a market")?;
        let mut market = self.market_mut(market_id)?;
        market.active = active;
        info!(%market_id, active, "market active flag set");
        Ok(())
    }

    /// Authorize an oracle identity for a market (admin only).
    pub fn add_oracle(&self, actor: ActorId, market_id: MarketId, oracle: ActorId) -> Result<()> {
        self.require_role(actor, market_id, Role::Admin, "administer a market")?;
        let mut market = self.market_mut(market_id)?;
        market.add_oracle(oracle);
        info!(%market_id, %oracle, "oracle authorized");
        Ok(())
    }

    /// Revoke an oracle identity (admin only). Events the oracle already
    /// resolved stay resolved.
    pub fn remove_oracle(
        &self,
        actor: ActorId,
        market_id: MarketId,
        oracle: ActorId,
    ) -> Result<()> {
        self.require_role(actor, market_id, Role::Admin, "administer a market")?;
        let mut market = self.market_mut(market_id)?;
        market.remove_oracle(oracle);
        info!(%market_id, %oracle, "oracle revoked");
        Ok(())
    }

    // --- event lifecycle ---

    /// Declare a manually resolved event on an active market.
    pub fn create_manual_event(
        &self,
        actor: ActorId,
        market_id: MarketId,
        description: String,
        outcomes: Vec<String>,
        duration: u64,
    ) -> Result<EventCreated> {
        self.check_event_creation(actor, market_id)?;
        let event =
            PredictionEvent::new_manual(market_id, actor, description, outcomes, duration)?;
        Ok(self.admit_event(event, false))
    }

    /// Declare a price-driven event on an active market. `target_price`
    /// is in normalized units, see [`crate::utils::parse_price`].
    pub fn create_price_event(
        &self,
        actor: ActorId,
        market_id: MarketId,
        description: String,
        feed_id: FeedId,
        target_price: u128,
        duration: u64,
    ) -> Result<EventCreated> {
        self.check_event_creation(actor, market_id)?;
        let event = PredictionEvent::new_price_driven(
            market_id,
            actor,
            description,
            feed_id,
            target_price,
            duration,
        )?;
        Ok(self.admit_event(event, true))
    }

    /// Open an event's betting window (creator only).
    pub fn open_event(&self, actor: ActorId, event_id: EventId) -> Result<EventOpened> {
        let now = self.clock.now();
        let mut event = self.event_mut(event_id)?;
        if event.creator != actor {
            return Err(EngineError::Unauthorized(format!(
                "{actor} did not create event {event_id}"
            )));
        }
        let (betting_start, betting_end) = event.open(now)?;
        let record = EventOpened {
            event_id,
            betting_start,
            betting_end,
        };
        self.outbox.push(record.clone());
        drop(event);
        info!(%event_id, betting_start, betting_end, "event opened");
        Ok(record)
    }

    /// Call an event off (creator or admin), from Created or Open.
    pub fn cancel_event(&self, actor: ActorId, event_id: EventId) -> Result<EventCancelled> {
        let mut event = self.event_mut(event_id)?;
        if event.creator != actor && !self.policy.authorized(actor, event.market_id, Role::Admin) {
            return Err(EngineError::Unauthorized(format!(
                "{actor} may not cancel event {event_id}"
            )));
        }
        event.cancel()?;
        let record = EventCancelled { event_id };
        self.outbox.push(record.clone());
        drop(event);
        info!(%event_id, "event cancelled");
        Ok(record)
    }

    /// Resolve a manual event with an oracle's verdict.
    pub fn resolve_manual(
        &self,
        actor: ActorId,
        event_id: EventId,
        winning_outcome: usize,
    ) -> Result<EventResolved> {
        let now = self.clock.now();
        let mut event = self.event_mut(event_id)?;
        self.require_oracle(actor, event.market_id)?;
        let summary = event.resolve_manual(winning_outcome, now)?;
        self.finish_resolution(event_id, summary, now)
    }

    /// Resolve a price-driven event from a feed reading.
    pub fn resolve_price(
        &self,
        actor: ActorId,
        event_id: EventId,
        reading: &PriceReading,
    ) -> Result<EventResolved> {
        let now = self.clock.now();
        let mut event = self.event_mut(event_id)?;
        self.require_oracle(actor, event.market_id)?;
        let summary = event.resolve_price(reading, now)?;
        self.finish_resolution(event_id, summary, now)
    }

    // --- betting and claims ---

    /// Place a stake for `actor` on an open event. Returns the bet record,
    /// which carries the minted position id.
    pub fn place_bet(
        &self,
        actor: ActorId,
        event_id: EventId,
        outcome_index: usize,
        stake: u64,
    ) -> Result<BetPlaced> {
        let now = self.clock.now();
        let mut event = self.event_mut(event_id)?;
        let market = self.market_ref(event.market_id)?;
        let mut treasury = self.treasury.lock();
        let placed =
            position::place_bet(&market, &mut event, &mut treasury, actor, outcome_index, stake, now)?;
        drop(treasury);
        drop(market);

        let record = BetPlaced {
            event_id,
            position_id: placed.position.id,
            owner: actor,
            outcome_index,
            stake,
            fee: placed.fee,
            net_stake: placed.position.stake_amount,
        };
        self.positions.insert(placed.position.id, placed.position);
        self.outbox.push(record.clone());
        drop(event);
        debug!(%event_id, position_id = %record.position_id, stake, "bet placed");
        Ok(record)
    }

    /// Withdraw a bet while its event is still open. Consumes the stored
    /// position; the cancellation fee stays in the outcome pool.
    ///
    /// The pure layer runs against a copy of the stored position, so a
    /// rejected call never touches the map and the position stays visible
    /// throughout. Consumers of the same position all pass through this
    /// event's guard, which keeps the copy faithful until the removal.
    pub fn cancel_bet(
        &self,
        actor: ActorId,
        event_id: EventId,
        position_id: PositionId,
    ) -> Result<BetCancelled> {
        let mut event = self.event_mut(event_id)?;
        let stored = self
            .position(position_id)
            .ok_or_else(|| unknown_position(position_id))?;
        match position::cancel_bet(&mut event, stored, actor) {
            Ok(cancelled) => {
                self.positions.remove(&position_id);
                let record = BetCancelled {
                    event_id,
                    position_id,
                    owner: actor,
                    refund: cancelled.refund,
                    fee_retained: cancelled.fee_retained,
                };
                self.outbox.push(record.clone());
                drop(event);
                debug!(%event_id, %position_id, refund = record.refund, "bet cancelled");
                Ok(record)
            }
            // The stored position was never touched; only the copy comes
            // back inside the rejection.
            Err(rejected) => Err(rejected.error),
        }
    }

    /// Collect the payout for a winning position. The position stays in
    /// the engine as a claimed receipt.
    pub fn claim_winnings(
        &self,
        actor: ActorId,
        event_id: EventId,
        position_id: PositionId,
    ) -> Result<WinningsClaimed> {
        let mut event = self.event_mut(event_id)?;
        let mut entry = self
            .positions
            .get_mut(&position_id)
            .ok_or_else(|| unknown_position(position_id))?;
        let payout = position::claim_winnings(&mut event, &mut entry, actor)?;
        drop(entry);

        let record = WinningsClaimed {
            event_id,
            position_id,
            owner: actor,
            payout,
        };
        self.outbox.push(record.clone());
        drop(event);
        debug!(%event_id, %position_id, payout, "winnings claimed");
        Ok(record)
    }

    /// Recover the full net stake from a cancelled event. Consumes the
    /// stored position; rejected calls leave the map untouched, as in
    /// [`Self::cancel_bet`].
    pub fn claim_refund(
        &self,
        actor: ActorId,
        event_id: EventId,
        position_id: PositionId,
    ) -> Result<RefundClaimed> {
        let mut event = self.event_mut(event_id)?;
        let stored = self
            .position(position_id)
            .ok_or_else(|| unknown_position(position_id))?;
        match position::claim_refund(&mut event, stored, actor) {
            Ok(refunded) => {
                self.positions.remove(&position_id);
                let record = RefundClaimed {
                    event_id,
                    position_id,
                    owner: actor,
                    amount: refunded.amount,
                };
                self.outbox.push(record.clone());
                drop(event);
                debug!(%event_id, %position_id, amount = record.amount, "refund claimed");
                Ok(record)
            }
            Err(rejected) => Err(rejected.error),
        }
    }

    // --- queries ---

    /// Snapshot of a market's configuration.
    pub fn market(&self, market_id: MarketId) -> Option<Market> {
        self.markets.get(&market_id).map(|m| m.clone())
    }

    /// Snapshot of an event.
    pub fn event(&self, event_id: EventId) -> Option<PredictionEvent> {
        self.events.get(&event_id).map(|e| e.clone())
    }

    /// Snapshot of a live position. Consumed positions are gone; claimed
    /// winning positions remain visible as receipts.
    pub fn position(&self, position_id: PositionId) -> Option<Position> {
        self.positions.get(&position_id).map(|p| p.clone())
    }

    /// Platform fees currently held.
    pub fn treasury_balance(&self) -> u64 {
        self.treasury.lock().balance()
    }

    /// Lifetime platform fees collected.
    pub fn treasury_total_collected(&self) -> u64 {
        self.treasury.lock().total_collected()
    }

    /// Price-driven events whose windows have elapsed and which are still
    /// open: the worklist a resolution keeper polls. Racing keepers are
    /// safe; the losers of the race get an invalid-state error.
    pub fn due_for_resolution(&self) -> Vec<EventId> {
        let now = self.clock.now();
        self.events
            .iter()
            .filter(|entry| {
                let event = entry.value();
                matches!(event.kind(), EventKind::PriceDriven { .. })
                    && event.status() == EventStatus::Open
                    && event.betting_end().is_some_and(|end| end <= now)
            })
            .map(|entry| *entry.key())
            .collect()
    }

    /// Drain the outbox, oldest record first (destructive, for indexers).
    pub fn drain_events(&self) -> Vec<DomainEvent> {
        self.outbox.drain()
    }

    /// Number of undrained outbox records.
    pub fn pending_events(&self) -> usize {
        self.outbox.len()
    }

    // --- helpers ---

    fn check_event_creation(&self, actor: ActorId, market_id: MarketId) -> Result<()> {
        let market = self.market_ref(market_id)?;
        if !market.active {
            return Err(EngineError::InvalidState(format!(
                "market {market_id} is not active"
            )));
        }
        drop(market);
        self.require_role(actor, market_id, Role::EventCreator, "create events")
    }

    fn admit_event(&self, event: PredictionEvent, price_driven: bool) -> EventCreated {
        let record = EventCreated {
            event_id: event.id,
            market_id: event.market_id,
            creator: event.creator,
            outcome_count: event.outcomes().len(),
            price_driven,
        };
        info!(event_id = %event.id, market_id = %event.market_id, price_driven, "event created");
        self.events.insert(event.id, event);
        self.outbox.push(record.clone());
        record
    }

    /// Append the resolution record and log it. Callers still hold the
    /// event's guard, so the record lands ahead of any claim on the newly
    /// resolved event.
    fn finish_resolution(
        &self,
        event_id: EventId,
        summary: ResolutionSummary,
        now: u64,
    ) -> Result<EventResolved> {
        let record = EventResolved {
            event_id,
            winning_outcome: summary.winning_outcome,
            total_pool: summary.total_pool,
            winning_pool: summary.winning_pool,
            resolved_price: summary.resolved_price,
            resolved_at: now,
        };
        self.outbox.push(record.clone());
        info!(
            %event_id,
            winning_outcome = summary.winning_outcome,
            total_pool = summary.total_pool,
            "event resolved"
        );
        Ok(record)
    }

    fn require_role(
        &self,
        actor: ActorId,
        market_id: MarketId,
        role: Role,
        action: &str,
    ) -> Result<()> {
        if !self.policy.authorized(actor, market_id, role) {
            return Err(EngineError::Unauthorized(format!(
                "{actor} may not {action}"
            )));
        }
        Ok(())
    }

    fn require_oracle(&self, actor: ActorId, market_id: MarketId) -> Result<()> {
        let market = self.market_ref(market_id)?;
        if !market.is_oracle(actor) {
            return Err(EngineError::Unauthorized(format!(
                "{actor} is not an authorized oracle for market {market_id}"
            )));
        }
        Ok(())
    }

    fn market_ref(&self, market_id: MarketId) -> Result<Ref<'_, MarketId, Market>> {
        self.markets
            .get(&market_id)
            .ok_or_else(|| EngineError::NotFound(format!("market {market_id}")))
    }

    fn market_mut(&self, market_id: MarketId) -> Result<RefMut<'_, MarketId, Market>> {
        self.markets
            .get_mut(&market_id)
            .ok_or_else(|| EngineError::NotFound(format!("market {market_id}")))
    }

    fn event_mut(&self, event_id: EventId) -> Result<RefMut<'_, EventId, PredictionEvent>> {
        self.events
            .get_mut(&event_id)
            .ok_or_else(|| EngineError::NotFound(format!("event {event_id}")))
    }
}

fn unknown_position(position_id: PositionId) -> EngineError {
    EngineError::NotFound(format!("position {position_id}"))
}
