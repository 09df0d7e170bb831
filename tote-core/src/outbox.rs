//! # Domain Event Outbox
//!
//! Every successful mutation appends exactly one record here, after its
//! state writes have landed. Indexers and keepers drain the log in arrival
//! order; each record carries enough identifiers and amounts to track pool
//! and treasury deltas without replaying engine math.
//!
//! Mutating engine calls also return their own record, so a caller that
//! only cares about its own receipt never has to scan the log.

use crate::id::{ActorId, EventId, MarketId, PositionId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// A market was registered.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MarketCreated {
    pub market_id: MarketId,
    pub min_stake: u64,
    pub max_stake: u64,
    pub fee_bps: u16,
}

/// An event was declared on a market.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct EventCreated {
    pub event_id: EventId,
    pub market_id: MarketId,
    pub creator: ActorId,
    pub outcome_count: usize,
    pub price_driven: bool,
}

/// An event's betting window opened.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct EventOpened {
    pub event_id: EventId,
    pub betting_start: u64,
    pub betting_end: u64,
}

/// An event settled with a winning outcome.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct EventResolved {
    pub event_id: EventId,
    pub winning_outcome: usize,
    /// Net pool total frozen as the payout numerator.
    pub total_pool: u64,
    /// Winner pool frozen as the payout divisor.
    pub winning_pool: u64,
    /// Normalized price for price-driven events, absent for manual ones.
    pub resolved_price: Option<u128>,
    pub resolved_at: u64,
}

/// An event was called off; refunds are open.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct EventCancelled {
    pub event_id: EventId,
}

/// A bet landed in an outcome pool.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct BetPlaced {
    pub event_id: EventId,
    pub position_id: PositionId,
    pub owner: ActorId,
    pub outcome_index: usize,
    /// Gross stake offered by the bettor.
    pub stake: u64,
    /// Platform fee routed to the treasury.
    pub fee: u64,
    /// Net amount credited to the outcome pool.
    pub net_stake: u64,
}

/// A bet was withdrawn while its event was open.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct BetCancelled {
    pub event_id: EventId,
    pub position_id: PositionId,
    pub owner: ActorId,
    pub refund: u64,
    /// Cancellation fee left behind in the outcome pool.
    pub fee_retained: u64,
}

/// A winning position collected its payout.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct WinningsClaimed {
    pub event_id: EventId,
    pub position_id: PositionId,
    pub owner: ActorId,
    pub payout: u64,
}

/// A position recovered its stake from a cancelled event.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RefundClaimed {
    pub event_id: EventId,
    pub position_id: PositionId,
    pub owner: ActorId,
    pub amount: u64,
}

/// Ledger-delta record appended by a successful mutation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum DomainEvent {
    MarketCreated(MarketCreated),
    EventCreated(EventCreated),
    EventOpened(EventOpened),
    EventResolved(EventResolved),
    EventCancelled(EventCancelled),
    BetPlaced(BetPlaced),
    BetCancelled(BetCancelled),
    WinningsClaimed(WinningsClaimed),
    RefundClaimed(RefundClaimed),
}

impl From<MarketCreated> for DomainEvent {
    fn from(e: MarketCreated) -> Self {
        Self::MarketCreated(e)
    }
}

impl From<EventCreated> for DomainEvent {
    fn from(e: EventCreated) -> Self {
        Self::EventCreated(e)
    }
}

impl From<EventOpened> for DomainEvent {
    fn from(e: EventOpened) -> Self {
        Self::EventOpened(e)
    }
}

impl From<EventResolved> for DomainEvent {
    fn from(e: EventResolved) -> Self {
        Self::EventResolved(e)
    }
}

impl From<EventCancelled> for DomainEvent {
    fn from(e: EventCancelled) -> Self {
        Self::EventCancelled(e)
    }
}

impl From<BetPlaced> for DomainEvent {
    fn from(e: BetPlaced) -> Self {
        Self::BetPlaced(e)
    }
}

impl From<BetCancelled> for DomainEvent {
    fn from(e: BetCancelled) -> Self {
        Self::BetCancelled(e)
    }
}

impl From<WinningsClaimed> for DomainEvent {
    fn from(e: WinningsClaimed) -> Self {
        Self::WinningsClaimed(e)
    }
}

impl From<RefundClaimed> for DomainEvent {
    fn from(e: RefundClaimed) -> Self {
        Self::RefundClaimed(e)
    }
}

/// Append-only in-memory event log.
///
/// Draining is destructive by design: it models the hand-off to a durable
/// downstream log, and a drained record is the consumer's problem.
#[derive(Debug, Default)]
pub struct Outbox {
    records: Mutex<Vec<DomainEvent>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, event: impl Into<DomainEvent>) {
        self.records.lock().push(event.into());
    }

    /// Take every record appended since the previous drain, oldest first.
    pub fn drain(&self) -> Vec<DomainEvent> {
        std::mem::take(&mut *self.records.lock())
    }

    /// Number of undrained records.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outbox_preserves_order() {
        let outbox = Outbox::new();
        let event_id = EventId::new();
        outbox.push(EventCancelled { event_id });
        outbox.push(RefundClaimed {
            event_id,
            position_id: PositionId::new(),
            owner: ActorId::new(),
            amount: 42,
        });

        assert_eq!(outbox.len(), 2);
        let drained = outbox.drain();
        assert!(matches!(drained[0], DomainEvent::EventCancelled(_)));
        assert!(matches!(drained[1], DomainEvent::RefundClaimed(_)));
        assert!(outbox.is_empty(), "drain consumes the log");
    }

    #[test]
    fn test_records_tag_their_type_in_json() {
        let record: DomainEvent = WinningsClaimed {
            event_id: EventId::new(),
            position_id: PositionId::new(),
            owner: ActorId::new(),
            payout: 196,
        }
        .into();
        let json = serde_json::to_string(&record).unwrap();
        assert!(
            json.contains("\"type\":\"WinningsClaimed\""),
            "indexers dispatch on the tag: {json}"
        );
        let back: DomainEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
    }
}
