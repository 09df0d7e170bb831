//! # Positions
//!
//! A position is the claim ticket minted when a bet lands: who staked how
//! much on which outcome of which event. It is a take-once handle. Winning
//! claims flag it and keep it around as a receipt; cancellations and
//! refunds consume it by value, so a settled position cannot re-enter the
//! protocol. When a consuming call is rejected, the untouched position
//! travels back to the caller inside [`Rejected`].

use crate::error::{EngineError, Result};
use crate::event::{EventStatus, PredictionEvent};
use crate::id::{ActorId, EventId, PositionId};
use crate::market::Market;
use crate::pool;
use crate::treasury::Treasury;
use crate::{BPS_DENOMINATOR, CANCEL_FEE_BPS};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One bettor's stake on one outcome of one event.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Position {
    /// Unique position identifier.
    pub id: PositionId,
    /// Event this position bets on.
    pub event_id: EventId,
    /// Outcome index the stake backs.
    pub outcome_index: usize,
    /// Stake net of the platform fee; the amount actually pooled.
    pub stake_amount: u64,
    /// Identity that placed the bet and may settle it.
    pub owner: ActorId,
    claimed: bool,
}

impl Position {
    /// Whether winnings were already collected on this position.
    pub fn claimed(&self) -> bool {
        self.claimed
    }
}

/// A consuming operation that was refused: carries the untouched position
/// back to the caller alongside the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejected {
    pub position: Position,
    pub error: EngineError,
}

impl Rejected {
    fn new(position: Position, error: EngineError) -> Self {
        Self { position, error }
    }
}

impl fmt::Display for Rejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "position {} rejected: {}", self.position.id, self.error)
    }
}

impl std::error::Error for Rejected {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Receipt for a successfully placed bet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedBet {
    pub position: Position,
    /// Platform fee routed to the treasury.
    pub fee: u64,
}

/// Receipt for a cancelled bet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelledBet {
    pub position_id: PositionId,
    /// Amount returned to the bettor.
    pub refund: u64,
    /// Cancellation fee left behind in the outcome pool.
    pub fee_retained: u64,
}

/// Receipt for a refunded position on a cancelled event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefundedBet {
    pub position_id: PositionId,
    /// Full net stake returned, no fee deducted.
    pub amount: u64,
}

/// Place a stake on one outcome of an open event.
///
/// Validates market state, event linkage, lifecycle status, the betting
/// window, the outcome index, and the stake bounds before touching any
/// ledger. The platform fee goes to the treasury and the net stake into
/// the outcome pool; the returned position carries the net amount.
pub fn place_bet(
    market: &Market,
    event: &mut PredictionEvent,
    treasury: &mut Treasury,
    owner: ActorId,
    outcome_index: usize,
    stake: u64,
    now: u64,
) -> Result<PlacedBet> {
    if !market.active {
        return Err(EngineError::InvalidState(format!(
            "market {} is not active",
            market.id
        )));
    }
    if event.market_id != market.id {
        return Err(EngineError::Consistency(format!(
            "event {} belongs to market {}, not {}",
            event.id, event.market_id, market.id
        )));
    }
    if event.status() != EventStatus::Open {
        return Err(EngineError::InvalidState(format!(
            "bets require an open event, status is {}",
            event.status()
        )));
    }
    if !event.window_contains(now) {
        let start = event.betting_start().unwrap_or(0);
        let end = event.betting_end().unwrap_or(0);
        return Err(EngineError::Timing(format!(
            "bet at {now} is outside the betting window [{start}, {end})"
        )));
    }
    if outcome_index >= event.pools().len() {
        return Err(EngineError::Validation(format!(
            "outcome index {outcome_index} out of range for {} outcomes",
            event.pools().len()
        )));
    }
    market.validate_stake(stake)?;

    let fee = market.fee_for(stake);
    // fee < stake because fee_bps < 10_000.
    let net = stake - fee;
    event.pools.add(outcome_index, net)?;
    treasury.deposit_fee(fee);

    let position = Position {
        id: PositionId::new(),
        event_id: event.id,
        outcome_index,
        stake_amount: net,
        owner,
        claimed: false,
    };
    Ok(PlacedBet { position, fee })
}

/// Withdraw a bet while its event is still open, consuming the position.
///
/// The flat cancellation fee ([`crate::CANCEL_FEE_BPS`]) is independent of
/// the market's platform fee and is not paid anywhere: it stays in the
/// outcome pool, accruing to whichever outcome eventually wins.
pub fn cancel_bet(
    event: &mut PredictionEvent,
    position: Position,
    actor: ActorId,
) -> std::result::Result<CancelledBet, Rejected> {
    if let Err(error) = validate_position(event, &position, actor) {
        return Err(Rejected::new(position, error));
    }
    if event.status() != EventStatus::Open {
        let error = EngineError::InvalidState(format!(
            "bets can only be cancelled while the event is open, status is {}",
            event.status()
        ));
        return Err(Rejected::new(position, error));
    }
    let fee_retained = cancel_fee(position.stake_amount);
    let refund = position.stake_amount - fee_retained;
    if let Err(error) = event.pools.remove(position.outcome_index, refund) {
        return Err(Rejected::new(position, error));
    }
    Ok(CancelledBet {
        position_id: position.id,
        refund,
        fee_retained,
    })
}

/// Collect the proportional payout for a winning position.
///
/// The position is flagged, not consumed: it survives as a receipt. The
/// payout divides the totals frozen at resolution, so claim order never
/// changes anyone's share.
pub fn claim_winnings(
    event: &mut PredictionEvent,
    position: &mut Position,
    actor: ActorId,
) -> Result<u64> {
    validate_position(event, position, actor)?;
    if event.status() != EventStatus::Resolved {
        return Err(EngineError::InvalidState(format!(
            "winnings require a resolved event, status is {}",
            event.status()
        )));
    }
    let winner = event.winning_outcome().ok_or_else(|| {
        EngineError::InvalidState("resolved event is missing its winning outcome".to_string())
    })?;
    if position.outcome_index != winner {
        return Err(EngineError::Validation(format!(
            "position {} backed outcome {}, the winner was {winner}",
            position.id, position.outcome_index
        )));
    }
    let winning_pool = event.winning_pool_at_resolution().ok_or_else(|| {
        EngineError::InvalidState("resolved event is missing its frozen winner pool".to_string())
    })?;

    let payout = pool::payout_share(position.stake_amount, event.pools().total(), winning_pool);
    event.pools.withdraw(winner, payout)?;
    position.claimed = true;
    Ok(payout)
}

/// Recover the full net stake from a cancelled event, consuming the position.
pub fn claim_refund(
    event: &mut PredictionEvent,
    position: Position,
    actor: ActorId,
) -> std::result::Result<RefundedBet, Rejected> {
    if let Err(error) = validate_position(event, &position, actor) {
        return Err(Rejected::new(position, error));
    }
    if event.status() != EventStatus::Cancelled {
        let error = EngineError::InvalidState(format!(
            "refunds require a cancelled event, status is {}",
            event.status()
        ));
        return Err(Rejected::new(position, error));
    }
    if let Err(error) = event.pools.remove(position.outcome_index, position.stake_amount) {
        return Err(Rejected::new(position, error));
    }
    Ok(RefundedBet {
        position_id: position.id,
        amount: position.stake_amount,
    })
}

/// Cancellation fee: floor(net_stake * CANCEL_FEE_BPS / 10 000).
pub fn cancel_fee(stake_amount: u64) -> u64 {
    ((u128::from(stake_amount) * u128::from(CANCEL_FEE_BPS)) / u128::from(BPS_DENOMINATOR)) as u64
}

fn validate_position(event: &PredictionEvent, position: &Position, actor: ActorId) -> Result<()> {
    if position.event_id != event.id {
        return Err(EngineError::Consistency(format!(
            "position {} belongs to event {}, not {}",
            position.id, position.event_id, event.id
        )));
    }
    if position.owner != actor {
        return Err(EngineError::Unauthorized(format!(
            "{actor} does not own position {}",
            position.id
        )));
    }
    if position.claimed {
        return Err(EngineError::AlreadyDone(format!(
            "position {} was already claimed",
            position.id
        )));
    }
    Ok(())
}
