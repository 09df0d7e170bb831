//! # Market Registry
//!
//! A market is the configuration record a family of prediction events runs
//! under: stake bounds, platform fee rate, the active flag, and the set of
//! oracle identities allowed to resolve its events. Markets are created by
//! admins, mutated only by admins, and never deleted.

use crate::error::{EngineError, Result};
use crate::id::{ActorId, MarketId};
use crate::BPS_DENOMINATOR;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Configuration record for one betting market.
///
/// Events hold a back-reference to their market and read this record at
/// every bet placement, so flipping `active` off stops new events and new
/// bets immediately while leaving settlement of existing events untouched.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Market {
    /// Unique market identifier.
    pub id: MarketId,
    /// Smallest stake accepted on any event of this market (gross of fee).
    pub min_stake: u64,
    /// Largest stake accepted on any event of this market (gross of fee).
    pub max_stake: u64,
    /// Platform fee in basis points, extracted when a bet is placed.
    pub fee_bps: u16,
    /// Inactive markets accept no new events and no new bets.
    pub active: bool,
    oracles: BTreeSet<ActorId>,
}

impl Market {
    /// Create a market record after validating its configuration.
    ///
    /// `fee_bps` must stay below the full 10 000 basis points so every
    /// accepted bet contributes a positive net stake to its pool.
    pub fn new(id: MarketId, min_stake: u64, max_stake: u64, fee_bps: u16) -> Result<Self> {
        if min_stake == 0 {
            return Err(EngineError::Validation(
                "min_stake must be at least 1 unit".to_string(),
            ));
        }
        if min_stake > max_stake {
            return Err(EngineError::Validation(format!(
                "min_stake {min_stake} exceeds max_stake {max_stake}"
            )));
        }
        if u64::from(fee_bps) >= BPS_DENOMINATOR {
            return Err(EngineError::Validation(format!(
                "fee_bps {fee_bps} must be below {BPS_DENOMINATOR}"
            )));
        }
        Ok(Self {
            id,
            min_stake,
            max_stake,
            fee_bps,
            active: true,
            oracles: BTreeSet::new(),
        })
    }

    /// Whether `actor` may resolve events on this market.
    pub fn is_oracle(&self, actor: ActorId) -> bool {
        self.oracles.contains(&actor)
    }

    /// Authorize an oracle identity.
    pub fn add_oracle(&mut self, oracle: ActorId) {
        self.oracles.insert(oracle);
    }

    /// Revoke an oracle identity.
    pub fn remove_oracle(&mut self, oracle: ActorId) {
        self.oracles.remove(&oracle);
    }

    /// Currently authorized oracle identities.
    pub fn oracles(&self) -> impl Iterator<Item = &ActorId> {
        self.oracles.iter()
    }

    /// Reject stakes outside the configured band.
    pub fn validate_stake(&self, stake: u64) -> Result<()> {
        if stake < self.min_stake || stake > self.max_stake {
            return Err(EngineError::Validation(format!(
                "stake {stake} outside [{}, {}]",
                self.min_stake, self.max_stake
            )));
        }
        Ok(())
    }

    /// Platform fee for `stake`: floor(stake * fee_bps / 10 000).
    ///
    /// The multiplication runs in 128 bits, so stakes near `u64::MAX`
    /// cannot overflow.
    pub fn fee_for(&self, stake: u64) -> u64 {
        ((u128::from(stake) * u128::from(self.fee_bps)) / u128::from(BPS_DENOMINATOR)) as u64
    }
}
