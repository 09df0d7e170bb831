//! # Outcome Pools
//!
//! Each event owns one pool per outcome plus a running net-of-fee total.
//! Before resolution the pools partition the total exactly; resolution
//! merges every losing pool into the winner's, after which claims draw the
//! winner pool down while the total stays frozen as the payout numerator.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// Outcome pool balances and the running total for one event.
///
/// Mutations validate fully before writing, so a failed call leaves the
/// ledger exactly as it was.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct OutcomePools {
    balances: Vec<u64>,
    total: u64,
}

impl OutcomePools {
    /// Zeroed pools for `n` outcomes.
    pub fn new(n: usize) -> Self {
        Self {
            balances: vec![0; n],
            total: 0,
        }
    }

    /// Number of outcome pools.
    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    /// Per-outcome net balances.
    pub fn balances(&self) -> &[u64] {
        &self.balances
    }

    /// Net balance of one outcome pool.
    pub fn balance(&self, outcome: usize) -> Option<u64> {
        self.balances.get(outcome).copied()
    }

    /// Running net total. Frozen at resolution; claims do not reduce it.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Sum of the outcome balances. Equals `total()` until resolution
    /// claims start drawing the winner pool down.
    pub fn combined_balance(&self) -> u64 {
        self.balances.iter().sum()
    }

    /// Credit `amount` to one outcome pool and the total.
    pub(crate) fn add(&mut self, outcome: usize, amount: u64) -> Result<()> {
        let balance = *self
            .balances
            .get(outcome)
            .ok_or_else(|| out_of_range(outcome, self.balances.len()))?;
        let new_balance = balance
            .checked_add(amount)
            .ok_or_else(|| overflow(outcome))?;
        let new_total = self
            .total
            .checked_add(amount)
            .ok_or_else(|| overflow(outcome))?;
        self.balances[outcome] = new_balance;
        self.total = new_total;
        Ok(())
    }

    /// Debit `amount` from one outcome pool and the total (cancellations
    /// and refunds, before or without resolution).
    pub(crate) fn remove(&mut self, outcome: usize, amount: u64) -> Result<()> {
        let balance = *self
            .balances
            .get(outcome)
            .ok_or_else(|| out_of_range(outcome, self.balances.len()))?;
        let new_balance = balance
            .checked_sub(amount)
            .ok_or_else(|| underflow(outcome, amount, balance))?;
        // total >= any single pool, so this cannot fail once the balance
        // subtraction succeeded.
        let new_total = self.total.saturating_sub(amount);
        self.balances[outcome] = new_balance;
        self.total = new_total;
        Ok(())
    }

    /// Move every losing pool's full balance into the winner's pool.
    ///
    /// The total is untouched: merging only re-partitions the same funds.
    /// Callers have already validated the winner index.
    pub(crate) fn merge_losers_into(&mut self, winner: usize) {
        debug_assert!(winner < self.balances.len());
        let mut winner_balance = self.balances[winner];
        for (i, balance) in self.balances.iter_mut().enumerate() {
            if i == winner {
                continue;
            }
            winner_balance += std::mem::take(balance);
        }
        self.balances[winner] = winner_balance;
    }

    /// Draw a payout from the (post-merge) winner pool. The total stays
    /// frozen so later claims divide the same numerator.
    pub(crate) fn withdraw(&mut self, outcome: usize, amount: u64) -> Result<()> {
        let len = self.balances.len();
        let balance = self
            .balances
            .get_mut(outcome)
            .ok_or_else(|| out_of_range(outcome, len))?;
        *balance = balance
            .checked_sub(amount)
            .ok_or_else(|| underflow(outcome, amount, *balance))?;
        Ok(())
    }
}

/// Proportional payout for one winning position.
///
/// floor(stake * total_pool / winning_pool) in 128-bit intermediates.
/// Both total and divisor are the values frozen at resolution, so the
/// result does not depend on claim order. An empty winning pool pays
/// nothing (nobody holds a position against it anyway).
pub fn payout_share(stake: u64, total_pool: u64, winning_pool: u64) -> u64 {
    if winning_pool == 0 {
        return 0;
    }
    ((u128::from(stake) * u128::from(total_pool)) / u128::from(winning_pool)) as u64
}

fn out_of_range(outcome: usize, len: usize) -> EngineError {
    EngineError::Validation(format!(
        "outcome index {outcome} out of range for {len} outcomes"
    ))
}

fn overflow(outcome: usize) -> EngineError {
    EngineError::Consistency(format!("pool balance overflow on outcome {outcome}"))
}

fn underflow(outcome: usize, amount: u64, balance: u64) -> EngineError {
    EngineError::Consistency(format!(
        "cannot remove {amount} from outcome {outcome} holding {balance}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pools_partition_total() {
        let mut pools = OutcomePools::new(3);
        pools.add(0, 100).unwrap();
        pools.add(1, 250).unwrap();
        pools.add(2, 50).unwrap();
        pools.add(0, 25).unwrap();

        assert_eq!(pools.balances(), &[125, 250, 50]);
        assert_eq!(pools.total(), 425);
        assert_eq!(
            pools.combined_balance(),
            pools.total(),
            "pools must partition the total before resolution"
        );
    }

    #[test]
    fn test_add_rejects_bad_index() {
        let mut pools = OutcomePools::new(2);
        let err = pools.add(2, 10).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert_eq!(pools.total(), 0, "failed add must not touch the ledger");
    }

    #[test]
    fn test_add_overflow_leaves_ledger_untouched() {
        let mut pools = OutcomePools::new(2);
        pools.add(0, u64::MAX - 5).unwrap();
        let err = pools.add(1, 10).unwrap_err();
        assert!(matches!(err, EngineError::Consistency(_)));
        assert_eq!(pools.balances(), &[u64::MAX - 5, 0]);
        assert_eq!(pools.total(), u64::MAX - 5);
    }

    #[test]
    fn test_remove_keeps_partition() {
        let mut pools = OutcomePools::new(2);
        pools.add(0, 100).unwrap();
        pools.add(1, 40).unwrap();
        pools.remove(0, 30).unwrap();

        assert_eq!(pools.balances(), &[70, 40]);
        assert_eq!(pools.total(), 110);
        assert!(
            pools.remove(1, 41).is_err(),
            "removing more than the pool holds must fail"
        );
        assert_eq!(pools.balances(), &[70, 40], "failed remove mutates nothing");
    }

    #[test]
    fn test_merge_losers_preserves_total() {
        let mut pools = OutcomePools::new(3);
        pools.add(0, 100).unwrap();
        pools.add(1, 250).unwrap();
        pools.add(2, 50).unwrap();

        pools.merge_losers_into(1);
        assert_eq!(pools.balances(), &[0, 400, 0]);
        assert_eq!(pools.total(), 400, "merging never changes the total");
    }

    #[test]
    fn test_merge_into_empty_winner() {
        let mut pools = OutcomePools::new(2);
        pools.add(1, 300).unwrap();

        pools.merge_losers_into(0);
        assert_eq!(
            pools.balances(),
            &[300, 0],
            "an empty winner pool still receives the losers' funds"
        );
    }

    #[test]
    fn test_withdraw_leaves_total_frozen() {
        let mut pools = OutcomePools::new(2);
        pools.add(0, 100).unwrap();
        pools.add(1, 200).unwrap();
        pools.merge_losers_into(0);

        pools.withdraw(0, 120).unwrap();
        assert_eq!(pools.balances(), &[180, 0]);
        assert_eq!(pools.total(), 300, "total is the frozen payout numerator");

        assert!(
            pools.withdraw(0, 181).is_err(),
            "withdrawals cannot exceed the winner pool"
        );
    }

    #[test]
    fn test_withdraw_rejects_bad_index() {
        let mut pools = OutcomePools::new(2);
        pools.add(0, 50).unwrap();

        let err = pools.withdraw(2, 10).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert_eq!(pools.balances(), &[50, 0], "failed withdraw mutates nothing");
        assert_eq!(pools.total(), 50);
    }

    #[test]
    fn test_payout_share_floors() {
        // Winners staked 100/200/294 (pool 594) against an 882 total.
        assert_eq!(payout_share(100, 882, 594), 148);
        assert_eq!(payout_share(200, 882, 594), 296);
        assert_eq!(payout_share(294, 882, 594), 436);
        // Floor dust: 148 + 296 + 436 = 880, two units stay behind.
    }

    #[test]
    fn test_payout_share_sole_winner_takes_all() {
        assert_eq!(payout_share(98, 588, 98), 588);
    }

    #[test]
    fn test_payout_share_empty_winning_pool() {
        assert_eq!(payout_share(0, 588, 0), 0);
    }

    #[test]
    fn test_payout_share_large_values() {
        // Near-max pools would overflow a 64-bit multiply.
        let stake = u64::MAX / 2;
        let total = u64::MAX;
        let winning = u64::MAX / 2 + 1;
        let payout = payout_share(stake, total, winning);
        assert!(payout <= total);
        assert_eq!(
            payout,
            ((u128::from(stake) * u128::from(total)) / u128::from(winning)) as u64
        );
    }

    #[test]
    fn test_payout_conservation_across_claims() {
        let stakes = [33_u64, 67, 101, 499];
        let winning: u64 = stakes.iter().sum(); // 700
        let total = 1_000_u64;

        let paid: u64 = stakes
            .iter()
            .map(|&s| payout_share(s, total, winning))
            .sum();
        assert!(paid <= total, "claims must never exceed the total pool");
        assert!(
            total - paid < stakes.len() as u64,
            "floor dust is bounded by one unit per claim"
        );
    }
}
