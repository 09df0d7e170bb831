//! # Treasury
//!
//! Sink for platform fees extracted at bet placement. The engine only ever
//! deposits; paying fees out is an administrative concern outside the
//! settlement core.

use serde::{Deserialize, Serialize};

/// Accumulated platform fees.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Treasury {
    balance: u64,
    total_collected: u64,
}

impl Treasury {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fee deposit.
    pub(crate) fn deposit_fee(&mut self, amount: u64) {
        self.balance = self.balance.saturating_add(amount);
        self.total_collected = self.total_collected.saturating_add(amount);
    }

    /// Funds currently held.
    pub fn balance(&self) -> u64 {
        self.balance
    }

    /// Lifetime sum of every fee ever collected.
    pub fn total_collected(&self) -> u64 {
        self.total_collected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fees_accumulate() {
        let mut treasury = Treasury::new();
        assert_eq!(treasury.balance(), 0);

        treasury.deposit_fee(25);
        treasury.deposit_fee(75);
        assert_eq!(treasury.balance(), 100);
        assert_eq!(treasury.total_collected(), 100);
    }

    #[test]
    fn test_zero_fee_deposit_is_harmless() {
        let mut treasury = Treasury::new();
        treasury.deposit_fee(0);
        assert_eq!(treasury.balance(), 0);
        assert_eq!(treasury.total_collected(), 0);
    }
}
