//! Denormalized running balances.
//!
//! One `AccountBalance` exists per account, created at {0, 0} together with the
//! account. Only the journal engine changes it, by applying `BalanceDelta`s in
//! the same unit of work that records the entry.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tally_core::AccountId;

use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub account_id: AccountId,
    pub debit_balance: Decimal,
    pub credit_balance: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl AccountBalance {
    pub fn zero(account_id: AccountId, now: DateTime<Utc>) -> Self {
        Self {
            account_id,
            debit_balance: Decimal::ZERO,
            credit_balance: Decimal::ZERO,
            updated_at: now,
        }
    }

    /// Debits minus credits.
    pub fn net_balance(&self) -> Decimal {
        self.debit_balance - self.credit_balance
    }

    /// Add `delta` to both sides. Leaves the balance untouched on overflow.
    pub fn apply(&mut self, delta: &BalanceDelta, now: DateTime<Utc>) -> Result<(), ValidationError> {
        debug_assert_eq!(self.account_id, delta.account_id);
        let id = self.account_id;
        let overflow = || ValidationError::BalanceOverflow(id);
        let debit = self.debit_balance.checked_add(delta.debit).ok_or_else(overflow)?;
        let credit = self.credit_balance.checked_add(delta.credit).ok_or_else(overflow)?;

        self.debit_balance = debit;
        self.credit_balance = credit;
        self.updated_at = now;
        Ok(())
    }
}

/// Amount to add to one account's balance as part of a journal entry commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceDelta {
    pub account_id: AccountId,
    pub debit: Decimal,
    pub credit: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_balance_is_zero_on_both_sides() {
        let b = AccountBalance::zero(AccountId::new(), Utc::now());
        assert_eq!(b.debit_balance, Decimal::ZERO);
        assert_eq!(b.credit_balance, Decimal::ZERO);
        assert_eq!(b.net_balance(), Decimal::ZERO);
    }

    #[test]
    fn apply_accumulates_each_side() {
        let id = AccountId::new();
        let mut b = AccountBalance::zero(id, Utc::now());
        b.apply(
            &BalanceDelta {
                account_id: id,
                debit: Decimal::new(10000, 2),
                credit: Decimal::ZERO,
            },
            Utc::now(),
        )
        .unwrap();
        b.apply(
            &BalanceDelta {
                account_id: id,
                debit: Decimal::ZERO,
                credit: Decimal::new(2550, 2),
            },
            Utc::now(),
        )
        .unwrap();

        assert_eq!(b.debit_balance, Decimal::new(10000, 2));
        assert_eq!(b.credit_balance, Decimal::new(2550, 2));
        assert_eq!(b.net_balance(), Decimal::new(7450, 2));
    }

    #[test]
    fn overflowing_delta_is_rejected_without_partial_update() {
        let id = AccountId::new();
        let mut b = AccountBalance::zero(id, Utc::now());
        let half = Decimal::from_str_exact("50000000000000000000000000000").unwrap();
        let delta = BalanceDelta {
            account_id: id,
            debit: Decimal::ONE,
            credit: half,
        };
        b.apply(&delta, Utc::now()).unwrap();

        let before = b.clone();
        assert_eq!(
            b.apply(&delta, Utc::now()).unwrap_err(),
            ValidationError::BalanceOverflow(id)
        );
        // the debit side fit, but nothing was written
        assert_eq!(b, before);
    }
}
