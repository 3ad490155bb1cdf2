// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Account ledger the machine debits withdrawals against.

use crate::account::{Account, WithdrawResult};
use crate::base::AccountId;
use crate::error::AccountError;
use dashmap::DashMap;
use rust_decimal::Decimal;

/// Balance lookups, debits, and credits on customer accounts.
pub trait Ledger: Send + Sync {
    /// Current balance, or `None` if the account does not exist.
    fn balance(&self, account_id: &AccountId) -> Option<Decimal>;

    /// Debits `amount` if the balance covers it.
    ///
    /// Returns `None` if the account does not exist. A refused debit leaves
    /// the balance unchanged and reports it as `new_balance`.
    fn debit(&self, account_id: &AccountId, amount: Decimal) -> Option<WithdrawResult>;

    /// Credits `amount` back and returns the new balance.
    fn credit(&self, account_id: &AccountId, amount: Decimal) -> Result<Decimal, AccountError>;
}

/// Ledger kept in memory.
///
/// Accounts live in a [`DashMap`], so different accounts can be debited
/// from different threads without contention.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    accounts: DashMap<AccountId, Account>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens an account with an opening balance, replacing any account with
    /// the same identifier.
    pub fn open(&self, account_id: AccountId, balance: Decimal) {
        self.accounts
            .insert(account_id.clone(), Account::new(account_id, balance));
    }

    /// Retrieves an account by identifier.
    pub fn get_account(
        &self,
        account_id: &AccountId,
    ) -> Option<dashmap::mapref::one::Ref<'_, AccountId, Account>> {
        self.accounts.get(account_id)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl Ledger for InMemoryLedger {
    fn balance(&self, account_id: &AccountId) -> Option<Decimal> {
        self.accounts.get(account_id).map(|account| account.balance())
    }

    fn debit(&self, account_id: &AccountId, amount: Decimal) -> Option<WithdrawResult> {
        self.accounts
            .get(account_id)
            .map(|account| account.debit(amount))
    }

    fn credit(&self, account_id: &AccountId, amount: Decimal) -> Result<Decimal, AccountError> {
        self.accounts
            .get(account_id)
            .ok_or(AccountError::AccountNotFound)?
            .credit(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ledger() -> InMemoryLedger {
        let ledger = InMemoryLedger::new();
        ledger.open(AccountId::from("01001"), dec!(2738.59));
        ledger.open(AccountId::from("01002"), dec!(23.00));
        ledger.open(AccountId::from("01003"), dec!(0.00));
        ledger
    }

    #[test]
    fn balance_of_known_accounts() {
        let ledger = ledger();
        assert_eq!(ledger.balance(&"01001".into()), Some(dec!(2738.59)));
        assert_eq!(ledger.balance(&"01002".into()), Some(dec!(23.00)));
        assert_eq!(ledger.balance(&"01003".into()), Some(dec!(0.00)));
    }

    #[test]
    fn balance_of_unknown_account_is_none() {
        assert_eq!(ledger().balance(&"123456".into()), None);
    }

    #[test]
    fn debit_within_balance_succeeds() {
        let ledger = ledger();
        let result = ledger.debit(&"01001".into(), dec!(1000)).unwrap();
        assert!(result.success);
        assert_eq!(result.new_balance, dec!(1738.59));
        assert_eq!(ledger.balance(&"01001".into()), Some(dec!(1738.59)));
    }

    #[test]
    fn debit_entire_balance_succeeds() {
        let ledger = ledger();
        let result = ledger.debit(&"01002".into(), dec!(23.00)).unwrap();
        assert!(result.success);
        assert_eq!(result.new_balance, dec!(0.00));
    }

    #[test]
    fn debit_beyond_balance_is_refused() {
        let ledger = ledger();
        let result = ledger.debit(&"01002".into(), dec!(23.01)).unwrap();
        assert!(!result.success);
        assert_eq!(result.new_balance, dec!(23.00));

        let result = ledger.debit(&"01003".into(), dec!(10.00)).unwrap();
        assert!(!result.success);
        assert_eq!(result.new_balance, dec!(0.00));
    }

    #[test]
    fn debit_unknown_account_is_none() {
        assert_eq!(ledger().debit(&"999".into(), dec!(10)), None);
    }

    #[test]
    fn credit_restores_balance() {
        let ledger = ledger();
        ledger.debit(&"01002".into(), dec!(20)).unwrap();
        assert_eq!(ledger.credit(&"01002".into(), dec!(20)), Ok(dec!(23.00)));
        assert_eq!(
            ledger.credit(&"999".into(), dec!(20)),
            Err(AccountError::AccountNotFound)
        );
    }
}
