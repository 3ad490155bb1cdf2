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

//! Customer accounts held by the in-memory ledger.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use atm_cash::{Account, AccountId};
//!
//! let account = Account::new(AccountId::from("01001"), dec!(2738.59));
//! let result = account.debit(dec!(1000));
//! assert!(result.success);
//! assert_eq!(result.new_balance, dec!(1738.59));
//! ```

use crate::base::AccountId;
use crate::error::AccountError;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};

/// Result of asking the ledger to debit an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawResult {
    pub success: bool,
    /// Balance after the call. Unchanged from before the call when
    /// `success` is false.
    pub new_balance: Decimal,
}

#[derive(Debug)]
struct AccountData {
    account_id: AccountId,
    balance: Decimal,
}

impl AccountData {
    fn new(account_id: AccountId, balance: Decimal) -> Self {
        Self {
            account_id,
            balance,
        }
    }

    /// Decreases the balance.
    fn debit(&mut self, amount: Decimal) -> Result<(), AccountError> {
        if amount <= Decimal::ZERO {
            return Err(AccountError::InvalidAmount);
        }
        if self.balance < amount {
            return Err(AccountError::InsufficientFunds);
        }
        self.balance -= amount;
        debug_assert!(
            self.balance >= Decimal::ZERO,
            "Invariant violated: debit took balance below zero: {}",
            self.balance
        );
        Ok(())
    }

    /// Increases the balance.
    fn credit(&mut self, amount: Decimal) -> Result<(), AccountError> {
        if amount <= Decimal::ZERO {
            return Err(AccountError::InvalidAmount);
        }
        self.balance += amount;
        Ok(())
    }
}

/// Ledger account.
#[derive(Debug)]
pub struct Account {
    inner: Mutex<AccountData>,
}

impl Account {
    const DECIMAL_PRECISION: u32 = 2;

    pub fn new(account_id: AccountId, balance: Decimal) -> Self {
        Self {
            inner: Mutex::new(AccountData::new(account_id, balance)),
        }
    }

    pub fn id(&self) -> AccountId {
        self.inner.lock().account_id.clone()
    }

    pub fn balance(&self) -> Decimal {
        self.inner.lock().balance
    }

    /// Takes `amount` off the balance if the balance covers it.
    ///
    /// Never fails outright: a refused debit comes back with `success ==
    /// false` and the untouched balance.
    pub fn debit(&self, amount: Decimal) -> WithdrawResult {
        let mut data = self.inner.lock();
        match data.debit(amount) {
            Ok(()) => WithdrawResult {
                success: true,
                new_balance: data.balance,
            },
            Err(_) => WithdrawResult {
                success: false,
                new_balance: data.balance,
            },
        }
    }

    /// Adds `amount` to the balance and returns the new balance.
    ///
    /// # Errors
    ///
    /// [`AccountError::InvalidAmount`] if `amount` is not positive.
    pub fn credit(&self, amount: Decimal) -> Result<Decimal, AccountError> {
        let mut data = self.inner.lock();
        data.credit(amount)?;
        Ok(data.balance)
    }
}

impl Serialize for Account {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let data = self.inner.lock();
        let mut state = serializer.serialize_struct("Account", 2)?;
        state.serialize_field("account", &data.account_id)?;
        state.serialize_field(
            "balance",
            &data.balance.round_dp(Account::DECIMAL_PRECISION),
        )?;
        state.end()
    }
}

/// Formats a balance for display: thousands separators and exactly two
/// fractional digits (`#,##0.00`), rounding half to even.
///
/// ```
/// use atm_cash::format_balance;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_balance(dec!(2738.59)), "2,738.59");
/// assert_eq!(format_balance(dec!(23)), "23.00");
/// ```
pub fn format_balance(balance: Decimal) -> String {
    let rounded = balance.round_dp(Account::DECIMAL_PRECISION);
    let digits = format!("{:.2}", rounded.abs());
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded < Decimal::ZERO { "-" } else { "" };
    format!("{sign}{grouped}.{fraction}")
}
