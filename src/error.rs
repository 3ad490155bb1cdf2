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

//! Error types for replenishment and dispensing.

use crate::base::Denomination;
use rust_decimal::Decimal;
use thiserror::Error;

/// Account ledger errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountError {
    /// Amount is zero or negative
    #[error("invalid amount (must be positive)")]
    InvalidAmount,

    /// Debit would exceed the balance
    #[error("insufficient funds")]
    InsufficientFunds,

    /// No account with the given identifier
    #[error("account not found")]
    AccountNotFound,
}

/// Inventory store errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Another writer stored a snapshot since this one was loaded
    #[error("inventory version conflict (expected {expected}, found {found})")]
    VersionConflict { expected: u64, found: u64 },
}

/// Withdrawal failures.
///
/// Every variant means the same thing to a customer: the transaction was
/// declined and no notes were handed out. [`DispenseError::kind`] groups the
/// variants for callers that need to tell them apart.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispenseError {
    /// Amount is negative or carries more than two fractional digits
    #[error("invalid amount (must be non-negative with at most two decimals)")]
    InvalidAmount,

    /// Amount is outside the window the machine pays out
    #[error("amount {amount} not in {min}-{max} range")]
    AmountOutOfRange { amount: u64, min: u64, max: u64 },

    /// Machine has never been replenished
    #[error("machine has no inventory")]
    NoInventory,

    /// Machine does not hold more cash than requested
    #[error("machine out of cash (holds {available}, requested {requested})")]
    InsufficientMachineCash { requested: u64, available: Decimal },

    /// Account lookup failed
    #[error("account not found")]
    AccountNotFound,

    /// Account balance does not exceed the requested amount
    #[error("insufficient account funds")]
    InsufficientAccountFunds,

    /// Ledger refused the debit after the balance check passed
    #[error("account debit refused")]
    DebitRefused,

    /// Note selection could not pay out the full amount
    #[error("could not dispense amount, {remaining} left over")]
    ResidualAmount { remaining: u64 },

    /// Committing the outcome would take more notes than the stack holds
    #[error("not enough {denomination} notes in stack")]
    NoteShortfall { denomination: Denomination },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Coarse failure classes of a withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Amount rejected before anything else was looked at
    Range,
    /// Machine cash or account funds do not cover the amount
    Availability,
    /// Ledger refused the debit
    Debit,
    /// Notes could not be selected or committed after the debit
    Residual,
}

impl DispenseError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidAmount | Self::AmountOutOfRange { .. } => FailureKind::Range,
            Self::NoInventory
            | Self::InsufficientMachineCash { .. }
            | Self::AccountNotFound
            | Self::InsufficientAccountFunds => FailureKind::Availability,
            Self::DebitRefused => FailureKind::Debit,
            Self::ResidualAmount { .. } | Self::NoteShortfall { .. } | Self::Store(_) => {
                FailureKind::Residual
            }
        }
    }
}
