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

//! # ATM Cash
//!
//! This library models the cash-management core of an automated teller
//! machine: the note inventory, replenishment, and the selection of notes for
//! a withdrawal.
//!
//! ## Core Components
//!
//! - [`Engine`]: Replenishes the machine, dispenses withdrawals, looks up balances
//! - [`Inventory`]: Snapshot of note stacks with their derived cash value
//! - [`select_notes`]: The five-rule plus greedy note selection
//! - [`Ledger`] / [`InventoryStore`]: Collaborators for accounts and inventory storage
//! - [`DispenseError`]: Reasons a withdrawal is declined
//!
//! ## Example
//!
//! ```
//! use atm_cash::{AccountId, Denomination, Engine, Note};
//! use rust_decimal_macros::dec;
//!
//! let engine = Engine::default();
//! engine.ledger().open(AccountId::from("01001"), dec!(150));
//!
//! // Load the machine
//! let notes: Vec<Note> = [50, 50, 20, 20, 10, 10, 10, 10, 5, 5, 5, 5]
//!     .into_iter()
//!     .map(|v| Note::new(Denomination::from_value(v).unwrap()))
//!     .collect();
//! engine.replenish(&notes).unwrap();
//!
//! // Withdraw
//! let outcome = engine.dispense(&AccountId::from("01001"), dec!(100)).unwrap();
//! assert_eq!(outcome.to_string(), "50x1 20x2 5x2");
//! assert_eq!(engine.check_balance(&AccountId::from("01001")), "50.00");
//! ```
//!
//! ## Thread Safety
//!
//! The engine can be shared across threads. Inventory writes use optimistic
//! compare-and-store; accounts are locked per operation.

pub mod account;
mod base;
mod config;
mod dispense;
mod engine;
pub mod error;
mod inventory;
mod ledger;
mod store;

pub use account::{Account, WithdrawResult, format_balance};
pub use base::{AccountId, Denomination, Note, UnknownDenomination};
pub use config::MachineConfig;
pub use dispense::{DispenseOutcome, SelectionPolicy, select_notes, whole_amount};
pub use engine::{BALANCE_NOT_FOUND, Engine};
pub use error::{AccountError, DispenseError, FailureKind, StoreError};
pub use inventory::Inventory;
pub use ledger::{InMemoryLedger, Ledger};
pub use store::{InMemoryInventoryStore, InventoryStore};
