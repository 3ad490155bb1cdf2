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

//! Cash machine engine.
//!
//! The [`Engine`] ties the note inventory to the account ledger. It handles
//! replenishment, withdrawals, and balance lookups.
//!
//! # Withdrawal Flow
//!
//! 1. **Range**: the whole-unit amount must lie in the configured window.
//! 2. **Availability**: the machine must hold more cash than requested and
//!    the account balance must exceed the amount.
//! 3. **Debit**: the ledger debits the account.
//! 4. **Selection**: notes are picked from the inventory loaded before the
//!    debit.
//!
//! Steps 1-3 fail without side effects. A failure in step 4 happens after the
//! account was debited; see [`MachineConfig::compensate_failed_dispense`].
//!
//! # Thread Safety
//!
//! The engine holds no locks of its own. Inventory writes go through
//! [`InventoryStore::compare_and_store`] and are retried on conflict, and
//! each account is locked by the ledger for the length of a single debit.

use crate::account::format_balance;
use crate::base::{AccountId, Note};
use crate::config::MachineConfig;
use crate::dispense::{DispenseOutcome, select_notes, whole_amount};
use crate::error::{DispenseError, StoreError};
use crate::inventory::Inventory;
use crate::ledger::{InMemoryLedger, Ledger};
use crate::store::{InMemoryInventoryStore, InventoryStore};
use log::{debug, info, warn};
use rust_decimal::Decimal;

/// Returned by [`Engine::check_balance`] for unknown accounts.
pub const BALANCE_NOT_FOUND: &str = "NOT_FOUND";

/// Cash machine engine over an inventory store and an account ledger.
pub struct Engine<S = InMemoryInventoryStore, L = InMemoryLedger> {
    store: S,
    ledger: L,
    config: MachineConfig,
}

impl<S: InventoryStore, L: Ledger> Engine<S, L> {
    /// Creates an engine with the default configuration.
    pub fn new(store: S, ledger: L) -> Self {
        Self::with_config(store, ledger, MachineConfig::default())
    }

    pub fn with_config(store: S, ledger: L, config: MachineConfig) -> Self {
        Engine {
            store,
            ledger,
            config,
        }
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Latest stored inventory, `None` before the first replenishment.
    pub fn inventory(&self) -> Option<Inventory> {
        self.store.latest()
    }

    /// Adds deposited notes to the machine and returns the stored snapshot.
    ///
    /// Starts from an empty machine if nothing was stored yet. An empty
    /// `notes` slice still stores a freshly stamped snapshot.
    ///
    /// # Errors
    ///
    /// [`StoreError::VersionConflict`] if concurrent writers kept winning
    /// for more than [`MachineConfig::max_store_retries`] attempts.
    pub fn replenish(&self, notes: &[Note]) -> Result<Inventory, StoreError> {
        let mut retries = 0;
        loop {
            let current = self.store.latest();
            let next = Inventory::replenish(current.as_ref(), notes);

            match self.store.compare_and_store(next.clone()) {
                Ok(()) => {
                    info!(
                        "Replenished {} notes; total={}, version={}",
                        notes.len(),
                        next.total_value(),
                        next.version()
                    );
                    return Ok(next);
                }
                Err(err) if retries < self.config.max_store_retries => {
                    retries += 1;
                    warn!("Replenish retry {}: {}", retries, err);
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Withdraws `amount` from an account and returns the notes to hand out.
    ///
    /// Only the whole-unit part of `amount` is paid out in notes. The ledger
    /// is debited with `amount` as given.
    ///
    /// # Errors
    ///
    /// - [`DispenseError::InvalidAmount`] - Negative or sub-cent amount.
    /// - [`DispenseError::AmountOutOfRange`] - Outside the configured window.
    /// - [`DispenseError::NoInventory`] - Machine was never replenished.
    /// - [`DispenseError::InsufficientMachineCash`] - Machine cash does not exceed the amount.
    /// - [`DispenseError::AccountNotFound`] - Unknown account.
    /// - [`DispenseError::InsufficientAccountFunds`] - Balance does not exceed the amount.
    /// - [`DispenseError::DebitRefused`] - Ledger refused the debit.
    /// - [`DispenseError::ResidualAmount`] - Notes could not make up the amount.
    /// - [`DispenseError::NoteShortfall`] / [`DispenseError::Store`] - Committing
    ///   the dispensed notes failed.
    ///
    /// The last three happen after the debit.
    pub fn dispense(
        &self,
        account_id: &AccountId,
        amount: Decimal,
    ) -> Result<DispenseOutcome, DispenseError> {
        let whole = whole_amount(amount)?;
        if !self.config.in_range(whole) {
            return Err(DispenseError::AmountOutOfRange {
                amount: whole,
                min: self.config.min_amount,
                max: self.config.max_amount,
            });
        }

        let inventory = self.store.latest();
        let balance = self.ledger.balance(account_id);
        let inventory = check_availability(whole, inventory, balance)?;

        let debit = self
            .ledger
            .debit(account_id, amount)
            .ok_or(DispenseError::AccountNotFound)?;
        if !debit.success {
            warn!(
                "Debit of {} refused for account {}; balance={}",
                amount, account_id, debit.new_balance
            );
            return Err(DispenseError::DebitRefused);
        }
        debug!(
            "Debited {} from account {}; balance={}",
            amount, account_id, debit.new_balance
        );

        match self.settle(whole, inventory) {
            Ok(outcome) => {
                info!("Dispensed {} to account {}: {}", whole, account_id, outcome);
                Ok(outcome)
            }
            Err(err) => {
                if self.config.compensate_failed_dispense {
                    self.refund(account_id, amount);
                } else {
                    warn!(
                        "Dispense failed after debit; account {} stays debited by {}: {}",
                        account_id, amount, err
                    );
                }
                Err(err)
            }
        }
    }

    /// Formatted balance of an account, or [`BALANCE_NOT_FOUND`].
    pub fn check_balance(&self, account_id: &AccountId) -> String {
        self.ledger
            .balance(account_id)
            .map(format_balance)
            .unwrap_or_else(|| BALANCE_NOT_FOUND.to_string())
    }

    /// Selects notes and, if configured, stores the reduced inventory.
    fn settle(
        &self,
        amount: u64,
        mut inventory: Inventory,
    ) -> Result<DispenseOutcome, DispenseError> {
        let mut retries = 0;
        loop {
            let outcome = select_notes(amount, &inventory, &self.config.selection)?;
            if !self.config.commit_dispensed_notes {
                return Ok(outcome);
            }

            let next = inventory.after_dispensing(&outcome)?;
            match self.store.compare_and_store(next) {
                Ok(()) => return Ok(outcome),
                Err(err) if retries < self.config.max_store_retries => {
                    retries += 1;
                    warn!("Dispense commit retry {}: {}", retries, err);
                    // Selection restarts from the snapshot that won.
                    let latest = self.store.latest().ok_or(DispenseError::NoInventory)?;
                    inventory = check_machine_cash(amount, latest)?;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    fn refund(&self, account_id: &AccountId, amount: Decimal) {
        match self.ledger.credit(account_id, amount) {
            Ok(balance) => info!(
                "Credited {} back to account {}; balance={}",
                amount, account_id, balance
            ),
            Err(err) => warn!(
                "Credit-back of {} to account {} failed: {}",
                amount, account_id, err
            ),
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(InMemoryInventoryStore::new(), InMemoryLedger::new())
    }
}

/// Machine cash and account funds must both strictly exceed the amount.
///
/// Account funds are compared on their whole-unit part.
fn check_availability(
    amount: u64,
    inventory: Option<Inventory>,
    balance: Option<Decimal>,
) -> Result<Inventory, DispenseError> {
    let inventory = check_machine_cash(amount, inventory.ok_or(DispenseError::NoInventory)?)?;
    let balance = balance.ok_or(DispenseError::AccountNotFound)?;
    if balance.trunc() <= Decimal::from(amount) {
        return Err(DispenseError::InsufficientAccountFunds);
    }
    Ok(inventory)
}

fn check_machine_cash(amount: u64, inventory: Inventory) -> Result<Inventory, DispenseError> {
    if inventory.total_value() <= Decimal::from(amount) {
        return Err(DispenseError::InsufficientMachineCash {
            requested: amount,
            available: inventory.total_value(),
        });
    }
    Ok(inventory)
}
