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

//! Note selection for withdrawals.
//!
//! Selection runs in two steps against a read-only [`Inventory`]:
//!
//! 1. **Five-rule**: if the machine holds any five-notes, hand out one or two
//!    of them first. Two when `remaining / 5` is even, one when it is odd.
//! 2. **Greedy descent**: for 50, 20, 10 and 5, take `remaining / value`
//!    notes if the stack holds that many, otherwise skip the denomination.
//!
//! Whatever is left after the descent must be zero, otherwise the whole
//! selection fails.
//!
//! # Example
//!
//! ```
//! use atm_cash::{select_notes, Denomination, Inventory, SelectionPolicy};
//!
//! let inventory = Inventory::new(4, 4, 2, 2);
//! let outcome = select_notes(100, &inventory, &SelectionPolicy::default()).unwrap();
//! assert_eq!(outcome.count(Denomination::Five), 2);
//! assert_eq!(outcome.count(Denomination::Twenty), 2);
//! assert_eq!(outcome.count(Denomination::Fifty), 1);
//! ```

use crate::base::Denomination;
use crate::error::DispenseError;
use crate::inventory::Inventory;
use log::debug;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Notes handed out for one withdrawal.
///
/// Only denominations that were actually used appear.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DispenseOutcome {
    notes: BTreeMap<Denomination, u64>,
}

impl DispenseOutcome {
    /// Adds `count` notes of `denomination`. Zero counts are not recorded.
    pub fn add(&mut self, denomination: Denomination, count: u64) {
        if count > 0 {
            *self.notes.entry(denomination).or_insert(0) += count;
        }
    }

    /// Number of notes of `denomination`, 0 if none were selected.
    pub fn count(&self, denomination: Denomination) -> u64 {
        self.notes.get(&denomination).copied().unwrap_or(0)
    }

    /// Selected denominations and counts, largest face value first.
    pub fn iter(&self) -> impl Iterator<Item = (Denomination, u64)> + '_ {
        self.notes.iter().rev().map(|(d, c)| (*d, *c))
    }

    pub fn denominations(&self) -> impl Iterator<Item = Denomination> + '_ {
        self.notes.keys().rev().copied()
    }

    pub fn note_count(&self) -> u64 {
        self.notes.values().sum()
    }

    pub fn total_value(&self) -> u64 {
        self.iter().map(|(d, c)| d.value() * c).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

impl fmt::Display for DispenseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (denomination, count) in self.iter() {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{}x{}", denomination, count)?;
            first = false;
        }
        Ok(())
    }
}

/// Knobs that change how notes are selected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionPolicy {
    /// Check the five-stack before the five-rule hands out notes, and count
    /// those notes against the stack during the descent.
    ///
    /// Off by default: the five-rule only requires a non-empty stack.
    pub strict_five_stock: bool,
}

/// Validates a requested amount and returns its whole-unit part.
///
/// The fraction is discarded, not rounded.
///
/// # Errors
///
/// [`DispenseError::InvalidAmount`] for negative amounts, amounts with more
/// than two fractional digits, or amounts too large for `u64`.
pub fn whole_amount(amount: Decimal) -> Result<u64, DispenseError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(DispenseError::InvalidAmount);
    }
    if amount.normalize().scale() > 2 {
        return Err(DispenseError::InvalidAmount);
    }
    amount.trunc().to_u64().ok_or(DispenseError::InvalidAmount)
}

/// Picks the notes that pay out `amount` from `inventory`.
///
/// The inventory is only read. Nothing is reserved or removed.
///
/// # Errors
///
/// [`DispenseError::ResidualAmount`] when the stacks cannot make up the full
/// amount along the five-rule and greedy path.
pub fn select_notes(
    amount: u64,
    inventory: &Inventory,
    policy: &SelectionPolicy,
) -> Result<DispenseOutcome, DispenseError> {
    let mut outcome = DispenseOutcome::default();
    let mut remaining = amount;

    let fives = inventory.stack_for(Denomination::Five);
    if fives > 0 {
        let take = if (remaining / 5) % 2 == 0 { 2 } else { 1 };
        let covered = !policy.strict_five_stock || fives >= take;
        if covered && remaining >= take * Denomination::Five.value() {
            remaining -= take * Denomination::Five.value();
            outcome.add(Denomination::Five, take);
        }
    }

    for denomination in Denomination::descending() {
        let value = denomination.value();
        if remaining < value {
            continue;
        }
        let count = remaining / value;
        let already_taken = if policy.strict_five_stock {
            outcome.count(denomination)
        } else {
            0
        };
        if inventory.stack_for(denomination) >= already_taken + count {
            remaining -= count * value;
            outcome.add(denomination, count);
        }
    }

    if remaining != 0 {
        debug!(
            "Selection failed; amount={}, remaining={}, selected={:?}",
            amount,
            remaining,
            outcome.denominations().collect::<Vec<_>>()
        );
        return Err(DispenseError::ResidualAmount { remaining });
    }

    Ok(outcome)
}
