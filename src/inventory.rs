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

//! Machine note inventory.
//!
//! An [`Inventory`] is an immutable snapshot: note stacks per denomination,
//! the cash value they add up to, when the snapshot was taken, and its
//! version in the store. Every change produces a new snapshot.
//!
//! # Example
//!
//! ```
//! use atm_cash::{Denomination, Inventory, Note};
//! use rust_decimal_macros::dec;
//!
//! let notes = [Note::new(Denomination::Ten), Note::new(Denomination::Fifty)];
//! let inventory = Inventory::replenish(None, &notes);
//! assert_eq!(inventory.stack_for(Denomination::Ten), 1);
//! assert_eq!(inventory.total_value(), dec!(60));
//! ```

use crate::base::{Denomination, Note};
use crate::dispense::DispenseOutcome;
use crate::error::DispenseError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeStruct, Serializer};

/// Snapshot of the note stacks held by the machine.
///
/// # Invariants
///
/// - `total_value` equals the sum of stack count times face value. It is
///   computed in the constructor and never set on its own.
/// - `version` is 0 for a snapshot that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inventory {
    /// Note counts indexed by [`Denomination::index`].
    stacks: [u64; 4],
    total_value: Decimal,
    changed_at: DateTime<Utc>,
    version: u64,
}

impl Inventory {
    /// Builds an unversioned snapshot stamped with the current time.
    pub fn new(five: u64, ten: u64, twenty: u64, fifty: u64) -> Self {
        Self::from_stacks([five, ten, twenty, fifty], 0)
    }

    /// All stacks empty, nothing stored yet.
    pub fn empty() -> Self {
        Self::new(0, 0, 0, 0)
    }

    fn from_stacks(stacks: [u64; 4], version: u64) -> Self {
        let total_value = Denomination::ALL
            .into_iter()
            .map(|d| Decimal::from(stacks[d.index()]) * Decimal::from(d.value()))
            .sum();
        Self {
            stacks,
            total_value,
            changed_at: Utc::now(),
            version,
        }
    }

    /// Returns a copy carrying the given store version.
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    pub fn stack_for(&self, denomination: Denomination) -> u64 {
        self.stacks[denomination.index()]
    }

    pub fn total_value(&self) -> Decimal {
        self.total_value
    }

    pub fn changed_at(&self) -> DateTime<Utc> {
        self.changed_at
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Merges deposited notes into `current`, or into an empty machine when
    /// there is no current snapshot.
    ///
    /// The result is stamped now and versioned one past its base, even when
    /// `notes` is empty.
    pub fn replenish(current: Option<&Inventory>, notes: &[Note]) -> Inventory {
        let base = current.cloned().unwrap_or_else(Inventory::empty);

        // Count deposited notes per denomination
        let mut deposited = [0u64; 4];
        for note in notes {
            deposited[note.denomination.index()] += 1;
        }

        let mut stacks = base.stacks;
        for d in Denomination::ALL {
            stacks[d.index()] += deposited[d.index()];
        }

        Self::from_stacks(stacks, base.version + 1)
    }

    /// Removes the notes in `outcome` from the stacks.
    ///
    /// # Errors
    ///
    /// [`DispenseError::NoteShortfall`] if a stack holds fewer notes than the
    /// outcome takes from it.
    pub fn after_dispensing(&self, outcome: &DispenseOutcome) -> Result<Inventory, DispenseError> {
        let mut stacks = self.stacks;
        for (denomination, count) in outcome.iter() {
            let stack = &mut stacks[denomination.index()];
            *stack = stack
                .checked_sub(count)
                .ok_or(DispenseError::NoteShortfall { denomination })?;
        }
        Ok(Self::from_stacks(stacks, self.version + 1))
    }
}

impl Serialize for Inventory {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Inventory", 7)?;
        state.serialize_field("five", &self.stack_for(Denomination::Five))?;
        state.serialize_field("ten", &self.stack_for(Denomination::Ten))?;
        state.serialize_field("twenty", &self.stack_for(Denomination::Twenty))?;
        state.serialize_field("fifty", &self.stack_for(Denomination::Fifty))?;
        state.serialize_field("total", &self.total_value)?;
        state.serialize_field("changed_at", &self.changed_at)?;
        state.serialize_field("version", &self.version)?;
        state.end()
    }
}
