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

//! Machine configuration.
//!
//! The defaults reproduce the classic machine behaviour: a 20-250 payout
//! window, a five-rule that only looks at whether the five-stack is empty,
//! no write-back of dispensed notes, and no credit-back when notes cannot be
//! selected after the account was debited.

use crate::dispense::SelectionPolicy;
use serde::{Deserialize, Serialize};

/// Operating parameters of an [`Engine`](crate::Engine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Smallest amount paid out, inclusive.
    pub min_amount: u64,
    /// Largest amount paid out, inclusive.
    pub max_amount: u64,
    pub selection: SelectionPolicy,
    /// Store the inventory minus the dispensed notes after a successful
    /// withdrawal.
    pub commit_dispensed_notes: bool,
    /// Credit the debited amount back when a withdrawal fails after the
    /// debit.
    pub compensate_failed_dispense: bool,
    /// Attempts at a compare-and-store before giving up on a version conflict.
    pub max_store_retries: u32,
}

impl MachineConfig {
    pub const DEFAULT_MIN_AMOUNT: u64 = 20;
    pub const DEFAULT_MAX_AMOUNT: u64 = 250;
    pub const DEFAULT_STORE_RETRIES: u32 = 8;

    pub fn in_range(&self, amount: u64) -> bool {
        amount >= self.min_amount && amount <= self.max_amount
    }
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            min_amount: Self::DEFAULT_MIN_AMOUNT,
            max_amount: Self::DEFAULT_MAX_AMOUNT,
            selection: SelectionPolicy::default(),
            commit_dispensed_notes: false,
            compensate_failed_dispense: false,
            max_store_retries: Self::DEFAULT_STORE_RETRIES,
        }
    }
}
