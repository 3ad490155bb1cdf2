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

//! Versioned storage for inventory snapshots.
//!
//! Snapshots are never updated in place. A writer loads the latest snapshot,
//! derives the next one (version + 1), and hands it to
//! [`InventoryStore::compare_and_store`]. If someone else stored a snapshot
//! in between, the write is rejected and the writer starts over from the new
//! latest snapshot.

use crate::error::StoreError;
use crate::inventory::Inventory;
use parking_lot::RwLock;

/// Storage for inventory snapshots with optimistic concurrency.
pub trait InventoryStore: Send + Sync {
    /// Most recently stored snapshot, `None` before the first replenishment.
    fn latest(&self) -> Option<Inventory>;

    /// Stores `next` if its version directly follows the latest stored one.
    ///
    /// # Errors
    ///
    /// [`StoreError::VersionConflict`] if `next.version()` is not the latest
    /// version plus one (1 for an empty store).
    fn compare_and_store(&self, next: Inventory) -> Result<(), StoreError>;
}

/// Store that keeps every snapshot in memory, oldest first.
#[derive(Debug, Default)]
pub struct InMemoryInventoryStore {
    history: RwLock<Vec<Inventory>>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with one snapshot, stored as version 1.
    pub fn with_inventory(inventory: Inventory) -> Self {
        Self {
            history: RwLock::new(vec![inventory.with_version(1)]),
        }
    }

    /// All stored snapshots, oldest first.
    pub fn history(&self) -> Vec<Inventory> {
        self.history.read().clone()
    }

    pub fn len(&self) -> usize {
        self.history.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.read().is_empty()
    }
}

impl InventoryStore for InMemoryInventoryStore {
    fn latest(&self) -> Option<Inventory> {
        self.history.read().last().cloned()
    }

    fn compare_and_store(&self, next: Inventory) -> Result<(), StoreError> {
        let mut history = self.history.write();
        let expected = history.last().map_or(0, Inventory::version) + 1;
        if next.version() != expected {
            return Err(StoreError::VersionConflict {
                expected,
                found: next.version(),
            });
        }
        history.push(next);
        Ok(())
    }
}
