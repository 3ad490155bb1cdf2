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

//! Core value types: account identifiers, note denominations, and notes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a customer account, e.g. `"01001"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(transparent)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Face value of a note the machine handles.
///
/// The set is closed. Ordering follows face value, so a `BTreeMap` keyed by
/// denomination iterates from the smallest note to the largest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Denomination {
    Five,
    Ten,
    Twenty,
    Fifty,
}

impl Denomination {
    /// All denominations in ascending face value.
    pub const ALL: [Denomination; 4] = [
        Denomination::Five,
        Denomination::Ten,
        Denomination::Twenty,
        Denomination::Fifty,
    ];

    pub const fn value(self) -> u64 {
        match self {
            Self::Five => 5,
            Self::Ten => 10,
            Self::Twenty => 20,
            Self::Fifty => 50,
        }
    }

    /// Looks a denomination up by face value. `None` if no note has that value.
    pub fn from_value(value: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.value() == value)
    }

    /// Denominations from the largest face value down.
    pub fn descending() -> impl Iterator<Item = Denomination> {
        Self::ALL.into_iter().rev()
    }

    /// Position of the denomination in [`Denomination::ALL`].
    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Five => 0,
            Self::Ten => 1,
            Self::Twenty => 2,
            Self::Fifty => 3,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Five => "five",
            Self::Ten => "ten",
            Self::Twenty => "twenty",
            Self::Fifty => "fifty",
        }
    }
}

impl fmt::Display for Denomination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Error returned when text names no known denomination.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown denomination: {0}")]
pub struct UnknownDenomination(pub String);

impl FromStr for Denomination {
    type Err = UnknownDenomination;

    /// Accepts either the face value (`"20"`) or the name (`"twenty"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(value) = trimmed.parse::<u64>() {
            return Self::from_value(value).ok_or_else(|| UnknownDenomination(s.to_string()));
        }
        Self::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownDenomination(s.to_string()))
    }
}

/// A single physical note fed into the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Note {
    pub denomination: Denomination,
}

impl Note {
    pub fn new(denomination: Denomination) -> Self {
        Self { denomination }
    }
}

impl From<Denomination> for Note {
    fn from(denomination: Denomination) -> Self {
        Self::new(denomination)
    }
}
