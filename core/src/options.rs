/*
 * options.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Corriere, a generic typed JSON-over-HTTP client.
 *
 * Corriere is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Corriere is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Corriere.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Client option flags: a small set of independent booleans with union and membership.

use std::ops::{BitOr, BitOrAssign};

/// Option flags for a [`Client`](crate::client::Client). The empty set is the
/// safe default; flags compose with `|`.
///
/// Options are read at construction and fixed for the client's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ClientOptions {
    bits: u32,
}

impl ClientOptions {
    /// Accept an otherwise-untrusted (e.g. self-signed) server certificate chain
    /// and proceed with the connection using that chain's credentials.
    pub const ALLOW_SELF_SIGNED_CERTIFICATES: ClientOptions = ClientOptions { bits: 1 };

    /// The empty set: no self-signed acceptance, default validation everywhere.
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    pub const fn is_empty(self) -> bool {
        self.bits == 0
    }

    /// Set union.
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    /// True if every flag in `other` is also set in `self`.
    pub const fn contains(self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }
}

impl BitOr for ClientOptions {
    type Output = ClientOptions;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for ClientOptions {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_empty() {
        let options = ClientOptions::default();
        assert!(options.is_empty());
        assert!(!options.contains(ClientOptions::ALLOW_SELF_SIGNED_CERTIFICATES));
    }

    #[test]
    fn union_and_membership() {
        let options = ClientOptions::empty() | ClientOptions::ALLOW_SELF_SIGNED_CERTIFICATES;
        assert!(options.contains(ClientOptions::ALLOW_SELF_SIGNED_CERTIFICATES));
        assert!(options.contains(ClientOptions::empty()));
        assert!(!options.is_empty());
    }

    #[test]
    fn union_is_idempotent() {
        let mut options = ClientOptions::ALLOW_SELF_SIGNED_CERTIFICATES;
        options |= ClientOptions::ALLOW_SELF_SIGNED_CERTIFICATES;
        assert_eq!(options, ClientOptions::ALLOW_SELF_SIGNED_CERTIFICATES);
    }
}
