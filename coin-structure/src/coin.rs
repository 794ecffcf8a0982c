// This file is part of eventide-wallet.
// Copyright (C) 2025 Eventide Foundation
// SPDX-License-Identifier: Apache-2.0
// Licensed under the Apache License, Version 2.0 (the "License");
// You may not use this file except in compliance with the License.
// You may obtain a copy of the License at
// http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The native coin and per-asset quantity scalars.

#[cfg(feature = "proptest")]
use proptest_derive::Arbitrary;
use rand::{Rng, distributions::Standard, prelude::Distribution};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug, Display, Formatter};
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};

/// An amount of the native coin, in indivisible atoms.
///
/// Addition and subtraction saturate; the arithmetic never leaves the
/// non-negative range.
#[derive(
    Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
#[cfg_attr(feature = "proptest", derive(Arbitrary))]
pub struct Coin(u64);

impl Coin {
    /// No coins at all.
    pub const ZERO: Coin = Coin(0);
    /// The largest representable amount.
    pub const MAX: Coin = Coin(u64::MAX);

    /// Wraps a raw atom count.
    pub const fn from_atoms(atoms: u64) -> Coin {
        Coin(atoms)
    }

    /// The raw atom count.
    pub const fn into_atoms(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// The absolute difference `|a - b|`.
    pub fn distance(self, other: Coin) -> Coin {
        Coin(self.0.abs_diff(other.0))
    }

    /// Subtraction that reports underflow instead of saturating.
    pub fn checked_sub(self, rhs: Coin) -> Option<Coin> {
        self.0.checked_sub(rhs.0).map(Coin)
    }
}

impl Debug for Coin {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Coin({})", self.0)
    }
}

impl Display for Coin {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Coin {
    type Output = Coin;
    fn add(self, rhs: Self) -> Self::Output {
        Coin(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Coin {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// Saturating: `a - b` is zero whenever `b >= a`.
impl Sub for Coin {
    type Output = Coin;
    fn sub(self, rhs: Self) -> Self::Output {
        Coin(self.0.saturating_sub(rhs.0))
    }
}

impl Mul<u64> for Coin {
    type Output = Coin;
    fn mul(self, rhs: u64) -> Self::Output {
        Coin(self.0.saturating_mul(rhs))
    }
}

impl Sum for Coin {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Coin::ZERO, |a, b| a + b)
    }
}

impl Distribution<Coin> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Coin {
        Coin(self.sample(rng))
    }
}

/// A quantity of a single non-native asset.
///
/// Shares the saturating arithmetic of [`Coin`]; quantities are always
/// non-negative, and a quantity of zero is never stored in a token map.
#[derive(
    Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
#[cfg_attr(feature = "proptest", derive(Arbitrary))]
pub struct TokenQuantity(u64);

impl TokenQuantity {
    pub const ZERO: TokenQuantity = TokenQuantity(0);
    pub const MAX: TokenQuantity = TokenQuantity(u64::MAX);

    pub const fn from_units(units: u64) -> TokenQuantity {
        TokenQuantity(units)
    }

    pub const fn into_units(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// The absolute difference `|a - b|`.
    pub fn distance(self, other: TokenQuantity) -> TokenQuantity {
        TokenQuantity(self.0.abs_diff(other.0))
    }

    /// The smaller of the two quantities.
    pub fn min(self, other: TokenQuantity) -> TokenQuantity {
        TokenQuantity(self.0.min(other.0))
    }
}

impl Debug for TokenQuantity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "TokenQuantity({})", self.0)
    }
}

impl Display for TokenQuantity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for TokenQuantity {
    type Output = TokenQuantity;
    fn add(self, rhs: Self) -> Self::Output {
        TokenQuantity(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for TokenQuantity {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// Saturating: `a - b` is zero whenever `b >= a`.
impl Sub for TokenQuantity {
    type Output = TokenQuantity;
    fn sub(self, rhs: Self) -> Self::Output {
        TokenQuantity(self.0.saturating_sub(rhs.0))
    }
}

impl Sum for TokenQuantity {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(TokenQuantity::ZERO, |a, b| a + b)
    }
}

impl Distribution<TokenQuantity> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> TokenQuantity {
        TokenQuantity(self.sample(rng))
    }
}
