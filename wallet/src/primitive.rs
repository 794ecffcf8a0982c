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

//! Chain-time and identity primitives shared by both wallet cores.

#[cfg(feature = "proptest")]
use proptest_derive::Arbitrary;
use rand::{Rng, distributions::Standard, prelude::Distribution};
use serde::de::Visitor;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Debug, Display, Formatter};
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};

/// A discrete chain-time coordinate.
///
/// Slots are totally ordered; [`Slot::MIN`] (also the `Default`) is the time
/// before anything was observed.
#[derive(
    Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
#[cfg_attr(feature = "proptest", derive(Arbitrary))]
pub struct Slot(u64);

impl Slot {
    /// The earliest representable slot.
    pub const MIN: Slot = Slot(0);
    /// The latest representable slot.
    pub const MAX: Slot = Slot(u64::MAX);

    pub const fn from_number(number: u64) -> Slot {
        Slot(number)
    }

    pub const fn into_number(self) -> u64 {
        self.0
    }
}

impl Debug for Slot {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Slot({})", self.0)
    }
}

impl Display for Slot {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Distribution<Slot> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Slot {
        Slot(self.sample(rng))
    }
}

/// A measure of serialized transaction space.
///
/// Sizes form an additive monoid; what one unit means is decided by the
/// [`crate::selection::SelectionParameters`] in play, which lets tests
/// substitute toy measures.
#[derive(
    Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
#[cfg_attr(feature = "proptest", derive(Arbitrary))]
pub struct Size(u64);

impl Size {
    pub const ZERO: Size = Size(0);
    pub const MAX: Size = Size(u64::MAX);

    pub const fn from_units(units: u64) -> Size {
        Size(units)
    }

    pub const fn into_units(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// The absolute difference `|a - b|`.
    pub fn distance(self, other: Size) -> Size {
        Size(self.0.abs_diff(other.0))
    }
}

impl Debug for Size {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Size({})", self.0)
    }
}

impl Display for Size {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Size {
    type Output = Size;
    fn add(self, rhs: Self) -> Self::Output {
        Size(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Size {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// Saturating: `a - b` is zero whenever `b >= a`.
impl Sub for Size {
    type Output = Size;
    fn sub(self, rhs: Self) -> Self::Output {
        Size(self.0.saturating_sub(rhs.0))
    }
}

impl Mul<u64> for Size {
    type Output = Size;
    fn mul(self, rhs: u64) -> Self::Output {
        Size(self.0.saturating_mul(rhs))
    }
}

impl Sum for Size {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Size::ZERO, |a, b| a + b)
    }
}

impl Distribution<Size> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Size {
        Size(self.sample(rng))
    }
}

/// The number of bytes in a transaction identifier.
pub const TX_ID_BYTES: usize = 32;

/// An opaque transaction identifier.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "proptest", derive(Arbitrary))]
pub struct TxId(pub [u8; TX_ID_BYTES]);

impl TxId {
    pub const fn from_bytes(bytes: [u8; TX_ID_BYTES]) -> TxId {
        TxId(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; TX_ID_BYTES] {
        &self.0
    }
}

impl Debug for TxId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({})", hex::encode(self.0))
    }
}

impl Display for TxId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl Distribution<TxId> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> TxId {
        TxId(rng.r#gen())
    }
}

// Hex-encoded, so identifiers can key maps in self-describing formats.
impl Serialize for TxId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for TxId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<TxId, D::Error> {
        struct TxIdVisitor;

        impl Visitor<'_> for TxIdVisitor {
            type Value = TxId;

            fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
                write!(f, "a {}-byte hex-encoded transaction id", TX_ID_BYTES)
            }

            fn visit_str<E: serde::de::Error>(self, value: &str) -> Result<TxId, E> {
                let mut bytes = [0u8; TX_ID_BYTES];
                hex::decode_to_slice(value, &mut bytes)
                    .map_err(|_| E::custom("malformed transaction id"))?;
                Ok(TxId(bytes))
            }
        }

        deserializer.deserialize_str(TxIdVisitor)
    }
}

/// Anything with a transaction identity.
///
/// The submission store is generic over the transaction representation; all
/// it ever consumes is the identity.
pub trait HasTxId {
    fn tx_id(&self) -> TxId;
}

impl HasTxId for TxId {
    fn tx_id(&self) -> TxId {
        *self
    }
}
