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

//! Multi-asset identifiers and quantity maps.
//!
//! A [`TokenMap`] never stores a zero quantity: every constructor and every
//! arithmetic operation normalizes its result, so two maps are equal exactly
//! when they describe the same holdings.

use crate::coin::TokenQuantity;
#[cfg(feature = "proptest")]
use proptest::prelude::{Arbitrary, BoxedStrategy, Strategy, any};
#[cfg(feature = "proptest")]
use proptest_derive::Arbitrary;
use rand::{Rng, distributions::Standard, prelude::Distribution};
use serde::de::{SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{self, Debug, Display, Formatter};
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// The number of bytes in a minting-policy identifier.
pub const POLICY_ID_BYTES: usize = 28;

/// The longest permitted asset name, in bytes.
pub const ASSET_NAME_MAX_BYTES: usize = 32;

/// Identifies the minting policy an asset was issued under.
#[derive(
    Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[cfg_attr(feature = "proptest", derive(Arbitrary))]
pub struct PolicyId(pub [u8; POLICY_ID_BYTES]);

impl Debug for PolicyId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "PolicyId({})", hex::encode(self.0))
    }
}

impl Distribution<PolicyId> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PolicyId {
        PolicyId(rng.r#gen())
    }
}

/// The within-policy name of an asset, at most [`ASSET_NAME_MAX_BYTES`] long.
#[derive(
    Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "Vec<u8>")]
pub struct AssetName(Vec<u8>);

/// Rejection of an asset name longer than [`ASSET_NAME_MAX_BYTES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetNameTooLong(pub usize);

impl Display for AssetNameTooLong {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "asset name of {} bytes exceeds the limit of {ASSET_NAME_MAX_BYTES}",
            self.0
        )
    }
}

impl Error for AssetNameTooLong {}

impl AssetName {
    pub fn new(bytes: Vec<u8>) -> Result<AssetName, AssetNameTooLong> {
        if bytes.len() > ASSET_NAME_MAX_BYTES {
            Err(AssetNameTooLong(bytes.len()))
        } else {
            Ok(AssetName(bytes))
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<Vec<u8>> for AssetName {
    type Error = AssetNameTooLong;
    fn try_from(bytes: Vec<u8>) -> Result<AssetName, AssetNameTooLong> {
        AssetName::new(bytes)
    }
}

impl Debug for AssetName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "AssetName({})", hex::encode(&self.0))
    }
}

impl Distribution<AssetName> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> AssetName {
        let len = rng.gen_range(0..=8);
        AssetName((0..len).map(|_| rng.r#gen()).collect())
    }
}

#[cfg(feature = "proptest")]
impl Arbitrary for AssetName {
    type Parameters = ();
    type Strategy = BoxedStrategy<AssetName>;

    fn arbitrary_with(_: ()) -> Self::Strategy {
        proptest::collection::vec(any::<u8>(), 0..=ASSET_NAME_MAX_BYTES)
            .prop_map(AssetName)
            .boxed()
    }
}

/// A fully-qualified asset identifier, ordered by policy then name.
#[derive(
    Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug, Serialize, Deserialize,
)]
#[cfg_attr(feature = "proptest", derive(Arbitrary))]
pub struct AssetId {
    pub policy: PolicyId,
    pub name: AssetName,
}

impl AssetId {
    pub fn new(policy: PolicyId, name: AssetName) -> AssetId {
        AssetId { policy, name }
    }
}

impl Distribution<AssetId> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> AssetId {
        AssetId {
            policy: rng.r#gen(),
            name: rng.r#gen(),
        }
    }
}

/// A finite mapping from assets to positive quantities.
#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct TokenMap(BTreeMap<AssetId, TokenQuantity>);

impl TokenMap {
    /// The empty holding.
    pub fn empty() -> TokenMap {
        TokenMap(BTreeMap::new())
    }

    /// A holding of a single asset. Zero quantities yield the empty map.
    pub fn singleton(asset: AssetId, quantity: TokenQuantity) -> TokenMap {
        let mut map = TokenMap::empty();
        map.set_quantity(asset, quantity);
        map
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The number of distinct assets held.
    pub fn asset_count(&self) -> usize {
        self.0.len()
    }

    /// The held quantity of `asset`; zero when absent.
    pub fn quantity(&self, asset: &AssetId) -> TokenQuantity {
        self.0.get(asset).copied().unwrap_or(TokenQuantity::ZERO)
    }

    /// Overwrites the quantity of `asset`, removing the entry on zero.
    pub fn set_quantity(&mut self, asset: AssetId, quantity: TokenQuantity) {
        if quantity.is_zero() {
            self.0.remove(&asset);
        } else {
            self.0.insert(asset, quantity);
        }
    }

    /// The largest single quantity held, zero for the empty map.
    pub fn largest_quantity(&self) -> TokenQuantity {
        self.0.values().copied().max().unwrap_or(TokenQuantity::ZERO)
    }

    /// Entries in `AssetId` order.
    pub fn iter(&self) -> impl Iterator<Item = (&AssetId, TokenQuantity)> {
        self.0.iter().map(|(asset, quantity)| (asset, *quantity))
    }

    /// Held assets in `AssetId` order.
    pub fn assets(&self) -> impl Iterator<Item = &AssetId> {
        self.0.keys()
    }

    /// Componentwise saturating subtraction; quantities never go below zero
    /// and exhausted assets are removed.
    pub fn difference(&self, other: &TokenMap) -> TokenMap {
        let mut result = self.clone();
        for (asset, quantity) in other.iter() {
            let remaining = result.quantity(asset) - quantity;
            result.set_quantity(asset.clone(), remaining);
        }
        result
    }

    /// Whether every quantity in `other` is covered by this map.
    pub fn contains(&self, other: &TokenMap) -> bool {
        other
            .iter()
            .all(|(asset, quantity)| self.quantity(asset) >= quantity)
    }
}

impl Add<&TokenMap> for TokenMap {
    type Output = TokenMap;
    fn add(mut self, rhs: &TokenMap) -> Self::Output {
        for (asset, quantity) in rhs.iter() {
            let total = self.quantity(asset) + quantity;
            self.set_quantity(asset.clone(), total);
        }
        self
    }
}

impl Add for TokenMap {
    type Output = TokenMap;
    fn add(self, rhs: Self) -> Self::Output {
        self + &rhs
    }
}

impl AddAssign<&TokenMap> for TokenMap {
    fn add_assign(&mut self, rhs: &TokenMap) {
        let lhs = std::mem::take(self);
        *self = lhs + rhs;
    }
}

impl Sum for TokenMap {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(TokenMap::empty(), |a, b| a + &b)
    }
}

impl FromIterator<(AssetId, TokenQuantity)> for TokenMap {
    fn from_iter<I: IntoIterator<Item = (AssetId, TokenQuantity)>>(iter: I) -> Self {
        let mut map = TokenMap::empty();
        for (asset, quantity) in iter {
            let total = map.quantity(&asset) + quantity;
            map.set_quantity(asset, total);
        }
        map
    }
}

// Serialized as a sequence of pairs: asset identifiers are structured data
// and cannot act as keys in self-describing formats.
impl Serialize for TokenMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for (asset, quantity) in self.iter() {
            seq.serialize_element(&(asset, quantity))?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for TokenMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<TokenMap, D::Error> {
        struct TokenMapVisitor;

        impl<'de> Visitor<'de> for TokenMapVisitor {
            type Value = TokenMap;

            fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
                f.write_str("a sequence of (asset, quantity) pairs")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<TokenMap, A::Error> {
                let mut map = TokenMap::empty();
                while let Some((asset, quantity)) =
                    seq.next_element::<(AssetId, TokenQuantity)>()?
                {
                    let total = map.quantity(&asset) + quantity;
                    map.set_quantity(asset, total);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_seq(TokenMapVisitor)
    }
}
