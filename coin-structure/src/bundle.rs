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

//! The full value carried by an input or output: native coin plus tokens.

use crate::coin::Coin;
use crate::token::TokenMap;
#[cfg(feature = "proptest")]
use proptest_derive::Arbitrary;
use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// A coin amount together with a multi-asset holding.
///
/// Bundles form a monoid componentwise: coins add saturating, token maps add
/// per asset.
#[derive(Clone, PartialEq, Eq, Default, Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "proptest", derive(Arbitrary))]
pub struct TokenBundle {
    pub coin: Coin,
    pub tokens: TokenMap,
}

impl TokenBundle {
    pub fn new(coin: Coin, tokens: TokenMap) -> TokenBundle {
        TokenBundle { coin, tokens }
    }

    /// A bundle holding only the native coin.
    pub fn from_coin(coin: Coin) -> TokenBundle {
        TokenBundle {
            coin,
            tokens: TokenMap::empty(),
        }
    }

    /// A bundle holding only tokens.
    pub fn from_tokens(tokens: TokenMap) -> TokenBundle {
        TokenBundle {
            coin: Coin::ZERO,
            tokens,
        }
    }

    /// The same holding with the coin field replaced.
    pub fn with_coin(&self, coin: Coin) -> TokenBundle {
        TokenBundle {
            coin,
            tokens: self.tokens.clone(),
        }
    }

    /// True when the bundle carries no value at all.
    pub fn is_empty(&self) -> bool {
        self.coin.is_zero() && self.tokens.is_empty()
    }
}

impl Add<&TokenBundle> for TokenBundle {
    type Output = TokenBundle;
    fn add(self, rhs: &TokenBundle) -> Self::Output {
        TokenBundle {
            coin: self.coin + rhs.coin,
            tokens: self.tokens + &rhs.tokens,
        }
    }
}

impl Add for TokenBundle {
    type Output = TokenBundle;
    fn add(self, rhs: Self) -> Self::Output {
        self + &rhs
    }
}

impl AddAssign<&TokenBundle> for TokenBundle {
    fn add_assign(&mut self, rhs: &TokenBundle) {
        let lhs = std::mem::take(self);
        *self = lhs + rhs;
    }
}

impl Sum for TokenBundle {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(TokenBundle::default(), |a, b| a + &b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coin::TokenQuantity;
    use crate::token::{AssetId, AssetName, PolicyId, POLICY_ID_BYTES};
    use proptest::prelude::*;

    fn bundle(coin: u64, entries: &[(u8, u64)]) -> TokenBundle {
        let tokens = entries
            .iter()
            .map(|(tag, q)| {
                (
                    AssetId::new(PolicyId([*tag; POLICY_ID_BYTES]), AssetName::default()),
                    TokenQuantity::from_units(*q),
                )
            })
            .collect();
        TokenBundle::new(Coin::from_atoms(coin), tokens)
    }

    fn arbitrary_bundle() -> impl Strategy<Value = TokenBundle> {
        (
            0u64..1 << 40,
            proptest::collection::vec((0u8..6, 0u64..1 << 40), 0..6),
        )
            .prop_map(|(coin, entries)| bundle(coin, &entries))
    }

    #[test]
    fn emptiness_requires_both_components_empty() {
        assert!(TokenBundle::default().is_empty());
        assert!(!bundle(1, &[]).is_empty());
        assert!(!bundle(0, &[(1, 1)]).is_empty());
    }

    proptest! {
        #[test]
        fn addition_commutes(a in arbitrary_bundle(), b in arbitrary_bundle()) {
            prop_assert_eq!(a.clone() + &b, b + &a);
        }

        #[test]
        fn addition_associates(
            a in arbitrary_bundle(),
            b in arbitrary_bundle(),
            c in arbitrary_bundle(),
        ) {
            prop_assert_eq!((a.clone() + &b) + &c, a + &(b + &c));
        }

        #[test]
        fn default_is_identity(a in arbitrary_bundle()) {
            prop_assert_eq!(a.clone() + &TokenBundle::default(), a);
        }

        #[test]
        fn sum_splits_componentwise(bundles in proptest::collection::vec(arbitrary_bundle(), 0..8)) {
            let total: TokenBundle = bundles.iter().cloned().sum();
            prop_assert_eq!(total.coin, bundles.iter().map(|b| b.coin).sum::<Coin>());
            prop_assert_eq!(
                total.tokens,
                bundles.iter().map(|b| b.tokens.clone()).sum::<TokenMap>()
            );
        }

        #[test]
        fn serde_round_trip(a in arbitrary_bundle()) {
            let json = serde_json::to_string(&a).unwrap();
            prop_assert_eq!(serde_json::from_str::<TokenBundle>(&json).unwrap(), a);
        }
    }
}
