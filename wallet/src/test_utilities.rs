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

//! Shared fixtures for the engine and store test suites.

use crate::primitive::{Size, TxId};
use crate::selection::SelectionParameters;
use coin_structure::token::POLICY_ID_BYTES;
use coin_structure::{AssetId, AssetName, Coin, PolicyId, TokenBundle, TokenMap, TokenQuantity};

/// Selection parameters with a byte-counting size model and a linear fee
/// over it.
///
/// Output cost is always `fee_per_size_unit` times output size, the way real
/// fee policies price bytes; several reclaim and minimization laws rely on
/// cost and size moving together. All knobs are plain fields so a test can
/// start from `Default` and override what it exercises.
#[derive(Clone, Debug)]
pub struct MockSelectionParameters {
    pub cost_of_empty_selection: Coin,
    pub size_of_empty_selection: Size,
    pub cost_of_input: Coin,
    pub size_of_input: Size,
    /// The fee charged per unit of output (and reward withdrawal) size.
    pub fee_per_size_unit: u64,
    /// The flat size of an output before its contents.
    pub base_output_size: Size,
    /// The size each distinct asset adds to an output, on top of the byte
    /// length of its quantity.
    pub size_per_asset: Size,
    pub maximum_size_of_output: Size,
    pub maximum_size_of_selection: Size,
    pub maximum_token_quantity: TokenQuantity,
    /// The minimum ada of a pure-ada output.
    pub base_minimum_ada: Coin,
    /// The additional minimum ada per distinct asset.
    pub minimum_ada_per_asset: Coin,
    /// The size of a non-zero reward withdrawal.
    pub reward_withdrawal_size: Size,
}

impl Default for MockSelectionParameters {
    fn default() -> Self {
        MockSelectionParameters {
            cost_of_empty_selection: Coin::from_atoms(1_000),
            size_of_empty_selection: Size::from_units(16),
            cost_of_input: Coin::from_atoms(100),
            size_of_input: Size::from_units(4),
            fee_per_size_unit: 10,
            base_output_size: Size::from_units(8),
            size_per_asset: Size::from_units(32),
            maximum_size_of_output: Size::from_units(512),
            maximum_size_of_selection: Size::from_units(4_096),
            maximum_token_quantity: TokenQuantity::from_units(1_000),
            base_minimum_ada: Coin::from_atoms(10),
            minimum_ada_per_asset: Coin::from_atoms(5),
            reward_withdrawal_size: Size::from_units(8),
        }
    }
}

impl SelectionParameters for MockSelectionParameters {
    fn cost_of_empty_selection(&self) -> Coin {
        self.cost_of_empty_selection
    }

    fn size_of_empty_selection(&self) -> Size {
        self.size_of_empty_selection
    }

    fn cost_of_input(&self) -> Coin {
        self.cost_of_input
    }

    fn size_of_input(&self) -> Size {
        self.size_of_input
    }

    fn cost_of_output(&self, output: &TokenBundle) -> Coin {
        Coin::from_atoms(self.size_of_output(output).into_units()) * self.fee_per_size_unit
    }

    fn size_of_output(&self, output: &TokenBundle) -> Size {
        let mut size = self.base_output_size + byte_length(output.coin.into_atoms());
        for (_, quantity) in output.tokens.iter() {
            size += self.size_per_asset + byte_length(quantity.into_units());
        }
        size
    }

    fn cost_of_reward_withdrawal(&self, amount: Coin) -> Coin {
        Coin::from_atoms(self.size_of_reward_withdrawal(amount).into_units())
            * self.fee_per_size_unit
    }

    fn size_of_reward_withdrawal(&self, amount: Coin) -> Size {
        if amount.is_zero() {
            Size::ZERO
        } else {
            self.reward_withdrawal_size
        }
    }

    fn maximum_size_of_output(&self) -> Size {
        self.maximum_size_of_output
    }

    fn maximum_size_of_selection(&self) -> Size {
        self.maximum_size_of_selection
    }

    fn maximum_token_quantity(&self) -> TokenQuantity {
        self.maximum_token_quantity
    }

    fn minimum_ada_quantity(&self, tokens: &TokenMap) -> Coin {
        self.base_minimum_ada + self.minimum_ada_per_asset * tokens.asset_count() as u64
    }
}

/// The number of bytes needed to encode a value, at least one.
fn byte_length(value: u64) -> Size {
    let bits = u64::BITS - value.leading_zeros();
    Size::from_units(u64::from(bits.div_ceil(8).max(1)))
}

/// A distinguishable asset for test data.
pub fn asset(tag: u8) -> AssetId {
    AssetId::new(PolicyId([tag; POLICY_ID_BYTES]), AssetName::default())
}

/// A bundle from a coin amount and `(asset tag, quantity)` pairs.
pub fn bundle(coin: u64, entries: &[(u8, u64)]) -> TokenBundle {
    let tokens = entries
        .iter()
        .map(|(tag, quantity)| (asset(*tag), TokenQuantity::from_units(*quantity)))
        .collect();
    TokenBundle::new(Coin::from_atoms(coin), tokens)
}

/// A distinguishable transaction id for test data.
pub fn tx_id(tag: u8) -> TxId {
    TxId::from_bytes([tag; 32])
}
