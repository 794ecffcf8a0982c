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

//! Self-checking of selection invariants.
//!
//! [`check_invariant`] recomputes everything a [`Selection`] claims about
//! itself and reports the first discrepancy. A violation is a bug in the
//! engine; production callers treat anything but
//! [`SelectionInvariantStatus::Holds`] as fatal.

use crate::error::SelectionInvariantStatus;
use crate::primitive::Size;
use crate::selection::{Selection, SelectionParameters};
use coin_structure::{Coin, TokenBundle, TokenMap};

/// Checks every selection invariant:
///
/// 1. consumed ada (inputs plus reward) equals produced ada (output coins
///    plus total fee plus fee excess), exactly;
/// 2. every output carries its minimum ada and fits the per-output size
///    limit;
/// 3. the cached size is correct and within the selection size limit;
/// 4. input and output token holdings are identical;
/// 5. the fee excess is minimal: no output could absorb one more coin atom
///    for less than the excess still held.
pub fn check_invariant<I, P: SelectionParameters>(
    params: &P,
    selection: &Selection<I>,
) -> SelectionInvariantStatus {
    let input_tokens: TokenMap = selection
        .inputs()
        .iter()
        .map(|(_, bundle)| bundle.tokens.clone())
        .sum();
    let output_tokens: TokenMap = selection
        .outputs()
        .iter()
        .map(|output| output.tokens.clone())
        .sum();
    if input_tokens != output_tokens {
        return SelectionInvariantStatus::AssetBalanceIncorrect;
    }

    for (output_index, output) in selection.outputs().iter().enumerate() {
        if !params.output_satisfies_minimum_ada(output) {
            return SelectionInvariantStatus::OutputBelowMinimumAda { output_index };
        }
        if !params.output_size_within_limit(output) {
            return SelectionInvariantStatus::OutputSizeExceedsLimit { output_index };
        }
    }

    let consumed = selection
        .inputs()
        .iter()
        .map(|(_, bundle)| bundle.coin)
        .sum::<Coin>()
        + selection.reward_withdrawal();
    let produced = selection.outputs().iter().map(|o| o.coin).sum::<Coin>()
        + selection.total_fee(params)
        + selection.fee_excess();
    if consumed != produced {
        return SelectionInvariantStatus::CoinBalanceIncorrect { consumed, produced };
    }

    let computed = computed_size(params, selection);
    if computed != selection.size() {
        return SelectionInvariantStatus::SizeIncorrect {
            cached: selection.size(),
            computed,
        };
    }
    if computed > params.maximum_size_of_selection() {
        return SelectionInvariantStatus::SizeExceedsLimit {
            size: computed,
            maximum: params.maximum_size_of_selection(),
        };
    }

    if !selection.fee_excess().is_zero() {
        for (output_index, output) in selection.outputs().iter().enumerate() {
            let marginal_cost = marginal_cost_of_coin(params, output);
            if marginal_cost < selection.fee_excess() {
                return SelectionInvariantStatus::FeeExcessNotMinimal {
                    output_index,
                    fee_excess: selection.fee_excess(),
                    marginal_cost,
                };
            }
        }
    }

    SelectionInvariantStatus::Holds
}

fn computed_size<I, P: SelectionParameters>(params: &P, selection: &Selection<I>) -> Size {
    params.size_of_empty_selection()
        + params.size_of_input() * selection.inputs().len() as u64
        + selection
            .outputs()
            .iter()
            .map(|o| params.size_of_output(o))
            .sum::<Size>()
        + params.size_of_reward_withdrawal(selection.reward_withdrawal())
}

/// What one more atom of coin on this output would add to its cost. An
/// output already at the maximal coin cannot grow, which reads as an
/// unaffordable increment.
fn marginal_cost_of_coin<P: SelectionParameters>(params: &P, output: &TokenBundle) -> Coin {
    let Some(raised) = output.coin.into_atoms().checked_add(1) else {
        return Coin::MAX;
    };
    params.cost_of_output(&output.with_coin(Coin::from_atoms(raised)))
        - params.cost_of_output(output)
}
