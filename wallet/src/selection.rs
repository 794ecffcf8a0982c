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

//! The migration selection engine.
//!
//! A selection packs a set of wallet inputs into one or more outputs so that
//! the result can become a single transaction: every output respects the
//! per-output size limit and the per-output token quantity cap, every output
//! carries at least its minimum ada quantity, the whole selection fits the
//! transaction size limit, and whatever ada is left over after fees is pushed
//! into output coins for as long as doing so is cheaper than burning it.
//!
//! The packing is greedy, not optimal. Selections are immutable: every
//! operation takes a selection by reference and produces a fresh one or a
//! report of why it cannot.

use crate::error::{SelectionError, SelectionFullError};
use crate::primitive::Size;
use coin_structure::{Coin, TokenBundle, TokenMap, TokenQuantity};

/// The fee and size policy a selection is built under.
///
/// Implementations must be pure, and the output cost and size functions must
/// be non-decreasing in the output's coin field and token quantities; the
/// engine's accounting leans on both.
pub trait SelectionParameters {
    /// The fee charged for a selection with no inputs, outputs, or reward.
    fn cost_of_empty_selection(&self) -> Coin;

    /// The size of a selection with no inputs, outputs, or reward.
    fn size_of_empty_selection(&self) -> Size;

    /// The marginal fee per input.
    fn cost_of_input(&self) -> Coin;

    /// The marginal size per input.
    fn size_of_input(&self) -> Size;

    /// The marginal fee of one output holding the given value.
    fn cost_of_output(&self, output: &TokenBundle) -> Coin;

    /// The marginal size of one output holding the given value.
    fn size_of_output(&self, output: &TokenBundle) -> Size;

    /// The marginal fee of withdrawing the given reward amount.
    fn cost_of_reward_withdrawal(&self, amount: Coin) -> Coin;

    /// The marginal size of withdrawing the given reward amount.
    fn size_of_reward_withdrawal(&self, amount: Coin) -> Size;

    fn maximum_size_of_output(&self) -> Size;

    fn maximum_size_of_selection(&self) -> Size;

    /// The largest quantity of a single asset one output may carry; larger
    /// holdings are split across outputs.
    fn maximum_token_quantity(&self) -> TokenQuantity;

    /// The protocol's minimum ada requirement for an output holding the
    /// given tokens.
    fn minimum_ada_quantity(&self, tokens: &TokenMap) -> Coin;

    /// Whether an output of this exact value fits the per-output size limit.
    fn output_size_within_limit(&self, output: &TokenBundle) -> bool {
        self.size_of_output(output) <= self.maximum_size_of_output()
    }

    /// Whether an output holding these tokens would fit the per-output size
    /// limit even with a maximal coin. Packing uses this stronger check so
    /// that assigning ada later can never invalidate an output.
    fn output_size_within_limit_if_ada_maximal(&self, tokens: &TokenMap) -> bool {
        self.size_of_output(&TokenBundle::new(Coin::MAX, tokens.clone()))
            <= self.maximum_size_of_output()
    }

    fn output_satisfies_minimum_ada(&self, output: &TokenBundle) -> bool {
        output.coin >= self.minimum_ada_quantity(&output.tokens)
    }

    fn output_within_token_quantity_limit(&self, tokens: &TokenMap) -> bool {
        tokens.largest_quantity() <= self.maximum_token_quantity()
    }
}

/// A packed set of inputs and outputs, ready to become a transaction body.
///
/// Values of this type uphold the selection invariants checked by
/// [`crate::verify::check_invariant`]; they are immutable once returned.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Selection<I> {
    pub(crate) inputs: Vec<(I, TokenBundle)>,
    pub(crate) outputs: Vec<TokenBundle>,
    pub(crate) fee_excess: Coin,
    pub(crate) reward_withdrawal: Coin,
    pub(crate) size: Size,
}

impl<I> Selection<I> {
    /// The selected inputs, most recently added first. Never empty.
    pub fn inputs(&self) -> &[(I, TokenBundle)] {
        &self.inputs
    }

    /// The packed outputs. Never empty.
    pub fn outputs(&self) -> &[TokenBundle] {
        &self.outputs
    }

    /// Ada that could not be assigned to any output without costing more
    /// than it is worth.
    pub fn fee_excess(&self) -> Coin {
        self.fee_excess
    }

    pub fn reward_withdrawal(&self) -> Coin {
        self.reward_withdrawal
    }

    /// The cached total size; equals the recomputation from parameters.
    pub fn size(&self) -> Size {
        self.size
    }

    /// The minimum fee this selection pays under the given parameters.
    pub fn total_fee<P: SelectionParameters>(&self, params: &P) -> Coin {
        total_fee_of(params, self.inputs.len(), &self.outputs, self.reward_withdrawal)
    }
}

impl<I: Clone> Selection<I> {
    /// Packs the given inputs and reward into a fresh selection.
    ///
    /// The combined token holding is split into per-output maps honoring the
    /// token quantity cap and the per-output size limit, each output is
    /// assigned its minimum ada, and the remaining ada (beyond fees) is
    /// distributed back onto outputs by [`minimize_fee_excess`].
    pub fn create<P: SelectionParameters>(
        params: &P,
        reward_withdrawal: Coin,
        inputs: Vec<(I, TokenBundle)>,
    ) -> Result<Selection<I>, SelectionError> {
        if inputs.is_empty() {
            warn!("refusing to create a selection from no inputs");
            return Err(SelectionError::AdaInsufficient);
        }
        let token_sum: TokenMap = inputs.iter().map(|(_, bundle)| bundle.tokens.clone()).sum();
        let chunks = decompose_by_quantity_limit(params, &token_sum);
        let packed = coalesce_outputs(params, chunks);
        for bundle in &packed {
            if !params.output_size_within_limit_if_ada_maximal(&bundle.tokens) {
                let size_required =
                    params.size_of_output(&TokenBundle::new(Coin::MAX, bundle.tokens.clone()));
                warn!(%size_required, "a single output cannot fit the per-output size limit");
                return Err(SelectionFullError {
                    size_maximum: params.maximum_size_of_output(),
                    size_required,
                }
                .into());
            }
        }
        let outputs = packed
            .into_iter()
            .map(|bundle| {
                let coin = params.minimum_ada_quantity(&bundle.tokens);
                TokenBundle::new(coin, bundle.tokens)
            })
            .collect();
        balance(params, inputs, outputs, reward_withdrawal)
    }

    /// Merges a new input into the first existing output that can absorb it
    /// without breaking the token quantity cap or the per-output size limit.
    #[must_use = "extending a selection produces a new selection"]
    pub fn add_input_to_existing_output<P: SelectionParameters>(
        &self,
        params: &P,
        entry: (I, TokenBundle),
    ) -> Result<Selection<I>, SelectionError> {
        let (input_id, input_bundle) = entry;
        let mut smallest_rejected: Option<Size> = None;
        for (index, output) in self.outputs.iter().enumerate() {
            let merged_tokens = output.tokens.clone() + &input_bundle.tokens;
            if !params.output_within_token_quantity_limit(&merged_tokens)
                || !params.output_size_within_limit_if_ada_maximal(&merged_tokens)
            {
                let rejected_size = infeasible_output_size(params, &merged_tokens);
                smallest_rejected = Some(match smallest_rejected {
                    Some(seen) if seen <= rejected_size => seen,
                    _ => rejected_size,
                });
                continue;
            }
            // First qualifying output wins. Top the merged output up to its
            // minimum ada; the global balance pass settles the rest.
            let floor = params.minimum_ada_quantity(&merged_tokens);
            let coin = Coin::max(output.coin, floor);
            let merged = TokenBundle::new(coin, merged_tokens);
            let mut outputs = self.outputs.clone();
            outputs[index] = merged;
            let inputs = prepend(&self.inputs, (input_id, input_bundle));
            return balance(params, inputs, outputs, self.reward_withdrawal);
        }
        let size_required = smallest_rejected.unwrap_or(Size::MAX);
        warn!(%size_required, "no existing output can absorb the input");
        Err(SelectionFullError {
            size_maximum: params.maximum_size_of_output(),
            size_required,
        }
        .into())
    }

    /// Appends a new output holding exactly the new input's tokens, with its
    /// minimum ada topped up from the new input's own coin. Existing outputs
    /// are never touched.
    #[must_use = "extending a selection produces a new selection"]
    pub fn add_input_to_new_output_without_reclaiming_ada<P: SelectionParameters>(
        &self,
        params: &P,
        entry: (I, TokenBundle),
    ) -> Result<Selection<I>, SelectionError> {
        let (input_id, input_bundle) = entry;
        if let Err(e) = solo_output_feasible(params, &input_bundle.tokens) {
            return Err(e);
        }
        let floor = params.minimum_ada_quantity(&input_bundle.tokens);
        let new_output = TokenBundle::new(floor, input_bundle.tokens.clone());
        let need = floor + params.cost_of_input() + params.cost_of_output(&new_output);
        if input_bundle.coin < need {
            warn!(
                coin = %input_bundle.coin,
                %need,
                "input cannot fund a solo output by itself"
            );
            return Err(SelectionError::AdaInsufficient);
        }
        let mut outputs = self.outputs.clone();
        outputs.push(new_output);
        let inputs = prepend(&self.inputs, (input_id, input_bundle));
        balance(params, inputs, outputs, self.reward_withdrawal)
    }

    /// Appends a new output for the input, reclaiming ada from the existing
    /// outputs when the input's own coin cannot fund it.
    #[must_use = "extending a selection produces a new selection"]
    pub fn add_input_to_new_output<P: SelectionParameters>(
        &self,
        params: &P,
        entry: (I, TokenBundle),
    ) -> Result<Selection<I>, SelectionError> {
        match self.add_input_to_new_output_without_reclaiming_ada(params, entry.clone()) {
            Err(SelectionError::AdaInsufficient) => {}
            outcome => return outcome,
        }
        let (input_id, input_bundle) = entry;
        let floor = params.minimum_ada_quantity(&input_bundle.tokens);
        let new_output = TokenBundle::new(floor, input_bundle.tokens.clone());
        let need = floor + params.cost_of_input() + params.cost_of_output(&new_output);
        let pool = input_bundle.coin + self.fee_excess;
        let target = need - pool;
        let Some(reclaimed) = reclaim_ada(params, target, &self.outputs) else {
            warn!(%target, "existing outputs cannot free enough ada");
            return Err(SelectionError::AdaInsufficient);
        };
        let mut outputs = reclaimed.reduced_outputs;
        outputs.push(new_output);
        let inputs = prepend(&self.inputs, (input_id, input_bundle));
        balance(params, inputs, outputs, self.reward_withdrawal)
    }
}

/// The result of a successful [`reclaim_ada`] call.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ReclaimAdaResult {
    /// The outputs after reduction; holds the same tokens as the originals,
    /// in no more bundles than before.
    pub reduced_outputs: Vec<TokenBundle>,
    /// How much the outputs' combined fee cost dropped.
    pub cost_reduction: Coin,
    /// How much the outputs' combined size dropped.
    pub size_reduction: Size,
}

/// Attempts to free at least `target` ada from the given outputs.
///
/// Coins are first reduced to each output's minimum-ada floor; if that does
/// not reclaim enough, outputs are merged through [`coalesce_outputs`] and
/// floored again. The reclaimed amount counts both the coin given up and the
/// fee cost the smaller outputs no longer incur. A `target` of zero succeeds
/// trivially with no reductions.
pub fn reclaim_ada<P: SelectionParameters>(
    params: &P,
    target: Coin,
    outputs: &[TokenBundle],
) -> Option<ReclaimAdaResult> {
    if target.is_zero() {
        return Some(ReclaimAdaResult {
            reduced_outputs: outputs.to_vec(),
            cost_reduction: Coin::ZERO,
            size_reduction: Size::ZERO,
        });
    }
    let original_coin: Coin = outputs.iter().map(|o| o.coin).sum();
    let original_cost: Coin = outputs.iter().map(|o| params.cost_of_output(o)).sum();
    let original_size: Size = outputs.iter().map(|o| params.size_of_output(o)).sum();
    let assess = |reduced: Vec<TokenBundle>| -> Result<ReclaimAdaResult, Vec<TokenBundle>> {
        let reduced_coin: Coin = reduced.iter().map(|o| o.coin).sum();
        let reduced_cost: Coin = reduced.iter().map(|o| params.cost_of_output(o)).sum();
        let reduced_size: Size = reduced.iter().map(|o| params.size_of_output(o)).sum();
        let cost_reduction = original_cost - reduced_cost;
        if (original_coin - reduced_coin) + cost_reduction >= target {
            Ok(ReclaimAdaResult {
                reduced_outputs: reduced,
                cost_reduction,
                size_reduction: original_size - reduced_size,
            })
        } else {
            Err(reduced)
        }
    };
    let floored = floor_outputs(params, outputs.to_vec());
    let floored = match assess(floored) {
        Ok(result) => return Some(result),
        Err(floored) => floored,
    };
    let merged = floor_outputs(params, coalesce_outputs(params, floored));
    assess(merged).ok()
}

/// Greedily packs bundles left to right, merging neighbours for as long as
/// the merge respects the token quantity cap and the ada-maximal per-output
/// size limit. Total value is preserved and the bundle count never grows.
///
/// A lone bundle that already breaks a limit passes through unchanged; the
/// callers treat that as an infeasible arrangement.
pub fn coalesce_outputs<P: SelectionParameters>(
    params: &P,
    bundles: Vec<TokenBundle>,
) -> Vec<TokenBundle> {
    let mut result: Vec<TokenBundle> = Vec::new();
    let mut current: Option<TokenBundle> = None;
    for bundle in bundles {
        let Some(accumulated) = current.take() else {
            current = Some(bundle);
            continue;
        };
        let merged_tokens = accumulated.tokens.clone() + &bundle.tokens;
        if params.output_within_token_quantity_limit(&merged_tokens)
            && params.output_size_within_limit_if_ada_maximal(&merged_tokens)
        {
            current = Some(accumulated + &bundle);
        } else {
            result.push(accumulated);
            current = Some(bundle);
        }
    }
    if let Some(accumulated) = current {
        result.push(accumulated);
    }
    result
}

/// Pushes fee excess into an output's coin for as long as one more atom of
/// coin costs strictly less than the excess still held back.
///
/// The returned pair `(excess', output')` satisfies the exact accounting
/// identity
/// `(output'.coin - output.coin) + (cost(output') - cost(output)) + excess'
///  = excess`,
/// and on return either `excess'` is zero or raising the coin by one more
/// atom would cost at least `excess'`.
pub fn minimize_fee_excess<P: SelectionParameters>(
    params: &P,
    fee_excess: Coin,
    output: TokenBundle,
) -> (Coin, TokenBundle) {
    let mut excess = fee_excess.into_atoms();
    let mut scratch = output;
    loop {
        let coin = scratch.coin.into_atoms();
        if excess == 0 || coin == u64::MAX {
            break;
        }
        let base_cost = cost_with_coin(params, &mut scratch, coin);
        let marginal = cost_with_coin(params, &mut scratch, coin + 1).saturating_sub(base_cost);
        if marginal >= excess as u128 {
            break;
        }
        // The largest jump whose combined coin-and-cost consumption still
        // fits in the excess. Consumption grows strictly with the jump, so
        // binary search applies; the final guard above re-establishes the
        // one-atom stopping rule after every jump.
        let consumption = |scratch: &mut TokenBundle, jump: u64| {
            jump as u128 + cost_with_coin(params, scratch, coin + jump).saturating_sub(base_cost)
        };
        let mut lo = 1u64;
        let mut hi = excess.min(u64::MAX - coin);
        while lo < hi {
            let mid = lo + (hi - lo).div_ceil(2);
            if consumption(&mut scratch, mid) <= excess as u128 {
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }
        let consumed = consumption(&mut scratch, lo);
        scratch.coin = Coin::from_atoms(coin + lo);
        excess -= consumed as u64;
    }
    (Coin::from_atoms(excess), scratch)
}

fn cost_with_coin<P: SelectionParameters>(
    params: &P,
    scratch: &mut TokenBundle,
    coin: u64,
) -> u128 {
    scratch.coin = Coin::from_atoms(coin);
    params.cost_of_output(scratch).into_atoms() as u128
}

/// Splits a combined holding into single-asset bundles no larger than the
/// token quantity cap. A holding with no tokens yields one empty bundle.
fn decompose_by_quantity_limit<P: SelectionParameters>(
    params: &P,
    token_sum: &TokenMap,
) -> Vec<TokenBundle> {
    let cap = TokenQuantity::max(params.maximum_token_quantity(), TokenQuantity::from_units(1));
    let mut chunks = Vec::new();
    for (asset, quantity) in token_sum.iter() {
        let mut remaining = quantity;
        while !remaining.is_zero() {
            let piece = remaining.min(cap);
            chunks.push(TokenBundle::from_tokens(TokenMap::singleton(
                asset.clone(),
                piece,
            )));
            remaining = remaining - piece;
        }
    }
    if chunks.is_empty() {
        chunks.push(TokenBundle::default());
    }
    chunks
}

fn floor_outputs<P: SelectionParameters>(
    params: &P,
    outputs: Vec<TokenBundle>,
) -> Vec<TokenBundle> {
    outputs
        .into_iter()
        .map(|output| {
            let floor = params.minimum_ada_quantity(&output.tokens);
            if output.coin > floor {
                output.with_coin(floor)
            } else {
                output
            }
        })
        .collect()
}

fn prepend<I: Clone>(inputs: &[(I, TokenBundle)], entry: (I, TokenBundle)) -> Vec<(I, TokenBundle)> {
    let mut extended = Vec::with_capacity(inputs.len() + 1);
    extended.push(entry);
    extended.extend(inputs.iter().cloned());
    extended
}

fn solo_output_feasible<P: SelectionParameters>(
    params: &P,
    tokens: &TokenMap,
) -> Result<(), SelectionError> {
    if params.output_within_token_quantity_limit(tokens)
        && params.output_size_within_limit_if_ada_maximal(tokens)
    {
        return Ok(());
    }
    let size_required = infeasible_output_size(params, tokens);
    warn!(%size_required, "input bundle cannot form a single output");
    Err(SelectionFullError {
        size_maximum: params.maximum_size_of_output(),
        size_required,
    }
    .into())
}

/// The size to report for a token holding that cannot become one output. A
/// holding that breaks the token quantity cap is not encodable at any size,
/// which reads as a maximal requirement.
fn infeasible_output_size<P: SelectionParameters>(params: &P, tokens: &TokenMap) -> Size {
    if params.output_within_token_quantity_limit(tokens) {
        params.size_of_output(&TokenBundle::new(Coin::MAX, tokens.clone()))
    } else {
        Size::MAX
    }
}

fn total_fee_of<P: SelectionParameters>(
    params: &P,
    input_count: usize,
    outputs: &[TokenBundle],
    reward_withdrawal: Coin,
) -> Coin {
    params.cost_of_empty_selection()
        + params.cost_of_input() * input_count as u64
        + outputs.iter().map(|o| params.cost_of_output(o)).sum::<Coin>()
        + params.cost_of_reward_withdrawal(reward_withdrawal)
}

fn total_size_of<P: SelectionParameters>(
    params: &P,
    input_count: usize,
    outputs: &[TokenBundle],
    reward_withdrawal: Coin,
) -> Size {
    params.size_of_empty_selection()
        + params.size_of_input() * input_count as u64
        + outputs.iter().map(|o| params.size_of_output(o)).sum::<Size>()
        + params.size_of_reward_withdrawal(reward_withdrawal)
}

/// Settles a candidate arrangement into a selection: checks the size limit,
/// derives the fee excess from the exact ada balance, distributes the excess
/// across outputs, and caches the final size.
fn balance<I, P: SelectionParameters>(
    params: &P,
    inputs: Vec<(I, TokenBundle)>,
    mut outputs: Vec<TokenBundle>,
    reward_withdrawal: Coin,
) -> Result<Selection<I>, SelectionError> {
    let maximum = params.maximum_size_of_selection();
    let size_before = total_size_of(params, inputs.len(), &outputs, reward_withdrawal);
    if size_before > maximum {
        warn!(size = %size_before, %maximum, "arrangement exceeds the selection size limit");
        return Err(SelectionFullError {
            size_maximum: maximum,
            size_required: size_before,
        }
        .into());
    }
    let ada_available =
        inputs.iter().map(|(_, bundle)| bundle.coin).sum::<Coin>() + reward_withdrawal;
    let committed: Coin = outputs.iter().map(|o| o.coin).sum();
    let fee = total_fee_of(params, inputs.len(), &outputs, reward_withdrawal);
    let Some(mut fee_excess) = ada_available.checked_sub(committed + fee) else {
        warn!(
            available = %ada_available,
            required = %(committed + fee),
            "arrangement cannot cover fees and minimum output ada"
        );
        return Err(SelectionError::AdaInsufficient);
    };
    for output in outputs.iter_mut() {
        if fee_excess.is_zero() {
            break;
        }
        let (remaining, enriched) = minimize_fee_excess(params, fee_excess, output.clone());
        fee_excess = remaining;
        *output = enriched;
    }
    let size = total_size_of(params, inputs.len(), &outputs, reward_withdrawal);
    if size > maximum {
        return Err(SelectionFullError {
            size_maximum: maximum,
            size_required: size,
        }
        .into());
    }
    trace!(%size, fee_excess = %fee_excess, "selection balanced");
    Ok(Selection {
        inputs,
        outputs,
        fee_excess,
        reward_withdrawal,
        size,
    })
}
