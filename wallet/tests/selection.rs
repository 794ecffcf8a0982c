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

//! Laws and scenarios of the migration selection engine.

use coin_structure::{Coin, TokenBundle, TokenQuantity};
use lazy_static::lazy_static;
use proptest::prelude::*;
use wallet::error::SelectionError;
use wallet::primitive::Size;
use wallet::{Diagnostics, init_diagnostics};
use wallet::selection::{
    Selection, SelectionParameters, coalesce_outputs, minimize_fee_excess, reclaim_ada,
};
use wallet::test_utilities::{MockSelectionParameters, bundle};
use wallet::verify::check_invariant;

lazy_static! {
    // Cheap flat-fee parameters: outputs cost nothing, the minimum ada is a
    // constant two atoms.
    static ref FLAT_PARAMS: MockSelectionParameters = MockSelectionParameters {
        cost_of_empty_selection: Coin::from_atoms(10),
        size_of_empty_selection: Size::from_units(5),
        cost_of_input: Coin::from_atoms(1),
        size_of_input: Size::from_units(1),
        fee_per_size_unit: 0,
        base_output_size: Size::from_units(8),
        size_per_asset: Size::from_units(32),
        maximum_size_of_output: Size::from_units(100),
        maximum_size_of_selection: Size::from_units(1_000),
        maximum_token_quantity: TokenQuantity::from_units(1_000),
        base_minimum_ada: Coin::from_atoms(2),
        minimum_ada_per_asset: Coin::ZERO,
        reward_withdrawal_size: Size::from_units(8),
    };
}

fn inputs_of(bundles: &[TokenBundle]) -> Vec<(u32, TokenBundle)> {
    bundles
        .iter()
        .cloned()
        .enumerate()
        .map(|(index, value)| (index as u32, value))
        .collect()
}

#[test]
fn a_single_pure_ada_input_becomes_a_single_output() {
    let inputs = inputs_of(&[bundle(50, &[])]);
    let selection = Selection::create(&*FLAT_PARAMS, Coin::ZERO, inputs).unwrap();

    assert_eq!(selection.outputs().len(), 1);
    let output = &selection.outputs()[0];
    assert_eq!(output.coin, Coin::from_atoms(39));
    assert!(output.tokens.is_empty());
    assert_eq!(selection.fee_excess(), Coin::ZERO);
    assert_eq!(
        selection.size(),
        FLAT_PARAMS.size_of_empty_selection()
            + FLAT_PARAMS.size_of_input()
            + FLAT_PARAMS.size_of_output(output)
    );
    assert!(check_invariant(&*FLAT_PARAMS, &selection).holds());
}

#[test]
fn an_input_below_the_fee_floor_is_rejected() {
    init_diagnostics(Diagnostics::Rejections);
    let inputs = inputs_of(&[bundle(1, &[])]);
    assert_eq!(
        Selection::create(&*FLAT_PARAMS, Coin::ZERO, inputs),
        Err(SelectionError::AdaInsufficient)
    );
}

#[test]
fn too_many_inputs_overflow_the_selection_size() {
    let params = MockSelectionParameters {
        maximum_size_of_selection: Size::from_units(6),
        ..FLAT_PARAMS.clone()
    };
    let inputs = inputs_of(&vec![bundle(3, &[]); 10]);
    match Selection::create(&params, Coin::ZERO, inputs) {
        Err(SelectionError::Full(e)) => {
            assert_eq!(e.size_maximum, Size::from_units(6));
            assert!(e.size_required > Size::from_units(6));
        }
        other => panic!("expected a full selection, got {other:?}"),
    }
}

#[test]
fn empty_input_sequences_are_rejected() {
    assert_eq!(
        Selection::<u32>::create(&*FLAT_PARAMS, Coin::ZERO, Vec::new()),
        Err(SelectionError::AdaInsufficient)
    );
}

#[test]
fn a_reward_withdrawal_contributes_to_outputs() {
    let inputs = inputs_of(&[bundle(50, &[])]);
    let with_reward =
        Selection::create(&*FLAT_PARAMS, Coin::from_atoms(25), inputs.clone()).unwrap();
    let without = Selection::create(&*FLAT_PARAMS, Coin::ZERO, inputs).unwrap();

    assert!(check_invariant(&*FLAT_PARAMS, &with_reward).holds());
    assert_eq!(with_reward.reward_withdrawal(), Coin::from_atoms(25));
    assert_eq!(
        with_reward.outputs()[0].coin,
        without.outputs()[0].coin + Coin::from_atoms(25)
    );
}

#[test]
fn oversized_holdings_split_across_outputs() {
    let params = MockSelectionParameters::default();
    let inputs = inputs_of(&[bundle(1_000_000, &[(1, 2_500)])]);
    let selection = Selection::create(&params, Coin::ZERO, inputs).unwrap();

    assert_eq!(selection.outputs().len(), 3);
    let quantities: Vec<u64> = selection
        .outputs()
        .iter()
        .map(|o| o.tokens.quantity(&wallet::test_utilities::asset(1)).into_units())
        .collect();
    assert!(quantities.iter().all(|q| *q <= 1_000));
    assert_eq!(quantities.iter().sum::<u64>(), 2_500);
    assert!(check_invariant(&params, &selection).holds());
}

#[test]
fn small_holdings_of_distinct_assets_share_one_output() {
    let params = MockSelectionParameters::default();
    let inputs = inputs_of(&[
        bundle(500_000, &[(1, 10)]),
        bundle(500_000, &[(2, 20)]),
        bundle(500_000, &[(3, 30)]),
    ]);
    let selection = Selection::create(&params, Coin::ZERO, inputs).unwrap();

    assert_eq!(selection.outputs().len(), 1);
    assert_eq!(selection.outputs()[0].tokens.asset_count(), 3);
    assert!(check_invariant(&params, &selection).holds());
}

#[test]
fn merging_an_input_into_an_existing_output_conserves_value() {
    let params = MockSelectionParameters::default();
    let base =
        Selection::create(&params, Coin::ZERO, inputs_of(&[bundle(100_000, &[(1, 5)])])).unwrap();
    let extended = base
        .add_input_to_existing_output(&params, (99, bundle(10_000, &[(2, 7)])))
        .unwrap();

    assert_eq!(extended.outputs().len(), base.outputs().len());
    assert_eq!(extended.inputs().len(), base.inputs().len() + 1);
    assert_eq!(extended.inputs()[0].0, 99);
    assert!(check_invariant(&params, &extended).holds());
}

#[test]
fn merging_fails_when_every_output_would_break_the_token_cap() {
    let params = MockSelectionParameters::default();
    let base = Selection::create(
        &params,
        Coin::ZERO,
        inputs_of(&[bundle(100_000, &[(1, 900)])]),
    )
    .unwrap();
    // 900 + 200 breaks the cap of 1_000 for the only output.
    match base.add_input_to_existing_output(&params, (99, bundle(10_000, &[(1, 200)]))) {
        Err(SelectionError::Full(_)) => {}
        other => panic!("expected a full selection, got {other:?}"),
    }
}

#[test]
fn a_new_output_is_funded_by_the_input_alone() {
    let params = MockSelectionParameters::default();
    let base =
        Selection::create(&params, Coin::ZERO, inputs_of(&[bundle(100_000, &[])])).unwrap();
    let extended = base
        .add_input_to_new_output_without_reclaiming_ada(&params, (99, bundle(10_000, &[(1, 5)])))
        .unwrap();

    assert_eq!(extended.outputs().len(), base.outputs().len() + 1);
    assert!(check_invariant(&params, &extended).holds());
}

#[test]
fn an_underfunded_new_output_is_rejected_without_reclaiming() {
    let params = MockSelectionParameters::default();
    let base =
        Selection::create(&params, Coin::ZERO, inputs_of(&[bundle(100_000, &[])])).unwrap();
    assert_eq!(
        base.add_input_to_new_output_without_reclaiming_ada(&params, (99, bundle(50, &[(1, 5)]))),
        Err(SelectionError::AdaInsufficient)
    );
}

#[test]
fn reclaiming_rescues_an_underfunded_new_output() {
    let params = MockSelectionParameters::default();
    let base =
        Selection::create(&params, Coin::ZERO, inputs_of(&[bundle(100_000, &[])])).unwrap();
    let extended = base
        .add_input_to_new_output(&params, (99, bundle(50, &[(1, 5)])))
        .unwrap();

    assert_eq!(extended.outputs().len(), 2);
    assert_eq!(extended.inputs().len(), 2);
    assert!(check_invariant(&params, &extended).holds());
}

#[test]
fn reclaiming_fails_when_outputs_hold_no_spare_ada() {
    init_diagnostics(Diagnostics::Rejections);
    let params = MockSelectionParameters::default();
    // Just enough ada that the single output sits almost at its floor.
    let base =
        Selection::create(&params, Coin::ZERO, inputs_of(&[bundle(1_200, &[])])).unwrap();
    assert_eq!(
        base.add_input_to_new_output(&params, (99, bundle(50, &[(1, 5)]))),
        Err(SelectionError::AdaInsufficient)
    );
}

fn arbitrary_params() -> impl Strategy<Value = MockSelectionParameters> {
    (
        (0u64..2_000, 0u64..64, 0u64..200, 1u64..8, 1u64..20),
        (1u64..16, 8u64..48, 100u64..2_000, 0u64..50, 0u64..20),
    )
        .prop_map(
            |(
                (cost_empty, size_empty, cost_input, size_input, fee_rate),
                (base_output, per_asset, max_quantity, base_min_ada, min_ada_per_asset),
            )| {
                MockSelectionParameters {
                    cost_of_empty_selection: Coin::from_atoms(cost_empty),
                    size_of_empty_selection: Size::from_units(size_empty),
                    cost_of_input: Coin::from_atoms(cost_input),
                    size_of_input: Size::from_units(size_input),
                    fee_per_size_unit: fee_rate,
                    base_output_size: Size::from_units(base_output),
                    size_per_asset: Size::from_units(per_asset),
                    maximum_size_of_output: Size::from_units(512),
                    maximum_size_of_selection: Size::from_units(4_096),
                    maximum_token_quantity: TokenQuantity::from_units(max_quantity),
                    base_minimum_ada: Coin::from_atoms(base_min_ada),
                    minimum_ada_per_asset: Coin::from_atoms(min_ada_per_asset),
                    reward_withdrawal_size: Size::from_units(8),
                }
            },
        )
}

fn arbitrary_bundle() -> impl Strategy<Value = TokenBundle> {
    (
        0u64..100_000,
        proptest::collection::vec((0u8..5, 1u64..500), 0..4),
    )
        .prop_map(|(coin, entries)| bundle(coin, &entries))
}

fn arbitrary_inputs() -> impl Strategy<Value = Vec<(u32, TokenBundle)>> {
    proptest::collection::vec(arbitrary_bundle(), 1..8).prop_map(|bundles| inputs_of(&bundles))
}

proptest! {
    // Creation soundness: whatever `create` accepts satisfies every
    // invariant and keeps the inputs verbatim.
    #[test]
    fn created_selections_satisfy_the_invariants(
        params in arbitrary_params(),
        inputs in arbitrary_inputs(),
        reward in 0u64..5_000,
    ) {
        if let Ok(selection) =
            Selection::create(&params, Coin::from_atoms(reward), inputs.clone())
        {
            let status = check_invariant(&params, &selection);
            prop_assert!(status.holds(), "violated: {status}");
            prop_assert_eq!(selection.inputs(), &inputs[..]);
            prop_assert_eq!(selection.reward_withdrawal(), Coin::from_atoms(reward));
        }
    }

    // Extension soundness: every extension operation preserves the
    // invariants and prepends its entry to the inputs.
    #[test]
    fn extended_selections_satisfy_the_invariants(
        params in arbitrary_params(),
        inputs in arbitrary_inputs(),
        entry in arbitrary_bundle(),
    ) {
        let Ok(base) = Selection::create(&params, Coin::ZERO, inputs) else {
            return Ok(());
        };
        let entry = (1_000u32, entry);
        let extensions = [
            base.add_input_to_existing_output(&params, entry.clone()),
            base.add_input_to_new_output_without_reclaiming_ada(&params, entry.clone()),
            base.add_input_to_new_output(&params, entry.clone()),
        ];
        for extended in extensions.into_iter().flatten() {
            let status = check_invariant(&params, &extended);
            prop_assert!(status.holds(), "violated: {status}");
            prop_assert_eq!(extended.inputs().len(), base.inputs().len() + 1);
            prop_assert_eq!(&extended.inputs()[0], &entry);
            prop_assert_eq!(&extended.inputs()[1..], base.inputs());
        }
    }

    // Coalescing preserves value, never grows the bundle count, and keeps
    // every bundle within the per-output size limit.
    #[test]
    fn coalescing_preserves_value(
        params in arbitrary_params(),
        bundles in proptest::collection::vec(arbitrary_bundle(), 1..10),
    ) {
        let merged = coalesce_outputs(&params, bundles.clone());
        prop_assert!(!merged.is_empty());
        prop_assert!(merged.len() <= bundles.len());
        prop_assert_eq!(
            merged.iter().cloned().sum::<TokenBundle>(),
            bundles.iter().cloned().sum::<TokenBundle>()
        );
        for output in &merged {
            prop_assert!(params.output_size_within_limit(output));
        }
    }

    // Reclaim laws: token conservation, shrinking output count, coupled
    // cost and size reductions, and the reclaimed-amount bound.
    #[test]
    fn reclaiming_frees_at_least_the_target(
        params in arbitrary_params(),
        outputs in proptest::collection::vec(arbitrary_bundle(), 1..6),
        target in 0u64..50_000,
    ) {
        let target = Coin::from_atoms(target);
        match reclaim_ada(&params, target, &outputs) {
            Some(result) => {
                prop_assert_eq!(
                    result.reduced_outputs.iter().map(|o| o.tokens.clone()).sum::<coin_structure::TokenMap>(),
                    outputs.iter().map(|o| o.tokens.clone()).sum::<coin_structure::TokenMap>()
                );
                prop_assert!(result.reduced_outputs.len() <= outputs.len());
                prop_assert_eq!(
                    result.size_reduction.is_zero(),
                    result.cost_reduction.is_zero()
                );
                let original: Coin = outputs.iter().map(|o| o.coin).sum();
                let reduced: Coin = result.reduced_outputs.iter().map(|o| o.coin).sum();
                prop_assert!((original - reduced) + result.cost_reduction >= target);
            }
            None => {
                let spare: Coin = outputs
                    .iter()
                    .map(|o| o.coin - params.minimum_ada_quantity(&o.tokens))
                    .sum();
                prop_assert!(spare < target);
            }
        }
    }

    // The minimize-excess contract: exact accounting, monotone coin, and
    // the one-atom stopping rule.
    #[test]
    fn minimizing_fee_excess_accounts_exactly(
        params in arbitrary_params(),
        output in arbitrary_bundle(),
        excess in 0u64..200_000,
    ) {
        let excess = Coin::from_atoms(excess);
        let (residual, enriched) = minimize_fee_excess(&params, excess, output.clone());
        prop_assert!(residual <= excess);
        prop_assert!(enriched.coin >= output.coin);
        prop_assert_eq!(enriched.tokens.clone(), output.tokens.clone());
        let coin_increase = enriched.coin - output.coin;
        let cost_increase =
            params.cost_of_output(&enriched) - params.cost_of_output(&output);
        prop_assert_eq!(coin_increase + cost_increase + residual, excess);
        if !residual.is_zero() {
            let raised = enriched.with_coin(enriched.coin + Coin::from_atoms(1));
            let marginal = params.cost_of_output(&raised) - params.cost_of_output(&enriched);
            prop_assert!(marginal >= residual);
        }
    }

    // Full failure is evidence: any reported limit really was exceeded.
    #[test]
    fn full_selections_report_a_genuine_excess(
        params in arbitrary_params(),
        maximum in 0u64..300,
        inputs in arbitrary_inputs(),
        entry in arbitrary_bundle(),
    ) {
        let params = MockSelectionParameters {
            maximum_size_of_selection: Size::from_units(maximum),
            ..params
        };
        let created = Selection::create(&params, Coin::ZERO, inputs);
        let mut failures = Vec::new();
        match created {
            Ok(base) => {
                let entry = (1_000u32, entry);
                failures.extend(
                    [
                        base.add_input_to_existing_output(&params, entry.clone()),
                        base.add_input_to_new_output_without_reclaiming_ada(
                            &params,
                            entry.clone(),
                        ),
                        base.add_input_to_new_output(&params, entry),
                    ]
                    .into_iter()
                    .filter_map(Result::err),
                );
            }
            Err(error) => failures.push(error),
        }
        for failure in failures {
            if let SelectionError::Full(e) = failure {
                prop_assert!(
                    e.size_maximum < e.size_required,
                    "claimed full at {} with only {} required",
                    e.size_maximum,
                    e.size_required
                );
            }
        }
    }
}
