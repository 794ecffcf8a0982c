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

use crate::primitive::{Size, Slot, TxId};
use coin_structure::Coin;
use std::error::Error;
use std::fmt::{self, Display, Formatter};

/// Why a selection could not be created or extended.
///
/// Both cases are reports, not faults: the caller decides whether to supply
/// more value, stop packing, or start a fresh selection.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SelectionError {
    /// The ada supplied by inputs and reward withdrawal falls short of the
    /// fees and minimum-ada requirements of every feasible arrangement.
    AdaInsufficient,
    /// Even the tightest packing exceeds a size limit.
    Full(SelectionFullError),
}

/// The evidence accompanying [`SelectionError::Full`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SelectionFullError {
    /// The limit that was exceeded.
    pub size_maximum: Size,
    /// The size the rejected arrangement would have needed.
    pub size_required: Size,
}

impl Display for SelectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SelectionError::AdaInsufficient => {
                write!(f, "insufficient ada to cover fees and minimum output ada")
            }
            SelectionError::Full(e) => e.fmt(f),
        }
    }
}

impl Display for SelectionFullError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "selection requires size {} but at most {} is available",
            self.size_required, self.size_maximum
        )
    }
}

impl Error for SelectionError {}

impl From<SelectionFullError> for SelectionError {
    fn from(e: SelectionFullError) -> Self {
        SelectionError::Full(e)
    }
}

/// The outcome of checking a selection against its invariants.
///
/// Anything but [`SelectionInvariantStatus::Holds`] indicates a bug in the
/// engine, never a user error; these values feed tests and diagnostics only.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SelectionInvariantStatus {
    Holds,
    /// Input and output token maps differ.
    AssetBalanceIncorrect,
    /// Consumed and produced ada differ.
    CoinBalanceIncorrect { consumed: Coin, produced: Coin },
    /// An output's coin is below the minimum for its token map.
    OutputBelowMinimumAda { output_index: usize },
    /// An output exceeds the per-output size limit.
    OutputSizeExceedsLimit { output_index: usize },
    /// The whole selection exceeds the selection size limit.
    SizeExceedsLimit { size: Size, maximum: Size },
    /// The cached size disagrees with a recomputation.
    SizeIncorrect { cached: Size, computed: Size },
    /// Some output could still absorb the remaining fee excess.
    FeeExcessNotMinimal {
        output_index: usize,
        fee_excess: Coin,
        marginal_cost: Coin,
    },
}

impl SelectionInvariantStatus {
    pub fn holds(&self) -> bool {
        matches!(self, SelectionInvariantStatus::Holds)
    }
}

impl Display for SelectionInvariantStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SelectionInvariantStatus::Holds => write!(f, "selection invariants hold"),
            SelectionInvariantStatus::AssetBalanceIncorrect => {
                write!(f, "input and output token balances differ")
            }
            SelectionInvariantStatus::CoinBalanceIncorrect { consumed, produced } => {
                write!(f, "consumed {consumed} ada but produced {produced}")
            }
            SelectionInvariantStatus::OutputBelowMinimumAda { output_index } => {
                write!(f, "output {output_index} is below its minimum ada quantity")
            }
            SelectionInvariantStatus::OutputSizeExceedsLimit { output_index } => {
                write!(f, "output {output_index} exceeds the per-output size limit")
            }
            SelectionInvariantStatus::SizeExceedsLimit { size, maximum } => {
                write!(f, "selection size {size} exceeds the limit of {maximum}")
            }
            SelectionInvariantStatus::SizeIncorrect { cached, computed } => {
                write!(f, "cached size {cached} disagrees with recomputed size {computed}")
            }
            SelectionInvariantStatus::FeeExcessNotMinimal {
                output_index,
                fee_excess,
                marginal_cost,
            } => write!(
                f,
                "output {output_index} could absorb more of the fee excess \
                 ({fee_excess} remaining, marginal cost {marginal_cost})"
            ),
        }
    }
}

/// The outcome of checking a submission store against its invariants.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SubmissionInvariantStatus {
    Holds,
    /// `finality` has overtaken `tip`.
    FinalityExceedsTip { finality: Slot, tip: Slot },
    /// An in-submission entry has already expired relative to the tip.
    InSubmissionNotAfterTip { tx_id: TxId, expiring: Slot, tip: Slot },
    /// An in-ledger entry claims acceptance after the tip.
    InLedgerAcceptedAfterTip { tx_id: TxId, acceptance: Slot, tip: Slot },
    /// An in-ledger entry claims acceptance after its own expiry.
    InLedgerAcceptedAfterExpiry {
        tx_id: TxId,
        acceptance: Slot,
        expiring: Slot,
    },
    /// An expired entry has an expiry still in the tip's future.
    ExpiredAfterTip { tx_id: TxId, expiring: Slot, tip: Slot },
}

impl SubmissionInvariantStatus {
    pub fn holds(&self) -> bool {
        matches!(self, SubmissionInvariantStatus::Holds)
    }
}

impl Display for SubmissionInvariantStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionInvariantStatus::Holds => write!(f, "submission store invariants hold"),
            SubmissionInvariantStatus::FinalityExceedsTip { finality, tip } => {
                write!(f, "finality {finality} exceeds tip {tip}")
            }
            SubmissionInvariantStatus::InSubmissionNotAfterTip { tx_id, expiring, tip } => {
                write!(
                    f,
                    "in-submission transaction {tx_id} expires at {expiring}, \
                     at or before tip {tip}"
                )
            }
            SubmissionInvariantStatus::InLedgerAcceptedAfterTip { tx_id, acceptance, tip } => {
                write!(
                    f,
                    "in-ledger transaction {tx_id} accepted at {acceptance}, after tip {tip}"
                )
            }
            SubmissionInvariantStatus::InLedgerAcceptedAfterExpiry {
                tx_id,
                acceptance,
                expiring,
            } => write!(
                f,
                "in-ledger transaction {tx_id} accepted at {acceptance}, \
                 after its expiry {expiring}"
            ),
            SubmissionInvariantStatus::ExpiredAfterTip { tx_id, expiring, tip } => {
                write!(
                    f,
                    "expired transaction {tx_id} expires at {expiring}, after tip {tip}"
                )
            }
        }
    }
}
