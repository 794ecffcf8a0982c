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

//! The store of locally-submitted transactions.
//!
//! Every transaction the wallet has handed to the network is tracked here
//! through three states: [`TxStatus::InSubmission`] until it is seen on
//! chain, [`TxStatus::InLedger`] once a block includes it, and
//! [`TxStatus::Expired`] once the chain passes its expiry slot without
//! including it. Rolling the tip back can resurrect both of the latter
//! states into `InSubmission`; advancing finality prunes what can no longer
//! change.
//!
//! All primitives are total: anything stale or contradictory is a no-op, not
//! an error. That is a policy, not an accident, and it is what makes the
//! primitives safe to replay.

use crate::error::SubmissionInvariantStatus;
use crate::primitive::{HasTxId, Slot, TxId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where one tracked transaction currently stands.
///
/// Each status carries its own slot fields; the store never duplicates them.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum TxStatus<Tx> {
    /// Handed to the network; expected on chain strictly before `expiring`.
    InSubmission { expiring: Slot, tx: Tx },
    /// Seen in a block at slot `acceptance`.
    InLedger {
        expiring: Slot,
        acceptance: Slot,
        tx: Tx,
    },
    /// The chain passed `expiring` without including the transaction.
    Expired { expiring: Slot, tx: Tx },
}

impl<Tx> TxStatus<Tx> {
    pub fn expiring(&self) -> Slot {
        match self {
            TxStatus::InSubmission { expiring, .. }
            | TxStatus::InLedger { expiring, .. }
            | TxStatus::Expired { expiring, .. } => *expiring,
        }
    }

    /// The acceptance slot, for transactions currently in the ledger.
    pub fn acceptance(&self) -> Option<Slot> {
        match self {
            TxStatus::InLedger { acceptance, .. } => Some(*acceptance),
            _ => None,
        }
    }

    pub fn tx(&self) -> &Tx {
        match self {
            TxStatus::InSubmission { tx, .. }
            | TxStatus::InLedger { tx, .. }
            | TxStatus::Expired { tx, .. } => tx,
        }
    }

    pub fn is_in_submission(&self) -> bool {
        matches!(self, TxStatus::InSubmission { .. })
    }

    pub fn is_in_ledger(&self) -> bool {
        matches!(self, TxStatus::InLedger { .. })
    }

    pub fn is_expired(&self) -> bool {
        matches!(self, TxStatus::Expired { .. })
    }
}

/// The primitive transitions of the store. All of them are total.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Primitive<Tx> {
    /// Starts tracking a freshly submitted transaction.
    AddSubmission { expiring: Slot, tx: Tx },
    /// Records that a tracked submission was seen in a block.
    MoveToLedger { acceptance: Slot, tx_id: TxId },
    /// Moves the observed chain tip, resurrecting and expiring entries as
    /// the new tip dictates.
    MoveTip { tip: Slot },
    /// Advances the irreversibility horizon and prunes behind it.
    MoveFinality { finality: Slot },
    /// Stops tracking a transaction unconditionally.
    Forget { tx_id: TxId },
}

/// One wallet's view of its submitted transactions, indexed by slot.
///
/// `finality <= tip` always holds, and every entry's slot fields are
/// consistent with the tip; see [`SubmissionStore::check_invariant`].
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct SubmissionStore<Tx> {
    tip: Slot,
    finality: Slot,
    transactions: BTreeMap<TxId, TxStatus<Tx>>,
}

impl<Tx> Default for SubmissionStore<Tx> {
    fn default() -> Self {
        SubmissionStore {
            tip: Slot::MIN,
            finality: Slot::MIN,
            transactions: BTreeMap::new(),
        }
    }
}

impl<Tx> SubmissionStore<Tx> {
    /// The empty store, with tip and finality at the slot minimum.
    pub fn new() -> SubmissionStore<Tx> {
        SubmissionStore::default()
    }

    /// The latest slot observed on chain.
    pub fn tip(&self) -> Slot {
        self.tip
    }

    /// The latest slot treated as irreversible.
    pub fn finality(&self) -> Slot {
        self.finality
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn status(&self, tx_id: &TxId) -> Option<&TxStatus<Tx>> {
        self.transactions.get(tx_id)
    }

    /// All tracked transactions in `TxId` order.
    pub fn iter(&self) -> impl Iterator<Item = (&TxId, &TxStatus<Tx>)> {
        self.transactions.iter()
    }

    pub fn in_submission(&self) -> impl Iterator<Item = (&TxId, &TxStatus<Tx>)> {
        self.iter().filter(|(_, status)| status.is_in_submission())
    }

    pub fn in_ledger(&self) -> impl Iterator<Item = (&TxId, &TxStatus<Tx>)> {
        self.iter().filter(|(_, status)| status.is_in_ledger())
    }

    pub fn expired(&self) -> impl Iterator<Item = (&TxId, &TxStatus<Tx>)> {
        self.iter().filter(|(_, status)| status.is_expired())
    }

    /// Checks the store against its invariants; anything but `Holds` is a
    /// bug in the transition functions.
    pub fn check_invariant(&self) -> SubmissionInvariantStatus {
        if self.finality > self.tip {
            return SubmissionInvariantStatus::FinalityExceedsTip {
                finality: self.finality,
                tip: self.tip,
            };
        }
        for (tx_id, status) in &self.transactions {
            match status {
                TxStatus::InSubmission { expiring, .. } if *expiring <= self.tip => {
                    return SubmissionInvariantStatus::InSubmissionNotAfterTip {
                        tx_id: *tx_id,
                        expiring: *expiring,
                        tip: self.tip,
                    };
                }
                TxStatus::InLedger {
                    expiring,
                    acceptance,
                    ..
                } => {
                    if *acceptance > self.tip {
                        return SubmissionInvariantStatus::InLedgerAcceptedAfterTip {
                            tx_id: *tx_id,
                            acceptance: *acceptance,
                            tip: self.tip,
                        };
                    }
                    if *acceptance > *expiring {
                        return SubmissionInvariantStatus::InLedgerAcceptedAfterExpiry {
                            tx_id: *tx_id,
                            acceptance: *acceptance,
                            expiring: *expiring,
                        };
                    }
                }
                TxStatus::Expired { expiring, .. } if *expiring > self.tip => {
                    return SubmissionInvariantStatus::ExpiredAfterTip {
                        tx_id: *tx_id,
                        expiring: *expiring,
                        tip: self.tip,
                    };
                }
                _ => {}
            }
        }
        SubmissionInvariantStatus::Holds
    }
}

impl<Tx: HasTxId + Clone> SubmissionStore<Tx> {
    /// Applies one primitive, producing the next store. Total: stale or
    /// contradictory primitives leave the store unchanged.
    #[must_use = "applying a primitive produces a new store"]
    pub fn apply_primitive(&self, primitive: &Primitive<Tx>) -> Self {
        let mut next = self.clone();
        match primitive {
            Primitive::AddSubmission { expiring, tx } => {
                next.add_submission(*expiring, tx);
            }
            Primitive::MoveToLedger { acceptance, tx_id } => {
                next.move_to_ledger(*acceptance, tx_id);
            }
            Primitive::MoveTip { tip } => next.move_tip(*tip),
            Primitive::MoveFinality { finality } => next.move_finality(*finality),
            Primitive::Forget { tx_id } => {
                next.transactions.remove(tx_id);
            }
        }
        next
    }

    fn add_submission(&mut self, expiring: Slot, tx: &Tx) {
        if expiring <= self.tip {
            warn!(%expiring, tip = %self.tip, "submission already expired, dropping");
            return;
        }
        let tx_id = tx.tx_id();
        if self.transactions.contains_key(&tx_id) {
            warn!(%tx_id, "submission already tracked, dropping");
            return;
        }
        self.transactions.insert(
            tx_id,
            TxStatus::InSubmission {
                expiring,
                tx: tx.clone(),
            },
        );
    }

    fn move_to_ledger(&mut self, acceptance: Slot, tx_id: &TxId) {
        let tip = self.tip;
        let Some(status) = self.transactions.get_mut(tx_id) else {
            warn!(%tx_id, "acceptance for an untracked transaction, dropping");
            return;
        };
        let TxStatus::InSubmission { expiring, tx } = &*status else {
            warn!(%tx_id, "acceptance for a transaction not in submission, dropping");
            return;
        };
        let (expiring, tx) = (*expiring, tx.clone());
        if acceptance <= tip || acceptance > expiring {
            warn!(
                %tx_id,
                %acceptance,
                %tip,
                %expiring,
                "acceptance slot out of range, dropping"
            );
            return;
        }
        *status = TxStatus::InLedger {
            expiring,
            acceptance,
            tx,
        };
    }

    fn move_tip(&mut self, tip: Slot) {
        self.tip = tip;
        self.finality = Slot::min(self.finality, tip);
        let transactions = std::mem::take(&mut self.transactions);
        self.transactions = transactions
            .into_iter()
            .map(|(tx_id, status)| (tx_id, shift_status(status, tip)))
            .collect();
    }

    fn move_finality(&mut self, finality: Slot) {
        let finality = Slot::max(self.finality, Slot::min(finality, self.tip));
        self.finality = finality;
        self.transactions.retain(|_, status| match status {
            TxStatus::InSubmission { .. } => true,
            TxStatus::InLedger { acceptance, .. } => *acceptance > finality,
            TxStatus::Expired { expiring, .. } => *expiring > finality,
        });
    }
}

/// Re-derives one entry's status from a freshly moved tip: entries the new
/// tip no longer covers fall back to `InSubmission`, and submissions the tip
/// has passed expire.
fn shift_status<Tx>(status: TxStatus<Tx>, tip: Slot) -> TxStatus<Tx> {
    match status {
        TxStatus::InLedger {
            expiring,
            acceptance,
            tx,
        } if acceptance > tip => TxStatus::InSubmission { expiring, tx },
        TxStatus::InSubmission { expiring, tx } if expiring <= tip => {
            TxStatus::Expired { expiring, tx }
        }
        TxStatus::Expired { expiring, tx } if expiring > tip => {
            TxStatus::InSubmission { expiring, tx }
        }
        other => other,
    }
}
