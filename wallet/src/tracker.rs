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

//! The layer above the submission primitives.
//!
//! [`Operation`] composes primitives into the intents the node-sync layer
//! actually expresses (roll forward, roll back, prune), and [`Tracker`]
//! binds a store of submissions to a journaled [`storage`] backend so that a
//! batch of transitions is either fully persisted or not at all.

use crate::primitive::{HasTxId, Slot, TxId};
use crate::submissions::{Primitive, SubmissionStore};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use storage::{Store, StoreTxn, WalletId};

/// A higher-level intent over the submission store, compiled down to
/// primitives by [`SubmissionStore::apply_operation`].
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Operation<Tx> {
    /// Starts tracking a freshly submitted transaction.
    AddSubmission { expiring: Slot, tx: Tx },
    /// The chain advanced to `tip`, including the listed transactions at
    /// their acceptance slots on the way.
    RollForward {
        tip: Slot,
        included: Vec<(Slot, TxId)>,
    },
    /// The chain switched to a fork; the wallet's view retreats to `slot`.
    RollBack { slot: Slot },
    /// Everything at or before `finality` is now irreversible.
    Prune { finality: Slot },
    /// Stops tracking a transaction.
    Forget { tx_id: TxId },
}

impl<Tx: HasTxId + Clone> SubmissionStore<Tx> {
    /// Applies one composite operation. The result always satisfies the
    /// store invariants, which is debug-asserted here.
    #[must_use = "applying an operation produces a new store"]
    pub fn apply_operation(&self, operation: &Operation<Tx>) -> Self {
        let next = match operation {
            Operation::AddSubmission { expiring, tx } => {
                self.apply_primitive(&Primitive::AddSubmission {
                    expiring: *expiring,
                    tx: tx.clone(),
                })
            }
            Operation::RollForward { tip, included } => {
                let mut store = self.clone();
                for (acceptance, tx_id) in included {
                    store = store.apply_primitive(&Primitive::MoveToLedger {
                        acceptance: *acceptance,
                        tx_id: *tx_id,
                    });
                }
                store.apply_primitive(&Primitive::MoveTip { tip: *tip })
            }
            Operation::RollBack { slot } => {
                self.apply_primitive(&Primitive::MoveTip { tip: *slot })
            }
            Operation::Prune { finality } => self.apply_primitive(&Primitive::MoveFinality {
                finality: *finality,
            }),
            Operation::Forget { tx_id } => {
                self.apply_primitive(&Primitive::Forget { tx_id: *tx_id })
            }
        };
        debug_assert!(
            next.check_invariant().holds(),
            "operation broke a store invariant: {}",
            next.check_invariant()
        );
        next
    }
}

/// One wallet's submission store bound to a journaled backend.
///
/// The backend owns the lock; every method here is one atomic transaction,
/// so concurrent readers only ever observe fully-applied batches. Snapshots
/// returned to callers are plain values and stay consistent forever.
pub struct Tracker<Tx, C, St> {
    store: St,
    _marker: PhantomData<(Tx, C)>,
}

impl<Tx, C, St> Tracker<Tx, C, St>
where
    Tx: HasTxId + Clone,
    St: Store<Slot, SubmissionStore<Tx>, C>,
{
    pub fn new(store: St) -> Tracker<Tx, C, St> {
        Tracker {
            store,
            _marker: PhantomData,
        }
    }

    /// A snapshot of the wallet's submissions.
    pub fn submissions(&self, wallet: &WalletId) -> Result<SubmissionStore<Tx>, St::Error> {
        self.store.atomically(|txn| Ok(txn.read_submissions(wallet)))
    }

    /// Applies one primitive and persists the result, returning the new
    /// snapshot.
    pub fn apply_primitive(
        &self,
        wallet: &WalletId,
        primitive: &Primitive<Tx>,
    ) -> Result<SubmissionStore<Tx>, St::Error> {
        self.store.atomically(|txn| {
            let next = txn.read_submissions(wallet).apply_primitive(primitive);
            txn.write_submissions(wallet, next.clone());
            Ok(next)
        })
    }

    /// Applies one composite operation and persists the result, returning
    /// the new snapshot.
    pub fn apply_operation(
        &self,
        wallet: &WalletId,
        operation: &Operation<Tx>,
    ) -> Result<SubmissionStore<Tx>, St::Error> {
        self.store.atomically(|txn| {
            let next = txn.read_submissions(wallet).apply_operation(operation);
            txn.write_submissions(wallet, next.clone());
            Ok(next)
        })
    }

    /// Rolls the backend back to the nearest checkpoint at or before
    /// `slot`, then moves the submission tip to the slot actually reached,
    /// all in the same transaction, so the two can never diverge. Returns
    /// that slot and the new snapshot.
    pub fn rollback_to(
        &self,
        wallet: &WalletId,
        slot: Slot,
    ) -> Result<(Slot, SubmissionStore<Tx>), St::Error> {
        self.store.atomically(|txn| {
            let reached = txn.rollback_to(wallet, slot);
            let next = txn
                .read_submissions(wallet)
                .apply_primitive(&Primitive::MoveTip { tip: reached });
            txn.write_submissions(wallet, next.clone());
            Ok((reached, next))
        })
    }

    pub fn put_checkpoint(
        &self,
        wallet: &WalletId,
        slot: Slot,
        checkpoint: C,
    ) -> Result<(), St::Error> {
        self.store.atomically(|txn| {
            txn.put_checkpoint(wallet, slot, checkpoint);
            Ok(())
        })
    }

    pub fn read_checkpoint(
        &self,
        wallet: &WalletId,
        slot: Slot,
    ) -> Result<Option<C>, St::Error> {
        self.store.atomically(|txn| Ok(txn.read_checkpoint(wallet, slot)))
    }

    pub fn list_checkpoints(&self, wallet: &WalletId) -> Result<Vec<Slot>, St::Error> {
        self.store.atomically(|txn| Ok(txn.list_checkpoints(wallet)))
    }
}
