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

//! The store trait and its in-memory reference implementation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Identifies one wallet within a store holding several.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct WalletId(String);

impl WalletId {
    pub fn new(id: impl Into<String>) -> WalletId {
        WalletId(id.into())
    }
}

impl Display for WalletId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The operations available inside a single journaled transaction.
///
/// `S` is the slot type checkpoints are indexed by, `W` the submissions
/// payload, `C` the checkpoint payload. All three are opaque here; the wallet
/// crate instantiates them.
pub trait StoreTxn<S, W, C> {
    /// The submissions recorded for `wallet`; the empty value when none were
    /// ever written.
    fn read_submissions(&self, wallet: &WalletId) -> W;

    /// Replaces the submissions recorded for `wallet` wholesale.
    fn write_submissions(&mut self, wallet: &WalletId, value: W);

    fn read_checkpoint(&self, wallet: &WalletId, slot: S) -> Option<C>;

    fn put_checkpoint(&mut self, wallet: &WalletId, slot: S, checkpoint: C);

    /// Checkpointed slots for `wallet`, in ascending order.
    fn list_checkpoints(&self, wallet: &WalletId) -> Vec<S>;

    /// Rolls `wallet` back to the nearest checkpoint at or before `slot`,
    /// discarding every later checkpoint, and returns the slot actually
    /// rolled to. With no eligible checkpoint the wallet rolls to the slot
    /// minimum and keeps no checkpoints at all.
    fn rollback_to(&mut self, wallet: &WalletId, slot: S) -> S;
}

/// A store of per-wallet state with all-or-nothing write semantics.
pub trait Store<S, W, C> {
    type Txn: StoreTxn<S, W, C>;
    type Error: Error;

    /// Runs `body` against a transaction view. Writes become visible only if
    /// `body` returns `Ok`; on `Err` the store is left exactly as it was.
    fn atomically<R>(
        &self,
        body: impl FnOnce(&mut Self::Txn) -> Result<R, Self::Error>,
    ) -> Result<R, Self::Error>;
}

/// The error type of [`InMemoryStore`].
///
/// The store itself never fails; values of this type originate from
/// transaction bodies that abort.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct InMemoryError(pub String);

impl Display for InMemoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "in-memory store transaction aborted: {}", self.0)
    }
}

impl Error for InMemoryError {}

#[derive(Clone)]
struct Shelves<S, W, C> {
    submissions: BTreeMap<WalletId, W>,
    checkpoints: BTreeMap<WalletId, BTreeMap<S, C>>,
}

impl<S, W, C> Default for Shelves<S, W, C> {
    fn default() -> Self {
        Shelves {
            submissions: BTreeMap::new(),
            checkpoints: BTreeMap::new(),
        }
    }
}

/// A [`Store`] kept entirely in memory.
///
/// Transactions clone the current state and work on the copy; committing
/// swaps the copy in under the lock. Readers of a snapshot they obtained
/// earlier are never affected by later commits.
pub struct InMemoryStore<S, W, C> {
    inner: Mutex<Shelves<S, W, C>>,
}

impl<S, W, C> Default for InMemoryStore<S, W, C> {
    fn default() -> Self {
        InMemoryStore {
            inner: Mutex::new(Shelves::default()),
        }
    }
}

impl<S, W, C> InMemoryStore<S, W, C> {
    pub fn new() -> InMemoryStore<S, W, C> {
        InMemoryStore::default()
    }

    fn lock(&self) -> MutexGuard<'_, Shelves<S, W, C>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The working copy a transaction body mutates.
pub struct InMemoryTxn<S, W, C> {
    shelves: Shelves<S, W, C>,
}

impl<S, W, C> StoreTxn<S, W, C> for InMemoryTxn<S, W, C>
where
    S: Ord + Copy + Default,
    W: Clone + Default,
    C: Clone,
{
    fn read_submissions(&self, wallet: &WalletId) -> W {
        self.shelves
            .submissions
            .get(wallet)
            .cloned()
            .unwrap_or_default()
    }

    fn write_submissions(&mut self, wallet: &WalletId, value: W) {
        self.shelves.submissions.insert(wallet.clone(), value);
    }

    fn read_checkpoint(&self, wallet: &WalletId, slot: S) -> Option<C> {
        self.shelves
            .checkpoints
            .get(wallet)
            .and_then(|slots| slots.get(&slot))
            .cloned()
    }

    fn put_checkpoint(&mut self, wallet: &WalletId, slot: S, checkpoint: C) {
        self.shelves
            .checkpoints
            .entry(wallet.clone())
            .or_default()
            .insert(slot, checkpoint);
    }

    fn list_checkpoints(&self, wallet: &WalletId) -> Vec<S> {
        self.shelves
            .checkpoints
            .get(wallet)
            .map(|slots| slots.keys().copied().collect())
            .unwrap_or_default()
    }

    fn rollback_to(&mut self, wallet: &WalletId, slot: S) -> S {
        let slots = self.shelves.checkpoints.entry(wallet.clone()).or_default();
        let target = slots
            .range(..=slot)
            .next_back()
            .map(|(found, _)| *found)
            .unwrap_or_default();
        slots.retain(|checkpointed, _| *checkpointed <= target);
        target
    }
}

impl<S, W, C> Store<S, W, C> for InMemoryStore<S, W, C>
where
    S: Ord + Copy + Default,
    W: Clone + Default,
    C: Clone,
{
    type Txn = InMemoryTxn<S, W, C>;
    type Error = InMemoryError;

    fn atomically<R>(
        &self,
        body: impl FnOnce(&mut Self::Txn) -> Result<R, Self::Error>,
    ) -> Result<R, Self::Error> {
        let mut guard = self.lock();
        let mut txn = InMemoryTxn {
            shelves: guard.clone(),
        };
        let result = body(&mut txn)?;
        *guard = txn.shelves;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestStore = InMemoryStore<u64, Vec<u8>, String>;

    fn wallet(name: &str) -> WalletId {
        WalletId::new(name)
    }

    #[test]
    fn unwritten_submissions_read_as_empty() {
        let store = TestStore::new();
        let read = store
            .atomically(|txn| Ok(txn.read_submissions(&wallet("w"))))
            .unwrap();
        assert!(read.is_empty());
    }

    #[test]
    fn commits_are_visible_to_later_transactions() {
        let store = TestStore::new();
        store
            .atomically(|txn| {
                txn.write_submissions(&wallet("w"), vec![1, 2, 3]);
                Ok(())
            })
            .unwrap();
        let read = store
            .atomically(|txn| Ok(txn.read_submissions(&wallet("w"))))
            .unwrap();
        assert_eq!(read, vec![1, 2, 3]);
    }

    #[test]
    fn aborted_transactions_leave_no_trace() {
        let store = TestStore::new();
        store
            .atomically(|txn| {
                txn.write_submissions(&wallet("w"), vec![9]);
                Ok(())
            })
            .unwrap();
        let aborted: Result<(), _> = store.atomically(|txn| {
            txn.write_submissions(&wallet("w"), vec![7]);
            txn.put_checkpoint(&wallet("w"), 10, "ten".into());
            Err(InMemoryError("deliberate".into()))
        });
        assert!(aborted.is_err());
        store
            .atomically(|txn| {
                assert_eq!(txn.read_submissions(&wallet("w")), vec![9]);
                assert!(txn.list_checkpoints(&wallet("w")).is_empty());
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn checkpoints_list_in_ascending_order() {
        let store = TestStore::new();
        store
            .atomically(|txn| {
                for slot in [30u64, 10, 20] {
                    txn.put_checkpoint(&wallet("w"), slot, slot.to_string());
                }
                assert_eq!(txn.list_checkpoints(&wallet("w")), vec![10, 20, 30]);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn rollback_picks_the_nearest_earlier_checkpoint() {
        let store = TestStore::new();
        store
            .atomically(|txn| {
                for slot in [10u64, 20, 30] {
                    txn.put_checkpoint(&wallet("w"), slot, slot.to_string());
                }
                assert_eq!(txn.rollback_to(&wallet("w"), 25), 20);
                assert_eq!(txn.list_checkpoints(&wallet("w")), vec![10, 20]);
                assert_eq!(txn.read_checkpoint(&wallet("w"), 20), Some("20".into()));
                assert_eq!(txn.read_checkpoint(&wallet("w"), 30), None);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn rollback_with_no_earlier_checkpoint_goes_to_the_minimum() {
        let store = TestStore::new();
        store
            .atomically(|txn| {
                txn.put_checkpoint(&wallet("w"), 50, "fifty".into());
                assert_eq!(txn.rollback_to(&wallet("w"), 40), 0);
                assert!(txn.list_checkpoints(&wallet("w")).is_empty());
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn wallets_are_isolated() {
        let store = TestStore::new();
        store
            .atomically(|txn| {
                txn.write_submissions(&wallet("a"), vec![1]);
                txn.write_submissions(&wallet("b"), vec![2]);
                txn.put_checkpoint(&wallet("a"), 5, "five".into());
                Ok(())
            })
            .unwrap();
        store
            .atomically(|txn| {
                assert_eq!(txn.read_submissions(&wallet("a")), vec![1]);
                assert_eq!(txn.read_submissions(&wallet("b")), vec![2]);
                assert!(txn.list_checkpoints(&wallet("b")).is_empty());
                Ok(())
            })
            .unwrap();
    }
}
