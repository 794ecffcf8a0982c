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

#![deny(unreachable_pub)]
#![deny(warnings)]

//! The journaled store the wallet keeps its per-wallet state in.
//!
//! The wallet core is pure; everything that touches a disk lives behind the
//! [`db::Store`] trait defined here. Implementations are expected to be dumb:
//! they persist exactly what they are handed, and the only consistency they
//! owe the caller is the all-or-nothing semantics of [`db::Store::atomically`].

pub mod db;

pub use db::{InMemoryError, InMemoryStore, Store, StoreTxn, WalletId};
