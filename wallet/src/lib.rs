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

//! The two hard cores of the Eventide wallet: the migration selection engine,
//! which packs a wallet's balance into bulk transactions under fee and size
//! constraints, and the submission store, which tracks every locally
//! submitted transaction against the chain's tip and finality.
//!
//! Everything here is pure: operations are functions from state to state, and
//! all persistence happens behind the [`storage`] crate's journaled store.

#[macro_use]
extern crate tracing;

mod diagnostics;
pub mod error;
pub mod primitive;
pub mod selection;
pub mod submissions;
pub mod tracker;
pub mod verify;

pub use diagnostics::{Diagnostics, init_diagnostics};

#[cfg(feature = "test-utilities")]
pub mod test_utilities;
