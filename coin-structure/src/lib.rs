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

//! Value types of the Eventide ledger as seen by the wallet: the native
//! [`coin::Coin`], multi-asset [`token::TokenMap`]s, and the
//! [`bundle::TokenBundle`] pairing of both, together with the monoid
//! arithmetic defined over them.

pub mod bundle;
pub mod coin;
pub mod token;

pub use bundle::TokenBundle;
pub use coin::{Coin, TokenQuantity};
pub use token::{AssetId, AssetName, PolicyId, TokenMap};
