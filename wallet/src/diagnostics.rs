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

//! Diagnostic logging for the wallet cores.
//!
//! The engine and the submission store emit exactly two streams of events:
//! `warn` when a request is rejected or silently dropped, and `trace` when a
//! transition settles. [`init_diagnostics`] surfaces one or both; tests call
//! it when a failure needs narrating.

use tracing_subscriber::filter::LevelFilter;

/// How much of the wallet's diagnostics to surface.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Diagnostics {
    /// Nothing at all.
    Silent,
    /// Rejected and dropped requests only.
    Rejections,
    /// Every settled transition as well.
    Everything,
}

/// Installs a process-wide subscriber for the chosen diagnostics stream.
/// Calling it again, or alongside another subscriber, is a no-op.
pub fn init_diagnostics(diagnostics: Diagnostics) {
    let level = match diagnostics {
        Diagnostics::Silent => LevelFilter::OFF,
        Diagnostics::Rejections => LevelFilter::WARN,
        Diagnostics::Everything => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init()
        .ok();
}
