/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Shared durable state, hashing, config, logging, CLI and daemonization primitives used by
//! the `capturer`, `decider` and `executor` binaries.

pub mod cli;
pub mod config;
pub mod daemon;
pub mod durable;
pub mod error;
pub mod fingerprint;
pub mod hashing;
pub mod intent;
pub mod logging;
pub mod queue;
pub mod relpath;

pub use error::DurableError;
pub use fingerprint::{FileFingerprint, HashIndex};
pub use intent::{ActionMap, Intent, IntentKind};
pub use queue::{Action, RemoteOp, SyncQueue};
