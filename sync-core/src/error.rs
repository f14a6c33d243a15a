/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use thiserror::Error;

/// Errors produced by the durable snapshot/commit protocol.
#[derive(Error, Debug)]
pub enum DurableError {
    #[error("durable state file is missing: {0}")]
    Missing(String),
    #[error("failed to lock '{0}': {1}")]
    Lock(String, std::io::Error),
    #[error("io error on '{0}': {1}")]
    Io(String, std::io::Error),
    #[error("corrupt durable state at '{0}': {1}")]
    Corrupt(String, bincode::Error),
}
