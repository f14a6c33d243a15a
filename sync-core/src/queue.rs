/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::collections::VecDeque;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A remote operation the executor must apply to bring the replica in line with a local path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Sync,
    Remove,
    MakeDir,
    RemoveDir,
    ChangePerm,
}

/// One entry of the sync queue. `mode` is populated for [`Action::MakeDir`] and
/// [`Action::ChangePerm`], `None` otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteOp {
    pub path: PathBuf,
    pub action: Action,
    pub mode: Option<u32>,
}

impl RemoteOp {
    pub fn new(path: PathBuf, action: Action, mode: Option<u32>) -> Self {
        Self { path, action, mode }
    }
}

/// Durable, ordered FIFO of pending remote operations. The executor consumes only from the
/// front; the decider appends only to the back.
pub type SyncQueue = VecDeque<RemoteOp>;
