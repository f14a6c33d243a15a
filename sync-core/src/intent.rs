/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// What kind of filesystem mutation was last observed at a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntentKind {
    Created,
    Changed,
    Attrib,
    Deleted,
    CreatedDir,
    DeletedDir,
    AttribDir,
}

/// A coalesced filesystem event: the latest known intent for one path, plus the observation
/// time used only to detect whether this intent has since been superseded (see
/// `decide::check_not_stale`), never for ordering between paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub kind: IntentKind,
    pub timestamp: u128,
}

impl Intent {
    pub fn now(kind: IntentKind) -> Self {
        Self {
            kind,
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("system clock before UNIX_EPOCH")
                .as_nanos(),
        }
    }
}

/// Durable `Path -> Intent` mapping produced by the capturer, drained by the decider.
/// At most one pending intent per path; a later event for the same path overwrites the prior
/// one and its timestamp.
pub type ActionMap = HashMap<PathBuf, Intent>;
