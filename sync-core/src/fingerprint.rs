/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Last-known content hash and POSIX mode bits of a regular file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFingerprint {
    pub sha1: [u8; 20],
    pub mode: u32,
}

impl FileFingerprint {
    pub fn sha1_hex(&self) -> String {
        self.sha1.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

/// Durable `Path -> FileFingerprint` index. Entries exist only for regular files that were
/// present on disk the last time they were hashed; directories never appear here.
pub type HashIndex = HashMap<PathBuf, FileFingerprint>;
