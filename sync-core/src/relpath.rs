/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelPathError {
    #[error("path '{0}' is not under watch root '{1}'")]
    OutsideRoot(String, String),
}

/// Strip `root` off the front of `path`, yielding the path relative to the watched tree that is
/// shipped across the wire. Rejects any path that does not lie under `root`.
pub fn relative_to_root(root: &Path, path: &Path) -> Result<PathBuf, RelPathError> {
    path.strip_prefix(root)
        .map(PathBuf::from)
        .map_err(|_| RelPathError::OutsideRoot(path.display().to_string(), root.display().to_string()))
}
