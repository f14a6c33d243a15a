/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::path::Path;

use anyhow::Context;
use log::info;
use sync_core::{ActionMap, Intent, IntentKind, durable::DurableStore};
use walkdir::WalkDir;

/// Walk the whole watched tree and inject a `created`/`created_dir` intent for every entry,
/// overwriting any existing action-map entry for that path. Run once at startup so mutations
/// that happened while no capturer was running are still picked up.
pub fn rescan(root: &Path, store: &DurableStore<ActionMap>) -> anyhow::Result<()> {
    info!("starting tree re-scan of '{}'", root.display());
    let mut map = store.snapshot_or_default();
    let mut seen = 0usize;
    for entry in WalkDir::new(root).min_depth(1) {
        let entry = entry.with_context(|| format!("failed to walk '{}'", root.display()))?;
        let kind = if entry.file_type().is_dir() {
            IntentKind::CreatedDir
        } else {
            IntentKind::Created
        };
        map.insert(entry.path().to_path_buf(), Intent::now(kind));
        seen += 1;
    }
    store
        .commit(&map)
        .with_context(|| "failed to commit action map after startup re-scan")?;
    info!("re-scan complete, {} entries injected", seen);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn rescan_injects_existing_tree() {
        let root = tempdir().unwrap();
        std::fs::write(root.path().join("a.txt"), b"x").unwrap();
        std::fs::create_dir(root.path().join("sub")).unwrap();
        std::fs::write(root.path().join("sub/b.txt"), b"y").unwrap();

        let state_dir = tempdir().unwrap();
        let store = DurableStore::new(state_dir.path().join("action_map"));
        rescan(root.path(), &store).unwrap();

        let map = store.snapshot().unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(
            map[&root.path().join("a.txt")].kind,
            IntentKind::Created
        );
        assert_eq!(
            map[&root.path().join("sub")].kind,
            IntentKind::CreatedDir
        );
    }
}
