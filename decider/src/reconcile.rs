/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use anyhow::Context;
use log::info;
use sync_core::durable::DurableStore;
use sync_core::{Action, HashIndex, RemoteOp, SyncQueue};

/// Startup reconciliation: drop any hash-index entry whose file no longer exists on disk, and
/// enqueue a `Remove` for it. Recovers deletions that happened while no decider was running.
pub fn reconcile(
    hash_store: &DurableStore<HashIndex>,
    queue_store: &DurableStore<SyncQueue>,
) -> anyhow::Result<()> {
    let mut index = hash_store.snapshot_or_default();
    let mut queue = queue_store.snapshot_or_default();

    let missing: Vec<_> = index
        .keys()
        .filter(|path| !path.exists())
        .cloned()
        .collect();

    for path in &missing {
        index.remove(path);
        queue.push_back(RemoteOp::new(path.clone(), Action::Remove, None));
    }

    if !missing.is_empty() {
        info!("reconciliation: {} vanished file(s) queued for removal", missing.len());
        hash_store
            .commit(&index)
            .with_context(|| "failed to commit hash index during reconciliation")?;
        queue_store
            .commit(&queue)
            .with_context(|| "failed to commit sync queue during reconciliation")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sync_core::FileFingerprint;
    use tempfile::tempdir;

    #[test]
    fn vanished_file_is_purged_and_queued() {
        let dir = tempdir().unwrap();
        let hash_store: DurableStore<HashIndex> = DurableStore::new(dir.path().join("hash_index"));
        let queue_store: DurableStore<SyncQueue> = DurableStore::new(dir.path().join("sync_queue"));

        let mut index = HashIndex::new();
        index.insert(
            dir.path().join("gone.txt"),
            FileFingerprint { sha1: [0; 20], mode: 0o644 },
        );
        hash_store.commit(&index).unwrap();

        reconcile(&hash_store, &queue_store).unwrap();

        assert!(hash_store.snapshot().unwrap().is_empty());
        let queue = queue_store.snapshot().unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].action, Action::Remove);
    }

    #[test]
    fn extant_file_is_left_alone() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("present.txt");
        std::fs::write(&file, b"x").unwrap();

        let hash_store: DurableStore<HashIndex> = DurableStore::new(dir.path().join("hash_index"));
        let queue_store: DurableStore<SyncQueue> = DurableStore::new(dir.path().join("sync_queue"));

        let mut index = HashIndex::new();
        index.insert(file.clone(), FileFingerprint { sha1: [0; 20], mode: 0o644 });
        hash_store.commit(&index).unwrap();

        reconcile(&hash_store, &queue_store).unwrap();

        assert_eq!(hash_store.snapshot().unwrap().len(), 1);
        assert!(matches!(queue_store.snapshot(), Err(sync_core::DurableError::Missing(_))));
    }
}
