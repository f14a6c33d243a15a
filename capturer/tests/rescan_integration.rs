/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use capturer::rescan::rescan;
use sync_core::durable::DurableStore;
use sync_core::ActionMap;
use tempfile::tempdir;

#[test]
fn empty_tree_produces_empty_action_map() {
    let root = tempdir().unwrap();
    let state = tempdir().unwrap();
    let store: DurableStore<ActionMap> = DurableStore::new(state.path().join("action_map"));

    rescan(root.path(), &store).unwrap();

    assert!(store.snapshot().unwrap().is_empty());
}

#[test]
fn rescan_is_idempotent_on_a_quiescent_tree() {
    let root = tempdir().unwrap();
    std::fs::write(root.path().join("a.txt"), b"x").unwrap();
    let state = tempdir().unwrap();
    let store: DurableStore<ActionMap> = DurableStore::new(state.path().join("action_map"));

    rescan(root.path(), &store).unwrap();
    let first = store.snapshot().unwrap();
    rescan(root.path(), &store).unwrap();
    let second = store.snapshot().unwrap();

    assert_eq!(first.len(), second.len());
    assert_eq!(first.keys().collect::<Vec<_>>(), second.keys().collect::<Vec<_>>());
}
