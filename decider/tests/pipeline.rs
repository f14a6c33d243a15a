/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! End-to-end decider scenarios driving the action map to the sync queue, without a real
//! filesystem watcher: the action map is populated directly, the way a capturer would.

use std::os::unix::fs::PermissionsExt;

use decider::decide::{self, Stores};
use sync_core::durable::DurableStore;
use sync_core::{Action, ActionMap, HashIndex, Intent, IntentKind, SyncQueue};
use tempfile::tempdir;

#[test]
fn create_then_chmod_then_delete_drains_in_order() {
    let root = tempdir().unwrap();
    let file = root.path().join("a.txt");
    std::fs::write(&file, b"hello").unwrap();

    let state = tempdir().unwrap();
    let action_map: DurableStore<ActionMap> = DurableStore::new(state.path().join("am"));
    let hash_index: DurableStore<HashIndex> = DurableStore::new(state.path().join("hi"));
    let sync_queue: DurableStore<SyncQueue> = DurableStore::new(state.path().join("sq"));
    let stores = Stores { action_map: &action_map, hash_index: &hash_index, sync_queue: &sync_queue };

    let mut map = ActionMap::new();
    map.insert(file.clone(), Intent::now(IntentKind::Created));
    action_map.commit(&map).unwrap();
    assert!(decide::process_one(&stores).unwrap());

    let queue = sync_queue.snapshot().unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].action, Action::Sync);

    std::fs::set_permissions(&file, std::fs::Permissions::from_mode(0o600)).unwrap();
    let mut map = ActionMap::new();
    map.insert(file.clone(), Intent::now(IntentKind::Attrib));
    action_map.commit(&map).unwrap();
    decide::process_one(&stores).unwrap();

    let queue = sync_queue.snapshot().unwrap();
    assert_eq!(queue.len(), 2);
    assert_eq!(queue[1].action, Action::ChangePerm);
    assert_eq!(queue[1].mode, Some(0o600));

    std::fs::remove_file(&file).unwrap();
    let mut map = ActionMap::new();
    map.insert(file.clone(), Intent::now(IntentKind::Deleted));
    action_map.commit(&map).unwrap();
    decide::process_one(&stores).unwrap();

    let queue = sync_queue.snapshot().unwrap();
    assert_eq!(queue.len(), 3);
    assert_eq!(queue[2].action, Action::Remove);
    assert!(!hash_index.snapshot().unwrap().contains_key(&file));
}

#[test]
fn directory_creation_enqueues_make_dir() {
    let root = tempdir().unwrap();
    let dir = root.path().join("sub");
    std::fs::create_dir(&dir).unwrap();
    std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o755)).unwrap();

    let state = tempdir().unwrap();
    let action_map: DurableStore<ActionMap> = DurableStore::new(state.path().join("am"));
    let hash_index: DurableStore<HashIndex> = DurableStore::new(state.path().join("hi"));
    let sync_queue: DurableStore<SyncQueue> = DurableStore::new(state.path().join("sq"));
    let stores = Stores { action_map: &action_map, hash_index: &hash_index, sync_queue: &sync_queue };

    let mut map = ActionMap::new();
    map.insert(dir.clone(), Intent::now(IntentKind::CreatedDir));
    action_map.commit(&map).unwrap();

    decide::process_one(&stores).unwrap();
    let queue = sync_queue.snapshot().unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].action, Action::MakeDir);
    assert_eq!(queue[0].mode, Some(0o755));
}

#[test]
fn empty_tree_leaves_everything_empty() {
    let state = tempdir().unwrap();
    let action_map: DurableStore<ActionMap> = DurableStore::new(state.path().join("am"));
    let hash_index: DurableStore<HashIndex> = DurableStore::new(state.path().join("hi"));
    let sync_queue: DurableStore<SyncQueue> = DurableStore::new(state.path().join("sq"));
    let stores = Stores { action_map: &action_map, hash_index: &hash_index, sync_queue: &sync_queue };

    assert!(!decide::process_one(&stores).unwrap());
    assert!(action_map.snapshot_or_default().is_empty());
    assert!(hash_index.snapshot_or_default().is_empty());
    assert!(sync_queue.snapshot_or_default().is_empty());
}
