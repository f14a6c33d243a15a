/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::path::PathBuf;

use anyhow::Context;
use log::info;
use rand::seq::IteratorRandom;
use sync_core::durable::DurableStore;
use sync_core::hashing::{mode_of, sha1_file};
use sync_core::{Action, ActionMap, FileFingerprint, HashIndex, Intent, IntentKind, RemoteOp, SyncQueue};

pub struct Stores<'a> {
    pub action_map: &'a DurableStore<ActionMap>,
    pub hash_index: &'a DurableStore<HashIndex>,
    pub sync_queue: &'a DurableStore<SyncQueue>,
}

/// Choose one path uniformly at random from the current action map. Re-sampled on every call
/// so that a path which keeps changing cannot starve the rest of the tree out of processing:
/// the staleness check below will keep failing for it and the random draw will keep moving on.
pub fn pick_random_path(map: &ActionMap) -> Option<PathBuf> {
    map.keys().cloned().choose(&mut rand::thread_rng())
}

/// Process one path to completion: classify, update the hash index, and — only if the intent
/// has not been superseded in the meantime — enqueue the resulting remote op.
///
/// Returns `true` if there is more work that can be attempted immediately (i.e. the action map
/// was non-empty when this call began).
pub fn process_one(stores: &Stores) -> anyhow::Result<bool> {
    let map = stores
        .action_map
        .snapshot_or_empty()
        .with_context(|| "action map unreadable at runtime")?;
    let Some(path) = pick_random_path(&map) else {
        return Ok(false);
    };
    let intent = map[&path];

    let action = classify(stores, &path, intent.kind)?;
    check_not_stale_and_enqueue(stores, &path, intent.timestamp, action)?;
    Ok(true)
}

/// Compute the remote action implied by one intent, updating the hash index along the way for
/// file-kind intents. Returns `None` when nothing needs to change on the remote, or when a
/// local read failed (in which case the caller's staleness check still runs, but with nothing
/// to enqueue).
fn classify(
    stores: &Stores,
    path: &std::path::Path,
    kind: IntentKind,
) -> anyhow::Result<Option<RemoteOp>> {
    match kind {
        IntentKind::Created | IntentKind::Changed | IntentKind::Attrib => {
            let sha1 = match sha1_file(path) {
                Ok(sha1) => sha1,
                Err(err) => {
                    info!("could not hash '{}', skipping this round: {}", path.display(), err);
                    return Ok(None);
                }
            };
            let mode = match mode_of(path) {
                Ok(mode) => mode,
                Err(err) => {
                    info!("could not stat '{}', skipping this round: {}", path.display(), err);
                    return Ok(None);
                }
            };

            let mut index = stores
                .hash_index
                .snapshot_or_empty()
                .with_context(|| "hash index unreadable at runtime")?;
            let action = match index.get(path) {
                Some(old) if old.sha1 != sha1 => Some(RemoteOp::new(path.to_path_buf(), Action::Sync, None)),
                Some(old) if old.mode != mode => {
                    Some(RemoteOp::new(path.to_path_buf(), Action::ChangePerm, Some(mode)))
                }
                Some(_) => None,
                None => Some(RemoteOp::new(path.to_path_buf(), Action::Sync, None)),
            };
            index.insert(path.to_path_buf(), FileFingerprint { sha1, mode });
            stores
                .hash_index
                .commit(&index)
                .with_context(|| "failed to commit hash index")?;
            Ok(action)
        }
        IntentKind::Deleted => {
            let mut index = stores
                .hash_index
                .snapshot_or_empty()
                .with_context(|| "hash index unreadable at runtime")?;
            index.remove(path);
            stores
                .hash_index
                .commit(&index)
                .with_context(|| "failed to commit hash index")?;
            Ok(Some(RemoteOp::new(path.to_path_buf(), Action::Remove, None)))
        }
        IntentKind::CreatedDir => match mode_of(path) {
            Ok(mode) => Ok(Some(RemoteOp::new(path.to_path_buf(), Action::MakeDir, Some(mode)))),
            Err(err) => {
                info!("could not stat dir '{}', skipping this round: {}", path.display(), err);
                Ok(None)
            }
        },
        IntentKind::DeletedDir => Ok(Some(RemoteOp::new(path.to_path_buf(), Action::RemoveDir, None))),
        IntentKind::AttribDir => match mode_of(path) {
            Ok(mode) => Ok(Some(RemoteOp::new(path.to_path_buf(), Action::ChangePerm, Some(mode)))),
            Err(err) => {
                info!("could not stat dir '{}', skipping this round: {}", path.display(), err);
                Ok(None)
            }
        },
    }
}

/// The staleness check: re-read the action map and compare the stored timestamp to the one
/// this iteration started with. If unchanged, the intent has been fully handled — drop it and
/// (if one was computed) enqueue the action. If a newer event arrived in the meantime, leave
/// the action map entry in place for the next iteration and discard the computed action
/// entirely: enqueuing it would apply a decision based on content that has since moved on.
fn check_not_stale_and_enqueue(
    stores: &Stores,
    path: &std::path::Path,
    observed_at: u128,
    action: Option<RemoteOp>,
) -> anyhow::Result<()> {
    let mut map = stores
        .action_map
        .snapshot_or_empty()
        .with_context(|| "action map unreadable at runtime")?;
    let still_current = match map.get(path) {
        Some(Intent { timestamp, .. }) => *timestamp == observed_at,
        None => true,
    };

    if !still_current {
        return Ok(());
    }

    map.remove(path);
    stores
        .action_map
        .commit(&map)
        .with_context(|| "failed to commit action map")?;

    if let Some(op) = action {
        let mut queue = stores
            .sync_queue
            .snapshot_or_empty()
            .with_context(|| "sync queue unreadable at runtime")?;
        queue.push_back(op);
        stores
            .sync_queue
            .commit(&queue)
            .with_context(|| "failed to commit sync queue")?;
    }
    Ok(())
}
