/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::path::Path;

use anyhow::Context;
use log::{error, info, warn};
use sync_core::durable::DurableStore;
use sync_core::queue::Action;
use sync_core::relpath::relative_to_root;
use sync_core::{RemoteOp, SyncQueue};

use crate::remote::{Outcome, RemoteOps};

/// What happened when the executor attempted to advance the queue by one op.
pub enum StepResult {
    /// The queue was empty; caller should sleep the idle interval.
    Empty,
    /// An op was handled (successfully, or dropped as unrecoverable).
    Done,
    /// The head op timed out and is still at the head; caller should back off before retrying.
    Retry,
}

/// Attempt to advance the sync queue by processing its head op. Peeks rather than pops: the
/// pop is only committed after the op has actually run, via [`confirm_pop`].
pub fn process_one(
    root: &Path,
    queue_store: &DurableStore<SyncQueue>,
    ops: &dyn RemoteOps,
) -> anyhow::Result<StepResult> {
    let queue = queue_store
        .snapshot_or_empty()
        .with_context(|| "sync queue unreadable at runtime")?;
    let Some(op) = queue.front().cloned() else {
        return Ok(StepResult::Empty);
    };

    let relpath = match relative_to_root(root, &op.path) {
        Ok(relpath) => relpath,
        Err(err) => {
            error!("dropping op for '{}': {}", op.path.display(), err);
            confirm_pop(queue_store, &op)?;
            return Ok(StepResult::Done);
        }
    };

    let outcome = dispatch(&op, &relpath, ops);
    match outcome {
        Outcome::TimedOut => Ok(StepResult::Retry),
        Outcome::Success => {
            confirm_pop(queue_store, &op)?;
            Ok(StepResult::Done)
        }
        Outcome::Failed(msg) => {
            error!("remote op for '{}' failed, dropping: {}", op.path.display(), msg);
            confirm_pop(queue_store, &op)?;
            Ok(StepResult::Done)
        }
    }
}

fn dispatch(op: &RemoteOp, relpath: &Path, ops: &dyn RemoteOps) -> Outcome {
    match op.action {
        Action::Sync => {
            if !op.path.exists() {
                info!("'{}' no longer exists locally, dropping sync op", op.path.display());
                return Outcome::Success;
            }
            if relpath.components().count() > 1 {
                if let Outcome::Failed(msg) = ops.pre(relpath) {
                    warn!("pre-command for '{}' failed (continuing): {}", relpath.display(), msg);
                }
            }
            ops.sync(relpath)
        }
        Action::Remove => ops.remove(relpath),
        Action::MakeDir => ops.make_dir(relpath, op.mode.unwrap_or(0o755)),
        Action::RemoveDir => ops.remove_dir(relpath),
        Action::ChangePerm => ops.change_perm(relpath, op.mode.unwrap_or(0)),
    }
}

/// Re-snapshot the queue, pop its head, and commit only if the head still matches the op that
/// was just executed. A mismatch means a producer reordered the queue underneath the executor
/// (should never happen in steady state); when detected, the mutation is abandoned rather than
/// committed, and the discrepancy is logged loudly.
fn confirm_pop(queue_store: &DurableStore<SyncQueue>, expected: &RemoteOp) -> anyhow::Result<()> {
    let mut queue = queue_store
        .snapshot_or_empty()
        .with_context(|| "sync queue unreadable at runtime")?;
    match queue.pop_front() {
        Some(actual) if actual == *expected => queue_store
            .commit(&queue)
            .with_context(|| "failed to commit sync queue after confirm-pop"),
        Some(_) => {
            warn!("left side of sync queue has changed, not committing this pop");
            Ok(())
        }
        None => {
            warn!("sync queue was unexpectedly empty during confirm-pop");
            Ok(())
        }
    }
}
