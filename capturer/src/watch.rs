/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, RecvError, channel};

use log::debug;
use notify::{
    AccessKind, AccessMode, CreateKind, Event, EventKind, ModifyKind, RecommendedWatcher,
    RecursiveMode, RemoveKind, RenameMode, Watcher,
};
use sync_core::IntentKind;
use thiserror::Error;

/// A watched path has been observed to carry one intent, or the whole watch has died.
pub enum RawEvent {
    Mapped(PathBuf, IntentKind),
    /// An event this system has no intent mapping for (e.g. access-read); dropped.
    Unmapped,
}

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("event source disconnected: {0}")]
    Disconnected(#[from] RecvError),
    #[error("watch backend error: {0}")]
    Backend(String),
}

/// Abstraction over the kernel filesystem-notification source. Swappable so the pipeline can
/// be driven by something other than `notify` (a test double, a different backend) without
/// touching the capturer's main loop.
pub trait FsEventSource {
    /// Block for the next event and classify it. A backend error (overflow, watch-thread
    /// death) is fatal and should terminate the capturer so a supervisor restarts it.
    fn recv(&mut self) -> Result<RawEvent, WatchError>;
}

/// Default [`FsEventSource`]: a recursive `notify` watcher rooted at one directory.
pub struct NotifyEventSource {
    _watcher: RecommendedWatcher,
    events: Receiver<notify::Result<Event>>,
    /// A rename can classify to two intents (the "from" path's delete and the "to" path's
    /// create) from a single `notify` event; the second one waits here for the next `recv`.
    pending: VecDeque<RawEvent>,
}

impl NotifyEventSource {
    pub fn watch(root: &Path) -> anyhow::Result<Self> {
        let (tx, rx) = channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        watcher.watch(root, RecursiveMode::Recursive)?;
        Ok(Self {
            _watcher: watcher,
            events: rx,
            pending: VecDeque::new(),
        })
    }
}

impl FsEventSource for NotifyEventSource {
    fn recv(&mut self) -> Result<RawEvent, WatchError> {
        if let Some(event) = self.pending.pop_front() {
            return Ok(event);
        }
        let event = self.events.recv()?.map_err(|e| WatchError::Backend(e.to_string()))?;
        let mut mapped = classify(&event);
        if mapped.is_empty() {
            return Ok(RawEvent::Unmapped);
        }
        let first = mapped.remove(0);
        self.pending.extend(mapped);
        Ok(first)
    }
}

/// Maps `notify`'s cross-platform event kinds onto this system's intent kinds. A file's
/// content is only considered final once the writer closes it for writing (`Close(Write)`),
/// never on raw data-modify events, so that partially written files are never hashed.
///
/// A rename (`Modify(Name(_))`) yields up to two intents — a delete for the "from" path and a
/// create for the "to" path — since a move is indistinguishable from a delete-then-create as
/// far as the replica is concerned.
fn classify(event: &Event) -> Vec<RawEvent> {
    if let EventKind::Modify(ModifyKind::Name(mode)) = event.kind {
        return classify_rename(mode, &event.paths);
    }

    let is_dir = event.paths.first().map(|p| p.is_dir()).unwrap_or(false);
    let kind = match event.kind {
        EventKind::Create(CreateKind::Folder) => Some(IntentKind::CreatedDir),
        EventKind::Create(_) if is_dir => Some(IntentKind::CreatedDir),
        EventKind::Create(_) => Some(IntentKind::Created),
        EventKind::Access(AccessKind::Close(AccessMode::Write)) => Some(IntentKind::Changed),
        EventKind::Modify(ModifyKind::Metadata(_)) if is_dir => Some(IntentKind::AttribDir),
        EventKind::Modify(ModifyKind::Metadata(_)) => Some(IntentKind::Attrib),
        EventKind::Remove(RemoveKind::Folder) => Some(IntentKind::DeletedDir),
        EventKind::Remove(_) if is_dir => Some(IntentKind::DeletedDir),
        EventKind::Remove(_) => Some(IntentKind::Deleted),
        _ => {
            debug!("unmapped event kind: {:?}", event.kind);
            None
        }
    };
    match (kind, event.paths.first()) {
        (Some(kind), Some(path)) => vec![RawEvent::Mapped(path.clone(), kind)],
        _ => Vec::new(),
    }
}

/// `paths` carries `[to]` for `RenameMode::To`, `[from]` for `RenameMode::From`, and
/// `[from, to]` for `RenameMode::Both`; `RenameMode::Any`/`Other` arrive when the backend
/// could not pair the halves of the move and are dropped rather than guessed at.
fn classify_rename(mode: RenameMode, paths: &[PathBuf]) -> Vec<RawEvent> {
    match mode {
        RenameMode::Both => match (paths.first(), paths.get(1)) {
            (Some(from), Some(to)) => {
                let is_dir = to.is_dir();
                vec![
                    RawEvent::Mapped(
                        from.clone(),
                        if is_dir { IntentKind::DeletedDir } else { IntentKind::Deleted },
                    ),
                    RawEvent::Mapped(
                        to.clone(),
                        if is_dir { IntentKind::CreatedDir } else { IntentKind::Created },
                    ),
                ]
            }
            _ => Vec::new(),
        },
        RenameMode::To => match paths.first() {
            Some(to) => {
                let is_dir = to.is_dir();
                vec![RawEvent::Mapped(
                    to.clone(),
                    if is_dir { IntentKind::CreatedDir } else { IntentKind::Created },
                )]
            }
            None => Vec::new(),
        },
        RenameMode::From => match paths.first() {
            // the source path is already gone by the time this fires, so its type can't be
            // stat'd; treat it as a plain file delete.
            Some(from) => vec![RawEvent::Mapped(from.clone(), IntentKind::Deleted)],
            None => Vec::new(),
        },
        RenameMode::Any | RenameMode::Other => {
            debug!("unpaired rename event, dropping: {:?}", paths);
            Vec::new()
        }
    }
}
