/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::process::ExitCode;

use anyhow::{Context, bail};
use capturer::args::Args;
use capturer::rescan;
use capturer::watch::{FsEventSource, NotifyEventSource, RawEvent};
use clap::Parser;
use log::{error, info};
use sync_core::durable::DurableStore;
use sync_core::{ActionMap, Intent};

/// Distinguished exit code for fatal watch-backend conditions (unmount, event-queue overflow),
/// so a process supervisor knows to restart and re-trigger the startup re-scan.
const EXIT_WATCH_FATAL: u8 = 1;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:?}", err);
            ExitCode::from(EXIT_WATCH_FATAL)
        }
    }
}

fn run() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = sync_core::config::Config::load(&args.common.config_path)?;

    sync_core::logging::init(
        "capturer",
        &config.capturer_log,
        &config,
        args.common.debug,
        args.common.consoledebug,
    )?;
    sync_core::daemon::daemonize(&config.capturer_pid, args.common.foreground())?;

    info!("capturer starting, watching '{}'", config.watch_dir.display());
    if !config.watch_dir.is_dir() {
        bail!("watch_dir '{}' is not a directory", config.watch_dir.display());
    }

    let action_map_store: DurableStore<ActionMap> = DurableStore::new(&config.files_status_file);
    rescan::rescan(&config.watch_dir, &action_map_store)
        .with_context(|| "startup re-scan failed")?;

    let mut source = NotifyEventSource::watch(&config.watch_dir)
        .with_context(|| format!("failed to watch '{}'", config.watch_dir.display()))?;

    loop {
        match source.recv() {
            Ok(RawEvent::Mapped(path, kind)) => {
                record(&action_map_store, path, kind)?;
            }
            Ok(RawEvent::Unmapped) => continue,
            Err(err) => {
                error!("fatal watch error, exiting for restart: {}", err);
                bail!("watch backend failed: {}", err);
            }
        }
    }
}

/// Coalesce one event into the action map: read-modify-write under the durable store's lock,
/// overwriting any prior intent for this path with the newer one.
fn record(
    store: &DurableStore<ActionMap>,
    path: std::path::PathBuf,
    kind: sync_core::IntentKind,
) -> anyhow::Result<()> {
    let mut map = store
        .snapshot_or_empty()
        .with_context(|| "action map unreadable at runtime")?;
    map.insert(path, Intent::now(kind));
    store
        .commit(&map)
        .with_context(|| "failed to commit action map")
}
