/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use decider::args::Args;
use decider::decide::{self, Stores};
use decider::reconcile;
use log::error;
use sync_core::durable::DurableStore;
use sync_core::{ActionMap, HashIndex, SyncQueue};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:?}", err);
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = sync_core::config::Config::load(&args.common.config_path)?;

    sync_core::logging::init(
        "decider",
        &config.decider_log,
        &config,
        args.common.debug,
        args.common.consoledebug,
    )?;
    sync_core::daemon::daemonize(&config.decider_pid, args.common.foreground())?;

    let action_map: DurableStore<ActionMap> = DurableStore::new(&config.files_status_file);
    let hash_index: DurableStore<HashIndex> = DurableStore::new(&config.files_hash_file);
    let sync_queue: DurableStore<SyncQueue> = DurableStore::new(&config.files_sync_file);

    reconcile::reconcile(&hash_index, &sync_queue)?;

    let stores = Stores {
        action_map: &action_map,
        hash_index: &hash_index,
        sync_queue: &sync_queue,
    };

    loop {
        while decide::process_one(&stores)? {}
        std::thread::sleep(Duration::from_secs(config.sleep_time));
    }
}
