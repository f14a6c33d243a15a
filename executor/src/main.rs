/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use executor::args::Args;
use executor::drain;
use executor::remote::ShellRemoteOps;
use log::error;
use sync_core::durable::DurableStore;
use sync_core::SyncQueue;

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
        "executor",
        &config.executor_log,
        &config,
        args.common.debug,
        args.common.consoledebug,
    )?;
    sync_core::daemon::daemonize(&config.executor_pid, args.common.foreground())?;

    let queue_store: DurableStore<SyncQueue> = DurableStore::new(&config.files_sync_file);
    let ops = ShellRemoteOps::new(config.commands.clone());
    let sleep_time = Duration::from_secs(config.sleep_time);
    let timeout_sleep_time = Duration::from_secs(config.timeout_sleep_time);

    loop {
        loop {
            match drain::process_one(&config.watch_dir, &queue_store, &ops)? {
                drain::StepResult::Done => continue,
                drain::StepResult::Retry => {
                    std::thread::sleep(timeout_sleep_time);
                    continue;
                }
                drain::StepResult::Empty => break,
            }
        }
        std::thread::sleep(sleep_time);
    }
}
