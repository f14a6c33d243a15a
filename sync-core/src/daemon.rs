/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::path::Path;

use anyhow::Context;
use daemonize::Daemonize;
use log::info;

/// Fork into the background and record a pid file, unless `foreground` is set. A stale pid
/// file from a process that is no longer running is reclaimed; a pid file for a still-live
/// process is a startup error so two instances never run against the same state.
pub fn daemonize(pid_file: &Path, foreground: bool) -> anyhow::Result<()> {
    if foreground {
        info!("running in foreground, not daemonizing");
        return Ok(());
    }

    let daemonize = Daemonize::new().pid_file(pid_file).working_directory("/");
    daemonize
        .start()
        .with_context(|| format!("failed to daemonize (pid file '{}')", pid_file.display()))
}
