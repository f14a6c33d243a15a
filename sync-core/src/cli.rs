/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::path::PathBuf;

use clap::Args;

/// Flags shared by all three binaries. Each binary's own `Args` embeds this with
/// `#[command(flatten)]`.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Path to configuration file in TOML format
    #[arg(short = 'C', long, default_value = "./config.toml")]
    pub config_path: PathBuf,

    /// Run in the foreground instead of daemonizing
    #[arg(short, long, default_value_t = false)]
    pub foreground: bool,

    /// Raise the file log threshold to debug
    #[arg(short, long, default_value_t = false)]
    pub debug: bool,

    /// Raise both console and file log thresholds to debug; implies --foreground
    #[arg(short, long, default_value_t = false)]
    pub consoledebug: bool,
}

impl CommonArgs {
    pub fn foreground(&self) -> bool {
        self.foreground || self.consoledebug
    }
}
