/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use clap::Parser;
use sync_core::cli::CommonArgs;

#[derive(Parser, Debug)]
#[command(version, about = "Watch a directory tree and record filesystem intents", long_about = None)]
pub struct Args {
    #[command(flatten)]
    pub common: CommonArgs,
}
