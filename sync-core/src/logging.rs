/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, anyhow};
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config as LogConfig, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::filter::threshold::ThresholdFilter;

use crate::config::Config;

/// Install the process-wide logger for one component (`capturer`, `decider` or `executor`),
/// honouring `console_log_level`/`file_log_level`/`log_format`/`date_format` from the shared
/// config, plus the `-d`/`-c` overrides each binary's CLI exposes.
///
/// Unlike the static `log4rs.yml` a single-purpose tool might load, every component here shares
/// one config file but writes to its own log, so the appender set is built programmatically
/// per component. The file and console appenders each carry their own [`ThresholdFilter`] so
/// their thresholds stay independent — `Root`'s own level only has to be permissive enough to
/// let every appender see what it might want, the per-appender filter does the actual gating.
pub fn init(
    component: &str,
    log_file: &Path,
    config: &Config,
    debug: bool,
    consoledebug: bool,
) -> anyhow::Result<()> {
    let encoder = || Box::new(PatternEncoder::new(&pattern(config)));

    let mut file_level = parse_level(&config.file_log_level)?;
    if debug || consoledebug {
        file_level = LevelFilter::Debug;
    }

    let file_appender = FileAppender::builder()
        .encoder(encoder())
        .build(log_file)
        .with_context(|| format!("failed to open log file '{}' for '{}'", log_file.display(), component))?;

    let mut builder = LogConfig::builder().appender(
        Appender::builder()
            .filter(Box::new(ThresholdFilter::new(file_level)))
            .build("file", Box::new(file_appender)),
    );
    let mut root_appenders = vec!["file".to_string()];
    let mut root_level = file_level;

    let console_level = if consoledebug {
        Some(LevelFilter::Debug)
    } else {
        config
            .console_log_level
            .as_deref()
            .map(parse_level)
            .transpose()?
    };

    if let Some(console_level) = console_level {
        let console_appender = ConsoleAppender::builder().encoder(encoder()).build();
        builder = builder.appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(console_level)))
                .build("console", Box::new(console_appender)),
        );
        root_appenders.push("console".to_string());
        root_level = root_level.max(console_level);
    }

    let log_config = builder
        .build(Root::builder().appenders(root_appenders).build(root_level))
        .with_context(|| "failed to assemble logging configuration")?;

    log4rs::init_config(log_config).with_context(|| "failed to install logger")?;
    Ok(())
}

fn pattern(config: &Config) -> String {
    config
        .log_format
        .replace("{datefmt}", &format!("{{d({})}}", config.date_format))
}

fn parse_level(level: &str) -> anyhow::Result<LevelFilter> {
    LevelFilter::from_str(level).map_err(|_| anyhow!("unknown log level '{}'", level))
}
