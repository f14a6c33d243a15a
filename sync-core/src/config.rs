/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Deployment-wide configuration, shared verbatim by all three binaries. There is no
/// defaulting: a missing or malformed config file is a startup error.
#[derive(Serialize, Deserialize, Clone)]
pub struct Config {
    pub watch_dir: PathBuf,
    pub remote_dir: String,

    pub files_status_file: PathBuf,
    pub files_hash_file: PathBuf,
    pub files_sync_file: PathBuf,

    pub capturer_log: PathBuf,
    pub decider_log: PathBuf,
    pub executor_log: PathBuf,
    pub capturer_pid: PathBuf,
    pub decider_pid: PathBuf,
    pub executor_pid: PathBuf,

    pub console_log_level: Option<String>,
    pub file_log_level: String,
    pub log_format: String,
    pub date_format: String,

    /// Idle poll interval (seconds) for the decider and executor loops.
    pub sleep_time: u64,
    /// Backoff (seconds) after a remote operation times out.
    pub timeout_sleep_time: u64,

    pub commands: RemoteCommands,
}

/// Shell command templates for the five remote operations. `{path}` and `{mode}` placeholders
/// are substituted by [`crate`]'s default `ShellRemoteOps` implementation.
#[derive(Serialize, Deserialize, Clone)]
pub struct RemoteCommands {
    pub sync_command: String,
    pub pre_command: String,
    pub remove_command: String,
    pub make_dir_command: String,
    pub remove_dir_command: String,
    pub chmod_command: String,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Config> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read configuration file '{}'", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("failed to parse configuration file '{}'", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config() {
        let toml_src = r#"
            watch_dir = "/srv/watched"
            remote_dir = "/srv/replica"
            files_status_file = "/var/lib/sync/action_map"
            files_hash_file = "/var/lib/sync/hash_index"
            files_sync_file = "/var/lib/sync/sync_queue"
            capturer_log = "/var/log/sync/capturer.log"
            decider_log = "/var/log/sync/decider.log"
            executor_log = "/var/log/sync/executor.log"
            capturer_pid = "/var/run/sync/capturer.pid"
            decider_pid = "/var/run/sync/decider.pid"
            executor_pid = "/var/run/sync/executor.pid"
            file_log_level = "warn"
            log_format = "[{d}] [{l}] {m}{n}"
            date_format = "%Y-%m-%d %H:%M:%S"
            sleep_time = 5
            timeout_sleep_time = 300

            [commands]
            sync_command = "rsync -a {path} remote:{path}"
            pre_command = "ssh remote mkdir -p {path}"
            remove_command = "ssh remote rm -f {path}"
            make_dir_command = "ssh remote mkdir -m {mode} {path}"
            remove_dir_command = "ssh remote rm -rf {path}"
            chmod_command = "ssh remote chmod {mode} {path}"
        "#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, toml_src).unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.sleep_time, 5);
        assert_eq!(config.console_log_level, None);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(Config::load("/no/such/config.toml").is_err());
    }
}
