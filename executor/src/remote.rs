/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use log::warn;
use sync_core::config::RemoteCommands;
use wait_timeout::ChildExt;

const PRE_MAKE_TIMEOUT: Duration = Duration::from_secs(600);
const SYNC_TIMEOUT: Duration = Duration::from_secs(3600);

/// Result of one remote-command dispatch.
#[derive(Debug)]
pub enum Outcome {
    Success,
    /// Killed after exceeding its timeout; the caller should retry this op.
    TimedOut,
    /// Ran to completion with a non-zero exit, or failed to even start.
    Failed(String),
}

/// Abstraction over "apply one change to the remote replica". The default implementation
/// shells out to configured command templates; any transport providing these five primitives
/// (write-file, delete-file, make-dir-with-mode, remove-dir-recursive, chmod) can substitute
/// its own `RemoteOps`.
pub trait RemoteOps {
    /// Ensure the parent directory of `relpath` exists on the remote, when `relpath` is nested.
    fn pre(&self, relpath: &Path) -> Outcome;
    fn sync(&self, relpath: &Path) -> Outcome;
    fn remove(&self, relpath: &Path) -> Outcome;
    fn make_dir(&self, relpath: &Path, mode: u32) -> Outcome;
    fn remove_dir(&self, relpath: &Path) -> Outcome;
    fn change_perm(&self, relpath: &Path, mode: u32) -> Outcome;
}

/// Default [`RemoteOps`]: runs the configured shell command templates, substituting `{path}`
/// and `{mode}` placeholders, with the process in its own group so a timeout can `SIGKILL` the
/// whole subtree rather than just the immediate child (the original command may itself be a
/// pipeline or wrap `ssh`/`rsync`, which can leave orphans behind a lone child kill).
pub struct ShellRemoteOps {
    commands: RemoteCommands,
}

impl ShellRemoteOps {
    pub fn new(commands: RemoteCommands) -> Self {
        Self { commands }
    }

    fn run(&self, template: &str, relpath: &Path, mode: Option<u32>, timeout: Duration) -> Outcome {
        let mut rendered = template.replace("{path}", &relpath.display().to_string());
        if let Some(mode) = mode {
            rendered = rendered.replace("{mode}", &format!("{:o}", mode));
        }

        let mut command = Command::new("sh");
        command
            .arg("-c")
            .arg(&rendered)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        // Isolate into a fresh process group so the whole subtree can be killed on timeout.
        command.process_group(0);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(err) => return Outcome::Failed(format!("failed to spawn '{}': {}", rendered, err)),
        };

        match child.wait_timeout(timeout) {
            Ok(Some(status)) if status.success() => Outcome::Success,
            Ok(Some(status)) => {
                let output = child.wait_with_output().ok();
                let stderr = output
                    .map(|o| String::from_utf8_lossy(&o.stderr).into_owned())
                    .unwrap_or_default();
                Outcome::Failed(format!(
                    "command '{}' exited with {}: {}",
                    rendered, status, stderr
                ))
            }
            Ok(None) => {
                kill_process_group(child.id());
                let _ = child.wait();
                warn!("command '{}' timed out after {:?}", rendered, timeout);
                Outcome::TimedOut
            }
            Err(err) => Outcome::Failed(format!("failed to wait on '{}': {}", rendered, err)),
        }
    }
}

fn kill_process_group(pid: u32) {
    unsafe {
        libc::kill(-(pid as libc::pid_t), libc::SIGKILL);
    }
}

impl RemoteOps for ShellRemoteOps {
    fn pre(&self, relpath: &Path) -> Outcome {
        self.run(&self.commands.pre_command, relpath, None, PRE_MAKE_TIMEOUT)
    }
    fn sync(&self, relpath: &Path) -> Outcome {
        self.run(&self.commands.sync_command, relpath, None, SYNC_TIMEOUT)
    }
    fn remove(&self, relpath: &Path) -> Outcome {
        self.run(&self.commands.remove_command, relpath, None, PRE_MAKE_TIMEOUT)
    }
    fn make_dir(&self, relpath: &Path, mode: u32) -> Outcome {
        self.run(&self.commands.make_dir_command, relpath, Some(mode), PRE_MAKE_TIMEOUT)
    }
    fn remove_dir(&self, relpath: &Path) -> Outcome {
        self.run(&self.commands.remove_dir_command, relpath, None, PRE_MAKE_TIMEOUT)
    }
    fn change_perm(&self, relpath: &Path, mode: u32) -> Outcome {
        self.run(&self.commands.chmod_command, relpath, Some(mode), PRE_MAKE_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn commands() -> RemoteCommands {
        RemoteCommands {
            sync_command: "true".into(),
            pre_command: "true".into(),
            remove_command: "true".into(),
            make_dir_command: "true".into(),
            remove_dir_command: "true".into(),
            chmod_command: "true".into(),
        }
    }

    #[test]
    fn successful_command_reports_success() {
        let ops = ShellRemoteOps::new(commands());
        assert!(matches!(ops.remove(&PathBuf::from("a.txt")), Outcome::Success));
    }

    #[test]
    fn failing_command_reports_failed() {
        let mut cmds = commands();
        cmds.remove_command = "false".into();
        let ops = ShellRemoteOps::new(cmds);
        assert!(matches!(ops.remove(&PathBuf::from("a.txt")), Outcome::Failed(_)));
    }

    #[test]
    fn timeout_kills_and_reports_timed_out() {
        let mut cmds = commands();
        cmds.remove_command = "sleep 5".into();
        let ops = ShellRemoteOps::new(cmds);
        let start = std::time::Instant::now();
        let outcome = ops.run(&ops.commands.remove_command.clone(), &PathBuf::from("a.txt"), None, Duration::from_millis(100));
        assert!(matches!(outcome, Outcome::TimedOut));
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn placeholders_are_substituted() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");
        let mut cmds = commands();
        cmds.chmod_command = format!("echo {{path}}-{{mode}} > {}", marker.display());
        let ops = ShellRemoteOps::new(cmds);
        let outcome = ops.change_perm(&PathBuf::from("sub/a.txt"), 0o640);
        assert!(matches!(outcome, Outcome::Success));
        let content = std::fs::read_to_string(&marker).unwrap();
        assert_eq!(content.trim(), "sub/a.txt-640");
    }
}
