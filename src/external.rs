//! External command execution: spawn a child, redirect its descriptors,
//! run the target program, and translate its exit status.
//!
//! The child-side setup sequence is expressed as data ([`SpawnRequest`])
//! and interpreted by a [`Spawner`], so dispatch logic can be exercised
//! against a fake spawner without creating processes.

use log::debug;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::{self, Stdio};

use crate::command::{Command, ExitCode, STATUS_ABNORMAL, STATUS_LAUNCH_FAILED};
use crate::env::Environment;

/// A single descriptor rebinding to perform in the child before the target
/// program starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redirect {
    /// Rebind standard input to read from the file; it must exist.
    Input(PathBuf),
    /// Rebind standard output to write to the file, creating it if absent.
    Output { path: PathBuf, append: bool },
}

/// An exec target plus the ordered redirects to establish first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnRequest {
    pub argv: Vec<String>,
    pub redirects: Vec<Redirect>,
}

impl From<&Command> for SpawnRequest {
    fn from(cmd: &Command) -> Self {
        let mut redirects = Vec::new();
        if let Some(path) = &cmd.input_path {
            redirects.push(Redirect::Input(path.clone()));
        }
        if let Some(path) = &cmd.output_path {
            redirects.push(Redirect::Output {
                path: path.clone(),
                append: cmd.append,
            });
        }
        Self {
            argv: cmd.argv.clone(),
            redirects,
        }
    }
}

/// Runs a [`SpawnRequest`] to completion and reports its exit status.
///
/// Implementations report their own failures on the error stream; the
/// caller only ever observes a status. [`OsSpawner`] is the real one; tests
/// substitute a recording fake.
pub trait Spawner {
    /// Spawn the request's program, block until it terminates, and return
    /// its exit status.
    fn spawn_and_wait(&self, request: &SpawnRequest, env: &Environment) -> ExitCode;
}

/// Spawner backed by real OS processes.
///
/// Every redirect is fully established before the target program begins
/// running, and the rebindings are visible only to the child; the
/// parent's own streams are untouched. The parent blocks on the exact
/// child it spawned, with no timeout.
pub struct OsSpawner;

impl OsSpawner {
    fn open_input(path: &Path) -> Result<File, ExitCode> {
        File::open(path).map_err(|err| {
            eprintln!("{}: {}", path.display(), err);
            STATUS_LAUNCH_FAILED
        })
    }

    fn open_output(path: &Path, append: bool) -> Result<File, ExitCode> {
        let mut options = OpenOptions::new();
        options.write(true).create(true);
        if append {
            options.append(true);
        } else {
            options.truncate(true);
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o644);
        }
        options.open(path).map_err(|err| {
            eprintln!("{}: {}", path.display(), err);
            STATUS_LAUNCH_FAILED
        })
    }
}

impl Spawner for OsSpawner {
    fn spawn_and_wait(&self, request: &SpawnRequest, env: &Environment) -> ExitCode {
        let mut command = process::Command::new(&request.argv[0]);
        command
            .args(&request.argv[1..])
            .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&env.current_dir);

        // The files are handed to the child as its standard streams; the
        // parent's copies are dropped right after the spawn. A failed open
        // means the target program never runs.
        for redirect in &request.redirects {
            match redirect {
                Redirect::Input(path) => match Self::open_input(path) {
                    Ok(file) => command.stdin(Stdio::from(file)),
                    Err(status) => return status,
                },
                Redirect::Output { path, append } => {
                    match Self::open_output(path, *append) {
                        Ok(file) => command.stdout(Stdio::from(file)),
                        Err(status) => return status,
                    }
                }
            };
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(err) => {
                eprintln!("{}: {}", request.argv[0], err);
                return STATUS_LAUNCH_FAILED;
            }
        };

        debug!("spawned `{}` as pid {}", request.argv[0], child.id());

        match child.wait() {
            // A child killed by a signal has no exit code; collapse every
            // abnormal termination to the fixed fallback status.
            Ok(status) => status.code().unwrap_or(STATUS_ABNORMAL),
            Err(err) => {
                eprintln!("wait: {}", err);
                STATUS_ABNORMAL
            }
        }
    }
}
