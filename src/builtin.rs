use crate::command::{CommandFactory, ExecutableCommand, ExitCode};
use crate::env::Environment;
use crate::history::History;
use crate::interpreter::Factory;
use anyhow::{Context, Result};
use argh::{EarlyExit, FromArgs};
use std::cell::RefCell;
use std::env;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::rc::Rc;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed
/// directly in-process without spawning a child process. Redirections on
/// the command line do not apply to them.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "cd" or "pwd".
    fn name() -> &'static str;

    /// Executes the command against the interpreter's output stream and
    /// environment.
    ///
    /// Return value follows shell conventions: 0 for success, non-zero for
    /// error.
    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        match T::execute(*self, stdout, env) {
            Ok(code) => Ok(code),
            Err(err) => {
                // Builtin failures are non-fatal: report the description on
                // the error stream and settle on exit code 1.
                eprintln!("{:#}", err);
                Ok(1)
            }
        }
    }
}

struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<ExitCode> {
        stdout.write_all(self.output.as_bytes())?;
        Ok(if self.is_error { 1 } else { 0 })
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(
        &self,
        _env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        if name == T::name() {
            Some(match T::from_args(&[name], args) {
                Ok(cmd) => Box::new(cmd),
                Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                    output,
                    is_error: status.is_err(),
                }),
            })
        } else {
            None
        }
    }
}

#[derive(FromArgs)]
/// Print the current working directory to standard output.
pub struct Pwd {}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        writeln!(stdout, "{}", env.current_dir.to_string_lossy())?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
/// Without a target, changes to $HOME, or to the root directory when HOME
/// is unset.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current
    /// directory
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        let target = match &self.target {
            Some(t) if !t.is_empty() => PathBuf::from(t),
            _ => PathBuf::from(env.get_var("HOME").unwrap_or_else(|| "/".to_string())),
        };

        let new_dir = if target.is_absolute() {
            target
        } else {
            env.current_dir.join(target)
        };

        let canonical = fs::canonicalize(&new_dir)
            .with_context(|| format!("cd: can't canonicalize {}", new_dir.display()))?;

        env::set_current_dir(&canonical)
            .with_context(|| format!("cd: can't chdir to {}", canonical.display()))?;
        env.current_dir = canonical;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Leave the shell.
pub struct Exit {
    #[argh(positional, greedy)]
    /// ignored; a numeric status argument is not supported
    pub _args: Vec<String>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        // The REPL owns process teardown; builtins only raise the flag.
        env.should_exit = true;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Show usage help for the shell.
pub struct Help {}

impl BuiltinCommand for Help {
    fn name() -> &'static str {
        "help"
    }

    fn execute(self, stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        write!(
            stdout,
            "Builtins:\n\
             \x20 cd [path]    Change directory (cd without args goes to $HOME)\n\
             \x20 pwd          Print current directory\n\
             \x20 history      Show command history (in-memory)\n\
             \x20 help         Show this help\n\
             \x20 exit         Exit shell\n\
             \nRedirections:\n\
             \x20 cmd > out.txt     overwrite output\n\
             \x20 cmd >> out.txt    append output\n\
             \x20 cmd < in.txt      read input from file\n"
        )?;
        Ok(0)
    }
}

/// Factory for the `history` builtin.
///
/// History is owned by the REPL loop; this factory holds a shared handle
/// and hands each invocation a snapshot of the entries recorded so far.
pub(crate) struct HistoryFactory {
    entries: Rc<RefCell<History>>,
}

impl HistoryFactory {
    pub fn new(entries: Rc<RefCell<History>>) -> Self {
        Self { entries }
    }
}

impl CommandFactory for HistoryFactory {
    fn try_create(
        &self,
        _env: &Environment,
        name: &str,
        _args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        if name != "history" {
            return None;
        }
        let lines = self.entries.borrow().iter().map(str::to_owned).collect();
        Some(Box::new(HistoryList { lines }))
    }
}

struct HistoryList {
    lines: Vec<String>,
}

impl ExecutableCommand for HistoryList {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<ExitCode> {
        for (i, line) in self.lines.iter().enumerate() {
            writeln!(stdout, "{}  {}", i + 1, line)?;
        }
        Ok(0)
    }
}
