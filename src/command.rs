use crate::env::Environment;
use anyhow::Result;
use std::io::Write;
use std::path::PathBuf;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line
/// tools.
pub type ExitCode = i32;

/// Status reported when a child could not be set up or its program could
/// not be loaded: redirect-open failure, unknown program name.
pub const STATUS_LAUNCH_FAILED: ExitCode = 127;

/// Fallback status for a child that terminated abnormally (by signal) and
/// therefore has no exit code of its own.
pub const STATUS_ABNORMAL: ExitCode = 1;

/// One fully parsed invocation.
///
/// Built fresh from each input line by [`crate::parser`], consumed by the
/// interpreter, and discarded after execution, never retained or mutated
/// after dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Command {
    /// Program or built-in name followed by its arguments. Non-empty after
    /// a successful parse; an empty result is a parse error, not a valid
    /// descriptor.
    pub argv: Vec<String>,
    /// Input redirection target, if any. At most one; when the operator is
    /// repeated the last occurrence wins.
    pub input_path: Option<PathBuf>,
    /// Output redirection target, if any. At most one; last occurrence
    /// wins.
    pub output_path: Option<PathBuf>,
    /// Append instead of truncate. Meaningless unless `output_path` is set.
    pub append: bool,
}

impl Command {
    /// The name the interpreter dispatches on.
    pub fn name(&self) -> &str {
        &self.argv[0]
    }

    /// Arguments after the name, as borrowed slices for factory dispatch.
    pub fn args(&self) -> Vec<&str> {
        self.argv.iter().skip(1).map(String::as_str).collect()
    }
}

/// Object-safe trait for any command the interpreter runs in-process.
///
/// Implemented by built-ins via a blanket impl in [`crate::builtin`] and by
/// the history listing. In-process commands write to the provided stream
/// and never spawn a child; redirections on the descriptor do not apply to
/// them.
pub trait ExecutableCommand {
    /// Executes the command against the interpreter's own output stream.
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode>;
}

/// Factory that tries to create an in-process command from a name and its
/// arguments.
///
/// Returns `None` when the factory doesn't recognize the `name`, in which
/// case the interpreter falls through to external execution.
pub trait CommandFactory {
    /// Attempt to create a command instance for the provided name and
    /// arguments.
    fn try_create(
        &self,
        env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>>;
}
