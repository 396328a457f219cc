use std::collections::HashMap;
use std::env as stdenv;
use std::path::PathBuf;

/// Mutable, user-level view of the process environment used by the
/// interpreter.
///
/// The environment contains:
/// - `vars`: the variable table consulted by expansion and inherited by
///   spawned children.
/// - `current_dir`: the working directory for command execution; only `cd`
///   mutates it.
/// - `should_exit`: a flag the REPL loop checks to know when to terminate.
///
/// The table is captured once at construction and then consulted
/// exclusively; there is no live fallback to `std::env::var`, so tests can
/// inject a fully fake table and lookups stay deterministic.
///
/// Note: fields are public for simplicity to keep the crate small.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Key-value store of environment variables (e.g., PATH, HOME).
    pub vars: HashMap<String, String>,
    /// The current working directory for command execution.
    pub current_dir: PathBuf,
    /// When set to true, indicates that the interactive loop should exit.
    pub should_exit: bool,
}

impl Environment {
    /// Capture the current process state into a new `Environment` instance.
    ///
    /// Copies variables from `std::env::vars()` and initializes
    /// `current_dir` from `std::env::current_dir()`. The `should_exit` flag
    /// starts out `false`.
    pub fn new() -> Self {
        Self {
            vars: stdenv::vars().collect(),
            current_dir: stdenv::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            should_exit: false,
        }
    }

    /// Get the value of an environment variable from the captured table.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    /// Set or override an environment variable in the captured table.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get_var() {
        let mut env = Environment {
            vars: HashMap::new(),
            current_dir: PathBuf::from("/"),
            should_exit: false,
        };

        assert_eq!(env.get_var("SOME_RANDOM_ENV_VAR_12345"), None);

        env.set_var("KEY", "VALUE");

        assert_eq!(env.get_var("KEY"), Some("VALUE".to_string()));
    }

    #[test]
    fn captures_the_process_environment() {
        let env = Environment::new();
        assert!(env.get_var("PATH").is_some());
    }

    #[test]
    fn lookups_never_leave_the_captured_table() {
        // PATH exists in the real process environment, but an environment
        // built with an empty table must not see it.
        let env = Environment {
            vars: HashMap::new(),
            current_dir: PathBuf::from("/"),
            should_exit: false,
        };
        assert_eq!(env.get_var("PATH"), None);
    }
}
