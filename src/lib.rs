//! A tiny interactive command interpreter.
//!
//! This crate reads a line of input, parses it into a command with optional
//! I/O redirection, and executes it either as a built-in operation in the
//! current process or as a child process whose descriptors are rebound
//! before the target program runs. It is intentionally small and easy to
//! read, suitable for experiments with process management and command-line
//! parsing.
//!
//! Each line flows strictly forward: tokenizer, then environment expander,
//! then command parser, then the executor inside [`Interpreter`]. The
//! public modules [`command`], [`env`], and [`external`] expose the types
//! for embedding the interpreter with custom built-ins or a custom
//! spawner.

mod builtin;
pub mod command;
pub mod env;
mod expand;
pub mod external;
mod history;
mod interpreter;
mod lexer;
mod parser;

/// Just a convenient re-export of the interactive command runner.
///
/// See [`Interpreter`] for the high-level API.
pub use interpreter::Interpreter;
