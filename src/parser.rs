//! Turns an expanded token sequence into a [`Command`] descriptor.
//!
//! The grammar is flat: a token that consists of exactly `<`, `>`, or `>>`
//! binds the immediately following token as its filename operand; every
//! other token is a positional argument. Operators and their filenames
//! never reach `argv`.

use std::fmt;

use crate::command::Command;

/// Errors that can occur while assembling a command from tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A redirection operator was the last token, so its filename operand
    /// is missing. Surfaced to the user; the command is discarded.
    MissingRedirectTarget(&'static str),
    /// No positional arguments remained after the scan: a blank line or
    /// operator-only input. Expected and silent, never shown to the user.
    EmptyCommand,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MissingRedirectTarget(op) => {
                write!(f, "syntax error: missing file after redirection `{}`", op)
            }
            ParseError::EmptyCommand => write!(f, "empty command"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Build a [`Command`] from expanded tokens.
///
/// Single pass over the sequence. When the same redirection operator
/// appears more than once, the last occurrence wins. Fails with
/// [`ParseError::MissingRedirectTarget`] when an operator has no following
/// token, and with [`ParseError::EmptyCommand`] when nothing is left for
/// `argv`.
pub fn parse(tokens: Vec<String>) -> Result<Command, ParseError> {
    let mut cmd = Command::default();
    let mut iter = tokens.into_iter();

    while let Some(token) = iter.next() {
        let op = match token.as_str() {
            "<" => "<",
            ">" => ">",
            ">>" => ">>",
            _ => {
                cmd.argv.push(token);
                continue;
            }
        };

        let target = iter
            .next()
            .ok_or(ParseError::MissingRedirectTarget(op))?;
        match op {
            "<" => cmd.input_path = Some(target.into()),
            _ => {
                cmd.output_path = Some(target.into());
                cmd.append = op == ">>";
            }
        }
    }

    if cmd.argv.is_empty() {
        return Err(ParseError::EmptyCommand);
    }

    Ok(cmd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn owned(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn plain_argv_without_redirection() {
        let cmd = parse(owned(&["ls", "-l", "/tmp"])).unwrap();
        assert_eq!(cmd.argv, vec!["ls", "-l", "/tmp"]);
        assert_eq!(cmd.input_path, None);
        assert_eq!(cmd.output_path, None);
        assert!(!cmd.append);
    }

    #[test]
    fn output_redirection_truncates_by_default() {
        let cmd = parse(owned(&["echo", "hi", ">", "out.txt"])).unwrap();
        assert_eq!(cmd.argv, vec!["echo", "hi"]);
        assert_eq!(cmd.output_path, Some(PathBuf::from("out.txt")));
        assert!(!cmd.append);
    }

    #[test]
    fn double_arrow_sets_append() {
        let cmd = parse(owned(&["echo", "hi", ">>", "out.txt"])).unwrap();
        assert_eq!(cmd.output_path, Some(PathBuf::from("out.txt")));
        assert!(cmd.append);
    }

    #[test]
    fn input_redirection() {
        let cmd = parse(owned(&["sort", "<", "data.txt"])).unwrap();
        assert_eq!(cmd.argv, vec!["sort"]);
        assert_eq!(cmd.input_path, Some(PathBuf::from("data.txt")));
    }

    #[test]
    fn input_and_output_together() {
        let cmd = parse(owned(&["sort", "<", "in", ">", "out"])).unwrap();
        assert_eq!(cmd.argv, vec!["sort"]);
        assert_eq!(cmd.input_path, Some(PathBuf::from("in")));
        assert_eq!(cmd.output_path, Some(PathBuf::from("out")));
    }

    #[test]
    fn arguments_after_a_redirection_still_join_argv() {
        let cmd = parse(owned(&["cmd", ">", "f", "more"])).unwrap();
        assert_eq!(cmd.argv, vec!["cmd", "more"]);
        assert_eq!(cmd.output_path, Some(PathBuf::from("f")));
    }

    #[test]
    fn no_tokens_is_an_empty_command() {
        assert_eq!(parse(Vec::new()), Err(ParseError::EmptyCommand));
    }

    #[test]
    fn operator_only_input_is_an_empty_command() {
        assert_eq!(parse(owned(&[">", "x"])), Err(ParseError::EmptyCommand));
    }

    #[test]
    fn missing_target_is_a_syntax_error() {
        assert_eq!(
            parse(owned(&["cmd", "<"])),
            Err(ParseError::MissingRedirectTarget("<"))
        );
        assert_eq!(
            parse(owned(&["cmd", ">>"])),
            Err(ParseError::MissingRedirectTarget(">>"))
        );
    }

    #[test]
    fn syntax_error_wins_over_empty_argv() {
        // `>` alone has no operand; report the syntax error, not EmptyCommand.
        assert_eq!(
            parse(owned(&[">"])),
            Err(ParseError::MissingRedirectTarget(">"))
        );
    }

    #[test]
    fn operator_must_be_the_whole_token() {
        let cmd = parse(owned(&["echo", "a>b"])).unwrap();
        assert_eq!(cmd.argv, vec!["echo", "a>b"]);
        assert_eq!(cmd.output_path, None);
    }
}
