//! Splits a raw input line into word tokens, honoring quoting.
//!
//! Two quoting styles are recognized: single quotes take every character
//! literally until the closing `'`, and double quotes allow `\"` and `\\`
//! escapes. Redirection operators get no special treatment here: `a>b` is
//! a single token; separating `<`/`>`/`>>` from arguments is the parser's
//! job, and only for tokens that consist of exactly the operator.

/// Scanning mode. The modes are mutually exclusive: a quote character only
/// opens a region when scanned outside any other region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Unquoted,
    SingleQuoted,
    DoubleQuoted,
}

struct Scanner {
    input: Vec<char>,
    pos: usize,
    mode: Mode,
    current: String,
    tokens: Vec<String>,
}

impl Scanner {
    fn new(line: &str) -> Self {
        Scanner {
            input: line.chars().collect(),
            pos: 0,
            mode: Mode::Unquoted,
            current: String::new(),
            tokens: Vec::new(),
        }
    }

    fn scan(mut self) -> Vec<String> {
        while let Some(ch) = self.read_char() {
            match self.mode {
                Mode::Unquoted => self.handle_unquoted(ch),
                Mode::SingleQuoted => self.handle_single_quoted(ch),
                Mode::DoubleQuoted => self.handle_double_quoted(ch),
            }
        }

        // An unterminated quote is not an error: whatever accumulated up to
        // the end of the line becomes the final token.
        if !self.current.is_empty() {
            self.tokens.push(std::mem::take(&mut self.current));
        }

        self.tokens
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn handle_unquoted(&mut self, ch: char) {
        match ch {
            c if c.is_whitespace() => {
                if !self.current.is_empty() {
                    self.tokens.push(std::mem::take(&mut self.current));
                }
            }
            '\'' => self.mode = Mode::SingleQuoted,
            '"' => self.mode = Mode::DoubleQuoted,
            c => self.current.push(c),
        }
    }

    fn handle_single_quoted(&mut self, ch: char) {
        match ch {
            '\'' => self.mode = Mode::Unquoted,
            c => self.current.push(c),
        }
    }

    fn handle_double_quoted(&mut self, ch: char) {
        match ch {
            '"' => self.mode = Mode::Unquoted,
            '\\' => match self.peek_char() {
                // Only `\"` and `\\` are escapes; the backslash is dropped
                // and the escaped character kept.
                Some(next @ ('"' | '\\')) => {
                    self.current.push(next);
                    self.pos += 1;
                }
                // Any other backslash (including one ending the line) stays
                // literal and the following character is not consumed.
                _ => self.current.push('\\'),
            },
            c => self.current.push(c),
        }
    }
}

/// Split `line` into word tokens, preserving input order.
///
/// Whitespace outside quotes separates tokens and is never part of one; the
/// quote characters themselves are consumed by the scan. An empty or
/// all-whitespace line produces no tokens. The scan cannot fail: an
/// unterminated quote simply ends with the accumulated text.
pub fn tokenize(line: &str) -> Vec<String> {
    Scanner::new(line).scan()
}
