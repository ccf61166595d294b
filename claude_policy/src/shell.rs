//! Minimal shell command splitting.
//!
//! This is not a shell parser. It knows exactly three things about a command
//! line: where the unquoted control operators (`&&`, `||`, `|`, `;`) are,
//! where the unquoted spaces are, and the two spellings of the home
//! directory (`~` and `$HOME`). There is no escape processing, no globbing and
//! no variable evaluation; an unbalanced quote simply extends to the end of
//! the input.
//!
//! ```rust
//! use claude_policy::shell::{expand_home, split_commands, tokenize};
//!
//! let segments = split_commands("cd ~/src && find . -name '*.rs' | wc -l");
//! assert_eq!(segments, vec!["cd ~/src ", " find . -name '*.rs' ", " wc -l"]);
//!
//! assert_eq!(tokenize("grep 'a b' file"), vec!["grep", "a b", "file"]);
//! assert_eq!(expand_home("~/src", "/home/me"), "/home/me/src");
//! ```

use std::fmt;

/// Control operator that ends a command segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Separator {
    /// `&&`
    And,
    /// `||`
    Or,
    /// `|`
    Pipe,
    /// `;`
    Semicolon,
}

impl Separator {
    /// The operator exactly as it appears in the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Separator::And => "&&",
            Separator::Or => "||",
            Separator::Pipe => "|",
            Separator::Semicolon => ";",
        }
    }
}

impl fmt::Display for Separator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One independently parsed piece of a command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    /// Raw segment text, untrimmed, quotes preserved.
    pub text: &'a str,
    /// The operator that ended this segment, `None` for the final one.
    pub separator: Option<Separator>,
}

/// Tracks single/double quote state while scanning a command line.
#[derive(Debug, Default, Clone, Copy)]
struct QuoteState {
    single: bool,
    double: bool,
}

impl QuoteState {
    /// Feeds one character; returns true if it was a quote that toggled state.
    fn toggle(&mut self, ch: char) -> bool {
        match ch {
            '\'' if !self.double => {
                self.single = !self.single;
                true
            }
            '"' if !self.single => {
                self.double = !self.double;
                true
            }
            _ => false,
        }
    }

    fn quoted(&self) -> bool {
        self.single || self.double
    }
}

/// Splits a command line at unquoted `&&`, `||`, `|` and `;`.
///
/// Each segment remembers the operator that terminated it, so joining every
/// `text` followed by its separator reproduces the input byte for byte. An
/// empty trailing segment is dropped; empty segments between two operators
/// are kept.
pub fn segments(command: &str) -> Vec<Segment<'_>> {
    let bytes = command.as_bytes();
    let mut out = Vec::new();
    let mut quotes = QuoteState::default();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let ch = bytes[i] as char;

        if quotes.toggle(ch) || quotes.quoted() {
            i += 1;
            continue;
        }

        let next = bytes.get(i + 1).copied();
        let op = match (bytes[i], next) {
            (b'&', Some(b'&')) => Some((Separator::And, 2)),
            (b'|', Some(b'|')) => Some((Separator::Or, 2)),
            (b'|', _) => Some((Separator::Pipe, 1)),
            (b';', _) => Some((Separator::Semicolon, 1)),
            _ => None,
        };

        match op {
            Some((separator, width)) => {
                out.push(Segment {
                    text: &command[start..i],
                    separator: Some(separator),
                });
                i += width;
                start = i;
            }
            None => i += 1,
        }
    }

    if start < command.len() {
        out.push(Segment {
            text: &command[start..],
            separator: None,
        });
    }

    out
}

/// Splits a command line into segment texts. See [`segments`].
pub fn split_commands(command: &str) -> Vec<&str> {
    segments(command).into_iter().map(|s| s.text).collect()
}

/// Splits one segment into tokens on unquoted spaces.
///
/// Quote characters are consumed; everything between them is copied as-is,
/// spaces included. Runs of spaces never produce empty tokens, and an empty
/// (or all-space) input yields no tokens.
pub fn tokenize(segment: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quotes = QuoteState::default();

    for ch in segment.chars() {
        if quotes.toggle(ch) {
            continue;
        }

        if ch == ' ' && !quotes.quoted() {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            continue;
        }

        current.push(ch);
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

/// Expands `~`, `~/X`, `$HOME` and `$HOME/X` against `home`.
///
/// Any other token is returned unchanged, including `~user` forms and
/// `$HOME` embedded in the middle of a token.
pub fn expand_home(token: &str, home: &str) -> String {
    if token == "~" || token == "$HOME" {
        return home.to_string();
    }
    if let Some(rest) = token.strip_prefix("~/") {
        return format!("{home}/{rest}");
    }
    if let Some(rest) = token.strip_prefix("$HOME/") {
        return format!("{home}/{rest}");
    }
    token.to_string()
}

/// Returns the final path component of a command word (`/usr/bin/find` -> `find`).
pub fn command_name(token: &str) -> &str {
    let trimmed = token.trim_end_matches('/');
    if trimmed.is_empty() {
        return if token.is_empty() { "" } else { "/" };
    }
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}
