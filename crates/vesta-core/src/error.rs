//! Error types for vesta-core.

use std::fmt;
use std::ops::Range;

use thiserror::Error;

/// Result type for vesta-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Longest fragment quoted back in a parse error.
const MAX_FRAGMENT_CHARS: usize = 32;

/// Errors that can occur while transpiling a cell.
///
/// Every variant is fatal for the call that produced it; no partial result
/// is ever returned alongside an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Malformed cell source.
    #[error("{message} ({position})")]
    Parse {
        message: String,
        position: SourcePosition,
        /// The offending source text, possibly truncated.
        fragment: String,
    },

    /// Mutation of a binding the cell does not own.
    #[error("{message} ({position})")]
    Assignment {
        message: String,
        position: SourcePosition,
    },

    /// Caller-level misuse, e.g. a rewrite the target cannot express.
    #[error("structural error: {0}")]
    Structural(String),
}

impl Error {
    /// Build a parse error pointing at `range` within `input`.
    pub fn parse(message: impl Into<String>, range: Range<usize>, input: &str) -> Self {
        let position = SourcePosition::locate(input, range.start);
        let fragment = fragment_at(input, range);
        let mut message = message.into();
        if !fragment.is_empty() && !message.contains(&fragment) {
            message = format!("{message}: `{fragment}`");
        }
        Self::Parse {
            message,
            position,
            fragment,
        }
    }

    /// Build an assignment error pointing at `offset` within `input`.
    pub fn assignment(message: impl Into<String>, offset: usize, input: &str) -> Self {
        Self::Assignment {
            message: message.into(),
            position: SourcePosition::locate(input, offset),
        }
    }

    /// Position of the error in the cell source, if it has one.
    pub fn position(&self) -> Option<SourcePosition> {
        match self {
            Self::Parse { position, .. } | Self::Assignment { position, .. } => Some(*position),
            Self::Structural(_) => None,
        }
    }

    /// Render the error followed by a short recovery hint.
    pub fn with_hint(&self) -> String {
        let hint = match self {
            Self::Parse { .. } => "check the cell for unbalanced brackets, quotes or `${` holes",
            Self::Assignment { .. } => {
                "a cell may only assign to bindings it declares; declare a local copy instead"
            }
            Self::Structural(_) => "this combination of cell mode and options is not supported",
        };
        format!("{self}\n  hint: {hint}")
    }
}

/// Line and column of a byte offset in a cell source.
///
/// Lines are 1-based; columns are 0-based and counted in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourcePosition {
    pub line: usize,
    pub column: usize,
}

impl SourcePosition {
    /// Locate `offset` in `input`, clamping to the end of the input.
    pub fn locate(input: &str, offset: usize) -> Self {
        let mut offset = offset.min(input.len());
        while !input.is_char_boundary(offset) {
            offset -= 1;
        }
        let before = &input[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = before[line_start..].chars().count();
        Self { line, column }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

fn fragment_at(input: &str, range: Range<usize>) -> String {
    let start = range.start.min(input.len());
    let end = range.end.clamp(start, input.len());
    let Some(text) = input.get(start..end) else {
        return String::new();
    };
    let text = text.trim();
    if text.chars().count() > MAX_FRAGMENT_CHARS {
        let head: String = text.chars().take(MAX_FRAGMENT_CHARS).collect();
        format!("{head}…")
    } else {
        text.to_string()
    }
}
