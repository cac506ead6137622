use std::{borrow::Cow, fmt};

use crate::{arena::AllocError, scan};

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Category of a reader failure.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidSyntax,
    UnexpectedEof,
    /// Part of the public taxonomy; unterminated collections are reported as `UnexpectedEof`.
    UnterminatedCollection,
    OutOfMemory,
    InvalidUtf8,
    InvalidNumber,
    InvalidString,
    InvalidEscape,
    InvalidCharacter,
    UnmatchedDelimiter,
    UnknownTag,
    DuplicateKey,
    DuplicateElement,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidSyntax => "invalid syntax",
            ErrorKind::UnexpectedEof => "unexpected end of input",
            ErrorKind::UnterminatedCollection => "unterminated collection",
            ErrorKind::OutOfMemory => "out of memory",
            ErrorKind::InvalidUtf8 => "invalid UTF-8",
            ErrorKind::InvalidNumber => "invalid number",
            ErrorKind::InvalidString => "invalid string",
            ErrorKind::InvalidEscape => "invalid escape",
            ErrorKind::InvalidCharacter => "invalid character",
            ErrorKind::UnmatchedDelimiter => "unmatched delimiter",
            ErrorKind::UnknownTag => "unknown tag",
            ErrorKind::DuplicateKey => "duplicate key",
            ErrorKind::DuplicateElement => "duplicate element",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Half-open byte range `[start, end)` into the parsed input.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[inline]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[inline]
    pub const fn len(self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.end <= self.start
    }
}

/// A positioned reader error.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at byte {}: {message}", .span.start)]
pub struct Error {
    kind: ErrorKind,
    message: Cow<'static, str>,
    span: Span,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>, span: Span) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
        }
    }

    pub(crate) fn from_alloc(err: &AllocError, span: Span) -> Self {
        let kind = match err {
            AllocError::UnknownNode(_) => ErrorKind::InvalidSyntax,
            AllocError::Budget(_) | AllocError::Reserve(_) => ErrorKind::OutOfMemory,
        };
        Self::new(kind, err.to_string(), span)
    }

    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[inline]
    pub fn span(&self) -> Span {
        self.span
    }

    /// 1-based line and column of the error start within `input`.
    pub fn line_col(&self, input: &[u8]) -> (usize, usize) {
        scan::line_col(input, self.span.start)
    }

    /// Renders `line:col: kind: message`, the offending line, and a caret run under the span.
    pub fn render(&self, input: &[u8]) -> String {
        let (line, col) = self.line_col(input);
        let start = self.span.start.min(input.len());
        let line_start = memchr::memrchr(b'\n', &input[..start]).map_or(0, |i| i + 1);
        let line_end = memchr::memchr(b'\n', &input[start..]).map_or(input.len(), |i| start + i);
        let text = String::from_utf8_lossy(&input[line_start..line_end]);
        let text = text.trim_end_matches('\r');

        let underline = self.span.end.clamp(start + 1, line_end.max(start + 1)) - start;
        let underline = scan::char_count(&input[start..(start + underline).min(input.len())]).max(1);

        format!(
            "{line}:{col}: {}: {}\n{text}\n{}{}",
            self.kind,
            self.message,
            " ".repeat(col - 1),
            "^".repeat(underline),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_offset() {
        let err = Error::new(ErrorKind::DuplicateKey, "key `:a` appears twice", Span::new(7, 9));
        assert_eq!(
            err.to_string(),
            "duplicate key at byte 7: key `:a` appears twice"
        );
    }

    #[test]
    fn render_points_at_span() {
        let input = b"{:a 1\n :a 2}";
        let err = Error::new(ErrorKind::DuplicateKey, "duplicate map key", Span::new(7, 9));
        assert_eq!(err.line_col(input), (2, 2));
        assert_eq!(
            err.render(input),
            "2:2: duplicate key: duplicate map key\n :a 2}\n ^^"
        );
    }

    #[test]
    fn render_at_end_of_input() {
        let input = b"[1 2";
        let err = Error::new(ErrorKind::UnexpectedEof, "unterminated vector", Span::new(4, 4));
        assert_eq!(err.render(input), "1:5: unexpected end of input: unterminated vector\n[1 2\n    ^");
    }
}
