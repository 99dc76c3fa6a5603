//! Error payloads for the five failure kinds `osort` can report (spec.md §7).
//!
//! Every payload hand-writes its own `Display`/`Error` impl instead of
//! reaching for `thiserror`, matching how the teacher's own error types
//! (`ParseError`, `ResourceError`, `ReplError`) are written.

use std::fmt;

/// A source position used in error payloads: `line` is 1-based, `column`
/// is 0-based, matching the original ast's `col_offset` convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub(crate) fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// The `coding:`/`coding=` declaration names an encoding we don't know.
#[derive(Debug, Clone)]
pub struct UnknownEncodingError {
    pub message: String,
    pub encoding: String,
}

impl fmt::Display for UnknownEncodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for UnknownEncodingError {}

/// The input bytes don't decode under the chosen (or default) encoding.
#[derive(Debug, Clone)]
pub struct DecodingError {
    pub message: String,
}

impl fmt::Display for DecodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DecodingError {}

/// The source is not syntactically valid Python. `position.column` here is
/// 1-based, unlike every other error kind's position — matching Python's
/// own `SyntaxError.offset` convention for the token the parser choked on.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub position: Position,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "syntax error: {}: line {}, column {}",
            self.message, self.position.line, self.position.column
        )
    }
}

impl std::error::Error for ParseError {}

/// A reference could not be bound to any statement in its scope.
#[derive(Debug, Clone)]
pub struct ResolutionError {
    pub message: String,
    pub name: String,
    pub position: Position,
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unresolved dependency '{}': line {}, column {}",
            self.name, self.position.line, self.position.column
        )
    }
}

impl std::error::Error for ResolutionError {}

/// A `from m import *` makes sound dependency analysis impossible for its scope.
#[derive(Debug, Clone)]
pub struct WildcardImportError {
    pub position: Position,
}

impl fmt::Display for WildcardImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "can't reliably determine dependencies on * import: line {}, column {}",
            self.position.line, self.position.column
        )
    }
}

impl std::error::Error for WildcardImportError {}

/// Union of the five error kinds, used by the `raise` policy form.
#[derive(Debug, Clone)]
pub enum SortError {
    UnknownEncoding(UnknownEncodingError),
    Decoding(DecodingError),
    Parse(ParseError),
    Resolution(ResolutionError),
    WildcardImport(WildcardImportError),
}

impl fmt::Display for SortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownEncoding(e) => write!(f, "{e}"),
            Self::Decoding(e) => write!(f, "{e}"),
            Self::Parse(e) => write!(f, "{e}"),
            Self::Resolution(e) => write!(f, "{e}"),
            Self::WildcardImport(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SortError {}

impl From<UnknownEncodingError> for SortError {
    fn from(error: UnknownEncodingError) -> Self {
        Self::UnknownEncoding(error)
    }
}

impl From<DecodingError> for SortError {
    fn from(error: DecodingError) -> Self {
        Self::Decoding(error)
    }
}

impl From<ParseError> for SortError {
    fn from(error: ParseError) -> Self {
        Self::Parse(error)
    }
}

impl From<ResolutionError> for SortError {
    fn from(error: ResolutionError) -> Self {
        Self::Resolution(error)
    }
}

impl From<WildcardImportError> for SortError {
    fn from(error: WildcardImportError) -> Self {
        Self::WildcardImport(error)
    }
}
