//! Dependency-aware statement sorter for Odoo Python source files.
//!
//! The entry point is [`sort`]: it takes a whole file (bytes or decoded
//! text), resolves the dependencies between its top-level statements and,
//! recursively, the members of each class body, and emits the same file
//! with those statements reordered into a configuration closer to Odoo's
//! house style — without changing what the file does when it runs.

mod bindings;
mod class_sort;
mod error;
mod graph;
mod ioenc;
mod module_sort;
mod policy;
mod refs;
mod roles;
mod statement;

use std::sync::Arc;

pub use error::{
    DecodingError, ParseError, Position, ResolutionError, SortError, UnknownEncodingError, WildcardImportError,
};
pub use policy::{OnDecodingError, OnParseError, OnUnknownEncoding, OnUnresolved, OnWildcardImport, Policy};

/// A whole source file, either still-encoded bytes or already-decoded
/// text. [`sort`] returns the same variant it was given: sorting never
/// changes a file's encoding.
#[derive(Debug, Clone)]
pub enum Source {
    Text(String),
    Bytes(Vec<u8>),
}

impl Source {
    /// The decoded text, if this is already a `Text` source.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Bytes(_) => None,
        }
    }
}

/// Options controlling one [`sort`] call. `Default` resolves every policy
/// to `raise`, matching a strict library caller; a CLI driver typically
/// overrides `on_unresolved`/`on_wildcard_import` with something gentler.
pub struct SortOptions {
    /// Alphabetize field declarations within a class body instead of
    /// keeping their original relative order (spec.md §4.5 step 3).
    pub sort_fields: bool,
    pub on_unknown_encoding: OnUnknownEncoding,
    pub on_decoding_error: OnDecodingError,
    pub on_parse_error: OnParseError,
    pub on_unresolved: OnUnresolved,
    pub on_wildcard_import: OnWildcardImport,
}

impl Default for SortOptions {
    fn default() -> Self {
        Self {
            sort_fields: false,
            on_unknown_encoding: OnUnknownEncoding::default(),
            on_decoding_error: OnDecodingError::default(),
            on_parse_error: OnParseError::default(),
            on_unresolved: OnUnresolved::default(),
            on_wildcard_import: OnWildcardImport::default(),
        }
    }
}

/// Sorts one source file's top-level statements and class bodies.
///
/// On any of the four file-level failures (unknown encoding, decoding,
/// syntax, or a raising wildcard-import policy) this either returns the
/// input completely unchanged (`ignore`/custom policies) or an `Err`
/// (`raise`) — never a partial rewrite (spec.md §7).
pub fn sort(source: Source, options: &SortOptions) -> Result<Source, SortError> {
    let (decoded, encoding) = match &source {
        Source::Bytes(bytes) => match ioenc::decode(bytes) {
            Ok((text, encoding)) => (text, Some(encoding)),
            Err(ioenc::EncodingOutcome::Unknown(payload)) => {
                return match policy::dispatch::<_, UnknownEncodingError>(&options.on_unknown_encoding, payload) {
                    Ok(()) => Ok(source),
                    Err(err) => Err(err),
                };
            }
            Err(ioenc::EncodingOutcome::Decoding(payload)) => {
                return match policy::dispatch::<_, DecodingError>(&options.on_decoding_error, payload) {
                    Ok(()) => Ok(source),
                    Err(err) => Err(err),
                };
            }
        },
        Source::Text(text) => (text.clone(), None),
    };

    let newline = ioenc::detect_newline(&decoded);
    let normalized = ioenc::normalize_newlines(&decoded);

    let parsed = match ruff_python_parser::parse_module(&normalized) {
        Ok(parsed) => parsed,
        Err(err) => {
            let offset: usize = usize::from(err.location);
            // Syntax errors report a 1-based column, mirroring Python's own
            // `SyntaxError.offset`; every other error kind reports the
            // 0-based `position_at` column untouched, matching ast's
            // `col_offset`.
            let mut position = module_sort::position_at(&normalized, offset);
            position.column += 1;
            let payload = ParseError {
                message: err.error.to_string(),
                position,
            };
            return match policy::dispatch::<_, ParseError>(&options.on_parse_error, payload) {
                Ok(()) => Ok(source),
                Err(err) => Err(err),
            };
        }
    };

    let buffer: Arc<str> = Arc::from(normalized.as_str());
    let statements = statement::segment(&buffer, parsed.into_syntax().body, 0, buffer.len());

    let graph = match module_sort::build_graph(
        &normalized,
        &statements,
        &options.on_unresolved,
        &options.on_wildcard_import,
    )? {
        Some(graph) => graph,
        None => return Ok(source),
    };

    let sorted = module_sort::render(&statements, graph, options.sort_fields);
    let denormalized = ioenc::denormalize_newlines(&sorted, newline);

    Ok(match encoding {
        Some(encoding) => Source::Bytes(ioenc::encode(&denormalized, &encoding)),
        None => Source::Text(denormalized),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reorders_top_level_private_helper_before_its_caller() {
        let source = "\ndef public():\n    return _private()\n\ndef _private():\n    pass\n";
        let result = sort(Source::Text(source.to_owned()), &SortOptions::default()).expect("sorts cleanly");
        let text = result.as_text().expect("text in, text out");
        assert!(text.find("_private").unwrap() < text.find("public").unwrap());
    }

    #[test]
    fn already_sorted_input_is_a_byte_for_byte_no_op() {
        let source = "def _private():\n    pass\n\n\ndef public():\n    return _private()\n";
        let result = sort(Source::Text(source.to_owned()), &SortOptions::default()).expect("sorts cleanly");
        assert_eq!(result.as_text().unwrap(), source);
    }

    #[test]
    fn crlf_input_round_trips_its_line_ending() {
        let source = b"a = b\r\nb = 4".to_vec();
        let result = sort(Source::Bytes(source), &SortOptions::default()).expect("sorts cleanly");
        match result {
            Source::Bytes(bytes) => assert_eq!(bytes, b"b = 4\r\na = b\r\n"),
            Source::Text(_) => panic!("bytes in, bytes out"),
        }
    }

    #[test]
    fn syntax_error_raises_with_position() {
        let err = sort(Source::Text("a =".to_owned()), &SortOptions::default()).unwrap_err();
        match err {
            SortError::Parse(payload) => assert_eq!((payload.position.line, payload.position.column), (1, 4)),
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn unresolved_reference_raises_with_name() {
        let source = "def fun():\n    unresolved()\n";
        let err = sort(Source::Text(source.to_owned()), &SortOptions::default()).unwrap_err();
        match err {
            SortError::Resolution(payload) => {
                assert_eq!(payload.name, "unresolved");
                assert_eq!((payload.position.line, payload.position.column), (2, 4));
            }
            other => panic!("expected a resolution error, got {other:?}"),
        }
    }

    #[test]
    fn wildcard_import_raises() {
        let err = sort(Source::Text("from module import *".to_owned()), &SortOptions::default()).unwrap_err();
        match err {
            SortError::WildcardImport(payload) => assert_eq!((payload.position.line, payload.position.column), (1, 0)),
            other => panic!("expected a wildcard import error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_encoding_ignored_returns_input_unchanged() {
        let source = b"# coding=invalid-encoding\n".to_vec();
        let mut options = SortOptions::default();
        options.on_unknown_encoding = Policy::Ignore;
        let result = sort(Source::Bytes(source.clone()), &options).expect("ignored, not raised");
        match result {
            Source::Bytes(bytes) => assert_eq!(bytes, source),
            Source::Text(_) => panic!("bytes in, bytes out"),
        }
    }
}
