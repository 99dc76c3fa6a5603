//! Encoding and newline detection/normalization (spec.md §4.6).

use encoding_rs::Encoding;

use crate::error::{DecodingError, UnknownEncodingError};

/// One of the three line terminators this crate recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Newline {
    Lf,
    CrLf,
    Cr,
}

impl Newline {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
            Self::Cr => "\r",
        }
    }
}

/// Scans the first two physical lines of `text` for a PEP 263 style
/// `coding[:=]\s*([-\w.]+)` declaration, e.g. `# coding=utf-8` or
/// `# -*- coding: latin-1 -*-`. Returns the raw encoding name if found.
pub fn detect_coding_declaration(text: &str) -> Option<&str> {
    for line in text.split('\n').take(2) {
        if let Some(name) = scan_coding_name(line) {
            return Some(name);
        }
    }
    None
}

fn scan_coding_name(line: &str) -> Option<&str> {
    let bytes = line.as_bytes();
    let needle = b"coding";
    let mut i = 0;
    while i + needle.len() <= bytes.len() {
        if &bytes[i..i + needle.len()] == needle {
            let mut j = i + needle.len();
            let Some(&sep) = bytes.get(j) else { return None };
            if sep != b':' && sep != b'=' {
                i += 1;
                continue;
            }
            j += 1;
            while bytes.get(j).is_some_and(u8::is_ascii_whitespace) {
                j += 1;
            }
            let start = j;
            while bytes
                .get(j)
                .is_some_and(|&b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b'.')
            {
                j += 1;
            }
            if j > start {
                return Some(&line[start..j]);
            }
            return None;
        }
        i += 1;
    }
    None
}

/// Resolves a declared encoding name to an `encoding_rs::Encoding`, or
/// `None` if unrecognized (the caller dispatches `on_unknown_encoding`).
/// `ascii` has no dedicated `encoding_rs` codec, so it is handled as a
/// separate strict-7-bit case in [`decode`].
fn resolve_encoding(name: &str) -> Option<&'static Encoding> {
    match name.to_ascii_lowercase().as_str() {
        "utf-8" | "utf8" | "u8" => Some(encoding_rs::UTF_8),
        "latin-1" | "latin1" | "iso-8859-1" | "iso8859-1" | "8859" | "cp819" => Some(encoding_rs::WINDOWS_1252),
        "utf-16" | "utf16" => Some(encoding_rs::UTF_16LE),
        "utf-16-le" | "utf-16le" => Some(encoding_rs::UTF_16LE),
        "utf-16-be" | "utf-16be" => Some(encoding_rs::UTF_16BE),
        _ => None,
    }
}

fn is_ascii_name(name: &str) -> bool {
    matches!(name.to_ascii_lowercase().as_str(), "ascii" | "us-ascii" | "646")
}

/// Detects the declared encoding (defaulting to UTF-8) and decodes `bytes`
/// into owned text, or returns the relevant error payload.
pub fn decode(bytes: &[u8]) -> Result<(String, String), EncodingOutcome> {
    // A UTF-8 BOM always wins, matching Python's tokenizer behavior.
    let declared = if bytes.starts_with(b"\xef\xbb\xbf") {
        "utf-8".to_owned()
    } else {
        // The coding declaration is itself plain ASCII, so it is safe to
        // scan over a lossy UTF-8 decode even before we know the real
        // encoding.
        let preview = String::from_utf8_lossy(&bytes[..bytes.len().min(4096)]);
        detect_coding_declaration(&preview)
            .map(str::to_owned)
            .unwrap_or_else(|| "utf-8".to_owned())
    };

    let input = if bytes.starts_with(b"\xef\xbb\xbf") {
        &bytes[3..]
    } else {
        bytes
    };

    if is_ascii_name(&declared) {
        return if input.is_ascii() {
            Ok((String::from_utf8_lossy(input).into_owned(), declared))
        } else {
            Err(EncodingOutcome::Decoding(DecodingError {
                message: "'ascii' codec can't decode byte sequence".to_owned(),
            }))
        };
    }

    let Some(encoding) = resolve_encoding(&declared) else {
        return Err(EncodingOutcome::Unknown(UnknownEncodingError {
            message: format!("unknown encoding: {declared}"),
            encoding: declared,
        }));
    };

    let (decoded, _, had_errors) = encoding.decode(input);
    if had_errors {
        return Err(EncodingOutcome::Decoding(DecodingError {
            message: format!("'{declared}' codec can't decode byte sequence"),
        }));
    }

    Ok((decoded.into_owned(), declared))
}

pub enum EncodingOutcome {
    Unknown(UnknownEncodingError),
    Decoding(DecodingError),
}

/// Re-encodes `text` under the previously-detected `encoding` name.
pub fn encode(text: &str, encoding: &str) -> Vec<u8> {
    if is_ascii_name(encoding) {
        return text.as_bytes().to_vec();
    }
    let enc = resolve_encoding(encoding).unwrap_or(encoding_rs::UTF_8);
    let (bytes, _, _) = enc.encode(text);
    bytes.into_owned()
}

/// Returns the dominant line terminator, defaulting to `Lf` on a tie or
/// when no newline is present.
pub fn detect_newline(text: &str) -> Newline {
    let mut crlf = 0usize;
    let mut cr = 0usize;
    let mut lf = 0usize;

    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\r' => {
                if bytes.get(i + 1) == Some(&b'\n') {
                    crlf += 1;
                    i += 1;
                } else {
                    cr += 1;
                }
            }
            b'\n' => lf += 1,
            _ => {}
        }
        i += 1;
    }

    if crlf > lf && crlf >= cr {
        Newline::CrLf
    } else if cr > lf && cr > crlf {
        Newline::Cr
    } else {
        Newline::Lf
    }
}

/// Normalizes all three recognized line terminators down to bare `\n`.
pub fn normalize_newlines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\r' {
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
            out.push('\n');
        } else {
            out.push(c);
        }
    }
    out
}

/// Rewrites bare `\n` back to the detected terminator. A no-op for `Lf`.
pub fn denormalize_newlines(text: &str, newline: Newline) -> String {
    if newline == Newline::Lf {
        return text.to_owned();
    }
    text.replace('\n', newline.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_coding_equals() {
        assert_eq!(detect_coding_declaration("# coding=utf-8\n"), Some("utf-8"));
    }

    #[test]
    fn detects_coding_emacs_style() {
        assert_eq!(detect_coding_declaration("# -*- coding: latin-1 -*-\n"), Some("latin-1"));
    }

    #[test]
    fn detects_newline_flavors() {
        assert_eq!(detect_newline("a\r\nb\r\n"), Newline::CrLf);
        assert_eq!(detect_newline("a\nb\n"), Newline::Lf);
        assert_eq!(detect_newline("a\rb\r"), Newline::Cr);
        assert_eq!(detect_newline("no newline here"), Newline::Lf);
        assert_eq!(detect_newline("a\r\nb\n"), Newline::Lf);
    }

    #[test]
    fn normalizes_and_denormalizes_round_trip() {
        let original = "a = 1\r\nb = 2\r\n";
        let newline = detect_newline(original);
        let normalized = normalize_newlines(original);
        assert_eq!(normalized, "a = 1\nb = 2\n");
        assert_eq!(denormalize_newlines(&normalized, newline), original);
    }

    #[test]
    fn unknown_encoding_reports_name() {
        let bytes = b"# coding=invalid-encoding\n";
        match decode(bytes) {
            Err(EncodingOutcome::Unknown(err)) => assert_eq!(err.encoding, "invalid-encoding"),
            _ => panic!("expected unknown encoding error"),
        }
    }
}
