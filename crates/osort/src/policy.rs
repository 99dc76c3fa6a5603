//! The `raise | ignore | callable` policy shape from spec.md §7, kept as a
//! single generic sum type so each `on_*` hook dispatches the same way.

use crate::error::{
    DecodingError, ParseError, ResolutionError, SortError, UnknownEncodingError, WildcardImportError,
};

/// A resolved policy for one error kind.
///
/// `Raise` panics the call out via `SortError` (by convention propagated
/// through `Result`, see [`crate::sort`]); `Ignore` silently drops the
/// signal; `Custom` hands the payload to caller code.
pub enum Policy<F> {
    Raise,
    Ignore,
    Custom(F),
}

impl<F> Default for Policy<F> {
    fn default() -> Self {
        Self::Raise
    }
}

impl<F> Policy<F> {
    pub fn custom(handler: F) -> Self {
        Self::Custom(handler)
    }
}

pub type OnUnknownEncoding = Policy<Box<dyn Fn(&UnknownEncodingError)>>;
pub type OnDecodingError = Policy<Box<dyn Fn(&DecodingError)>>;
pub type OnParseError = Policy<Box<dyn Fn(&ParseError)>>;
pub type OnUnresolved = Policy<Box<dyn Fn(&ResolutionError)>>;
pub type OnWildcardImport = Policy<Box<dyn Fn(&WildcardImportError)>>;

/// Dispatches a policy for one occurrence of its error kind: `Raise`
/// returns `Err`, `Ignore` silently drops the signal, `Custom` hands the
/// payload to caller code (for logging/telemetry) without stopping
/// analysis.
///
/// Callers decide what `Err` means for them: the four file-level policies
/// (encoding, decoding, parse, wildcard-import-in-raise-mode) abort the
/// whole file on `Err`; the resolution policy is invoked once per
/// unresolved reference and only the first `Err` actually aborts, since
/// the statement-by-statement resolver would otherwise keep going.
pub(crate) fn dispatch<P, E>(policy: &Policy<Box<dyn Fn(&P)>>, payload: P) -> Result<(), SortError>
where
    E: From<P>,
    SortError: From<E>,
{
    match policy {
        Policy::Raise => Err(SortError::from(E::from(payload))),
        Policy::Ignore => Ok(()),
        Policy::Custom(handler) => {
            handler(&payload);
            Ok(())
        }
    }
}
