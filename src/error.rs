//! Error types for strconcat.

use std::collections::TryReserveError;
use std::fmt;

/// Which argument of a concatenation was absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operand {
    /// The left-hand string.
    First,
    /// The right-hand string.
    Second,
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::First => f.write_str("first"),
            Operand::Second => f.write_str("second"),
        }
    }
}

/// Errors that can occur while building a concatenation.
///
/// The `Option`-returning entry points collapse all of these into `None`;
/// the `try_*` entry points report them individually.
#[derive(Debug)]
pub enum ConcatError {
    /// An operand was absent. When both are absent the first is reported.
    MissingInput {
        /// The missing operand.
        operand: Operand,
    },

    /// `len1 + len2 + 1` does not fit in `usize`.
    LengthOverflow,

    /// The allocator refused the request.
    AllocFailed {
        /// Bytes requested, terminator included.
        requested: usize,
        /// The system allocator's error; `None` when a heap budget refused it.
        source: Option<TryReserveError>,
    },
}

impl ConcatError {
    pub(crate) fn alloc_failed(requested: usize, source: TryReserveError) -> Self {
        ConcatError::AllocFailed {
            requested,
            source: Some(source),
        }
    }

    pub(crate) fn over_budget(requested: usize) -> Self {
        ConcatError::AllocFailed {
            requested,
            source: None,
        }
    }

    /// True for [`ConcatError::MissingInput`].
    pub fn is_missing_input(&self) -> bool {
        matches!(self, ConcatError::MissingInput { .. })
    }

    /// True when the request could not be satisfied by an allocator.
    pub fn is_alloc_failure(&self) -> bool {
        matches!(
            self,
            ConcatError::AllocFailed { .. } | ConcatError::LengthOverflow
        )
    }
}

impl fmt::Display for ConcatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConcatError::MissingInput { operand } => {
                write!(f, "missing input: {} operand is absent", operand)
            }
            ConcatError::LengthOverflow => f.write_str("concatenated length overflows usize"),
            ConcatError::AllocFailed { requested, source } => match source {
                Some(e) => write!(f, "allocation of {} bytes failed: {}", requested, e),
                None => write!(f, "allocation of {} bytes exceeds heap budget", requested),
            },
        }
    }
}

impl std::error::Error for ConcatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConcatError::AllocFailed {
                source: Some(e), ..
            } => Some(e),
            _ => None,
        }
    }
}
