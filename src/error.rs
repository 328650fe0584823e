//! Error type shared by every public operation.

use std::collections::TryReserveError;

/// Failure kinds reported by the partitioning routines.
///
/// `InvalidInput` is a caller bug and should not be retried. `ResourceExhausted`
/// may succeed with a smaller problem. `Internal` means an invariant was broken
/// inside the library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("insufficient memory: {0}")]
    ResourceExhausted(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("line {line}: {msg}")]
    Parse { line: usize, msg: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub(crate) fn input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    pub(crate) fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }

    pub(crate) fn alloc(what: &str, err: TryReserveError) -> Self {
        Error::ResourceExhausted(format!("{what}: {err}"))
    }
}

/// Bail out with [`Error::InvalidInput`] unless the condition holds.
macro_rules! ensure_input {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::error::Error::InvalidInput(format!($($arg)+)));
        }
    };
}
pub(crate) use ensure_input;
