//! Error types for chain construction and work validation.
//!
//! Hashing, gating and scanning never fail; every check here runs once,
//! before a session starts.

use thiserror::Error;

use crate::params::{DIGEST_LEN, HEADER_LEN};
use crate::primitives::Algorithm;

/// Errors raised while building a chain or validating work input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The supplied header is not exactly 80 bytes.
    #[error("Header must be {} bytes, got {actual}", HEADER_LEN)]
    InvalidHeaderLength { actual: usize },

    /// The supplied target is not exactly 32 bytes.
    #[error("Target must be {} bytes, got {actual}", DIGEST_LEN)]
    InvalidTargetLength { actual: usize },

    /// No backend was registered for a stage.
    #[error("No primitive registered for {0}")]
    MissingPrimitive(Algorithm),

    /// A batched primitive was offered for a stage that runs per lane.
    #[error("{0} runs per lane and cannot take a batched primitive")]
    LayoutMismatch(Algorithm),

    /// A primitive produces a digest of the wrong size for its stage.
    #[error("{algorithm} must produce {expected} bytes, primitive produces {actual}")]
    OutputLength {
        algorithm: Algorithm,
        expected: usize,
        actual: usize,
    },
}

/// Result alias for this crate.
pub type Result<T> = core::result::Result<T, Error>;
