//! X17 Algorithm Parameters
//!
//! Fixed sizes shared by the chain, the lane transpose and the scanner.

/// Number of parallel lanes (candidate nonces) per hash invocation
pub const LANES: usize = 4;

/// Granularity of the lane interleave in bytes (one 64-bit word)
pub const WORD_LEN: usize = 8;

/// Block header size in bytes
pub const HEADER_LEN: usize = 80;

/// Block header size in 32-bit words
pub const HEADER_WORDS: usize = HEADER_LEN / 4;

/// Index of the nonce word within the header
pub const NONCE_INDEX: usize = 19;

/// Byte offset of the nonce within the header
pub const NONCE_OFFSET: usize = NONCE_INDEX * 4;

/// Intermediate digest size carried between stages
pub const STATE_LEN: usize = 64;

/// Final digest size
pub const DIGEST_LEN: usize = 32;

/// Largest per-lane buffer the chain ever holds (the header)
pub const MAX_LANE_LEN: usize = HEADER_LEN;

/// Number of primitives in the chain
pub const STAGES: usize = 17;
