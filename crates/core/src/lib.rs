//! # X17 Core Algorithm
//!
//! The X17 proof-of-work hash: seventeen hash primitives composed in a
//! fixed order, evaluated four candidate nonces at a time, plus the nonce
//! scanner that drives it.
//!
//! ## Pipeline
//!
//! ```text
//! blake512* -> bmw512 -> groestl512 -> skein512* -> jh512* -> keccak512*
//!   -> luffa512 -> cubehash512 -> shavite512 -> simd512 -> echo512
//!   -> hamsi512 -> fugue512 -> shabal512 -> whirlpool -> sha512
//!   -> haval256_5
//! ```
//!
//! Stages marked `*` run **batched**: all four lanes go through one call on
//! interleaved data. The rest run **per lane** from a pristine state. The
//! chain transposes between the two layouts whenever the stage kind
//! changes. The first stage hashes the 80-byte header, the last produces
//! the 32-byte digest, and every stage in between carries 64 bytes.
//!
//! ## Primitives
//!
//! Groestl, Skein, JH, Keccak, Shabal, Whirlpool and SHA-512 are built in
//! (RustCrypto). The remaining ten are registered through
//! [`ChainBuilder::stage`]; [`ChainBuilder::build`] fails with
//! [`Error::MissingPrimitive`] until every stage has one.
//!
//! ## Example
//!
//! ```rust,ignore
//! use x17_core::{Algorithm, CancellationToken, ChainBuilder, NonceScanner, Target, WorkItem};
//!
//! let chain = ChainBuilder::new()
//!     .with_builtin()
//!     .stage(Algorithm::Blake512, blake)?
//!     // ... remaining stages
//!     .build()?;
//!
//! let mut work = WorkItem::from_header(&header, target, 0xFFFF_FFFF)?;
//! let outcome = NonceScanner::new(&chain).scan(&mut work, &CancellationToken::new());
//! for candidate in &outcome.matches {
//!     println!("nonce {:08x}", candidate.nonce);
//! }
//! ```

mod chain;
mod error;
mod gate;
mod params;
mod primitives;
mod scan;
pub mod transpose;
mod work;

pub use chain::{ChainBuilder, HashChain};
pub use error::{Error, Result};
pub use gate::{Bucket, DifficultyGate, HIGH_WORD_LIMITS, MASKS, digest_words, meets_target};
pub use params::*;
pub use primitives::{
    Algorithm, BatchedPrimitive, DigestState, HashState, LanePrimitive, Lanewise, Layout,
    PIPELINE, Primitive, Pristine, StageDescriptor, builtin,
};
pub use scan::{Candidate, CancellationToken, NonceScanner, ScanOutcome, ScanStatus};
pub use work::{HeaderBatch, Target, WorkItem};

#[cfg(test)]
mod tests;
