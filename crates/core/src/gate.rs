//! Difficulty gate
//!
//! A digest passes when, read as a 256-bit little-endian number, it is at
//! most the target. A mask test on the digest's most significant word runs
//! first and rejects almost every candidate; the mask is picked once per
//! target from a six-entry table.

use crate::params::DIGEST_LEN;
use crate::work::Target;

/// Upper bounds on the target's high word, one per bucket
pub const HIGH_WORD_LIMITS: [u32; 6] = [0, 0xF, 0xFF, 0xFFF, 0xFFFF, 0x1000_0000];

/// Bits of the digest's high word that must be zero, one per bucket
pub const MASKS: [u32; 6] = [
    0xFFFF_FFFF,
    0xFFFF_FFF0,
    0xFFFF_FF00,
    0xFFFF_F000,
    0xFFFF_0000,
    0,
];

/// Pre-filter bucket chosen for a target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    pub index: usize,
    pub mask: u32,
}

impl Bucket {
    /// First bucket whose limit covers `high_word`. Targets above every
    /// limit use the last bucket, whose mask rejects nothing.
    pub fn for_high_word(high_word: u32) -> Self {
        let index = HIGH_WORD_LIMITS
            .iter()
            .position(|&limit| high_word <= limit)
            .unwrap_or(MASKS.len() - 1);

        Self {
            index,
            mask: MASKS[index],
        }
    }
}

/// Target plus its precomputed pre-filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifficultyGate {
    target: Target,
    bucket: Bucket,
}

impl DifficultyGate {
    pub fn new(target: &Target) -> Self {
        Self {
            target: *target,
            bucket: Bucket::for_high_word(target.high_word()),
        }
    }

    pub fn bucket(&self) -> Bucket {
        self.bucket
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Cheap necessary condition. Never rejects a digest that meets the
    /// target.
    #[inline(always)]
    pub fn prefilter(&self, digest: &[u8; DIGEST_LEN]) -> bool {
        high_word(digest) & self.bucket.mask == 0
    }

    /// Pre-filter, then full comparison
    #[inline]
    pub fn check(&self, digest: &[u8; DIGEST_LEN]) -> bool {
        self.prefilter(digest) && meets_target(digest, &self.target)
    }
}

/// Digest as eight little-endian words, least significant first
#[inline]
pub fn digest_words(digest: &[u8; DIGEST_LEN]) -> [u32; 8] {
    let mut words = [0u32; 8];
    for (word, chunk) in words.iter_mut().zip(digest.chunks_exact(4)) {
        *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    words
}

#[inline(always)]
fn high_word(digest: &[u8; DIGEST_LEN]) -> u32 {
    u32::from_le_bytes([digest[28], digest[29], digest[30], digest[31]])
}

/// Full comparison from the most significant word down; equal passes.
pub fn meets_target(digest: &[u8; DIGEST_LEN], target: &Target) -> bool {
    let words = digest_words(digest);
    for (d, t) in words.iter().zip(target.words()).rev() {
        if d != t {
            return d < t;
        }
    }
    true
}
