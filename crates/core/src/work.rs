//! Work descriptions: header template, target and the four-lane header batch

use crate::error::{Error, Result};
use crate::params::{DIGEST_LEN, HEADER_LEN, HEADER_WORDS, LANES, NONCE_INDEX, WORD_LEN};
use crate::transpose::interleave;

/// Words in a target or digest
const TARGET_WORDS: usize = DIGEST_LEN / 4;

/// 256-bit difficulty target.
///
/// Stored as eight 32-bit words, least significant first; word 7 is the
/// most significant. A digest meets the target when, read the same way,
/// it compares less than or equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Target([u32; TARGET_WORDS]);

impl Target {
    /// Easiest possible target: every digest passes.
    pub const MAX: Self = Self([u32::MAX; TARGET_WORDS]);

    pub const fn from_words(words: [u32; TARGET_WORDS]) -> Self {
        Self(words)
    }

    /// Parse a 32-byte big-endian number.
    pub fn from_be_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != DIGEST_LEN {
            return Err(Error::InvalidTargetLength {
                actual: bytes.len(),
            });
        }

        let mut words = [0u32; TARGET_WORDS];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(4).rev()) {
            *word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Ok(Self(words))
    }

    pub fn to_be_bytes(&self) -> [u8; DIGEST_LEN] {
        let mut bytes = [0u8; DIGEST_LEN];
        for (chunk, word) in bytes.chunks_exact_mut(4).zip(self.0.iter().rev()) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        bytes
    }

    #[inline(always)]
    pub fn words(&self) -> &[u32; TARGET_WORDS] {
        &self.0
    }

    /// Most significant word, which selects the pre-filter bucket
    #[inline(always)]
    pub fn high_word(&self) -> u32 {
        self.0[TARGET_WORDS - 1]
    }
}

/// One unit of work: header template, target and nonce bound.
///
/// The header is held as twenty 32-bit words. The hashed header is those
/// words serialized big-endian, with the nonce as the last word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    data: [u32; HEADER_WORDS],
    target: Target,
    max_nonce: u32,
}

impl WorkItem {
    pub fn new(data: [u32; HEADER_WORDS], target: Target, max_nonce: u32) -> Self {
        Self {
            data,
            target,
            max_nonce,
        }
    }

    /// Build from an 80-byte header as it is hashed (big-endian words).
    ///
    /// The scan starts at the nonce already present in the header.
    pub fn from_header(header: &[u8], target: Target, max_nonce: u32) -> Result<Self> {
        if header.len() != HEADER_LEN {
            return Err(Error::InvalidHeaderLength {
                actual: header.len(),
            });
        }

        let mut data = [0u32; HEADER_WORDS];
        for (word, chunk) in data.iter_mut().zip(header.chunks_exact(4)) {
            *word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Ok(Self::new(data, target, max_nonce))
    }

    pub fn data(&self) -> &[u32; HEADER_WORDS] {
        &self.data
    }

    /// Current nonce (scan start before a scan, resume point after)
    pub fn nonce(&self) -> u32 {
        self.data[NONCE_INDEX]
    }

    pub fn set_nonce(&mut self, nonce: u32) {
        self.data[NONCE_INDEX] = nonce;
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn max_nonce(&self) -> u32 {
        self.max_nonce
    }

    /// The header as hashed: every word big-endian
    pub fn header_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        for (chunk, word) in bytes.chunks_exact_mut(4).zip(self.data.iter()) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        bytes
    }
}

/// Four interleaved copies of a header, differing only in their nonce.
///
/// The nonce is the low half of 64-bit word 9 in each lane, so for lane
/// `j` it sits at byte `(9 * LANES + j) * 8 + 4` of the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderBatch {
    bytes: [u8; LANES * HEADER_LEN],
}

/// 64-bit word of the lane header holding the nonce
const NONCE_WORD: usize = HEADER_LEN / WORD_LEN - 1;

impl HeaderBatch {
    /// Interleave the work header into all four lanes
    pub fn new(work: &WorkItem) -> Self {
        Self::splat(&work.header_bytes())
    }

    /// Interleave `header` unchanged into all four lanes
    pub fn splat(header: &[u8; HEADER_LEN]) -> Self {
        let mut bytes = [0u8; LANES * HEADER_LEN];
        interleave(&mut bytes, [&header[..]; LANES], HEADER_LEN * 8);
        Self { bytes }
    }

    /// Overwrite the nonce of one lane (written big-endian)
    #[inline(always)]
    pub fn set_lane_nonce(&mut self, lane: usize, nonce: u32) {
        let at = (NONCE_WORD * LANES + lane) * WORD_LEN + 4;
        self.bytes[at..at + 4].copy_from_slice(&nonce.to_be_bytes());
    }

    /// Set lane `j` to nonce `base + j`, wrapping at 2^32
    #[inline]
    pub fn set_nonces(&mut self, base: u32) {
        for lane in 0..LANES {
            self.set_lane_nonce(lane, base.wrapping_add(lane as u32));
        }
    }

    pub fn as_bytes(&self) -> &[u8; LANES * HEADER_LEN] {
        &self.bytes
    }
}
