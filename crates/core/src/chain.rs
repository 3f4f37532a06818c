//! The seventeen-stage chain
//!
//! Data moves through the stages in whichever layout the current stage
//! wants. Consecutive stages of the same layout hand over directly; a
//! layout change costs one transpose of the current buffer.

use crate::error::{Error, Result};
use crate::params::{DIGEST_LEN, HEADER_LEN, LANES, MAX_LANE_LEN, STAGES};
use crate::primitives::{builtin, Algorithm, Layout, Primitive, PIPELINE};
use crate::transpose::{deinterleave, interleave};
use crate::work::HeaderBatch;

/// A fully populated X17 chain.
///
/// Immutable once built; safe to share between scanning threads.
#[derive(Debug)]
pub struct HashChain {
    stages: Vec<(Algorithm, Primitive)>,
}

impl HashChain {
    pub fn builder() -> ChainBuilder {
        ChainBuilder::new()
    }

    /// Assemble stages in the given order without checking them against
    /// the pipeline.
    #[cfg(test)]
    pub(crate) fn from_stages_unchecked(stages: Vec<(Algorithm, Primitive)>) -> Self {
        Self { stages }
    }

    /// Stage algorithms in execution order
    pub fn algorithms(&self) -> impl Iterator<Item = Algorithm> + '_ {
        self.stages.iter().map(|(algorithm, _)| *algorithm)
    }

    /// Hash four interleaved headers, returning each lane's 32-byte digest.
    pub fn hash(&self, batch: &HeaderBatch) -> [[u8; DIGEST_LEN]; LANES] {
        let mut front = [0u8; LANES * MAX_LANE_LEN];
        let mut back = [0u8; LANES * MAX_LANE_LEN];
        let mut lanes = [[0u8; MAX_LANE_LEN]; LANES];
        let mut spare = [[0u8; MAX_LANE_LEN]; LANES];

        let (mut src, mut dst) = (&mut front, &mut back);
        let (mut cur, mut next) = (&mut lanes, &mut spare);

        src[..LANES * HEADER_LEN].copy_from_slice(batch.as_bytes());
        let mut len = HEADER_LEN;
        let mut layout = Layout::Batched;

        for (_, primitive) in &self.stages {
            let out = primitive.output_len();

            match primitive {
                Primitive::Batched(p) => {
                    if layout == Layout::PerLane {
                        interleave(&mut src[..], cur.each_ref().map(|l| &l[..len]), len * 8);
                        layout = Layout::Batched;
                    }
                    p.digest_batch(&src[..LANES * len], len, &mut dst[..LANES * out]);
                    core::mem::swap(&mut src, &mut dst);
                }
                Primitive::PerLane(p) => {
                    if layout == Layout::Batched {
                        deinterleave(cur.each_mut().map(|l| &mut l[..len]), &src[..], len * 8);
                        layout = Layout::PerLane;
                    }
                    for (lane, digest) in cur.iter().zip(next.iter_mut()) {
                        p.digest_lane(&lane[..len], &mut digest[..out]);
                    }
                    core::mem::swap(&mut cur, &mut next);
                }
            }

            len = out;
        }

        if layout == Layout::Batched {
            deinterleave(cur.each_mut().map(|l| &mut l[..len]), &src[..], len * 8);
        }

        let mut digests = [[0u8; DIGEST_LEN]; LANES];
        for (digest, lane) in digests.iter_mut().zip(cur.iter()) {
            digest.copy_from_slice(&lane[..DIGEST_LEN]);
        }
        digests
    }

    /// Hash a single big-endian header.
    pub fn hash_header(&self, header: &[u8; HEADER_LEN]) -> [u8; DIGEST_LEN] {
        let [first, ..] = self.hash(&HeaderBatch::splat(header));
        first
    }
}

/// Registers a primitive for every stage, then checks the set is complete.
///
/// ```rust,ignore
/// let chain = ChainBuilder::new()
///     .with_builtin()
///     .stage(Algorithm::Blake512, blake)?
///     .stage(Algorithm::Bmw512, bmw)?
///     // ...
///     .build()?;
/// ```
#[derive(Debug, Default)]
pub struct ChainBuilder {
    slots: [Option<Primitive>; STAGES],
}

impl ChainBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill every empty slot that has a built-in backend.
    pub fn with_builtin(mut self) -> Self {
        for (slot, descriptor) in self.slots.iter_mut().zip(PIPELINE.iter()) {
            if slot.is_none() {
                *slot = builtin(descriptor.algorithm);
            }
        }
        self
    }

    /// Register (or replace) the primitive for one stage.
    pub fn stage(mut self, algorithm: Algorithm, primitive: Primitive) -> Result<Self> {
        let descriptor = &PIPELINE[algorithm as usize];
        self.slots[algorithm as usize] = Some(primitive.fit(descriptor)?);
        Ok(self)
    }

    pub fn build(self) -> Result<HashChain> {
        let mut stages = Vec::with_capacity(STAGES);

        for (slot, descriptor) in self.slots.into_iter().zip(PIPELINE.iter()) {
            let primitive = slot.ok_or(Error::MissingPrimitive(descriptor.algorithm))?;
            stages.push((descriptor.algorithm, primitive.fit(descriptor)?));
        }

        log::debug!("x17 chain ready with {} stages", stages.len());
        Ok(HashChain { stages })
    }
}
