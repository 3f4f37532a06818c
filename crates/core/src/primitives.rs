//! Hash primitives and the X17 stage table
//!
//! The chain treats every primitive as an opaque `input -> digest` function.
//! A stage is either **batched** (one call hashes all four interleaved lanes)
//! or **per lane** (one call per lane, each starting from a copy of a pristine
//! state). Seven stages have RustCrypto backends built in; the rest are
//! registered by the caller through [`ChainBuilder`](crate::ChainBuilder).

use core::fmt;

use digest::Digest;

use crate::error::{Error, Result};
use crate::params::{DIGEST_LEN, LANES, MAX_LANE_LEN, STAGES, STATE_LEN};
use crate::transpose::{deinterleave, interleave};

/// The seventeen primitives of X17, in chain order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Blake512,
    Bmw512,
    Groestl512,
    Skein512,
    Jh512,
    Keccak512,
    Luffa512,
    CubeHash512,
    Shavite512,
    Simd512,
    Echo512,
    Hamsi512,
    Fugue512,
    Shabal512,
    Whirlpool,
    Sha512,
    Haval256_5,
}

impl Algorithm {
    /// Short lowercase name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Blake512 => "blake512",
            Self::Bmw512 => "bmw512",
            Self::Groestl512 => "groestl512",
            Self::Skein512 => "skein512",
            Self::Jh512 => "jh512",
            Self::Keccak512 => "keccak512",
            Self::Luffa512 => "luffa512",
            Self::CubeHash512 => "cubehash512",
            Self::Shavite512 => "shavite512",
            Self::Simd512 => "simd512",
            Self::Echo512 => "echo512",
            Self::Hamsi512 => "hamsi512",
            Self::Fugue512 => "fugue512",
            Self::Shabal512 => "shabal512",
            Self::Whirlpool => "whirlpool",
            Self::Sha512 => "sha512",
            Self::Haval256_5 => "haval256_5",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a stage processes the four lanes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// All lanes in one call over interleaved data
    Batched,
    /// One call per lane over contiguous data
    PerLane,
}

/// Position, layout and digest size of one chain stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageDescriptor {
    pub algorithm: Algorithm,
    pub layout: Layout,
    pub output_len: usize,
}

const fn stage(algorithm: Algorithm, layout: Layout, output_len: usize) -> StageDescriptor {
    StageDescriptor {
        algorithm,
        layout,
        output_len,
    }
}

/// The X17 chain. Each stage hashes the full output of the previous one.
pub const PIPELINE: [StageDescriptor; STAGES] = [
    stage(Algorithm::Blake512, Layout::Batched, STATE_LEN),
    stage(Algorithm::Bmw512, Layout::PerLane, STATE_LEN),
    stage(Algorithm::Groestl512, Layout::PerLane, STATE_LEN),
    stage(Algorithm::Skein512, Layout::Batched, STATE_LEN),
    stage(Algorithm::Jh512, Layout::Batched, STATE_LEN),
    stage(Algorithm::Keccak512, Layout::Batched, STATE_LEN),
    stage(Algorithm::Luffa512, Layout::PerLane, STATE_LEN),
    stage(Algorithm::CubeHash512, Layout::PerLane, STATE_LEN),
    stage(Algorithm::Shavite512, Layout::PerLane, STATE_LEN),
    stage(Algorithm::Simd512, Layout::PerLane, STATE_LEN),
    stage(Algorithm::Echo512, Layout::PerLane, STATE_LEN),
    stage(Algorithm::Hamsi512, Layout::PerLane, STATE_LEN),
    stage(Algorithm::Fugue512, Layout::PerLane, STATE_LEN),
    stage(Algorithm::Shabal512, Layout::PerLane, STATE_LEN),
    stage(Algorithm::Whirlpool, Layout::PerLane, STATE_LEN),
    stage(Algorithm::Sha512, Layout::PerLane, STATE_LEN),
    stage(Algorithm::Haval256_5, Layout::PerLane, DIGEST_LEN),
];

/// Working state of a single-lane primitive.
///
/// Reset is a plain `clone()` of a pristine value, so expensive setup runs
/// once per session instead of once per lane.
pub trait HashState: Clone + Send + Sync {
    /// Digest size in bytes
    fn output_len(&self) -> usize;

    /// Absorb input
    fn update(&mut self, data: &[u8]);

    /// Write the digest into `out` (exactly `output_len` bytes)
    fn finalize_into(self, out: &mut [u8]);
}

/// [`HashState`] over any RustCrypto [`Digest`]
#[derive(Clone, Default)]
pub struct DigestState<D>(D);

impl<D: Digest + Clone + Send + Sync> DigestState<D> {
    /// Wrap a digest. It may already have absorbed a prefix; that state
    /// becomes the starting point for every lane.
    pub fn new(digest: D) -> Self {
        Self(digest)
    }
}

impl<D: Digest + Clone + Send + Sync> HashState for DigestState<D> {
    #[inline(always)]
    fn output_len(&self) -> usize {
        <D as Digest>::output_size()
    }

    #[inline(always)]
    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.0, data);
    }

    #[inline(always)]
    fn finalize_into(self, out: &mut [u8]) {
        out.copy_from_slice(&self.0.finalize());
    }
}

/// A primitive that hashes one lane per call
pub trait LanePrimitive: Send + Sync {
    /// Digest size in bytes
    fn output_len(&self) -> usize;

    /// Hash `input` into `output` from a freshly reset state
    fn digest_lane(&self, input: &[u8], output: &mut [u8]);
}

impl LanePrimitive for Box<dyn LanePrimitive> {
    fn output_len(&self) -> usize {
        (**self).output_len()
    }

    fn digest_lane(&self, input: &[u8], output: &mut [u8]) {
        (**self).digest_lane(input, output)
    }
}

/// Per-lane primitive that copies its pristine state before every lane
#[derive(Clone)]
pub struct Pristine<S> {
    template: S,
}

impl<S: HashState> Pristine<S> {
    pub fn new(template: S) -> Self {
        Self { template }
    }
}

impl<S: HashState> LanePrimitive for Pristine<S> {
    fn output_len(&self) -> usize {
        self.template.output_len()
    }

    #[inline]
    fn digest_lane(&self, input: &[u8], output: &mut [u8]) {
        let mut state = self.template.clone();
        state.update(input);
        state.finalize_into(output);
    }
}

/// A primitive that hashes all four lanes per call.
///
/// Input and output are in the interleaved layout of
/// [`transpose`](crate::transpose).
pub trait BatchedPrimitive: Send + Sync {
    /// Digest size per lane in bytes
    fn output_len(&self) -> usize;

    /// Hash `input_len` bytes per lane from `input` (`LANES * input_len`
    /// bytes) into `output` (`LANES * output_len` bytes).
    fn digest_batch(&self, input: &[u8], input_len: usize, output: &mut [u8]);
}

/// Portable batched form of a per-lane primitive
pub struct Lanewise<P> {
    inner: P,
}

impl<P: LanePrimitive> Lanewise<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

impl<P: LanePrimitive> BatchedPrimitive for Lanewise<P> {
    fn output_len(&self) -> usize {
        self.inner.output_len()
    }

    fn digest_batch(&self, input: &[u8], input_len: usize, output: &mut [u8]) {
        let out_len = self.inner.output_len();
        let mut lanes = [[0u8; MAX_LANE_LEN]; LANES];
        let mut digests = [[0u8; MAX_LANE_LEN]; LANES];

        deinterleave(
            lanes.each_mut().map(|l| &mut l[..input_len]),
            input,
            input_len * 8,
        );

        for (lane, digest) in lanes.iter().zip(digests.iter_mut()) {
            self.inner.digest_lane(&lane[..input_len], &mut digest[..out_len]);
        }

        interleave(output, digests.each_ref().map(|d| &d[..out_len]), out_len * 8);
    }
}

/// A primitive tagged with the layout it natively supports
pub enum Primitive {
    Batched(Box<dyn BatchedPrimitive>),
    PerLane(Box<dyn LanePrimitive>),
}

impl Primitive {
    /// Per-lane primitive from a pristine state
    pub fn per_lane<S: HashState + 'static>(template: S) -> Self {
        Self::PerLane(Box::new(Pristine::new(template)))
    }

    /// Per-lane primitive from a default-initialized RustCrypto digest
    pub fn digest<D: Digest + Clone + Default + Send + Sync + 'static>() -> Self {
        Self::per_lane(DigestState::<D>::default())
    }

    /// Native four-lane primitive
    pub fn batched<B: BatchedPrimitive + 'static>(primitive: B) -> Self {
        Self::Batched(Box::new(primitive))
    }

    pub fn layout(&self) -> Layout {
        match self {
            Self::Batched(_) => Layout::Batched,
            Self::PerLane(_) => Layout::PerLane,
        }
    }

    pub fn output_len(&self) -> usize {
        match self {
            Self::Batched(p) => p.output_len(),
            Self::PerLane(p) => p.output_len(),
        }
    }

    /// Fit this primitive to the layout `descriptor` requires.
    ///
    /// Per-lane primitives can fill batched stages through [`Lanewise`];
    /// batched primitives cannot fill per-lane stages.
    pub(crate) fn fit(self, descriptor: &StageDescriptor) -> Result<Self> {
        let actual = self.output_len();
        if actual != descriptor.output_len {
            return Err(Error::OutputLength {
                algorithm: descriptor.algorithm,
                expected: descriptor.output_len,
                actual,
            });
        }

        match (self, descriptor.layout) {
            (Self::PerLane(p), Layout::Batched) => Ok(Self::Batched(Box::new(Lanewise::new(p)))),
            (Self::Batched(_), Layout::PerLane) => Err(Error::LayoutMismatch(descriptor.algorithm)),
            (p, _) => Ok(p),
        }
    }
}

impl fmt::Debug for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Primitive")
            .field("layout", &self.layout())
            .field("output_len", &self.output_len())
            .finish()
    }
}

/// Built-in backend for `algorithm`, if RustCrypto provides one
pub fn builtin(algorithm: Algorithm) -> Option<Primitive> {
    use digest::consts::U64;

    let primitive = match algorithm {
        Algorithm::Groestl512 => Primitive::digest::<groestl::Groestl512>(),
        Algorithm::Skein512 => Primitive::digest::<skein::Skein512<U64>>(),
        Algorithm::Jh512 => Primitive::digest::<jh::Jh512>(),
        Algorithm::Keccak512 => Primitive::digest::<sha3::Keccak512>(),
        Algorithm::Shabal512 => Primitive::digest::<shabal::Shabal512>(),
        Algorithm::Whirlpool => Primitive::digest::<whirlpool::Whirlpool>(),
        Algorithm::Sha512 => Primitive::digest::<sha2::Sha512>(),
        _ => return None,
    };

    Some(primitive)
}
