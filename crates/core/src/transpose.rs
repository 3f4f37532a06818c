//! Lane transpose between the interleaved (4x64) and per-lane layouts
//!
//! The interleaved layout stores 64-bit word `k` of lanes 0..4 back to back:
//!
//! ```text
//! l0[k] l1[k] l2[k] l3[k] l0[k+1] l1[k+1] ...
//! ```
//!
//! The per-lane layout keeps each lane's bytes contiguous. Both directions
//! are pure byte permutations and never allocate.

use crate::params::{LANES, WORD_LEN};

/// Bytes occupied by one 64-bit word across all lanes
const ROW_LEN: usize = LANES * WORD_LEN;

#[cfg(target_arch = "x86_64")]
cpufeatures::new!(avx2_cpuid, "avx2");

/// Interleave `bit_len` bits of each lane into `dst`.
///
/// `bit_len` must be a multiple of 64. Each source lane must hold at least
/// `bit_len / 8` bytes and `dst` at least four times that.
pub fn interleave(dst: &mut [u8], src: [&[u8]; LANES], bit_len: usize) {
    let words = word_count(bit_len);
    let done = interleave_accel(dst, &src, words);
    interleave_soft(dst, &src, done, words);
}

/// Split `bit_len` bits per lane out of the interleaved buffer `src`.
///
/// Exact inverse of [`interleave`] for the same `bit_len`.
pub fn deinterleave(mut dst: [&mut [u8]; LANES], src: &[u8], bit_len: usize) {
    let words = word_count(bit_len);
    let done = deinterleave_accel(&mut dst, src, words);
    deinterleave_soft(&mut dst, src, done, words);
}

#[inline(always)]
fn word_count(bit_len: usize) -> usize {
    debug_assert_eq!(bit_len % 64, 0, "lane transpose works on whole 64-bit words");
    bit_len / 64
}

/// Portable interleave of words `from..words`
#[inline(always)]
fn interleave_soft(dst: &mut [u8], src: &[&[u8]; LANES], from: usize, words: usize) {
    for k in from..words {
        let word = k * WORD_LEN..(k + 1) * WORD_LEN;
        for (lane, s) in src.iter().enumerate() {
            let at = k * ROW_LEN + lane * WORD_LEN;
            dst[at..at + WORD_LEN].copy_from_slice(&s[word.clone()]);
        }
    }
}

/// Portable deinterleave of words `from..words`
#[inline(always)]
fn deinterleave_soft(dst: &mut [&mut [u8]; LANES], src: &[u8], from: usize, words: usize) {
    for k in from..words {
        let word = k * WORD_LEN..(k + 1) * WORD_LEN;
        for (lane, d) in dst.iter_mut().enumerate() {
            let at = k * ROW_LEN + lane * WORD_LEN;
            d[word.clone()].copy_from_slice(&src[at..at + WORD_LEN]);
        }
    }
}

/// Interleave whole 4-word blocks with AVX2, returning the words handled
#[cfg(target_arch = "x86_64")]
#[inline(always)]
fn interleave_accel(dst: &mut [u8], src: &[&[u8]; LANES], words: usize) -> usize {
    if !avx2_cpuid::get() {
        return 0;
    }

    let blocks = words / LANES;
    // SAFETY: AVX2 availability checked above
    unsafe { x86::interleave_blocks(dst, src, blocks) };
    blocks * LANES
}

/// Deinterleave whole 4-word blocks with AVX2, returning the words handled
#[cfg(target_arch = "x86_64")]
#[inline(always)]
fn deinterleave_accel(dst: &mut [&mut [u8]; LANES], src: &[u8], words: usize) -> usize {
    if !avx2_cpuid::get() {
        return 0;
    }

    let blocks = words / LANES;
    // SAFETY: AVX2 availability checked above
    unsafe { x86::deinterleave_blocks(dst, src, blocks) };
    blocks * LANES
}

#[cfg(not(target_arch = "x86_64"))]
#[inline(always)]
fn interleave_accel(_dst: &mut [u8], _src: &[&[u8]; LANES], _words: usize) -> usize {
    0
}

#[cfg(not(target_arch = "x86_64"))]
#[inline(always)]
fn deinterleave_accel(_dst: &mut [&mut [u8]; LANES], _src: &[u8], _words: usize) -> usize {
    0
}

/// AVX2 4x4 transpose of 64-bit words
///
/// Four words from each of four lanes form a 4x4 matrix; transposing it
/// turns lane rows into word rows and back again.
#[cfg(target_arch = "x86_64")]
mod x86 {
    use super::{LANES, ROW_LEN};
    use core::arch::x86_64::{
        __m256i, _mm256_loadu_si256, _mm256_permute2x128_si256, _mm256_storeu_si256,
        _mm256_unpackhi_epi64, _mm256_unpacklo_epi64,
    };

    #[target_feature(enable = "avx2")]
    unsafe fn transpose(r: [__m256i; 4]) -> [__m256i; 4] {
        unsafe {
            // a0 b0 a2 b2 / a1 b1 a3 b3 / c0 d0 c2 d2 / c1 d1 c3 d3
            let t0 = _mm256_unpacklo_epi64(r[0], r[1]);
            let t1 = _mm256_unpackhi_epi64(r[0], r[1]);
            let t2 = _mm256_unpacklo_epi64(r[2], r[3]);
            let t3 = _mm256_unpackhi_epi64(r[2], r[3]);

            [
                _mm256_permute2x128_si256::<0x20>(t0, t2),
                _mm256_permute2x128_si256::<0x20>(t1, t3),
                _mm256_permute2x128_si256::<0x31>(t0, t2),
                _mm256_permute2x128_si256::<0x31>(t1, t3),
            ]
        }
    }

    #[target_feature(enable = "avx2")]
    pub(super) unsafe fn interleave_blocks(dst: &mut [u8], src: &[&[u8]; LANES], blocks: usize) {
        for b in 0..blocks {
            let at = b * ROW_LEN;
            let dst = &mut dst[at * LANES..(at + ROW_LEN) * LANES];

            unsafe {
                let rows = src.map(|s| {
                    let s = &s[at..at + ROW_LEN];
                    _mm256_loadu_si256(s.as_ptr() as *const __m256i)
                });

                for (k, row) in transpose(rows).into_iter().enumerate() {
                    let out = &mut dst[k * ROW_LEN..(k + 1) * ROW_LEN];
                    _mm256_storeu_si256(out.as_mut_ptr() as *mut __m256i, row);
                }
            }
        }
    }

    #[target_feature(enable = "avx2")]
    pub(super) unsafe fn deinterleave_blocks(
        dst: &mut [&mut [u8]; LANES],
        src: &[u8],
        blocks: usize,
    ) {
        for b in 0..blocks {
            let at = b * ROW_LEN;
            let src = &src[at * LANES..(at + ROW_LEN) * LANES];

            unsafe {
                let mut rows = [_mm256_loadu_si256(src.as_ptr() as *const __m256i); 4];
                for (k, row) in rows.iter_mut().enumerate().skip(1) {
                    let s = &src[k * ROW_LEN..(k + 1) * ROW_LEN];
                    *row = _mm256_loadu_si256(s.as_ptr() as *const __m256i);
                }

                for (d, row) in dst.iter_mut().zip(transpose(rows)) {
                    let out = &mut d[at..at + ROW_LEN];
                    _mm256_storeu_si256(out.as_mut_ptr() as *mut __m256i, row);
                }
            }
        }
    }
}
