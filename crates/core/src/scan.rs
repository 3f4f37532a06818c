//! Nonce scanner
//!
//! Walks the nonce range four at a time, hashing one [`HeaderBatch`] per
//! step and gating every lane. The scan stops after the first step that
//! produces a match, when the next step would start at or past the nonce
//! bound, or when cancellation is observed between steps.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, trace};

use crate::chain::HashChain;
use crate::gate::DifficultyGate;
use crate::params::{DIGEST_LEN, LANES};
use crate::work::{HeaderBatch, WorkItem};

/// Shared stop flag, polled once per four-nonce step
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Why a scan stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    /// At least one lane met the target
    Found,
    /// Nonce bound reached
    Exhausted,
    /// Cancellation observed
    Cancelled,
}

/// A nonce whose digest met the target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub nonce: u32,
    pub digest: [u8; DIGEST_LEN],
}

/// Result of one scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutcome {
    pub status: ScanStatus,
    /// Every passing lane of the final step, in lane order
    pub matches: Vec<Candidate>,
    /// Nonces covered, counted as `next_start - first_nonce + 1`
    pub hashes_done: u64,
}

impl ScanOutcome {
    pub fn first_match(&self) -> Option<&Candidate> {
        self.matches.first()
    }
}

/// Scans work items against a shared chain
#[derive(Debug, Clone, Copy)]
pub struct NonceScanner<'a> {
    chain: &'a HashChain,
}

impl<'a> NonceScanner<'a> {
    pub fn new(chain: &'a HashChain) -> Self {
        Self { chain }
    }

    /// Scan from `work.nonce()` towards `work.max_nonce()`.
    ///
    /// On return the work item's nonce is the first match when one was
    /// found, otherwise the nonce the next scan should resume from.
    pub fn scan(&self, work: &mut WorkItem, cancel: &CancellationToken) -> ScanOutcome {
        let gate = DifficultyGate::new(work.target());
        let bucket = gate.bucket();
        let first = u64::from(work.nonce());
        let max = u64::from(work.max_nonce());

        debug!(
            "scan from {:#010x} to {:#010x}, bucket {} mask {:#010x}",
            first, max, bucket.index, bucket.mask
        );

        let mut batch = HeaderBatch::new(work);
        let mut matches = Vec::new();
        let mut n = first;

        let status = loop {
            if n >= max {
                break ScanStatus::Exhausted;
            }

            batch.set_nonces(n as u32);
            let digests = self.chain.hash(&batch);

            for (lane, digest) in digests.iter().enumerate() {
                if gate.check(digest) {
                    let nonce = (n as u32).wrapping_add(lane as u32);
                    trace!("lane {} nonce {:#010x} meets target", lane, nonce);
                    matches.push(Candidate {
                        nonce,
                        digest: *digest,
                    });
                }
            }

            n += LANES as u64;

            if !matches.is_empty() {
                break ScanStatus::Found;
            }
            if cancel.is_cancelled() {
                break ScanStatus::Cancelled;
            }
        };

        let resume = match matches.first() {
            Some(candidate) => candidate.nonce,
            None => u32::try_from(n).unwrap_or(u32::MAX),
        };
        work.set_nonce(resume);

        let hashes_done = n - first + 1;
        debug!(
            "scan {:?} after {} hashes, {} match(es)",
            status,
            hashes_done,
            matches.len()
        );

        ScanOutcome {
            status,
            matches,
            hashes_done,
        }
    }
}
