//! Tests for the X17 chain and nonce scanner
//!
//! Stages without a built-in backend are filled with tagged SHA-3
//! stand-ins: each one absorbs its stage index before the input, so no
//! two stages compute the same function.

use digest::Digest;

use crate::{
    Algorithm, CancellationToken, ChainBuilder, DIGEST_LEN, DigestState, Error, HEADER_LEN,
    HashChain, HeaderBatch, LANES, Layout, Lanewise, NONCE_OFFSET, NonceScanner, PIPELINE,
    Primitive, Pristine, STAGES, ScanStatus, Target, WorkItem, builtin, meets_target,
};

fn stand_in(stage: usize) -> Primitive {
    let tag = [stage as u8];
    if PIPELINE[stage].output_len == DIGEST_LEN {
        let mut d = sha3::Sha3_256::new();
        Digest::update(&mut d, tag);
        Primitive::per_lane(DigestState::new(d))
    } else {
        let mut d = sha3::Sha3_512::new();
        Digest::update(&mut d, tag);
        Primitive::per_lane(DigestState::new(d))
    }
}

/// Per-lane primitive for every stage: built-in where available
fn per_lane_stages() -> Vec<Primitive> {
    PIPELINE
        .iter()
        .enumerate()
        .map(|(i, s)| builtin(s.algorithm).unwrap_or_else(|| stand_in(i)))
        .collect()
}

pub(crate) fn stand_in_chain() -> HashChain {
    let mut builder = ChainBuilder::new().with_builtin();
    for (i, s) in PIPELINE.iter().enumerate() {
        if builtin(s.algorithm).is_none() {
            builder = builder.stage(s.algorithm, stand_in(i)).unwrap();
        }
    }
    builder.build().unwrap()
}

/// Run every stage on one lane, no batching
fn serial_reference(header: &[u8; HEADER_LEN]) -> [u8; DIGEST_LEN] {
    let mut data = header.to_vec();
    for primitive in per_lane_stages() {
        let mut out = vec![0u8; primitive.output_len()];
        match &primitive {
            Primitive::PerLane(p) => p.digest_lane(&data, &mut out),
            Primitive::Batched(_) => unreachable!(),
        }
        data = out;
    }
    data.try_into().unwrap()
}

fn sample_header() -> [u8; HEADER_LEN] {
    let mut header = [0u8; HEADER_LEN];
    for (i, b) in header.iter_mut().enumerate() {
        *b = (i as u8).wrapping_mul(31).wrapping_add(11);
    }
    header
}

fn with_nonce(header: &[u8; HEADER_LEN], nonce: u32) -> [u8; HEADER_LEN] {
    let mut h = *header;
    h[NONCE_OFFSET..].copy_from_slice(&nonce.to_be_bytes());
    h
}

fn work(start: u32, target: Target, max_nonce: u32) -> WorkItem {
    let header = with_nonce(&sample_header(), start);
    WorkItem::from_header(&header, target, max_nonce).unwrap()
}

const IMPOSSIBLE: Target = Target::from_words([0; 8]);

#[test]
fn test_chain_stage_order() {
    let chain = stand_in_chain();
    let order: Vec<Algorithm> = chain.algorithms().collect();
    let expected: Vec<Algorithm> = PIPELINE.iter().map(|s| s.algorithm).collect();
    assert_eq!(order, expected);
    assert_eq!(order.len(), STAGES);
}

#[test]
fn test_chain_matches_serial_reference() {
    let chain = stand_in_chain();
    let header = sample_header();

    let mut batch = HeaderBatch::splat(&header);
    batch.set_nonces(0x1234_5670);
    let digests = chain.hash(&batch);

    for (lane, digest) in digests.iter().enumerate() {
        let expected = serial_reference(&with_nonce(&header, 0x1234_5670 + lane as u32));
        assert_eq!(digest, &expected, "lane {}", lane);
    }

    println!("lane 0 digest: {}", hex::encode(digests[0]));
}

#[test]
fn test_lane_independence() {
    let chain = stand_in_chain();
    let header = sample_header();

    let mut batch = HeaderBatch::splat(&header);
    batch.set_nonces(40);
    let base = chain.hash(&batch);

    // the same nonce gives the same digest in any lane
    for lane in 0..LANES {
        let mut moved = HeaderBatch::splat(&header);
        moved.set_nonces(1000);
        moved.set_lane_nonce(lane, 42);
        assert_eq!(chain.hash(&moved)[lane], base[2], "nonce 42 in lane {}", lane);
    }

    // changing one lane leaves the others alone
    let mut changed = batch.clone();
    changed.set_lane_nonce(1, 7);
    let after = chain.hash(&changed);
    assert_ne!(after[1], base[1]);
    assert_eq!(after[0], base[0]);
    assert_eq!(after[2], base[2]);
    assert_eq!(after[3], base[3]);
}

#[test]
fn test_hash_is_deterministic() {
    let chain = stand_in_chain();
    let header = with_nonce(&sample_header(), 99);

    let first = chain.hash_header(&header);
    let second = chain.hash_header(&header);
    assert_eq!(first, second);

    let other = chain.hash_header(&with_nonce(&sample_header(), 100));
    assert_ne!(first, other);
}

#[test]
fn test_chain_is_order_sensitive() {
    let header = sample_header();
    let straight = stand_in_chain().hash_header(&header);

    let mut stages: Vec<(Algorithm, Primitive)> = PIPELINE
        .iter()
        .zip(per_lane_stages())
        .map(|(s, p)| {
            let p = match (p, s.layout) {
                (Primitive::PerLane(p), Layout::Batched) => Primitive::batched(Lanewise::new(p)),
                (p, _) => p,
            };
            (s.algorithm, p)
        })
        .collect();

    // swap two adjacent per-lane stages
    stages.swap(6, 7);
    let swapped = HashChain::from_stages_unchecked(stages).hash_header(&header);

    assert_ne!(straight, swapped);
}

#[test]
fn test_builder_rejects_bad_primitives() {
    let wide = || Primitive::digest::<sha2::Sha512>();

    let err = ChainBuilder::new()
        .stage(Algorithm::Haval256_5, wide())
        .unwrap_err();
    assert_eq!(
        err,
        Error::OutputLength {
            algorithm: Algorithm::Haval256_5,
            expected: 32,
            actual: 64,
        }
    );

    let batched = Primitive::batched(Lanewise::new(Pristine::new(
        DigestState::<sha2::Sha512>::default(),
    )));
    let err = ChainBuilder::new()
        .stage(Algorithm::Luffa512, batched)
        .unwrap_err();
    assert_eq!(err, Error::LayoutMismatch(Algorithm::Luffa512));
    assert_eq!(
        err.to_string(),
        "luffa512 runs per lane and cannot take a batched primitive"
    );
}

#[test]
fn test_builder_reports_missing_stage() {
    let mut builder = ChainBuilder::new().with_builtin();
    for (i, s) in PIPELINE.iter().enumerate() {
        if builtin(s.algorithm).is_none() && s.algorithm != Algorithm::Echo512 {
            builder = builder.stage(s.algorithm, stand_in(i)).unwrap();
        }
    }

    let err = builder.build().unwrap_err();
    assert_eq!(err, Error::MissingPrimitive(Algorithm::Echo512));
    assert_eq!(err.to_string(), "No primitive registered for echo512");
}

#[test]
fn test_stage_replaces_builtin() {
    let header = sample_header();
    let default = stand_in_chain();

    let mut builder = ChainBuilder::new().with_builtin();
    for (i, s) in PIPELINE.iter().enumerate() {
        if builtin(s.algorithm).is_none() {
            builder = builder.stage(s.algorithm, stand_in(i)).unwrap();
        }
    }
    let replaced = builder
        .stage(Algorithm::Sha512, stand_in(15))
        .unwrap()
        .build()
        .unwrap();

    assert_ne!(default.hash_header(&header), replaced.hash_header(&header));
}

#[test]
fn test_scan_exhausted_immediately() {
    let chain = stand_in_chain();
    let mut work = work(500, Target::MAX, 500);

    let outcome = NonceScanner::new(&chain).scan(&mut work, &CancellationToken::new());

    assert_eq!(outcome.status, ScanStatus::Exhausted);
    assert!(outcome.matches.is_empty());
    assert_eq!(outcome.hashes_done, 1);
    assert_eq!(work.nonce(), 500);
}

#[test]
fn test_scan_cancelled_after_one_step() {
    let chain = stand_in_chain();
    let mut work = work(0, IMPOSSIBLE, u32::MAX);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = NonceScanner::new(&chain).scan(&mut work, &cancel);

    assert_eq!(outcome.status, ScanStatus::Cancelled);
    assert!(outcome.matches.is_empty());
    assert_eq!(outcome.hashes_done, 5);
    assert_eq!(work.nonce(), 4);
}

#[test]
fn test_scan_records_every_matching_lane() {
    let chain = stand_in_chain();
    let mut work = work(1000, Target::MAX, u32::MAX);

    let outcome = NonceScanner::new(&chain).scan(&mut work, &CancellationToken::new());

    assert_eq!(outcome.status, ScanStatus::Found);
    let nonces: Vec<u32> = outcome.matches.iter().map(|c| c.nonce).collect();
    assert_eq!(nonces, vec![1000, 1001, 1002, 1003]);
    assert_eq!(outcome.hashes_done, 5);
    assert_eq!(work.nonce(), 1000);

    for candidate in &outcome.matches {
        let header = with_nonce(&sample_header(), candidate.nonce);
        assert_eq!(chain.hash_header(&header), candidate.digest);
    }
}

#[test]
fn test_scan_exhausts_range() {
    let chain = stand_in_chain();
    let mut work = work(0, IMPOSSIBLE, 16);

    let outcome = NonceScanner::new(&chain).scan(&mut work, &CancellationToken::new());

    assert_eq!(outcome.status, ScanStatus::Exhausted);
    assert!(outcome.matches.is_empty());
    assert_eq!(outcome.hashes_done, 17);
    assert_eq!(work.nonce(), 16);
}

#[test]
fn test_scan_resumes_where_it_stopped() {
    let chain = stand_in_chain();
    let scanner = NonceScanner::new(&chain);
    let mut work = work(0, IMPOSSIBLE, 8);

    let first = scanner.scan(&mut work, &CancellationToken::new());
    assert_eq!(first.status, ScanStatus::Exhausted);
    assert_eq!(work.nonce(), 8);

    // a second pass over the exhausted range does no work
    let second = scanner.scan(&mut work, &CancellationToken::new());
    assert_eq!(second.status, ScanStatus::Exhausted);
    assert_eq!(second.hashes_done, 1);
}

#[test]
fn test_scan_finds_a_selective_target() {
    let chain = stand_in_chain();

    // the target equals the digest of nonce 6, so the step 4..8 must hit
    let header = with_nonce(&sample_header(), 6);
    let digest = chain.hash_header(&header);
    let mut words = [0u32; 8];
    for (w, chunk) in words.iter_mut().zip(digest.chunks_exact(4)) {
        *w = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    let target = Target::from_words(words);

    let mut item = work(4, target, 1 << 20);
    let outcome = NonceScanner::new(&chain).scan(&mut item, &CancellationToken::new());

    assert_eq!(outcome.status, ScanStatus::Found);
    assert!(outcome.matches.iter().any(|c| c.nonce == 6));
    for candidate in &outcome.matches {
        assert!(meets_target(&candidate.digest, &target));
    }
    assert_eq!(item.nonce(), outcome.matches[0].nonce);
    assert_eq!(outcome.hashes_done, 5);
}
