//! Throughput Benchmarks
//!
//! Measures one-shot and streaming throughput of the default engine, with
//! the `aes-gcm` crate as a baseline on the same inputs.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes128Gcm, Aes256Gcm, Nonce};
use aesforge::{Direction, EngineFactory};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::prelude::*;
use std::hint::black_box;

const KEY_128: [u8; 16] = [0x42; 16];
const KEY_256: [u8; 32] = [0x42; 32];
const NONCE: [u8; 12] = [0x24; 12];
const AAD: &[u8] = b"aesforge-bench";

fn random_input(size: usize) -> Vec<u8> {
    let mut input = vec![0u8; size];
    rand::rng().fill(&mut input[..]);
    input
}

// =============================================================================
// LATENCY (Tiny inputs, dominated by setup)
// =============================================================================

fn bench_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("1-Latency");
    let sizes = [0, 16, 64];

    for size in sizes {
        let input = random_input(size);
        group.bench_with_input(BenchmarkId::new("aesforge", size), &input, |b, data| {
            b.iter(|| aesforge::gcm_seal(&KEY_256, &NONCE, AAD, black_box(data), 16).unwrap());
        });
        let baseline = Aes256Gcm::new_from_slice(&KEY_256).unwrap();
        group.bench_with_input(BenchmarkId::new("aes-gcm", size), &input, |b, data| {
            b.iter(|| {
                baseline
                    .encrypt(Nonce::from_slice(&NONCE), Payload { msg: black_box(data), aad: AAD })
                    .unwrap()
            });
        });
    }
    group.finish();
}

// =============================================================================
// GCM SEAL / OPEN
// =============================================================================

fn bench_gcm_seal(c: &mut Criterion) {
    let mut group = c.benchmark_group("2-GCM-Seal");
    let sizes = [1024, 16 * 1024, 1024 * 1024];

    for size in sizes {
        let input = random_input(size);
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("aesforge-128", size), &input, |b, data| {
            b.iter(|| aesforge::gcm_seal(&KEY_128, &NONCE, AAD, black_box(data), 16).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("aesforge-256", size), &input, |b, data| {
            b.iter(|| aesforge::gcm_seal(&KEY_256, &NONCE, AAD, black_box(data), 16).unwrap());
        });

        let baseline = Aes128Gcm::new_from_slice(&KEY_128).unwrap();
        group.bench_with_input(BenchmarkId::new("aes-gcm-128", size), &input, |b, data| {
            b.iter(|| {
                baseline
                    .encrypt(Nonce::from_slice(&NONCE), Payload { msg: black_box(data), aad: AAD })
                    .unwrap()
            });
        });
    }
    group.finish();
}

fn bench_gcm_open(c: &mut Criterion) {
    let mut group = c.benchmark_group("3-GCM-Open");
    let sizes = [1024, 16 * 1024, 1024 * 1024];

    for size in sizes {
        let sealed = aesforge::gcm_seal(&KEY_256, &NONCE, AAD, &random_input(size), 16).unwrap();
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("aesforge", size), &sealed, |b, data| {
            b.iter(|| aesforge::gcm_open(&KEY_256, &NONCE, AAD, black_box(data), 16).unwrap());
        });

        let baseline = Aes256Gcm::new_from_slice(&KEY_256).unwrap();
        group.bench_with_input(BenchmarkId::new("aes-gcm", size), &sealed, |b, data| {
            b.iter(|| {
                baseline
                    .decrypt(Nonce::from_slice(&NONCE), Payload { msg: black_box(data), aad: AAD })
                    .unwrap()
            });
        });
    }
    group.finish();
}

// =============================================================================
// STREAMING (Chunked updates through one session)
// =============================================================================

fn bench_streaming(c: &mut Criterion) {
    let mut group = c.benchmark_group("4-Streaming");
    let size = 1024 * 1024;
    let input = random_input(size);
    let factory = EngineFactory::new();
    let mut out = vec![0u8; size + 32];
    group.throughput(Throughput::Bytes(size as u64));

    for chunk in [64, 4096, 64 * 1024] {
        group.bench_with_input(BenchmarkId::from_parameter(chunk), &chunk, |b, &chunk| {
            b.iter(|| {
                let mut gcm = factory.gcm(Direction::Encrypt, KEY_256.len()).unwrap();
                gcm.init(Direction::Encrypt, &KEY_256, &NONCE, AAD, 16).unwrap();
                let mut written = 0;
                for piece in input.chunks(chunk) {
                    written += gcm.process_bytes(black_box(piece), &mut out[written..]).unwrap();
                }
                written + gcm.do_final(&mut out[written..]).unwrap()
            });
        });
    }
    group.finish();
}

// =============================================================================
// CBC
// =============================================================================

fn bench_cbc(c: &mut Criterion) {
    let mut group = c.benchmark_group("5-CBC");
    let iv = [0u8; 16];
    let sizes = [1024, 64 * 1024, 1024 * 1024];

    for size in sizes {
        let input = random_input(size);
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("encrypt", size), &input, |b, data| {
            b.iter(|| aesforge::cbc_encrypt(&KEY_128, &iv, black_box(data)).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("decrypt", size), &input, |b, data| {
            b.iter(|| aesforge::cbc_decrypt(&KEY_128, &iv, black_box(data)).unwrap());
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_latency,
    bench_gcm_seal,
    bench_gcm_open,
    bench_streaming,
    bench_cbc
);
criterion_main!(benches);
