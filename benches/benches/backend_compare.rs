//! Backend Comparison Benchmark
//!
//! Compares the factory-selected engine against sessions pinned to the
//! portable, AES-NI and AVX-512 code paths, plus the raw GHASH kernels.

#![allow(missing_docs)]
#![allow(unsafe_code)]
#![allow(clippy::unwrap_used)]
use aesforge::kernels::{self, HashKey};
use aesforge::{CapabilityRecord, CodePath, CpuVariant, Direction, EngineFactory, Mode};
use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;

fn pinned() -> Vec<(&'static str, EngineFactory)> {
    let probed = *CapabilityRecord::probe();
    let portable = EngineFactory::with_capabilities(CapabilityRecord::portable());
    let mut out = vec![("Portable (No SIMD)", portable)];
    let narrow = EngineFactory::with_capabilities(probed.restricted_to(CpuVariant::Narrow));
    if narrow.select_path(Mode::Gcm, Direction::Encrypt) == CodePath::Narrow {
        out.push(("AES-NI Native", narrow));
    }
    let wide = EngineFactory::with_capabilities(probed);
    if wide.select_path(Mode::Gcm, Direction::Encrypt) == CodePath::Wide {
        out.push(("AVX-512 Native", wide));
    }
    out
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_gcm_backends(c: &mut Criterion) {
    let mut group = c.benchmark_group("GCM Backends");
    let key = [0x42u8; 32];
    let nonce = [0x24u8; 12];

    // Scenarios:
    // - Small (7B): Test dispatch and setup overhead
    // - Medium (1KB): L1 cache hot-path
    // - Large (256KB): Bulk throughput (VAES saturation)
    let sizes = [7, 1024, 256 * 1024];

    for size in sizes {
        let input = vec![0u8; size];
        group.throughput(Throughput::Bytes(size as u64));

        // 1. Hybrid (Production Path)
        group.bench_function(format!("Hybrid (Default) - {size} bytes"), |b| {
            b.iter(|| aesforge::gcm_seal(&key, &nonce, b"", black_box(&input), 16).unwrap());
        });

        // 2. Pinned paths (bypass the probe's choice)
        for (name, factory) in pinned() {
            let mut out = vec![0u8; size + 16];
            group.bench_function(format!("{name} - {size} bytes"), |b| {
                b.iter(|| {
                    let mut gcm = factory.gcm(Direction::Encrypt, key.len()).unwrap();
                    gcm.init(Direction::Encrypt, &key, &nonce, b"", 16).unwrap();
                    let n = gcm.process_bytes(black_box(&input), &mut out).unwrap();
                    gcm.do_final(&mut out[n..]).unwrap()
                });
            });
        }
    }
    group.finish();
}

fn bench_cbc_decrypt_backends(c: &mut Criterion) {
    let mut group = c.benchmark_group("CBC Decrypt Backends");
    let key = [0x42u8; 16];
    let iv = [0u8; 16];
    let size = 64 * 1024;
    let input = vec![0u8; size];
    group.throughput(Throughput::Bytes(size as u64));

    for (name, factory) in pinned() {
        let mut cbc = factory.cbc(Direction::Decrypt, key.len()).unwrap();
        cbc.init(&key, &iv).unwrap();
        let mut out = vec![0u8; size];
        group.bench_function(name, |b| {
            b.iter(|| cbc.process_blocks(black_box(&input), size / 16, &mut out).unwrap());
        });
    }
    group.finish();
}

fn bench_ghash_kernels(c: &mut Criterion) {
    let mut group = c.benchmark_group("GHASH Kernels");
    let hk = HashKey::new([0x5au8; 16]);
    let data = vec![0x11u8; 64 * 1024];
    group.throughput(Throughput::Bytes(data.len() as u64));

    group.bench_function("Portable", |b| {
        b.iter(|| {
            let mut acc = [0u8; 16];
            kernels::portable::ghash(&hk, &mut acc, black_box(&data));
            acc
        });
    });

    #[cfg(target_arch = "x86_64")]
    if is_x86_feature_detected!("pclmulqdq") && is_x86_feature_detected!("ssse3") {
        group.bench_function("PCLMULQDQ", |b| {
            b.iter(|| {
                let mut acc = [0u8; 16];
                unsafe { kernels::aesni::ghash(&hk, &mut acc, black_box(&data)) };
                acc
            });
        });
    }

    #[cfg(target_arch = "x86_64")]
    if CapabilityRecord::probe().wide_hash() {
        group.bench_function("VPCLMULQDQ x4", |b| {
            b.iter(|| {
                let mut acc = [0u8; 16];
                unsafe { kernels::avx512::ghash(&hk, &mut acc, black_box(&data)) };
                acc
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_gcm_backends, bench_cbc_decrypt_backends, bench_ghash_kernels);
criterion_main!(benches);
