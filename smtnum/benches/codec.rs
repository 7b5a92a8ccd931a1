use criterion::{Criterion, black_box, criterion_group, criterion_main};

use num_bigint::{BigInt, BigUint};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use smtnum::{decode_integer, decode_rational, encode_integer, encode_rational};

fn sample_values(count: usize, max_len: usize) -> Vec<BigInt> {
    // Seeded for determinism across runs.
    let mut rng = ChaCha20Rng::seed_from_u64(0x42);
    (0..count)
        .map(|_| {
            let len = rng.random_range(1..=max_len);
            let bytes: Vec<u8> = (0..len).map(|_| rng.random()).collect();
            let n = BigInt::from(BigUint::from_bytes_be(&bytes));
            if rng.random_bool(0.5) { -n } else { n }
        })
        .collect()
}

fn bench_integer(c: &mut Criterion) {
    let small = sample_values(256, 8);
    let large = sample_values(256, 512);

    c.bench_function("encode_small", |b| {
        b.iter(|| {
            for n in &small {
                black_box(encode_integer(n).unwrap());
            }
        });
    });

    c.bench_function("encode_large", |b| {
        b.iter(|| {
            for n in &large {
                black_box(encode_integer(n).unwrap());
            }
        });
    });

    let encoded: Vec<_> = large.iter().map(|n| encode_integer(n).unwrap()).collect();
    c.bench_function("decode_large", |b| {
        b.iter(|| {
            for bytes in &encoded {
                black_box(decode_integer(bytes).unwrap());
            }
        });
    });
}

fn bench_rational(c: &mut Criterion) {
    let nums = sample_values(128, 64);
    let dens = sample_values(128, 64);
    let pairs: Vec<_> = nums
        .iter()
        .zip(&dens)
        .filter(|(_, d)| d.bits() > 0)
        .map(|(n, d)| {
            let q = num_rational::BigRational::new(n.clone(), d.clone());
            encode_rational(&q).unwrap()
        })
        .collect();

    c.bench_function("decode_rational", |b| {
        b.iter(|| {
            for pair in &pairs {
                black_box(decode_rational(&pair.numerator, &pair.denominator).unwrap());
            }
        });
    });
}

criterion_group!(benches, bench_integer, bench_rational);
criterion_main!(benches);
