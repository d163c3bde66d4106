//! Benchmarks for the linear ADSR.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use polysub::dsp::EnvelopeGenerator;

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Held note: settles into sustain after the first iterations
        let mut env = EnvelopeGenerator::adsr(SAMPLE_RATE, 0.01, 0.1, 0.7, 0.3);
        env.key_on();
        group.bench_with_input(BenchmarkId::new("sustain", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer));
            })
        });

        // Retrigger every block keeps the envelope in its ramps
        let mut env = EnvelopeGenerator::adsr(SAMPLE_RATE, 0.005, 0.05, 0.5, 0.05);
        group.bench_with_input(BenchmarkId::new("retrigger", size), &size, |b, _| {
            b.iter(|| {
                env.key_on();
                env.render(black_box(&mut buffer));
                env.key_off();
            })
        });
    }

    group.finish();
}
