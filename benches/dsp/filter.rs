//! Benchmarks for the state-variable low-pass filter.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use polysub::dsp::{LowPassFilter, Oscillator};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");

    for &size in BLOCK_SIZES {
        let mut input = vec![0.0f32; size];
        let mut osc = Oscillator::new(SAMPLE_RATE);
        osc.set_base_frequency(110.0);
        osc.render(&mut input);
        let mut buffer = input.clone();

        // Static cutoff: coefficients computed once
        let mut filter = LowPassFilter::new(SAMPLE_RATE, 1_000.0).with_resonance(0.5);
        group.bench_with_input(BenchmarkId::new("static", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                filter.render(black_box(&mut buffer));
            })
        });

        // Per-sample cutoff changes pay for tan() every sample
        let mut filter = LowPassFilter::new(SAMPLE_RATE, 1_000.0).with_resonance(0.5);
        group.bench_with_input(BenchmarkId::new("swept", size), &size, |b, _| {
            b.iter(|| {
                for (n, &x) in input.iter().enumerate() {
                    filter.set_cutoff(500.0 + n as f32 * 10.0);
                    buffer[n] = filter.process(black_box(x));
                }
            })
        });
    }

    group.finish();
}
