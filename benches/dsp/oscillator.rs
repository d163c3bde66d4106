//! Benchmarks for band-limited oscillators.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use polysub::dsp::{Oscillator, Waveform};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Sawtooth - one PolyBLEP correction per wrap
        let mut osc = Oscillator::new(SAMPLE_RATE).with_waveform(Waveform::Saw);
        osc.set_base_frequency(440.0);
        group.bench_with_input(BenchmarkId::new("saw", size), &size, |b, _| {
            b.iter(|| {
                osc.render(black_box(&mut buffer));
            })
        });

        // Square - two corrections per period
        let mut osc = Oscillator::new(SAMPLE_RATE).with_waveform(Waveform::Square);
        osc.set_base_frequency(440.0);
        group.bench_with_input(BenchmarkId::new("square", size), &size, |b, _| {
            b.iter(|| {
                osc.render(black_box(&mut buffer));
            })
        });

        // High pitch puts more samples inside the correction window
        let mut osc = Oscillator::new(SAMPLE_RATE).with_waveform(Waveform::Saw);
        osc.set_base_frequency(4_000.0);
        osc.set_detune(1.5);
        group.bench_with_input(BenchmarkId::new("saw_high_detuned", size), &size, |b, _| {
            b.iter(|| {
                osc.render(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
