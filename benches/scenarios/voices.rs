//! Benchmarks for complete voice chains.

use std::{hint::black_box, sync::Arc};

use criterion::{BenchmarkId, Criterion};
use polysub::{dsp::Waveform, params::VoiceParams, synth::Voice};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // === DEFAULT PATCH ===
        // two saws → filter with envelope sweep → AEG
        let mut voice = Voice::new(SAMPLE_RATE, Arc::new(VoiceParams::new()));
        voice.set_frequency(110.0);
        voice.note_on();
        group.bench_with_input(BenchmarkId::new("default", size), &size, |b, _| {
            b.iter(|| {
                voice.render(black_box(&mut buffer));
            })
        });

        // === DETUNED CROSS-MOD ===
        // square + detuned saw with ring modulation and high resonance
        let params = VoiceParams::new();
        params.set_osc_waveform(0, Waveform::Square);
        params.set_osc_detune(1, 1.007);
        params.set_xmod_amount(0.6);
        params.set_resonance(0.9);
        let mut voice = Voice::new(SAMPLE_RATE, Arc::new(params));
        voice.set_frequency(220.0);
        voice.note_on();
        group.bench_with_input(BenchmarkId::new("xmod_detuned", size), &size, |b, _| {
            b.iter(|| {
                voice.render(black_box(&mut buffer));
            })
        });

        // === IDLE ===
        // cost of a voice nobody is playing
        let mut voice = Voice::new(SAMPLE_RATE, Arc::new(VoiceParams::new()));
        group.bench_with_input(BenchmarkId::new("idle", size), &size, |b, _| {
            b.iter(|| {
                voice.render(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
