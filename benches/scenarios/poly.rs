//! Benchmarks for whole polyphonic blocks.

use std::{hint::black_box, sync::Arc};

use criterion::{BenchmarkId, Criterion};
use polysub::{
    params::VoiceParams,
    synth::{PolySynth, SynthMessage},
    EngineConfig,
};
use rtrb::RingBuffer;

use crate::{BLOCK_SIZES, SAMPLE_RATE};

const POOL_SIZES: &[usize] = &[4, 8, 16];

pub fn bench_poly(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/poly");

    for &voices in POOL_SIZES {
        for &size in BLOCK_SIZES {
            let config = EngineConfig::default()
                .with_sample_rate(SAMPLE_RATE)
                .with_voices(voices)
                .with_block_size(size);
            let mut buffer = vec![0.0f32; size * config.channels];

            // Every voice held
            let (_tx, rx) = RingBuffer::<SynthMessage>::new(config.queue_capacity);
            let mut synth = PolySynth::new(&config, Arc::new(VoiceParams::new()), rx);
            for n in 0..voices {
                synth.handle_message(SynthMessage::NoteOn {
                    note: 48 + n as u8,
                    velocity: 100,
                });
            }
            let id = format!("{voices}v_held");
            group.bench_with_input(BenchmarkId::new(id, size), &size, |b, _| {
                b.iter(|| {
                    synth.render_block(black_box(&mut buffer), config.channels);
                })
            });

            // Note churn through the queue, with stealing
            let (mut tx, rx) = RingBuffer::<SynthMessage>::new(config.queue_capacity);
            let mut synth = PolySynth::new(&config, Arc::new(VoiceParams::new()), rx);
            let mut note = 36u8;
            let id = format!("{voices}v_churn");
            group.bench_with_input(BenchmarkId::new(id, size), &size, |b, _| {
                b.iter(|| {
                    let _ = tx.push(SynthMessage::NoteOff { note });
                    note = 36 + (note - 35) % 48;
                    let _ = tx.push(SynthMessage::NoteOn { note, velocity: 90 });
                    synth.render_block(black_box(&mut buffer), config.channels);
                })
            });
        }
    }

    group.finish();
}
