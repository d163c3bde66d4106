//! Offline mode: render a chord into memory and report its levels.

use std::sync::Arc;

use clap::Args;
use color_eyre::eyre::{Result as EyreResult, WrapErr};
use polysub::{
    dsp::Waveform,
    params::VoiceParams,
    runtime::{self, MemorySink, RunToken},
    EngineConfig,
};

#[derive(Args)]
pub struct BounceArgs {
    /// MIDI notes to hold together.
    #[arg(long, value_delimiter = ',', default_values_t = [60u8, 64, 67])]
    notes: Vec<u8>,
    /// Note-on velocity (1-127).
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u8).range(1..=127))]
    velocity: u8,
    /// Seconds between note-on and note-off.
    #[arg(long, default_value_t = 1.0)]
    hold: f32,
    /// Seconds rendered after note-off.
    #[arg(long, default_value_t = 1.0)]
    tail: f32,
    #[arg(long, default_value_t = 48_000.0)]
    sample_rate: f32,
    /// Use square waves on both oscillators.
    #[arg(long)]
    square: bool,
    /// Filter cutoff in Hz.
    #[arg(long)]
    cutoff: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Levels {
    peak: f32,
    rms: f32,
}

fn levels(samples: &[f32]) -> Levels {
    if samples.is_empty() {
        return Levels { peak: 0.0, rms: 0.0 };
    }
    let peak = samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
    let energy: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    Levels {
        peak,
        rms: (energy / samples.len() as f64).sqrt() as f32,
    }
}

fn to_dbfs(value: f32) -> f32 {
    if value <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * value.log10()
    }
}

fn blocks_for(seconds: f32, config: &EngineConfig) -> u64 {
    let frames = (seconds.max(0.0) * config.sample_rate).ceil() as u64;
    frames.div_ceil(config.block_size as u64)
}

pub fn run(config: EngineConfig, args: &BounceArgs) -> EyreResult<()> {
    let config = config.with_sample_rate(args.sample_rate).with_channels(1);

    let params = Arc::new(VoiceParams::new());
    if args.square {
        params.set_osc_waveform(0, Waveform::Square);
        params.set_osc_waveform(1, Waveform::Square);
    }
    if let Some(hz) = args.cutoff {
        params.set_cutoff(hz);
    }

    let (mut controller, mut render_loop) =
        runtime::build(&config, params, RunToken::new()).wrap_err("invalid engine config")?;
    let mut sink = MemorySink::new(1);

    for &note in &args.notes {
        controller.note_on(note, args.velocity)?;
    }
    let held = render_loop.run_blocks(&mut sink, blocks_for(args.hold, &config))?;
    let sustain_frames = sink.frames();

    for &note in &args.notes {
        controller.note_off(note)?;
    }
    let tail = render_loop.run_blocks(&mut sink, blocks_for(args.tail, &config))?;

    let samples = sink.samples();
    let (held_part, tail_part) = samples.split_at(sustain_frames);
    let whole = levels(samples);
    let held_levels = levels(held_part);
    let tail_levels = levels(tail_part);

    println!("=== bounce ===");
    println!("Notes: {:?} @ velocity {}", args.notes, args.velocity);
    println!("Sample rate: {} Hz", config.sample_rate);
    println!("Voices: {} ({} still sounding)", config.voices, render_loop.synth().sounding_voices());
    println!("Frames: {} ({} blocks)", held.frames + tail.frames, held.blocks + tail.blocks);
    println!();
    println!("          peak dBFS   rms dBFS");
    for (label, l) in [("held", held_levels), ("tail", tail_levels), ("total", whole)] {
        println!("{label:>6}  {:>10.1} {:>10.1}", to_dbfs(l.peak), to_dbfs(l.rms));
    }

    Ok(())
}
