use std::{
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use polysub::{
    error::SinkError,
    params::VoiceParams,
    runtime::{self, AudioSink, Engine, MemorySink, RenderLoop, RunToken},
    synth::ReleasePolicy,
    EngineConfig, EngineError,
};

const SAMPLE_RATE: f32 = 48_000.0;
/// One block per millisecond keeps sample positions easy to reason about.
const BLOCK: usize = 48;

fn rms(samples: &[f32]) -> f32 {
    (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
}

fn ms(t: f32) -> usize {
    (t * SAMPLE_RATE) as usize
}

/// Patch with a fixed open filter so output level follows the amplitude
/// envelope.
fn flat_params() -> Arc<VoiceParams> {
    let params = VoiceParams::new();
    params.set_feg_amount(0.0);
    params.set_cutoff(8_000.0);
    params.set_resonance(0.0);
    Arc::new(params)
}

fn mono_config(voices: usize) -> EngineConfig {
    EngineConfig::default()
        .with_sample_rate(SAMPLE_RATE)
        .with_channels(1)
        .with_voices(voices)
        .with_block_size(BLOCK)
}

fn envelope_level(rl: &RenderLoop, slot: usize) -> f32 {
    rl.synth().voices()[slot].envelope_level()
}

#[test]
fn single_voice_note_lifecycle() {
    let config = mono_config(1);
    let params = flat_params();
    // attack 10 ms, decay 300 ms, sustain 0.7, release 200 ms
    let (mut controller, mut rl) = runtime::build(&config, params, RunToken::new()).unwrap();
    let mut sink = MemorySink::new(1);

    controller.note_on(69, 127).unwrap();

    // Halfway through the attack ramp.
    rl.run_blocks(&mut sink, 5).unwrap();
    assert!((envelope_level(&rl, 0) - 0.5).abs() < 0.01);

    // Attack complete.
    rl.run_blocks(&mut sink, 5).unwrap();
    assert!(envelope_level(&rl, 0) > 0.98);

    // Decay has reached sustain.
    rl.run_blocks(&mut sink, 300).unwrap();
    assert!((envelope_level(&rl, 0) - 0.7).abs() < 0.01);

    // Held at sustain until one second.
    rl.run_blocks(&mut sink, 690).unwrap();
    assert!((envelope_level(&rl, 0) - 0.7).abs() < 1e-4);
    assert_eq!(sink.frames(), ms(1.0));

    let out = sink.samples();
    assert!(out.iter().all(|s| s.is_finite()));

    // Energy ramps up through the attack.
    assert!(rms(&out[..ms(0.005)]) < rms(&out[ms(0.005)..ms(0.01)]));

    // Decay settles below the peak, then holds steady.
    let early = rms(&out[ms(0.01)..ms(0.05)]);
    let held_a = rms(&out[ms(0.5)..ms(0.75)]);
    let held_b = rms(&out[ms(0.75)..ms(1.0)]);
    assert!(held_a < early);
    assert!((held_a - held_b).abs() / held_a < 0.02);
    assert!((held_a / early - 0.7).abs() < 0.1, "sustain ratio {}", held_a / early);

    // Release: after 200 ms plus one block the voice is silent and idle.
    controller.note_off(69).unwrap();
    let release_blocks = (0.2 * SAMPLE_RATE) as u64 / BLOCK as u64 + 1;
    rl.run_blocks(&mut sink, release_blocks).unwrap();
    assert_eq!(rl.synth().sounding_voices(), 0);

    rl.run_blocks(&mut sink, 10).unwrap();
    let tail = &sink.samples()[sink.samples().len() - 10 * BLOCK..];
    assert!(tail.iter().all(|s| s.abs() < 1e-6));
}

#[test]
fn two_voice_steal_and_pitch_matched_release() {
    let config = mono_config(2);
    let (mut controller, mut rl) =
        runtime::build(&config, flat_params(), RunToken::new()).unwrap();
    let mut sink = MemorySink::new(1);

    controller.note_on(60, 100).unwrap();
    controller.note_on(64, 100).unwrap();
    rl.run_blocks(&mut sink, 20).unwrap();
    controller.note_on(67, 100).unwrap();
    rl.run_blocks(&mut sink, 1).unwrap();

    // 67 replaced the oldest note, 60.
    let alloc = rl.synth().allocator();
    assert_eq!(alloc.slot_note(0), Some(67));
    assert_eq!(alloc.slot_note(1), Some(64));
    assert_eq!(alloc.active_count(), 2);

    // 60 is no longer held, so its note-off touches nothing.
    controller.note_off(60).unwrap();
    rl.run_blocks(&mut sink, 400).unwrap();
    assert_eq!(rl.synth().allocator().active_count(), 2);
    assert!((envelope_level(&rl, 1) - 0.7).abs() < 0.01);

    // Releasing 64 leaves 67 alone.
    controller.note_off(64).unwrap();
    rl.run_blocks(&mut sink, 300).unwrap();
    assert!(!rl.synth().voices()[1].is_sounding());
    assert!(rl.synth().voices()[0].is_sounding());
    assert_eq!(rl.synth().allocator().slot_note(0), Some(67));
}

#[test]
fn release_all_policy_silences_every_voice() {
    let config = mono_config(4).with_release_policy(ReleasePolicy::ReleaseAll);
    let (mut controller, mut rl) =
        runtime::build(&config, flat_params(), RunToken::new()).unwrap();
    let mut sink = MemorySink::new(1);

    for note in [48, 52, 55] {
        controller.note_on(note, 100).unwrap();
    }
    rl.run_blocks(&mut sink, 50).unwrap();
    assert_eq!(rl.synth().sounding_voices(), 3);

    controller.note_off(52).unwrap();
    rl.run_blocks(&mut sink, 300).unwrap();
    assert_eq!(rl.synth().sounding_voices(), 0);
}

#[test]
fn mix_stays_bounded_with_full_pool() {
    let config = mono_config(8);
    let params = Arc::new(VoiceParams::new());
    params.set_resonance(0.98);
    let (mut controller, mut rl) = runtime::build(&config, params, RunToken::new()).unwrap();
    let mut sink = MemorySink::new(1);

    for note in (36..96).step_by(7) {
        controller.note_on(note, 127).unwrap();
    }
    rl.run_blocks(&mut sink, 500).unwrap();

    let out = sink.samples();
    assert!(out.iter().all(|s| s.is_finite() && s.abs() < 10.0));
    assert!(rms(out) > 0.0);
}

struct FailingSink {
    blocks_left: usize,
}

impl AudioSink for FailingSink {
    fn channels(&self) -> usize {
        1
    }

    fn write_block(&mut self, _block: &[f32]) -> Result<(), SinkError> {
        if self.blocks_left == 0 {
            return Err(SinkError::Device("unplugged".into()));
        }
        self.blocks_left -= 1;
        Ok(())
    }
}

#[test]
fn render_loop_exits_on_sink_fault() {
    let config = mono_config(2);
    let token = RunToken::new();
    let (_controller, mut rl) =
        runtime::build(&config, flat_params(), token.clone()).unwrap();

    let result = rl.run(&mut FailingSink { blocks_left: 3 });

    assert!(matches!(result, Err(SinkError::Device(_))));
    assert!(!token.is_running());
}

#[test]
fn engine_shutdown_reports_sink_fault() {
    let config = mono_config(2);
    let mut engine = Engine::spawn(&config, FailingSink { blocks_left: 100 }).unwrap();
    let _ = engine.controller().note_on(60, 100);

    // A control loop would stop on this.
    while engine.is_running() {
        thread::sleep(Duration::from_millis(1));
    }

    assert!(!engine.token().is_running());
    assert!(matches!(
        engine.shutdown(),
        Err(EngineError::Sink(SinkError::Device(_)))
    ));
}

/// Shares what it receives with the test thread, at roughly device pace.
struct SharedSink(Arc<Mutex<Vec<f32>>>);

impl AudioSink for SharedSink {
    fn channels(&self) -> usize {
        1
    }

    fn write_block(&mut self, block: &[f32]) -> Result<(), SinkError> {
        thread::sleep(Duration::from_micros(100));
        self.0.lock().unwrap().extend_from_slice(block);
        Ok(())
    }
}

/// Block until the sink has received at least `frames` samples.
fn wait_for_frames(captured: &Mutex<Vec<f32>>, frames: usize) {
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while captured.lock().unwrap().len() < frames {
        assert!(std::time::Instant::now() < deadline, "render thread stalled");
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn engine_parameter_edits_are_heard() {
    let config = mono_config(1);
    let captured = Arc::new(Mutex::new(Vec::new()));
    let mut engine = Engine::spawn(&config, SharedSink(Arc::clone(&captured))).unwrap();

    let params = engine.params();
    params.set_feg_amount(0.0);
    params.set_cutoff(8_000.0);
    params.set_resonance(0.0);
    engine.controller().note_on(57, 127).unwrap();

    // Let the note reach sustain, then mute both oscillators mid-note.
    wait_for_frames(&captured, ms(0.4));
    let muted_at = captured.lock().unwrap().len();
    engine.params().set_osc_volume(0, 0.0);
    engine.params().set_osc_volume(1, 0.0);

    // Skip the block in flight plus the filter's decay.
    let settled = muted_at + 10 * BLOCK;
    wait_for_frames(&captured, settled + 20 * BLOCK);
    assert!(engine.is_running());

    let stopped = engine.shutdown().unwrap();
    let out = captured.lock().unwrap();

    assert_eq!(out.len() as u64, stopped.report.frames);
    let before = rms(&out[muted_at - 20 * BLOCK..muted_at]);
    let after = rms(&out[settled..settled + 20 * BLOCK]);
    assert!(before > 0.01, "note should be audible before the edit, rms {before}");
    assert!(after < before * 0.01, "edit not heard: before {before}, after {after}");
}
