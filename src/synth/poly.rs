use std::sync::Arc;

use rtrb::Consumer;

use crate::{
    config::EngineConfig,
    params::VoiceParams,
    synth::{
        allocator::VoiceAllocator,
        message::{MessageReceiver, SynthMessage},
        voice::Voice,
    },
};

/// The voice arena, its allocator and the receiving end of the note queue.
///
/// Everything here is built once in `new` and lives on the render thread.
/// Rendering never allocates.
pub struct PolySynth<R = Consumer<SynthMessage>> {
    voices: Vec<Voice>,
    allocator: VoiceAllocator,
    rx: R,
    gain: f32,
    frames_rendered: u64,
}

impl<R: MessageReceiver> PolySynth<R> {
    pub fn new(config: &EngineConfig, params: Arc<VoiceParams>, rx: R) -> Self {
        let voice_count = config.voices.max(1);
        let voices = (0..voice_count)
            .map(|_| Voice::new(config.sample_rate, Arc::clone(&params)))
            .collect();

        let allocator = VoiceAllocator::new(voice_count)
            .with_steal_policy(config.steal_policy)
            .with_release_policy(config.release_policy);

        Self {
            voices,
            allocator,
            rx,
            gain: 1.0 / voice_count as f32,
            frames_rendered: 0,
        }
    }

    /// Apply one note event. A note-on with velocity 0 is a note-off, as in
    /// MIDI.
    pub fn handle_message(&mut self, msg: SynthMessage) {
        match msg {
            SynthMessage::NoteOn { note, velocity: 0 } => {
                self.allocator.note_off(&mut self.voices, note);
            }
            SynthMessage::NoteOn { note, velocity } => {
                self.allocator.note_on(&mut self.voices, note, velocity);
            }
            SynthMessage::NoteOff { note } => {
                self.allocator.note_off(&mut self.voices, note);
            }
            SynthMessage::AllNotesOff => {
                self.allocator.all_notes_off(&mut self.voices);
            }
        }
    }

    /// Apply every queued note event. Returns how many were handled.
    pub fn drain_messages(&mut self) -> usize {
        let mut handled = 0;
        while let Some(msg) = self.rx.pop() {
            self.handle_message(msg);
            handled += 1;
        }
        handled
    }

    /// Tick every voice once and mix with fixed 1/N gain.
    ///
    /// Idle voices are ticked too; they cost little and keep their envelopes
    /// consistent.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let sum: f32 = self.voices.iter_mut().map(Voice::tick).sum();
        sum * self.gain
    }

    /// Drain pending note events, then fill `out` with interleaved frames.
    ///
    /// The mono mix is copied to every channel. A trailing partial frame is
    /// left untouched.
    pub fn render_block(&mut self, out: &mut [f32], channels: usize) {
        self.drain_messages();

        let channels = channels.max(1);
        for frame in out.chunks_exact_mut(channels) {
            let sample = self.next_sample();
            frame.fill(sample);
        }

        self.frames_rendered += (out.len() / channels) as u64;
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn allocator(&self) -> &VoiceAllocator {
        &self.allocator
    }

    /// Number of voices still producing sound, including release tails.
    pub fn sounding_voices(&self) -> usize {
        self.voices.iter().filter(|v| v.is_sounding()).count()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }
}
