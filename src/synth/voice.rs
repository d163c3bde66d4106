use std::sync::Arc;

use crate::{
    dsp::{EnvelopeGenerator, LowPassFilter, Oscillator},
    params::{EnvParams, VoiceParams, OSC_COUNT},
    synth::allocator::Playable,
};

/*
Voice Signal Flow
=================

  osc1 ──┬──── × vol1 ──┐
         │              │
         └─┐            ├──→ mix ──→ low-pass ──→ × AEG ──→ × velocity ──→ out
           ×── × xmod ──┤               ↑
         ┌─┘            │       cutoff = base + FEG · depth
  osc2 ──┴──── × vol2 ──┘

The order mix → filter → amplitude envelope is fixed. The filter must see the
full-level mix so its resonance and drive do not change with the envelope.

Parameters are not owned by the voice. Every tick starts by loading the
shared `VoiceParams` atomics into the DSP blocks, so edits made on another
thread are heard on the next sample.
*/

struct MixSettings {
    volume: [f32; OSC_COUNT],
    xmod: f32,
    base_cutoff: f32,
    feg_amount: f32,
}

/// One complete signal chain, pre-allocated and reused across notes.
pub struct Voice {
    osc: [Oscillator; OSC_COUNT],
    aeg: EnvelopeGenerator,
    feg: EnvelopeGenerator,
    filter: LowPassFilter,
    params: Arc<VoiceParams>,
    frequency: f32,
    velocity: f32,
}

impl Voice {
    pub fn new(sample_rate: f32, params: Arc<VoiceParams>) -> Self {
        let mut voice = Self {
            osc: [Oscillator::new(sample_rate), Oscillator::new(sample_rate)],
            aeg: EnvelopeGenerator::new(sample_rate),
            feg: EnvelopeGenerator::new(sample_rate),
            filter: LowPassFilter::new(sample_rate, params.cutoff()),
            params,
            frequency: 0.0,
            velocity: 1.0,
        };
        voice.set_frequency(220.0);
        voice.sync_params();
        voice
    }

    /// Produce the next output sample.
    #[inline]
    pub fn tick(&mut self) -> f32 {
        let mix = self.sync_params();

        let a = self.osc[0].tick();
        let b = self.osc[1].tick();
        let mixed = a * mix.volume[0] + b * mix.volume[1] + a * b * mix.xmod;

        let cutoff = mix.base_cutoff + self.feg.tick() * mix.feg_amount;
        self.filter.set_cutoff(cutoff);
        let filtered = self.filter.process(mixed);

        filtered * self.aeg.tick() * self.velocity
    }

    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.tick();
        }
    }

    fn sync_params(&mut self) -> MixSettings {
        let params = &*self.params;

        for (osc, p) in self.osc.iter_mut().zip(params.oscillators()) {
            let detune = p.detune();
            if osc.detune() != detune {
                osc.set_detune(detune);
            }
            osc.set_waveform(p.waveform());
        }

        apply_env(&mut self.aeg, params.aeg());
        apply_env(&mut self.feg, params.feg());
        self.filter.set_resonance(params.resonance());

        let [o1, o2] = params.oscillators();
        MixSettings {
            volume: [o1.volume(), o2.volume()],
            xmod: params.xmod_amount(),
            base_cutoff: params.cutoff(),
            feg_amount: params.feg_amount(),
        }
    }

    /// Set the pitch of both oscillators.
    pub fn set_frequency(&mut self, hz: f32) {
        self.frequency = hz;
        for osc in &mut self.osc {
            osc.set_base_frequency(hz);
        }
    }

    pub fn set_velocity(&mut self, velocity: f32) {
        if velocity.is_finite() {
            self.velocity = velocity.clamp(0.0, 1.0);
        }
    }

    pub fn note_on(&mut self) {
        self.aeg.key_on();
        self.feg.key_on();
    }

    pub fn note_off(&mut self) {
        self.aeg.key_off();
        self.feg.key_off();
    }

    /// True while the amplitude envelope is producing output.
    pub fn is_sounding(&self) -> bool {
        self.aeg.is_active()
    }

    pub fn envelope_level(&self) -> f32 {
        self.aeg.level()
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn params(&self) -> &Arc<VoiceParams> {
        &self.params
    }
}

fn apply_env(env: &mut EnvelopeGenerator, params: &EnvParams) {
    env.set_attack(params.attack());
    env.set_decay(params.decay());
    env.set_sustain(params.sustain());
    env.set_release(params.release());
}

impl Playable for Voice {
    fn start(&mut self, frequency: f32, velocity: f32) {
        self.set_frequency(frequency);
        self.set_velocity(velocity);
        self.note_on();
    }

    fn release(&mut self) {
        self.note_off();
    }
}
