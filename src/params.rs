//! Lock-free parameter surface shared between control threads and the
//! render thread.
//!
//! Every field is a single atomic scalar. Control contexts (terminal, MIDI)
//! write through `&self`; the render thread reads each field once per voice
//! tick with `Relaxed` ordering. No field depends on another, so no stronger
//! ordering is needed and a value may be observed one block late.
//!
//! Setters clamp on write, so the render thread only ever loads valid values.

use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use crate::dsp::{
    filter::{MAX_RESONANCE, MIN_CUTOFF_HZ},
    oscillator::{MAX_DETUNE, MIN_DETUNE},
    Waveform,
};
use crate::MIN_TIME;

pub const OSC_COUNT: usize = 2;

/// Upper bound for the base cutoff and FEG depth, in Hz.
pub const MAX_CUTOFF_PARAM_HZ: f32 = 20_000.0;

/// An `f32` stored as its bit pattern in an `AtomicU32`.
#[derive(Debug)]
pub struct AtomicF32 {
    bits: AtomicU32,
}

impl AtomicF32 {
    pub fn new(value: f32) -> Self {
        Self {
            bits: AtomicU32::new(value.to_bits()),
        }
    }

    #[inline]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn store(&self, value: f32) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// ADSR settings for one envelope generator.
#[derive(Debug)]
pub struct EnvParams {
    attack: AtomicF32,
    decay: AtomicF32,
    sustain: AtomicF32,
    release: AtomicF32,
}

impl EnvParams {
    fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack: AtomicF32::new(attack),
            decay: AtomicF32::new(decay),
            sustain: AtomicF32::new(sustain),
            release: AtomicF32::new(release),
        }
    }

    pub fn attack(&self) -> f32 {
        self.attack.load()
    }

    pub fn decay(&self) -> f32 {
        self.decay.load()
    }

    pub fn sustain(&self) -> f32 {
        self.sustain.load()
    }

    pub fn release(&self) -> f32 {
        self.release.load()
    }

    fn set_time(field: &AtomicF32, seconds: f32) {
        if seconds.is_finite() {
            field.store(seconds.max(MIN_TIME));
        }
    }

    pub fn set_attack(&self, seconds: f32) {
        Self::set_time(&self.attack, seconds);
    }

    pub fn set_decay(&self, seconds: f32) {
        Self::set_time(&self.decay, seconds);
    }

    pub fn set_sustain(&self, level: f32) {
        if level.is_finite() {
            self.sustain.store(level.clamp(0.0, 1.0));
        }
    }

    pub fn set_release(&self, seconds: f32) {
        Self::set_time(&self.release, seconds);
    }
}

/// Per-oscillator settings.
#[derive(Debug)]
pub struct OscParams {
    detune: AtomicF32,
    volume: AtomicF32,
    waveform: AtomicU8,
}

impl OscParams {
    fn new() -> Self {
        Self {
            detune: AtomicF32::new(1.0),
            volume: AtomicF32::new(1.0),
            waveform: AtomicU8::new(Waveform::Saw as u8),
        }
    }

    pub fn detune(&self) -> f32 {
        self.detune.load()
    }

    pub fn volume(&self) -> f32 {
        self.volume.load()
    }

    pub fn waveform(&self) -> Waveform {
        Waveform::from_u8(self.waveform.load(Ordering::Relaxed))
    }
}

/// The full set of voice parameters.
///
/// One instance is normally shared by every voice of a `PolySynth`, so a knob
/// turn reaches all voices at once.
#[derive(Debug)]
pub struct VoiceParams {
    aeg: EnvParams,
    feg: EnvParams,
    osc: [OscParams; OSC_COUNT],
    cutoff: AtomicF32,
    resonance: AtomicF32,
    feg_amount: AtomicF32,
    xmod_amount: AtomicF32,
}

impl Default for VoiceParams {
    fn default() -> Self {
        Self {
            aeg: EnvParams::new(0.01, 0.3, 0.7, 0.2),
            feg: EnvParams::new(0.01, 0.5, 0.2, 0.3),
            osc: [OscParams::new(), OscParams::new()],
            cutoff: AtomicF32::new(1_200.0),
            resonance: AtomicF32::new(0.2),
            feg_amount: AtomicF32::new(3_000.0),
            xmod_amount: AtomicF32::new(0.0),
        }
    }
}

impl VoiceParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn aeg(&self) -> &EnvParams {
        &self.aeg
    }

    pub fn feg(&self) -> &EnvParams {
        &self.feg
    }

    pub fn osc(&self, index: usize) -> Option<&OscParams> {
        self.osc.get(index)
    }

    pub(crate) fn oscillators(&self) -> &[OscParams; OSC_COUNT] {
        &self.osc
    }

    fn osc_or_warn(&self, index: usize) -> Option<&OscParams> {
        let osc = self.osc.get(index);
        if osc.is_none() {
            log::warn!("ignoring parameter for oscillator {index}; voices have {OSC_COUNT}");
        }
        osc
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff.load()
    }

    pub fn resonance(&self) -> f32 {
        self.resonance.load()
    }

    pub fn feg_amount(&self) -> f32 {
        self.feg_amount.load()
    }

    pub fn xmod_amount(&self) -> f32 {
        self.xmod_amount.load()
    }

    // Amplitude envelope

    pub fn set_aeg_attack(&self, seconds: f32) {
        self.aeg.set_attack(seconds);
    }

    pub fn set_aeg_decay(&self, seconds: f32) {
        self.aeg.set_decay(seconds);
    }

    pub fn set_aeg_sustain(&self, level: f32) {
        self.aeg.set_sustain(level);
    }

    pub fn set_aeg_release(&self, seconds: f32) {
        self.aeg.set_release(seconds);
    }

    // Filter envelope

    pub fn set_feg_attack(&self, seconds: f32) {
        self.feg.set_attack(seconds);
    }

    pub fn set_feg_decay(&self, seconds: f32) {
        self.feg.set_decay(seconds);
    }

    pub fn set_feg_sustain(&self, level: f32) {
        self.feg.set_sustain(level);
    }

    pub fn set_feg_release(&self, seconds: f32) {
        self.feg.set_release(seconds);
    }

    // Oscillators

    pub fn set_osc_detune(&self, osc: usize, ratio: f32) {
        if let Some(osc) = self.osc_or_warn(osc) {
            if ratio.is_finite() {
                osc.detune.store(ratio.clamp(MIN_DETUNE, MAX_DETUNE));
            }
        }
    }

    pub fn set_osc_volume(&self, osc: usize, volume: f32) {
        if let Some(osc) = self.osc_or_warn(osc) {
            if volume.is_finite() {
                osc.volume.store(volume.clamp(0.0, 1.0));
            }
        }
    }

    pub fn set_osc_waveform(&self, osc: usize, waveform: Waveform) {
        if let Some(osc) = self.osc_or_warn(osc) {
            osc.waveform.store(waveform as u8, Ordering::Relaxed);
        }
    }

    /// Flip an oscillator between saw and square.
    pub fn toggle_osc_waveform(&self, osc: usize) {
        if let Some(osc) = self.osc_or_warn(osc) {
            osc.waveform.fetch_xor(1, Ordering::Relaxed);
        }
    }

    // Filter and mix

    pub fn set_cutoff(&self, hz: f32) {
        if hz.is_finite() {
            self.cutoff.store(hz.clamp(MIN_CUTOFF_HZ, MAX_CUTOFF_PARAM_HZ));
        }
    }

    pub fn set_resonance(&self, resonance: f32) {
        if resonance.is_finite() {
            self.resonance.store(resonance.clamp(0.0, MAX_RESONANCE));
        }
    }

    /// Filter envelope depth in Hz added to the base cutoff at full envelope.
    pub fn set_feg_amount(&self, hz: f32) {
        if hz.is_finite() {
            self.feg_amount
                .store(hz.clamp(-MAX_CUTOFF_PARAM_HZ, MAX_CUTOFF_PARAM_HZ));
        }
    }

    pub fn set_xmod_amount(&self, amount: f32) {
        if amount.is_finite() {
            self.xmod_amount.store(amount.clamp(0.0, 1.0));
        }
    }
}
