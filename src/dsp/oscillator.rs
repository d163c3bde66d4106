#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
Band-Limited Oscillator
=======================

Each voice runs two of these. A naive sawtooth or square wave has a hard
discontinuity once per cycle, and a discontinuity contains energy at every
frequency. Everything above Nyquist folds back as inharmonic aliasing.

PolyBLEP (polynomial band-limited step) smooths the discontinuity with a
two-sample polynomial correction. It is cheap, allocation-free and
removes most audible aliasing for musical pitches.

  phase      0.0 → 1.0, wraps once per cycle
  phase_inc  frequency / sample_rate
  detune     multiplicative ratio applied to the base frequency

Frequency:
  effective = base_frequency * detune

Both setters recompute the increment straight away. The phase is never reset
on frequency or waveform changes, so neither produces a click.
*/

pub const MIN_DETUNE: f32 = 0.5;
pub const MAX_DETUNE: f32 = 2.0;

// PolyBLEP needs less than half a cycle per sample
const MAX_PHASE_INC: f32 = 0.49;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Waveform {
    #[default]
    Saw = 0,
    Square = 1,
}

impl Waveform {
    pub fn toggled(self) -> Self {
        match self {
            Waveform::Saw => Waveform::Square,
            Waveform::Square => Waveform::Saw,
        }
    }

    pub fn from_u8(value: u8) -> Self {
        if value & 1 == 0 {
            Waveform::Saw
        } else {
            Waveform::Square
        }
    }
}

pub struct Oscillator {
    sample_rate: f32,
    waveform: Waveform,
    base_frequency: f32,
    detune: f32,
    phase: f32,
    phase_inc: f32,
}

impl Oscillator {
    pub fn new(sample_rate: f32) -> Self {
        let mut osc = Self {
            sample_rate: sample_rate.max(1.0),
            waveform: Waveform::Saw,
            base_frequency: 220.0,
            detune: 1.0,
            phase: 0.0,
            phase_inc: 0.0,
        };
        osc.update_frequency();
        osc
    }

    pub fn with_waveform(mut self, waveform: Waveform) -> Self {
        self.waveform = waveform;
        self
    }

    pub fn set_base_frequency(&mut self, hz: f32) {
        self.base_frequency = if hz.is_finite() { hz.max(0.0) } else { 0.0 };
        self.update_frequency();
    }

    pub fn set_detune(&mut self, ratio: f32) {
        if ratio.is_finite() {
            self.detune = ratio.clamp(MIN_DETUNE, MAX_DETUNE);
            self.update_frequency();
        }
    }

    pub fn switch_waveform(&mut self) {
        self.waveform = self.waveform.toggled();
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    fn update_frequency(&mut self) {
        let hz = self.base_frequency * self.detune;
        self.phase_inc = (hz / self.sample_rate).min(MAX_PHASE_INC);
    }

    /// PolyBLEP correction around a discontinuity at phase 0.
    #[inline]
    fn poly_blep(&self, t: f32) -> f32 {
        let dt = self.phase_inc;
        if dt <= 0.0 {
            0.0
        } else if t < dt {
            let t = t / dt;
            2.0 * t - t * t - 1.0
        } else if t > 1.0 - dt {
            let t = (t - 1.0) / dt;
            t * t + 2.0 * t + 1.0
        } else {
            0.0
        }
    }

    /// Generate one sample and advance the phase.
    #[inline]
    pub fn tick(&mut self) -> f32 {
        let t = self.phase;
        let sample = match self.waveform {
            Waveform::Saw => (2.0 * t - 1.0) - self.poly_blep(t),
            Waveform::Square => {
                let naive = if t < 0.5 { 1.0 } else { -1.0 };
                let mut falling = t + 0.5;
                if falling >= 1.0 {
                    falling -= 1.0;
                }
                naive + self.poly_blep(t) - self.poly_blep(falling)
            }
        };

        self.phase += self.phase_inc;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }

        sample
    }

    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.tick();
        }
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Effective frequency in Hz (base × detune).
    pub fn frequency(&self) -> f32 {
        self.base_frequency * self.detune
    }

    pub fn base_frequency(&self) -> f32 {
        self.base_frequency
    }

    pub fn detune(&self) -> f32 {
        self.detune
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }
}
