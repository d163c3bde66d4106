use std::f32::consts::PI;

/*
Resonant Low-Pass Filter
========================

A two-pole state-variable filter in the topology-preserving transform (TPT)
form. The SVF is a good fit for a voice filter that is swept every sample by
an envelope:

  - cutoff and resonance are independent
  - it stays well-behaved when the cutoff moves quickly
  - the coefficient `g` is a single tan() per change

  g = tan(π · cutoff / sample_rate)
  k = 2 - 2 · resonance          (damping; k → 0 is self-oscillation)

Stability
---------

tan() blows up as the cutoff approaches Nyquist, and k = 0 never decays. Both
inputs are clamped before any coefficient is computed:

  cutoff     [20 Hz, 0.45 · sample_rate]   (non-finite → 20 Hz)
                                           (upper bound never below 20 Hz)
  resonance  [0.0, 0.98]                   (non-finite → unchanged)
*/

pub const MIN_CUTOFF_HZ: f32 = 20.0;
pub const MAX_CUTOFF_RATIO: f32 = 0.45;
pub const MAX_RESONANCE: f32 = 0.98;

pub struct LowPassFilter {
    ic1eq: f32, // First integrator's memory
    ic2eq: f32, // Second integrator's memory

    sample_rate: f32,
    cutoff_hz: f32,
    resonance: f32,

    g: f32,
    k: f32,
}

impl LowPassFilter {
    pub fn new(sample_rate: f32, cutoff_hz: f32) -> Self {
        let mut filter = Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            sample_rate: sample_rate.max(1.0),
            cutoff_hz: f32::NAN,
            resonance: 0.0,
            g: 0.0,
            k: 2.0,
        };
        filter.set_cutoff(cutoff_hz);
        filter
    }

    pub fn with_resonance(mut self, resonance: f32) -> Self {
        self.set_resonance(resonance);
        self
    }

    /// Clamp a requested cutoff into the stable range for this sample rate.
    #[inline]
    pub fn clamp_cutoff(&self, hz: f32) -> f32 {
        if hz.is_finite() {
            let max = (self.sample_rate * MAX_CUTOFF_RATIO).max(MIN_CUTOFF_HZ);
            hz.max(MIN_CUTOFF_HZ).min(max)
        } else {
            MIN_CUTOFF_HZ
        }
    }

    pub fn set_cutoff(&mut self, hz: f32) {
        let hz = self.clamp_cutoff(hz);
        if hz != self.cutoff_hz {
            self.cutoff_hz = hz;
            self.g = (PI * hz / self.sample_rate).tan();
        }
    }

    pub fn set_resonance(&mut self, resonance: f32) {
        if resonance.is_finite() {
            self.resonance = resonance.clamp(0.0, MAX_RESONANCE);
            self.k = 2.0 - 2.0 * self.resonance;
        }
    }

    /// Filter one sample.
    #[inline]
    pub fn process(&mut self, sample: f32) -> f32 {
        let g = self.g;
        let k = self.k;

        let h = 1.0 / (1.0 + g * (g + k));
        let v3 = sample - self.ic2eq;
        let v1 = h * (self.ic1eq + g * v3);
        let v2 = self.ic2eq + g * v1;

        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        if !v2.is_finite() {
            self.reset();
            return 0.0;
        }

        v2
    }

    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff_hz
    }

    pub fn resonance(&self) -> f32 {
        self.resonance
    }
}
