use crate::MIN_TIME;

// Absorbs accumulated rounding so a ramp of n steps ends after n samples
const RAMP_EPSILON: f32 = 1e-6;

/*
ADSR Envelope Generator
=======================

A linear ADSR envelope: the generator behind both the amplitude envelope (AEG)
and the filter envelope (FEG) of every voice.

Vocabulary
----------

  level       The envelope's current output value (0.0 to 1.0).

  stage       Idle, Attack, Decay, Sustain or Release. A state machine
              governs transitions.

  step        How much `level` moves per sample in the current stage. It is
              latched when the stage is entered.

  sample_rate Samples per second. Fixed at construction.


The Shape
---------

  Level
    1.0 ┐     ╱╲
        │    ╱  ╲___________
    S   │   ╱               ╲
        │  ╱                 ╲
    0.0 └─╱───────────────────╲──→ Time
        Attack Decay  Sustain  Release


Retriggering
------------

key_on() restarts Attack from the CURRENT level, not from zero. A note that
retriggers a voice still ringing out in Release therefore ramps up from
wherever the release left it, with no click:

  Level
        │   ╱╲____
        │  ╱      ╲      ╱╲___
        │ ╱        ╲    ╱
        │╱          ╲__╱  ← key_on mid-release
        └──────────────────────→ Time

The attack slope is always 1 / (attack_time * sample_rate), so a ramp that
starts part-way up reaches 1.0 sooner than attack_time.


Parameter Changes
-----------------

Setters only store the new value. The slope of a ramp in progress is latched
at stage entry and is not re-sloped, so a parameter change is heard from the
next stage onward. Sustain is the one stage without a ramp of its own: a new
sustain level is approached at the full-scale decay rate rather than jumped
to.


Release
-------

We snapshot the starting level and the total release samples at key_off,
then interpolate linearly. This ensures we hit exactly 0.0 after
release_time regardless of where the release started.
*/

/// The current stage of the envelope state machine.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Idle,    // Gate low, envelope inactive, level = 0
    Attack,  // Ramping up to 1.0
    Decay,   // Reached peak, ramping down to sustain level
    Sustain, // Holding at sustain level while gate is high
    Release, // Gate went low, ramping down to 0
}

pub struct EnvelopeGenerator {
    sample_rate: f32,

    // ADSR parameters
    attack_time: f32,   // seconds to ramp 0 → 1
    decay_time: f32,    // seconds to ramp 1 → sustain
    sustain_level: f32, // level to hold (0.0 - 1.0)
    release_time: f32,  // seconds to ramp current → 0

    // Runtime state
    stage: EnvelopeStage,
    level: f32,

    // Latched at stage entry
    step: f32,
    decay_target: f32,

    release_start_level: f32,
    release_total_samples: u32,
    release_elapsed_samples: u32,
}

impl EnvelopeGenerator {
    pub fn new(sample_rate: f32) -> Self {
        Self::adsr(sample_rate, 0.01, 0.1, 0.7, 0.3)
    }

    pub fn adsr(sample_rate: f32, attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        let mut env = Self {
            sample_rate: sample_rate.max(1.0),
            attack_time: 0.01,
            decay_time: 0.1,
            sustain_level: 0.7,
            release_time: 0.3,
            stage: EnvelopeStage::Idle,
            level: 0.0,
            step: 0.0,
            decay_target: 0.0,
            release_start_level: 0.0,
            release_total_samples: 1,
            release_elapsed_samples: 0,
        };
        env.set_attack(attack);
        env.set_decay(decay);
        env.set_sustain(sustain);
        env.set_release(release);
        env
    }

    /// Gate high: (re)start the attack from the current level.
    pub fn key_on(&mut self) {
        self.stage = EnvelopeStage::Attack;
        self.step = 1.0 / self.samples_for(self.attack_time);
        self.release_elapsed_samples = 0;
    }

    /// Gate low: start the release phase from the current level.
    pub fn key_off(&mut self) {
        if matches!(self.stage, EnvelopeStage::Idle | EnvelopeStage::Release) {
            return;
        }

        self.release_start_level = self.level;
        self.release_total_samples = self.samples_for(self.release_time).round().max(1.0) as u32;
        self.release_elapsed_samples = 0;
        self.stage = EnvelopeStage::Release;
    }

    /// Advance the envelope by one sample and return the new level.
    pub fn tick(&mut self) -> f32 {
        match self.stage {
            EnvelopeStage::Idle => {
                self.level = 0.0;
            }

            EnvelopeStage::Attack => {
                self.level += self.step;

                if self.level >= 1.0 - RAMP_EPSILON {
                    self.level = 1.0;
                    self.enter_decay();
                }
            }

            EnvelopeStage::Decay => {
                self.level -= self.step;

                if self.level <= self.decay_target {
                    self.level = self.decay_target;
                    self.stage = EnvelopeStage::Sustain;
                }
            }

            EnvelopeStage::Sustain => {
                let target = self.sustain_level;
                if self.level != target {
                    let max_step = 1.0 / self.samples_for(self.decay_time);
                    let delta = (target - self.level).clamp(-max_step, max_step);
                    self.level += delta;
                }
            }

            EnvelopeStage::Release => {
                self.release_elapsed_samples = self.release_elapsed_samples.saturating_add(1);

                if self.release_elapsed_samples >= self.release_total_samples {
                    self.level = 0.0;
                    self.stage = EnvelopeStage::Idle;
                } else {
                    let progress =
                        self.release_elapsed_samples as f32 / self.release_total_samples as f32;
                    self.level = (self.release_start_level * (1.0 - progress)).max(0.0);
                }
            }
        }

        debug_assert!((0.0..=1.0).contains(&self.level));
        self.level
    }

    /// Render a block of envelope values into the buffer.
    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.tick();
        }
    }

    fn enter_decay(&mut self) {
        self.decay_target = self.sustain_level;
        self.step = (1.0 - self.decay_target) / self.samples_for(self.decay_time);
        self.stage = EnvelopeStage::Decay;
    }

    #[inline]
    fn samples_for(&self, seconds: f32) -> f32 {
        (seconds * self.sample_rate).max(1.0)
    }

    pub fn set_attack(&mut self, seconds: f32) {
        if seconds.is_finite() {
            self.attack_time = seconds.max(MIN_TIME);
        }
    }

    pub fn set_decay(&mut self, seconds: f32) {
        if seconds.is_finite() {
            self.decay_time = seconds.max(MIN_TIME);
        }
    }

    pub fn set_sustain(&mut self, level: f32) {
        if level.is_finite() {
            self.sustain_level = level.clamp(0.0, 1.0);
        }
    }

    pub fn set_release(&mut self, seconds: f32) {
        if seconds.is_finite() {
            self.release_time = seconds.max(MIN_TIME);
        }
    }

    /// Returns true if the envelope is producing output (not idle).
    pub fn is_active(&self) -> bool {
        !matches!(self.stage, EnvelopeStage::Idle)
    }

    /// Reset to idle state.
    pub fn reset(&mut self) {
        self.stage = EnvelopeStage::Idle;
        self.level = 0.0;
        self.step = 0.0;
        self.release_elapsed_samples = 0;
        self.release_start_level = 0.0;
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    pub fn sustain_level(&self) -> f32 {
        self.sustain_level
    }
}
