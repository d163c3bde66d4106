//! Low-level DSP primitives used by the voices.
//!
//! These components are allocation-free and realtime-safe, making them safe to
//! embed directly inside voice structs. They stay focused on the signal math;
//! parameter sharing and note handling live one layer up in `synth`.

/// Attack/decay/sustain/release envelope generator.
pub mod envelope;
/// Resonant state-variable low-pass filter.
pub mod filter;
/// Band-limited saw/square oscillator.
pub mod oscillator;

pub use envelope::{EnvelopeGenerator, EnvelopeStage};
pub use filter::LowPassFilter;
pub use oscillator::{Oscillator, Waveform};
