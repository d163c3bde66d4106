//! Real-world scenario benchmarks.
//!
//! These benchmarks model a playing synth: single voices with their full
//! modulation path, and whole polyphonic blocks with the note queue.

mod poly;
mod voices;

pub use poly::bench_poly;
pub use voices::bench_voices;
