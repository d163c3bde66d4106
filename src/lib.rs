pub mod config;
pub mod dsp;
pub mod error;
pub mod io;
pub mod params; // Lock-free parameter surface shared with control threads
pub mod runtime; // Render loop, sinks and engine lifecycle
pub mod synth; // Voices, allocation and polyphony

pub use config::EngineConfig;
pub use error::{EngineError, SinkError};

pub const MAX_BLOCK_SIZE: usize = 2048;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;
