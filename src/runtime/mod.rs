//! Render loop, output sinks and engine lifecycle.
//!
//! ```ignore
//! use polysub::{runtime::{Engine, MemorySink}, EngineConfig};
//!
//! let config = EngineConfig::default().with_channels(1);
//! let mut engine = Engine::spawn(&config, MemorySink::new(1))?;
//! engine.controller().note_on(60, 100)?;
//! engine.params().set_cutoff(800.0);
//! let stopped = engine.shutdown()?;
//! ```

mod engine;
mod render;
mod sink;
mod token;

pub use engine::{build, Controller, Engine, Stopped};
pub use render::{RenderLoop, RenderReport};
pub use sink::{AudioSink, MemorySink};
pub use token::RunToken;
