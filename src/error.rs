use thiserror::Error;

use crate::synth::message::SynthMessage;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid engine config: {0}")]
    InvalidConfig(String),

    #[error("no audio output device available")]
    NoOutputDevice,

    #[error("no MIDI input device available")]
    NoMidiDevice,

    #[error("MIDI port {index} out of range ({available} available)")]
    MidiPortOutOfRange { index: usize, available: usize },

    #[error("control queue full, dropped {0:?}")]
    QueueFull(SynthMessage),

    #[error("audio sink failed: {0}")]
    Sink(#[from] SinkError),

    #[error("render thread panicked")]
    RenderThreadPanicked,

    #[error("failed to spawn render thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Faults reported by an output sink. Any of these ends the render loop.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("output device error: {0}")]
    Device(String),

    #[error("sink closed")]
    Closed,

    #[error("sink capacity of {0} frames exhausted")]
    Full(usize),

    #[error("block of {len} samples is not a whole number of {channels}-channel frames")]
    PartialFrame { len: usize, channels: usize },
}
