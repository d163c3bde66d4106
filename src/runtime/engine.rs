use std::{
    sync::Arc,
    thread::{self, JoinHandle},
};

use rtrb::{Producer, PushError, RingBuffer};

use crate::{
    config::EngineConfig,
    error::{EngineError, SinkError},
    params::VoiceParams,
    runtime::{
        render::{RenderLoop, RenderReport},
        sink::AudioSink,
        token::RunToken,
    },
    synth::{message::SynthMessage, poly::PolySynth},
};

/// The single writer of the note queue.
///
/// Not `Clone`: every input source funnels through one owner, which keeps
/// note order intact.
pub struct Controller {
    tx: Producer<SynthMessage>,
}

impl Controller {
    pub fn send(&mut self, msg: SynthMessage) -> Result<(), EngineError> {
        self.tx.push(msg).map_err(|PushError::Full(msg)| EngineError::QueueFull(msg))
    }

    /// Velocity 0 releases `note`, as a MIDI note-on would.
    pub fn note_on(&mut self, note: u8, velocity: u8) -> Result<(), EngineError> {
        self.send(SynthMessage::NoteOn { note, velocity })
    }

    pub fn note_off(&mut self, note: u8) -> Result<(), EngineError> {
        self.send(SynthMessage::NoteOff { note })
    }

    pub fn all_notes_off(&mut self) -> Result<(), EngineError> {
        self.send(SynthMessage::AllNotesOff)
    }

    /// Free slots left in the queue.
    pub fn capacity_left(&self) -> usize {
        self.tx.slots()
    }
}

/// Validate `config` and wire a controller to a render loop over a fresh
/// voice pool. Used directly for offline rendering.
pub fn build(
    config: &EngineConfig,
    params: Arc<VoiceParams>,
    token: RunToken,
) -> Result<(Controller, RenderLoop), EngineError> {
    config.validate()?;

    let (tx, rx) = RingBuffer::<SynthMessage>::new(config.queue_capacity);
    let synth = PolySynth::new(config, params, rx);

    log::debug!(
        "built voice pool: {} voices, {} Hz, {} channels, {}-frame blocks",
        config.voices,
        config.sample_rate,
        config.channels,
        config.block_size
    );

    Ok((Controller { tx }, RenderLoop::new(config, synth, token)))
}

/// What the render thread hands back once it has stopped.
pub struct Stopped<S> {
    pub report: RenderReport,
    pub sink: S,
}

/// A running engine: the render thread plus its control handles.
pub struct Engine<S> {
    controller: Controller,
    params: Arc<VoiceParams>,
    token: RunToken,
    handle: JoinHandle<(S, Result<RenderReport, SinkError>)>,
}

impl<S: AudioSink + Send + 'static> Engine<S> {
    /// Build the voice pool and start rendering into `sink` on a new thread.
    pub fn spawn(config: &EngineConfig, sink: S) -> Result<Self, EngineError> {
        if sink.channels() != config.channels {
            return Err(EngineError::InvalidConfig(format!(
                "sink has {} channels, config expects {}",
                sink.channels(),
                config.channels
            )));
        }

        let params = Arc::new(VoiceParams::new());
        let token = RunToken::new();
        let (controller, mut render_loop) = build(config, Arc::clone(&params), token.clone())?;

        let handle = thread::Builder::new()
            .name("polysub-render".into())
            .spawn(move || {
                let mut sink = sink;
                let result = render_loop.run(&mut sink);
                (sink, result)
            })
            .map_err(EngineError::Spawn)?;

        log::info!(
            "engine started: {} voices at {} Hz",
            config.voices,
            config.sample_rate
        );

        Ok(Self {
            controller,
            params,
            token,
            handle,
        })
    }

    pub fn controller(&mut self) -> &mut Controller {
        &mut self.controller
    }

    pub fn params(&self) -> &Arc<VoiceParams> {
        &self.params
    }

    pub fn token(&self) -> &RunToken {
        &self.token
    }

    pub fn is_running(&self) -> bool {
        self.token.is_running() && !self.handle.is_finished()
    }

    /// Cancel the render loop and wait for its thread.
    ///
    /// The voice pool lives on the render thread and is dropped before this
    /// returns.
    pub fn shutdown(self) -> Result<Stopped<S>, EngineError> {
        self.token.cancel();

        let (sink, result) = self
            .handle
            .join()
            .map_err(|_| EngineError::RenderThreadPanicked)?;
        let report = result?;

        log::info!(
            "engine stopped after {} blocks ({} frames)",
            report.blocks,
            report.frames
        );

        Ok(Stopped { report, sink })
    }
}
