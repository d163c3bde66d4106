use rtrb::Consumer;

use crate::{
    config::EngineConfig,
    error::SinkError,
    runtime::{sink::AudioSink, token::RunToken},
    synth::{
        message::{MessageReceiver, SynthMessage},
        poly::PolySynth,
    },
};

/// Totals for one render loop run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderReport {
    pub frames: u64,
    pub blocks: u64,
}

/// Renders fixed-size blocks from a [`PolySynth`] into an [`AudioSink`].
///
/// The block buffer is allocated once here. The loop itself does not
/// allocate, lock or log until it exits.
pub struct RenderLoop<R = Consumer<SynthMessage>> {
    synth: PolySynth<R>,
    buffer: Vec<f32>,
    channels: usize,
    token: RunToken,
}

impl<R: MessageReceiver> RenderLoop<R> {
    pub fn new(config: &EngineConfig, synth: PolySynth<R>, token: RunToken) -> Self {
        let channels = config.channels.max(1);
        Self {
            synth,
            buffer: vec![0.0; config.block_size.max(1) * channels],
            channels,
            token,
        }
    }

    /// Render until the token is cancelled or the sink fails.
    ///
    /// A sink error cancels the token, so the control side shuts down too.
    pub fn run<S: AudioSink + ?Sized>(&mut self, sink: &mut S) -> Result<RenderReport, SinkError> {
        self.run_blocks(sink, u64::MAX)
    }

    /// Like [`run`](Self::run) but stops after at most `max_blocks` blocks.
    pub fn run_blocks<S: AudioSink + ?Sized>(
        &mut self,
        sink: &mut S,
        max_blocks: u64,
    ) -> Result<RenderReport, SinkError> {
        let mut report = RenderReport::default();
        let frames_per_block = (self.buffer.len() / self.channels) as u64;

        while report.blocks < max_blocks && self.token.is_running() {
            self.synth.render_block(&mut self.buffer, self.channels);

            if let Err(err) = sink.write_block(&self.buffer) {
                self.token.cancel();
                log::error!(
                    "render loop stopped after {} frames: {err}",
                    report.frames
                );
                return Err(err);
            }

            report.blocks += 1;
            report.frames += frames_per_block;
        }

        Ok(report)
    }

    pub fn synth(&self) -> &PolySynth<R> {
        &self.synth
    }

    pub fn token(&self) -> &RunToken {
        &self.token
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn block_frames(&self) -> usize {
        self.buffer.len() / self.channels
    }
}
