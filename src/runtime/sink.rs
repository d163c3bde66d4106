use crate::error::SinkError;

/// Destination for rendered audio.
///
/// Blocks are interleaved f32 frames with `channels()` samples each. An error
/// ends the render loop; there is no retry.
pub trait AudioSink {
    fn channels(&self) -> usize;

    fn write_block(&mut self, block: &[f32]) -> Result<(), SinkError>;
}

impl<S: AudioSink + ?Sized> AudioSink for Box<S> {
    fn channels(&self) -> usize {
        (**self).channels()
    }

    fn write_block(&mut self, block: &[f32]) -> Result<(), SinkError> {
        (**self).write_block(block)
    }
}

/// Collects rendered frames in memory, for offline rendering and tests.
#[derive(Debug)]
pub struct MemorySink {
    channels: usize,
    samples: Vec<f32>,
    frame_limit: Option<usize>,
}

impl MemorySink {
    pub fn new(channels: usize) -> Self {
        Self {
            channels: channels.max(1),
            samples: Vec::new(),
            frame_limit: None,
        }
    }

    /// Refuse any block that would take the sink past `frames`.
    pub fn with_frame_limit(mut self, frames: usize) -> Self {
        self.frame_limit = Some(frames);
        self.samples.reserve(frames * self.channels);
        self
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    /// One channel, de-interleaved.
    pub fn channel(&self, index: usize) -> impl Iterator<Item = f32> + '_ {
        self.samples
            .chunks_exact(self.channels)
            .filter_map(move |frame| frame.get(index).copied())
    }
}

impl AudioSink for MemorySink {
    fn channels(&self) -> usize {
        self.channels
    }

    fn write_block(&mut self, block: &[f32]) -> Result<(), SinkError> {
        if block.len() % self.channels != 0 {
            return Err(SinkError::PartialFrame {
                len: block.len(),
                channels: self.channels,
            });
        }

        if let Some(limit) = self.frame_limit {
            if self.frames() + block.len() / self.channels > limit {
                return Err(SinkError::Full(limit));
            }
        }

        self.samples.extend_from_slice(block);
        Ok(())
    }
}
