//! Engine configuration.
//!
//! Everything here is fixed once the engine is built: the voice count, the
//! sample rate and the channel count cannot change while it runs.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    error::EngineError,
    synth::allocator::{ReleasePolicy, StealPolicy},
    MAX_BLOCK_SIZE,
};

/// Lowest accepted output rate in Hz.
pub const MIN_SAMPLE_RATE: f32 = 8_000.0;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Output sample rate in Hz.
    pub sample_rate: f32,
    /// Interleaved output channels; every channel carries the same mix.
    pub channels: usize,
    /// Size of the voice pool.
    pub voices: usize,
    /// Frames rendered per loop iteration.
    pub block_size: usize,
    /// Capacity of the control → render note queue.
    pub queue_capacity: usize,
    pub steal_policy: StealPolicy,
    pub release_policy: ReleasePolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            channels: 2,
            voices: 8,
            block_size: 64,
            queue_capacity: 256,
            steal_policy: StealPolicy::default(),
            release_policy: ReleasePolicy::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_channels(mut self, channels: usize) -> Self {
        self.channels = channels;
        self
    }

    pub fn with_voices(mut self, voices: usize) -> Self {
        self.voices = voices;
        self
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_steal_policy(mut self, policy: StealPolicy) -> Self {
        self.steal_policy = policy;
        self
    }

    pub fn with_release_policy(mut self, policy: ReleasePolicy) -> Self {
        self.release_policy = policy;
        self
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        let invalid = |msg: String| Err(EngineError::InvalidConfig(msg));

        if !self.sample_rate.is_finite() || self.sample_rate < MIN_SAMPLE_RATE {
            return invalid(format!(
                "sample rate must be at least {MIN_SAMPLE_RATE} Hz, got {}",
                self.sample_rate
            ));
        }
        if self.channels == 0 {
            return invalid("channel count must be at least 1".into());
        }
        if self.voices == 0 {
            return invalid("voice pool must hold at least 1 voice".into());
        }
        if self.block_size == 0 || self.block_size > MAX_BLOCK_SIZE {
            return invalid(format!(
                "block size must be within 1..={MAX_BLOCK_SIZE}, got {}",
                self.block_size
            ));
        }
        if self.queue_capacity == 0 {
            return invalid("queue capacity must be at least 1".into());
        }
        Ok(())
    }
}
