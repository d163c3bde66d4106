//! cpal output: the render thread pushes blocks into a ring that the device
//! callback drains.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use color_eyre::eyre::{Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use polysub::{error::SinkError, runtime::AudioSink, EngineError};
use rtrb::{Consumer, Producer, RingBuffer};

/// Longest the render thread waits for ring space before giving up on the
/// device.
const STALL_TIMEOUT: Duration = Duration::from_secs(2);

pub struct CpalSink {
    tx: Producer<f32>,
    channels: usize,
    failed: Arc<AtomicBool>,
}

impl AudioSink for CpalSink {
    fn channels(&self) -> usize {
        self.channels
    }

    fn write_block(&mut self, block: &[f32]) -> Result<(), SinkError> {
        let started = Instant::now();
        while self.tx.slots() < block.len() {
            if self.failed.load(Ordering::Acquire) {
                return Err(SinkError::Device("output stream reported an error".into()));
            }
            if self.tx.is_abandoned() {
                return Err(SinkError::Closed);
            }
            if started.elapsed() > STALL_TIMEOUT {
                return Err(SinkError::Device("output stream stalled".into()));
            }
            thread::sleep(Duration::from_millis(1));
        }

        let mut chunk = self
            .tx
            .write_chunk(block.len())
            .map_err(|_| SinkError::Full(block.len() / self.channels))?;
        let (first, second) = chunk.as_mut_slices();
        let split = first.len();
        first.copy_from_slice(&block[..split]);
        second.copy_from_slice(&block[split..]);
        chunk.commit_all();
        Ok(())
    }
}

/// An open, playing output device. The stream stays on the thread that
/// opened it; only the sink moves to the render thread.
pub struct Output {
    pub stream: cpal::Stream,
    pub sink: CpalSink,
    pub sample_rate: f32,
    pub channels: usize,
    pub device_name: String,
}

pub fn open_default(block_size: usize) -> EyreResult<Output> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or(EngineError::NoOutputDevice)?;
    let device_name = device.name().unwrap_or_else(|_| "unknown".into());
    let config = device
        .default_output_config()
        .wrap_err("failed to fetch default output config")?;

    let sample_rate = config.sample_rate().0 as f32;
    let channels = config.channels() as usize;

    let ring_frames = (block_size * 4).max(1024);
    let (tx, mut rx) = RingBuffer::<f32>::new(ring_frames * channels);
    let failed = Arc::new(AtomicBool::new(false));

    let err_flag = Arc::clone(&failed);
    let stream = device
        .build_output_stream(
            &config.into(),
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                drain_frames(&mut rx, data, channels);
            },
            move |err| {
                log::error!("output stream error: {err}");
                err_flag.store(true, Ordering::Release);
            },
            None,
        )
        .wrap_err("failed to build output stream")?;
    stream.play().wrap_err("failed to start output stream")?;

    log::info!("output: {device_name}, {sample_rate} Hz, {channels} channels, {ring_frames}-frame ring");

    Ok(Output {
        stream,
        sink: CpalSink {
            tx,
            channels,
            failed,
        },
        sample_rate,
        channels,
        device_name,
    })
}

/// Copy whole frames from the ring into `data`; pad the rest with silence.
fn drain_frames(rx: &mut Consumer<f32>, data: &mut [f32], channels: usize) {
    let available = rx.slots() / channels * channels;
    let n = available.min(data.len());

    if let Ok(chunk) = rx.read_chunk(n) {
        let (first, second) = chunk.as_slices();
        data[..first.len()].copy_from_slice(first);
        data[first.len()..n].copy_from_slice(second);
        chunk.commit_all();
    }

    data[n..].fill(0.0);
}
