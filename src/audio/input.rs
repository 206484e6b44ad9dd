// Live microphone capture through cpal

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use super::buffer_pool::CaptureChannels;
use crate::error::{log_audio_error, AudioError};

/// An open default-input stream feeding a buffer pool
pub struct LiveInput {
    stream: Option<cpal::Stream>,
    sample_rate: u32,
    channels: u16,
    dropped_blocks: Arc<AtomicU64>,
}

impl LiveInput {
    /// Open the default input device and start capturing into `capture`.
    pub fn start(capture: CaptureChannels) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(AudioError::NoInputDevice)?;

        let config = device
            .default_input_config()
            .map_err(|e| AudioError::StreamOpenFailed {
                reason: format!("Failed to get default input config: {:?}", e),
            })?;

        let stream_config: cpal::StreamConfig = config.clone().into();
        let dropped_blocks = Arc::new(AtomicU64::new(0));
        let dropped = Arc::clone(&dropped_blocks);

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => {
                build_stream::<f32>(&device, &stream_config, capture, dropped)
            }
            cpal::SampleFormat::I16 => {
                build_stream::<i16>(&device, &stream_config, capture, dropped)
            }
            cpal::SampleFormat::I32 => {
                build_stream::<i32>(&device, &stream_config, capture, dropped)
            }
            cpal::SampleFormat::U16 => {
                build_stream::<u16>(&device, &stream_config, capture, dropped)
            }
            other => {
                return Err(AudioError::UnsupportedFormat {
                    format: format!("{:?}", other),
                })
            }
        }?;

        stream.play().map_err(|e| AudioError::StreamOpenFailed {
            reason: format!("Input start failed: {}", e),
        })?;

        info!(
            "[LiveInput] Capturing {} Hz, {} channel(s) from {}",
            stream_config.sample_rate.0,
            stream_config.channels,
            device.name().unwrap_or_else(|_| "unknown device".to_string())
        );

        Ok(Self {
            stream: Some(stream),
            sample_rate: stream_config.sample_rate.0,
            channels: stream_config.channels,
            dropped_blocks,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn is_running(&self) -> bool {
        self.stream.is_some()
    }

    /// Device blocks discarded because the analysis side fell behind
    pub fn dropped_blocks(&self) -> u64 {
        self.dropped_blocks.load(Ordering::Relaxed)
    }

    pub fn stop(&mut self) -> Result<(), AudioError> {
        let stream = self.stream.take().ok_or(AudioError::NotRunning)?;
        drop(stream);
        let dropped = self.dropped_blocks();
        if dropped > 0 {
            warn!("[LiveInput] Stopped after dropping {} block(s)", dropped);
        } else {
            info!("[LiveInput] Stopped");
        }
        Ok(())
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut capture: CaptureChannels,
    dropped: Arc<AtomicU64>,
) -> Result<cpal::Stream, AudioError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let channels = config.channels as usize;
    let err_fn = |err: cpal::StreamError| {
        log_audio_error(
            &AudioError::StreamFailure {
                reason: err.to_string(),
            },
            "input stream",
        );
    };

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                if !capture.push_interleaved(data, channels, |s| s.to_sample::<f32>()) {
                    dropped.fetch_add(1, Ordering::Relaxed);
                }
            },
            err_fn,
            None,
        )
        .map_err(|e| AudioError::StreamOpenFailed {
            reason: format!("{:?}", e),
        })
}
