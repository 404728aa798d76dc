// Copyright (C) 2025 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::{
    error::Error,
    fmt, mem,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::Sample;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use tracing::{debug, error, info, span, warn, Level};

use super::{AudioError, InputDevice};
use crate::{
    config,
    detector::AudioChunk,
    device::{self, NameMatch, Selector},
};

/// What the audio callback hands to the trigger loop.
#[derive(Debug)]
enum Capture {
    /// One callback's worth of mono samples.
    Samples(Vec<i16>),
    /// The backend reported a stream error.
    Error(String),
}

/// Live audio input from a cpal device.
pub struct Source {
    /// The name of the device.
    name: String,
    /// The host the device belongs to.
    host: &'static str,
    /// The number of samples in each chunk.
    chunk_size: usize,
    /// How long to wait for audio before the device is considered stalled.
    stall_timeout: Duration,
    /// Blocks of samples from the audio callback.
    receiver: Receiver<Capture>,
    /// Samples received but not yet handed out as a chunk.
    pending: Vec<i16>,
    /// Callback blocks dropped because the trigger loop fell behind.
    overruns: Arc<AtomicU64>,
    /// Overruns already reported.
    reported_overruns: u64,
    /// Dropping this stops the capture thread.
    shutdown: Option<Sender<()>>,
    /// The thread that owns the cpal stream.
    capture_thread: Option<thread::JoinHandle<()>>,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.host)
    }
}

/// A cpal input device found during listing.
struct CpalDevice {
    name: String,
    host_id: cpal::HostId,
    max_channels: u16,
    device: cpal::Device,
}

/// Lists cpal input devices.
pub fn list() -> Result<Vec<InputDevice>, Box<dyn Error>> {
    Ok(list_cpal_devices()?
        .into_iter()
        .enumerate()
        .map(|(id, device)| InputDevice {
            id,
            name: device.name,
            host: device.host_id.name().to_string(),
            max_channels: device.max_channels,
        })
        .collect())
}

fn list_cpal_devices() -> Result<Vec<CpalDevice>, Box<dyn Error>> {
    // Suppress noisy output here.
    let _shh_stdout = shh::stdout()?;
    let _shh_stderr = shh::stderr()?;

    let mut devices: Vec<CpalDevice> = Vec::new();
    for host_id in cpal::available_hosts() {
        let host_devices = match cpal::host_from_id(host_id)?.input_devices() {
            Ok(host_devices) => host_devices,
            Err(e) => {
                error!(
                    err = e.to_string(),
                    host = host_id.name(),
                    "Unable to list devices for host"
                );
                continue;
            }
        };

        for device in host_devices {
            let input_configs = match device.supported_input_configs() {
                Ok(input_configs) => input_configs,
                Err(_e) => continue,
            };

            let max_channels = input_configs
                .map(|input_config| input_config.channels())
                .max()
                .unwrap_or(0);

            if max_channels > 0 {
                devices.push(CpalDevice {
                    name: device.name()?,
                    host_id,
                    max_channels,
                    device,
                })
            }
        }
    }

    devices.sort_by_key(|device| device.name.to_string());
    Ok(devices)
}

/// Finds the device for the selector.
fn find_device(selector: &Selector) -> Result<CpalDevice, Box<dyn Error>> {
    if *selector == Selector::Default {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or("no default audio input device")?;
        return Ok(CpalDevice {
            name: device.name()?,
            host_id: host.id(),
            max_channels: 0,
            device,
        });
    }

    device::select(list_cpal_devices()?, selector, NameMatch::Exact, |device| {
        device.name.as_str()
    })
}

/// Picks the stream configuration closest to mono 16-bit at the requested rate.
fn input_config(
    device: &cpal::Device,
    sample_rate: u32,
) -> Result<cpal::SupportedStreamConfig, Box<dyn Error>> {
    let rate = sample_rate as cpal::SampleRate;
    let mut candidates = device
        .supported_input_configs()?
        .filter(|range| {
            matches!(
                range.sample_format(),
                cpal::SampleFormat::I16 | cpal::SampleFormat::F32
            )
        })
        .filter(|range| range.min_sample_rate() <= rate && rate <= range.max_sample_rate())
        .collect::<Vec<cpal::SupportedStreamConfigRange>>();

    // Fewest channels first, then prefer native 16-bit.
    candidates.sort_by_key(|range| {
        (
            range.channels(),
            range.sample_format() != cpal::SampleFormat::I16,
        )
    });

    match candidates.into_iter().next() {
        Some(range) => Ok(range.with_sample_rate(rate)),
        None => Err(format!("device does not support capturing at {}Hz", sample_rate).into()),
    }
}

/// Builds the input stream. The callback keeps the first channel of every frame
/// and never blocks: if the queue is full the block is dropped and counted.
fn build_stream<T>(
    device: &cpal::Device,
    stream_config: &cpal::StreamConfig,
    sender: Sender<Capture>,
    overruns: Arc<AtomicU64>,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: cpal::SizedSample + Send + 'static,
    i16: cpal::FromSample<T>,
{
    let channels = usize::from(stream_config.channels.max(1));
    let error_sender = sender.clone();
    device.build_input_stream(
        stream_config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            let block: Vec<i16> = data
                .chunks(channels)
                .map(|frame| i16::from_sample(frame[0]))
                .collect();
            if let Err(TrySendError::Full(_)) = sender.try_send(Capture::Samples(block)) {
                overruns.fetch_add(1, Ordering::Relaxed);
            }
        },
        move |err| {
            let _ = error_sender.try_send(Capture::Error(err.to_string()));
        },
        None,
    )
}

/// Opens and starts the stream. Runs on the capture thread, which owns the
/// stream for its whole life.
fn start_stream(
    device: &cpal::Device,
    supported: &cpal::SupportedStreamConfig,
    sender: Sender<Capture>,
    overruns: Arc<AtomicU64>,
) -> Result<cpal::Stream, String> {
    let stream_config = cpal::StreamConfig {
        channels: supported.channels(),
        sample_rate: supported.sample_rate(),
        buffer_size: cpal::BufferSize::Default, // Let CPAL choose the buffer size
    };

    let stream = match supported.sample_format() {
        cpal::SampleFormat::I16 => {
            build_stream::<i16>(device, &stream_config, sender, overruns)
        }
        cpal::SampleFormat::F32 => {
            build_stream::<f32>(device, &stream_config, sender, overruns)
        }
        other => return Err(format!("unsupported sample format {:?}", other)),
    }
    .map_err(|e| e.to_string())?;

    stream.play().map_err(|e| e.to_string())?;
    Ok(stream)
}

impl Source {
    /// Opens the configured device and starts capturing.
    pub fn get(config: &config::Audio) -> Result<Source, Box<dyn Error>> {
        let span = span!(Level::INFO, "open audio input (cpal)");
        let _enter = span.enter();

        let chunk_size = config.chunk_size()?;
        let stall_timeout = config.stall_timeout()?;

        let selector = config.selector();
        let found = find_device(&selector)?;
        let supported = input_config(&found.device, config.sample_rate())?;

        info!(
            device = found.name,
            host = found.host_id.name(),
            channels = supported.channels(),
            format = ?supported.sample_format(),
            sample_rate = config.sample_rate(),
            chunk_size,
            "Opening audio input."
        );

        let (sender, receiver) = crossbeam_channel::bounded::<Capture>(config.buffer_blocks());
        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<(), String>>(1);
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(0);
        let overruns = Arc::new(AtomicU64::new(0));

        let capture_thread = {
            let device = found.device;
            let overruns = overruns.clone();
            thread::spawn(move || {
                let stream = match start_stream(&device, &supported, sender, overruns) {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));

                // Hold the stream until the source hangs up.
                let _ = shutdown_rx.recv();
                mem::drop(stream);
                debug!("Audio input stream closed.");
            })
        };

        let started = ready_rx
            .recv()
            .map_err(|_| AudioError::Open(found.name.clone(), "capture thread exited".into()))?;
        if let Err(e) = started {
            let _ = capture_thread.join();
            return Err(AudioError::Open(found.name, e).into());
        }

        Ok(Source {
            name: found.name,
            host: found.host_id.name(),
            chunk_size,
            stall_timeout,
            receiver,
            pending: Vec::new(),
            overruns,
            reported_overruns: 0,
            shutdown: Some(shutdown_tx),
            capture_thread: Some(capture_thread),
        })
    }

    fn report_overruns(&mut self) {
        let overruns = self.overruns.load(Ordering::Relaxed);
        if overruns > self.reported_overruns {
            warn!(
                device = self.name,
                dropped_blocks = overruns - self.reported_overruns,
                total = overruns,
                "Trigger loop fell behind, audio was dropped."
            );
            self.reported_overruns = overruns;
        }
    }
}

impl super::Source for Source {
    fn read_chunk(&mut self) -> Result<Option<AudioChunk>, Box<dyn Error>> {
        while self.pending.len() < self.chunk_size {
            match self.receiver.recv_timeout(self.stall_timeout) {
                Ok(Capture::Samples(block)) => self.pending.extend_from_slice(&block),
                Ok(Capture::Error(e)) => return Err(AudioError::Stream(e).into()),
                Err(RecvTimeoutError::Timeout) => {
                    return Err(AudioError::Stalled(self.stall_timeout).into())
                }
                Err(RecvTimeoutError::Disconnected) => return Err(AudioError::Disconnected.into()),
            }
        }

        self.report_overruns();

        let rest = self.pending.split_off(self.chunk_size);
        let samples = mem::replace(&mut self.pending, rest);
        Ok(Some(AudioChunk::new(samples)))
    }

    fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

impl Drop for Source {
    fn drop(&mut self) {
        // Hanging up wakes the capture thread, which drops the stream.
        mem::drop(self.shutdown.take());
        if let Some(thread) = self.capture_thread.take() {
            let _ = thread.join();
        }
        info!(device = self.name, "Closed audio input.");
    }
}
