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
use std::time::Duration;

use duration_string::DurationString;
use serde::Deserialize;

use super::ConfigError;
use crate::device::Selector;

const DEFAULT_DEVICE: &str = "default";
const DEFAULT_SAMPLE_RATE: u32 = 44100;
const DEFAULT_CHUNKS_PER_SECOND: u32 = 60;
const DEFAULT_BUFFER_BLOCKS: usize = 32;
const DEFAULT_STALL_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Deserialize, Clone, Debug, Default)]
pub struct Audio {
    /// The audio input device: "default", a device id, or a device name.
    device: Option<String>,

    /// Capture sample rate in Hz (default: 44100)
    sample_rate: Option<u32>,

    /// How many chunks each second of audio is split into (default: 60)
    chunks_per_second: Option<u32>,

    /// How many callback blocks may queue up between the audio callback and the
    /// trigger loop before audio is dropped (default: 32)
    buffer_blocks: Option<usize>,

    /// How long to wait for audio before giving up on the device (default: 2s)
    stall_timeout: Option<String>,
}

impl Audio {
    /// New will create a new Audio configuration.
    pub fn new(device: &str) -> Audio {
        Audio {
            device: Some(device.to_string()),
            ..Default::default()
        }
    }

    /// Returns the device from the configuration.
    pub fn device(&self) -> &str {
        self.device.as_deref().unwrap_or(DEFAULT_DEVICE)
    }

    /// Returns the parsed device selector.
    pub fn selector(&self) -> Selector {
        Selector::from(self.device())
    }

    pub(super) fn set_device(&mut self, device: String) {
        self.device = Some(device);
    }

    /// Returns the capture sample rate (default: 44100)
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE)
    }

    /// Returns the number of chunks per second (default: 60)
    pub fn chunks_per_second(&self) -> u32 {
        self.chunks_per_second.unwrap_or(DEFAULT_CHUNKS_PER_SECOND)
    }

    /// Returns the number of samples in each chunk, truncated. 735 by default.
    pub fn chunk_size(&self) -> Result<usize, ConfigError> {
        let chunk_size = self
            .sample_rate()
            .checked_div(self.chunks_per_second())
            .unwrap_or(0);
        if chunk_size == 0 {
            return Err(ConfigError::EmptyChunk {
                sample_rate: self.sample_rate(),
                chunks_per_second: self.chunks_per_second(),
            });
        }

        Ok(chunk_size as usize)
    }

    /// Returns the capture queue depth in callback blocks (default: 32)
    pub fn buffer_blocks(&self) -> usize {
        self.buffer_blocks.unwrap_or(DEFAULT_BUFFER_BLOCKS).max(1)
    }

    /// Returns how long to wait for audio before the device is considered stalled.
    pub fn stall_timeout(&self) -> Result<Duration, ConfigError> {
        match &self.stall_timeout {
            Some(stall_timeout) => Ok(DurationString::from_string(stall_timeout.clone())
                .map_err(|e| ConfigError::Duration(stall_timeout.clone(), e.to_string()))?
                .into()),
            None => Ok(DEFAULT_STALL_TIMEOUT),
        }
    }
}
