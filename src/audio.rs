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
use std::{error::Error, fmt};

use crate::{config, detector::AudioChunk};

pub mod cpal;
pub mod mock;

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("Unable to open audio input {0}: {1}")]
    Open(String, String),

    #[error("Audio input stream error: {0}")]
    Stream(String),

    #[error("No audio received for {0:?}")]
    Stalled(std::time::Duration),

    #[error("Audio input stream closed")]
    Disconnected,
}

/// A source of fixed-size mono 16-bit chunks.
pub trait Source: fmt::Display + std::marker::Send {
    /// Blocks until the next chunk is available. Returns None once the source has
    /// no more audio to give.
    fn read_chunk(&mut self) -> Result<Option<AudioChunk>, Box<dyn Error>>;

    /// The number of samples in every chunk this source returns.
    fn chunk_size(&self) -> usize;
}

/// An audio input device as shown in the device listing.
pub struct InputDevice {
    /// The id used to select the device.
    pub id: usize,
    pub name: String,
    pub host: String,
    pub max_channels: u16,
}

impl fmt::Display for InputDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} (Channels={}) ({})",
            self.id, self.name, self.max_channels, self.host
        )
    }
}

/// Lists the audio input devices.
pub fn list_devices() -> Result<Vec<InputDevice>, Box<dyn Error>> {
    cpal::list()
}

/// Opens the configured audio input.
pub fn get_source(config: &config::Audio) -> Result<Box<dyn Source>, Box<dyn Error>> {
    let chunk_size = config.chunk_size()?;

    let device = config.device();
    if device.starts_with("mock") {
        return Ok(Box::new(mock::Source::get(device, chunk_size)));
    };

    Ok(Box::new(cpal::Source::get(config)?))
}
