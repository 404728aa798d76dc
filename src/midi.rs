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

use crate::{config, detector::TriggerEvent};

pub mod midir;
pub mod mock;

/// Somewhere to send drum triggers.
pub trait Sink: fmt::Display + std::marker::Send {
    /// Sends a note on for the trigger. There is no acknowledgement.
    fn note_on(&mut self, event: &TriggerEvent) -> Result<(), Box<dyn Error>>;
}

/// A MIDI output device as shown in the device listing.
pub struct OutputDevice {
    /// The id used to select the device.
    pub id: usize,
    pub name: String,
}

impl fmt::Display for OutputDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} (Output)", self.id, self.name)
    }
}

/// Lists the MIDI output devices known to midir.
pub fn list_devices() -> Result<Vec<OutputDevice>, Box<dyn Error>> {
    midir::list()
}

/// Opens the configured MIDI output.
pub fn get_sink(config: &config::Midi) -> Result<Box<dyn Sink>, Box<dyn Error>> {
    let device = config.device();
    if device.starts_with("mock") {
        return Ok(Box::new(mock::Sink::get(device)));
    };

    Ok(Box::new(midir::Sink::get(config)?))
}

/// Serializes the trigger into a raw MIDI message.
pub(crate) fn encode(event: &TriggerEvent) -> Result<Vec<u8>, Box<dyn Error>> {
    let mut buf: Vec<u8> = Vec::with_capacity(8);
    event.to_midi_event().write(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use midly::num::{u4, u7};

    use super::*;

    #[test]
    fn test_get_mock_sink() {
        let mut sink = get_sink(&crate::config::Midi::new("mock-output")).unwrap();
        assert_eq!(sink.to_string(), "mock-output (Mock)");
        assert!(sink
            .note_on(&TriggerEvent::new(u7::new(36), u7::new(64), u4::new(9)))
            .is_ok());
    }

    #[test]
    fn test_encode_note_on() {
        let event = TriggerEvent::new(u7::new(81), u7::new(127), u4::new(15));
        assert_eq!(encode(&event).unwrap(), vec![0x9F, 81, 127]);
    }
}
