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
use midly::num::u4;
use serde::Deserialize;

use super::ConfigError;
use crate::{device::Selector, percussion::PERCUSSION_CHANNEL};

const DEFAULT_DEVICE: &str = "default";

#[derive(Deserialize, Clone, Debug, Default)]
pub struct Midi {
    /// The MIDI output device: "default", a device id, or a device name.
    device: Option<String>,

    /// The zero based MIDI channel to send triggers on (default: 9, percussion).
    channel: Option<u8>,
}

impl Midi {
    /// New will create a new MIDI configuration.
    pub fn new(device: &str) -> Midi {
        Midi {
            device: Some(device.to_string()),
            channel: None,
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

    /// Returns the MIDI channel.
    pub fn channel(&self) -> Result<u4, ConfigError> {
        let channel = self.channel.unwrap_or(PERCUSSION_CHANNEL);
        u4::try_from(channel).ok_or(ConfigError::Channel(channel))
    }
}

#[cfg(test)]
mod tests {
    use config::{Config, File, FileFormat};

    use super::*;

    fn parse(yaml: &str) -> Midi {
        Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize::<Midi>()
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let midi = parse("{}");
        assert_eq!(midi.device(), "default");
        assert_eq!(midi.channel().unwrap().as_int(), 9);
    }

    #[test]
    fn test_device_id() {
        let midi = parse("device: 1\nchannel: 0");
        assert_eq!(midi.selector(), Selector::Index(1));
        assert_eq!(midi.channel().unwrap().as_int(), 0);
    }

    #[test]
    fn test_channel_out_of_range() {
        let midi = parse("channel: 16");
        assert!(matches!(midi.channel(), Err(ConfigError::Channel(16))));
    }
}
