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
use midly::num::u7;
use serde::Deserialize;

use super::ConfigError;
use crate::percussion::{self, DEFAULT_TONE};

const DEFAULT_VELOCITY_RATE: u32 = 5;
const DEFAULT_VOLUME_THRESHOLD: u32 = 10;

#[derive(Deserialize, Clone, Debug, Default)]
pub struct Trigger {
    /// The percussion note to trigger (default: 36, Bass Drum 1).
    tone: Option<u8>,

    /// Multiplier from chunk loudness to note velocity (default: 5).
    velocity_rate: Option<u32>,

    /// How far loudness must rise from one chunk to the next to trigger (default: 10).
    volume_threshold: Option<u32>,
}

impl Trigger {
    pub fn tone(&self) -> u8 {
        self.tone.unwrap_or(DEFAULT_TONE)
    }

    pub fn velocity_rate(&self) -> u32 {
        self.velocity_rate.unwrap_or(DEFAULT_VELOCITY_RATE)
    }

    pub fn volume_threshold(&self) -> u32 {
        self.volume_threshold.unwrap_or(DEFAULT_VOLUME_THRESHOLD)
    }

    pub(super) fn set_tone(&mut self, tone: u8) {
        self.tone = Some(tone);
    }

    pub(super) fn set_velocity_rate(&mut self, velocity_rate: u32) {
        self.velocity_rate = Some(velocity_rate);
    }

    pub(super) fn set_volume_threshold(&mut self, volume_threshold: u32) {
        self.volume_threshold = Some(volume_threshold);
    }

    /// Returns the instrument name of the tone.
    pub fn tone_name(&self) -> Result<&'static str, ConfigError> {
        percussion::name(self.tone()).ok_or(ConfigError::UnknownTone(self.tone()))
    }

    /// Returns the tone as a note, checking it against the percussion map.
    pub fn note(&self) -> Result<u7, ConfigError> {
        self.tone_name()?;
        u7::try_from(self.tone()).ok_or(ConfigError::UnknownTone(self.tone()))
    }

    /// Checks the trigger settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.note()?;
        if self.velocity_rate() == 0 {
            return Err(ConfigError::ZeroVelocityRate);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let trigger = Trigger::default();
        assert_eq!(trigger.tone(), 36);
        assert_eq!(trigger.tone_name().unwrap(), "Bass Drum 1");
        assert_eq!(trigger.velocity_rate(), 5);
        assert_eq!(trigger.volume_threshold(), 10);
        assert!(trigger.validate().is_ok());
    }

    #[test]
    fn test_unknown_tone() {
        let mut trigger = Trigger::default();
        trigger.set_tone(20);
        assert!(matches!(
            trigger.validate(),
            Err(ConfigError::UnknownTone(20))
        ));

        trigger.set_tone(200);
        assert!(matches!(trigger.note(), Err(ConfigError::UnknownTone(200))));
    }

    #[test]
    fn test_zero_velocity_rate() {
        let mut trigger = Trigger::default();
        trigger.set_velocity_rate(0);
        assert!(matches!(
            trigger.validate(),
            Err(ConfigError::ZeroVelocityRate)
        ));
    }

    #[test]
    fn test_zero_threshold_is_allowed() {
        let mut trigger = Trigger::default();
        trigger.set_volume_threshold(0);
        assert!(trigger.validate().is_ok());
    }
}
