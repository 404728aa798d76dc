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
use serde::Deserialize;

use super::{audio::Audio, midi::Midi, trigger::Trigger, ConfigError, Overrides};
use crate::detector::DetectorConfig;

/// A complete trigger setup: where audio comes from, where notes go, and how
/// hits are detected.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Profile {
    /// Optional hostname restriction. If set, this profile only applies on
    /// hosts whose hostname matches this value. If omitted, matches any host.
    hostname: Option<String>,

    /// The audio input configuration.
    #[serde(default)]
    audio: Audio,

    /// The MIDI output configuration.
    #[serde(default)]
    midi: Midi,

    /// The onset detection configuration.
    #[serde(default)]
    trigger: Trigger,
}

impl Profile {
    /// Creates a new Profile.
    pub fn new(hostname: Option<String>, audio: Audio, midi: Midi, trigger: Trigger) -> Self {
        Profile {
            hostname,
            audio,
            midi,
            trigger,
        }
    }

    /// Returns the optional hostname constraint.
    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    /// Returns true if the profile applies on the given host.
    pub fn matches_host(&self, hostname: &str) -> bool {
        match self.hostname() {
            Some(h) => h == hostname,
            None => true,
        }
    }

    pub fn audio(&self) -> &Audio {
        &self.audio
    }

    pub fn midi(&self) -> &Midi {
        &self.midi
    }

    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    /// Applies command line overrides on top of the profile.
    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(tone) = overrides.tone {
            self.trigger.set_tone(tone);
        }
        if let Some(velocity_rate) = overrides.velocity_rate {
            self.trigger.set_velocity_rate(velocity_rate);
        }
        if let Some(volume_threshold) = overrides.volume_threshold {
            self.trigger.set_volume_threshold(volume_threshold);
        }
        if let Some(input_device) = &overrides.input_device {
            self.audio.set_device(input_device.clone());
        }
        if let Some(output_device) = &overrides.output_device {
            self.midi.set_device(output_device.clone());
        }
    }

    /// Validates the profile and builds the detector configuration from it.
    pub fn detector_config(&self) -> Result<DetectorConfig, ConfigError> {
        self.trigger.validate()?;
        // Checked here so a bad value fails before any device is opened.
        self.audio.stall_timeout()?;
        Ok(DetectorConfig::new(
            self.trigger.note()?,
            self.midi.channel()?,
            self.trigger.velocity_rate(),
            self.trigger.volume_threshold(),
            self.audio.chunk_size()?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use config::{Config, File, FileFormat};

    use super::*;

    fn parse(yaml: &str) -> Profile {
        Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize::<Profile>()
            .unwrap()
    }

    #[test]
    fn test_profile_deserialize() {
        let profile = parse(
            r#"
            hostname: drum-pi
            audio:
              device: USB Audio CODEC
              sample_rate: 48000
            midi:
              device: FLUID Synth
            trigger:
              tone: 38
              velocity_rate: 4
            "#,
        );

        assert_eq!(profile.hostname(), Some("drum-pi"));
        assert!(profile.matches_host("drum-pi"));
        assert!(!profile.matches_host("laptop"));
        assert_eq!(profile.audio().device(), "USB Audio CODEC");
        assert_eq!(profile.midi().device(), "FLUID Synth");
        assert_eq!(profile.trigger().tone(), 38);
        assert_eq!(profile.trigger().volume_threshold(), 10);

        let detector_config = profile.detector_config().unwrap();
        assert_eq!(detector_config.note().as_int(), 38);
        assert_eq!(detector_config.channel().as_int(), 9);
        assert_eq!(detector_config.velocity_rate(), 4);
        assert_eq!(detector_config.chunk_size(), 800);
    }

    #[test]
    fn test_profile_without_hostname_matches_any_host() {
        let profile = parse("trigger:\n  tone: 42");
        assert_eq!(profile.hostname(), None);
        assert!(profile.matches_host("anything"));
    }

    #[test]
    fn test_overrides() {
        let mut profile = parse("trigger:\n  tone: 42\n  volume_threshold: 3");
        profile.apply(&Overrides {
            tone: Some(49),
            input_device: Some("2".to_string()),
            output_device: None,
            velocity_rate: Some(8),
            volume_threshold: None,
        });

        assert_eq!(profile.trigger().tone(), 49);
        assert_eq!(profile.trigger().velocity_rate(), 8);
        assert_eq!(profile.trigger().volume_threshold(), 3);
        assert_eq!(profile.audio().device(), "2");
        assert_eq!(profile.midi().device(), "default");
    }

    #[test]
    fn test_invalid_profile() {
        let profile = parse("trigger:\n  tone: 12");
        assert!(matches!(
            profile.detector_config(),
            Err(ConfigError::UnknownTone(12))
        ));

        let profile = parse("midi:\n  channel: 20");
        assert!(matches!(
            profile.detector_config(),
            Err(ConfigError::Channel(20))
        ));
    }

    #[test]
    fn test_invalid_stall_timeout() {
        let profile = parse("audio:\n  stall_timeout: soon");
        match profile.detector_config() {
            Err(ConfigError::Duration(value, _)) => assert_eq!(value, "soon"),
            other => panic!("expected a duration error, got {:?}", other),
        }
    }
}
