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
use std::path::Path;

use serde::Deserialize;
use tracing::info;

pub mod audio;
pub mod error;
mod hostname;
pub mod midi;
pub mod profile;
pub mod trigger;

pub use self::audio::Audio;
pub use self::error::ConfigError;
pub use self::hostname::resolve_hostname;
pub use self::midi::Midi;
pub use self::profile::Profile;
pub use self::trigger::Trigger;

/// The contents of a cliphit configuration file.
///
/// The top level settings apply when none of the listed profiles match the
/// current host.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Settings {
    /// Host specific profiles, checked in order.
    #[serde(default)]
    profiles: Vec<Profile>,

    #[serde(default)]
    audio: Audio,

    #[serde(default)]
    midi: Midi,

    #[serde(default)]
    trigger: Trigger,
}

/// Values given on the command line. These win over the configuration file.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub tone: Option<u8>,
    pub input_device: Option<String>,
    pub output_device: Option<String>,
    pub velocity_rate: Option<u32>,
    pub volume_threshold: Option<u32>,
}

impl Settings {
    pub fn new(profiles: Vec<Profile>, audio: Audio, midi: Midi, trigger: Trigger) -> Settings {
        Settings {
            profiles,
            audio,
            midi,
            trigger,
        }
    }

    /// Loads the settings from a YAML file.
    pub fn load(path: &Path) -> Result<Settings, ConfigError> {
        Ok(::config::Config::builder()
            .add_source(::config::File::from(path))
            .build()?
            .try_deserialize::<Settings>()?)
    }

    /// Returns the first profile that applies to the host, or the top level
    /// settings if none do.
    pub fn profile_for_host(&self, hostname: &str) -> Profile {
        match self
            .profiles
            .iter()
            .find(|profile| profile.matches_host(hostname))
        {
            Some(profile) => {
                info!(
                    hostname,
                    profile_hostname = profile.hostname(),
                    "Using matching profile."
                );
                profile.clone()
            }
            None => Profile::new(
                None,
                self.audio.clone(),
                self.midi.clone(),
                self.trigger.clone(),
            ),
        }
    }
}
