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

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config load/parse error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Tone {0} is not a General MIDI percussion note (35-81)")]
    UnknownTone(u8),

    #[error("Velocity rate must be at least 1")]
    ZeroVelocityRate,

    #[error("MIDI channel {0} is out of range (0-15)")]
    Channel(u8),

    #[error("Audio chunks are empty: {sample_rate}Hz split into {chunks_per_second} chunks per second")]
    EmptyChunk {
        sample_rate: u32,
        chunks_per_second: u32,
    },

    #[error("Invalid duration '{0}': {1}")]
    Duration(String, String),
}
