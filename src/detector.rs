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
//! Onset detection: turns a stream of PCM chunks into drum triggers.
//!
//! Each chunk is reduced to its mean absolute amplitude. A trigger fires when
//! that loudness rises above the previous chunk's loudness by more than the
//! configured threshold, so a steady background never re-triggers.
use std::fmt;

use midly::{
    live::LiveEvent,
    num::{u4, u7},
    MidiMessage,
};

/// The highest velocity a MIDI note on can carry.
pub const MAX_VELOCITY: u8 = 127;

/// The lowest velocity a trigger is sent with. A note on with a velocity of 0 is
/// read by receivers as a note off.
pub const MIN_TRIGGER_VELOCITY: u8 = 1;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum DetectorError {
    #[error("Audio chunk is empty")]
    EmptyChunk,

    #[error("Audio chunk has {actual} samples, expected {expected}")]
    ChunkSize { expected: usize, actual: usize },
}

/// A fixed-size slice of mono 16-bit PCM audio.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioChunk {
    samples: Vec<i16>,
}

impl AudioChunk {
    pub fn new(samples: Vec<i16>) -> AudioChunk {
        AudioChunk { samples }
    }

    /// A chunk of the given size with every sample set to the same value.
    pub fn filled(sample: i16, len: usize) -> AudioChunk {
        AudioChunk {
            samples: vec![sample; len],
        }
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// The mean absolute amplitude of a chunk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Loudness(u32);

impl Loudness {
    pub const SILENT: Loudness = Loudness(0);

    pub fn new(value: u32) -> Loudness {
        Loudness(value)
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Measures the chunk. The mean is truncated, matching an integer cast of the
    /// floating point mean.
    pub fn of(chunk: &AudioChunk) -> Result<Loudness, DetectorError> {
        if chunk.is_empty() {
            return Err(DetectorError::EmptyChunk);
        }

        let sum: u64 = chunk
            .samples()
            .iter()
            .map(|sample| u64::from(sample.unsigned_abs()))
            .sum();

        // |i16::MIN| is 32768, so the mean always fits.
        Ok(Loudness((sum / chunk.len() as u64) as u32))
    }

    /// How far this loudness rose above the previous one. Negative when it fell.
    fn rise_from(self, previous: Loudness) -> i64 {
        i64::from(self.0) - i64::from(previous.0)
    }
}

impl fmt::Display for Loudness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The only state carried from one chunk to the next.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DetectorState {
    previous_loudness: Loudness,
}

impl DetectorState {
    /// The state before any audio has been heard.
    pub fn new() -> DetectorState {
        DetectorState::default()
    }

    pub fn with_previous(previous_loudness: Loudness) -> DetectorState {
        DetectorState { previous_loudness }
    }

    pub fn previous_loudness(&self) -> Loudness {
        self.previous_loudness
    }
}

/// A single drum hit to send out as a MIDI note on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TriggerEvent {
    note: u7,
    velocity: u7,
    channel: u4,
}

impl TriggerEvent {
    pub fn new(note: u7, velocity: u7, channel: u4) -> TriggerEvent {
        TriggerEvent {
            note,
            velocity,
            channel,
        }
    }

    pub fn note(&self) -> u8 {
        self.note.as_int()
    }

    pub fn velocity(&self) -> u8 {
        self.velocity.as_int()
    }

    pub fn channel(&self) -> u8 {
        self.channel.as_int()
    }

    /// Converts the trigger into a note on live event.
    pub fn to_midi_event(&self) -> LiveEvent<'static> {
        LiveEvent::Midi {
            channel: self.channel,
            message: MidiMessage::NoteOn {
                key: self.note,
                vel: self.velocity,
            },
        }
    }
}

impl fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "note on (note={}, velocity={}, channel={})",
            self.note(),
            self.velocity(),
            self.channel()
        )
    }
}

/// Detector settings. These are fixed for the life of the process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DetectorConfig {
    /// The note to trigger.
    note: u7,
    /// The channel to send triggers on.
    channel: u4,
    /// Multiplier from loudness to velocity.
    velocity_rate: u32,
    /// How far loudness must rise, chunk over chunk, before a trigger fires.
    volume_threshold: u32,
    /// The number of samples in each chunk.
    chunk_size: usize,
}

impl DetectorConfig {
    pub fn new(
        note: u7,
        channel: u4,
        velocity_rate: u32,
        volume_threshold: u32,
        chunk_size: usize,
    ) -> DetectorConfig {
        DetectorConfig {
            note,
            channel,
            velocity_rate,
            volume_threshold,
            chunk_size,
        }
    }

    pub fn note(&self) -> u7 {
        self.note
    }

    pub fn channel(&self) -> u4 {
        self.channel
    }

    pub fn velocity_rate(&self) -> u32 {
        self.velocity_rate
    }

    pub fn volume_threshold(&self) -> u32 {
        self.volume_threshold
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn velocity(&self, volume: Loudness) -> u7 {
        let velocity = volume
            .value()
            .saturating_mul(self.velocity_rate)
            .clamp(u32::from(MIN_TRIGGER_VELOCITY), u32::from(MAX_VELOCITY));
        u7::from_int_lossy(velocity as u8)
    }
}

/// Decides whether the chunk is an onset.
///
/// Returns the trigger, if any, and the state to use for the next chunk. The
/// new state always holds this chunk's loudness, whether or not it triggered.
pub fn process(
    chunk: &AudioChunk,
    state: DetectorState,
    config: &DetectorConfig,
) -> Result<(Option<TriggerEvent>, DetectorState), DetectorError> {
    if chunk.is_empty() {
        return Err(DetectorError::EmptyChunk);
    }
    if chunk.len() != config.chunk_size {
        return Err(DetectorError::ChunkSize {
            expected: config.chunk_size,
            actual: chunk.len(),
        });
    }

    let volume = Loudness::of(chunk)?;
    let trigger = if volume.rise_from(state.previous_loudness) > i64::from(config.volume_threshold)
    {
        Some(TriggerEvent::new(
            config.note,
            config.velocity(volume),
            config.channel,
        ))
    } else {
        None
    };

    Ok((trigger, DetectorState::with_previous(volume)))
}

/// Owns the detector state and threads it through successive chunks.
pub struct OnsetDetector {
    config: DetectorConfig,
    state: DetectorState,
}

impl OnsetDetector {
    pub fn new(config: DetectorConfig) -> OnsetDetector {
        OnsetDetector {
            config,
            state: DetectorState::new(),
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn state(&self) -> DetectorState {
        self.state
    }

    /// Runs the chunk through the detector. The state is left untouched when the
    /// chunk is rejected.
    pub fn detect(&mut self, chunk: &AudioChunk) -> Result<Option<TriggerEvent>, DetectorError> {
        let (trigger, state) = process(chunk, self.state, &self.config)?;
        self.state = state;
        Ok(trigger)
    }
}
