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
//! The trigger loop: audio in, onsets detected, notes out.
use std::{error::Error, fmt};

use tracing::{debug, info, span, Level};

use crate::{
    audio,
    detector::{DetectorConfig, OnsetDetector},
    midi,
    playsync::CancelHandle,
};

/// Counts from a finished trigger loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    /// Chunks read from the audio source.
    pub chunks: u64,
    /// Notes sent to the MIDI sink.
    pub triggers: u64,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} chunks, {} triggers", self.chunks, self.triggers)
    }
}

/// Wires an audio source through the onset detector into a MIDI sink.
pub struct Trigger {
    source: Box<dyn audio::Source>,
    sink: Box<dyn midi::Sink>,
    detector: OnsetDetector,
}

impl Trigger {
    pub fn new(
        source: Box<dyn audio::Source>,
        sink: Box<dyn midi::Sink>,
        config: DetectorConfig,
    ) -> Result<Trigger, Box<dyn Error>> {
        if source.chunk_size() != config.chunk_size() {
            return Err(format!(
                "audio source delivers {} sample chunks, detector expects {}",
                source.chunk_size(),
                config.chunk_size()
            )
            .into());
        }

        Ok(Trigger {
            source,
            sink,
            detector: OnsetDetector::new(config),
        })
    }

    /// Runs until cancelled, until the source runs dry, or until the source or
    /// sink fails. The source and sink are released when this returns, on every
    /// path.
    pub fn run(mut self, cancel_handle: &CancelHandle) -> Result<Summary, Box<dyn Error>> {
        let span = span!(Level::INFO, "trigger loop");
        let _enter = span.enter();

        info!(
            source = %self.source,
            sink = %self.sink,
            note = self.detector.config().note().as_int(),
            velocity_rate = self.detector.config().velocity_rate(),
            volume_threshold = self.detector.config().volume_threshold(),
            "Listening for hits."
        );

        let mut summary = Summary::default();
        while !cancel_handle.is_cancelled() {
            let chunk = match self.source.read_chunk()? {
                Some(chunk) => chunk,
                None => {
                    info!("Audio source has ended.");
                    break;
                }
            };
            summary.chunks += 1;

            if let Some(event) = self.detector.detect(&chunk)? {
                debug!(
                    loudness = %self.detector.state().previous_loudness(),
                    velocity = event.velocity(),
                    "Hit detected."
                );
                self.sink.note_on(&event)?;
                summary.triggers += 1;
            }
        }

        info!(%summary, "Trigger loop stopped.");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use midly::num::{u4, u7};

    use super::*;
    use crate::{audio::mock::Source, detector::AudioChunk, midi::mock::Sink};

    const CHUNK_SIZE: usize = 735;

    fn detector_config() -> DetectorConfig {
        DetectorConfig::new(u7::new(38), u4::new(9), 5, 10, CHUNK_SIZE)
    }

    #[test]
    fn test_hits_become_note_ons() {
        let source = Source::get("mock-input", CHUNK_SIZE)
            .with_level(0)
            .with_level(20)
            .with_level(20)
            .with_level(-31)
            .with_level(2)
            .with_level(55)
            .with_level(60);
        let sink = Sink::get("mock-output");
        let recorder = sink.recorder();

        let trigger = Trigger::new(Box::new(source), Box::new(sink), detector_config()).unwrap();
        let summary = trigger.run(&CancelHandle::new()).unwrap();

        assert_eq!(
            summary,
            Summary {
                chunks: 7,
                triggers: 3
            }
        );
        assert_eq!(
            recorder.emitted(),
            vec![vec![0x99, 38, 100], vec![0x99, 38, 127], vec![0x99, 38, 127]]
        );
        assert!(recorder.is_closed());
    }

    #[test]
    fn test_steady_noise_triggers_once() {
        let mut source = Source::get("mock-input", CHUNK_SIZE);
        for _ in 0..100 {
            source = source.with_level(400);
        }
        let sink = Sink::get("mock-output");
        let recorder = sink.recorder();

        let trigger = Trigger::new(Box::new(source), Box::new(sink), detector_config()).unwrap();
        let summary = trigger.run(&CancelHandle::new()).unwrap();

        assert_eq!(summary.chunks, 100);
        assert_eq!(recorder.emitted().len(), 1);
    }

    #[test]
    fn test_cancelled_before_start() {
        let source = Source::get("mock-input", CHUNK_SIZE).with_level(100);
        let sink = Sink::get("mock-output");
        let recorder = sink.recorder();

        let cancel_handle = CancelHandle::new();
        cancel_handle.cancel();

        let trigger = Trigger::new(Box::new(source), Box::new(sink), detector_config()).unwrap();
        assert_eq!(trigger.run(&cancel_handle).unwrap(), Summary::default());
        assert!(recorder.emitted().is_empty());
        assert!(recorder.is_closed());
    }

    #[test]
    fn test_source_failure_releases_devices() {
        let source = Source::get("mock-input", CHUNK_SIZE)
            .with_level(100)
            .with_failure("device unplugged")
            .with_level(0);
        let source_closed = source.closed();
        let sink = Sink::get("mock-output");
        let recorder = sink.recorder();

        let trigger = Trigger::new(Box::new(source), Box::new(sink), detector_config()).unwrap();
        let err = trigger.run(&CancelHandle::new()).unwrap_err();

        assert!(err.to_string().contains("device unplugged"));
        assert_eq!(recorder.emitted(), vec![vec![0x99, 38, 127]]);
        assert!(recorder.is_closed());
        assert!(source_closed.load(std::sync::atomic::Ordering::Relaxed));
    }

    #[test]
    fn test_sink_failure_stops_loop() {
        let source = Source::get("mock-input", CHUNK_SIZE)
            .with_level(100)
            .with_level(0);
        let source_closed = source.closed();
        let sink = Sink::failing("mock-output", "port went away");
        let recorder = sink.recorder();

        let trigger = Trigger::new(Box::new(source), Box::new(sink), detector_config()).unwrap();
        let err = trigger.run(&CancelHandle::new()).unwrap_err();

        assert_eq!(err.to_string(), "port went away");
        assert!(recorder.is_closed());
        assert!(source_closed.load(std::sync::atomic::Ordering::Relaxed));
    }

    #[test]
    fn test_undersized_chunk_is_an_error() {
        let source =
            Source::get("mock-input", CHUNK_SIZE).with_chunk(AudioChunk::new(vec![500; 10]));
        let sink = Sink::get("mock-output");
        let recorder = sink.recorder();

        let trigger = Trigger::new(Box::new(source), Box::new(sink), detector_config()).unwrap();
        let err = trigger.run(&CancelHandle::new()).unwrap_err();

        assert!(err.to_string().contains("expected 735"));
        assert!(recorder.emitted().is_empty());
    }

    #[test]
    fn test_chunk_size_mismatch() {
        let source = Source::get("mock-input", 800);
        let sink = Sink::get("mock-output");
        let recorder = sink.recorder();

        assert!(Trigger::new(Box::new(source), Box::new(sink), detector_config()).is_err());
        assert!(recorder.is_closed());
    }
}
