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
use std::{
    error::Error,
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use tracing::info;

use crate::detector::TriggerEvent;

/// What a mock sink has seen. Shared so tests can inspect it after the sink is
/// gone.
#[derive(Default)]
pub struct Recorder {
    emitted: Mutex<Vec<Vec<u8>>>,
    closed: AtomicBool,
}

impl Recorder {
    /// Gets the raw messages emitted so far.
    pub fn emitted(&self) -> Vec<Vec<u8>> {
        self.emitted
            .lock()
            .expect("unable to get emitted lock")
            .clone()
    }

    /// Returns true once the sink has been dropped.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Relaxed)
    }
}

/// A MIDI sink that records what it is sent instead of playing it.
pub struct Sink {
    name: String,
    recorder: Arc<Recorder>,
    failure: Option<String>,
}

impl Sink {
    /// Gets the given mock sink.
    pub fn get(name: &str) -> Sink {
        Sink {
            name: name.to_string(),
            recorder: Arc::new(Recorder::default()),
            failure: None,
        }
    }

    /// A mock sink whose every send fails with the given message.
    pub fn failing(name: &str, message: &str) -> Sink {
        Sink {
            name: name.to_string(),
            recorder: Arc::new(Recorder::default()),
            failure: Some(message.to_string()),
        }
    }

    pub fn recorder(&self) -> Arc<Recorder> {
        self.recorder.clone()
    }
}

impl super::Sink for Sink {
    fn note_on(&mut self, event: &TriggerEvent) -> Result<(), Box<dyn Error>> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone().into());
        }

        info!(device = self.name, event = %event, "Emitting event.");
        let buf = super::encode(event)?;
        self.recorder
            .emitted
            .lock()
            .expect("unable to get emitted lock")
            .push(buf);
        Ok(())
    }
}

impl Drop for Sink {
    fn drop(&mut self) {
        self.recorder.closed.store(true, Ordering::Relaxed);
    }
}

impl fmt::Display for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}
