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
    collections::VecDeque,
    error::Error,
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use crate::detector::AudioChunk;

enum Read {
    Chunk(AudioChunk),
    Fail(String),
}

/// A scripted audio source. Plays back its chunks in order and then ends.
pub struct Source {
    name: String,
    chunk_size: usize,
    script: VecDeque<Read>,
    closed: Arc<AtomicBool>,
}

impl Source {
    /// Gets the given mock source with nothing scripted.
    pub fn get(name: &str, chunk_size: usize) -> Source {
        Source {
            name: name.to_string(),
            chunk_size,
            script: VecDeque::new(),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Queues a chunk to be returned.
    pub fn with_chunk(mut self, chunk: AudioChunk) -> Source {
        self.script.push_back(Read::Chunk(chunk));
        self
    }

    /// Queues a chunk of the source's size with every sample at the given value.
    pub fn with_level(self, sample: i16) -> Source {
        let chunk_size = self.chunk_size;
        self.with_chunk(AudioChunk::filled(sample, chunk_size))
    }

    /// Queues a read failure.
    pub fn with_failure(mut self, message: &str) -> Source {
        self.script.push_back(Read::Fail(message.to_string()));
        self
    }

    /// A flag that is set once the source has been dropped.
    pub fn closed(&self) -> Arc<AtomicBool> {
        self.closed.clone()
    }
}

impl super::Source for Source {
    fn read_chunk(&mut self) -> Result<Option<AudioChunk>, Box<dyn Error>> {
        match self.script.pop_front() {
            Some(Read::Chunk(chunk)) => Ok(Some(chunk)),
            Some(Read::Fail(message)) => Err(super::AudioError::Stream(message).into()),
            None => Ok(None),
        }
    }

    fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

impl Drop for Source {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::Relaxed);
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::Source as _;

    #[test]
    fn test_script_order() {
        let mut source = Source::get("mock-input", 4)
            .with_level(10)
            .with_chunk(AudioChunk::new(vec![1, -1, 1, -1]))
            .with_failure("unplugged");

        assert_eq!(
            source.read_chunk().unwrap(),
            Some(AudioChunk::filled(10, 4))
        );
        assert_eq!(
            source.read_chunk().unwrap(),
            Some(AudioChunk::new(vec![1, -1, 1, -1]))
        );
        assert!(source
            .read_chunk()
            .unwrap_err()
            .to_string()
            .contains("unplugged"));
        assert_eq!(source.read_chunk().unwrap(), None);
    }

    #[test]
    fn test_closed_on_drop() {
        let source = Source::get("mock-input", 4);
        let closed = source.closed();
        assert!(!closed.load(Ordering::Relaxed));
        drop(source);
        assert!(closed.load(Ordering::Relaxed));
    }
}
