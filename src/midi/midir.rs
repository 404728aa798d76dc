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

use midir::{MidiOutput, MidiOutputConnection, MidiOutputPort};
use tracing::{debug, info, span, Level};

use super::OutputDevice;
use crate::{
    config,
    detector::TriggerEvent,
    device::{self, NameMatch, Selector},
};

/// An open connection to a MIDI output port.
pub struct Sink {
    name: String,
    connection: Option<MidiOutputConnection>,
}

/// A named midir output port.
struct Port {
    name: String,
    port: MidiOutputPort,
}

fn list_ports(output: &MidiOutput) -> Result<Vec<Port>, Box<dyn Error>> {
    output
        .ports()
        .into_iter()
        .map(|port| -> Result<Port, Box<dyn Error>> {
            Ok(Port {
                name: output.port_name(&port)?,
                port,
            })
        })
        .collect()
}

pub fn list() -> Result<Vec<OutputDevice>, Box<dyn Error>> {
    let output = MidiOutput::new("cliphit output listing")?;
    Ok(list_ports(&output)?
        .into_iter()
        .enumerate()
        .map(|(id, port)| OutputDevice {
            id,
            name: port.name,
        })
        .collect())
}

impl Sink {
    /// Connects to the configured output port. The default is the first port.
    pub fn get(config: &config::Midi) -> Result<Sink, Box<dyn Error>> {
        let span = span!(Level::INFO, "open MIDI output (midir)");
        let _enter = span.enter();

        let output = MidiOutput::new("cliphit output")?;
        let ports = list_ports(&output)?;
        let selector = config.selector();
        let port = match selector {
            Selector::Default => ports
                .into_iter()
                .next()
                .ok_or("no MIDI output devices found")?,
            _ => device::select(ports, &selector, NameMatch::Contains, |port| {
                port.name.as_str()
            })?,
        };

        let connection = output.connect(&port.port, "cliphit trigger")?;
        info!(device = port.name, "Opened MIDI output.");

        Ok(Sink {
            name: port.name,
            connection: Some(connection),
        })
    }
}

impl super::Sink for Sink {
    fn note_on(&mut self, event: &TriggerEvent) -> Result<(), Box<dyn Error>> {
        let connection = self
            .connection
            .as_mut()
            .ok_or("MIDI output is already closed")?;

        debug!(device = self.name, event = %event, "Emitting event.");
        connection.send(&super::encode(event)?)?;
        Ok(())
    }
}

impl Drop for Sink {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.close();
            info!(device = self.name, "Closed MIDI output.");
        }
    }
}

impl fmt::Display for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Output)", self.name)
    }
}
