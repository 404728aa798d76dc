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
use std::error::Error;
use std::path::PathBuf;

use clap::{crate_version, Parser, Subcommand};
use cliphit::config::{resolve_hostname, Overrides, Settings};
use cliphit::playsync::CancelHandle;
use cliphit::trigger::Trigger;
use cliphit::{audio, midi, percussion};
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "Make anything into a drum!"
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists the available audio input devices.
    Devices {},
    /// Lists the available MIDI output devices.
    MidiDevices {},
    /// Lists the General MIDI percussion notes that can be triggered.
    Tones {},
    /// Listens for hits and sends them out as MIDI notes until interrupted.
    Start {
        /// The path to a cliphit config file.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Percussion note number. Defaults to 36, Bass Drum 1. See the tones command.
        #[arg(short, long)]
        tone: Option<u8>,
        /// Input audio device id or name.
        #[arg(short, long)]
        input_device: Option<String>,
        /// Output MIDI device id or name.
        #[arg(short, long)]
        output_midi_device: Option<String>,
        /// Multiplier from loudness to note velocity. Defaults to 5.
        #[arg(short = 'r', long)]
        volume_rate: Option<u32>,
        /// How far loudness must jump to count as a hit. Defaults to 10.
        #[arg(short, long)]
        volume_threshold: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Devices {} => {
            let devices = audio::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::MidiDevices {} => {
            let devices = midi::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::Tones {} => {
            println!("Tones:");
            for (note, name) in percussion::notes() {
                println!("- {}: {}", note, name);
            }
        }
        Commands::Start {
            config,
            tone,
            input_device,
            output_midi_device,
            volume_rate,
            volume_threshold,
        } => {
            let settings = match config {
                Some(path) => Settings::load(&path)?,
                None => Settings::default(),
            };
            let mut profile = settings.profile_for_host(&resolve_hostname());
            profile.apply(&Overrides {
                tone,
                input_device,
                output_device: output_midi_device,
                velocity_rate: volume_rate,
                volume_threshold,
            });

            // Check everything before any device is opened.
            let detector_config = profile.detector_config()?;
            println!(
                "Tone: {} ({})",
                profile.trigger().tone(),
                profile.trigger().tone_name()?
            );
            println!("Input Device: {}", profile.audio().selector());
            println!("Output MIDI Device: {}", profile.midi().selector());

            let sink = midi::get_sink(profile.midi())?;
            let source = audio::get_source(profile.audio())?;
            let trigger = Trigger::new(source, sink, detector_config)?;

            let cancel_handle = CancelHandle::new();
            let mut trigger_loop = {
                let cancel_handle = cancel_handle.clone();
                tokio::task::spawn_blocking(move || {
                    trigger.run(&cancel_handle).map_err(|e| e.to_string())
                })
            };

            let result = tokio::select! {
                result = &mut trigger_loop => result?,
                _ = signal::ctrl_c() => {
                    info!("Interrupted, shutting down.");
                    cancel_handle.cancel();
                    trigger_loop.await?
                }
            };

            let summary = result?;
            println!("Stopped after {}.", summary);
        }
    }

    Ok(())
}
