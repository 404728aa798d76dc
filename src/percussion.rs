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
//! General MIDI percussion notes.

/// The General MIDI percussion channel (channel 10, zero based).
pub const PERCUSSION_CHANNEL: u8 = 9;

/// The default tone, Bass Drum 1.
pub const DEFAULT_TONE: u8 = 36;

const FIRST_NOTE: u8 = 35;

const NAMES: [&str; 47] = [
    "Bass Drum 2",
    "Bass Drum 1",
    "Side Stick",
    "Snare Drum 1",
    "Hand Clap",
    "Snare Drum 2",
    "Low Tom 2",
    "Closed Hi-hat",
    "Low Tom 1",
    "Pedal Hi-hat",
    "Mid Tom 2",
    "Open Hi-hat",
    "Mid Tom 1",
    "High Tom 2",
    "Crash Cymbal 1",
    "High Tom 1",
    "Ride Cymbal 1",
    "Chinese Cymbal",
    "Ride Bell",
    "Tambourine",
    "Splash Cymbal",
    "Cowbell",
    "Crash Cymbal 2",
    "Vibra Slap",
    "Ride Cymbal 2",
    "High Bongo",
    "Low Bongo",
    "Mute High Conga",
    "Open High Conga",
    "Low Conga",
    "High Timbale",
    "Low Timbale",
    "High Agogo",
    "Low Agogo",
    "Cabasa",
    "Maracas",
    "Short Whistle",
    "Long Whistle",
    "Short Guiro",
    "Long Guiro",
    "Claves",
    "High Wood Block",
    "Low Wood Block",
    "Mute Cuica",
    "Open Cuica",
    "Mute Triangle",
    "Open Triangle",
];

/// Returns the instrument name of the note, or None if the note isn't in the
/// percussion map.
pub fn name(note: u8) -> Option<&'static str> {
    note.checked_sub(FIRST_NOTE)
        .and_then(|index| NAMES.get(usize::from(index)))
        .copied()
}

/// All percussion notes with their names, lowest note first.
pub fn notes() -> impl Iterator<Item = (u8, &'static str)> {
    (FIRST_NOTE..).zip(NAMES.iter().copied())
}
