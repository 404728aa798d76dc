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
//! Picking an audio or MIDI device from the command line or a config file.
use std::{error::Error, fmt};

/// How a device was asked for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selector {
    /// The platform's default device.
    Default,
    /// The position of the device in the device listing.
    Index(usize),
    /// The device name.
    Name(String),
}

impl From<&str> for Selector {
    fn from(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value == "default" {
            return Selector::Default;
        }

        match value.parse::<usize>() {
            Ok(index) => Selector::Index(index),
            Err(_) => Selector::Name(value.to_string()),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Default => write!(f, "default"),
            Selector::Index(index) => write!(f, "#{}", index),
            Selector::Name(name) => write!(f, "{}", name),
        }
    }
}

/// How a device name is compared against a Name selector.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum NameMatch {
    /// The trimmed device name must equal the selector.
    Exact,
    /// The device name must contain the selector, and only one device may match.
    Contains,
}

/// Picks a device out of the listing by index or name. Default selectors are
/// resolved by the caller, since each backend has its own notion of a default.
pub fn select<T, F>(
    devices: Vec<T>,
    selector: &Selector,
    name_match: NameMatch,
    name_of: F,
) -> Result<T, Box<dyn Error>>
where
    F: Fn(&T) -> &str,
{
    match selector {
        Selector::Default => Err("the default device must be resolved by the backend".into()),
        Selector::Index(index) => {
            let count = devices.len();
            devices.into_iter().nth(*index).ok_or_else(|| {
                format!("no device with id {} ({} devices available)", index, count).into()
            })
        }
        Selector::Name(name) => {
            let mut matches = devices
                .into_iter()
                .filter(|device| match name_match {
                    NameMatch::Exact => name_of(device).trim() == name,
                    NameMatch::Contains => name_of(device).contains(name.as_str()),
                })
                .collect::<Vec<T>>();

            if matches.is_empty() {
                return Err(format!("no device found with name {}", name).into());
            }
            if matches.len() > 1 {
                return Err(format!(
                    "found too many devices that match ({}), use a less ambiguous device name",
                    matches
                        .iter()
                        .map(|device| name_of(device).to_string())
                        .collect::<Vec<String>>()
                        .join(", ")
                )
                .into());
            }

            // We've verified that there's only one element in the vector, so this should be safe.
            Ok(matches.swap_remove(0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn devices() -> Vec<String> {
        vec![
            "Built-in Microphone".to_string(),
            "USB Audio CODEC".to_string(),
            "USB Audio Interface".to_string(),
        ]
    }

    #[test]
    fn test_parse_selector() {
        assert_eq!(Selector::from("default"), Selector::Default);
        assert_eq!(Selector::from(""), Selector::Default);
        assert_eq!(Selector::from(" 2 "), Selector::Index(2));
        assert_eq!(
            Selector::from("USB Audio CODEC"),
            Selector::Name("USB Audio CODEC".to_string())
        );
        assert_eq!(Selector::from("-1"), Selector::Name("-1".to_string()));
    }

    #[test]
    fn test_select_by_index() {
        let device = select(devices(), &Selector::Index(1), NameMatch::Exact, |d| d.as_str());
        assert_eq!(device.unwrap(), "USB Audio CODEC");

        let err = select(devices(), &Selector::Index(3), NameMatch::Exact, |d| d.as_str());
        assert!(err.unwrap_err().to_string().contains("no device with id 3"));
    }

    #[test]
    fn test_select_by_exact_name() {
        let selector = Selector::from("USB Audio Interface");
        let device = select(devices(), &selector, NameMatch::Exact, |d| d.as_str());
        assert_eq!(device.unwrap(), "USB Audio Interface");

        let selector = Selector::from("USB Audio");
        assert!(select(devices(), &selector, NameMatch::Exact, |d| d.as_str()).is_err());
    }

    #[test]
    fn test_select_by_partial_name() {
        let selector = Selector::from("Built-in");
        let device = select(devices(), &selector, NameMatch::Contains, |d| d.as_str());
        assert_eq!(device.unwrap(), "Built-in Microphone");
    }

    #[test]
    fn test_select_ambiguous_name() {
        let selector = Selector::from("USB");
        let err = select(devices(), &selector, NameMatch::Contains, |d| d.as_str()).unwrap_err();
        assert!(err.to_string().contains("too many devices"));
    }

    #[test]
    fn test_select_missing_name() {
        let selector = Selector::from("Nope");
        let err = select(devices(), &selector, NameMatch::Contains, |d| d.as_str()).unwrap_err();
        assert_eq!(err.to_string(), "no device found with name Nope");
    }
}
