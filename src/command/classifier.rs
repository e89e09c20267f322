//! Utterance classification
//!
//! Recognized speech is noisy and arrives with filler words ("please
//! start now"), so classification is a substring test against a fixed
//! keyword table rather than an exact match. The table is ordered: an
//! utterance containing keywords from several groups resolves to the
//! earliest group in the list, not the earliest keyword in the text.

use serde::{Deserialize, Serialize};

use crate::haptics::VibrationIntensity;

/// The closed command vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Start,
    Stop,
    Detect,
    Help,
    Direction,
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Start => write!(f, "start"),
            Command::Stop => write!(f, "stop"),
            Command::Detect => write!(f, "detect"),
            Command::Help => write!(f, "help"),
            Command::Direction => write!(f, "direction"),
        }
    }
}

impl Command {
    /// The spoken acknowledgment issued when this command is recognized
    pub fn acknowledgment(&self) -> &'static str {
        match self {
            Command::Start => "Starting obstacle detection",
            Command::Stop => "Stopping obstacle detection",
            Command::Detect => "Scanning for obstacles",
            Command::Help => "Available commands are: start, stop, detect, scan, and help.",
            Command::Direction => "Detecting direction",
        }
    }

    /// The haptic cue paired with the acknowledgment
    pub fn haptic_cue(&self) -> VibrationIntensity {
        match self {
            Command::Start => VibrationIntensity::Success,
            Command::Stop => VibrationIntensity::Warning,
            Command::Detect => VibrationIntensity::Medium,
            Command::Help => VibrationIntensity::Light,
            Command::Direction => VibrationIntensity::Medium,
        }
    }
}

/// Keyword groups in precedence order; first matching group wins
const KEYWORD_GROUPS: &[(Command, &[&str])] = &[
    (Command::Start, &["start", "begin"]),
    (Command::Stop, &["stop", "end", "pause"]),
    (Command::Detect, &["detect", "scan"]),
    (Command::Help, &["help", "assist"]),
    (Command::Direction, &["where", "direction", "location"]),
];

/// Classify a raw utterance into the command vocabulary
///
/// Returns `None` when no keyword matches; callers must drop `None`
/// silently (no handler, no announcement).
pub fn classify(utterance: &str) -> Option<Command> {
    let normalized = utterance.to_lowercase();
    let normalized = normalized.trim();

    for (command, keywords) in KEYWORD_GROUPS {
        if keywords.iter().any(|k| normalized.contains(k)) {
            return Some(*command);
        }
    }
    None
}
