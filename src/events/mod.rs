//! Observability events for the feedback engine
//!
//! Broadcast to any interested subscriber (the demo daemon logs them);
//! serialized form is stable for external consumers.

use serde::{Deserialize, Serialize};

use crate::command::Command;

/// Events emitted by the engine as it runs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedbackEvent {
    /// The recognition session became active
    ListeningStarted,

    /// The recognition session stopped listening
    ListeningStopped {
        /// Milliseconds the session spent listening
        duration_ms: u64,
    },

    /// A final transcript classified into the command vocabulary
    CommandRecognized { command: Command },

    /// An engine restart was scheduled after an unsolicited end or error
    RestartScheduled { delay_ms: u64 },

    /// The session gave up restarting and requires an explicit start
    SessionFaulted { reason: String },

    /// An obstacle alert was announced
    ObstacleAnnounced {
        distance_meters: String,
        direction: String,
    },
}

impl std::fmt::Display for FeedbackEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedbackEvent::ListeningStarted => write!(f, "LISTENING_STARTED"),
            FeedbackEvent::ListeningStopped { duration_ms } => {
                write!(f, "LISTENING_STOPPED ({}ms)", duration_ms)
            }
            FeedbackEvent::CommandRecognized { command } => {
                write!(f, "COMMAND_RECOGNIZED ({})", command)
            }
            FeedbackEvent::RestartScheduled { delay_ms } => {
                write!(f, "RESTART_SCHEDULED (+{}ms)", delay_ms)
            }
            FeedbackEvent::SessionFaulted { reason } => {
                write!(f, "SESSION_FAULTED ({})", reason)
            }
            FeedbackEvent::ObstacleAnnounced {
                distance_meters,
                direction,
            } => {
                write!(f, "OBSTACLE ({}m {})", distance_meters, direction)
            }
        }
    }
}
