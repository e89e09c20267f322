//! eyes-feedback: voice-command feedback engine for the EYES
//! accessibility assistant
//!
//! The engine gives a visually-impaired user spoken, haptic, and
//! voice-command feedback around obstacle detection:
//! - a continuous speech-recognition session with auto-recovery,
//! - classification of free-form utterances into a fixed command
//!   vocabulary dispatched to registered handlers,
//! - serialized speech synthesis with interrupt semantics,
//! - haptic cues keyed by feedback event type.
//!
//! The UI layer talks to [`FeedbackFacade`] only; platform speech and
//! haptic APIs sit behind the ports in [`platform`].

pub mod command;
pub mod config;
pub mod events;
pub mod facade;
pub mod haptics;
pub mod lifecycle;
pub mod platform;
pub mod session;
pub mod sim;
pub mod speech;

pub use command::{classify, Command, CommandHandler, CommandHandlerTable, HandlerUpdate};
pub use config::Config;
pub use events::FeedbackEvent;
pub use facade::{FeedbackFacade, MODE_LOW_VISION, MODE_TOTAL_BLINDNESS};
pub use haptics::{HapticSignaler, VibrationIntensity};
pub use session::{FaultReason, SessionHandle, SessionState};
pub use speech::{AnnounceDone, AnnouncementOptions, SpeakOutcome, SpeechAnnouncer};
