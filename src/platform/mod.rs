//! Platform capability layer
//!
//! The engine never talks to a speech or haptic API directly. Each
//! platform surface is a port: a recognition backend with an event
//! channel, an async synthesis backend, and a haptic backend. The
//! capability variant is selected once at startup.

mod console;
mod simulated;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

pub use console::{ConsoleHaptics, ConsoleSynthesis};
pub use simulated::{
    FailingSynthesis, SimulatedHaptics, SimulatedRecognition, SimulatedSynthesis,
    UnavailableRecognition,
};

/// Recognition capability of the running platform, selected at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Browser speech recognition (webkitSpeechRecognition-style)
    WebRecognition,
    /// Native OS speech recognition
    NativeRecognition,
    /// No continuous recognition available; start/stop are no-ops
    Unavailable,
}

/// Error classification for recognition engine faults
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultCode {
    /// Gap in ambient audio; expected, not a fault
    NoSpeech,
    /// Recognition was aborted, e.g. another session claimed the device
    Aborted,
    /// Network-backed recognizer lost connectivity
    Network,
    /// Anything else the platform reports
    Other(String),
}

impl FaultCode {
    /// Map a platform error code string onto the fault taxonomy
    pub fn from_code(code: &str) -> Self {
        match code {
            "no-speech" => Self::NoSpeech,
            "aborted" => Self::Aborted,
            "network" => Self::Network,
            other => Self::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for FaultCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FaultCode::NoSpeech => write!(f, "no-speech"),
            FaultCode::Aborted => write!(f, "aborted"),
            FaultCode::Network => write!(f, "network"),
            FaultCode::Other(code) => write!(f, "{}", code),
        }
    }
}

/// Events the recognition engine delivers to the session
#[derive(Debug, Clone)]
pub enum RecognitionEvent {
    /// The engine confirmed it is actively listening
    Activated,
    /// A recognized transcript; only final results are dispatched
    Result { transcript: String, is_final: bool },
    /// The engine reported an error
    Error(FaultCode),
    /// The engine stopped listening on its own or after a stop request
    Ended,
}

/// Errors from the recognition backend
#[derive(Debug, thiserror::Error)]
pub enum RecognitionError {
    #[error("recognition engine rejected start: {0}")]
    StartRejected(String),

    #[error("continuous recognition is not available on this platform")]
    Unsupported,
}

/// Errors from the synthesis backend
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("synthesis engine unavailable")]
    EngineUnavailable,

    #[error("synthesis failed: {0}")]
    Synthesis(String),
}

/// Errors from the haptic backend
#[derive(Debug, thiserror::Error)]
pub enum HapticError {
    #[error("haptic pattern rejected: {0}")]
    Fire(String),
}

/// A voice exposed by the platform's synthesis catalog
#[derive(Debug, Clone)]
pub struct VoiceInfo {
    pub id: String,
    pub name: String,
    pub lang: String,
}

/// Parameters handed to the synthesis backend per utterance
#[derive(Debug, Clone)]
pub struct VoiceParams {
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    /// Preferred voice id, if the catalog yielded one
    pub voice: Option<String>,
}

/// Continuous speech recognition port
///
/// Implementations deliver [`RecognitionEvent`]s on the channel handed
/// out at construction. `start` and `stop` are fire-and-forget from the
/// session's point of view; confirmation arrives as events.
pub trait RecognitionBackend: Send + Sync {
    fn capability(&self) -> Capability;

    fn start(&self) -> Result<(), RecognitionError>;

    fn stop(&self);
}

/// Speech synthesis port
///
/// `speak` resolves when the utterance has been fully produced. `cancel`
/// is fire-and-forget; a canceled `speak` call may resolve either way.
#[async_trait]
pub trait SynthesisBackend: Send + Sync {
    async fn speak(&self, text: &str, params: &VoiceParams) -> Result<(), SpeechError>;

    fn cancel(&self);

    /// Voice catalog; platforms without one return an empty list
    fn voices(&self) -> Vec<VoiceInfo> {
        Vec::new()
    }
}

/// Device vibration patterns, impact-style and notification-style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HapticPattern {
    ImpactLight,
    ImpactMedium,
    ImpactHeavy,
    NotifySuccess,
    NotifyWarning,
    NotifyError,
}

/// Haptic feedback port
pub trait HapticBackend: Send + Sync {
    fn fire(&self, pattern: HapticPattern) -> Result<(), HapticError>;
}

/// The set of platform ports the engine is wired with at startup
pub struct PlatformPorts {
    pub recognition: Arc<dyn RecognitionBackend>,
    pub recognition_events: mpsc::UnboundedReceiver<RecognitionEvent>,
    pub synthesis: Arc<dyn SynthesisBackend>,
    /// `None` on platforms without haptic capability
    pub haptics: Option<Arc<dyn HapticBackend>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_code_mapping() {
        assert_eq!(FaultCode::from_code("no-speech"), FaultCode::NoSpeech);
        assert_eq!(FaultCode::from_code("aborted"), FaultCode::Aborted);
        assert_eq!(FaultCode::from_code("network"), FaultCode::Network);
        assert_eq!(
            FaultCode::from_code("audio-capture"),
            FaultCode::Other("audio-capture".to_string())
        );
    }

    #[test]
    fn test_fault_code_display_round_trip() {
        for code in ["no-speech", "aborted", "network", "service-not-allowed"] {
            assert_eq!(FaultCode::from_code(code).to_string(), code);
        }
    }
}
