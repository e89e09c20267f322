//! Feedback facade
//!
//! The single entry point the UI layer calls. Wires classified commands
//! to caller-supplied handlers and exposes the semantic announcement
//! helpers, each a fixed pairing of one spoken message and one haptic
//! cue. Mode and recognition-session activity are kept in lockstep here:
//! the voice-centric mode starts listening, every other mode stops it.

use std::sync::{Arc, RwLock};

use tokio::sync::{broadcast, watch};
use tracing::debug;

use crate::command::{CommandHandlerTable, HandlerUpdate};
use crate::config::Config;
use crate::events::FeedbackEvent;
use crate::haptics::{HapticSignaler, VibrationIntensity};
use crate::platform::PlatformPorts;
use crate::session::{RecognitionSession, SessionHandle, SessionState};
use crate::speech::{AnnounceDone, AnnouncementOptions, SpeechAnnouncer};

/// The mode whose users rely on voice commands; selecting it activates
/// the recognition session
pub const MODE_TOTAL_BLINDNESS: &str = "Total Blindness";
pub const MODE_LOW_VISION: &str = "Low Vision";

const MSG_SYSTEM_START: &str = "Welcome to EYES. System initializing. Please wait.";
const MSG_SYSTEM_READY: &str =
    "System ready. Tap the button below to select a visibility mode.";
const MSG_MODE_SELECTION: &str = "Please select your visibility mode. Choose Low Vision mode \
     if you have partial vision, or Total Blindness mode if you have no vision.";
const MSG_LOW_VISION: &str = "Low Vision mode activated. This mode provides visual aids and \
     high contrast elements for users with partial vision. Tap the large button to start \
     detection.";
const MSG_TOTAL_BLINDNESS: &str = "Total Blindness mode activated. Full audio guidance and \
     voice commands are enabled. Say \"start\" to begin detection, or tap anywhere on the \
     screen. Say \"help\" for a list of available commands.";
const MSG_DETECTION_START: &str = "Detection started. The system will now alert you of any \
     obstacles in your path.";
const MSG_DETECTION_STOP: &str =
    "Detection stopped. Tap the button again to resume detection.";

/// The voice-command feedback engine's public surface
pub struct FeedbackFacade {
    announcer: SpeechAnnouncer,
    haptics: HapticSignaler,
    handlers: Arc<RwLock<CommandHandlerTable>>,
    session: SessionHandle,
    event_tx: broadcast::Sender<FeedbackEvent>,
    default_options: AnnouncementOptions,
}

impl FeedbackFacade {
    /// Wire the engine onto the platform ports and spawn its actor tasks
    pub fn spawn(platform: PlatformPorts, config: &Config) -> Self {
        let (event_tx, _) = broadcast::channel(64);

        let (announcer, announcer_task) =
            SpeechAnnouncer::new(platform.synthesis, &config.locale);
        tokio::spawn(announcer_task.run());

        let haptics = HapticSignaler::new(platform.haptics);
        let handlers = Arc::new(RwLock::new(CommandHandlerTable::new()));

        let (session, cmd_rx, session_handle) = RecognitionSession::new(
            platform.recognition,
            announcer.clone(),
            haptics.clone(),
            Arc::clone(&handlers),
            event_tx.clone(),
            config,
        );
        tokio::spawn(session.run(cmd_rx, platform.recognition_events));

        Self {
            announcer,
            haptics,
            handlers,
            session: session_handle,
            event_tx,
            default_options: AnnouncementOptions {
                rate: config.speech_rate,
                pitch: config.speech_pitch,
                interrupt: true,
            },
        }
    }

    /// Merge a partial handler registration: last write wins per
    /// command, unspecified commands keep their previous handler
    pub fn init_command_handlers(&self, update: HandlerUpdate) {
        if update.is_empty() {
            return;
        }
        if let Ok(mut table) = self.handlers.write() {
            table.merge(update);
        }
    }

    pub fn start_listening(&self) {
        self.session.start();
    }

    pub fn stop_listening(&self) {
        self.session.stop();
    }

    /// Current recognition session state snapshot
    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    /// Watch channel over session state transitions
    pub fn session_states(&self) -> watch::Receiver<SessionState> {
        self.session.state_changes()
    }

    /// Subscribe to engine observability events
    pub fn events(&self) -> broadcast::Receiver<FeedbackEvent> {
        self.event_tx.subscribe()
    }

    /// Speak arbitrary text; completion may be awaited but never needs
    /// to be
    pub fn speak(&self, text: impl Into<String>, options: AnnouncementOptions) -> AnnounceDone {
        self.announcer.speak(text, options)
    }

    /// Fire a haptic cue; best-effort, never fails the caller
    pub fn signal(&self, intensity: VibrationIntensity) {
        self.haptics.signal(intensity);
    }

    pub fn announce_system_start(&self) -> AnnounceDone {
        self.announce(MSG_SYSTEM_START, VibrationIntensity::Medium)
    }

    pub fn announce_system_ready(&self) -> AnnounceDone {
        self.announce(MSG_SYSTEM_READY, VibrationIntensity::Success)
    }

    /// Announce the selected mode and bring the recognition session in
    /// line with it: the voice-centric mode listens, all others do not.
    /// Unknown mode names are spoken verbatim.
    pub fn announce_mode(&self, mode: &str) -> AnnounceDone {
        let message = match mode {
            MODE_LOW_VISION => MSG_LOW_VISION,
            MODE_TOTAL_BLINDNESS => MSG_TOTAL_BLINDNESS,
            other => other,
        };
        let done = self.announce(message, VibrationIntensity::Success);

        if mode == MODE_TOTAL_BLINDNESS {
            self.start_listening();
        } else {
            self.stop_listening();
        }
        done
    }

    pub fn announce_mode_selection(&self) -> AnnounceDone {
        self.announce(MSG_MODE_SELECTION, VibrationIntensity::Medium)
    }

    pub fn announce_detection_start(&self) -> AnnounceDone {
        self.announce(MSG_DETECTION_START, VibrationIntensity::Success)
    }

    pub fn announce_detection_stop(&self) -> AnnounceDone {
        self.announce(MSG_DETECTION_STOP, VibrationIntensity::Warning)
    }

    /// Announce a detected obstacle. Distance and direction are caller
    /// strings and are formatted into the message as-is.
    pub fn obstacle_alert(&self, distance_meters: &str, direction: &str) -> AnnounceDone {
        let message = format!("Obstacle detected {} meters {}", distance_meters, direction);
        debug!(distance_meters, direction, "obstacle alert");
        let _ = self.event_tx.send(FeedbackEvent::ObstacleAnnounced {
            distance_meters: distance_meters.to_string(),
            direction: direction.to_string(),
        });
        self.announce(&message, VibrationIntensity::Warning)
    }

    fn announce(&self, message: &str, intensity: VibrationIntensity) -> AnnounceDone {
        let done = self.announcer.speak(message, self.default_options);
        self.haptics.signal(intensity);
        done
    }
}
