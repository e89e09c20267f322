//! Core session state machine
//!
//! Handles transitions between Idle, Starting, Listening, Stopping, and
//! Faulted based on caller commands and recognition engine events. All
//! mutation sources, caller commands, engine callbacks, and the restart
//! timer, funnel through one `select!` loop, so no two transitions are
//! ever applied concurrently and a late engine callback cannot restart a
//! session the caller has already stopped.

use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info, warn};

use crate::command::{classify, CommandHandlerTable};
use crate::config::Config;
use crate::events::FeedbackEvent;
use crate::haptics::HapticSignaler;
use crate::platform::{Capability, FaultCode, RecognitionBackend, RecognitionEvent};
use crate::speech::{AnnouncementOptions, SpeechAnnouncer};

const MSG_ACTIVATED: &str = "Voice recognition is active";
const MSG_DEACTIVATED: &str = "Voice recognition deactivated";
const MSG_NETWORK: &str = "Network error. Please check your internet connection.";

/// The five possible states of a recognition session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Not listening, waiting for an explicit start
    Idle,
    /// Start issued, waiting for the engine to confirm activation
    Starting,
    /// Actively listening; final transcripts are dispatched
    Listening,
    /// Stop issued, winding the engine down
    Stopping,
    /// Restart gave up; caller must explicitly start again
    Faulted(FaultReason),
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Idle => write!(f, "Idle"),
            SessionState::Starting => write!(f, "Starting"),
            SessionState::Listening => write!(f, "Listening"),
            SessionState::Stopping => write!(f, "Stopping"),
            SessionState::Faulted(reason) => write!(f, "Faulted({})", reason),
        }
    }
}

/// Why a session entered the Faulted state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultReason {
    /// The engine rejected the initial start
    StartFailed,
    /// An automatic restart attempt failed
    RestartFailed,
}

impl std::fmt::Display for FaultReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FaultReason::StartFailed => write!(f, "start failed"),
            FaultReason::RestartFailed => write!(f, "restart failed"),
        }
    }
}

/// Caller commands applied to the session
#[derive(Debug, Clone, Copy)]
pub enum SessionCommand {
    Start,
    Stop,
}

/// Cheap-to-clone handle for driving and observing a session
#[derive(Clone)]
pub struct SessionHandle {
    cmd_tx: mpsc::UnboundedSender<SessionCommand>,
    state_rx: watch::Receiver<SessionState>,
}

impl SessionHandle {
    pub fn start(&self) {
        let _ = self.cmd_tx.send(SessionCommand::Start);
    }

    pub fn stop(&self) {
        let _ = self.cmd_tx.send(SessionCommand::Stop);
    }

    /// Current session state snapshot
    pub fn state(&self) -> SessionState {
        self.state_rx.borrow().clone()
    }

    /// Watch channel for state transitions
    pub fn state_changes(&self) -> watch::Receiver<SessionState> {
        self.state_rx.clone()
    }
}

/// The state machine that manages one continuous recognition session
pub struct RecognitionSession {
    /// Current state, owned exclusively by this machine
    state: SessionState,
    /// Whether the caller wants the session active (survives engine
    /// restarts, cleared by stop and by terminal faults)
    intent_active: bool,
    /// When the current Listening state was entered
    listening_since: Option<Instant>,
    /// Deadline of the pending restart, if one is scheduled
    restart_at: Option<tokio::time::Instant>,
    restart_delay: Duration,
    error_backoff: Duration,
    backend: Arc<dyn RecognitionBackend>,
    announcer: SpeechAnnouncer,
    haptics: HapticSignaler,
    handlers: Arc<RwLock<CommandHandlerTable>>,
    announce_options: AnnouncementOptions,
    event_tx: broadcast::Sender<FeedbackEvent>,
    state_tx: watch::Sender<SessionState>,
}

impl RecognitionSession {
    /// Create a session and the handle used to drive it; the caller
    /// spawns [`RecognitionSession::run`] with the returned command
    /// receiver and the platform's recognition event receiver
    pub fn new(
        backend: Arc<dyn RecognitionBackend>,
        announcer: SpeechAnnouncer,
        haptics: HapticSignaler,
        handlers: Arc<RwLock<CommandHandlerTable>>,
        event_tx: broadcast::Sender<FeedbackEvent>,
        config: &Config,
    ) -> (Self, mpsc::UnboundedReceiver<SessionCommand>, SessionHandle) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(SessionState::Idle);

        let session = Self {
            state: SessionState::Idle,
            intent_active: false,
            listening_since: None,
            restart_at: None,
            restart_delay: config.restart_delay,
            error_backoff: config.error_backoff,
            backend,
            announcer,
            haptics,
            handlers,
            announce_options: AnnouncementOptions {
                rate: config.speech_rate,
                pitch: config.speech_pitch,
                interrupt: true,
            },
            event_tx,
            state_tx,
        };

        (session, cmd_rx, SessionHandle { cmd_tx, state_rx })
    }

    /// Current state (exposed for direct-drive tests)
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Run the session, serializing commands, engine events, and the
    /// restart timer through a single dispatch point
    pub async fn run(
        mut self,
        mut cmd_rx: mpsc::UnboundedReceiver<SessionCommand>,
        mut engine_rx: mpsc::UnboundedReceiver<RecognitionEvent>,
    ) {
        info!(capability = ?self.backend.capability(), "recognition session started");

        loop {
            let restart_at = self.restart_at;
            tokio::select! {
                cmd = cmd_rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => break,
                },
                event = engine_rx.recv() => match event {
                    Some(event) => self.handle_engine_event(event),
                    None => break,
                },
                () = async move {
                    match restart_at {
                        Some(at) => tokio::time::sleep_until(at).await,
                        None => std::future::pending().await,
                    }
                }, if restart_at.is_some() => self.handle_restart_due(),
            }
        }

        info!("recognition session stopped");
    }

    /// Apply a caller command
    fn handle_command(&mut self, cmd: SessionCommand) {
        if self.backend.capability() == Capability::Unavailable {
            debug!(?cmd, "continuous recognition unavailable, command ignored");
            return;
        }

        match cmd {
            SessionCommand::Start => self.handle_start(),
            SessionCommand::Stop => self.handle_stop(),
        }
    }

    fn handle_start(&mut self) {
        match self.state {
            SessionState::Idle | SessionState::Faulted(_) => {
                self.intent_active = true;
                match self.backend.start() {
                    Ok(()) => self.transition_to(SessionState::Starting),
                    Err(e) => {
                        warn!(error = %e, "failed to start recognition");
                        self.fault(FaultReason::StartFailed);
                    }
                }
            }
            SessionState::Starting | SessionState::Listening => {
                debug!(state = %self.state, "start ignored, session already active");
            }
            SessionState::Stopping => {
                debug!("start ignored while stopping");
            }
        }
    }

    fn handle_stop(&mut self) {
        self.intent_active = false;
        // A pending restart must never fire after an explicit stop
        self.restart_at = None;

        match self.state {
            SessionState::Starting | SessionState::Listening => {
                self.transition_to(SessionState::Stopping);
                self.backend.stop();
                self.announce(MSG_DEACTIVATED);
                // The engine's own end callback, if it arrives, finds
                // the session already settled
                self.transition_to(SessionState::Idle);
            }
            SessionState::Idle | SessionState::Stopping | SessionState::Faulted(_) => {
                debug!(state = %self.state, "stop ignored, session not active");
            }
        }
    }

    /// Apply an engine callback
    fn handle_engine_event(&mut self, event: RecognitionEvent) {
        match event {
            RecognitionEvent::Activated => self.handle_activated(),
            RecognitionEvent::Result {
                transcript,
                is_final,
            } => self.handle_result(&transcript, is_final),
            RecognitionEvent::Error(fault) => self.handle_fault(fault),
            RecognitionEvent::Ended => self.handle_ended(),
        }
    }

    fn handle_activated(&mut self) {
        match self.state {
            SessionState::Starting => {
                self.transition_to(SessionState::Listening);
                self.announce(MSG_ACTIVATED);
            }
            SessionState::Listening => {
                debug!("duplicate activation ignored");
            }
            _ => {
                // Late activation after a stop; the engine was already
                // told to stop, nothing to do
                debug!(state = %self.state, "activation discarded");
            }
        }
    }

    fn handle_result(&mut self, transcript: &str, is_final: bool) {
        if self.state != SessionState::Listening {
            debug!(state = %self.state, transcript, "transcript discarded");
            return;
        }
        if !is_final {
            return;
        }
        self.dispatch_transcript(transcript);
    }

    fn handle_fault(&mut self, fault: FaultCode) {
        match fault {
            FaultCode::NoSpeech => {
                // Expected gap in ambient audio; announcing it would be
                // constant noise
                debug!("no speech detected");
            }
            FaultCode::Aborted => {
                warn!("recognition aborted by platform");
                self.intent_active = false;
                self.restart_at = None;
                self.transition_to(SessionState::Idle);
            }
            FaultCode::Network => {
                warn!("recognition network error");
                self.announce(MSG_NETWORK);
                // The engine recovers on its own; stay nominally active
            }
            FaultCode::Other(code) => {
                warn!(%code, "recognition error");
                if self.intent_active {
                    self.schedule_restart(self.error_backoff);
                    self.transition_to(SessionState::Starting);
                }
            }
        }
    }

    fn handle_ended(&mut self) {
        match self.state {
            SessionState::Stopping => {
                self.transition_to(SessionState::Idle);
            }
            SessionState::Listening | SessionState::Starting if self.intent_active => {
                // Unsolicited end, e.g. a platform listening timeout;
                // keep the earlier deadline if a restart is pending
                if self.restart_at.is_none() {
                    self.schedule_restart(self.restart_delay);
                }
                self.transition_to(SessionState::Starting);
            }
            _ => {
                debug!(state = %self.state, "session ended while inactive");
            }
        }
    }

    fn handle_restart_due(&mut self) {
        self.restart_at = None;
        if !self.intent_active {
            return;
        }

        debug!("attempting recognition restart");
        if let Err(e) = self.backend.start() {
            warn!(error = %e, "recognition restart failed");
            self.fault(FaultReason::RestartFailed);
        }
        // On success the engine confirms with an activation event
    }

    /// Forward a final transcript through the classifier and dispatch
    fn dispatch_transcript(&mut self, transcript: &str) {
        let Some(command) = classify(transcript) else {
            debug!(transcript, "utterance matched no command");
            return;
        };

        info!(%command, transcript, "voice command recognized");

        // Acknowledge first; the haptic cue must not delay the speech
        self.announce(command.acknowledgment());
        self.haptics.signal(command.haptic_cue());

        // Snapshot the handler at classification time so a concurrent
        // re-registration cannot swap it mid-dispatch
        let handler = self.handlers.read().ok().and_then(|t| t.get(command));
        match handler {
            Some(handler) => (*handler)(transcript),
            None => debug!(%command, "no handler registered, command dropped"),
        }

        let _ = self.event_tx.send(FeedbackEvent::CommandRecognized { command });
    }

    fn schedule_restart(&mut self, delay: Duration) {
        self.restart_at = Some(tokio::time::Instant::now() + delay);
        let delay_ms = delay.as_millis() as u64;
        debug!(delay_ms, "recognition restart scheduled");
        let _ = self.event_tx.send(FeedbackEvent::RestartScheduled { delay_ms });
    }

    fn fault(&mut self, reason: FaultReason) {
        self.intent_active = false;
        self.restart_at = None;
        self.transition_to(SessionState::Faulted(reason));
        let _ = self.event_tx.send(FeedbackEvent::SessionFaulted {
            reason: reason.to_string(),
        });
    }

    fn announce(&self, text: &str) {
        let _ = self.announcer.speak(text, self.announce_options);
    }

    /// Perform a state transition, publishing it to observers
    fn transition_to(&mut self, new_state: SessionState) {
        if new_state == self.state {
            return;
        }

        info!(from = %self.state, to = %new_state, "session transition");

        if self.state == SessionState::Listening {
            let duration_ms = self
                .listening_since
                .take()
                .map(|t| t.elapsed().as_millis() as u64)
                .unwrap_or(0);
            let _ = self
                .event_tx
                .send(FeedbackEvent::ListeningStopped { duration_ms });
        }
        if new_state == SessionState::Listening {
            self.listening_since = Some(Instant::now());
            let _ = self.event_tx.send(FeedbackEvent::ListeningStarted);
        }

        self.state = new_state.clone();
        let _ = self.state_tx.send(new_state);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::command::{Command, HandlerUpdate};
    use crate::platform::{HapticBackend, HapticPattern, SimulatedHaptics, SimulatedRecognition};
    use crate::speech::AnnouncerMsg;

    struct Harness {
        session: RecognitionSession,
        backend: Arc<SimulatedRecognition>,
        speech_rx: mpsc::UnboundedReceiver<AnnouncerMsg>,
        haptics: Arc<SimulatedHaptics>,
        handlers: Arc<RwLock<CommandHandlerTable>>,
        #[allow(dead_code)]
        handle: SessionHandle,
    }

    fn harness() -> Harness {
        let (backend, _engine_rx) = SimulatedRecognition::new(Capability::WebRecognition, false);
        let (announcer, speech_rx) = SpeechAnnouncer::detached();
        let haptics = SimulatedHaptics::new();
        let signaler =
            HapticSignaler::new(Some(Arc::clone(&haptics) as Arc<dyn HapticBackend>));
        let handlers = Arc::new(RwLock::new(CommandHandlerTable::new()));
        let (event_tx, _) = broadcast::channel(64);
        let (session, _cmd_rx, handle) = RecognitionSession::new(
            Arc::clone(&backend) as Arc<dyn RecognitionBackend>,
            announcer,
            signaler,
            Arc::clone(&handlers),
            event_tx,
            &Config::default(),
        );
        Harness {
            session,
            backend,
            speech_rx,
            haptics,
            handlers,
            handle,
        }
    }

    fn drain_speech(rx: &mut mpsc::UnboundedReceiver<AnnouncerMsg>) -> Vec<String> {
        let mut texts = Vec::new();
        while let Ok(AnnouncerMsg::Speak { request, .. }) = rx.try_recv() {
            texts.push(request.text);
        }
        texts
    }

    fn counting_handler(counter: &Arc<AtomicUsize>) -> impl Fn(&str) + Send + Sync + 'static {
        let counter = Arc::clone(counter);
        move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_initial_state() {
        let h = harness();
        assert_eq!(*h.session.state(), SessionState::Idle);
    }

    #[test]
    fn test_start_is_idempotent_with_one_activation_announcement() {
        let mut h = harness();

        h.session.handle_command(SessionCommand::Start);
        assert_eq!(*h.session.state(), SessionState::Starting);
        assert_eq!(h.backend.starts(), 1);

        // A second start without an intervening stop is a no-op
        h.session.handle_command(SessionCommand::Start);
        assert_eq!(*h.session.state(), SessionState::Starting);
        assert_eq!(h.backend.starts(), 1);

        h.session.handle_engine_event(RecognitionEvent::Activated);
        assert_eq!(*h.session.state(), SessionState::Listening);
        assert_eq!(drain_speech(&mut h.speech_rx), vec![MSG_ACTIVATED]);
    }

    #[test]
    fn test_stop_announces_and_returns_to_idle() {
        let mut h = harness();
        h.session.handle_command(SessionCommand::Start);
        h.session.handle_engine_event(RecognitionEvent::Activated);
        drain_speech(&mut h.speech_rx);

        h.session.handle_command(SessionCommand::Stop);
        assert_eq!(*h.session.state(), SessionState::Idle);
        assert_eq!(h.backend.stops(), 1);
        assert_eq!(drain_speech(&mut h.speech_rx), vec![MSG_DEACTIVATED]);
    }

    #[test]
    fn test_late_result_after_stop_is_discarded() {
        let mut h = harness();
        let calls = Arc::new(AtomicUsize::new(0));
        if let Ok(mut table) = h.handlers.write() {
            table.merge(HandlerUpdate::new().on(Command::Start, counting_handler(&calls)));
        }

        h.session.handle_command(SessionCommand::Start);
        h.session.handle_engine_event(RecognitionEvent::Activated);
        h.session.handle_command(SessionCommand::Stop);
        drain_speech(&mut h.speech_rx);

        // Simulated late engine callback after the caller stopped
        h.session.handle_engine_event(RecognitionEvent::Result {
            transcript: "start".to_string(),
            is_final: true,
        });

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(drain_speech(&mut h.speech_rx).is_empty());
    }

    #[test]
    fn test_no_speech_keeps_listening_silently() {
        let mut h = harness();
        h.session.handle_command(SessionCommand::Start);
        h.session.handle_engine_event(RecognitionEvent::Activated);
        drain_speech(&mut h.speech_rx);

        h.session
            .handle_engine_event(RecognitionEvent::Error(FaultCode::NoSpeech));
        assert_eq!(*h.session.state(), SessionState::Listening);
        assert!(drain_speech(&mut h.speech_rx).is_empty());
    }

    #[test]
    fn test_aborted_returns_to_idle() {
        let mut h = harness();
        h.session.handle_command(SessionCommand::Start);
        h.session.handle_engine_event(RecognitionEvent::Activated);

        h.session
            .handle_engine_event(RecognitionEvent::Error(FaultCode::Aborted));
        assert_eq!(*h.session.state(), SessionState::Idle);
    }

    #[test]
    fn test_network_fault_announces_and_stays_listening() {
        let mut h = harness();
        h.session.handle_command(SessionCommand::Start);
        h.session.handle_engine_event(RecognitionEvent::Activated);
        drain_speech(&mut h.speech_rx);

        h.session
            .handle_engine_event(RecognitionEvent::Error(FaultCode::Network));
        assert_eq!(*h.session.state(), SessionState::Listening);
        assert_eq!(drain_speech(&mut h.speech_rx), vec![MSG_NETWORK]);
    }

    #[test]
    fn test_interim_results_are_ignored() {
        let mut h = harness();
        let calls = Arc::new(AtomicUsize::new(0));
        if let Ok(mut table) = h.handlers.write() {
            table.merge(HandlerUpdate::new().on(Command::Start, counting_handler(&calls)));
        }

        h.session.handle_command(SessionCommand::Start);
        h.session.handle_engine_event(RecognitionEvent::Activated);
        drain_speech(&mut h.speech_rx);

        h.session.handle_engine_event(RecognitionEvent::Result {
            transcript: "start".to_string(),
            is_final: false,
        });
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(drain_speech(&mut h.speech_rx).is_empty());
    }

    #[test]
    fn test_dispatch_acknowledges_vibrates_and_invokes_handler() {
        let mut h = harness();
        let calls = Arc::new(AtomicUsize::new(0));
        if let Ok(mut table) = h.handlers.write() {
            table.merge(HandlerUpdate::new().on(Command::Start, counting_handler(&calls)));
        }

        h.session.handle_command(SessionCommand::Start);
        h.session.handle_engine_event(RecognitionEvent::Activated);
        drain_speech(&mut h.speech_rx);

        h.session.handle_engine_event(RecognitionEvent::Result {
            transcript: "please start now".to_string(),
            is_final: true,
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            drain_speech(&mut h.speech_rx),
            vec!["Starting obstacle detection"]
        );
        assert_eq!(h.haptics.fired(), vec![HapticPattern::NotifySuccess]);
    }

    #[test]
    fn test_unclassified_utterance_dispatches_nothing() {
        let mut h = harness();
        let calls = Arc::new(AtomicUsize::new(0));
        if let Ok(mut table) = h.handlers.write() {
            table.merge(HandlerUpdate::new().on(Command::Start, counting_handler(&calls)));
        }

        h.session.handle_command(SessionCommand::Start);
        h.session.handle_engine_event(RecognitionEvent::Activated);
        drain_speech(&mut h.speech_rx);

        h.session.handle_engine_event(RecognitionEvent::Result {
            transcript: "I wonder about the weather".to_string(),
            is_final: true,
        });

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(drain_speech(&mut h.speech_rx).is_empty());
        assert!(h.haptics.fired().is_empty());
    }

    #[test]
    fn test_command_with_no_handler_is_noop_but_acknowledged() {
        let mut h = harness();
        h.session.handle_command(SessionCommand::Start);
        h.session.handle_engine_event(RecognitionEvent::Activated);
        drain_speech(&mut h.speech_rx);

        // No handler registered for help; the acknowledgment still fires
        h.session.handle_engine_event(RecognitionEvent::Result {
            transcript: "help".to_string(),
            is_final: true,
        });
        assert_eq!(drain_speech(&mut h.speech_rx).len(), 1);
    }

    #[test]
    fn test_unavailable_platform_ignores_start_and_stop() {
        let (backend, _engine_rx) =
            crate::platform::UnavailableRecognition::new();
        let (announcer, mut speech_rx) = SpeechAnnouncer::detached();
        let handlers = Arc::new(RwLock::new(CommandHandlerTable::new()));
        let (event_tx, _) = broadcast::channel(16);
        let (mut session, _cmd_rx, _handle) = RecognitionSession::new(
            backend as Arc<dyn RecognitionBackend>,
            announcer,
            HapticSignaler::disabled(),
            handlers,
            event_tx,
            &Config::default(),
        );

        session.handle_command(SessionCommand::Start);
        assert_eq!(*session.state(), SessionState::Idle);
        session.handle_command(SessionCommand::Stop);
        assert_eq!(*session.state(), SessionState::Idle);
        assert!(drain_speech(&mut speech_rx).is_empty());
    }

    #[test]
    fn test_start_failure_faults_the_session() {
        let mut h = harness();
        h.backend.set_fail_start(true);

        h.session.handle_command(SessionCommand::Start);
        assert_eq!(
            *h.session.state(),
            SessionState::Faulted(FaultReason::StartFailed)
        );

        // Start is valid again from Faulted
        h.backend.set_fail_start(false);
        h.session.handle_command(SessionCommand::Start);
        assert_eq!(*h.session.state(), SessionState::Starting);
    }

    // Timer-driven paths run the full loop under a paused clock.

    async fn wait_for_state(handle: &SessionHandle, want: &SessionState) {
        let mut rx = handle.state_changes();
        tokio::time::timeout(Duration::from_secs(30), async {
            loop {
                if *rx.borrow() == *want {
                    return;
                }
                if rx.changed().await.is_err() {
                    panic!("session task dropped");
                }
            }
        })
        .await
        .expect("timed out waiting for session state");
    }

    fn spawn_session() -> (Arc<SimulatedRecognition>, SessionHandle) {
        let (backend, engine_rx) = SimulatedRecognition::new(Capability::WebRecognition, true);
        let (announcer, task) =
            SpeechAnnouncer::new(crate::platform::SimulatedSynthesis::new(), "en");
        tokio::spawn(task.run());
        let handlers = Arc::new(RwLock::new(CommandHandlerTable::new()));
        let (event_tx, _) = broadcast::channel(64);
        let (session, cmd_rx, handle) = RecognitionSession::new(
            Arc::clone(&backend) as Arc<dyn RecognitionBackend>,
            announcer,
            HapticSignaler::disabled(),
            handlers,
            event_tx,
            &Config::default(),
        );
        tokio::spawn(session.run(cmd_rx, engine_rx));
        (backend, handle)
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_restart_after_unsolicited_end() {
        let (backend, handle) = spawn_session();

        handle.start();
        wait_for_state(&handle, &SessionState::Listening).await;
        assert_eq!(backend.starts(), 1);

        backend.push_end();
        wait_for_state(&handle, &SessionState::Starting).await;

        // The 1s restart timer fires and the engine re-activates
        wait_for_state(&handle, &SessionState::Listening).await;
        assert_eq!(backend.starts(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_pending_restart() {
        let (backend, handle) = spawn_session();

        handle.start();
        wait_for_state(&handle, &SessionState::Listening).await;

        backend.push_end();
        wait_for_state(&handle, &SessionState::Starting).await;

        handle.stop();
        wait_for_state(&handle, &SessionState::Idle).await;

        // Well past the restart deadline: the canceled timer must not fire
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(backend.starts(), 1);
        assert_eq!(handle.state(), SessionState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_generic_error_retries_with_backoff() {
        let (backend, handle) = spawn_session();

        handle.start();
        wait_for_state(&handle, &SessionState::Listening).await;

        backend.push_error(FaultCode::Other("audio-capture".to_string()));
        wait_for_state(&handle, &SessionState::Starting).await;

        // The 3s backoff elapses and the session recovers
        wait_for_state(&handle, &SessionState::Listening).await;
        assert_eq!(backend.starts(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_restart_faults_the_session() {
        let (backend, handle) = spawn_session();

        handle.start();
        wait_for_state(&handle, &SessionState::Listening).await;

        backend.set_fail_start(true);
        backend.push_end();
        wait_for_state(
            &handle,
            &SessionState::Faulted(FaultReason::RestartFailed),
        )
        .await;
        assert_eq!(backend.starts(), 1);
    }
}
