//! Simulated platform backends
//!
//! Deterministic stand-ins for the web/native speech and haptic APIs.
//! The demo daemon scripts them; tests inject events and inspect the
//! recorded calls.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{mpsc, Semaphore};
use tracing::debug;

use super::{
    Capability, FaultCode, HapticBackend, HapticError, HapticPattern, RecognitionBackend,
    RecognitionError, RecognitionEvent, SpeechError, SynthesisBackend, VoiceInfo, VoiceParams,
};

/// Scriptable recognition engine
///
/// `start` optionally auto-confirms with an `Activated` event; tests push
/// transcripts, errors, and unsolicited ends through the same channel the
/// session consumes.
pub struct SimulatedRecognition {
    events: mpsc::UnboundedSender<RecognitionEvent>,
    capability: Capability,
    auto_activate: bool,
    fail_start: AtomicBool,
    starts: AtomicUsize,
    stops: AtomicUsize,
}

impl SimulatedRecognition {
    pub fn new(
        capability: Capability,
        auto_activate: bool,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<RecognitionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let backend = Arc::new(Self {
            events: tx,
            capability,
            auto_activate,
            fail_start: AtomicBool::new(false),
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
        });
        (backend, rx)
    }

    /// Make subsequent `start` calls fail
    pub fn set_fail_start(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::SeqCst);
    }

    pub fn push_activated(&self) {
        let _ = self.events.send(RecognitionEvent::Activated);
    }

    /// Deliver a final transcript, as the platform would after a pause
    pub fn push_final(&self, transcript: &str) {
        let _ = self.events.send(RecognitionEvent::Result {
            transcript: transcript.to_string(),
            is_final: true,
        });
    }

    pub fn push_interim(&self, transcript: &str) {
        let _ = self.events.send(RecognitionEvent::Result {
            transcript: transcript.to_string(),
            is_final: false,
        });
    }

    pub fn push_error(&self, fault: FaultCode) {
        let _ = self.events.send(RecognitionEvent::Error(fault));
    }

    /// Unsolicited session end, e.g. a platform listening timeout
    pub fn push_end(&self) {
        let _ = self.events.send(RecognitionEvent::Ended);
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl RecognitionBackend for SimulatedRecognition {
    fn capability(&self) -> Capability {
        self.capability
    }

    fn start(&self) -> Result<(), RecognitionError> {
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(RecognitionError::StartRejected(
                "simulated start failure".to_string(),
            ));
        }
        self.starts.fetch_add(1, Ordering::SeqCst);
        if self.auto_activate {
            let _ = self.events.send(RecognitionEvent::Activated);
        }
        Ok(())
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

/// Recognition port for platforms without continuous recognition
pub struct UnavailableRecognition {
    // Kept so the session's event channel stays open
    _events: mpsc::UnboundedSender<RecognitionEvent>,
}

impl UnavailableRecognition {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<RecognitionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { _events: tx }), rx)
    }
}

impl RecognitionBackend for UnavailableRecognition {
    fn capability(&self) -> Capability {
        Capability::Unavailable
    }

    fn start(&self) -> Result<(), RecognitionError> {
        Err(RecognitionError::Unsupported)
    }

    fn stop(&self) {}
}

/// Recording synthesis engine
///
/// Immediate by default; `gated` mode holds each utterance until the test
/// releases it, to exercise interrupt semantics mid-utterance.
pub struct SimulatedSynthesis {
    spoken: Mutex<Vec<String>>,
    cancels: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
    voices: Vec<VoiceInfo>,
}

impl SimulatedSynthesis {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            spoken: Mutex::new(Vec::new()),
            cancels: AtomicUsize::new(0),
            gate: None,
            voices: Vec::new(),
        })
    }

    /// Every `speak` blocks until `release` grants it a permit
    pub fn gated() -> Arc<Self> {
        Arc::new(Self {
            spoken: Mutex::new(Vec::new()),
            cancels: AtomicUsize::new(0),
            gate: Some(Arc::new(Semaphore::new(0))),
            voices: Vec::new(),
        })
    }

    pub fn with_voices(voices: Vec<VoiceInfo>) -> Arc<Self> {
        Arc::new(Self {
            spoken: Mutex::new(Vec::new()),
            cancels: AtomicUsize::new(0),
            gate: None,
            voices,
        })
    }

    /// Let `n` held utterances finish
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    /// Texts handed to the engine, in order of issue
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SynthesisBackend for SimulatedSynthesis {
    async fn speak(&self, text: &str, params: &VoiceParams) -> Result<(), SpeechError> {
        debug!(text, rate = params.rate, pitch = params.pitch, "simulated speak");
        if let Ok(mut spoken) = self.spoken.lock() {
            spoken.push(text.to_string());
        }
        if let Some(gate) = &self.gate {
            if let Ok(permit) = Arc::clone(gate).acquire_owned().await {
                permit.forget();
            }
        }
        Ok(())
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }

    fn voices(&self) -> Vec<VoiceInfo> {
        self.voices.clone()
    }
}

/// Synthesis engine that fails every request, for fault-path tests
pub struct FailingSynthesis;

#[async_trait]
impl SynthesisBackend for FailingSynthesis {
    async fn speak(&self, _text: &str, _params: &VoiceParams) -> Result<(), SpeechError> {
        Err(SpeechError::EngineUnavailable)
    }

    fn cancel(&self) {}
}

/// Recording haptic engine
pub struct SimulatedHaptics {
    fired: Mutex<Vec<HapticPattern>>,
}

impl SimulatedHaptics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            fired: Mutex::new(Vec::new()),
        })
    }

    pub fn fired(&self) -> Vec<HapticPattern> {
        self.fired.lock().map(|f| f.clone()).unwrap_or_default()
    }
}

impl HapticBackend for SimulatedHaptics {
    fn fire(&self, pattern: HapticPattern) -> Result<(), HapticError> {
        if let Ok(mut fired) = self.fired.lock() {
            fired.push(pattern);
        }
        Ok(())
    }
}
