//! Speech announcer actor
//!
//! Serializes text-to-speech so at most one utterance is in flight. An
//! interrupting request cancels the in-flight utterance and flushes the
//! queue (the platform cancel is fire-and-forget; the new request is
//! issued without waiting for it), which guarantees the most recent
//! announcement is the one heard to completion. Synthesis failures are
//! logged and the announcement is skipped; nothing propagates to the UI.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::platform::{SpeechError, SynthesisBackend, VoiceInfo, VoiceParams};

/// Per-request speech options
#[derive(Debug, Clone, Copy)]
pub struct AnnouncementOptions {
    /// Speaking rate multiplier, > 0
    pub rate: f32,
    /// Voice pitch multiplier, > 0
    pub pitch: f32,
    /// Cancel any in-flight speech before this request begins
    pub interrupt: bool,
}

impl Default for AnnouncementOptions {
    fn default() -> Self {
        Self {
            rate: 1.0,
            pitch: 1.2,
            interrupt: true,
        }
    }
}

impl AnnouncementOptions {
    /// FIFO variant: wait for current speech instead of interrupting
    pub fn queued() -> Self {
        Self {
            interrupt: false,
            ..Self::default()
        }
    }
}

/// A speech request in flight to the announcer; not retained after
/// dispatch
#[derive(Debug, Clone)]
pub struct SpeechRequest {
    pub text: String,
    pub rate: f32,
    pub pitch: f32,
    pub interrupt: bool,
}

/// Terminal outcome of one announcement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakOutcome {
    /// The utterance was read to completion
    Completed,
    /// Superseded by a later interrupting request
    Interrupted,
    /// Dropped: synthesis failed or the announcer shut down
    Skipped,
}

/// Awaitable completion signal returned by `speak`; dropping it is fine
pub struct AnnounceDone {
    rx: oneshot::Receiver<SpeakOutcome>,
}

impl Future for AnnounceDone {
    type Output = SpeakOutcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        Pin::new(&mut this.rx)
            .poll(cx)
            .map(|r| r.unwrap_or(SpeakOutcome::Skipped))
    }
}

pub(crate) enum AnnouncerMsg {
    Speak {
        request: SpeechRequest,
        done: oneshot::Sender<SpeakOutcome>,
    },
}

/// Cheap-to-clone handle for submitting speech requests
#[derive(Clone)]
pub struct SpeechAnnouncer {
    tx: mpsc::UnboundedSender<AnnouncerMsg>,
}

impl SpeechAnnouncer {
    /// Create the handle and its actor task; the caller spawns
    /// `AnnouncerTask::run`
    pub fn new(backend: Arc<dyn SynthesisBackend>, locale: &str) -> (Self, AnnouncerTask) {
        let (tx, rx) = mpsc::unbounded_channel();
        let voice = choose_voice(&backend.voices(), locale);
        if let Some(v) = &voice {
            debug!(voice = %v, "preferred synthesis voice selected");
        }
        (
            Self { tx },
            AnnouncerTask {
                rx,
                backend,
                voice,
            },
        )
    }

    /// Handle whose messages pile up in a channel the test holds;
    /// lets synchronous tests count announcements without a runtime
    #[cfg(test)]
    pub(crate) fn detached() -> (Self, mpsc::UnboundedReceiver<AnnouncerMsg>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Submit a speech request; never blocks and never fails the caller
    pub fn speak(&self, text: impl Into<String>, options: AnnouncementOptions) -> AnnounceDone {
        let (done_tx, done_rx) = oneshot::channel();
        let request = SpeechRequest {
            text: text.into(),
            rate: options.rate,
            pitch: options.pitch,
            interrupt: options.interrupt,
        };
        if self
            .tx
            .send(AnnouncerMsg::Speak {
                request,
                done: done_tx,
            })
            .is_err()
        {
            debug!("announcer stopped; speech request dropped");
        }
        AnnounceDone { rx: done_rx }
    }
}

struct Pending {
    request: SpeechRequest,
    done: oneshot::Sender<SpeakOutcome>,
}

/// Actor owning the synthesis backend and the utterance queue
pub struct AnnouncerTask {
    rx: mpsc::UnboundedReceiver<AnnouncerMsg>,
    backend: Arc<dyn SynthesisBackend>,
    voice: Option<String>,
}

impl AnnouncerTask {
    pub async fn run(mut self) {
        let mut queue: VecDeque<Pending> = VecDeque::new();

        loop {
            let next = match queue.pop_front() {
                Some(pending) => pending,
                None => match self.rx.recv().await {
                    Some(AnnouncerMsg::Speak { request, done }) => Pending { request, done },
                    None => break,
                },
            };

            if !self.play(next, &mut queue).await {
                break;
            }
        }

        debug!("announcer stopped");
    }

    /// Produce one utterance while watching for new requests; returns
    /// false when the handle side has gone away
    async fn play(&mut self, pending: Pending, queue: &mut VecDeque<Pending>) -> bool {
        let Pending { request, done } = pending;
        let mut synthesis = self.synthesize(request);
        let mut done = Some(done);

        loop {
            // Biased: the in-flight utterance is always polled (and thus
            // issued to the backend) before new requests are examined
            tokio::select! {
                biased;
                result = synthesis.as_mut() => {
                    if let Some(done) = done.take() {
                        match result {
                            Ok(()) => {
                                let _ = done.send(SpeakOutcome::Completed);
                            }
                            Err(e) => {
                                warn!(error = %e, "synthesis failed, announcement skipped");
                                let _ = done.send(SpeakOutcome::Skipped);
                            }
                        }
                    }
                    return true;
                }
                msg = self.rx.recv() => match msg {
                    None => return false,
                    Some(AnnouncerMsg::Speak { request, done: new_done }) => {
                        if request.interrupt {
                            // Fire-and-forget cancel; the abandoned
                            // synthesis future is dropped immediately so
                            // the new request is always issued
                            self.backend.cancel();
                            if let Some(stale) = done.take() {
                                let _ = stale.send(SpeakOutcome::Interrupted);
                            }
                            for stale in queue.drain(..) {
                                let _ = stale.done.send(SpeakOutcome::Interrupted);
                            }
                            queue.push_back(Pending { request, done: new_done });
                            return true;
                        }
                        queue.push_back(Pending { request, done: new_done });
                    }
                },
            }
        }
    }

    fn synthesize(
        &self,
        request: SpeechRequest,
    ) -> Pin<Box<dyn Future<Output = Result<(), SpeechError>> + Send>> {
        let backend = Arc::clone(&self.backend);
        let params = VoiceParams {
            rate: request.rate,
            pitch: request.pitch,
            volume: 1.0,
            voice: self.voice.clone(),
        };
        Box::pin(async move { backend.speak(&request.text, &params).await })
    }
}

/// Best-effort voice selection: a locale-matching voice with a female
/// name hint, mirroring the platform catalogs this engine targets.
/// `None` means the platform default voice; that is not an error.
fn choose_voice(voices: &[VoiceInfo], locale: &str) -> Option<String> {
    voices
        .iter()
        .find(|v| v.lang.starts_with(locale) && v.name.to_lowercase().contains("female"))
        .map(|v| v.id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{FailingSynthesis, SimulatedSynthesis};

    fn spawn_announcer(backend: Arc<dyn SynthesisBackend>) -> SpeechAnnouncer {
        let (announcer, task) = SpeechAnnouncer::new(backend, "en");
        tokio::spawn(task.run());
        announcer
    }

    #[tokio::test]
    async fn test_interrupt_supersedes_in_flight_utterance() {
        let backend = SimulatedSynthesis::gated();
        let announcer = spawn_announcer(backend.clone());

        let a = announcer.speak("A", AnnouncementOptions::default());
        let b = announcer.speak("B", AnnouncementOptions::default());

        // "A" is abandoned without waiting for the platform cancel
        assert_eq!(a.await, SpeakOutcome::Interrupted);

        backend.release(1);
        assert_eq!(b.await, SpeakOutcome::Completed);

        // Exactly one cancel was attempted before "B" was issued
        assert_eq!(backend.cancels(), 1);
        assert_eq!(backend.spoken(), vec!["A".to_string(), "B".to_string()]);
    }

    #[tokio::test]
    async fn test_non_interrupting_requests_queue_fifo() {
        let backend = SimulatedSynthesis::new();
        let announcer = spawn_announcer(backend.clone());

        let first = announcer.speak("first", AnnouncementOptions::queued());
        let second = announcer.speak("second", AnnouncementOptions::queued());

        assert_eq!(first.await, SpeakOutcome::Completed);
        assert_eq!(second.await, SpeakOutcome::Completed);
        assert_eq!(backend.cancels(), 0);
        assert_eq!(
            backend.spoken(),
            vec!["first".to_string(), "second".to_string()]
        );
    }

    #[tokio::test]
    async fn test_interrupt_flushes_queued_requests() {
        let backend = SimulatedSynthesis::gated();
        let announcer = spawn_announcer(backend.clone());

        let current = announcer.speak("current", AnnouncementOptions::default());
        let queued = announcer.speak("queued", AnnouncementOptions::queued());
        let urgent = announcer.speak("urgent", AnnouncementOptions::default());

        assert_eq!(current.await, SpeakOutcome::Interrupted);
        assert_eq!(queued.await, SpeakOutcome::Interrupted);

        backend.release(1);
        assert_eq!(urgent.await, SpeakOutcome::Completed);
    }

    #[tokio::test]
    async fn test_synthesis_failure_is_absorbed() {
        let announcer = spawn_announcer(Arc::new(FailingSynthesis));

        let outcome = announcer
            .speak("unheard", AnnouncementOptions::default())
            .await;
        assert_eq!(outcome, SpeakOutcome::Skipped);

        // The actor survives the failure
        let outcome = announcer
            .speak("also unheard", AnnouncementOptions::default())
            .await;
        assert_eq!(outcome, SpeakOutcome::Skipped);
    }

    #[test]
    fn test_default_options() {
        let opts = AnnouncementOptions::default();
        assert!((opts.rate - 1.0).abs() < f32::EPSILON);
        assert!((opts.pitch - 1.2).abs() < f32::EPSILON);
        assert!(opts.interrupt);
    }

    #[test]
    fn test_voice_selection_prefers_locale_and_hint() {
        let voices = vec![
            VoiceInfo {
                id: "fr-1".into(),
                name: "French Female".into(),
                lang: "fr-FR".into(),
            },
            VoiceInfo {
                id: "en-1".into(),
                name: "English Male".into(),
                lang: "en-US".into(),
            },
            VoiceInfo {
                id: "en-2".into(),
                name: "English Female".into(),
                lang: "en-GB".into(),
            },
        ];
        assert_eq!(choose_voice(&voices, "en"), Some("en-2".to_string()));
        assert_eq!(choose_voice(&voices, "de"), None);
        assert_eq!(choose_voice(&[], "en"), None);
    }
}
