//! eyes-feedbackd: demo daemon for the voice-command feedback engine
//!
//! Wires the engine onto simulated platform backends and exercises it
//! end to end: selects the voice-centric mode, feeds scripted
//! utterances through the recognition port, and raises simulated
//! obstacle alerts while detection is on. Spoken output and haptic
//! cues are rendered as log lines.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use eyes_feedback::config::Config;
use eyes_feedback::facade::{FeedbackFacade, MODE_TOTAL_BLINDNESS};
use eyes_feedback::command::{Command, HandlerUpdate};
use eyes_feedback::lifecycle::ShutdownSignal;
use eyes_feedback::platform::{
    Capability, ConsoleHaptics, ConsoleSynthesis, PlatformPorts, SimulatedRecognition,
};
use eyes_feedback::sim::{ObstacleSource, RandomObstacleSource};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "eyes-feedbackd starting"
    );

    // Load configuration
    let config = Config::load()?;
    info!(locale = %config.locale, "configuration loaded");

    // Create shutdown signal handler
    let shutdown = ShutdownSignal::new();

    // Simulated platform: recognition is scripted below, speech and
    // haptics render to the log
    let (recognition, recognition_events) =
        SimulatedRecognition::new(Capability::WebRecognition, true);
    let platform = PlatformPorts {
        recognition: Arc::clone(&recognition) as _,
        recognition_events,
        synthesis: Arc::new(ConsoleSynthesis),
        haptics: Some(Arc::new(ConsoleHaptics)),
    };

    let facade = Arc::new(FeedbackFacade::spawn(platform, &config));

    // Wire the command handlers the way the UI layer would
    let detecting = Arc::new(AtomicBool::new(false));
    let obstacles = Arc::new(Mutex::new(RandomObstacleSource::new()));

    let on = Arc::clone(&detecting);
    let off = Arc::clone(&detecting);
    let alert_facade = Arc::clone(&facade);
    let alert_source = Arc::clone(&obstacles);
    facade.init_command_handlers(
        HandlerUpdate::new()
            .on(Command::Start, move |_| {
                on.store(true, Ordering::SeqCst);
            })
            .on(Command::Stop, move |_| {
                off.store(false, Ordering::SeqCst);
            })
            .on(Command::Direction, move |_| {
                // The direction command answers with a fresh observation
                if let Ok(mut source) = alert_source.lock() {
                    let event = source.next_event();
                    let _ = alert_facade.obstacle_alert(&event.distance_meters, &event.direction);
                }
            }),
    );

    // Log engine events as they happen
    let mut event_rx = facade.events();
    tokio::spawn(async move {
        loop {
            match event_rx.recv().await {
                Ok(event) => info!(%event, "engine event"),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "event receiver lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let _ = facade.announce_system_ready();
    let _ = facade.announce_mode(MODE_TOTAL_BLINDNESS);

    // Scripted user: a handful of utterances arriving over time
    let script_recognition = Arc::clone(&recognition);
    tokio::spawn(async move {
        let script = [
            (3, "please start detection"),
            (8, "where is the obstacle"),
            (6, "this phrase matches nothing"),
            (5, "stop for now"),
        ];
        for (delay_secs, utterance) in script {
            tokio::time::sleep(Duration::from_secs(delay_secs)).await;
            script_recognition.push_final(utterance);
        }
    });

    // Simulated detector: raises an alert every few seconds while
    // detection is on
    let tick_facade = Arc::clone(&facade);
    let tick_detecting = Arc::clone(&detecting);
    let tick_source = Arc::clone(&obstacles);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(4));
        loop {
            interval.tick().await;
            if !tick_detecting.load(Ordering::SeqCst) {
                continue;
            }
            let event = match tick_source.lock() {
                Ok(mut source) => source.next_event(),
                Err(_) => continue,
            };
            let _ = tick_facade.obstacle_alert(&event.distance_meters, &event.direction);
        }
    });

    info!("daemon initialized, waiting for shutdown signal");
    shutdown.wait().await;

    info!("shutting down...");
    facade.stop_listening();
    info!("eyes-feedbackd stopped");

    Ok(())
}
