//! Configuration loading and management

use std::time::Duration;

use anyhow::{Context, Result};

/// Engine configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// BCP 47 language prefix used for voice selection
    pub locale: String,

    /// Default speaking rate multiplier
    pub speech_rate: f32,

    /// Default voice pitch multiplier
    pub speech_pitch: f32,

    /// Delay before re-issuing start after an unsolicited session end
    pub restart_delay: Duration,

    /// Backoff before retrying start after a generic recognition error
    pub error_backoff: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "en".to_string(),
            speech_rate: 1.0,
            speech_pitch: 1.2,
            restart_delay: Duration::from_secs(1),
            error_backoff: Duration::from_secs(3),
        }
    }
}

impl Config {
    /// Load configuration from environment overrides and defaults
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(locale) = std::env::var("EYES_LOCALE") {
            config.locale = locale;
        }
        if let Ok(rate) = std::env::var("EYES_SPEECH_RATE") {
            config.speech_rate = rate
                .parse()
                .context("EYES_SPEECH_RATE must be a positive number")?;
        }
        if let Ok(pitch) = std::env::var("EYES_SPEECH_PITCH") {
            config.speech_pitch = pitch
                .parse()
                .context("EYES_SPEECH_PITCH must be a positive number")?;
        }
        if let Ok(ms) = std::env::var("EYES_RESTART_DELAY_MS") {
            let ms: u64 = ms
                .parse()
                .context("EYES_RESTART_DELAY_MS must be milliseconds")?;
            config.restart_delay = Duration::from_millis(ms);
        }
        if let Ok(ms) = std::env::var("EYES_ERROR_BACKOFF_MS") {
            let ms: u64 = ms
                .parse()
                .context("EYES_ERROR_BACKOFF_MS must be milliseconds")?;
            config.error_backoff = Duration::from_millis(ms);
        }

        anyhow::ensure!(config.speech_rate > 0.0, "speech rate must be > 0");
        anyhow::ensure!(config.speech_pitch > 0.0, "speech pitch must be > 0");

        Ok(config)
    }
}
