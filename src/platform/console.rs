//! Console backends for the demo daemon
//!
//! Synthesis is rendered as log lines with a delay proportional to the
//! text length, so interrupt behavior is visible; haptics log the pattern.

use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use super::{HapticBackend, HapticError, HapticPattern, SpeechError, SynthesisBackend, VoiceParams};

/// Milliseconds of simulated speaking time per word
const MS_PER_WORD: u64 = 280;

pub struct ConsoleSynthesis;

#[async_trait]
impl SynthesisBackend for ConsoleSynthesis {
    async fn speak(&self, text: &str, params: &VoiceParams) -> Result<(), SpeechError> {
        info!(rate = params.rate, pitch = params.pitch, "speaking: {}", text);
        let words = text.split_whitespace().count() as u64;
        let scaled = (words * MS_PER_WORD) as f32 / params.rate.max(0.1);
        tokio::time::sleep(Duration::from_millis(scaled as u64)).await;
        Ok(())
    }

    fn cancel(&self) {
        info!("speech canceled");
    }
}

pub struct ConsoleHaptics;

impl HapticBackend for ConsoleHaptics {
    fn fire(&self, pattern: HapticPattern) -> Result<(), HapticError> {
        info!(?pattern, "haptic pulse");
        Ok(())
    }
}
