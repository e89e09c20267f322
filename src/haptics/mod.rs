//! Haptic feedback signaling
//!
//! Maps feedback intensities onto device vibration patterns. Haptic
//! output is advisory: failures are logged and absorbed, and a platform
//! without a haptic backend gets a no-op signaler.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::platform::{HapticBackend, HapticPattern};

/// Intensity of a haptic cue, keyed by feedback event type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VibrationIntensity {
    Light,
    Medium,
    Heavy,
    Success,
    Warning,
    Error,
}

impl From<VibrationIntensity> for HapticPattern {
    fn from(intensity: VibrationIntensity) -> Self {
        match intensity {
            VibrationIntensity::Light => HapticPattern::ImpactLight,
            VibrationIntensity::Medium => HapticPattern::ImpactMedium,
            VibrationIntensity::Heavy => HapticPattern::ImpactHeavy,
            VibrationIntensity::Success => HapticPattern::NotifySuccess,
            VibrationIntensity::Warning => HapticPattern::NotifyWarning,
            VibrationIntensity::Error => HapticPattern::NotifyError,
        }
    }
}

/// Best-effort haptic output; never returns an error to the caller
#[derive(Clone)]
pub struct HapticSignaler {
    backend: Option<Arc<dyn HapticBackend>>,
}

impl HapticSignaler {
    pub fn new(backend: Option<Arc<dyn HapticBackend>>) -> Self {
        Self { backend }
    }

    /// Signaler for platforms without haptic capability
    pub fn disabled() -> Self {
        Self { backend: None }
    }

    /// Fire the pattern for `intensity`, swallowing any backend failure
    pub fn signal(&self, intensity: VibrationIntensity) {
        let Some(backend) = &self.backend else {
            return;
        };
        let pattern = HapticPattern::from(intensity);
        if let Err(e) = backend.fire(pattern) {
            debug!(error = %e, ?pattern, "haptic cue dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::SimulatedHaptics;

    #[test]
    fn test_intensity_pattern_mapping() {
        assert_eq!(
            HapticPattern::from(VibrationIntensity::Light),
            HapticPattern::ImpactLight
        );
        assert_eq!(
            HapticPattern::from(VibrationIntensity::Success),
            HapticPattern::NotifySuccess
        );
        assert_eq!(
            HapticPattern::from(VibrationIntensity::Error),
            HapticPattern::NotifyError
        );
    }

    #[test]
    fn test_signal_records_pattern() {
        let backend = SimulatedHaptics::new();
        let signaler = HapticSignaler::new(Some(backend.clone() as Arc<dyn HapticBackend>));
        signaler.signal(VibrationIntensity::Warning);
        assert_eq!(backend.fired(), vec![HapticPattern::NotifyWarning]);
    }

    #[test]
    fn test_disabled_signaler_is_noop() {
        // Must not panic or block without a backend
        let signaler = HapticSignaler::disabled();
        signaler.signal(VibrationIntensity::Heavy);
    }
}
