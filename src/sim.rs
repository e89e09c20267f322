//! Simulated obstacle events
//!
//! Obstacle detection itself is outside this engine; the demo daemon
//! (and tests) feed it events from an injectable source so the engine's
//! reaction stays deterministic where it matters.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// One simulated obstacle observation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObstacleEvent {
    pub distance_meters: String,
    pub direction: String,
}

/// A producer of obstacle events
pub trait ObstacleSource: Send {
    fn next_event(&mut self) -> ObstacleEvent;
}

const DIRECTIONS: &[&str] = &["ahead", "to your left", "to your right", "behind you"];

/// Random distance (1-5 m) and direction, matching the simulated
/// detector this engine ships against
pub struct RandomObstacleSource {
    rng: StdRng,
}

impl RandomObstacleSource {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Seeded variant for reproducible sequences
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomObstacleSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ObstacleSource for RandomObstacleSource {
    fn next_event(&mut self) -> ObstacleEvent {
        let distance = self.rng.gen_range(1..=5);
        let direction = DIRECTIONS[self.rng.gen_range(0..DIRECTIONS.len())];
        ObstacleEvent {
            distance_meters: distance.to_string(),
            direction: direction.to_string(),
        }
    }
}
