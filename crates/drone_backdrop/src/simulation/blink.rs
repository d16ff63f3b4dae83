//! Alternating front/rear beacon driven by a wall-clock interval

use std::time::Duration;

use crate::core::config::BlinkConfig;
use crate::scene::{DroneModel, SceneError, SceneGraph};

/// Which beacon is lit; exactly one of the two at any time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightState {
    front_on: bool,
}

impl Default for LightState {
    fn default() -> Self {
        Self { front_on: true }
    }
}

impl LightState {
    /// Front beacon lit
    pub fn front_on(&self) -> bool {
        self.front_on
    }

    /// Rear beacon lit
    pub fn back_on(&self) -> bool {
        !self.front_on
    }

    fn toggled(self) -> Self {
        Self { front_on: !self.front_on }
    }
}

/// Toggles [`LightState`] once per period
#[derive(Debug, Clone)]
pub struct BlinkController {
    period: Duration,
    state: LightState,
    ticks: u64,
}

impl BlinkController {
    /// Front beacon on, no ticks yet
    pub fn new(config: &BlinkConfig) -> Self {
        Self {
            period: Duration::from_millis(config.period_ms),
            state: LightState::default(),
            ticks: 0,
        }
    }

    /// Toggle period
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Flip both beacons
    pub fn tick(&mut self) -> LightState {
        self.state = self.state.toggled();
        self.ticks += 1;
        log::trace!("Blink tick {}: front {}", self.ticks, self.state.front_on);
        self.state
    }

    /// Current beacon state
    pub fn state(&self) -> LightState {
        self.state
    }

    /// Number of ticks since construction
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Write beacon visibility into the drone's light nodes
    pub fn apply(&self, graph: &mut SceneGraph, model: &DroneModel) -> Result<(), SceneError> {
        graph.set_visible(model.front_light, self.state.front_on())?;
        graph.set_visible(model.back_light, self.state.back_on())
    }
}
