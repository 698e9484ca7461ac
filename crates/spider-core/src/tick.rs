#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickContext {
    pub tick: u64,
    pub dt_seconds: f32,
}

impl TickContext {
    pub fn new(tick: u64, dt_seconds: f32) -> Self {
        Self { tick, dt_seconds }
    }

    /// Time slice with negative and non-finite values treated as zero.
    pub fn dt(&self) -> f32 {
        if self.dt_seconds.is_finite() {
            self.dt_seconds.max(0.0)
        } else {
            0.0
        }
    }

    pub fn next(self) -> Self {
        Self {
            tick: self.tick + 1,
            ..self
        }
    }
}

/// Host-supplied walking request in agent-local axes.
///
/// `forward` and `right` are axis values in `[-1, 1]`; the combined vector is clamped to unit
/// length before it is scaled by the configured speed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MovementIntent {
    pub forward: f32,
    pub right: f32,
}

impl MovementIntent {
    pub const IDLE: Self = Self {
        forward: 0.0,
        right: 0.0,
    };

    pub fn new(forward: f32, right: f32) -> Self {
        Self { forward, right }
    }

    pub fn forward(amount: f32) -> Self {
        Self::new(amount, 0.0)
    }

    pub fn is_idle(&self) -> bool {
        self.forward == 0.0 && self.right == 0.0
    }
}
