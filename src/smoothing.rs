//! Wraparound-aware exponential smoothing of Euler angles

use crate::math::{unwrap_near, wrap_difference};
use crate::types::Euler;

/// Exponentially smooth one angle toward `raw`, taking the short way round
///
/// The step is `prev + alpha * diff` with `diff` wrapped into [-180, 180].
/// When that step crosses the wrap boundary the result is moved by a whole
/// turn onto the same branch as `raw`, so smoothing 359 toward 1 with
/// `alpha = 1` gives 1, not 361.
///
/// # Example
/// ```
/// use fusion_link::smoothing::ema_angle;
///
/// assert_eq!(ema_angle(10.0, 20.0, 0.5), 15.0);
/// assert_eq!(ema_angle(359.0, 1.0, 1.0), 1.0);
/// ```
pub fn ema_angle(prev: f32, raw: f32, alpha: f32) -> f32 {
    let diff = wrap_difference(raw - prev);
    unwrap_near(prev + alpha * diff, raw)
}

/// Smooth all three axes of `raw` against `prev`
pub fn smooth(prev: Euler, raw: Euler, alpha: f32) -> Euler {
    Euler {
        roll: ema_angle(prev.roll, raw.roll, alpha),
        pitch: ema_angle(prev.pitch, raw.pitch, alpha),
        yaw: ema_angle(prev.yaw, raw.yaw, alpha),
    }
}

/// Smoothed orientation carried across ticks
///
/// Seeded verbatim from the first estimate it sees, then updated in place.
#[derive(Debug, Clone, Copy)]
pub struct AngleSmoother {
    alpha: f32,
    state: Option<Euler>,
}

impl AngleSmoother {
    /// `alpha` must lie in (0, 1]
    pub fn new(alpha: f32) -> Self {
        Self { alpha, state: None }
    }

    /// Fold one finite estimate into the smoothed orientation
    pub fn update(&mut self, raw: Euler) -> Euler {
        let next = match self.state {
            None => raw,
            Some(prev) => smooth(prev, raw, self.alpha),
        };
        self.state = Some(next);
        next
    }

    /// The smoothed orientation, once seeded
    pub fn current(&self) -> Option<Euler> {
        self.state
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }
}
