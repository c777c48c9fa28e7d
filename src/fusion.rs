//! Per-tick fusion mode selection around an orientation filter

use tracing::trace;

use crate::calibration::MagCalibration;
use crate::filter::OrientationFilter;
use crate::types::{Euler, FusionMode, RawSample, SensorHealth};

/// Result of one fusion step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FusionOutcome {
    /// IMU down; the filter was not stepped
    Skipped,
    /// The filter was stepped but produced a non-finite angle
    Invalid(FusionMode),
    /// A usable estimate
    Estimate(Euler, FusionMode),
}

impl FusionOutcome {
    /// The estimate, if this tick produced one
    pub fn estimate(&self) -> Option<Euler> {
        match self {
            FusionOutcome::Estimate(euler, _) => Some(*euler),
            _ => None,
        }
    }

    /// The path the filter was driven through, if it was stepped at all
    pub fn mode(&self) -> Option<FusionMode> {
        match self {
            FusionOutcome::Skipped => None,
            FusionOutcome::Invalid(mode) | FusionOutcome::Estimate(_, mode) => Some(*mode),
        }
    }
}

/// Feeds calibrated samples into a filter, choosing 6- or 9-axis fusion on
/// every tick from the magnetometer's state
///
/// The mode is never latched: fusion drops to 6-axis the tick the
/// magnetometer goes away and returns to 9-axis the tick it comes back.
pub struct FusionAdapter<F> {
    filter: F,
    calibration: MagCalibration,
}

impl<F: OrientationFilter> FusionAdapter<F> {
    pub fn new(filter: F, calibration: MagCalibration) -> Self {
        Self {
            filter,
            calibration,
        }
    }

    /// Step the filter with one sample
    ///
    /// The magnetometer is used only when it is reported up, was read on this
    /// tick, and did not return an all-zero triple.
    pub fn advance(&mut self, raw: &RawSample, health: SensorHealth) -> FusionOutcome {
        if !health.imu_ok {
            return FusionOutcome::Skipped;
        }

        let mag_usable = health.mag_ok && raw.mag_valid && !raw.mag_is_zero();
        let mode = if mag_usable {
            let mag = self.calibration.apply(raw.mag_raw);
            self.filter.update9(raw.gyro, raw.accel, mag);
            FusionMode::NineAxis
        } else {
            self.filter.update6(raw.gyro, raw.accel);
            FusionMode::SixAxis
        };

        let euler = self.filter.euler();
        if euler.is_finite() {
            FusionOutcome::Estimate(euler, mode)
        } else {
            trace!(?euler, ?mode, "discarding non-finite estimate");
            FusionOutcome::Invalid(mode)
        }
    }

    pub fn calibration(&self) -> &MagCalibration {
        &self.calibration
    }

    pub fn filter(&self) -> &F {
        &self.filter
    }
}
