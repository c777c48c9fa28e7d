//! Magnetometer calibration
//!
//! Raw counts are corrected as `(raw - offset) * scale * sensitivity`, giving
//! a field in µT. Coefficients are fixed for the life of the process.

use nalgebra::Vector3;

use crate::config::CalibrationConfig;

/// HMC5883L sensitivity at the default ±1.3 Ga gain (1090 LSB/Gauss)
pub const HMC5883L_UT_PER_LSB: f32 = 100.0 / 1090.0;

/// Per-axis hard-iron offset, soft-iron scale and sensor sensitivity
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use fusion_link::calibration::MagCalibration;
///
/// let calibration = MagCalibration {
///     offset: Vector3::new(10.0, 20.0, 30.0),
///     scale: Vector3::new(1.0, 1.0, 1.0),
///     sensitivity: 1.0,
/// };
/// let field = calibration.apply(Vector3::new(110, 220, 330));
/// assert_eq!(field, Vector3::new(100.0, 200.0, 300.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagCalibration {
    /// Hard-iron offset in raw counts
    pub offset: Vector3<f32>,
    /// Soft-iron scale factor per axis
    pub scale: Vector3<f32>,
    /// Conversion from counts to µT
    pub sensitivity: f32,
}

impl Default for MagCalibration {
    fn default() -> Self {
        Self {
            offset: Vector3::zeros(),
            scale: Vector3::new(1.0, 1.0, 1.0),
            sensitivity: HMC5883L_UT_PER_LSB,
        }
    }
}

impl From<&CalibrationConfig> for MagCalibration {
    fn from(config: &CalibrationConfig) -> Self {
        Self {
            offset: Vector3::from(config.mag_offset),
            scale: Vector3::from(config.mag_scale),
            sensitivity: config.mag_ut_per_lsb,
        }
    }
}

impl MagCalibration {
    /// Convert a raw reading to a calibrated field in µT
    pub fn apply(&self, raw: Vector3<i16>) -> Vector3<f32> {
        let raw = raw.map(f32::from);
        (raw - self.offset).component_mul(&self.scale) * self.sensitivity
    }

    /// Derive offsets and scales from the min/max envelope of a rotation sweep
    ///
    /// The offset is the centre of the envelope on each axis. The scale
    /// normalises each axis half-range to the mean half-range; an axis that
    /// never moved keeps a scale of 1.
    pub fn from_extremes(extremes: &MagExtremes, sensitivity: f32) -> Self {
        let min = extremes.min.map(f32::from);
        let max = extremes.max.map(f32::from);

        let offset = (max + min) / 2.0;
        let half_range = (max - min) / 2.0;
        let mean_half_range = half_range.sum() / 3.0;
        let scale = half_range.map(|r| if r > 0.0 { mean_half_range / r } else { 1.0 });

        Self {
            offset,
            scale,
            sensitivity,
        }
    }
}

/// Running per-axis min/max of raw magnetometer counts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagExtremes {
    pub min: Vector3<i16>,
    pub max: Vector3<i16>,
    samples: u32,
}

impl MagExtremes {
    pub fn new() -> Self {
        Self {
            min: Vector3::repeat(i16::MAX),
            max: Vector3::repeat(i16::MIN),
            samples: 0,
        }
    }

    /// Widen the envelope with one reading
    pub fn observe(&mut self, raw: Vector3<i16>) {
        self.min = self.min.inf(&raw);
        self.max = self.max.sup(&raw);
        self.samples = self.samples.saturating_add(1);
    }

    /// Number of readings observed so far
    pub fn samples(&self) -> u32 {
        self.samples
    }
}

impl Default for MagExtremes {
    fn default() -> Self {
        Self::new()
    }
}
