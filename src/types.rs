//! Core value types passed between pipeline stages
//!
//! Every type here is `Copy`. Stages hand each other values on every tick and
//! never hold references into another stage's state.

use core::fmt;

use nalgebra::Vector3;

/// One reading of every sensor, taken once per sampling tick
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use fusion_link::RawSample;
///
/// let sample = RawSample {
///     accel: Vector3::new(0.0, 0.0, 1.0),
///     gyro: Vector3::zeros(),
///     mag_raw: Vector3::new(120, -40, 310),
///     mag_valid: true,
/// };
/// assert!(!sample.mag_is_zero());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSample {
    /// Accelerometer reading in g
    pub accel: Vector3<f32>,
    /// Gyroscope reading in degrees per second
    pub gyro: Vector3<f32>,
    /// Magnetometer reading in raw counts
    pub mag_raw: Vector3<i16>,
    /// Whether the magnetometer was read on this tick
    ///
    /// False when the magnetometer was reported down, in which case
    /// `mag_raw` is all zeros.
    pub mag_valid: bool,
}

impl RawSample {
    /// True when the magnetometer triple is exactly (0, 0, 0)
    ///
    /// An all-zero reading means a bus failure, not a real field.
    pub fn mag_is_zero(&self) -> bool {
        self.mag_raw == Vector3::zeros()
    }
}

/// Sensor presence as last seen by the health monitor
///
/// A sensor that drops out is reported here as data. Nothing else in the
/// pipeline treats it as a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorHealth {
    /// IMU answered its last probe
    pub imu_ok: bool,
    /// Magnetometer answered its last probe
    pub mag_ok: bool,
}

impl SensorHealth {
    pub const ALL_UP: SensorHealth = SensorHealth {
        imu_ok: true,
        mag_ok: true,
    };
}

impl Default for SensorHealth {
    fn default() -> Self {
        Self::ALL_UP
    }
}

/// Roll, pitch and yaw in degrees
///
/// Used both for the filter's raw output and for the smoothed orientation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Euler {
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
}

impl Euler {
    pub const fn new(roll: f32, pitch: f32, yaw: f32) -> Self {
        Self { roll, pitch, yaw }
    }

    /// True when none of the three angles is NaN or infinite
    pub fn is_finite(&self) -> bool {
        self.roll.is_finite() && self.pitch.is_finite() && self.yaw.is_finite()
    }
}

/// Which fusion path the filter was driven through on a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FusionMode {
    /// Gyroscope and accelerometer only
    SixAxis,
    /// Gyroscope, accelerometer and magnetometer
    NineAxis,
}

/// The output channel currently carrying telemetry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkState {
    /// Network datagram channel
    Primary,
    /// Local point-to-point stream
    #[default]
    Fallback,
}

impl LinkState {
    /// Name used on the wire in `TRANSPORT` lines
    pub fn wire_name(self) -> &'static str {
        match self {
            LinkState::Primary => "wifi",
            LinkState::Fallback => "serial",
        }
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}
