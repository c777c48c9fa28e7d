//! Orientation filter seam and the default Madgwick implementation

use nalgebra::{Matrix3x4, Quaternion, UnitQuaternion, Vector3};

use crate::config::FilterConfig;
use crate::math::{RAD_TO_DEG, Vector3Ext};
use crate::types::Euler;

/// An attitude filter stepped once per sample at a fixed rate
///
/// Inputs are gyroscope in degrees per second, accelerometer in g and
/// magnetometer in µT. Angle accessors return degrees and may return NaN
/// while the filter is settling; callers are expected to check.
pub trait OrientationFilter {
    /// Step with inertial sensors only
    fn update6(&mut self, gyro: Vector3<f32>, accel: Vector3<f32>);

    /// Step with inertial sensors and a magnetic heading reference
    fn update9(&mut self, gyro: Vector3<f32>, accel: Vector3<f32>, mag: Vector3<f32>);

    fn roll(&self) -> f32;

    fn pitch(&self) -> f32;

    fn yaw(&self) -> f32;

    /// All three angles at once
    fn euler(&self) -> Euler {
        Euler::new(self.roll(), self.pitch(), self.yaw())
    }
}

/// Madgwick gradient-descent orientation filter
///
/// Yaw is reported as a heading in [0, 360]; roll and pitch in [-180, 180].
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use fusion_link::{Madgwick, OrientationFilter};
///
/// let mut filter = Madgwick::new(100.0, 0.1);
/// for _ in 0..100 {
///     filter.update6(Vector3::zeros(), Vector3::new(0.0, 0.0, 1.0));
/// }
/// assert!(filter.roll().abs() < 1.0);
/// assert!(filter.pitch().abs() < 1.0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Madgwick {
    /// Sensor-to-earth rotation
    quaternion: UnitQuaternion<f32>,
    /// Gradient-descent step gain
    beta: f32,
    /// Fixed sample period in seconds
    sample_period: f32,
}

impl Madgwick {
    pub fn new(sample_rate_hz: f32, beta: f32) -> Self {
        Self {
            quaternion: UnitQuaternion::identity(),
            beta,
            sample_period: 1.0 / sample_rate_hz,
        }
    }

    pub fn from_config(config: &FilterConfig) -> Self {
        Self::new(config.sample_rate_hz, config.beta)
    }

    pub fn quaternion(&self) -> UnitQuaternion<f32> {
        self.quaternion
    }

    /// Return to the identity orientation
    pub fn reset(&mut self) {
        self.quaternion = UnitQuaternion::identity();
    }

    /// Normalized objective-function gradient for gravity and, optionally,
    /// the magnetic field. Zero when there is nothing to correct against.
    fn gradient(&self, accel: Vector3<f32>, mag: Option<Vector3<f32>>) -> Quaternion<f32> {
        let q = self.quaternion.as_ref();
        let (q0, q1, q2, q3) = (q.w, q.i, q.j, q.k);

        let a = accel.safe_normalize();
        let gravity_error = Vector3::new(
            2.0 * (q1 * q3 - q0 * q2) - a.x,
            2.0 * (q0 * q1 + q2 * q3) - a.y,
            2.0 * (0.5 - q1 * q1 - q2 * q2) - a.z,
        );
        #[rustfmt::skip]
        let gravity_jacobian = Matrix3x4::new(
            -2.0 * q2,  2.0 * q3, -2.0 * q0, 2.0 * q1,
             2.0 * q1,  2.0 * q0,  2.0 * q3, 2.0 * q2,
             0.0,      -4.0 * q1, -4.0 * q2, 0.0,
        );
        let mut step = gravity_jacobian.transpose() * gravity_error;

        if let Some(mag) = mag {
            let m = mag.safe_normalize();
            // Earth-frame field, folded onto the x-z plane
            let h = self.quaternion * m;
            let bx = (h.x * h.x + h.y * h.y).sqrt();
            let bz = h.z;

            let field_error = Vector3::new(
                2.0 * bx * (0.5 - q2 * q2 - q3 * q3) + 2.0 * bz * (q1 * q3 - q0 * q2) - m.x,
                2.0 * bx * (q1 * q2 - q0 * q3) + 2.0 * bz * (q0 * q1 + q2 * q3) - m.y,
                2.0 * bx * (q0 * q2 + q1 * q3) + 2.0 * bz * (0.5 - q1 * q1 - q2 * q2) - m.z,
            );
            #[rustfmt::skip]
            let field_jacobian = Matrix3x4::new(
                -2.0 * bz * q2,
                2.0 * bz * q3,
                -4.0 * bx * q2 - 2.0 * bz * q0,
                -4.0 * bx * q3 + 2.0 * bz * q1,

                -2.0 * bx * q3 + 2.0 * bz * q1,
                2.0 * bx * q2 + 2.0 * bz * q0,
                2.0 * bx * q1 + 2.0 * bz * q3,
                -2.0 * bx * q0 + 2.0 * bz * q2,

                2.0 * bx * q2,
                2.0 * bx * q3 - 4.0 * bz * q1,
                2.0 * bx * q0 - 4.0 * bz * q2,
                2.0 * bx * q1,
            );
            step += field_jacobian.transpose() * field_error;
        }

        let norm = step.norm();
        if norm > 0.0 {
            step /= norm;
        }
        Quaternion::new(step[0], step[1], step[2], step[3])
    }

    fn step(&mut self, gyro: Vector3<f32>, accel: Vector3<f32>, mag: Option<Vector3<f32>>) {
        let omega = Quaternion::from_parts(0.0, gyro.deg_to_rad());
        let mut rate = self.quaternion.as_ref() * omega * 0.5;

        // Without a gravity reading there is nothing to descend on
        if accel.norm() > 0.0 {
            rate -= self.gradient(accel, mag) * self.beta;
        }

        let integrated = self.quaternion.as_ref() + rate * self.sample_period;
        let coords = integrated.coords;
        if coords.iter().all(|c| c.is_finite()) && coords.norm() > 0.0 {
            self.quaternion = UnitQuaternion::from_quaternion(integrated);
        }
    }
}

impl Default for Madgwick {
    fn default() -> Self {
        Self::from_config(&FilterConfig::default())
    }
}

impl OrientationFilter for Madgwick {
    fn update6(&mut self, gyro: Vector3<f32>, accel: Vector3<f32>) {
        self.step(gyro, accel, None);
    }

    fn update9(&mut self, gyro: Vector3<f32>, accel: Vector3<f32>, mag: Vector3<f32>) {
        if mag.norm() > 0.0 {
            self.step(gyro, accel, Some(mag));
        } else {
            self.step(gyro, accel, None);
        }
    }

    fn roll(&self) -> f32 {
        let q = self.quaternion.as_ref();
        (q.w * q.i + q.j * q.k).atan2(0.5 - q.i * q.i - q.j * q.j) * RAD_TO_DEG
    }

    /// NaN when the sine rounds past ±1 near vertical
    fn pitch(&self) -> f32 {
        let q = self.quaternion.as_ref();
        (-2.0 * (q.i * q.k - q.w * q.j)).asin() * RAD_TO_DEG
    }

    fn yaw(&self) -> f32 {
        let q = self.quaternion.as_ref();
        (q.i * q.j + q.w * q.k).atan2(0.5 - q.j * q.j - q.k * q.k) * RAD_TO_DEG + 180.0
    }
}
