//! Sensor driver seams
//!
//! Register programming and bus decoding live in the driver crates. The
//! pipeline only needs the handful of operations below, which also makes the
//! drivers easy to replace with simulated ones.

use core::fmt::Debug;

use nalgebra::Vector3;

use crate::types::{RawSample, SensorHealth};

/// Inertial measurement unit (accelerometer + gyroscope)
pub trait ImuDriver {
    type Error: Debug;

    /// Check that the device answers on its bus
    fn probe(&mut self) -> bool;

    /// Configure the device for sampling
    fn init(&mut self) -> Result<(), Self::Error>;

    /// Measure and store resting biases; the device must be still
    fn auto_offsets(&mut self);

    /// Acceleration in g
    fn accel(&mut self) -> Vector3<f32>;

    /// Angular rate in degrees per second
    fn gyro(&mut self) -> Vector3<f32>;
}

/// Three-axis magnetometer
pub trait MagDriver {
    /// Check that the device answers on its bus
    fn probe(&mut self) -> bool;

    fn init(&mut self);

    /// Field in raw counts
    fn read_raw(&mut self) -> Vector3<i16>;
}

impl RawSample {
    /// Take one reading from every sensor the health monitor reports up
    ///
    /// Returns `None` when the IMU is down. A down magnetometer is not read
    /// and leaves `mag_raw` zeroed with `mag_valid` false.
    pub fn read<I, M>(imu: &mut I, mag: &mut M, health: SensorHealth) -> Option<Self>
    where
        I: ImuDriver,
        M: MagDriver,
    {
        if !health.imu_ok {
            return None;
        }

        let accel = imu.accel();
        let gyro = imu.gyro();
        let (mag_raw, mag_valid) = if health.mag_ok {
            (mag.read_raw(), true)
        } else {
            (Vector3::zeros(), false)
        };

        Some(Self {
            accel,
            gyro,
            mag_raw,
            mag_valid,
        })
    }
}
