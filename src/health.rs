//! Sensor presence monitoring

use tracing::{info, warn};

use crate::sensors::{ImuDriver, MagDriver};
use crate::types::SensorHealth;

/// Probes both sensors and tracks their up/down state
///
/// A missing sensor is reported as `false`, never as an error. Refreshing
/// does not touch any data the pipeline already holds: a down sensor's last
/// reading stays wherever it was.
#[derive(Debug, Clone, Copy, Default)]
pub struct HealthMonitor {
    last: SensorHealth,
}

impl HealthMonitor {
    /// Start from an already known state, typically the startup probe
    pub fn new(initial: SensorHealth) -> Self {
        Self { last: initial }
    }

    /// Probe both sensors and return their current state
    ///
    /// Changes are logged; the returned state is the heartbeat either way.
    pub fn refresh<I, M>(&mut self, imu: &mut I, mag: &mut M) -> SensorHealth
    where
        I: ImuDriver,
        M: MagDriver,
    {
        let health = SensorHealth {
            imu_ok: imu.probe(),
            mag_ok: mag.probe(),
        };

        log_change("IMU", self.last.imu_ok, health.imu_ok);
        log_change("magnetometer", self.last.mag_ok, health.mag_ok);

        self.last = health;
        health
    }

    /// State as of the last refresh
    pub fn current(&self) -> SensorHealth {
        self.last
    }
}

fn log_change(sensor: &str, was: bool, now: bool) {
    match (was, now) {
        (true, false) => warn!(sensor, "sensor stopped responding"),
        (false, true) => info!(sensor, "sensor responding again"),
        _ => {}
    }
}
