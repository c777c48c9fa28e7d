//! The orientation tracker: every stage wired to one cooperative loop
//!
//! All mutable state lives in [`Tracker`] and is touched only from the thread
//! calling [`Tracker::poll`]. Within a sampling tick the order is fixed:
//! read, fuse, smooth, encode, send.

use std::thread;
use std::time::Duration;

use nalgebra::Vector3;
use tracing::{debug, info, warn};

use crate::calibration::MagCalibration;
use crate::config::Config;
use crate::error::Error;
use crate::filter::OrientationFilter;
use crate::fusion::{FusionAdapter, FusionOutcome};
use crate::health::HealthMonitor;
use crate::scheduler::{Clock, Scheduler};
use crate::sensors::{ImuDriver, MagDriver};
use crate::smoothing::AngleSmoother;
use crate::telemetry::{Diagnostics, Telemetry};
use crate::transport::{Channel, PrimaryChannel, TransportManager};
use crate::types::{Euler, FusionMode, LinkState, RawSample, SensorHealth};

/// Work the loop dispatches, in the order it runs within one poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Task {
    Link,
    Health,
    Sample,
    Diag,
}

/// Collaborators handed to the tracker at startup
pub struct Parts<I, M, F, P, S> {
    pub imu: I,
    pub mag: M,
    pub filter: F,
    pub primary: P,
    pub fallback: S,
}

/// Process context for the whole pipeline
pub struct Tracker<I, M, F, P, S, C> {
    imu: I,
    mag: M,
    health: HealthMonitor,
    fusion: FusionAdapter<F>,
    smoother: AngleSmoother,
    transport: TransportManager<P, S>,
    scheduler: Scheduler<Task>,
    clock: C,
    last_sample: Option<Diagnostics>,
}

impl<I, M, F, P, S, C> Tracker<I, M, F, P, S, C>
where
    I: ImuDriver,
    M: MagDriver,
    F: OrientationFilter,
    P: PrimaryChannel,
    S: Channel,
    C: Clock,
{
    /// Bring up sensors and transport and announce the starting channel
    ///
    /// Fails only when the IMU cannot be initialised. That is the one fault
    /// the pipeline cannot run through; the host decides whether to exit or
    /// restart.
    pub fn start(config: &Config, parts: Parts<I, M, F, P, S>, clock: C) -> Result<Self, Error> {
        config.validate()?;
        let Parts {
            mut imu,
            mut mag,
            filter,
            primary,
            fallback,
        } = parts;

        let initial = SensorHealth {
            imu_ok: imu.probe(),
            mag_ok: mag.probe(),
        };
        info!(imu = initial.imu_ok, mag = initial.mag_ok, "sensor probe");

        if !initial.imu_ok {
            return Err(Error::ImuInit("device not responding".to_string()));
        }
        imu.init().map_err(|e| Error::ImuInit(format!("{e:?}")))?;
        info!("IMU calibrating offsets, keep still");
        imu.auto_offsets();
        info!("IMU ready");

        if initial.mag_ok {
            mag.init();
            info!("magnetometer ready");
        } else {
            warn!("magnetometer not found, running 6-axis");
        }

        let network = &config.network;
        let mut transport = TransportManager::start(
            primary,
            fallback,
            network.connect_timeout(),
            network.reconnect_timeout(),
            network.reconnect,
        );
        transport.send(&Telemetry::Transport(transport.state()).to_string());

        let intervals = &config.intervals;
        let scheduler = Scheduler::new(clock.now())
            .every(ms(intervals.link_ms), Task::Link)
            .every(ms(intervals.health_ms), Task::Health)
            .every(ms(intervals.sample_ms), Task::Sample)
            .every(ms(intervals.diag_ms), Task::Diag);

        Ok(Self {
            imu,
            mag,
            health: HealthMonitor::new(initial),
            fusion: FusionAdapter::new(filter, MagCalibration::from(&config.calibration)),
            smoother: AngleSmoother::new(config.smoothing.alpha),
            transport,
            scheduler,
            clock,
            last_sample: None,
        })
    }

    /// Run whatever is due now; never blocks on a task that is not
    pub fn poll(&mut self) {
        let now = self.clock.now();
        let due: Vec<Task> = self.scheduler.due(now).collect();
        for task in due {
            match task {
                Task::Link => self.supervise_link(now),
                Task::Health => self.refresh_health(),
                Task::Sample => self.sample(),
                Task::Diag => self.dump_diagnostics(),
            }
        }
    }

    /// Poll forever, sleeping until the next task is due
    pub fn run(&mut self) -> ! {
        loop {
            self.poll();
            let idle = self.scheduler.until_next(self.clock.now());
            if !idle.is_zero() {
                thread::sleep(idle);
            }
        }
    }

    pub fn link_state(&self) -> LinkState {
        self.transport.state()
    }

    pub fn health(&self) -> SensorHealth {
        self.health.current()
    }

    /// The smoothed orientation, once the first valid estimate has arrived
    pub fn orientation(&self) -> Option<Euler> {
        self.smoother.current()
    }

    pub fn transport(&self) -> &TransportManager<P, S> {
        &self.transport
    }

    fn supervise_link(&mut self, now: Duration) {
        if let Some(state) = self.transport.supervise(now) {
            self.transport.send(&Telemetry::Transport(state).to_string());
        }
    }

    fn refresh_health(&mut self) {
        let health = self.health.refresh(&mut self.imu, &mut self.mag);
        self.transport.send(&Telemetry::Status(health).to_string());
    }

    fn sample(&mut self) {
        let health = self.health.current();
        let Some(raw) = RawSample::read(&mut self.imu, &mut self.mag, health) else {
            return;
        };

        let outcome = self.fusion.advance(&raw, health);
        self.record(&raw, outcome);

        if let Some(estimate) = outcome.estimate() {
            let smoothed = self.smoother.update(estimate);
            self.transport.send(&Telemetry::Euler(smoothed).to_string());
        }
    }

    fn record(&mut self, raw: &RawSample, outcome: FusionOutcome) {
        let mag = if raw.mag_valid {
            self.fusion.calibration().apply(raw.mag_raw)
        } else {
            Vector3::zeros()
        };
        self.last_sample = Some(Diagnostics {
            accel: raw.accel,
            gyro: raw.gyro,
            mag,
            mag_valid: outcome.mode() == Some(FusionMode::NineAxis),
            euler: self.fusion.filter().euler(),
        });
    }

    fn dump_diagnostics(&mut self) {
        if !self.health.current().imu_ok {
            return;
        }
        if let Some(diag) = self.last_sample {
            debug!(?diag, "diagnostics");
            self.transport.send_local(&Telemetry::Diag(diag).to_string());
        }
    }
}

fn ms(ms: u64) -> Duration {
    Duration::from_millis(ms)
}
