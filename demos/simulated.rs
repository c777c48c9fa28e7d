//! Runs the full tracker against simulated sensors
//!
//! Telemetry goes to the UDP listener named in the config (default
//! `192.168.1.100:4210`), or to stdout when that link cannot be opened.
//! Logs go to stderr.
//!
//! ```text
//! cargo run --example simulated -- [config.toml]
//! RUST_LOG=debug cargo run --example simulated
//! ```

use std::f32::consts::PI;
use std::time::Instant;

use fusion_link::{
    Config, ImuDriver, MagDriver, Madgwick, Parts, StreamChannel, SystemClock, Tracker, UdpChannel,
};
use nalgebra::Vector3;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// A device turning slowly about its vertical axis while rocking a little
struct SimulatedImu {
    origin: Instant,
}

impl SimulatedImu {
    fn phase(&self) -> f32 {
        self.origin.elapsed().as_secs_f32() * 0.2 * 2.0 * PI
    }
}

impl ImuDriver for SimulatedImu {
    type Error = std::convert::Infallible;

    fn probe(&mut self) -> bool {
        true
    }

    fn init(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn auto_offsets(&mut self) {}

    fn accel(&mut self) -> Vector3<f32> {
        let tilt = 0.1 * self.phase().sin();
        Vector3::new(0.0, tilt, (1.0 - tilt * tilt).sqrt())
    }

    fn gyro(&mut self) -> Vector3<f32> {
        Vector3::new(4.0 * self.phase().cos(), 0.0, 45.0)
    }
}

/// A field that turns with the device
struct SimulatedMag {
    origin: Instant,
}

impl MagDriver for SimulatedMag {
    fn probe(&mut self) -> bool {
        true
    }

    fn init(&mut self) {}

    fn read_raw(&mut self) -> Vector3<i16> {
        let heading = (self.origin.elapsed().as_secs_f32() * 45.0).to_radians();
        Vector3::new(
            (220.0 * heading.cos()) as i16,
            (-220.0 * heading.sin()) as i16,
            -380,
        )
    }
}

fn main() -> Result<(), fusion_link::Error> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    tracing::info!("Starting fusion-link v{}", env!("CARGO_PKG_VERSION"));

    let origin = Instant::now();
    let parts = Parts {
        imu: SimulatedImu { origin },
        mag: SimulatedMag { origin },
        filter: Madgwick::from_config(&config.filter),
        primary: UdpChannel::from_config(&config.network),
        fallback: StreamChannel::stdout(),
    };

    let mut tracker = Tracker::start(&config, parts, SystemClock::new())?;
    tracker.run()
}
