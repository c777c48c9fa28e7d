//! [![license]](https://opensource.org/licenses/MIT)
//!
//! [license]: https://img.shields.io/badge/License-MIT-blue.svg?style=for-the-badge&labelColor=555555
//!
//! Fusion Link - orientation tracking from IMU and magnetometer samples to a
//! remote listener
//!
//! The pipeline reads an accelerometer, gyroscope and (optionally) a
//! magnetometer at a fixed rate, fuses them into roll/pitch/yaw, smooths the
//! angles without glitching across the 0°/360° seam and streams the result
//! as newline-terminated text lines over a primary link, failing over to a
//! local channel when the link drops.
//!
//! # Features
//!
//! - Madgwick filter with per-tick 6-axis/9-axis selection
//! - Wraparound-aware exponential smoothing
//! - Sensor health heartbeat; a missing magnetometer never stops the stream
//! - Primary/fallback transport with configurable reconnect policy
//! - Text telemetry protocol with an encoder and a validating decoder
//! - Cooperative fixed-interval scheduling over an injectable clock
//!
//! # Quick Start
//!
//! ```rust
//! use fusion_link::{AngleSmoother, Madgwick, OrientationFilter, Telemetry};
//! use nalgebra::Vector3;
//!
//! let mut filter = Madgwick::new(100.0, 0.1);
//! let mut smoother = AngleSmoother::new(0.15);
//!
//! // deg/s and g
//! filter.update6(Vector3::new(0.0, 0.0, 1.0), Vector3::new(0.0, 0.0, 1.0));
//!
//! let smoothed = smoother.update(filter.euler());
//! let line = Telemetry::Euler(smoothed).to_string();
//! assert!(line.starts_with("EULER,"));
//! ```
//!
//! The full loop is assembled by [`Tracker`] from a [`Config`], the sensor
//! drivers, a filter and the two output channels.

pub mod calibration;
pub mod config;
mod error;
mod filter;
mod fusion;
mod health;
pub mod math;
mod net;
pub mod scheduler;
mod sensors;
pub mod smoothing;
pub mod telemetry;
mod tracker;
pub mod transport;
mod types;

// Re-export all public types and functions
pub use calibration::{MagCalibration, MagExtremes};
pub use config::Config;
pub use error::{DecodeError, Error};
pub use filter::{Madgwick, OrientationFilter};
pub use fusion::{FusionAdapter, FusionOutcome};
pub use health::HealthMonitor;
pub use math::{DEG_TO_RAD, RAD_TO_DEG, Vector3Ext};
pub use net::{StreamChannel, UdpChannel};
pub use scheduler::{Clock, ManualClock, Scheduler, SystemClock};
pub use sensors::{ImuDriver, MagDriver};
pub use smoothing::AngleSmoother;
pub use telemetry::{Diagnostics, Telemetry, TelemetryLine};
pub use tracker::{Parts, Tracker};
pub use transport::{Channel, PrimaryChannel, TransportManager};
pub use types::*;
