//! Line protocol spoken to the listener
//!
//! One event per line, comma separated, no quoting:
//!
//! ```text
//! TRANSPORT,<wifi|serial>
//! STATUS,<imu_ok:0|1>,<mag_ok:0|1>
//! EULER,<roll>,<pitch>,<yaw>        (two decimals)
//! ```
//!
//! Every field is produced from numbers or fixed keywords, so no value can
//! contain a comma or a line break.

use core::fmt;
use core::str::FromStr;

use nalgebra::Vector3;

use crate::error::DecodeError;
use crate::types::{Euler, LinkState, SensorHealth};

/// Snapshot of the most recent sample, for the console
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Diagnostics {
    pub accel: Vector3<f32>,
    pub gyro: Vector3<f32>,
    /// Calibrated field in µT, zero when not read
    pub mag: Vector3<f32>,
    /// Whether the sample went through 9-axis fusion
    pub mag_valid: bool,
    /// Unsmoothed filter output
    pub euler: Euler,
}

/// An outgoing telemetry event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Telemetry {
    Transport(LinkState),
    Status(SensorHealth),
    Euler(Euler),
    Diag(Diagnostics),
}

impl fmt::Display for Telemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Telemetry::Transport(state) => write!(f, "TRANSPORT,{state}"),
            Telemetry::Status(health) => write!(
                f,
                "STATUS,{},{}",
                u8::from(health.imu_ok),
                u8::from(health.mag_ok)
            ),
            Telemetry::Euler(e) => write!(f, "EULER,{:.2},{:.2},{:.2}", e.roll, e.pitch, e.yaw),
            Telemetry::Diag(d) => write!(
                f,
                "DIAG: a=({:.2},{:.2},{:.2}) g=({:.1},{:.1},{:.1}) m=({:.1},{:.1},{:.1}) magValid={} RPY=({:.1},{:.1},{:.1})",
                d.accel.x,
                d.accel.y,
                d.accel.z,
                d.gyro.x,
                d.gyro.y,
                d.gyro.z,
                d.mag.x,
                d.mag.y,
                d.mag.z,
                u8::from(d.mag_valid),
                d.euler.roll,
                d.euler.pitch,
                d.euler.yaw,
            ),
        }
    }
}

/// A decoded telemetry line, as seen by the listener
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TelemetryLine {
    Transport(LinkState),
    Status(SensorHealth),
    Euler(Euler),
}

impl FromStr for TelemetryLine {
    type Err = DecodeError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        if line.is_empty() {
            return Err(DecodeError::Empty);
        }

        let fields: Vec<&str> = line.split(',').collect();
        match fields[0] {
            "TRANSPORT" => {
                expect_fields("TRANSPORT", &fields, 2)?;
                let state = match fields[1].trim() {
                    "wifi" => LinkState::Primary,
                    "serial" => LinkState::Fallback,
                    other => return Err(DecodeError::UnknownTransport(other.to_string())),
                };
                Ok(TelemetryLine::Transport(state))
            }
            "STATUS" => {
                expect_fields("STATUS", &fields, 3)?;
                Ok(TelemetryLine::Status(SensorHealth {
                    imu_ok: parse_flag(fields[1])?,
                    mag_ok: parse_flag(fields[2])?,
                }))
            }
            "EULER" => {
                expect_fields("EULER", &fields, 4)?;
                let euler = Euler::new(
                    parse_angle(fields[1])?,
                    parse_angle(fields[2])?,
                    parse_angle(fields[3])?,
                );
                if !euler.is_finite() {
                    return Err(DecodeError::NonFinite);
                }
                Ok(TelemetryLine::Euler(euler))
            }
            _ => Err(DecodeError::Unrecognized(line.to_string())),
        }
    }
}

fn expect_fields(kind: &'static str, fields: &[&str], expected: usize) -> Result<(), DecodeError> {
    if fields.len() == expected {
        Ok(())
    } else {
        Err(DecodeError::FieldCount {
            kind,
            expected,
            found: fields.len(),
        })
    }
}

fn parse_flag(field: &str) -> Result<bool, DecodeError> {
    match field.trim() {
        "1" => Ok(true),
        "0" => Ok(false),
        other => Err(DecodeError::InvalidFlag(other.to_string())),
    }
}

fn parse_angle(field: &str) -> Result<f32, DecodeError> {
    field
        .trim()
        .parse()
        .map_err(|_| DecodeError::InvalidNumber(field.to_string()))
}
