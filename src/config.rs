//! Runtime configuration
//!
//! Every section carries defaults matching the reference firmware, so a TOML
//! file only needs to name the values it changes:
//!
//! ```
//! use fusion_link::Config;
//!
//! let config = Config::from_toml_str(r#"
//!     [network]
//!     server_addr = "10.0.0.7:4210"
//!
//!     [smoothing]
//!     alpha = 0.3
//! "#).unwrap();
//!
//! assert_eq!(config.network.server_addr, "10.0.0.7:4210");
//! assert_eq!(config.smoothing.alpha, 0.3);
//! assert_eq!(config.intervals.sample_ms, 10);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::calibration::HMC5883L_UT_PER_LSB;
use crate::error::Error;

/// Complete configuration tree
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub network: NetworkConfig,
    pub calibration: CalibrationConfig,
    pub smoothing: SmoothingConfig,
    pub filter: FilterConfig,
    pub intervals: IntervalConfig,
}

impl Config {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self, Error> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<(), Error> {
        let alpha = self.smoothing.alpha;
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(invalid(format!("smoothing.alpha must be in (0, 1], got {alpha}")));
        }

        if !(self.filter.sample_rate_hz.is_finite() && self.filter.sample_rate_hz > 0.0) {
            return Err(invalid("filter.sample_rate_hz must be positive"));
        }
        if !(self.filter.beta.is_finite() && self.filter.beta >= 0.0) {
            return Err(invalid("filter.beta must be non-negative"));
        }

        let intervals = &self.intervals;
        for (name, value) in [
            ("sample_ms", intervals.sample_ms),
            ("health_ms", intervals.health_ms),
            ("link_ms", intervals.link_ms),
            ("diag_ms", intervals.diag_ms),
        ] {
            if value == 0 {
                return Err(invalid(format!("intervals.{name} must be greater than zero")));
            }
        }

        let cal = &self.calibration;
        let finite = cal.mag_offset.iter().chain(&cal.mag_scale).all(|v| v.is_finite())
            && cal.mag_ut_per_lsb.is_finite();
        if !finite {
            return Err(invalid("calibration values must be finite"));
        }
        if cal.mag_scale.contains(&0.0) || cal.mag_ut_per_lsb == 0.0 {
            return Err(invalid("calibration scales must be non-zero"));
        }

        if let Some(backoff) = &self.network.reconnect.backoff {
            if backoff.initial_ms == 0 || backoff.initial_ms > backoff.max_ms {
                return Err(invalid("network.reconnect.backoff needs 0 < initial_ms <= max_ms"));
            }
        }

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> Error {
    Error::InvalidConfig(message.into())
}

/// Network link and datagram destination
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Network name, reported when the link is opened
    ///
    /// Joining the network belongs to the platform; a datagram channel has
    /// no credentials of its own.
    pub ssid: String,
    /// Listener address telemetry datagrams are sent to
    pub server_addr: String,
    /// Local address the datagram socket binds to
    pub bind_addr: String,
    /// Bound on the startup connection attempt
    pub connect_timeout_ms: u64,
    /// Bound on each supervisory reconnect attempt (0 = do not wait)
    pub reconnect_timeout_ms: u64,
    pub reconnect: ReconnectConfig,
}

impl NetworkConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn reconnect_timeout(&self) -> Duration {
        Duration::from_millis(self.reconnect_timeout_ms)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            ssid: String::new(),
            server_addr: "192.168.1.100:4210".to_string(),
            bind_addr: "0.0.0.0:0".to_string(),
            connect_timeout_ms: 5000,
            reconnect_timeout_ms: 0,
            reconnect: ReconnectConfig::default(),
        }
    }
}

/// When the transport tries to bring the primary link back
///
/// The default only retries a link that has worked at least once, with one
/// attempt per supervisory check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    /// Also retry a link that never came up at startup
    pub retry_never_connected: bool,
    /// Space failed attempts exponentially instead of every check
    pub backoff: Option<BackoffConfig>,
}

/// Exponential spacing of failed reconnect attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    /// Delay after the first failed attempt
    pub initial_ms: u64,
    /// Upper bound on the delay
    pub max_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_ms: 2000,
            max_ms: 60_000,
        }
    }
}

/// Magnetometer correction coefficients
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Hard-iron offset per axis, raw counts
    pub mag_offset: [f32; 3],
    /// Soft-iron scale per axis
    pub mag_scale: [f32; 3],
    /// Sensor sensitivity, µT per count
    pub mag_ut_per_lsb: f32,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            mag_offset: [0.0; 3],
            mag_scale: [1.0; 3],
            mag_ut_per_lsb: HMC5883L_UT_PER_LSB,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// EMA weight of each new estimate; lower is smoother with more lag
    pub alpha: f32,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self { alpha: 0.15 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Rate the filter is stepped at, Hz
    pub sample_rate_hz: f32,
    /// Gradient-descent gain
    pub beta: f32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 100.0,
            beta: 0.1,
        }
    }
}

/// Cadence of each scheduled task, milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IntervalConfig {
    pub sample_ms: u64,
    pub health_ms: u64,
    pub link_ms: u64,
    pub diag_ms: u64,
}

impl Default for IntervalConfig {
    fn default() -> Self {
        Self {
            sample_ms: 10,
            health_ms: 500,
            link_ms: 2000,
            diag_ms: 3000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.smoothing.alpha, 0.15);
        assert_eq!(config.intervals.health_ms, 500);
        assert_eq!(config.network.connect_timeout(), Duration::from_secs(5));
        assert!(!config.network.reconnect.retry_never_connected);
        assert!(config.network.reconnect.backoff.is_none());
    }

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = Config::from_toml_str(
            r#"
            [calibration]
            mag_offset = [12.5, -3.0, 40.0]

            [network.reconnect]
            retry_never_connected = true

            [network.reconnect.backoff]
            max_ms = 10000
            "#,
        )
        .unwrap();

        assert_eq!(config.calibration.mag_offset, [12.5, -3.0, 40.0]);
        assert_eq!(config.calibration.mag_scale, [1.0; 3]);
        assert!(config.network.reconnect.retry_never_connected);
        assert_eq!(
            config.network.reconnect.backoff,
            Some(BackoffConfig {
                initial_ms: 2000,
                max_ms: 10000
            })
        );
    }

    #[test]
    fn test_rejects_out_of_range_alpha() {
        for alpha in ["0.0", "1.5", "-0.2"] {
            let text = format!("[smoothing]\nalpha = {alpha}");
            let err = Config::from_toml_str(&text).unwrap_err();
            assert!(matches!(err, Error::InvalidConfig(_)), "alpha {alpha}: {err}");
        }
        assert!(Config::from_toml_str("[smoothing]\nalpha = 1.0").is_ok());
    }

    #[test]
    fn test_rejects_zero_interval() {
        let err = Config::from_toml_str("[intervals]\nlink_ms = 0").unwrap_err();
        assert!(err.to_string().contains("link_ms"));
    }

    #[test]
    fn test_rejects_zero_scale() {
        let err = Config::from_toml_str("[calibration]\nmag_scale = [1.0, 0.0, 1.0]").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_inverted_backoff() {
        let text = "[network.reconnect.backoff]\ninitial_ms = 5000\nmax_ms = 1000";
        assert!(Config::from_toml_str(text).is_err());
    }

    #[test]
    fn test_reports_parse_errors() {
        let err = Config::from_toml_str("[smoothing]\nalpha = \"fast\"").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn test_network_credentials_are_not_kept() {
        // Files written for the firmware also carry the network password
        let config = Config::from_toml_str(
            r#"
            [network]
            ssid = "workshop"
            password = "hunter2"
            "#,
        )
        .unwrap();
        assert_eq!(config.network.ssid, "workshop");
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
