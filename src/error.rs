//! Error types

/// Errors surfaced to the host
///
/// Only [`Error::ImuInit`] can occur once the pipeline is assembled; every
/// steady-state condition is reported as data instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The IMU did not come up at startup. Nothing can be estimated without it.
    #[error("IMU failed to initialise: {0}")]
    ImuInit(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Reasons a received telemetry line could not be decoded
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("empty line")]
    Empty,

    #[error("unrecognised line: {0}")]
    Unrecognized(String),

    #[error("{kind} expects {expected} fields, found {found}")]
    FieldCount {
        kind: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("bad number: {0}")]
    InvalidNumber(String),

    #[error("non-finite angle")]
    NonFinite,

    #[error("bad status flag: {0}")]
    InvalidFlag(String),

    #[error("unknown transport: {0}")]
    UnknownTransport(String),
}
