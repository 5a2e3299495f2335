use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum StrideError {
    #[error("sensor error: {0}")]
    Sensor(String),
    #[error("sensor fault: {0}")]
    SensorFault(String),
    #[error("speed sink error: {0}")]
    Sink(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("timeout waiting for sensor")]
    Timeout,
    #[error("invalid state: {0}")]
    State(String),
    #[error("io error: {0}")]
    Io(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing speed sink")]
    MissingSink,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
