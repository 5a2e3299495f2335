use thiserror::Error;

#[derive(Debug, Error)]
pub enum SensorError {
    #[error("accelerometer read timeout")]
    Timeout,
    #[error("accelerometer data-ready timeout")]
    DataReadyTimeout,
}

pub type Result<T> = std::result::Result<T, SensorError>;
