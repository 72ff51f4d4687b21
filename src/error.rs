use thiserror::Error;

#[derive(Error, Debug)]
pub enum PriceEngineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid current price {0}: must be a finite number greater than zero")]
    InvalidPrice(f64),

    #[error("Synthetic signal cannot be anchored: final raw value is {0}")]
    DegenerateSignal(f64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Date calculation error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PriceEngineError>;
