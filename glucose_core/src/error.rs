use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GlucoseError {
    #[error("store error: {0}")]
    Store(String),
    #[error("store conflict: {0}")]
    Conflict(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("decision engine error: {0}")]
    Engine(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("missing glucose status")]
    MissingGlucoseStatus,
    #[error("missing profile")]
    MissingProfile,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
