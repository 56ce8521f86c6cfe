use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Insufficient history: {required} points required, got {actual}")]
    InsufficientHistory { required: usize, actual: usize },

    #[error("Invalid simulation parameters: {0}")]
    InvalidSimulationParams(String),

    #[error("Data fetch failed: {0}")]
    DataFetch(String),

    #[error("Text generation failed: {0}")]
    TextGeneration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
