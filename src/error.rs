use thiserror::Error;

#[derive(Error, Debug)]
pub enum MoeecError {
    #[error("Invalid probability: {0} (must be within [0, 1])")]
    InvalidProbability(f64),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported option: {0}")]
    UnsupportedOption(String),

    #[error("Index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Evaluation error: {0}")]
    Evaluation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MoeecError>;

/// Rejects probabilities outside `[0, 1]` (NaN included).
pub fn check_probability(p: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err(MoeecError::InvalidProbability(p))
    }
}
