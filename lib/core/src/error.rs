use thiserror::Error;

use crate::population::PopulationLabel;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Population is empty: {0}")]
    EmptyPopulation(PopulationLabel),

    #[error("Malformed embedding: {0}")]
    MalformedEmbedding(String),

    #[error("Non-finite drift score: {0}")]
    NonFiniteScore(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Training error: {0}")]
    Training(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Input errors that must abort an evaluation cycle instead of degrading.
    pub fn is_fatal_input(&self) -> bool {
        matches!(
            self,
            Error::InvalidDimension { .. } | Error::MalformedEmbedding(_) | Error::NonFiniteScore(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
