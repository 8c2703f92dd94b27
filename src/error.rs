use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EnvError>;

#[derive(Debug, Error)]
pub enum EnvError {
    /// `step` before the first `reset`, or after the episode finished.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to read objective file {}: {source}", path.display())]
    Objectives {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("action index {index} out of range for an action table of {len} entries")]
    ActionOutOfRange { index: usize, len: usize },

    #[error("emulation engine error: {0}")]
    Engine(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl EnvError {
    pub fn engine<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Engine(err.into())
    }
}
