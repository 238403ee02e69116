//! Error types shared across the crate
//!
//! The simulation loop itself never fails; these cover startup (config,
//! sprites) and the evolutionary optimizer.

use std::path::PathBuf;

use thiserror::Error;

/// Configuration loading and validation failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to load configuration")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Sprite loading failures
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read sprite {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode sprite {path}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("sprite buffer of {actual} bytes does not match {width}x{height} RGBA")]
    Dimensions {
        width: u32,
        height: u32,
        actual: usize,
    },
}

/// Evolutionary optimizer failures
#[derive(Debug, Error)]
pub enum NeatError {
    #[error("all species went extinct")]
    CompleteExtinction,

    #[error("population is empty")]
    EmptyPopulation,

    #[error("genome {0} was not assigned a fitness")]
    MissingFitness(u64),

    #[error("genome {0} contains a cycle and cannot be run as a feed-forward network")]
    CyclicGenome(u64),

    #[error("network expects {expected} inputs, got {actual}")]
    InputMismatch { expected: usize, actual: usize },
}
