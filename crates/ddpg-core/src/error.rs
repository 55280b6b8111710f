//! Error types for the DDPG workspace

use std::path::PathBuf;

use thiserror::Error;

/// Core error type for training and evaluation
#[derive(Error, Debug)]
pub enum DdpgError {
    /// Environment-related errors
    #[error("Environment error: {0}")]
    Environment(String),

    /// Vector length does not match the configured network input/output size
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Length the network or space was built for
        expected: usize,
        /// Length that was passed in
        actual: usize,
    },

    /// Hyperparameter or space definition that cannot be used
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Missing or corrupt checkpoint
    #[error("Checkpoint error at {}: {reason}", path.display())]
    Checkpoint {
        /// File or directory that failed
        path: PathBuf,
        /// Underlying cause
        reason: String,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl DdpgError {
    /// Fail with [`DdpgError::DimensionMismatch`] unless `actual == expected`.
    pub fn check_dim(expected: usize, actual: usize) -> Result<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(Self::DimensionMismatch { expected, actual })
        }
    }
}

/// Result type alias for DDPG operations
pub type Result<T> = std::result::Result<T, DdpgError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_dim_reports_both_sizes() {
        assert!(DdpgError::check_dim(3, 3).is_ok());
        let err = DdpgError::check_dim(3, 2).unwrap_err();
        assert!(matches!(err, DdpgError::DimensionMismatch { expected: 3, actual: 2 }));
        assert_eq!(err.to_string(), "Dimension mismatch: expected 3, got 2");
    }

    #[test]
    fn checkpoint_error_names_path() {
        let err = DdpgError::Checkpoint {
            path: PathBuf::from("/tmp/models/actor.json"),
            reason: "file not found".into(),
        };
        assert_eq!(
            err.to_string(),
            "Checkpoint error at /tmp/models/actor.json: file not found"
        );
    }
}
