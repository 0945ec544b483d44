//! Error types for the stacking ensemble

use thiserror::Error;

/// Result type alias for stacking operations
pub type Result<T> = std::result::Result<T, StackingError>;

/// Main error type for the stacking ensemble
#[derive(Error, Debug)]
pub enum StackingError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Model not fitted")]
    NotFitted,

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Computation error: {0}")]
    ComputationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StackingError::ConfigError("bad estimators".to_string());
        assert_eq!(err.to_string(), "Configuration error: bad estimators");
    }

    #[test]
    fn test_not_fitted_display() {
        assert_eq!(StackingError::NotFitted.to_string(), "Model not fitted");
    }

    #[test]
    fn test_shape_error_display() {
        let err = StackingError::ShapeError {
            expected: "y length = 10".to_string(),
            actual: "y length = 8".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid shape: expected y length = 10, got y length = 8"
        );
    }
}
