//! Error types for the interrupter

use thiserror::Error;

/// Interrupter result type
pub type Result<T> = std::result::Result<T, InterrupterError>;

/// Boxed underlying cause of a failed cloud API call
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while triggering spot interruptions
///
/// Two kinds: configuration errors are fatal before any fault API call is
/// attempted; operation errors abort the sequence at the failing step and
/// carry the underlying cause. No retries are performed for either.
#[derive(Error, Debug)]
pub enum InterrupterError {
    /// Credential, region, or profile resolution failed
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A cloud API call failed during the sequence
    #[error("failed to {action}: {source}")]
    Operation {
        /// The step that failed (e.g. "send spot interruption notifications")
        action: &'static str,
        /// Underlying cause from the cloud SDK
        source: BoxError,
    },
}

impl InterrupterError {
    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an operation error for a named step
    pub fn operation(action: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Operation {
            action,
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_display() {
        let err = InterrupterError::configuration("no AWS region configured");
        assert_eq!(
            err.to_string(),
            "configuration error: no AWS region configured"
        );
    }

    #[test]
    fn test_operation_display_names_the_step() {
        let err = InterrupterError::operation("send spot interruption notifications", "throttled");
        assert_eq!(
            err.to_string(),
            "failed to send spot interruption notifications: throttled"
        );
    }

    #[test]
    fn test_operation_keeps_the_cause() {
        let err = InterrupterError::operation("clean up simulations", "access denied");
        match err {
            InterrupterError::Operation { action, source } => {
                assert_eq!(action, "clean up simulations");
                assert_eq!(source.to_string(), "access denied");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
