//! Error type shared by extension implementations.

/// Result alias for extension code.
pub type ExtensionResult<T> = std::result::Result<T, ExtensionError>;

/// Errors an extension may surface to the host.
///
/// Lifecycle hooks (`initialize`/`cleanup`) and command actions all return
/// this type; the host decides how each call site reacts.
#[derive(Debug, thiserror::Error)]
pub enum ExtensionError {
    /// Initialization failed; the host will refuse to load the extension.
    #[error("initialization failed: {0}")]
    Initialization(String),

    /// Cleanup failed; the host logs this and continues unloading.
    #[error("cleanup failed: {0}")]
    Cleanup(String),

    /// A command was invoked with arguments it cannot interpret.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// A command started but could not finish.
    #[error("execution failed: {0}")]
    Execution(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl From<String> for ExtensionError {
    fn from(msg: String) -> Self {
        Self::Other(msg)
    }
}

impl From<&str> for ExtensionError {
    fn from(msg: &str) -> Self {
        Self::Other(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_message() {
        let err = ExtensionError::from("something went wrong");
        assert_eq!(err.to_string(), "something went wrong");

        let err: ExtensionError = String::from("also wrong").into();
        assert!(matches!(err, ExtensionError::Other(_)));
    }

    #[test]
    fn test_display() {
        let err = ExtensionError::Initialization("missing config".to_string());
        assert_eq!(err.to_string(), "initialization failed: missing config");
    }
}
