use thiserror::Error;

/// Errors that can occur during Mikiri core operations.
#[derive(Debug, Error)]
pub enum MikiriError {
    /// The input string is empty or contains only whitespace.
    #[error("input is empty or whitespace-only")]
    EmptyInput,

    /// A regex pattern failed to compile (should not happen with static patterns).
    #[error("regex compilation error: {0}")]
    RegexError(#[from] regex::Error),

    /// An engine configuration value is out of range.
    #[error("invalid engine config: {0}")]
    InvalidConfig(String),

    /// The external update classifier failed or returned garbage.
    #[error("classifier error: {0}")]
    Classifier(String),

    /// The external version resolution lookup failed.
    #[error("resolver error: {0}")]
    Resolver(String),

    /// Processing a single tracked title failed past the point of recovery.
    #[error("title {id} failed: {message}")]
    TitleFailed {
        /// External id of the tracked title.
        id: String,
        /// What went wrong.
        message: String,
    },
}

/// Result type alias for Mikiri operations.
pub type Result<T> = std::result::Result<T, MikiriError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = MikiriError::EmptyInput;
        assert_eq!(err.to_string(), "input is empty or whitespace-only");

        let err = MikiriError::TitleFailed {
            id: "gs-42".into(),
            message: "boom".into(),
        };
        assert!(err.to_string().contains("gs-42"));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MikiriError>();
    }
}
