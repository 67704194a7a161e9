use serde_json::error::Category;
use thiserror::Error;

/// Errors raised while evaluating a filter specification.
///
/// None of them are retryable: they describe a malformed request or an
/// operator the server does not provide.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// The specification violates a shape or value constraint.
    #[error("invalid filter: {0}")]
    Invalid(String),
    /// The requested operator has no registered predicate.
    #[error("unknown filter operator '{0}'")]
    Unknown(String),
    /// A lower-level fault unrelated to the filter's own semantics.
    #[error("internal filter error: {0}")]
    Internal(String),
}

impl FilterError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        FilterError::Invalid(msg.into())
    }

    /// The message without the kind prefix.
    pub fn detail(&self) -> &str {
        match self {
            FilterError::Invalid(msg)
            | FilterError::Unknown(msg)
            | FilterError::Internal(msg) => msg,
        }
    }

    /// `true` when the caller sent a bad request, `false` for server faults.
    pub fn is_client_fault(&self) -> bool {
        matches!(self, FilterError::Invalid(_) | FilterError::Unknown(_))
    }
}

impl From<serde_json::Error> for FilterError {
    fn from(err: serde_json::Error) -> Self {
        match err.classify() {
            Category::Io => FilterError::Internal(err.to_string()),
            Category::Syntax | Category::Data | Category::Eof => {
                FilterError::Invalid(err.to_string())
            }
        }
    }
}

pub type FilterResult<T> = Result<T, FilterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_syntax_errors_are_client_faults() {
        let err: FilterError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, FilterError::Invalid(_)));
        assert!(err.is_client_fault());
    }

    #[test]
    fn internal_errors_are_server_faults() {
        let err = FilterError::Internal("disk gone".into());
        assert!(!err.is_client_fault());
        assert_eq!(err.to_string(), "internal filter error: disk gone");
    }
}
