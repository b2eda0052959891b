/// Errors raised while reading duration literals and time patterns.
///
/// All of them are detected before any data is touched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LangError {
    #[error("malformed duration {input:?}: {reason}")]
    MalformedDuration { input: String, reason: String },
    #[error("malformed time pattern {input:?}: {reason}")]
    MalformedPattern { input: String, reason: String },
    #[error("unsupported cascade rule {input:?}: {reason}")]
    UnsupportedCascadeRule { input: String, reason: String },
}

impl LangError {
    pub(crate) fn duration(input: &str, reason: impl Into<String>) -> Self {
        Self::MalformedDuration {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn pattern(input: &str, reason: impl Into<String>) -> Self {
        Self::MalformedPattern {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn cascade(input: &str, reason: impl Into<String>) -> Self {
        Self::UnsupportedCascadeRule {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}
