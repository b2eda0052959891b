use derive_more::From;
use mnm_lang::LangError;
use orion_error::{ErrorCode, StructError, UvsReason};

#[derive(Debug, Clone, PartialEq, thiserror::Error, From)]
pub enum CoreReason {
    #[error("configuration error")]
    Configuration,
    #[error("malformed duration")]
    MalformedDuration,
    #[error("malformed time pattern")]
    MalformedPattern,
    #[error("unsupported cascade rule")]
    UnsupportedCascadeRule,
    #[error("ambiguous sampling frequency")]
    AmbiguousFrequency,
    #[error("partial window")]
    PartialData,
    #[error("not implemented")]
    NotImplemented,
    #[error("data format error")]
    DataFormat,
    #[error("{0}")]
    Uvs(UvsReason),
}

impl ErrorCode for CoreReason {
    fn error_code(&self) -> i32 {
        match self {
            Self::Configuration => 1001,
            Self::MalformedDuration => 1002,
            Self::MalformedPattern => 1003,
            Self::UnsupportedCascadeRule => 1004,
            Self::AmbiguousFrequency => 1005,
            Self::PartialData => 1006,
            Self::NotImplemented => 1007,
            Self::DataFormat => 1008,
            Self::Uvs(u) => u.error_code(),
        }
    }
}

pub type CoreError = StructError<CoreReason>;
pub type CoreResult<T> = Result<T, CoreError>;

impl From<&LangError> for CoreReason {
    fn from(e: &LangError) -> Self {
        match e {
            LangError::MalformedDuration { .. } => CoreReason::MalformedDuration,
            LangError::MalformedPattern { .. } => CoreReason::MalformedPattern,
            LangError::UnsupportedCascadeRule { .. } => CoreReason::UnsupportedCascadeRule,
        }
    }
}

/// Lift a language error into a [`CoreError`], keeping its message as detail.
pub fn lang_error(e: LangError) -> CoreError {
    StructError::from(CoreReason::from(&e)).with_detail(e.to_string())
}

/// Shorthand for a `Configuration` error with a detail message.
pub(crate) fn config_error(detail: impl Into<String>) -> CoreError {
    StructError::from(CoreReason::Configuration).with_detail(detail.into())
}

/// Shorthand for a `DataFormat` error with a detail message.
pub(crate) fn data_error(detail: impl Into<String>) -> CoreError {
    StructError::from(CoreReason::DataFormat).with_detail(detail.into())
}

pub(crate) fn arrow_error(context: &str, e: arrow::error::ArrowError) -> CoreError {
    data_error(format!("{context}: {e}"))
}
