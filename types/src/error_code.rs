use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable error codes for every failure class of the entropy reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    // Generic
    Internal,
    InvalidArgument,
    InvalidConfig,

    // Device
    DeviceNotFound,
    PermissionDenied,
    NotCharacterDevice,
    DeviceUnavailable,

    // Validation
    SelfTestFailed,
    TruncatedRead,
    UseAfterClose,
}

impl ErrorCode {
    const ALL: [ErrorCode; 10] = [
        ErrorCode::Internal,
        ErrorCode::InvalidArgument,
        ErrorCode::InvalidConfig,
        ErrorCode::DeviceNotFound,
        ErrorCode::PermissionDenied,
        ErrorCode::NotCharacterDevice,
        ErrorCode::DeviceUnavailable,
        ErrorCode::SelfTestFailed,
        ErrorCode::TruncatedRead,
        ErrorCode::UseAfterClose,
    ];

    /// Returns a short string code suitable for logs and API responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Internal => "INTERNAL",
            ErrorCode::InvalidArgument => "INVALID_ARGUMENT",
            ErrorCode::InvalidConfig => "INVALID_CONFIG",
            ErrorCode::DeviceNotFound => "DEVICE_NOT_FOUND",
            ErrorCode::PermissionDenied => "PERMISSION_DENIED",
            ErrorCode::NotCharacterDevice => "NOT_CHARACTER_DEVICE",
            ErrorCode::DeviceUnavailable => "DEVICE_UNAVAILABLE",
            ErrorCode::SelfTestFailed => "SELF_TEST_FAILED",
            ErrorCode::TruncatedRead => "TRUNCATED_READ",
            ErrorCode::UseAfterClose => "USE_AFTER_CLOSE",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returned when parsing a string that is not a known [`ErrorCode`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown error code: {0}")]
pub struct UnknownCode(pub String);

impl FromStr for ErrorCode {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ErrorCode::ALL
            .into_iter()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| UnknownCode(s.to_string()))
    }
}
