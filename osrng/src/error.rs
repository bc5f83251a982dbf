use crate::config::ConfigError;
use osrng_types::ErrorCode;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Why a read stopped short of the requested length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stall {
    /// The device reported end of stream (a zero-length read).
    EndOfStream,
    /// The device is in non-blocking mode and had nothing to hand out.
    WouldBlock,
}

impl std::fmt::Display for Stall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stall::EndOfStream => write!(f, "end of stream"),
            Stall::WouldBlock => write!(f, "no data available"),
        }
    }
}

/// Errors produced while opening or reading the entropy device.
#[derive(Debug, Error)]
pub enum RngError {
    #[error("cannot open entropy device {}: {reason}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        reason: OpenFailure,
    },

    #[error("entropy self-test failed: {0}")]
    SelfTest(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("truncated entropy read (requested {requested}, got {got}: {stall})")]
    TruncatedRead {
        requested: usize,
        got: usize,
        stall: Stall,
    },

    #[error("I/O operation on closed entropy source")]
    Closed,

    #[error("entropy device I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Cause attached to [`RngError::Open`].
#[derive(Debug, Error)]
pub enum OpenFailure {
    #[error("not a character special device")]
    NotCharacterDevice,

    #[error("character devices are not supported on this platform")]
    Unsupported,

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl RngError {
    pub(crate) fn open(path: impl Into<PathBuf>, reason: impl Into<OpenFailure>) -> Self {
        RngError::Open {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Map to a platform error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            RngError::Open { reason, .. } => match reason {
                OpenFailure::NotCharacterDevice => ErrorCode::NotCharacterDevice,
                OpenFailure::Unsupported => ErrorCode::DeviceUnavailable,
                OpenFailure::Io(e) => match e.kind() {
                    io::ErrorKind::NotFound => ErrorCode::DeviceNotFound,
                    io::ErrorKind::PermissionDenied => ErrorCode::PermissionDenied,
                    _ => ErrorCode::DeviceUnavailable,
                },
            },
            RngError::SelfTest(_) => ErrorCode::SelfTestFailed,
            RngError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            RngError::TruncatedRead { .. } => ErrorCode::TruncatedRead,
            RngError::Closed => ErrorCode::UseAfterClose,
            RngError::Io(_) => ErrorCode::Internal,
            RngError::Config(_) => ErrorCode::InvalidConfig,
        }
    }

    /// Whether the device itself must no longer be trusted, as opposed to a
    /// caller mistake or a momentarily empty non-blocking device.
    ///
    /// Never true for an error where [`RngError::is_retryable`] is true.
    pub fn is_fatal(&self) -> bool {
        match self {
            RngError::Open { reason, .. } => {
                matches!(reason, OpenFailure::NotCharacterDevice)
            }
            RngError::SelfTest(_) => true,
            RngError::TruncatedRead { stall, .. } => *stall == Stall::EndOfStream,
            RngError::InvalidArgument(_)
            | RngError::Closed
            | RngError::Io(_)
            | RngError::Config(_) => false,
        }
    }

    /// True only when the device was in non-blocking mode and momentarily
    /// empty. An exhausted device or any other failure is not retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RngError::TruncatedRead {
                stall: Stall::WouldBlock,
                ..
            }
        )
    }
}

impl From<RngError> for io::Error {
    fn from(err: RngError) -> Self {
        let kind = match &err {
            RngError::TruncatedRead { .. } => io::ErrorKind::UnexpectedEof,
            RngError::InvalidArgument(_) | RngError::Config(_) => io::ErrorKind::InvalidInput,
            RngError::Closed => io::ErrorKind::BrokenPipe,
            RngError::Io(e) => e.kind(),
            RngError::Open { .. } | RngError::SelfTest(_) => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}

pub type RngResult<T> = Result<T, RngError>;
