//! Process exit codes
//!
//! Scripts rely on these values, so they must stay stable.

use hb_core::ApiStatus;

/// Exit codes returned by `hb`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    /// Bad arguments or an invalid path
    UsageError = 2,
    /// Connection, timeout or TLS failure
    NetworkError = 3,
    /// Rejected credentials or missing permission
    AuthError = 4,
    NotFound = 5,
    /// Name already taken or resource not empty
    Conflict = 6,
    Interrupted = 130,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn from_i32(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Success),
            1 => Some(Self::GeneralError),
            2 => Some(Self::UsageError),
            3 => Some(Self::NetworkError),
            4 => Some(Self::AuthError),
            5 => Some(Self::NotFound),
            6 => Some(Self::Conflict),
            130 => Some(Self::Interrupted),
            _ => None,
        }
    }

    /// Exit code for a failed service response
    pub fn from_status(status: &ApiStatus) -> Self {
        if status.ok {
            Self::Success
        } else if status.code == 0 {
            Self::NetworkError
        } else if status.is_not_found() {
            Self::NotFound
        } else if status.is_denied() {
            Self::AuthError
        } else if status.is_conflict() {
            Self::Conflict
        } else if status.code == 400 {
            Self::UsageError
        } else {
            Self::GeneralError
        }
    }

    pub fn from_error(error: &hb_core::Error) -> Self {
        Self::from_i32(error.exit_code()).unwrap_or(Self::GeneralError)
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.as_i32() as u8)
    }
}
