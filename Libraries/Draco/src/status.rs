//! Success/failure carrier shared by every fallible operation.

use thiserror::Error;

/// Domain codes reported by the compression engine. Zero is success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum StatusCode {
    Ok = 0,
    DracoError = -1,
    IoError = -2,
    InvalidParameter = -3,
    UnsupportedVersion = -4,
    UnknownVersion = -5,
    UnsupportedFeature = -6,
}

impl StatusCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

/// A failed engine operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("draco: [{}] {message}", code.as_i32())]
pub struct DracoError {
    code: StatusCode,
    message: String,
}

impl DracoError {
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn draco(message: impl Into<String>) -> Self {
        Self::new(StatusCode::DracoError, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(StatusCode::IoError, message)
    }

    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::new(StatusCode::InvalidParameter, message)
    }

    pub fn unsupported_feature(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UnsupportedFeature, message)
    }

    pub fn code(&self) -> StatusCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub type DracoResult<T> = Result<T, DracoError>;

/// Outcome of one boundary call: a code plus a diagnostic message.
///
/// Immutable once built. The message of a successful status is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    code: StatusCode,
    message: String,
}

impl Status {
    pub fn new_ok() -> Self {
        Self {
            code: StatusCode::Ok,
            message: String::new(),
        }
    }

    pub fn ok(&self) -> bool {
        self.code == StatusCode::Ok
    }

    pub fn code(&self) -> i32 {
        self.code.as_i32()
    }

    pub fn status_code(&self) -> StatusCode {
        self.code
    }

    pub fn error_msg(&self) -> &str {
        &self.message
    }

    /// Bytes needed to hold the message plus its NUL terminator.
    pub fn error_msg_length(&self) -> usize {
        self.message.len() + 1
    }

    /// Second half of the two-call sizing pattern.
    ///
    /// Writes the NUL-terminated message into `out` and returns the number of
    /// bytes written. An undersized buffer is left untouched and 0 is returned.
    pub fn copy_error_msg(&self, out: &mut [u8]) -> usize {
        let required = self.error_msg_length();
        if out.len() < required {
            return 0;
        }
        out[..self.message.len()].copy_from_slice(self.message.as_bytes());
        out[self.message.len()] = 0;
        required
    }

    pub fn into_result(self) -> DracoResult<()> {
        if self.ok() {
            Ok(())
        } else {
            Err(DracoError::new(self.code, self.message))
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::new_ok()
    }
}

impl From<DracoError> for Status {
    fn from(err: DracoError) -> Self {
        Self {
            code: err.code,
            message: err.message,
        }
    }
}

impl<T> From<DracoResult<T>> for Status {
    fn from(result: DracoResult<T>) -> Self {
        match result {
            Ok(_) => Status::new_ok(),
            Err(err) => err.into(),
        }
    }
}
