use std::fmt::{Debug, Display, Formatter};
use std::sync::PoisonError;

use config::ConfigError;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while compiling or executing a query. None of them are
/// recoverable within a compilation, the caller has to resubmit a
/// corrected query.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Malformed input, e.g. a join clause without `=`.
    Parse(String),
    /// Well-formed input that does not make sense against the schemas,
    /// e.g. a disconnected join graph.
    Value(String),
    /// Failures reported by, or about, the underlying storage.
    Storage(String),
    Internal(String),
}

impl Error {
    pub fn parse(msg: impl Into<String>) -> Error {
        Error::Parse(msg.into())
    }

    pub fn value(msg: impl Into<String>) -> Error {
        Error::Value(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Error {
        Error::Storage(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Error {
        Error::Internal(msg.into())
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Parse(s) | Error::Value(s) | Error::Storage(s) | Error::Internal(s) => {
                write!(f, "{}", s)
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Internal(err.to_string())
    }
}

impl<T> From<PoisonError<T>> for Error {
    fn from(err: PoisonError<T>) -> Self {
        Error::Internal(err.to_string())
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Internal(err.to_string())
    }
}

#[macro_export]
macro_rules! parse_err {
    ($($arg:tt)*) => {
        $crate::error::Error::parse(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! value_err {
    ($($arg:tt)*) => {
        $crate::error::Error::value(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! storage_err {
    ($($arg:tt)*) => {
        $crate::error::Error::storage(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! internal_err {
    ($($arg:tt)*) => {
        $crate::error::Error::internal(format!($($arg)*))
    };
}
