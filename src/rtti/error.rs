// Copyright (c) 2025 knix
// All rights reserved.

use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unsupported build or runtime configuration, e.g. a tag bit count
    Config,
    /// Malformed type table definitions
    Table,
    /// A value or type info word that does not decode under its descriptor
    Decode,
    /// Init manifest problems
    Manifest,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Config => f.write_str("config"),
            ErrorKind::Table => f.write_str("table"),
            ErrorKind::Decode => f.write_str("decode"),
            ErrorKind::Manifest => f.write_str("manifest"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RttiError {
    pub message: String,
    pub kind: ErrorKind,
}

impl RttiError {
    pub fn make(kind: ErrorKind, message: impl AsRef<str>) -> RttiError {
        RttiError { message: message.as_ref().to_owned(), kind }
    }
}

impl Display for RttiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error: {}", self.kind, self.message)
    }
}

impl std::error::Error for RttiError {}

pub type RttiResult<A> = Result<A, RttiError>;

pub fn make_error<T: AsRef<str>>(kind: ErrorKind, message: T) -> RttiError {
    RttiError::make(kind, message)
}

pub fn make_fail<A, T: AsRef<str>>(kind: ErrorKind, message: T) -> RttiResult<A> {
    Err(make_error(kind, message))
}

#[macro_export]
macro_rules! errf {
    ($kind:expr, $($format_args:expr),* $(,)?) => {
        {
            let s: String = format!($($format_args),*);
            $crate::error::make_error($kind, &s)
        }
    };
}

#[macro_export]
macro_rules! failf {
    ($kind:expr, $($format_args:expr),* $(,)?) => {
        {
            let s: String = format!($($format_args),*);
            $crate::error::make_fail($kind, &s)
        }
    };
}
