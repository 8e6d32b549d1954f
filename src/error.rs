use std::{error::Error, fmt};

use backtrace::Backtrace;
use log::debug;

/// Crate-wide error type.
///
/// Construction logs the message (plus a backtrace when debug logging is on),
/// so a diagnostic is recorded even when the caller only checks for absence.
#[derive(Debug, Clone)]
pub struct DbError {
    details: String,
}

impl DbError {
    pub fn new(msg: &str) -> DbError {
        if log::log_enabled!(log::Level::Debug) {
            debug!("msg: [{}], backtrace: {:?}", msg, Backtrace::new());
        }

        DbError {
            details: msg.to_string(),
        }
    }
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.details)
    }
}

impl Error for DbError {}

pub type DbResult<T> = Result<T, DbError>;
