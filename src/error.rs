//! Error taxonomy of the parsing and aggregation engine.
//!
//! Every failure is fatal for the current parse. Callers in the command layer wrap these with
//! `anyhow` context before reporting them.

use crate::model::AmountError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// An invalid issue level, or a column binding or label that the requested operation needs
    /// is missing.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The source file is missing, unreadable, or lacks an expected column.
    #[error("File format error: {0}")]
    FileFormat(String),

    /// A cell in the amount column does not parse under the locale number format.
    #[error("Amount format error: {0}")]
    AmountFormat(#[from] AmountError),
}

impl Error {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    pub(crate) fn file_format(message: impl Into<String>) -> Self {
        Error::FileFormat(message.into())
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }

    pub fn is_file_format(&self) -> bool {
        matches!(self, Error::FileFormat(_))
    }

    pub fn is_amount_format(&self) -> bool {
        matches!(self, Error::AmountFormat(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
