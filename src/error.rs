use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EdfError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Truncated input while reading {field}")]
    Truncated { field: String },

    #[error("Invalid number in field {field}: {text:?}")]
    InvalidNumber { field: &'static str, text: String },

    #[error("Invalid start date/time: {date:?} {time:?}")]
    InvalidStartDateTime { date: String, time: String },

    #[error("Header declares {declared} signals but {supplied} were supplied")]
    SignalCountMismatch { declared: i32, supplied: usize },

    #[error("Signal {label:?} holds {actual} samples, {expected} required")]
    SampleCountMismatch {
        label: String,
        expected: usize,
        actual: usize,
    },

    #[error("Signal {label:?} has no samples per record, so its samples have no timeline")]
    NoTimeline { label: String },

    #[error("Time offset of {seconds}s is out of range")]
    TimestampOutOfRange { seconds: f64 },

    #[error("Signal index {0} out of range")]
    InvalidSignalIndex(usize),

    #[error("Digital min equals digital max")]
    DigitalMinEqualsMax,

    #[error("Invalid base64 input: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("No byte source attached")]
    NoSource,
}

impl EdfError {
    /// Malformed, truncated or inconsistent content, as opposed to I/O or usage errors.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            EdfError::Truncated { .. }
                | EdfError::InvalidNumber { .. }
                | EdfError::InvalidStartDateTime { .. }
                | EdfError::SignalCountMismatch { .. }
                | EdfError::SampleCountMismatch { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, EdfError>;
