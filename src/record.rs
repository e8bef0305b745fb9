use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category id of the informational record emitted on every tick.
pub const INFO_LOG_ID: i64 = 1;

/// Category id of the error record emitted on every tick.
pub const ERROR_LOG_ID: i64 = 2;

/// One structured log document as it is written to the store.
///
/// Field names on the wire follow the collection layout consumed by the
/// log dashboards: `Username`, `Log_id`, `Timestamp`, `Values`. Records
/// are immutable and can only be built through [`LogRecord::info`],
/// [`LogRecord::error`] or a validating decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRecord")]
pub struct LogRecord {
    #[serde(rename = "Username")]
    username: String,
    #[serde(rename = "Log_id")]
    log_id: i64,
    #[serde(rename = "Timestamp")]
    timestamp: DateTime<Utc>,
    #[serde(rename = "Values")]
    values: LogValues,
}

impl LogRecord {
    /// Build an informational record.
    ///
    /// **Returns**
    /// - `Err(RecordError::EmptyUsername)` if `username` is blank.
    /// - `Err(RecordError::EmptyMessage)` if `message` is blank.
    pub fn info(
        username: impl Into<String>,
        log_id: i64,
        timestamp: DateTime<Utc>,
        message: impl Into<String>,
    ) -> Result<Self, RecordError> {
        Self::new(
            username.into(),
            log_id,
            timestamp,
            LogValues::Info {
                message: message.into(),
            },
        )
    }

    /// Build an error record describing `what_failed` and why.
    pub fn error(
        username: impl Into<String>,
        log_id: i64,
        timestamp: DateTime<Utc>,
        what_failed: impl Into<String>,
        reason: impl Into<String>,
    ) -> Result<Self, RecordError> {
        Self::new(
            username.into(),
            log_id,
            timestamp,
            LogValues::Error {
                what_failed: what_failed.into(),
                reason: reason.into(),
            },
        )
    }

    fn new(
        username: String,
        log_id: i64,
        timestamp: DateTime<Utc>,
        values: LogValues,
    ) -> Result<Self, RecordError> {
        if username.trim().is_empty() {
            return Err(RecordError::EmptyUsername);
        }
        if let LogValues::Info { message } = &values {
            if message.trim().is_empty() {
                return Err(RecordError::EmptyMessage);
            }
        }
        Ok(LogRecord {
            username,
            log_id,
            timestamp,
            values,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn log_id(&self) -> i64 {
        self.log_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn values(&self) -> &LogValues {
        &self.values
    }

    pub fn is_error_log(&self) -> bool {
        matches!(self.values, LogValues::Error { .. })
    }
}

/// Unvalidated wire form of [`LogRecord`].
#[derive(Deserialize)]
struct RawRecord {
    #[serde(rename = "Username")]
    username: String,
    #[serde(rename = "Log_id")]
    log_id: i64,
    #[serde(rename = "Timestamp")]
    timestamp: DateTime<Utc>,
    #[serde(rename = "Values")]
    values: LogValues,
}

impl TryFrom<RawRecord> for LogRecord {
    type Error = RecordError;

    fn try_from(raw: RawRecord) -> Result<Self, RecordError> {
        LogRecord::new(raw.username, raw.log_id, raw.timestamp, raw.values)
    }
}

/// Payload of a [`LogRecord`], discriminated by `iserrorlog` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "RawValues", try_from = "RawValues")]
pub enum LogValues {
    Info { message: String },
    Error { what_failed: String, reason: String },
}

/// Flat wire form of [`LogValues`].
#[derive(Serialize, Deserialize)]
struct RawValues {
    iserrorlog: ErrorFlag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    whatfailed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

/// `iserrorlog` is stored as 0/1, but boolean documents are accepted too.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ErrorFlag {
    Int(u8),
    Bool(bool),
}

impl From<LogValues> for RawValues {
    fn from(values: LogValues) -> Self {
        match values {
            LogValues::Info { message } => RawValues {
                iserrorlog: ErrorFlag::Int(0),
                message: Some(message),
                whatfailed: None,
                reason: None,
            },
            LogValues::Error {
                what_failed,
                reason,
            } => RawValues {
                iserrorlog: ErrorFlag::Int(1),
                message: None,
                whatfailed: Some(what_failed),
                reason: Some(reason),
            },
        }
    }
}

impl TryFrom<RawValues> for LogValues {
    type Error = RecordError;

    fn try_from(raw: RawValues) -> Result<Self, RecordError> {
        let is_error = match raw.iserrorlog {
            ErrorFlag::Int(0) | ErrorFlag::Bool(false) => false,
            ErrorFlag::Int(1) | ErrorFlag::Bool(true) => true,
            ErrorFlag::Int(other) => return Err(RecordError::InvalidFlag(other)),
        };

        match (is_error, raw.message, raw.whatfailed, raw.reason) {
            (false, Some(message), None, None) => Ok(LogValues::Info { message }),
            (true, None, Some(what_failed), Some(reason)) => Ok(LogValues::Error {
                what_failed,
                reason,
            }),
            (false, ..) => Err(RecordError::Shape("informational values need only `message`")),
            (true, ..) => Err(RecordError::Shape(
                "error values need `whatfailed` and `reason` and no `message`",
            )),
        }
    }
}

/// Error returned when a record cannot be constructed or decoded.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("log record username must not be empty")]
    EmptyUsername,

    #[error("informational log message must not be empty")]
    EmptyMessage,

    #[error("iserrorlog must be 0 or 1, got {0}")]
    InvalidFlag(u8),

    #[error("malformed log values: {0}")]
    Shape(&'static str),
}
