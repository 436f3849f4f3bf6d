//! Error types for tally-core
//!
//! Input errors come from user-entered values and map to field-level validation
//! messages. Integrity errors mean stored data or configuration is wrong and must
//! be surfaced, never coerced.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tally_types::{DataType, ObservationId, UnknownDataType};
use thiserror::Error;

use crate::bucket::Granularity;

pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type for tally operations
#[derive(Error, Debug)]
pub enum CoreError {
    // ===================
    // Input Errors
    // ===================
    #[error("Invalid {data_type} value {input:?}: {reason}")]
    InvalidValueFormat {
        data_type: DataType,
        input: String,
        reason: String,
    },

    #[error("Task analysis value has {found} steps, target defines {expected}")]
    StepCountMismatch { expected: usize, found: usize },

    #[error("Step index {index} out of range for {len} steps")]
    StepIndexOutOfRange { index: usize, len: usize },

    #[error("Unknown time zone: {zone}")]
    InvalidTimezone { zone: String },

    // ===================
    // Integrity Errors
    // ===================
    #[error("Observation {observation_id} holds a {found} value, expected {expected}")]
    ValueShapeMismatch {
        observation_id: ObservationId,
        expected: DataType,
        found: DataType,
    },

    #[error("Unknown data type: {tag:?}")]
    UnknownDataType { tag: String },

    #[error("Timestamp {timestamp} has no {granularity} bucket in {zone}")]
    TimestampOutOfRange {
        timestamp: DateTime<Utc>,
        granularity: Granularity,
        zone: String,
    },

    #[error("{data_type} total {total} does not fit the stored value range")]
    TotalOutOfRange { data_type: DataType, total: i128 },

    // ===================
    // Config Errors
    // ===================
    #[error("Failed to read config: {path}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config in {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },
}

/// Who is at fault for an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Bad input from the caller. Recoverable by re-prompting.
    Input,
    /// Stored data or configuration is inconsistent. A defect upstream.
    Integrity,
}

impl CoreError {
    pub(crate) fn invalid(
        data_type: DataType,
        input: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        CoreError::InvalidValueFormat {
            data_type,
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::InvalidValueFormat { .. }
            | CoreError::StepCountMismatch { .. }
            | CoreError::StepIndexOutOfRange { .. }
            | CoreError::InvalidTimezone { .. } => ErrorSeverity::Input,
            CoreError::ValueShapeMismatch { .. }
            | CoreError::UnknownDataType { .. }
            | CoreError::TimestampOutOfRange { .. }
            | CoreError::TotalOutOfRange { .. }
            | CoreError::ConfigRead { .. }
            | CoreError::ConfigParse { .. } => ErrorSeverity::Integrity,
        }
    }

    pub fn is_integrity(&self) -> bool {
        self.severity() == ErrorSeverity::Integrity
    }
}

impl From<UnknownDataType> for CoreError {
    fn from(e: UnknownDataType) -> Self {
        CoreError::UnknownDataType { tag: e.tag }
    }
}
