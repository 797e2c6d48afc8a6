//! Error types for estimation, selection and the explorer session.
//!
//! Each failure kind stays a distinct variant all the way up to the caller.
//! [`ExplorerError`] only wraps them; it never collapses two kinds into one.

use std::fmt;

use crate::db::repository::RepositoryError;

/// Result type for session-level operations.
pub type ExplorerResult<T> = Result<T, ExplorerError>;

/// Why an input series cannot carry a periodogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegenerateReason {
    /// First and last valid timestamps coincide.
    ZeroBaseline,
    /// Every valid value is identical (before or after detrending).
    ZeroVariance,
}

impl fmt::Display for DegenerateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegenerateReason::ZeroBaseline => write!(f, "time baseline is zero"),
            DegenerateReason::ZeroVariance => write!(f, "values have zero variance"),
        }
    }
}

/// Failures raised by the period estimator and phase folding.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EstimatorError {
    /// Too few finite observations survived filtering.
    #[error("Insufficient data: {valid} valid points, at least {required} required")]
    InsufficientData { valid: usize, required: usize },

    /// The series cannot support a periodogram.
    #[error("Degenerate input: {reason}")]
    DegenerateInput { reason: DegenerateReason },

    /// The configuration is self-contradictory or out of range.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl EstimatorError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    pub fn degenerate(reason: DegenerateReason) -> Self {
        Self::DegenerateInput { reason }
    }
}

/// Failure raised by the object selector.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    /// Unknown label (`index == None`) or index past the end of the class.
    #[error("Not found: {}", describe_miss(label, *index))]
    NotFound { label: String, index: Option<usize> },
}

impl SelectionError {
    pub fn unknown_label(label: impl Into<String>) -> Self {
        Self::NotFound {
            label: label.into(),
            index: None,
        }
    }

    pub fn index_out_of_range(label: impl Into<String>, index: usize) -> Self {
        Self::NotFound {
            label: label.into(),
            index: Some(index),
        }
    }
}

fn describe_miss(label: &str, index: Option<usize>) -> String {
    match index {
        Some(i) => format!("index {} out of range for class '{}'", i, label),
        None => format!("no object class '{}'", label),
    }
}

/// Top-level error for the explorer session and shell.
#[derive(Debug, thiserror::Error)]
pub enum ExplorerError {
    #[error(transparent)]
    Estimator(#[from] EstimatorError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
