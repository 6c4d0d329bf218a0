//! Reelcut Error Definitions
//!
//! Defines error types used throughout the engine.

use thiserror::Error;

use super::{SegmentId, TimeSec};

/// Core engine error types
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Load Errors
    // =========================================================================
    #[error("Invalid segment list: {0}")]
    InvalidSegments(String),

    #[error("Invalid variant '{title}': {reason}")]
    InvalidVariant { title: String, reason: String },

    #[error("Invalid annotation entity '{name}': {reason}")]
    InvalidEntity { name: String, reason: String },

    #[error("Analysis fetch failed: {0}")]
    AnalysisFetchFailed(String),

    // =========================================================================
    // State Errors
    // =========================================================================
    #[error("Segment not found: {0}")]
    SegmentNotFound(SegmentId),

    #[error("Variant not found: index {0}")]
    VariantNotFound(usize),

    #[error("Invalid time range: {0}~{1} seconds")]
    InvalidTimeRange(TimeSec, TimeSec),

    // =========================================================================
    // Queue Errors
    // =========================================================================
    #[error("Render queue store failed: {0}")]
    QueueStoreFailed(String),

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Core engine result type
pub type CoreResult<T> = Result<T, CoreError>;
