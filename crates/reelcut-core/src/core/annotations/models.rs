//! Timed Annotation Data Models
//!
//! Defines the frame-sample and timed-entity schema shared by the framing
//! editor and the overlay output.

use serde::{Deserialize, Serialize};

use crate::core::{CoreError, CoreResult, PixelRect, TimeSec};

// =============================================================================
// Frame Sample
// =============================================================================

/// One sampled position of an annotated region, in pixel space
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameSample {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Instant this sample was taken at
    pub time_sec: TimeSec,
}

impl FrameSample {
    pub fn new(x: f64, y: f64, width: f64, height: f64, time_sec: TimeSec) -> Self {
        Self {
            x,
            y,
            width,
            height,
            time_sec,
        }
    }

    /// Returns the sample as an overlay rectangle
    pub fn rect(&self) -> PixelRect {
        PixelRect::new(self.x, self.y, self.width, self.height)
    }
}

// =============================================================================
// Timed Entity
// =============================================================================

/// A detected entity carrying per-time frame samples.
///
/// The entity is active only while the playback time lies inside its
/// `[start_sec, end_sec]` window; its frames are ordered by `time_sec`
/// non-decreasing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimedEntity {
    pub name: String,
    pub start_sec: TimeSec,
    pub end_sec: TimeSec,
    pub frames: Vec<FrameSample>,
}

impl TimedEntity {
    /// Creates an entity with no frames
    pub fn new(name: &str, start_sec: TimeSec, end_sec: TimeSec) -> Self {
        Self {
            name: name.to_string(),
            start_sec,
            end_sec,
            frames: Vec::new(),
        }
    }

    /// Adds a frame sample
    pub fn with_frame(mut self, frame: FrameSample) -> Self {
        self.frames.push(frame);
        self
    }

    /// Checks whether the entity is active at a playback timestamp
    pub fn is_active_at(&self, time: TimeSec) -> bool {
        time >= self.start_sec && time <= self.end_sec
    }

    /// Validates the frame-order invariant
    pub fn validate(&self) -> CoreResult<()> {
        if self.end_sec < self.start_sec {
            return Err(CoreError::InvalidEntity {
                name: self.name.clone(),
                reason: format!(
                    "window end {} precedes start {}",
                    self.end_sec, self.start_sec
                ),
            });
        }
        for pair in self.frames.windows(2) {
            if pair[1].time_sec < pair[0].time_sec {
                return Err(CoreError::InvalidEntity {
                    name: self.name.clone(),
                    reason: format!(
                        "frame times not non-decreasing ({} after {})",
                        pair[1].time_sec, pair[0].time_sec
                    ),
                });
            }
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
