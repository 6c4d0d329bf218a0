//! Framing Editor
//!
//! Locates the active crop-area frame for a timestamp, finds the contiguous
//! run of identical-position frames (a "hold"), and rewrites that run when
//! the user commits a drag. The crop rectangle is piecewise-constant (its
//! position changes only at detected scene cuts), so a drag edit applies
//! uniformly to the whole constant-position run, never a single sample.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::annotations::{FrameSample, TimedEntity};
use crate::core::{PixelRect, TimeSec};

// =============================================================================
// Frame Lookup
// =============================================================================

/// Returns the first frame (in time order) at or after the timestamp.
///
/// `None` when the entity has no later frame; at end-of-media the caller
/// holds the last-known position rather than erroring.
pub fn locate_active_frame(entity: &TimedEntity, time: TimeSec) -> Option<(usize, FrameSample)> {
    entity
        .frames
        .iter()
        .position(|f| f.time_sec >= time)
        .map(|index| (index, entity.frames[index]))
}

/// Returns the maximal contiguous run of frames around `index` whose `x`
/// equals the probe value, as a half-open index range.
///
/// The run is maximal: the neighbors just outside the range (if any) differ
/// in `x`.
pub fn find_hold_range(entity: &TimedEntity, index: usize, x: f64) -> Range<usize> {
    let frames = &entity.frames;
    if index >= frames.len() || frames[index].x != x {
        return index..index;
    }

    let mut start = index;
    while start > 0 && frames[start - 1].x == x {
        start -= 1;
    }

    let mut end = index + 1;
    while end < frames.len() && frames[end].x == x {
        end += 1;
    }

    start..end
}

/// Adds `delta_x` to every frame in the run whose `x` still equals the
/// pre-drag reference value. The re-check guards against mutation between
/// drag start and commit; other fields are unchanged.
///
/// Returns the number of frames rewritten.
pub fn commit_drag(
    entity: &mut TimedEntity,
    range: Range<usize>,
    reference_x: f64,
    delta_x: f64,
) -> usize {
    let mut rewritten = 0;
    if let Some(frames) = entity.frames.get_mut(range) {
        for frame in frames.iter_mut().filter(|f| f.x == reference_x) {
            frame.x += delta_x;
            rewritten += 1;
        }
    }
    debug!(
        "Committed crop drag: {} frames shifted by {}",
        rewritten, delta_x
    );
    rewritten
}

// =============================================================================
// Drag Session
// =============================================================================

/// Snapshot taken at drag start: the hold range and the reference `x` the
/// commit re-checks against
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragSession {
    pub start_index: usize,
    pub end_index: usize,
    pub reference_x: f64,
}

impl DragSession {
    /// The hold range as a half-open index range
    pub fn range(&self) -> Range<usize> {
        self.start_index..self.end_index
    }
}

/// Begins a drag at the given timestamp.
///
/// Refused (`None`) when no active frame can be located: past the last
/// frame there is no defined crop position to edit.
pub fn begin_drag(entity: &TimedEntity, time: TimeSec) -> Option<DragSession> {
    let (index, frame) = locate_active_frame(entity, time)?;
    let range = find_hold_range(entity, index, frame.x);
    Some(DragSession {
        start_index: range.start,
        end_index: range.end,
        reference_x: frame.x,
    })
}

/// Commits a drag session with the accumulated horizontal delta
pub fn end_drag(entity: &mut TimedEntity, session: &DragSession, delta_x: f64) -> usize {
    commit_drag(entity, session.range(), session.reference_x, delta_x)
}

// =============================================================================
// Overlay Output
// =============================================================================

/// Returns the overlay rectangle to draw this tick, or `None` when the
/// entity is inactive at the timestamp or no frame is located
pub fn tracking_overlay(entity: &TimedEntity, time: TimeSec) -> Option<PixelRect> {
    if !entity.is_active_at(time) {
        return None;
    }
    locate_active_frame(entity, time).map(|(_, frame)| frame.rect())
}

// =============================================================================
// Tests
// =============================================================================
