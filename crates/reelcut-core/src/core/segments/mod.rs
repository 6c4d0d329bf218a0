//! Segment Registry
//!
//! Ordered collection of detected segments with session-local selection and
//! played state. The registry exclusively owns segment mutable state; the
//! sequencer and framing editor mutate only through it. A deep-copied
//! "original" snapshot is retained so ad-hoc edits can be reverted when the
//! active variant changes.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{variants::Variant, CoreError, CoreResult, SceneNumber, SegmentId, TimeSec};

// =============================================================================
// Segment
// =============================================================================

/// A time-bounded slice of the source video with a stable id
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    /// 0-based id, equal to the segment's position in the list
    pub id: SegmentId,
    pub start_sec: TimeSec,
    pub end_sec: TimeSec,
    /// Session-local: part of the current selection
    #[serde(default)]
    pub selected: bool,
    /// Session-local: consumed during the current preview pass
    #[serde(default)]
    pub played: bool,
    pub screenshot_uri: String,
}

impl Segment {
    /// Creates an unselected, unplayed segment
    pub fn new(id: SegmentId, start_sec: TimeSec, end_sec: TimeSec, screenshot_uri: &str) -> Self {
        Self {
            id,
            start_sec,
            end_sec,
            selected: false,
            played: false,
            screenshot_uri: screenshot_uri.to_string(),
        }
    }

    /// Returns the duration in seconds
    pub fn duration(&self) -> TimeSec {
        self.end_sec - self.start_sec
    }

    /// Checks if a playback timestamp falls inside this segment
    /// (inclusive on both ends)
    pub fn contains(&self, time: TimeSec) -> bool {
        time >= self.start_sec && time <= self.end_sec
    }
}

// =============================================================================
// Segment Registry
// =============================================================================

/// Owner of the live segment list, the original snapshot, and the loaded
/// variants with the active-variant index
#[derive(Clone, Debug, Default)]
pub struct SegmentRegistry {
    /// Live segment list, mutated through registry methods only
    segments: Vec<Segment>,
    /// Deep copy taken at load time, used by `restore_original`
    original: Vec<Segment>,
    /// Read-only variant list loaded from analysis
    variants: Vec<Variant>,
    /// Index into `variants` of the variant currently being previewed
    active_variant: Option<usize>,
}

impl SegmentRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Loading
    // -------------------------------------------------------------------------

    /// Replaces the segment list and takes the original snapshot.
    ///
    /// All session-local flags start cleared regardless of what the input
    /// carries; the snapshot is taken after clearing so a later restore
    /// yields a pristine list.
    pub fn load_segments(&mut self, mut segments: Vec<Segment>) {
        for segment in &mut segments {
            segment.selected = false;
            segment.played = false;
        }
        debug!("Loaded {} segments", segments.len());
        self.original = segments.clone();
        self.segments = segments;
        self.active_variant = None;
    }

    /// Replaces the variant list; any active variant is cleared
    pub fn load_variants(&mut self, variants: Vec<Variant>) {
        debug!("Loaded {} variants", variants.len());
        self.variants = variants;
        self.active_variant = None;
    }

    // -------------------------------------------------------------------------
    // Variant Selection
    // -------------------------------------------------------------------------

    /// Makes a variant active: resets played flags and applies its scenes
    /// as the selection
    pub fn select_variant(&mut self, index: usize) -> CoreResult<()> {
        if index >= self.variants.len() {
            return Err(CoreError::VariantNotFound(index));
        }
        self.active_variant = Some(index);
        self.reset_played();
        self.apply_selection(None);
        Ok(())
    }

    /// Clears the active variant; the selection is left untouched
    pub fn clear_variant(&mut self) {
        self.active_variant = None;
    }

    /// Returns the active variant index, if any
    pub fn active_variant_index(&self) -> Option<usize> {
        self.active_variant
    }

    /// Returns the active variant, if any
    pub fn active_variant(&self) -> Option<&Variant> {
        self.active_variant.and_then(|i| self.variants.get(i))
    }

    /// Returns all loaded variants
    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    // -------------------------------------------------------------------------
    // Selection & Played State
    // -------------------------------------------------------------------------

    /// Rewrites the selection.
    ///
    /// With explicit `ids` (1-based), exactly those segments become selected.
    /// Without, the active variant's scenes are applied. With neither, the
    /// call is a silent no-op: the existing selection is left untouched.
    pub fn apply_selection(&mut self, ids: Option<&[SceneNumber]>) {
        let scene_ids: Vec<SceneNumber> = match ids {
            Some(ids) => ids.to_vec(),
            None => match self.active_variant() {
                Some(variant) => variant.scenes.clone(),
                None => return,
            },
        };

        for segment in &mut self.segments {
            segment.selected = false;
        }
        for scene in scene_ids {
            match scene
                .checked_sub(1)
                .and_then(|i| self.segments.get_mut(i as usize))
            {
                Some(segment) => segment.selected = true,
                None => debug!("Ignoring out-of-range scene {} in selection", scene),
            }
        }
    }

    /// Marks a segment as played; no-op for unknown ids
    pub fn mark_played(&mut self, id: SegmentId) -> bool {
        match self.segments.get_mut(id) {
            Some(segment) => {
                segment.played = true;
                true
            }
            None => false,
        }
    }

    /// Clears every played flag
    pub fn reset_played(&mut self) {
        for segment in &mut self.segments {
            segment.played = false;
        }
    }

    /// Restores the original snapshot and re-applies the active variant's
    /// selection.
    ///
    /// Skipped entirely when the live list does not structurally differ from
    /// the original: a redundant reset would also wipe `played` state.
    /// Session-local flags are ignored by the difference check.
    pub fn restore_original(&mut self) {
        if !self.differs_from_original() {
            return;
        }
        debug!("Restoring original segment list");
        self.segments = self.original.clone();
        self.apply_selection(None);
    }

    /// Checks structural identity (id, timing, screenshot) against the
    /// original snapshot, ignoring `selected`/`played`
    pub fn differs_from_original(&self) -> bool {
        if self.segments.len() != self.original.len() {
            return true;
        }
        self.segments.iter().zip(&self.original).any(|(live, orig)| {
            live.id != orig.id
                || live.start_sec != orig.start_sec
                || live.end_sec != orig.end_sec
                || live.screenshot_uri != orig.screenshot_uri
        })
    }

    // -------------------------------------------------------------------------
    // Read Accessors
    // -------------------------------------------------------------------------

    /// Returns the live segment list
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns a segment by id
    pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.get(id)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the segment whose `[start, end]` window contains the timestamp
    pub fn segment_at(&self, time: TimeSec) -> Option<&Segment> {
        self.segments.iter().find(|s| s.contains(time))
    }

    /// First segment with `selected && !played`, in id order
    pub fn next_playable(&self) -> Option<&Segment> {
        self.segments.iter().find(|s| s.selected && !s.played)
    }

    /// Last segment with `selected`, in id order
    pub fn last_selected(&self) -> Option<&Segment> {
        self.segments.iter().rev().find(|s| s.selected)
    }

    /// Ids of all selected segments, ascending
    pub fn selected_ids(&self) -> Vec<SegmentId> {
        self.segments
            .iter()
            .filter(|s| s.selected)
            .map(|s| s.id)
            .collect()
    }

    /// True when at least one segment is selected and every selected segment
    /// has been played
    pub fn all_selected_played(&self) -> bool {
        let mut any = false;
        for segment in self.segments.iter().filter(|s| s.selected) {
            if !segment.played {
                return false;
            }
            any = true;
        }
        any
    }
}

// =============================================================================
// Tests
// =============================================================================
