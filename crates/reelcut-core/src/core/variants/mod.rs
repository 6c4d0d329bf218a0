//! Edit Variants
//!
//! A variant is a named candidate edit: an ordered subset of segment ids
//! plus metadata and a score. Variants are read-only once generated;
//! selecting one maps its scenes onto the segment registry's selection.

use serde::{Deserialize, Serialize};

use crate::core::{CoreError, CoreResult, SceneNumber, SegmentId};

/// A named candidate edit produced by analysis
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub title: String,
    pub description: String,
    /// Quality score assigned by the analysis stage
    pub score: f64,
    /// Why the analysis picked this combination
    pub reasoning: String,
    /// Ordered 1-based segment numbers making up the edit
    pub scenes: Vec<SceneNumber>,
}

impl Variant {
    /// Validates the scene list against the loaded segment count.
    ///
    /// Scene numbers are 1-based; `0` and anything past the segment count
    /// are load failures, as is an empty scene list.
    pub fn validate(&self, segment_count: usize) -> CoreResult<()> {
        if self.scenes.is_empty() {
            return Err(CoreError::InvalidVariant {
                title: self.title.clone(),
                reason: "empty scene list".to_string(),
            });
        }
        for &scene in &self.scenes {
            if scene == 0 || scene as usize > segment_count {
                return Err(CoreError::InvalidVariant {
                    title: self.title.clone(),
                    reason: format!(
                        "scene {} out of range (1..={})",
                        scene, segment_count
                    ),
                });
            }
        }
        Ok(())
    }

    /// Returns the 0-based segment id of the variant's first scene
    pub fn first_scene_segment(&self) -> Option<SegmentId> {
        self.scenes.first().map(|&s| (s - 1) as SegmentId)
    }

    /// Maps the 1-based scene list onto 0-based segment ids, in scene order
    pub fn scene_segment_ids(&self) -> Vec<SegmentId> {
        self.scenes.iter().map(|&s| (s - 1) as SegmentId).collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
