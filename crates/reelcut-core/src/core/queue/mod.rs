//! Render Queue
//!
//! Pure transforms between variant scene lists, segment objects, and
//! persisted render-queue items: selection filtering, duration aggregation,
//! canonical-JSON deduplication, and the rendered-combo display view.

mod store;

pub use store::*;

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::segments::Segment;
use crate::core::variants::Variant;
use crate::core::{Canvas, CoreError, CoreResult, QueueItemId, SceneNumber, TimeSec};

// =============================================================================
// Render Settings
// =============================================================================

/// Render settings recorded with a queue item
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderSettings {
    /// Container format, e.g. "mp4"
    pub format: String,
    /// Output resolution
    pub resolution: Canvas,
    /// Output frame rate
    pub fps: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            format: "mp4".to_string(),
            resolution: Canvas::default(),
            fps: 30,
        }
    }
}

// =============================================================================
// Render Queue Item
// =============================================================================

/// Segment snapshot inside a render request, with the 1-based id render
/// backends expect
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSegment {
    pub av_segment_id: SceneNumber,
    pub start_sec: TimeSec,
    pub end_sec: TimeSec,
    pub screenshot_uri: String,
}

/// Canonical request payload. Two queue items whose payloads serialize to
/// identical canonical JSON are duplicates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    /// Title of the originating variant
    pub variant_title: String,
    /// Concrete selected segments, in id order
    pub segments: Vec<QueueSegment>,
    /// Aggregated duration of the selected segments
    pub duration_sec: TimeSec,
    /// True when the selected-id set differs from the variant's scenes
    pub user_selection: bool,
    pub settings: RenderSettings,
}

impl RenderRequest {
    /// Canonical JSON used for deduplication
    pub fn canonical_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Immutable snapshot enqueued for rendering.
///
/// The id and timestamp identify the submission; they are not part of the
/// canonical payload, so re-submitting the same request is a duplicate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderQueueItem {
    pub id: QueueItemId,
    pub created_at: String,
    pub request: RenderRequest,
}

impl RenderQueueItem {
    /// Wraps a request with a fresh id and timestamp
    pub fn new(request: RenderRequest) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            request,
        }
    }
}

/// Builds a queue item from a variant and the current segment selection:
/// selected segments only, mapped to 1-based ids, durations summed, and the
/// `user_selection` flag set when the selection no longer matches the
/// variant's scenes.
pub fn to_render_queue_item(
    variant: &Variant,
    segments: &[Segment],
    settings: RenderSettings,
) -> RenderQueueItem {
    let queue_segments: Vec<QueueSegment> = segments
        .iter()
        .filter(|s| s.selected)
        .map(|s| QueueSegment {
            av_segment_id: (s.id + 1) as SceneNumber,
            start_sec: s.start_sec,
            end_sec: s.end_sec,
            screenshot_uri: s.screenshot_uri.clone(),
        })
        .collect();

    let duration_sec = queue_segments.iter().map(|s| s.end_sec - s.start_sec).sum();

    let selected_set: BTreeSet<SceneNumber> =
        queue_segments.iter().map(|s| s.av_segment_id).collect();
    let scene_set: BTreeSet<SceneNumber> = variant.scenes.iter().copied().collect();
    let user_selection = selected_set != scene_set;

    RenderQueueItem::new(RenderRequest {
        variant_title: variant.title.clone(),
        segments: queue_segments,
        duration_sec,
        user_selection,
        settings,
    })
}

// =============================================================================
// Render Queue
// =============================================================================

/// Deduplicated list of render submissions
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderQueue {
    items: Vec<RenderQueueItem>,
}

impl RenderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the item unless an entry with identical canonical JSON
    /// already exists. A dropped duplicate is not an error.
    ///
    /// Returns whether the item was enqueued.
    pub fn enqueue(&mut self, item: RenderQueueItem) -> CoreResult<bool> {
        let canonical = item.request.canonical_json()?;
        for existing in &self.items {
            if existing.request.canonical_json()? == canonical {
                debug!("Dropping duplicate render request '{}'", item.request.variant_title);
                return Ok(false);
            }
        }
        self.items.push(item);
        Ok(true)
    }

    pub fn items(&self) -> &[RenderQueueItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

// =============================================================================
// Rendered Combos
// =============================================================================

/// Raw per-segment payload of a rendered combo, keyed by 1-based id in the
/// upstream object
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawComboSegment {
    pub start_sec: TimeSec,
    pub end_sec: TimeSec,
    /// Generated still, when the render produced one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_uri: Option<String>,
    /// Generated caption text, when the render produced one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// One segment of a rendered combo, in display order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedSegment {
    pub av_segment_id: SceneNumber,
    pub start_sec: TimeSec,
    pub end_sec: TimeSec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Segment-ordered view of a rendered combo, ready for display
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedVariant {
    pub segments: Vec<RenderedSegment>,
    /// Human-readable comma list of segment ids, e.g. "1, 3, 4"
    pub scene_list: String,
}

/// Reshapes a keyed-by-id combo object into a segment-ordered view.
///
/// Keys must be decimal 1-based segment ids; anything else is a load
/// failure.
pub fn from_rendered_combo(
    raw: &HashMap<String, RawComboSegment>,
) -> CoreResult<RenderedVariant> {
    let mut segments: Vec<RenderedSegment> = Vec::with_capacity(raw.len());
    for (key, value) in raw {
        let id: SceneNumber = key.parse().map_err(|_| {
            CoreError::ValidationError(format!("non-numeric combo segment key '{}'", key))
        })?;
        if id == 0 {
            return Err(CoreError::ValidationError(
                "combo segment key 0 is not a valid 1-based id".to_string(),
            ));
        }
        segments.push(RenderedSegment {
            av_segment_id: id,
            start_sec: value.start_sec,
            end_sec: value.end_sec,
            image_uri: value.image_uri.clone(),
            text: value.text.clone(),
        });
    }
    segments.sort_by_key(|s| s.av_segment_id);

    let scene_list = segments
        .iter()
        .map(|s| s.av_segment_id.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    Ok(RenderedVariant {
        segments,
        scene_list,
    })
}

// =============================================================================
// Tests
// =============================================================================
