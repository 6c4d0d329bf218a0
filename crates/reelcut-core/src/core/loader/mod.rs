//! Analysis Loader
//!
//! Parses raw analysis payloads (segments, variants, timed annotations) into
//! validated engine types. The dynamic JSON the upstream analysis emits
//! becomes an explicit schema here, failing fast on shape mismatches at the
//! load boundary instead of misbehaving later.
//!
//! Loading is all-or-nothing: any validation failure rejects the whole
//! bundle, so the registry and annotation store are never left with
//! partial or inconsistent state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::annotations::{AnnotationStore, FrameSample, TimedEntity};
use crate::core::segments::{Segment, SegmentRegistry};
use crate::core::variants::Variant;
use crate::core::{Canvas, CoreError, CoreResult, SceneNumber, SegmentId, TimeSec};

// =============================================================================
// Raw Schemas
// =============================================================================

/// Raw detected segment as the analysis stage emits it
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawSegment {
    #[serde(rename = "start_s")]
    pub start_sec: TimeSec,
    #[serde(rename = "end_s")]
    pub end_sec: TimeSec,
    /// 1-based id assigned by the analysis stage
    pub av_segment_id: SceneNumber,
    #[serde(default)]
    pub screenshot_uri: Option<String>,
}

/// Raw variant as the analysis stage emits it
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawVariant {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub reasoning: String,
    pub scenes: Vec<SceneNumber>,
}

/// Raw frame sample with coordinates normalized to `0..=1`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawFrame {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub time: TimeSec,
}

/// Raw timed entity with its activity window and normalized frames
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawEntity {
    pub name: String,
    #[serde(rename = "start_s")]
    pub start_sec: TimeSec,
    #[serde(rename = "end_s")]
    pub end_sec: TimeSec,
    pub frames: Vec<RawFrame>,
}

/// Complete raw analysis payload
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAnalysis {
    pub segments: Vec<RawSegment>,
    #[serde(default)]
    pub variants: Vec<RawVariant>,
    #[serde(default)]
    pub entities: Vec<RawEntity>,
}

// =============================================================================
// Parsing & Validation
// =============================================================================

/// Builds the validated segment list.
///
/// Segments must be sorted ascending by start and non-overlapping; ids are
/// positional (0-based). An `av_segment_id` disagreeing with its 1-based
/// position is tolerated with a warning; position is authoritative.
pub fn parse_segments(raw: &[RawSegment]) -> CoreResult<Vec<Segment>> {
    let mut segments = Vec::with_capacity(raw.len());

    for (index, r) in raw.iter().enumerate() {
        if r.end_sec < r.start_sec {
            return Err(CoreError::InvalidSegments(format!(
                "segment {} ends before it starts ({} < {})",
                index, r.end_sec, r.start_sec
            )));
        }
        if let Some(prev) = index.checked_sub(1).map(|i| &raw[i]) {
            if r.start_sec < prev.start_sec {
                return Err(CoreError::InvalidSegments(format!(
                    "segment {} not sorted by start ({} after {})",
                    index, r.start_sec, prev.start_sec
                )));
            }
            if r.start_sec < prev.end_sec {
                return Err(CoreError::InvalidSegments(format!(
                    "segment {} overlaps its predecessor ({} < {})",
                    index, r.start_sec, prev.end_sec
                )));
            }
        }
        if r.av_segment_id as usize != index + 1 {
            warn!(
                "Raw segment {} carries av_segment_id {}, using position",
                index, r.av_segment_id
            );
        }

        segments.push(Segment::new(
            index as SegmentId,
            r.start_sec,
            r.end_sec,
            r.screenshot_uri.as_deref().unwrap_or_default(),
        ));
    }

    Ok(segments)
}

/// Builds the validated variant list against the segment count
pub fn parse_variants(raw: &[RawVariant], segment_count: usize) -> CoreResult<Vec<Variant>> {
    let mut variants = Vec::with_capacity(raw.len());
    for r in raw {
        let variant = Variant {
            title: r.title.clone(),
            description: r.description.clone(),
            score: r.score,
            reasoning: r.reasoning.clone(),
            scenes: r.scenes.clone(),
        };
        variant.validate(segment_count)?;
        variants.push(variant);
    }
    Ok(variants)
}

/// Builds the validated entity list, denormalizing frame coordinates against
/// the caller's pixel canvas.
///
/// Coordinates outside `0..=1` are clamped with a warning; frame times out
/// of order fail the load.
pub fn parse_entities(raw: &[RawEntity], canvas: Canvas) -> CoreResult<Vec<TimedEntity>> {
    let width = canvas.width as f64;
    let height = canvas.height as f64;

    let mut entities = Vec::with_capacity(raw.len());
    for r in raw {
        let mut entity = TimedEntity::new(&r.name, r.start_sec, r.end_sec);
        for frame in &r.frames {
            entity.frames.push(FrameSample::new(
                clamp_normalized(frame.x, &r.name) * width,
                clamp_normalized(frame.y, &r.name) * height,
                clamp_normalized(frame.width, &r.name) * width,
                clamp_normalized(frame.height, &r.name) * height,
                frame.time,
            ));
        }
        entity.validate()?;
        entities.push(entity);
    }
    Ok(entities)
}

fn clamp_normalized(value: f64, entity: &str) -> f64 {
    if !(0.0..=1.0).contains(&value) {
        warn!(
            "Clamping out-of-range normalized coordinate {} on entity '{}'",
            value, entity
        );
    }
    value.clamp(0.0, 1.0)
}

// =============================================================================
// Analysis Bundle
// =============================================================================

/// Fully validated analysis data ready to populate an editing session
#[derive(Clone, Debug, Default)]
pub struct AnalysisBundle {
    pub segments: Vec<Segment>,
    pub variants: Vec<Variant>,
    pub entities: Vec<TimedEntity>,
}

impl AnalysisBundle {
    /// Validates a raw payload into a bundle. Any failure rejects the whole
    /// payload.
    pub fn from_raw(raw: &RawAnalysis, canvas: Canvas) -> CoreResult<Self> {
        let segments = parse_segments(&raw.segments)?;
        let variants = parse_variants(&raw.variants, segments.len())?;
        let entities = parse_entities(&raw.entities, canvas)?;

        info!(
            "Validated analysis bundle: {} segments, {} variants, {} entities",
            segments.len(),
            variants.len(),
            entities.len()
        );

        Ok(Self {
            segments,
            variants,
            entities,
        })
    }

    /// Parses and validates a raw JSON payload
    pub fn from_json(json: &str, canvas: Canvas) -> CoreResult<Self> {
        let raw: RawAnalysis = serde_json::from_str(json)?;
        Self::from_raw(&raw, canvas)
    }

    /// Populates the registry and annotation store.
    ///
    /// Called only with a validated bundle, so population cannot fail
    /// part-way through.
    pub fn apply(self, registry: &mut SegmentRegistry, store: &mut AnnotationStore) {
        registry.load_segments(self.segments);
        registry.load_variants(self.variants);
        store.load(self.entities);
    }
}

// =============================================================================
// Analysis Source
// =============================================================================

/// Collaborator that fetches raw analysis data (upload pipeline, cloud
/// polling, local files), all outside this crate's scope
#[async_trait]
pub trait AnalysisSource: Send + Sync {
    async fn fetch(&self) -> CoreResult<RawAnalysis>;
}

/// Fetches, validates, and returns a bundle from a source.
///
/// On any failure nothing has been populated; the caller's session state is
/// untouched.
pub async fn load_from_source(
    source: &dyn AnalysisSource,
    canvas: Canvas,
) -> CoreResult<AnalysisBundle> {
    let raw = source.fetch().await?;
    AnalysisBundle::from_raw(&raw, canvas)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_segment(start: TimeSec, end: TimeSec, id: SceneNumber) -> RawSegment {
        RawSegment {
            start_sec: start,
            end_sec: end,
            av_segment_id: id,
            screenshot_uri: Some(format!("shot_{}.jpg", id)),
        }
    }

    fn raw_analysis() -> RawAnalysis {
        RawAnalysis {
            segments: vec![
                raw_segment(0.0, 5.0, 1),
                raw_segment(5.0, 10.0, 2),
                raw_segment(10.0, 15.0, 3),
            ],
            variants: vec![RawVariant {
                title: "cut".to_string(),
                description: String::new(),
                score: 0.7,
                reasoning: String::new(),
                scenes: vec![1, 3],
            }],
            entities: vec![RawEntity {
                name: "cropArea".to_string(),
                start_sec: 0.0,
                end_sec: 15.0,
                frames: vec![
                    RawFrame {
                        x: 0.25,
                        y: 0.0,
                        width: 0.5,
                        height: 1.0,
                        time: 0.0,
                    },
                    RawFrame {
                        x: 0.25,
                        y: 0.0,
                        width: 0.5,
                        height: 1.0,
                        time: 1.0,
                    },
                ],
            }],
        }
    }

    // -------------------------------------------------------------------------
    // Segment Parsing
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_segments_assigns_positional_ids() {
        let segments = parse_segments(&raw_analysis().segments).unwrap();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[1].id, 1);
        assert_eq!(segments[1].screenshot_uri, "shot_2.jpg");
        assert!(segments.iter().all(|s| !s.selected && !s.played));
    }

    #[test]
    fn test_parse_segments_rejects_overlap() {
        let raw = vec![raw_segment(0.0, 6.0, 1), raw_segment(5.0, 10.0, 2)];
        assert!(parse_segments(&raw).is_err());
    }

    #[test]
    fn test_parse_segments_rejects_unsorted() {
        let raw = vec![raw_segment(5.0, 10.0, 1), raw_segment(0.0, 4.0, 2)];
        assert!(parse_segments(&raw).is_err());
    }

    #[test]
    fn test_parse_segments_rejects_inverted_window() {
        let raw = vec![raw_segment(5.0, 2.0, 1)];
        assert!(parse_segments(&raw).is_err());
    }

    #[test]
    fn test_parse_segments_tolerates_id_mismatch() {
        // Wrong av_segment_id is warned about, not fatal
        let raw = vec![raw_segment(0.0, 5.0, 7)];
        let segments = parse_segments(&raw).unwrap();
        assert_eq!(segments[0].id, 0);
    }

    // -------------------------------------------------------------------------
    // Variant Parsing
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_variants_rejects_out_of_range_scene() {
        let raw = vec![RawVariant {
            title: "cut".to_string(),
            description: String::new(),
            score: 0.0,
            reasoning: String::new(),
            scenes: vec![1, 4],
        }];
        assert!(parse_variants(&raw, 3).is_err());
    }

    // -------------------------------------------------------------------------
    // Entity Parsing
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_entities_denormalizes_to_canvas() {
        let entities = parse_entities(&raw_analysis().entities, Canvas::new(1280, 720)).unwrap();
        let frame = entities[0].frames[0];
        assert_eq!(frame.x, 320.0);
        assert_eq!(frame.width, 640.0);
        assert_eq!(frame.height, 720.0);
    }

    #[test]
    fn test_parse_entities_clamps_out_of_range_coordinates() {
        let raw = vec![RawEntity {
            name: "person".to_string(),
            start_sec: 0.0,
            end_sec: 1.0,
            frames: vec![RawFrame {
                x: -0.5,
                y: 0.0,
                width: 1.2,
                height: 1.0,
                time: 0.0,
            }],
        }];
        let entities = parse_entities(&raw, Canvas::new(100, 100)).unwrap();
        assert_eq!(entities[0].frames[0].x, 0.0);
        assert_eq!(entities[0].frames[0].width, 100.0);
    }

    #[test]
    fn test_parse_entities_rejects_unordered_frames() {
        let raw = vec![RawEntity {
            name: "person".to_string(),
            start_sec: 0.0,
            end_sec: 2.0,
            frames: vec![
                RawFrame {
                    x: 0.1,
                    y: 0.1,
                    width: 0.2,
                    height: 0.2,
                    time: 2.0,
                },
                RawFrame {
                    x: 0.1,
                    y: 0.1,
                    width: 0.2,
                    height: 0.2,
                    time: 1.0,
                },
            ],
        }];
        assert!(parse_entities(&raw, Canvas::default()).is_err());
    }

    // -------------------------------------------------------------------------
    // Bundle
    // -------------------------------------------------------------------------

    #[test]
    fn test_bundle_from_json_and_apply() {
        let json = serde_json::to_string(&raw_analysis()).unwrap();
        let bundle = AnalysisBundle::from_json(&json, Canvas::new(1280, 720)).unwrap();

        let mut registry = SegmentRegistry::new();
        let mut store = AnnotationStore::new();
        bundle.apply(&mut registry, &mut store);

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.variants().len(), 1);
        assert!(store.crop_area().is_some());
    }

    #[test]
    fn test_bundle_rejects_invalid_payload_wholesale() {
        let mut raw = raw_analysis();
        raw.variants[0].scenes = vec![9];

        assert!(AnalysisBundle::from_raw(&raw, Canvas::default()).is_err());
    }

    #[test]
    fn test_bundle_from_json_rejects_malformed_json() {
        assert!(AnalysisBundle::from_json("{\"segments\": 3}", Canvas::default()).is_err());
    }

    #[test]
    fn test_wire_names_match_upstream() {
        let json = r#"{
            "segments": [
                {"start_s": 0.0, "end_s": 5.0, "av_segment_id": 1, "screenshot_uri": "s.jpg"}
            ]
        }"#;
        let raw: RawAnalysis = serde_json::from_str(json).unwrap();
        assert_eq!(raw.segments[0].end_sec, 5.0);
        assert_eq!(raw.segments[0].av_segment_id, 1);
    }

    // -------------------------------------------------------------------------
    // Async Source
    // -------------------------------------------------------------------------

    struct StaticSource(RawAnalysis);

    #[async_trait]
    impl AnalysisSource for StaticSource {
        async fn fetch(&self) -> CoreResult<RawAnalysis> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl AnalysisSource for FailingSource {
        async fn fetch(&self) -> CoreResult<RawAnalysis> {
            Err(CoreError::AnalysisFetchFailed("upstream timeout".to_string()))
        }
    }

    #[tokio::test]
    async fn test_load_from_source() {
        let source = StaticSource(raw_analysis());
        let bundle = load_from_source(&source, Canvas::new(1280, 720))
            .await
            .unwrap();
        assert_eq!(bundle.segments.len(), 3);
    }

    #[tokio::test]
    async fn test_load_from_source_propagates_fetch_failure() {
        let bundle = load_from_source(&FailingSource, Canvas::default()).await;
        assert!(bundle.is_err());
    }
}
