//! Reelcut Core Library
//!
//! Timeline sequencing and framing engine for segment-based video editing.
//!
//! The engine works on automatically detected "segments" of a source video:
//! it applies a variant's selection onto the segment list, previews only the
//! selected segments in sequence against an abstract playback transport, and
//! lets the user drag-adjust an auto-detected crop region for a contiguous
//! run of identical-position frames.
//!
//! Video decoding, network transport, and rendering live outside this crate;
//! collaborators supply raw analysis data and a playback transport, and
//! consume segment state, overlay geometry, and render-queue items.

pub mod core;
