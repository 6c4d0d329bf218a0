//! Timed Annotation Module
//!
//! Holds the per-time annotation entities produced by video analysis:
//! detected objects and the crop-area region, each carrying an ordered list
//! of frame samples independent of playback state.

mod models;
mod store;

pub use models::*;
pub use store::*;
