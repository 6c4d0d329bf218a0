//! Reelcut Core Engine
//!
//! Core sequencing and framing module.
//! Handles segment selection state, preview playback sequencing, crop-region
//! editing, and render-queue mapping.

pub mod annotations;
pub mod framing;
pub mod loader;
pub mod queue;
pub mod segments;
pub mod sequencer;
pub mod variants;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;
