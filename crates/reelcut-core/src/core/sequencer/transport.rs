//! Playback Transport
//!
//! Seam to the external media-playback primitive: something that reports a
//! current timestamp and accepts seek commands. Seeks are fire-and-forget:
//! the sequencer issues a seek and returns, and the next tick simply
//! observes the new position.

use crate::core::TimeSec;

/// External playback primitive driven by the preview sequencer
pub trait PlaybackTransport: Send + Sync {
    /// Current playback position in seconds
    fn position(&self) -> TimeSec;

    /// Fire-and-forget seek to an absolute position
    fn seek(&self, position: TimeSec);

    /// End-of-media timestamp, the target of a pass-complete seek
    fn media_end(&self) -> TimeSec;
}

// =============================================================================
// Test Transport
// =============================================================================
