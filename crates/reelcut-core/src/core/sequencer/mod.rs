//! Playback Sequencer
//!
//! The central state machine of the engine. Driven by a periodic tick that
//! reads the current playback position, it decides when to keep playing,
//! when to jump, and when a full pass is complete, while tracking per-segment
//! played status through the segment registry.
//!
//! Selected segments play in ascending id order regardless of where on the
//! timeline the user currently is; unselected segments are skipped by seeking
//! to the next playable one; a full pass ends with a single seek to
//! end-of-media rather than looping.

mod driver;
mod transport;

pub use driver::*;
pub use transport::*;

use tracing::debug;

use crate::core::segments::SegmentRegistry;
use crate::core::{SegmentId, TimeSec};

// =============================================================================
// Tick Results
// =============================================================================

/// Transition produced by a tick
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TickAction {
    /// Current segment is mid-playback, or the tick was inert
    None,
    /// Current segment is being consumed normally
    MarkedPlayed(SegmentId),
    /// Jump to the next playable segment's start
    Seek(TimeSec),
    /// Sequence exhausted or pass complete
    SeekToEnd,
}

/// Result of a single sequencer tick
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickOutcome {
    /// True when the caller must suppress its "update current segment
    /// indicator" side-effect for this tick
    pub should_skip: bool,
    /// Segment containing the probed timestamp, if any
    pub current_segment: Option<SegmentId>,
    pub action: TickAction,
}

impl TickOutcome {
    fn inert() -> Self {
        Self {
            should_skip: false,
            current_segment: None,
            action: TickAction::None,
        }
    }
}

// =============================================================================
// Playback Sequencer
// =============================================================================

/// Tick-driven segment sequencing state machine.
///
/// The sequencer holds only its own bookkeeping; all segment state lives in
/// the registry and is mutated through it.
#[derive(Clone, Debug, Default)]
pub struct PlaybackSequencer {
    /// Most recently consumed segment id
    last_played: Option<SegmentId>,
    /// Latched once end-of-media has been sought; cleared by reset
    pass_complete: bool,
}

impl PlaybackSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the current pass has ended with a seek to end-of-media
    pub fn pass_complete(&self) -> bool {
        self.pass_complete
    }

    /// Runs one tick against the probed playback position.
    ///
    /// Inert (no decision, no mutation) when no segments are loaded, no
    /// variant is active, the position falls outside every segment, or the
    /// pass already completed and no reset has happened yet.
    pub fn tick(&mut self, registry: &mut SegmentRegistry, position: TimeSec) -> TickOutcome {
        if registry.is_empty() || registry.active_variant().is_none() {
            return TickOutcome::inert();
        }
        if self.pass_complete {
            return TickOutcome::inert();
        }

        let Some(current) = registry.segment_at(position) else {
            return TickOutcome::inert();
        };
        let current_id = current.id;
        let current_selected = current.selected;
        let current_played = current.played;

        let next_playable = registry.next_playable().map(|s| (s.id, s.start_sec));
        let last_selected_end = registry.last_selected().map(|s| s.end_sec);

        let is_playing_next = next_playable.is_some_and(|(id, _)| id == current_id);
        let not_next_but_selected_unplayed = current_selected
            && !current_played
            && next_playable.is_some_and(|(id, _)| id != current_id);
        let all_played = registry.all_selected_played()
            && last_selected_end.is_some_and(|end| position >= end);
        let already_played_out_of_order = current_played
            && self.last_played != Some(current_id)
            && next_playable.is_some_and(|(id, _)| id != current_id);
        let should_skip = !current_selected || already_played_out_of_order;

        let action = if is_playing_next {
            registry.mark_played(current_id);
            self.last_played = Some(current_id);
            TickAction::MarkedPlayed(current_id)
        } else if not_next_but_selected_unplayed || already_played_out_of_order || !current_selected
        {
            match next_playable {
                Some((next_id, start)) => {
                    debug!(
                        "Skipping segment {} at {:.3}s, seeking to segment {} ({:.3}s)",
                        current_id, position, next_id, start
                    );
                    TickAction::Seek(start)
                }
                None => {
                    debug!("No playable segment left at {:.3}s, seeking to end", position);
                    self.pass_complete = true;
                    TickAction::SeekToEnd
                }
            }
        } else if all_played {
            debug!("Pass complete at {:.3}s, seeking to end", position);
            self.pass_complete = true;
            TickAction::SeekToEnd
        } else {
            TickAction::None
        };

        TickOutcome {
            should_skip,
            current_segment: Some(current_id),
            action,
        }
    }

    /// Entry transition, called when a new variant is chosen or playback
    /// ended.
    ///
    /// When a selected-but-unplayed segment remains and it is not the first
    /// segment of the active variant's scene order, the preview resumes
    /// there. Otherwise (fresh start or completed pass) every played flag is
    /// cleared for a new pass and the preview seeks to the variant's first
    /// segment.
    pub fn reset_variant_preview(&mut self, registry: &mut SegmentRegistry) -> TickAction {
        self.pass_complete = false;
        self.last_played = None;

        let first_scene = registry
            .active_variant()
            .and_then(|v| v.first_scene_segment());

        match registry.next_playable().map(|s| (s.id, s.start_sec)) {
            Some((id, start)) if Some(id) != first_scene => {
                debug!("Resuming preview at segment {} ({:.3}s)", id, start);
                TickAction::Seek(start)
            }
            Some(_) => TickAction::None,
            None => {
                registry.reset_played();
                match first_scene.and_then(|id| registry.segment(id)) {
                    Some(segment) => {
                        debug!(
                            "Starting new pass at segment {} ({:.3}s)",
                            segment.id, segment.start_sec
                        );
                        TickAction::Seek(segment.start_sec)
                    }
                    None => TickAction::None,
                }
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::segments::Segment;
    use crate::core::variants::Variant;
    use crate::core::SceneNumber;

    fn variant(scenes: Vec<SceneNumber>) -> Variant {
        Variant {
            title: "cut".to_string(),
            description: String::new(),
            score: 0.5,
            reasoning: String::new(),
            scenes,
        }
    }

    /// Segments [0,5], [5,10], [10,15] with variant scenes [1,3] active
    fn registry_with_variant(scenes: Vec<SceneNumber>) -> SegmentRegistry {
        let mut registry = SegmentRegistry::new();
        registry.load_segments(vec![
            Segment::new(0, 0.0, 5.0, "shot_0.jpg"),
            Segment::new(1, 5.0, 10.0, "shot_1.jpg"),
            Segment::new(2, 10.0, 15.0, "shot_2.jpg"),
        ]);
        registry.load_variants(vec![variant(scenes)]);
        registry.select_variant(0).unwrap();
        registry
    }

    // -------------------------------------------------------------------------
    // Inert Ticks
    // -------------------------------------------------------------------------

    #[test]
    fn test_tick_inert_without_variant() {
        let mut registry = SegmentRegistry::new();
        registry.load_segments(vec![Segment::new(0, 0.0, 5.0, "shot_0.jpg")]);

        let mut sequencer = PlaybackSequencer::new();
        let outcome = sequencer.tick(&mut registry, 1.0);

        assert_eq!(outcome, TickOutcome::inert());
        assert!(!registry.segment(0).unwrap().played);
    }

    #[test]
    fn test_tick_inert_outside_all_segments() {
        let mut registry = registry_with_variant(vec![1, 3]);
        let mut sequencer = PlaybackSequencer::new();

        let outcome = sequencer.tick(&mut registry, 42.0);
        assert_eq!(outcome.current_segment, None);
        assert_eq!(outcome.action, TickAction::None);
    }

    // -------------------------------------------------------------------------
    // Normal Consumption & Skipping
    // -------------------------------------------------------------------------

    #[test]
    fn test_tick_marks_next_playable_as_played() {
        let mut registry = registry_with_variant(vec![1, 3]);
        let mut sequencer = PlaybackSequencer::new();

        let outcome = sequencer.tick(&mut registry, 0.0);
        assert_eq!(outcome.current_segment, Some(0));
        assert_eq!(outcome.action, TickAction::MarkedPlayed(0));
        assert!(!outcome.should_skip);
        assert!(registry.segment(0).unwrap().played);
    }

    #[test]
    fn test_tick_skips_unselected_segment() {
        let mut registry = registry_with_variant(vec![1, 3]);
        let mut sequencer = PlaybackSequencer::new();
        sequencer.tick(&mut registry, 0.0); // consume segment 0

        // Inside segment 1, which is unselected
        let outcome = sequencer.tick(&mut registry, 6.0);
        assert!(outcome.should_skip);
        assert_eq!(outcome.action, TickAction::Seek(10.0));
    }

    #[test]
    fn test_tick_continues_mid_playback() {
        let mut registry = registry_with_variant(vec![1, 3]);
        let mut sequencer = PlaybackSequencer::new();
        sequencer.tick(&mut registry, 0.0);

        // Still inside segment 0, already played, segment 2 pending:
        // current is the most recently played entry, so no skip
        let outcome = sequencer.tick(&mut registry, 2.0);
        assert_eq!(outcome.action, TickAction::None);
        assert!(!outcome.should_skip);
    }

    #[test]
    fn test_tick_seeks_forward_to_next_playable_when_ahead() {
        let mut registry = registry_with_variant(vec![1, 3]);
        let mut sequencer = PlaybackSequencer::new();

        // User scrubbed into segment 2 while segment 0 is still unplayed:
        // selected-but-not-next, so jump back to segment 0
        let outcome = sequencer.tick(&mut registry, 11.0);
        assert_eq!(outcome.current_segment, Some(2));
        assert_eq!(outcome.action, TickAction::Seek(0.0));
        assert!(!outcome.should_skip);
    }

    #[test]
    fn test_tick_skips_already_played_out_of_order() {
        let mut registry = registry_with_variant(vec![1, 2, 3]);
        let mut sequencer = PlaybackSequencer::new();
        sequencer.tick(&mut registry, 0.0); // play 0
        sequencer.tick(&mut registry, 6.0); // play 1

        // Back inside segment 0: played, not the most recent, 2 still pending
        let outcome = sequencer.tick(&mut registry, 1.0);
        assert!(outcome.should_skip);
        assert_eq!(outcome.action, TickAction::Seek(10.0));
    }

    // -------------------------------------------------------------------------
    // Pass Completion
    // -------------------------------------------------------------------------

    #[test]
    fn test_full_pass_seeks_to_end_exactly_once() {
        let mut registry = registry_with_variant(vec![1, 3]);
        let mut sequencer = PlaybackSequencer::new();
        sequencer.tick(&mut registry, 0.0); // play 0
        sequencer.tick(&mut registry, 10.5); // play 2

        // Everything selected is played and we reached the last selected end
        let outcome = sequencer.tick(&mut registry, 15.0);
        assert_eq!(outcome.action, TickAction::SeekToEnd);
        assert!(sequencer.pass_complete());

        // No second seek without an explicit reset
        let outcome = sequencer.tick(&mut registry, 15.0);
        assert_eq!(outcome.action, TickAction::None);
    }

    #[test]
    fn test_skip_with_no_playable_left_seeks_to_end() {
        let mut registry = registry_with_variant(vec![1]);
        let mut sequencer = PlaybackSequencer::new();
        sequencer.tick(&mut registry, 0.0); // play 0, the only selected one

        // Inside unselected segment 1, nothing playable remains
        let outcome = sequencer.tick(&mut registry, 6.0);
        assert!(outcome.should_skip);
        assert_eq!(outcome.action, TickAction::SeekToEnd);
        assert!(sequencer.pass_complete());
    }

    // -------------------------------------------------------------------------
    // Reset / Entry Transition
    // -------------------------------------------------------------------------

    #[test]
    fn test_reset_after_full_pass_starts_new_pass() {
        let mut registry = registry_with_variant(vec![1, 3]);
        let mut sequencer = PlaybackSequencer::new();
        sequencer.tick(&mut registry, 0.0);
        sequencer.tick(&mut registry, 10.5);
        sequencer.tick(&mut registry, 15.0);
        assert!(sequencer.pass_complete());

        let action = sequencer.reset_variant_preview(&mut registry);

        assert_eq!(action, TickAction::Seek(0.0));
        assert!(!sequencer.pass_complete());
        assert!(registry.segments().iter().all(|s| !s.played));
    }

    #[test]
    fn test_reset_resumes_at_pending_segment() {
        let mut registry = registry_with_variant(vec![1, 3]);
        let mut sequencer = PlaybackSequencer::new();
        sequencer.tick(&mut registry, 0.0); // play 0; segment 2 pending

        let action = sequencer.reset_variant_preview(&mut registry);
        assert_eq!(action, TickAction::Seek(10.0));
        // Played state preserved on resume
        assert!(registry.segment(0).unwrap().played);
    }

    #[test]
    fn test_reset_fresh_start_on_first_scene_is_silent() {
        let mut registry = registry_with_variant(vec![1, 3]);
        let mut sequencer = PlaybackSequencer::new();

        // Next playable already is the variant's first scene segment
        let action = sequencer.reset_variant_preview(&mut registry);
        assert_eq!(action, TickAction::None);
    }

    #[test]
    fn test_reset_with_unordered_scene_list() {
        // Scenes [3, 1]: first scene segment is 2, next playable is 0
        let mut registry = registry_with_variant(vec![3, 1]);
        let mut sequencer = PlaybackSequencer::new();

        let action = sequencer.reset_variant_preview(&mut registry);
        assert_eq!(action, TickAction::Seek(0.0));
    }

    // -------------------------------------------------------------------------
    // Spec Scenario (end to end)
    // -------------------------------------------------------------------------

    #[test]
    fn test_selection_playback_scenario() {
        let mut registry = registry_with_variant(vec![1, 3]);
        let selected: Vec<bool> = registry.segments().iter().map(|s| s.selected).collect();
        assert_eq!(selected, vec![true, false, true]);

        let mut sequencer = PlaybackSequencer::new();

        // t=0: segment 0 is current and next playable
        let outcome = sequencer.tick(&mut registry, 0.0);
        assert_eq!(outcome.action, TickAction::MarkedPlayed(0));

        // t=6: inside unselected segment 1
        let outcome = sequencer.tick(&mut registry, 6.0);
        assert!(outcome.should_skip);
        assert_eq!(outcome.action, TickAction::Seek(10.0));

        // t=10.5: segment 2 consumed
        let outcome = sequencer.tick(&mut registry, 10.5);
        assert_eq!(outcome.action, TickAction::MarkedPlayed(2));

        // t=15: both played, timestamp at last selected end
        let outcome = sequencer.tick(&mut registry, 15.0);
        assert_eq!(outcome.action, TickAction::SeekToEnd);

        // Reset clears played flags and seeks back to segment 0
        let action = sequencer.reset_variant_preview(&mut registry);
        assert_eq!(action, TickAction::Seek(0.0));
        assert!(registry.segments().iter().all(|s| !s.played));
    }
}
