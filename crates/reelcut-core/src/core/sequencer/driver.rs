//! Preview Driver
//!
//! The cancellable periodic task binding the sequencer to a playback
//! transport. The task starts when media playback begins and is cancelled
//! when playback pauses; ticks are interval-based, so no tick is ever in
//! flight concurrently with another. Pausing must stop the timer so played
//! state is never mutated against a frozen frame.

use std::sync::{Arc, Mutex};

use tokio::sync::Notify;
use tracing::debug;

use super::{PlaybackSequencer, PlaybackTransport, TickAction};
use crate::core::segments::SegmentRegistry;
use crate::core::SegmentId;

// =============================================================================
// Configuration
// =============================================================================

/// Preview driver configuration
#[derive(Clone, Debug)]
pub struct PreviewConfig {
    /// Tick interval in milliseconds
    pub tick_interval_ms: u64,
}

impl PreviewConfig {
    /// Normalizes the configuration so a bad value cannot stall or spin the
    /// tick loop
    pub fn normalize(&mut self) {
        self.tick_interval_ms = self.tick_interval_ms.clamp(1, 1000);
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 10,
        }
    }
}

// =============================================================================
// Shared Preview State
// =============================================================================

/// State shared between the driver task and user-event handlers.
///
/// All mutation happens synchronously inside a tick or a discrete user event
/// while the mutex is held; there is no background mutation beyond the tick.
#[derive(Debug, Default)]
pub struct PreviewState {
    pub registry: SegmentRegistry,
    pub sequencer: PlaybackSequencer,
    /// Segment id for UI highlighting; not updated on skip ticks
    pub current_segment: Option<SegmentId>,
}

/// Shared handle to the preview state
pub type SharedPreviewState = Arc<Mutex<PreviewState>>;

// =============================================================================
// Preview Driver
// =============================================================================

/// Owns the periodic tick task for an editing session
pub struct PreviewDriver {
    state: SharedPreviewState,
    transport: Arc<dyn PlaybackTransport>,
    config: PreviewConfig,
    shutdown: Arc<Notify>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl PreviewDriver {
    /// Creates a driver around existing preview state
    pub fn new(
        state: SharedPreviewState,
        transport: Arc<dyn PlaybackTransport>,
        mut config: PreviewConfig,
    ) -> Self {
        config.normalize();
        Self {
            state,
            transport,
            config,
            shutdown: Arc::new(Notify::new()),
            task: None,
        }
    }

    /// Creates a driver with fresh state and default configuration
    pub fn with_transport(transport: Arc<dyn PlaybackTransport>) -> Self {
        Self::new(
            Arc::new(Mutex::new(PreviewState::default())),
            transport,
            PreviewConfig::default(),
        )
    }

    /// Returns the shared preview state
    pub fn state(&self) -> SharedPreviewState {
        Arc::clone(&self.state)
    }

    /// True while the tick task is running
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Starts the tick task. No-op when already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }

        let state = Arc::clone(&self.state);
        let transport = Arc::clone(&self.transport);
        let shutdown = Arc::clone(&self.shutdown);
        let interval_ms = self.config.tick_interval_ms;

        self.task = Some(tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(tokio::time::Duration::from_millis(interval_ms));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            debug!("Preview driver started ({} ms tick)", interval_ms);

            loop {
                tokio::select! {
                    _ = shutdown.notified() => {
                        debug!("Preview driver stopped");
                        break;
                    }
                    _ = interval.tick() => {
                        let position = transport.position();
                        let action = {
                            let mut guard = state.lock().unwrap();
                            let guard = &mut *guard;
                            let outcome =
                                guard.sequencer.tick(&mut guard.registry, position);
                            if !outcome.should_skip {
                                guard.current_segment = outcome.current_segment;
                            }
                            outcome.action
                        };
                        apply_action(&*transport, action);
                    }
                }
            }
        }));
    }

    /// Stops the tick task and waits for it to exit. No-op when not running.
    pub async fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            self.shutdown.notify_one();
            let _ = task.await;
        }
    }

    /// Runs the variant-preview entry transition and applies the resulting
    /// seek to the transport
    pub fn reset_variant_preview(&self) {
        let action = {
            let mut guard = self.state.lock().unwrap();
            let guard = &mut *guard;
            guard.sequencer.reset_variant_preview(&mut guard.registry)
        };
        apply_action(&*self.transport, action);
    }
}

/// Applies a tick decision to the transport; seeks are fire-and-forget
fn apply_action(transport: &dyn PlaybackTransport, action: TickAction) {
    match action {
        TickAction::Seek(position) => transport.seek(position),
        TickAction::SeekToEnd => transport.seek(transport.media_end()),
        TickAction::None | TickAction::MarkedPlayed(_) => {}
    }
}

// =============================================================================
// Tests
// =============================================================================
