//! Annotation Store
//!
//! In-memory collection of timed entities for the current editing session.
//! Populated all-or-nothing by the analysis loader; the framing editor
//! mutates the crop-area entity through the store.

use tracing::debug;

use super::TimedEntity;
use crate::core::TimeSec;

/// Well-known entity name for the crop-area region
pub const CROP_AREA_ENTITY: &str = "cropArea";

/// In-memory store of timed annotation entities
#[derive(Clone, Debug, Default)]
pub struct AnnotationStore {
    entities: Vec<TimedEntity>,
}

impl AnnotationStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the entity list
    pub fn load(&mut self, entities: Vec<TimedEntity>) {
        debug!("Loaded {} annotation entities", entities.len());
        self.entities = entities;
    }

    /// Drops all entities
    pub fn clear(&mut self) {
        self.entities.clear();
    }

    /// Returns all entities
    pub fn entities(&self) -> &[TimedEntity] {
        &self.entities
    }

    /// Looks up an entity by name
    pub fn entity(&self, name: &str) -> Option<&TimedEntity> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// Looks up an entity by name, mutably
    pub fn entity_mut(&mut self, name: &str) -> Option<&mut TimedEntity> {
        self.entities.iter_mut().find(|e| e.name == name)
    }

    /// Returns the crop-area entity, if analysis produced one
    pub fn crop_area(&self) -> Option<&TimedEntity> {
        self.entity(CROP_AREA_ENTITY)
    }

    /// Returns the crop-area entity mutably
    pub fn crop_area_mut(&mut self) -> Option<&mut TimedEntity> {
        self.entity_mut(CROP_AREA_ENTITY)
    }

    /// Returns the entities active at a playback timestamp
    pub fn active_at(&self, time: TimeSec) -> Vec<&TimedEntity> {
        self.entities
            .iter()
            .filter(|e| e.is_active_at(time))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
