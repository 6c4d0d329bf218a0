//! Render Queue Store
//!
//! Persists the deduplicated render queue as a single JSON document.
//! Writes are atomic (temp file + rename); a missing file loads as an empty
//! queue, a corrupt file is a load failure.

use std::fs;
use std::path::{Path, PathBuf};

use crate::core::{CoreError, CoreResult};

use super::RenderQueue;

/// File name of the persisted queue
pub const QUEUE_FILE_NAME: &str = "render_queue.json";

/// Manages the persisted render queue file
pub struct QueueStore {
    path: PathBuf,
}

impl QueueStore {
    /// Creates a store rooted in a session directory
    pub fn new(session_dir: &Path) -> Self {
        Self {
            path: session_dir.join(QUEUE_FILE_NAME),
        }
    }

    /// Creates a store for an explicit file path
    pub fn from_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Returns the queue file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the persisted queue; a missing file is an empty queue
    pub fn load(&self) -> CoreResult<RenderQueue> {
        if !self.path.exists() {
            return Ok(RenderQueue::new());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            CoreError::QueueStoreFailed(format!(
                "Failed to read queue file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let queue: RenderQueue = serde_json::from_str(&content).map_err(|e| {
            CoreError::QueueStoreFailed(format!(
                "Failed to parse queue file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        Ok(queue)
    }

    /// Saves the queue atomically (temp file + rename)
    pub fn save(&self, queue: &RenderQueue) -> CoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    CoreError::QueueStoreFailed(format!(
                        "Failed to create queue directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let temp_path = self
            .path
            .with_extension(format!("json.tmp.{}", std::process::id()));

        let content = serde_json::to_string_pretty(queue)
            .map_err(|e| CoreError::QueueStoreFailed(format!("Failed to serialize queue: {}", e)))?;

        fs::write(&temp_path, &content).map_err(|e| {
            CoreError::QueueStoreFailed(format!(
                "Failed to write temp queue file {}: {}",
                temp_path.display(),
                e
            ))
        })?;

        fs::rename(&temp_path, &self.path).map_err(|e| {
            // Clean up temp file if rename fails
            let _ = fs::remove_file(&temp_path);
            CoreError::QueueStoreFailed(format!(
                "Failed to rename queue file {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::queue::{to_render_queue_item, RenderSettings};
    use crate::core::segments::Segment;
    use crate::core::variants::Variant;
    use tempfile::TempDir;

    fn sample_queue() -> RenderQueue {
        let variant = Variant {
            title: "cut".to_string(),
            description: String::new(),
            score: 0.5,
            reasoning: String::new(),
            scenes: vec![1],
        };
        let mut segment = Segment::new(0, 0.0, 5.0, "shot_0.jpg");
        segment.selected = true;

        let mut queue = RenderQueue::new();
        queue
            .enqueue(to_render_queue_item(
                &variant,
                &[segment],
                RenderSettings::default(),
            ))
            .unwrap();
        queue
    }

    #[test]
    fn test_load_missing_file_is_empty_queue() {
        let temp_dir = TempDir::new().unwrap();
        let store = QueueStore::new(temp_dir.path());

        let queue = store.load().unwrap();
        assert!(queue.is_empty());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let store = QueueStore::new(temp_dir.path());

        let queue = sample_queue();
        store.save(&queue).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(
            loaded.items()[0].request.variant_title,
            queue.items()[0].request.variant_title
        );
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let temp_dir = TempDir::new().unwrap();
        let store = QueueStore::new(&temp_dir.path().join("nested"));

        store.save(&sample_queue()).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_load_corrupt_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let store = QueueStore::new(temp_dir.path());
        fs::write(store.path(), "not json").unwrap();

        assert!(store.load().is_err());
    }

    #[test]
    fn test_save_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let store = QueueStore::new(temp_dir.path());

        store.save(&sample_queue()).unwrap();
        store.save(&RenderQueue::new()).unwrap();

        assert!(store.load().unwrap().is_empty());
    }
}
