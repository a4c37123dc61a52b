// 💾 Flat Store - whole-snapshot persistence
//
// The snapshot is the full name -> record mapping. It is read whole and
// written whole; there are no partial updates.

use crate::contestant::ContestantRecord;
use crate::error::StoreError;
use indexmap::IndexMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Complete registry state; iteration order is insertion order
pub type Snapshot = IndexMap<String, ContestantRecord>;

pub trait FlatStore {
    /// Last persisted snapshot, or empty when none exists or it cannot be read
    fn load(&self) -> Snapshot;

    /// Replace the persisted snapshot
    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError>;
}

// ============================================================================
// JSON FILE STORE
// ============================================================================

/// Pretty-printed JSON object on disk
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl FlatStore for JsonFileStore {
    fn load(&self) -> Snapshot {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no snapshot yet");
                return Snapshot::new();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "snapshot unreadable, starting empty");
                return Snapshot::new();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "snapshot corrupt, starting empty");
                Snapshot::new()
            }
        }
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let json = serde_json::to_string_pretty(snapshot)?;

        // Write beside the target, then swap it in
        let temp = self.temp_path();
        fs::write(&temp, json).map_err(|source| StoreError::Io {
            path: temp.clone(),
            source,
        })?;
        fs::rename(&temp, &self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;

        debug!(path = %self.path.display(), contestants = snapshot.len(), "snapshot saved");
        Ok(())
    }
}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

/// Keeps the snapshot in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: Mutex<Snapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        MemoryStore {
            snapshot: Mutex::new(snapshot),
        }
    }
}

impl FlatStore for MemoryStore {
    fn load(&self) -> Snapshot {
        match self.snapshot.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let mut guard = match self.snapshot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = snapshot.clone();
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(weight: f64) -> ContestantRecord {
        ContestantRecord::new("1990-01-01".to_string(), 36, weight)
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("contestants.json"));

        assert!(store.load().is_empty());
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("contestants.json");
        fs::write(&path, "{ not json").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_save_then_load_keeps_insertion_order() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("contestants.json"));

        let mut snapshot = Snapshot::new();
        snapshot.insert("Zoe".to_string(), record(180.0));
        snapshot.insert("Alice".to_string(), record(200.0));
        snapshot.insert("Mike".to_string(), record(220.0));
        store.save(&snapshot).unwrap();

        let loaded = store.load();
        let names: Vec<&str> = loaded.keys().map(|k| k.as_str()).collect();
        assert_eq!(names, vec!["Zoe", "Alice", "Mike"]);
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn test_saved_file_is_pretty_json_object() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("contestants.json");
        let store = JsonFileStore::new(&path);

        let mut snapshot = Snapshot::new();
        snapshot.insert("Alice".to_string(), record(200.0));
        store.save(&snapshot).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("{\n  \"Alice\": {\n    \"date_of_birth\": \"1990-01-01\""));
        assert!(!dir.path().join("contestants.json.tmp").exists());
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("data").join("nested").join("c.json"));

        store.save(&Snapshot::new()).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_save_into_unwritable_location_fails() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "a file, not a directory").unwrap();

        let store = JsonFileStore::new(blocker.join("contestants.json"));
        let err = store.save(&Snapshot::new()).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }

    #[test]
    fn test_loads_existing_deployment_snapshot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("contestants.json");
        fs::write(
            &path,
            r#"{
  "Bob": {
    "date_of_birth": "1980-05-05",
    "age": 46,
    "starting_weight": 250,
    "current_weight": 225.5,
    "weight_lost": 24.5,
    "percentage_lost": 9.8
  }
}"#,
        )
        .unwrap();

        let loaded = JsonFileStore::new(&path).load();
        let bob = &loaded["Bob"];
        assert_eq!(bob.age, 46);
        assert_eq!(bob.starting_weight, 250.0);
        assert_eq!(bob.percentage_lost, 9.8);
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(store.load().is_empty());

        let mut snapshot = Snapshot::new();
        snapshot.insert("Alice".to_string(), record(200.0));
        store.save(&snapshot).unwrap();

        assert_eq!(store.load(), snapshot);
    }
}
