//! Artifact persistence.
//!
//! Everything the pipeline produces lands under one output directory.
//! Writes are fire-and-forget: a failure is logged and reported as `None`,
//! but never aborts the run.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File store for pipeline artifacts (research JSON, critique JSON, report
/// Markdown/HTML).
#[derive(Debug, Clone)]
pub struct OutputStore {
    dir: PathBuf,
}

impl OutputStore {
    /// Create a store rooted at `dir`. The directory is created lazily on
    /// first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory of this store.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a JSON artifact with this name would be written to.
    pub fn json_path(&self, name: &str) -> PathBuf {
        let filename = if name.ends_with(".json") {
            name.to_string()
        } else {
            format!("{name}.json")
        };
        self.dir.join(filename)
    }

    /// Path a text artifact with this name would be written to.
    pub fn text_path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Serialize `data` as pretty JSON under `name`. Returns the written
    /// path, or `None` if the write failed (logged, not fatal).
    pub fn save_json<T: Serialize>(&self, data: &T, name: &str) -> Option<PathBuf> {
        let path = self.json_path(name);

        let json = match serde_json::to_string_pretty(data) {
            Ok(json) => json,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to serialize JSON artifact");
                return None;
            }
        };

        self.write(&path, &json)
    }

    /// Write `text` under `name`. Returns the written path, or `None` if the
    /// write failed.
    pub fn save_text(&self, text: &str, name: &str) -> Option<PathBuf> {
        let path = self.text_path(name);
        self.write(&path, text)
    }

    /// Read a JSON artifact back. Returns `None` if the file is missing or
    /// does not parse.
    pub fn load_json<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let path = self.json_path(name);
        let text = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to parse JSON artifact");
                None
            }
        }
    }

    /// Read a text artifact back.
    pub fn load_text(&self, name: &str) -> Option<String> {
        fs::read_to_string(self.text_path(name)).ok()
    }

    fn write(&self, path: &Path, contents: &str) -> Option<PathBuf> {
        if let Err(e) = fs::create_dir_all(&self.dir) {
            warn!(dir = %self.dir.display(), error = %e, "Failed to create output directory");
            return None;
        }

        match fs::write(path, contents) {
            Ok(()) => {
                debug!(path = %path.display(), "Saved artifact");
                Some(path.to_path_buf())
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to save artifact");
                None
            }
        }
    }
}

/// Filesystem-safe slug for topic-derived filenames: spaces become
/// underscores.
pub fn slug(topic: &str) -> String {
    topic.replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize)]
    struct Sample {
        value: u32,
    }

    #[test]
    fn test_slug_replaces_spaces() {
        assert_eq!(slug("quantum computing today"), "quantum_computing_today");
        assert_eq!(slug("single"), "single");
    }

    #[test]
    fn test_json_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = OutputStore::new(dir.path());

        let path = store.save_json(&Sample { value: 42 }, "sample").unwrap();
        assert!(path.ends_with("sample.json"));

        let loaded: Sample = store.load_json("sample").unwrap();
        assert_eq!(loaded.value, 42);
    }

    #[test]
    fn test_json_name_extension_not_doubled() {
        let dir = tempfile::tempdir().unwrap();
        let store = OutputStore::new(dir.path());

        let path = store.save_json(&Sample { value: 1 }, "critique.json").unwrap();
        assert!(path.ends_with("critique.json"));
        assert!(!path.to_string_lossy().contains("critique.json.json"));
    }

    #[test]
    fn test_save_text_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        let store = OutputStore::new(&nested);

        let path = store.save_text("# Report", "final_report.md").unwrap();
        assert!(path.exists());
        assert_eq!(store.load_text("final_report.md").unwrap(), "# Report");
    }

    #[test]
    fn test_load_missing_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = OutputStore::new(dir.path());

        assert!(store.load_json::<Sample>("absent").is_none());
        assert!(store.load_text("absent.md").is_none());
    }
}
