use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;

// Import logging macros
use crate::log_store_operation;

/// Topics written on first run when no backing file exists
pub const DEFAULT_TOPICS: [&str; 5] = [
    "functions",
    "map/filter/reduce",
    "recursion",
    "immutable data structures",
    "error handling",
];

#[derive(Debug, thiserror::Error)]
pub enum TopicStoreError {
    #[error("Topic name is required")]
    EmptyTopic,

    #[error("Topic already exists: {0}")]
    DuplicateTopic(String),

    #[error("Topic not found: {0}")]
    NotFound(String),

    #[error("topic file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("topic file is not a JSON array of strings: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Ordered topic list persisted as a pretty-printed JSON array.
///
/// Every mutation re-reads and rewrites the whole file without locking, so
/// concurrent writers race and the last write wins.
#[derive(Debug, Clone)]
pub struct TopicStore {
    path: PathBuf,
}

impl TopicStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the topic list, seeding the defaults when the file is absent
    pub async fn load(&self) -> Result<Vec<String>, TopicStoreError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let defaults: Vec<String> = DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect();
                self.save(&defaults).await?;
                log_store_operation!(info, "load", "backing file missing, default topics written");
                return Ok(defaults);
            }
            Err(e) => {
                log_store_operation!(error, "load", error = e);
                return Err(e.into());
            }
        };

        let topics: Vec<String> = serde_json::from_str(&content).map_err(|e| {
            log_store_operation!(error, "load", error = e);
            e
        })?;

        log_store_operation!(debug, "load", count = topics.len(), path = self.path);
        Ok(topics)
    }

    /// Overwrite the backing file with the given list
    pub async fn save(&self, topics: &[String]) -> Result<(), TopicStoreError> {
        let json = serde_json::to_string_pretty(topics)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        fs::write(&self.path, json).await.map_err(|e| {
            log_store_operation!(error, "save", error = e);
            e
        })?;

        log_store_operation!(debug, "save", count = topics.len(), path = self.path);
        Ok(())
    }

    /// Append a topic after trimming it; duplicates are rejected unwritten
    pub async fn add(&self, topic: &str) -> Result<Vec<String>, TopicStoreError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(TopicStoreError::EmptyTopic);
        }

        let mut topics = self.load().await?;
        if topics.iter().any(|existing| existing == topic) {
            return Err(TopicStoreError::DuplicateTopic(topic.to_string()));
        }

        topics.push(topic.to_string());
        self.save(&topics).await?;
        Ok(topics)
    }

    /// Remove the first exact match; absent topics are rejected unwritten
    pub async fn remove(&self, topic: &str) -> Result<Vec<String>, TopicStoreError> {
        let mut topics = self.load().await?;
        let position = topics
            .iter()
            .position(|existing| existing == topic)
            .ok_or_else(|| TopicStoreError::NotFound(topic.to_string()))?;

        topics.remove(position);
        self.save(&topics).await?;
        Ok(topics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> TopicStore {
        TopicStore::new(dir.path().join("topics.json"))
    }

    fn defaults() -> Vec<String> {
        DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect()
    }

    #[tokio::test]
    async fn test_load_seeds_defaults_and_creates_file() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(!store.path().exists());

        let topics = store.load().await.unwrap();

        assert_eq!(topics, defaults());
        let on_disk: Vec<String> =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(on_disk, defaults());
    }

    #[tokio::test]
    async fn test_file_is_pretty_printed() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.save(&["closures".to_string()]).await.unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw, "[\n  \"closures\"\n]");
    }

    #[tokio::test]
    async fn test_add_trims_and_appends_in_order() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let topics = store.add("  generators \n").await.unwrap();

        assert_eq!(topics.last().map(String::as_str), Some("generators"));
        assert_eq!(topics.len(), 6);
        assert_eq!(store.load().await.unwrap(), topics);
    }

    #[tokio::test]
    async fn test_add_rejects_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let err = store.add("   ").await.unwrap_err();
        assert!(matches!(err, TopicStoreError::EmptyTopic));
    }

    #[tokio::test]
    async fn test_add_duplicate_leaves_list_untouched() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let before = store.load().await.unwrap();

        let err = store.add("recursion").await.unwrap_err();

        assert!(matches!(err, TopicStoreError::DuplicateTopic(ref t) if t == "recursion"));
        assert_eq!(store.load().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_duplicate_check_is_exact() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let topics = store.add("Recursion").await.unwrap();
        assert!(topics.contains(&"Recursion".to_string()));
        assert!(topics.contains(&"recursion".to_string()));
    }

    #[tokio::test]
    async fn test_remove_missing_leaves_list_untouched() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let before = store.load().await.unwrap();

        let err = store.remove("decorators").await.unwrap_err();

        assert!(matches!(err, TopicStoreError::NotFound(_)));
        assert_eq!(store.load().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_add_then_remove_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let original = store.load().await.unwrap();

        store.add("decorators").await.unwrap();
        let restored = store.remove("decorators").await.unwrap();

        assert_eq!(restored, original);
        assert_eq!(store.load().await.unwrap(), original);
    }

    #[tokio::test]
    async fn test_malformed_file_propagates_parse_error() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "{ not a list").unwrap();

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, TopicStoreError::Parse(_)));
    }

    #[tokio::test]
    async fn test_save_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let store = TopicStore::new(dir.path().join("data").join("topics.json"));

        let topics = store.load().await.unwrap();
        assert_eq!(topics.len(), 5);
        assert!(store.path().exists());
    }
}
