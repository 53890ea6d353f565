// src/storage/local.rs

//! Local filesystem storage implementation.
//!
//! Keeps lessons in memory and mirrors them to a JSON snapshot after every
//! write. The snapshot is loaded back when the store is opened.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! └── lessons.json          # { updated_at, count, lessons }
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::Lesson;
use crate::storage::{LessonStore, MemoryStore};

const SNAPSHOT_FILE: &str = "lessons.json";

/// Contents of `lessons.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonSnapshot {
    /// Timestamp of the last write
    pub updated_at: DateTime<Utc>,
    /// Total lesson count
    pub count: usize,
    pub lessons: Vec<Lesson>,
}

impl LessonSnapshot {
    pub fn new(lessons: Vec<Lesson>) -> Self {
        Self {
            updated_at: Utc::now(),
            count: lessons.len(),
            lessons,
        }
    }
}

/// File-backed lesson store.
///
/// Writes go to memory first, then to the snapshot. When the snapshot write
/// fails the upsert returns an error but queries already see the new lessons;
/// the file catches up on the next successful write.
pub struct LocalStore {
    root_dir: PathBuf,
    lessons: MemoryStore,
    // Serializes snapshot writes so the file always reflects a complete state.
    write_lock: Mutex<()>,
}

impl LocalStore {
    /// Open the store rooted at `root_dir`, loading an existing snapshot.
    pub async fn open(root_dir: impl Into<PathBuf>) -> Result<Self> {
        let root_dir = root_dir.into();
        let lessons = match read_snapshot(&root_dir.join(SNAPSHOT_FILE)).await? {
            Some(snapshot) => {
                log::info!(
                    "Loaded {} lesson(s) from {}",
                    snapshot.lessons.len(),
                    root_dir.display()
                );
                MemoryStore::with_lessons(snapshot.lessons)
            }
            None => MemoryStore::new(),
        };

        Ok(Self {
            root_dir,
            lessons,
            write_lock: Mutex::new(()),
        })
    }

    /// Path of the snapshot file.
    pub fn snapshot_path(&self) -> PathBuf {
        self.root_dir.join(SNAPSHOT_FILE)
    }

    /// Write bytes atomically (write to temp, then rename).
    ///
    /// The temp file is removed when any step fails.
    async fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("tmp");
        let written: std::io::Result<()> = async {
            let mut file = tokio::fs::File::create(&tmp).await?;
            file.write_all(bytes).await?;
            file.flush().await?;
            drop(file);
            tokio::fs::rename(&tmp, path).await
        }
        .await;

        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(AppError::Io(e));
        }
        Ok(())
    }

    async fn save(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let snapshot = LessonSnapshot::new(self.lessons.snapshot().await);
        let bytes = serde_json::to_vec_pretty(&snapshot)?;
        self.write_bytes(&self.snapshot_path(), &bytes)
            .await
            .map_err(|e| AppError::storage(format!("failed to write {SNAPSHOT_FILE}: {e}")))?;
        log::debug!("Snapshot written with {} lesson(s)", snapshot.count);
        Ok(())
    }
}

/// Read a snapshot, returning None if the file doesn't exist.
async fn read_snapshot(path: &Path) -> Result<Option<LessonSnapshot>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(AppError::Io(e)),
    }
}

#[async_trait]
impl LessonStore for LocalStore {
    async fn upsert_many(&self, lessons: &[Lesson]) -> Result<usize> {
        let written = self.lessons.upsert_many(lessons).await?;
        self.save().await?;
        Ok(written)
    }

    async fn query_by_group_and_date(&self, group: &str, date: NaiveDate) -> Result<Vec<Lesson>> {
        self.lessons.query_by_group_and_date(group, date).await
    }

    async fn query_by_teacher_and_date(
        &self,
        teacher: &str,
        date: NaiveDate,
    ) -> Result<Vec<Lesson>> {
        self.lessons.query_by_teacher_and_date(teacher, date).await
    }

    async fn distinct_groups(&self) -> Result<Vec<String>> {
        self.lessons.distinct_groups().await
    }

    async fn distinct_teachers(&self) -> Result<Vec<String>> {
        self.lessons.distinct_teachers().await
    }

    async fn distinct_subjects(&self, group: &str) -> Result<Vec<String>> {
        self.lessons.distinct_subjects(group).await
    }

    async fn count(&self) -> Result<usize> {
        self.lessons.count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn lesson(number: &str, subject: &str) -> Lesson {
        Lesson {
            date: NaiveDate::from_ymd_opt(2024, 9, 5).unwrap(),
            lesson_number: number.to_string(),
            room_number: None,
            times: Some("8.30-10.00".to_string()),
            group_name: "21-1".to_string(),
            subject_name: subject.to_string(),
            teacher_name: Some("Иванов И.И.".to_string()),
        }
    }

    #[tokio::test]
    async fn test_open_empty_directory() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::open(tmp.path()).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
        assert!(!store.snapshot_path().exists());
    }

    #[tokio::test]
    async fn test_snapshot_survives_reopen() {
        let tmp = TempDir::new().unwrap();
        {
            let store = LocalStore::open(tmp.path()).await.unwrap();
            store
                .upsert_many(&[lesson("1", "Математика"), lesson("2", "Физика")])
                .await
                .unwrap();
        }

        let store = LocalStore::open(tmp.path()).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 2);
        let date = NaiveDate::from_ymd_opt(2024, 9, 5).unwrap();
        let found = store.query_by_group_and_date("21-1", date).await.unwrap();
        assert_eq!(found[0].subject_name, "Математика");
        assert_eq!(found[0].times.as_deref(), Some("8.30-10.00"));
    }

    #[tokio::test]
    async fn test_snapshot_format() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::open(tmp.path()).await.unwrap();
        store.upsert_many(&[lesson("1", "Математика")]).await.unwrap();

        let raw = tokio::fs::read_to_string(store.snapshot_path()).await.unwrap();
        let snapshot: LessonSnapshot = serde_json::from_str(&raw).unwrap();
        assert_eq!(snapshot.count, 1);
        assert!(raw.contains("\"05.09.2024\""));
        assert!(!tmp.path().join("lessons.tmp").exists());
    }

    #[tokio::test]
    async fn test_repeated_upsert_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::open(tmp.path()).await.unwrap();
        let lessons = vec![lesson("1", "Математика"), lesson("2", "Физика")];
        store.upsert_many(&lessons).await.unwrap();
        let first = tokio::fs::read_to_string(store.snapshot_path()).await.unwrap();
        store.upsert_many(&lessons).await.unwrap();

        let snapshot: LessonSnapshot =
            serde_json::from_slice(&tokio::fs::read(store.snapshot_path()).await.unwrap()).unwrap();
        let before: LessonSnapshot = serde_json::from_str(&first).unwrap();
        assert_eq!(snapshot.lessons, before.lessons);
    }

    #[tokio::test]
    async fn test_failed_snapshot_write_cleans_temp_file() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::open(tmp.path()).await.unwrap();

        let blocker = tmp.path().join("lessons.json");
        std::fs::create_dir(&blocker).unwrap();
        std::fs::write(blocker.join("keep"), b"x").unwrap();

        let err = store.upsert_many(&[lesson("1", "Математика")]).await.unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
        assert!(!tmp.path().join("lessons.tmp").exists());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_an_error() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("lessons.json"), b"{ not json").unwrap();
        assert!(LocalStore::open(tmp.path()).await.is_err());
    }
}
