//! Storage abstractions for lesson persistence.
//!
//! Lessons are keyed by (date, lesson number, group, subject). Writing a
//! lesson whose key is already stored replaces the stored record.
//!
//! ## Directory Structure
//!
//! ```text
//! storage/
//! ├── config.toml           # Pipeline configuration
//! └── lessons.json          # Lesson snapshot (LocalStore)
//! ```

pub mod local;
pub mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::models::Lesson;

pub use local::LocalStore;
pub use memory::MemoryStore;

/// Trait for lesson storage backends.
///
/// Query results are ordered by lesson slot; name listings are sorted and
/// free of duplicates.
#[async_trait]
pub trait LessonStore: Send + Sync {
    /// Insert or replace lessons by identity. Returns the number written.
    async fn upsert_many(&self, lessons: &[Lesson]) -> Result<usize>;

    async fn query_by_group_and_date(&self, group: &str, date: NaiveDate) -> Result<Vec<Lesson>>;

    async fn query_by_teacher_and_date(
        &self,
        teacher: &str,
        date: NaiveDate,
    ) -> Result<Vec<Lesson>>;

    async fn distinct_groups(&self) -> Result<Vec<String>>;

    async fn distinct_teachers(&self) -> Result<Vec<String>>;

    /// Subjects ever scheduled for `group`.
    async fn distinct_subjects(&self, group: &str) -> Result<Vec<String>>;

    /// Number of stored lessons.
    async fn count(&self) -> Result<usize>;
}
