// src/storage/memory.rs

//! In-memory lesson storage.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::models::{Lesson, LessonKey};
use crate::storage::LessonStore;

/// Lesson store held in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    lessons: RwLock<BTreeMap<LessonKey, Lesson>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-filled with `lessons`.
    pub fn with_lessons(lessons: Vec<Lesson>) -> Self {
        let map = lessons.into_iter().map(|l| (l.key(), l)).collect();
        Self {
            lessons: RwLock::new(map),
        }
    }

    /// All stored lessons in key order.
    pub async fn snapshot(&self) -> Vec<Lesson> {
        self.lessons.read().await.values().cloned().collect()
    }

    async fn filter<P>(&self, predicate: P) -> Vec<Lesson>
    where
        P: Fn(&Lesson) -> bool,
    {
        let mut found: Vec<Lesson> = self
            .lessons
            .read()
            .await
            .values()
            .filter(|l| predicate(l))
            .cloned()
            .collect();
        found.sort_by_key(Lesson::slot_order);
        found
    }

    async fn distinct<F>(&self, select: F) -> Vec<String>
    where
        F: Fn(&Lesson) -> Option<&str>,
    {
        let names: BTreeSet<String> = self
            .lessons
            .read()
            .await
            .values()
            .filter_map(|l| select(l).map(str::to_string))
            .collect();
        names.into_iter().collect()
    }
}

#[async_trait]
impl LessonStore for MemoryStore {
    async fn upsert_many(&self, lessons: &[Lesson]) -> Result<usize> {
        let mut map = self.lessons.write().await;
        for lesson in lessons {
            map.insert(lesson.key(), lesson.clone());
        }
        Ok(lessons.len())
    }

    async fn query_by_group_and_date(&self, group: &str, date: NaiveDate) -> Result<Vec<Lesson>> {
        Ok(self
            .filter(|l| l.date == date && l.group_name == group)
            .await)
    }

    async fn query_by_teacher_and_date(
        &self,
        teacher: &str,
        date: NaiveDate,
    ) -> Result<Vec<Lesson>> {
        Ok(self
            .filter(|l| l.date == date && l.teacher_name.as_deref() == Some(teacher))
            .await)
    }

    async fn distinct_groups(&self) -> Result<Vec<String>> {
        Ok(self.distinct(|l| Some(l.group_name.as_str())).await)
    }

    async fn distinct_teachers(&self) -> Result<Vec<String>> {
        Ok(self.distinct(|l| l.teacher_name.as_deref()).await)
    }

    async fn distinct_subjects(&self, group: &str) -> Result<Vec<String>> {
        Ok(self
            .distinct(|l| (l.group_name == group).then_some(l.subject_name.as_str()))
            .await)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.lessons.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lesson(number: &str, group: &str, subject: &str, teacher: Option<&str>) -> Lesson {
        Lesson {
            date: NaiveDate::from_ymd_opt(2024, 9, 5).unwrap(),
            lesson_number: number.to_string(),
            room_number: Some("305".to_string()),
            times: None,
            group_name: group.to_string(),
            subject_name: subject.to_string(),
            teacher_name: teacher.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_double_upsert_keeps_one_record() {
        let store = MemoryStore::new();
        let l = lesson("1", "21-1", "Математика", Some("Иванов И.И."));
        store.upsert_many(&[l.clone()]).await.unwrap();
        store.upsert_many(&[l]).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upsert_replaces_record_wholesale() {
        let store = MemoryStore::new();
        let mut l = lesson("1", "21-1", "Математика", Some("Иванов И.И."));
        store.upsert_many(&[l.clone()]).await.unwrap();

        l.room_number = None;
        l.teacher_name = None;
        store.upsert_many(&[l.clone()]).await.unwrap();

        assert_eq!(store.snapshot().await, vec![l]);
    }

    #[tokio::test]
    async fn test_group_query_is_ordered_by_slot() {
        let store = MemoryStore::with_lessons(vec![
            lesson("10", "21-1", "История", None),
            lesson("2", "21-1", "Физика", None),
            lesson("3-4", "21-1", "Химия", None),
            lesson("1", "21-2", "Математика", None),
        ]);
        let date = NaiveDate::from_ymd_opt(2024, 9, 5).unwrap();

        let found = store.query_by_group_and_date("21-1", date).await.unwrap();
        let slots: Vec<_> = found.iter().map(|l| l.lesson_number.as_str()).collect();
        assert_eq!(slots, vec!["2", "3-4", "10"]);

        let other_day = NaiveDate::from_ymd_opt(2024, 9, 6).unwrap();
        assert!(store.query_by_group_and_date("21-1", other_day).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_teacher_query() {
        let store = MemoryStore::with_lessons(vec![
            lesson("1", "21-1", "Математика", Some("Иванов И.И.")),
            lesson("2", "21-2", "Математика", Some("Иванов И.И.")),
            lesson("1", "21-2", "Физика", Some("Петрова А.Б.")),
        ]);
        let date = NaiveDate::from_ymd_opt(2024, 9, 5).unwrap();

        let found = store.query_by_teacher_and_date("Иванов И.И.", date).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].group_name, "21-1");
    }

    #[tokio::test]
    async fn test_distinct_names_are_sorted() {
        let store = MemoryStore::with_lessons(vec![
            lesson("1", "31-1", "Физика", Some("Петрова А.Б.")),
            lesson("2", "21-1", "Математика", Some("Иванов И.И.")),
            lesson("3", "21-1", "Физика", None),
            lesson("4", "21-1", "Математика", Some("Иванов И.И.")),
        ]);

        assert_eq!(store.distinct_groups().await.unwrap(), vec!["21-1", "31-1"]);
        assert_eq!(
            store.distinct_teachers().await.unwrap(),
            vec!["Иванов И.И.", "Петрова А.Б."]
        );
        assert_eq!(
            store.distinct_subjects("21-1").await.unwrap(),
            vec!["Математика", "Физика"]
        );
    }
}
