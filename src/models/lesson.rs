//! Lesson record and its storage identity.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single scheduled lesson.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Lesson {
    /// Calendar day of the lesson
    #[serde(with = "dotted_date")]
    pub date: NaiveDate,

    /// Slot identifier, e.g. `1` or `3-4`
    pub lesson_number: String,

    /// Room number, `None` when the document marks no room
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_number: Option<String>,

    /// Free-text time range, e.g. `8.30-10.00`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub times: Option<String>,

    pub group_name: String,
    pub subject_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_name: Option<String>,
}

/// Identity of a stored lesson: (date, lesson number, group, subject).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LessonKey {
    pub date: NaiveDate,
    pub lesson_number: String,
    pub group_name: String,
    pub subject_name: String,
}

impl Lesson {
    /// Storage identity of this lesson.
    pub fn key(&self) -> LessonKey {
        LessonKey {
            date: self.date,
            lesson_number: self.lesson_number.clone(),
            group_name: self.group_name.clone(),
            subject_name: self.subject_name.clone(),
        }
    }

    /// Sort key placing `2` before `10` and `3-4` after `3`.
    pub fn slot_order(&self) -> (u32, String) {
        let digits: String = self
            .lesson_number
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        (digits.parse().unwrap_or(u32::MAX), self.lesson_number.clone())
    }

    /// Format lesson for display using a template.
    ///
    /// Supported placeholders:
    /// - `{date}`, `{number}`, `{room}`, `{times}`
    /// - `{group}`, `{subject}`, `{teacher}`
    pub fn format(&self, template: &str) -> String {
        template
            .replace("{date}", &self.date.format("%d.%m.%Y").to_string())
            .replace("{number}", &self.lesson_number)
            .replace("{room}", self.room_number.as_deref().unwrap_or("-"))
            .replace("{times}", self.times.as_deref().unwrap_or(""))
            .replace("{group}", &self.group_name)
            .replace("{subject}", &self.subject_name)
            .replace("{teacher}", self.teacher_name.as_deref().unwrap_or(""))
    }
}

/// Serde adapter storing dates as `dd.MM.yyyy`.
mod dotted_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    const FORMAT: &str = "%d.%m.%Y";

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(&raw, FORMAT).map_err(D::Error::custom)
    }
}
