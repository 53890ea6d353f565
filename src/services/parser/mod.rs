// src/services/parser/mod.rs

//! Schedule document parser.
//!
//! Converts a downloaded document into lesson records in two stages:
//! text is split into segments, then fields are pulled out of each segment
//! with the building's patterns. Unrecognized segments are skipped; only a
//! document without readable text or without a date fails as a whole.

mod segment;
mod text;

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::error::{AppError, Result};
use crate::models::{Corpus, Lesson};

pub use segment::{LessonFields, Segment, SegmentRules};
pub use text::{PdfTextExtractor, PlainTextExtractor, TextExtractor};

/// Parses schedule documents of any building.
#[derive(Clone)]
pub struct DocumentParser {
    extractor: Arc<dyn TextExtractor>,
}

impl DocumentParser {
    /// Create a parser using the given text extractor.
    pub fn new(extractor: Arc<dyn TextExtractor>) -> Self {
        Self { extractor }
    }

    /// Parser for PDF documents.
    pub fn pdf() -> Self {
        Self::new(Arc::new(PdfTextExtractor))
    }

    /// Parse raw document bytes of `corpus` into lessons.
    pub fn parse(&self, bytes: &[u8], corpus: Corpus) -> Result<Vec<Lesson>> {
        let text = self.extractor.extract(bytes)?;
        parse_text(&text, corpus)
    }
}

impl Default for DocumentParser {
    fn default() -> Self {
        Self::pdf()
    }
}

/// Find the document date using the building's date layout.
pub fn find_date(text: &str, corpus: Corpus) -> Option<NaiveDate> {
    let format = corpus.profile().date_format;
    SegmentRules::for_corpus(corpus)
        .date_candidates(text)
        .find_map(|candidate| format.parse(candidate))
}

/// Parse extracted document text of `corpus` into lessons.
///
/// Lessons are attributed to the group pair of the nearest preceding group
/// header. Within one header block the first lesson of a slot belongs to the
/// first group and later lessons of the same slot to the second group.
pub fn parse_text(text: &str, corpus: Corpus) -> Result<Vec<Lesson>> {
    let date = find_date(text, corpus)
        .ok_or_else(|| AppError::parse(format!("{corpus} corpus document"), "no date"))?;
    let rules = SegmentRules::for_corpus(corpus);

    let mut lessons = Vec::new();
    let mut groups: Option<(String, String)> = None;
    let mut seen_slots: HashSet<String> = HashSet::new();
    let mut skipped = 0usize;

    for segment in rules.segment(text) {
        match rules.parse_segment(&segment) {
            Some(Segment::Groups(first, second)) => {
                groups = Some((first, second));
                seen_slots.clear();
            }
            Some(Segment::Lesson(fields)) => {
                let (Some((first, second)), Some(number)) = (&groups, fields.lesson_number)
                else {
                    skipped += 1;
                    continue;
                };
                let group_name = if seen_slots.insert(number.clone()) {
                    first
                } else {
                    second
                };
                lessons.push(Lesson {
                    date,
                    lesson_number: number,
                    room_number: fields.room_number,
                    times: fields.times,
                    group_name: group_name.clone(),
                    subject_name: fields.subject_name,
                    teacher_name: fields.teacher_name,
                });
            }
            None => skipped += 1,
        }
    }

    log::debug!(
        "Parsed {} lesson(s) for {} ({} segment(s) skipped)",
        lessons.len(),
        date,
        skipped
    );
    Ok(lessons)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIRST_DOC: &str = "\
ГАПОУ РК «Петрозаводский автотранспортный техникум»
РАСПИСАНИЕ ЗАНЯТИЙ
на 5 сентября 2024 г.
21-1 21-2
1 305 Иванов И.И.
Математика
1 нет Физическая
культура
2 101 Петрова А. Б. Русский язык
2 214 Информатика
ТО-23 ЭМ-23
1 с/з Сидоров В.В. Физическая культура
";

    const SECOND_DOC: &str = "\
Расписание на 05.09.2024
31-1 31-2
1-2 8.30-10.00 ауд. 12 Кузнецов П.П. Электротехника
1-2 нет Черчение
";

    #[test]
    fn test_parse_first_corpus_document() {
        let lessons = parse_text(FIRST_DOC, Corpus::First).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 9, 5).unwrap();
        assert_eq!(lessons.len(), 5);
        assert!(lessons.iter().all(|l| l.date == date));

        assert_eq!(lessons[0].group_name, "21-1");
        assert_eq!(lessons[0].lesson_number, "1");
        assert_eq!(lessons[0].room_number.as_deref(), Some("305"));
        assert_eq!(lessons[0].teacher_name.as_deref(), Some("Иванов И.И."));
        assert_eq!(lessons[0].subject_name, "Математика");

        assert_eq!(lessons[1].group_name, "21-2");
        assert_eq!(lessons[1].room_number, None);
        assert_eq!(lessons[1].subject_name, "Физическая культура");

        assert_eq!(lessons[2].group_name, "21-1");
        assert_eq!(lessons[2].teacher_name.as_deref(), Some("Петрова А.Б."));
        assert_eq!(lessons[3].group_name, "21-2");
        assert_eq!(lessons[3].subject_name, "Информатика");

        assert_eq!(lessons[4].group_name, "ТО-23");
        assert_eq!(lessons[4].room_number.as_deref(), Some("с/з"));
    }

    #[test]
    fn test_parse_second_corpus_document() {
        let lessons = parse_text(SECOND_DOC, Corpus::Second).unwrap();
        assert_eq!(lessons.len(), 2);
        assert_eq!(lessons[0].lesson_number, "1-2");
        assert_eq!(lessons[0].times.as_deref(), Some("8.30-10.00"));
        assert_eq!(lessons[0].room_number.as_deref(), Some("ауд. 12"));
        assert_eq!(lessons[0].group_name, "31-1");
        assert_eq!(lessons[1].group_name, "31-2");
        assert_eq!(lessons[1].subject_name, "Черчение");
    }

    const THIRD_DOC: &str = "\
Расписание занятий на 12.09.2024
41-1 41-2
1 дист Смирнова Е.В. Информатика
1 210/2 Химия
3-4 нет Физическая
культура
";

    #[test]
    fn test_parse_third_corpus_document() {
        let lessons = parse_text(THIRD_DOC, Corpus::Third).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 9, 12).unwrap();
        assert_eq!(lessons.len(), 3);
        assert!(lessons.iter().all(|l| l.date == date));

        assert_eq!(lessons[0].group_name, "41-1");
        assert_eq!(lessons[0].room_number.as_deref(), Some("дист"));
        assert_eq!(lessons[0].teacher_name.as_deref(), Some("Смирнова Е.В."));
        assert_eq!(lessons[0].subject_name, "Информатика");

        assert_eq!(lessons[1].group_name, "41-2");
        assert_eq!(lessons[1].room_number.as_deref(), Some("210/2"));
        assert_eq!(lessons[1].subject_name, "Химия");

        assert_eq!(lessons[2].lesson_number, "3-4");
        assert_eq!(lessons[2].group_name, "41-1");
        assert_eq!(lessons[2].room_number, None);
        assert_eq!(lessons[2].subject_name, "Физическая культура");
    }

    #[test]
    fn test_document_without_date_fails() {
        let err = parse_text("21-1 21-2\n1 305 Математика", Corpus::First).unwrap_err();
        assert!(matches!(err, AppError::Parse { .. }));
    }

    #[test]
    fn test_date_in_wrong_layout_is_not_found() {
        assert_eq!(find_date("Расписание на 05.09.2024", Corpus::First), None);
        assert_eq!(find_date("на 5 сентября 2024 г.", Corpus::Second), None);
    }

    #[test]
    fn test_unrecognized_segments_yield_no_lessons() {
        let text = "на 5 сентября 2024 г.\n21-1 21-2\n--- ***\n### ///";
        assert!(parse_text(text, Corpus::First).unwrap().is_empty());
    }

    #[test]
    fn test_lessons_before_group_header_are_dropped() {
        let text = "на 5 сентября 2024 г.\n1 305 Иванов И.И. Математика";
        assert!(parse_text(text, Corpus::First).unwrap().is_empty());
    }

    #[test]
    fn test_group_header_is_not_lesson_content() {
        let text = "на 5 сентября 2024 г.\n21-1 21-2";
        assert!(parse_text(text, Corpus::First).unwrap().is_empty());
    }

    #[test]
    fn test_document_parser_with_plain_text() {
        let parser = DocumentParser::new(Arc::new(PlainTextExtractor));
        let lessons = parser.parse(SECOND_DOC.as_bytes(), Corpus::Second).unwrap();
        assert_eq!(lessons.len(), 2);
    }

    #[test]
    fn test_reparsing_is_deterministic() {
        let a = parse_text(FIRST_DOC, Corpus::First).unwrap();
        let b = parse_text(FIRST_DOC, Corpus::First).unwrap();
        assert_eq!(a, b);
    }
}
