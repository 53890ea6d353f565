// src/services/parser/segment.rs

//! Segmentation of document text and field extraction per segment.
//!
//! Extracted schedule text wraps table cells over several lines. A new
//! segment starts on a line that opens with a lesson slot (`1`, `3-4`)
//! followed, optionally after times and a room, by an uppercase Cyrillic
//! letter, or on a line holding a pair of group codes. All other line breaks
//! are folded into spaces.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{Corpus, CorpusProfile};

const SLOT: &str = r"\d{1,2}(?:-\d{1,2})?";
const TIMES: &str = r"(\d{1,2}[.:]\d{2})\s*[-–]\s*(\d{1,2}[.:]\d{2})";
const GROUP: &str = r"[^\s-]+(?:-[^\s-]+)+";
const TEACHER: &str = r"([А-ЯЁ][а-яё]+(?:-[А-ЯЁ][а-яё]+)?)\s+([А-ЯЁ])\.\s*([А-ЯЁ])\.";

static RULES: LazyLock<Vec<SegmentRules>> = LazyLock::new(|| {
    Corpus::ALL
        .iter()
        .map(|corpus| SegmentRules::compile(corpus.profile()))
        .collect()
});

/// A recognized piece of a schedule document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Header naming the two groups of the following rows
    Groups(String, String),
    /// One lesson cell
    Lesson(LessonFields),
}

/// Fields pulled out of a lesson segment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LessonFields {
    pub lesson_number: Option<String>,
    pub room_number: Option<String>,
    pub times: Option<String>,
    pub teacher_name: Option<String>,
    pub subject_name: String,
}

/// Compiled patterns of one building's document layout.
#[derive(Debug)]
pub struct SegmentRules {
    date: Regex,
    boundary: Regex,
    group_header: Regex,
    slot: Regex,
    room: Regex,
    times: Regex,
    teacher: Regex,
}

impl SegmentRules {
    /// Rules for `corpus`, compiled once.
    pub fn for_corpus(corpus: Corpus) -> &'static SegmentRules {
        &RULES[corpus.index()]
    }

    fn compile(profile: &CorpusProfile) -> Self {
        let room = profile.room_pattern;
        let build = |pattern: &str| {
            Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern {pattern}: {e}"))
        };

        Self {
            date: build(profile.date_pattern),
            boundary: build(&format!(
                r"^{SLOT}-?\s*(?:{TIMES}\s*)?(?:(?:{room})\s+)?[А-ЯЁ]"
            )),
            group_header: build(&format!(r"^({GROUP})\s+({GROUP})$")),
            slot: build(&format!(r"^({SLOT})(?:-|\s+|$|[А-ЯЁ])")),
            room: build(&format!(r"^({room})(?:\s+|$)")),
            times: build(TIMES),
            teacher: build(TEACHER),
        }
    }

    /// Candidate date substrings, in document order.
    pub fn date_candidates<'t>(&self, text: &'t str) -> impl Iterator<Item = &'t str> {
        self.date.find_iter(text).map(|m| m.as_str())
    }

    fn is_group_header(&self, line: &str) -> bool {
        self.group_header.is_match(line)
    }

    fn starts_segment(&self, line: &str) -> bool {
        self.boundary.is_match(line)
    }

    /// Split extracted text into segments.
    pub fn segment(&self, text: &str) -> Vec<String> {
        let mut segments = Vec::new();
        let mut current = String::new();

        for line in text.lines() {
            let line = collapse_whitespace(line);
            if line.is_empty() {
                continue;
            }

            if self.is_group_header(&line) {
                flush(&mut segments, &mut current);
                segments.push(line);
                continue;
            }

            if self.starts_segment(&line) {
                flush(&mut segments, &mut current);
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&line);
        }
        flush(&mut segments, &mut current);

        segments
    }

    /// Extract fields from one segment.
    ///
    /// Returns `None` when the segment matches no recognized pattern.
    pub fn parse_segment(&self, segment: &str) -> Option<Segment> {
        let segment = collapse_whitespace(segment);

        if let Some(caps) = self.group_header.captures(&segment) {
            return Some(Segment::Groups(caps[1].to_string(), caps[2].to_string()));
        }

        let mut fields = LessonFields::default();
        let mut rest = segment.clone();

        if let Some(caps) = self.times.captures(&rest) {
            fields.times = Some(format!("{}-{}", &caps[1], &caps[2]));
            rest = self.times.replace(&rest, " ").into_owned();
            rest = collapse_whitespace(&rest);
        }

        if let Some(slot) = self.slot.captures(&rest).and_then(|caps| caps.get(1)) {
            fields.lesson_number = Some(slot.as_str().to_string());
            rest = rest[slot.end()..]
                .trim_start_matches(['-', ' '])
                .to_string();
        }

        if let Some(room) = self.room.captures(&rest).and_then(|caps| caps.get(1)) {
            let value = room.as_str();
            if !matches!(value, "нет" | "Нет") {
                fields.room_number = Some(collapse_whitespace(value));
            }
            rest = rest[room.end()..].trim_start().to_string();
        }

        if let Some(caps) = self.teacher.captures(&rest) {
            fields.teacher_name = Some(format!("{} {}.{}.", &caps[1], &caps[2], &caps[3]));
            rest = self.teacher.replacen(&rest, 1, " ").into_owned();
        }

        let subject = collapse_whitespace(&rest);
        let subject = subject.trim_matches([' ', ',', ';', '-', '–', '/']);
        if !subject.chars().any(char::is_alphabetic) {
            return None;
        }
        fields.subject_name = subject.to_string();

        Some(Segment::Lesson(fields))
    }
}

fn flush(segments: &mut Vec<String>, current: &mut String) {
    let segment = collapse_whitespace(current);
    if !segment.is_empty() {
        segments.push(segment);
    }
    current.clear();
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
