//! Date formats used by the published schedule documents.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Russian month names in the genitive case, as printed after a day number.
const GENITIVE_MONTHS: [&str; 12] = [
    "января",
    "февраля",
    "марта",
    "апреля",
    "мая",
    "июня",
    "июля",
    "августа",
    "сентября",
    "октября",
    "ноября",
    "декабря",
];

const NOMINATIVE_MONTHS: [&str; 12] = [
    "январь",
    "февраль",
    "март",
    "апрель",
    "май",
    "июнь",
    "июль",
    "август",
    "сентябрь",
    "октябрь",
    "ноябрь",
    "декабрь",
];

/// Textual date layout of a schedule document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFormat {
    /// `d MonthName yyyy`, e.g. `5 сентября 2024`
    DayMonthName,
    /// `dd.MM.yyyy`, e.g. `05.09.2024`
    Dotted,
}

impl DateFormat {
    /// Parse a date string. Returns `None` when the text does not conform.
    pub fn parse(&self, text: &str) -> Option<NaiveDate> {
        let text = text.trim();
        match self {
            DateFormat::Dotted => NaiveDate::parse_from_str(text, "%d.%m.%Y").ok(),
            DateFormat::DayMonthName => {
                let mut parts = text.split_whitespace();
                let day: u32 = parts.next()?.parse().ok()?;
                let month = month_number(parts.next()?)?;
                let year: i32 = parts
                    .next()?
                    .trim_end_matches(['г', '.'])
                    .parse()
                    .ok()?;
                if parts.next().is_some() {
                    return None;
                }
                NaiveDate::from_ymd_opt(year, month, day)
            }
        }
    }

    /// Format a date the way the documents print it.
    pub fn format(&self, date: NaiveDate) -> String {
        match self {
            DateFormat::Dotted => date.format("%d.%m.%Y").to_string(),
            DateFormat::DayMonthName => format!(
                "{} {} {}",
                date.day(),
                GENITIVE_MONTHS[date.month0() as usize],
                date.year()
            ),
        }
    }
}

fn month_number(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    GENITIVE_MONTHS
        .iter()
        .position(|m| *m == lower)
        .or_else(|| NOMINATIVE_MONTHS.iter().position(|m| *m == lower))
        .map(|idx| idx as u32 + 1)
}
