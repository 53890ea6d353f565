//! Progress values published while an update cycle runs.

use serde::Serialize;

use crate::models::StatusMessages;

/// Phase of an update cycle as seen by observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Idle,
    Downloaded,
    Parsing,
    Completed,
    DownloadError,
    ParsingError,
    SavingError,
}

impl StatusKind {
    /// Percentage reported with this phase.
    pub fn progress(self) -> u8 {
        match self {
            StatusKind::Downloaded => 10,
            StatusKind::Parsing => 33,
            StatusKind::Completed => 100,
            StatusKind::Idle
            | StatusKind::DownloadError
            | StatusKind::ParsingError
            | StatusKind::SavingError => 0,
        }
    }

    pub fn is_error(self) -> bool {
        matches!(
            self,
            StatusKind::DownloadError | StatusKind::ParsingError | StatusKind::SavingError
        )
    }
}

/// Latest known state of the update cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateStatus {
    pub kind: StatusKind,

    /// Human-readable phase label
    pub phase: String,

    /// 0 to 100
    pub progress: u8,
}

impl UpdateStatus {
    /// Build a status for `kind` with its label from the message catalogue.
    pub fn new(kind: StatusKind, messages: &StatusMessages) -> Self {
        Self {
            kind,
            phase: messages.label(kind).to_string(),
            progress: kind.progress(),
        }
    }

    /// Status before any cycle has reported.
    pub fn idle() -> Self {
        Self {
            kind: StatusKind::Idle,
            phase: String::new(),
            progress: 0,
        }
    }
}

impl Default for UpdateStatus {
    fn default() -> Self {
        Self::idle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_values() {
        assert_eq!(StatusKind::Downloaded.progress(), 10);
        assert_eq!(StatusKind::Parsing.progress(), 33);
        assert_eq!(StatusKind::Completed.progress(), 100);
        assert_eq!(StatusKind::ParsingError.progress(), 0);
    }

    #[test]
    fn test_new_uses_catalogue_label() {
        let messages = StatusMessages::default();
        let status = UpdateStatus::new(StatusKind::DownloadError, &messages);
        assert_eq!(status.phase, messages.download_error);
        assert_eq!(status.progress, 0);
        assert!(status.kind.is_error());
    }
}
