// src/pipeline/task.rs

//! Lifecycle and results of corpus update tasks.

use serde::Serialize;

use crate::models::Corpus;

/// Lifecycle of a corpus task or of one of its documents.
///
/// Corpus tasks move `LinksFetching -> FileDownloading -> Done | Failed`;
/// documents move `FileDownloading -> Parsing -> Persisting -> Done | Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Idle,
    LinksFetching,
    FileDownloading,
    Parsing,
    Persisting,
    Done,
    Failed,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Done | TaskState::Failed)
    }

    /// Whether moving from `self` to `next` is a legal step.
    pub fn can_transition_to(self, next: TaskState) -> bool {
        use TaskState::*;

        match (self, next) {
            (Idle, LinksFetching) => true,
            (LinksFetching, FileDownloading) => true,
            (FileDownloading, Parsing | Done) => true,
            (Parsing, Persisting) => true,
            (Persisting, Done) => true,
            (from, Failed) => !matches!(from, Idle) && !from.is_terminal(),
            _ => false,
        }
    }

    /// Move to `next`.
    pub fn advance(&mut self, next: TaskState) {
        debug_assert!(
            self.can_transition_to(next),
            "illegal task transition {self:?} -> {next:?}"
        );
        *self = next;
    }
}

/// How processing of one document ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "result", content = "detail")]
pub enum LinkOutcome {
    /// Still being processed
    Pending,
    Saved { lessons: usize },
    /// Same bytes as a document already processed in this task
    Duplicate,
    DownloadFailed(String),
    ParseFailed(String),
    SaveFailed(String),
}

/// Result of one document link.
#[derive(Debug, Clone, Serialize)]
pub struct LinkReport {
    pub url: String,
    pub state: TaskState,
    pub outcome: LinkOutcome,
    /// SHA-256 of the downloaded bytes, hex encoded
    pub digest: Option<String>,
}

impl LinkReport {
    /// Report for a link whose download is starting.
    pub(crate) fn started(url: String) -> Self {
        Self {
            url,
            state: TaskState::FileDownloading,
            outcome: LinkOutcome::Pending,
            digest: None,
        }
    }

    pub(crate) fn finish(mut self, outcome: LinkOutcome) -> Self {
        self.state.advance(TaskState::Done);
        self.outcome = outcome;
        self
    }

    pub(crate) fn fail(mut self, outcome: LinkOutcome) -> Self {
        self.state.advance(TaskState::Failed);
        self.outcome = outcome;
        self
    }

    pub fn lessons_saved(&self) -> usize {
        match self.outcome {
            LinkOutcome::Saved { lessons } => lessons,
            _ => 0,
        }
    }
}

/// Result of one corpus task.
#[derive(Debug, Clone, Serialize)]
pub struct CorpusReport {
    pub corpus: Corpus,
    pub state: TaskState,
    pub links: Vec<LinkReport>,
    /// Reason the whole corpus failed
    pub error: Option<String>,
}

impl CorpusReport {
    pub(crate) fn failed(corpus: Corpus, error: impl Into<String>) -> Self {
        Self {
            corpus,
            state: TaskState::Failed,
            links: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn lessons_saved(&self) -> usize {
        self.links.iter().map(LinkReport::lessons_saved).sum()
    }

    pub fn failed_links(&self) -> usize {
        self.links
            .iter()
            .filter(|l| l.state == TaskState::Failed)
            .count()
    }

    pub fn link(&self, url: &str) -> Option<&LinkReport> {
        self.links.iter().find(|l| l.url == url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lifecycle() {
        let mut state = TaskState::FileDownloading;
        state.advance(TaskState::Parsing);
        state.advance(TaskState::Persisting);
        state.advance(TaskState::Done);
        assert!(state.is_terminal());
    }

    #[test]
    fn test_failed_reachable_from_active_states_only() {
        for state in [
            TaskState::LinksFetching,
            TaskState::FileDownloading,
            TaskState::Parsing,
            TaskState::Persisting,
        ] {
            assert!(state.can_transition_to(TaskState::Failed));
        }
        assert!(!TaskState::Idle.can_transition_to(TaskState::Failed));
        assert!(!TaskState::Done.can_transition_to(TaskState::Failed));
        assert!(!TaskState::Failed.can_transition_to(TaskState::Failed));
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!TaskState::Idle.can_transition_to(TaskState::Parsing));
        assert!(!TaskState::Idle.can_transition_to(TaskState::FileDownloading));
        assert!(!TaskState::Parsing.can_transition_to(TaskState::Done));
        assert!(!TaskState::Done.can_transition_to(TaskState::LinksFetching));
    }

    #[test]
    fn test_started_link_is_pending() {
        let report = LinkReport::started("a.pdf".to_string());
        assert_eq!(report.state, TaskState::FileDownloading);
        assert_eq!(report.outcome, LinkOutcome::Pending);
        assert_eq!(report.lessons_saved(), 0);
    }

    #[test]
    fn test_corpus_report_totals() {
        let report = CorpusReport {
            corpus: Corpus::First,
            state: TaskState::Done,
            links: vec![
                LinkReport::started("a.pdf".to_string()).finish(LinkOutcome::Saved { lessons: 4 }),
                LinkReport::started("b.pdf".to_string())
                    .fail(LinkOutcome::DownloadFailed("404".to_string())),
                LinkReport::started("c.pdf".to_string()).finish(LinkOutcome::Saved { lessons: 3 }),
            ],
            error: None,
        };
        assert_eq!(report.lessons_saved(), 7);
        assert_eq!(report.failed_links(), 1);
        assert_eq!(report.link("b.pdf").unwrap().state, TaskState::Failed);
    }
}
