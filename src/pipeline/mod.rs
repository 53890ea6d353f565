//! Pipeline entry points for schedule updates.
//!
//! - `UpdateOrchestrator`: Runs one update task per building and guards
//!   against overlapping cycles
//! - `TaskState`, `CorpusReport`: Lifecycle and results of those tasks

mod task;
mod update;

pub use task::{CorpusReport, LinkOutcome, LinkReport, TaskState};
pub use update::UpdateOrchestrator;
