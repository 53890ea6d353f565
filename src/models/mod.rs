// src/models/mod.rs

//! Domain models for the schedule pipeline.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod corpus;
mod date;
mod lesson;
mod status;

// Re-export all public types
pub use config::{
    Config, CrawlerConfig, DownloadScope, LoggingConfig, SiteConfig, StatusMessages,
    StorageConfig, UpdateConfig,
};
pub use corpus::{Corpus, CorpusProfile};
pub use date::DateFormat;
pub use lesson::{Lesson, LessonKey};
pub use status::{StatusKind, UpdateStatus};
