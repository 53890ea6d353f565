// src/pipeline/update.rs

//! Update cycle orchestration.
//!
//! One task per building discovers its schedule links, downloads every
//! document, parses it and upserts the lessons. Failures stay local to the
//! document or building where they happen.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::stream::{self, StreamExt};
use sha2::{Digest, Sha256};
use tokio::runtime::Handle;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinHandle;

use crate::error::{AppError, Result};
use crate::models::{Config, Corpus, StatusKind};
use crate::services::{DocumentParser, LinkDiscovery, StatusReporter};
use crate::storage::LessonStore;
use crate::utils::http::Transport;

use super::task::{CorpusReport, LinkOutcome, LinkReport, TaskState};

/// Schedules and tracks update cycles.
pub struct UpdateOrchestrator {
    worker: Arc<CorpusWorker>,
    runtime: Handle,
    tasks: Mutex<Vec<JoinHandle<CorpusReport>>>,
    cycles: AtomicUsize,
    scheduled: AtomicUsize,
}

impl UpdateOrchestrator {
    /// Create an orchestrator that spawns corpus tasks onto `runtime`.
    pub fn new(
        config: Arc<Config>,
        transport: Arc<dyn Transport>,
        store: Arc<dyn LessonStore>,
        parser: DocumentParser,
        reporter: StatusReporter,
        runtime: Handle,
    ) -> Result<Self> {
        let discovery = LinkDiscovery::from_site(&config.site)?;
        let permits = Arc::new(Semaphore::new(config.update.workers.max(1)));

        Ok(Self {
            worker: Arc::new(CorpusWorker {
                config,
                transport,
                store,
                parser,
                reporter,
                discovery,
                permits,
            }),
            runtime,
            tasks: Mutex::new(Vec::new()),
            cycles: AtomicUsize::new(0),
            scheduled: AtomicUsize::new(0),
        })
    }

    /// Start an update cycle for every building in the download scope.
    ///
    /// Returns `false` without scheduling anything while a previous cycle is
    /// still running or being awaited.
    pub fn update(&self) -> bool {
        let Ok(mut tasks) = self.tasks.try_lock() else {
            log::debug!("Update cycle is being awaited, skipping trigger");
            return false;
        };
        if tasks.iter().any(|task| !task.is_finished()) {
            log::debug!("Update cycle still running, skipping trigger");
            return false;
        }
        tasks.clear();

        let cycle = self.cycles.fetch_add(1, Ordering::SeqCst) + 1;
        let corpora = self.worker.config.update.download_scope.corpora();
        log::info!("Starting update cycle {} for {} corpus task(s)", cycle, corpora.len());

        for corpus in corpora {
            let worker = Arc::clone(&self.worker);
            tasks.push(self.runtime.spawn(async move { worker.run(corpus).await }));
            self.scheduled.fetch_add(1, Ordering::SeqCst);
        }
        true
    }

    /// Wait for the current cycle and collect its reports.
    ///
    /// Triggers arriving while this waits are ignored.
    pub async fn wait(&self) -> Vec<CorpusReport> {
        let mut tasks = self.tasks.lock().await;
        let mut reports = Vec::with_capacity(tasks.len());
        for task in tasks.drain(..) {
            match task.await {
                Ok(report) => reports.push(report),
                Err(e) => log::error!("Corpus task aborted: {}", AppError::from(e)),
            }
        }
        reports
    }

    /// Number of cycles started so far.
    pub fn cycles_started(&self) -> usize {
        self.cycles.load(Ordering::SeqCst)
    }

    /// Number of corpus tasks spawned so far.
    pub fn tasks_scheduled(&self) -> usize {
        self.scheduled.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        match self.tasks.try_lock() {
            Ok(tasks) => tasks.iter().any(|task| !task.is_finished()),
            Err(_) => true,
        }
    }

    pub fn reporter(&self) -> &StatusReporter {
        &self.worker.reporter
    }
}

/// State shared by the corpus tasks of every cycle.
struct CorpusWorker {
    config: Arc<Config>,
    transport: Arc<dyn Transport>,
    store: Arc<dyn LessonStore>,
    parser: DocumentParser,
    reporter: StatusReporter,
    discovery: LinkDiscovery,
    permits: Arc<Semaphore>,
}

impl CorpusWorker {
    async fn run(&self, corpus: Corpus) -> CorpusReport {
        let Ok(_permit) = self.permits.acquire().await else {
            return CorpusReport::failed(corpus, "worker pool closed");
        };

        let mut state = TaskState::Idle;
        state.advance(TaskState::LinksFetching);

        let links = match self.fetch_links(corpus).await {
            Ok(links) if !links.is_empty() => links,
            Ok(_) => {
                log::warn!("No schedule links found for {} corpus", corpus);
                self.reporter.report(StatusKind::DownloadError);
                return CorpusReport::failed(corpus, "no schedule links found");
            }
            Err(e) => {
                log::warn!("Link discovery failed for {} corpus: {}", corpus, e);
                self.reporter.report(StatusKind::DownloadError);
                return CorpusReport::failed(corpus, e.to_string());
            }
        };

        state.advance(TaskState::FileDownloading);
        log::info!("Processing {} document(s) for {} corpus", links.len(), corpus);

        let seen = Mutex::new(HashSet::new());
        let concurrency = self.config.crawler.max_concurrent.max(1);
        let reports: Vec<LinkReport> = stream::iter(links)
            .map(|url| self.process_link(corpus, url, &seen))
            .buffer_unordered(concurrency)
            .collect()
            .await;

        state.advance(TaskState::Done);
        let report = CorpusReport {
            corpus,
            state,
            links: reports,
            error: None,
        };
        log::info!(
            "{} corpus done: {} lesson(s) saved, {} document(s) failed",
            corpus,
            report.lessons_saved(),
            report.failed_links()
        );
        report
    }

    async fn fetch_links(&self, corpus: Corpus) -> Result<Vec<String>> {
        let html = self.transport.fetch_listing_page().await?;
        Ok(self.discovery.discover_html(&html, corpus))
    }

    async fn process_link(
        &self,
        corpus: Corpus,
        url: String,
        seen: &Mutex<HashSet<String>>,
    ) -> LinkReport {
        let mut report = LinkReport::started(url);

        let bytes = match self.transport.fetch_file(&report.url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Failed to download {}: {}", report.url, e);
                self.reporter.report(StatusKind::DownloadError);
                return report.fail(LinkOutcome::DownloadFailed(e.to_string()));
            }
        };
        self.reporter.report(StatusKind::Downloaded);

        let digest = hex::encode(Sha256::digest(&bytes));
        report.digest = Some(digest.clone());
        if !seen.lock().await.insert(digest) {
            log::info!("Skipping duplicate document {}", report.url);
            self.reporter.report(StatusKind::Completed);
            return report.finish(LinkOutcome::Duplicate);
        }

        report.state.advance(TaskState::Parsing);
        self.reporter.report(StatusKind::Parsing);
        let parser = self.parser.clone();
        let parsed = tokio::task::spawn_blocking(move || parser.parse(&bytes, corpus))
            .await
            .map_err(AppError::from)
            .and_then(|result| result);
        let lessons = match parsed {
            Ok(lessons) => lessons,
            Err(e) => {
                log::warn!("Failed to parse {}: {}", report.url, e);
                self.reporter.report(StatusKind::ParsingError);
                return report.fail(LinkOutcome::ParseFailed(e.to_string()));
            }
        };

        report.state.advance(TaskState::Persisting);
        match self.store.upsert_many(&lessons).await {
            Ok(saved) => {
                log::info!("Saved {} lesson(s) from {}", saved, report.url);
                self.reporter.report(StatusKind::Completed);
                report.finish(LinkOutcome::Saved { lessons: saved })
            }
            Err(e) => {
                log::error!("Failed to save lessons from {}: {}", report.url, e);
                self.reporter.report(StatusKind::SavingError);
                report.fail(LinkOutcome::SaveFailed(e.to_string()))
            }
        }
    }
}
