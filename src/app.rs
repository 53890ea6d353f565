// src/app.rs

//! Composition root.
//!
//! Builds every long-lived service once from configuration.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::runtime::Handle;

use crate::error::Result;
use crate::models::Config;
use crate::pipeline::UpdateOrchestrator;
use crate::services::{DocumentParser, LinkDiscovery, StatusReporter};
use crate::storage::{LessonStore, LocalStore};
use crate::utils::http::{HttpTransport, Transport};

/// Wired application services.
pub struct App {
    pub config: Arc<Config>,
    pub store: Arc<dyn LessonStore>,
    pub transport: Arc<dyn Transport>,
    pub parser: DocumentParser,
    pub discovery: LinkDiscovery,
    pub reporter: StatusReporter,
    pub orchestrator: UpdateOrchestrator,
}

impl App {
    /// Validate `config` and build the services on the current runtime.
    pub async fn build(config: Config) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);

        let store: Arc<dyn LessonStore> =
            Arc::new(LocalStore::open(PathBuf::from(&config.storage.dir)).await?);
        let transport: Arc<dyn Transport> =
            Arc::new(HttpTransport::new(&config.site, &config.crawler)?);
        let parser = DocumentParser::pdf();
        let discovery = LinkDiscovery::from_site(&config.site)?;
        let reporter = StatusReporter::new(config.messages.clone());

        let orchestrator = UpdateOrchestrator::new(
            Arc::clone(&config),
            Arc::clone(&transport),
            Arc::clone(&store),
            parser.clone(),
            reporter.clone(),
            Handle::current(),
        )?;

        Ok(Self {
            config,
            store,
            transport,
            parser,
            discovery,
            reporter,
            orchestrator,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_build_with_default_config() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.storage.dir = tmp.path().display().to_string();

        let app = App::build(config).await.unwrap();
        assert_eq!(app.store.count().await.unwrap(), 0);
        assert!(!app.orchestrator.is_running());
        assert_eq!(app.orchestrator.cycles_started(), 0);
    }

    #[tokio::test]
    async fn test_build_rejects_invalid_config() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.storage.dir = tmp.path().display().to_string();
        config.update.workers = 0;

        assert!(App::build(config).await.is_err());
    }
}
