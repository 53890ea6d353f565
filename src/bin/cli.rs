//! PATC schedule CLI
//!
//! Local entry point: runs update cycles and queries the lesson store.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use patc_schedule::{
    app::App,
    error::{AppError, Result},
    models::{Config, Corpus, DateFormat, Lesson, LoggingConfig, StatusKind},
    services::{DocumentParser, parser::PlainTextExtractor},
    utils::file_name_from_link,
};

const LESSON_TEMPLATE: &str = "{number}. {subject} | {teacher} | {room} {times}";

/// patc-schedule - PATC timetable ingestion
#[derive(Parser, Debug)]
#[command(
    name = "patc-schedule",
    version,
    about = "Downloads and parses PATC schedule documents"
)]
struct Cli {
    /// Path to storage directory containing config.toml and lessons.json
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download and parse the schedules of every configured building
    Update,

    /// List schedule document links found on the site
    Links {
        /// Only this building (first, second, third)
        #[arg(long)]
        corpus: Option<Corpus>,
    },

    /// Parse a local document and print its lessons
    Parse {
        /// PDF document, or pre-extracted text with a .txt extension
        file: PathBuf,

        /// Building whose layout the document uses
        #[arg(long)]
        corpus: Corpus,

        /// Also write the lessons to the store
        #[arg(long)]
        save: bool,
    },

    /// Show the lessons of a group on a day
    Group {
        name: String,

        /// Day as dd.MM.yyyy
        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,
    },

    /// Show the lessons of a teacher on a day
    Teacher {
        name: String,

        /// Day as dd.MM.yyyy
        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,
    },

    /// List known groups
    Groups,

    /// List known teachers
    Teachers,

    /// List subjects of a group
    Subjects { group: String },

    /// Validate configuration file
    Validate,

    /// Write a default config.toml into the storage directory
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn parse_date(s: &str) -> std::result::Result<NaiveDate, String> {
    DateFormat::Dotted
        .parse(s)
        .ok_or_else(|| format!("expected dd.MM.yyyy, got '{s}'"))
}

/// Initialize logging with the configured filter.
fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn print_lessons(lessons: &[Lesson]) {
    if lessons.is_empty() {
        println!("No lessons found.");
        return;
    }
    for lesson in lessons {
        println!("{}", lesson.format(LESSON_TEMPLATE).trim_end());
    }
}

fn print_names(names: &[String]) {
    for name in names {
        println!("{name}");
    }
    log::info!("{} entr(ies)", names.len());
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.storage_dir.join("config.toml");
    let loaded = Config::load(&config_path);

    let fallback = LoggingConfig::default();
    let logging = loaded.as_ref().map_or(&fallback, |config| &config.logging);
    init_logging(logging.filter(cli.verbose));

    if let Command::Validate = cli.command {
        log::info!("Validating {}...", config_path.display());
        let config = loaded?;
        if let Err(e) = config.validate() {
            log::error!("Config validation failed: {}", e);
            return Err(e);
        }
        log::info!("✓ Config OK");
        return Ok(());
    }

    if let Command::Init { force } = cli.command {
        if config_path.exists() && !force {
            return Err(AppError::config(format!(
                "{} already exists. Use --force to overwrite.",
                config_path.display()
            )));
        }
        Config::default().save(&config_path)?;
        log::info!("Default configuration written to {}", config_path.display());
        return Ok(());
    }

    let mut config = loaded.unwrap_or_else(|e| {
        log::warn!(
            "Config load failed from {}: {}. Using defaults.",
            config_path.display(),
            e
        );
        Config::default()
    });
    config.storage.dir = cli.storage_dir.display().to_string();
    let app = App::build(config).await?;

    match cli.command {
        Command::Update => {
            let watcher = app.reporter.on_change(|status| match status.kind {
                kind if kind.is_error() => log::warn!("{} ({}%)", status.phase, status.progress),
                StatusKind::Idle => {}
                _ => log::info!("{} ({}%)", status.phase, status.progress),
            });

            if !app.orchestrator.update() {
                log::warn!("An update is already running");
                return Ok(());
            }
            let reports = app.orchestrator.wait().await;

            for report in &reports {
                match &report.error {
                    Some(error) => log::error!("{}: {}", report.corpus, error),
                    None => log::info!(
                        "{}: {} document(s), {} lesson(s) saved, {} failed",
                        report.corpus,
                        report.links.len(),
                        report.lessons_saved(),
                        report.failed_links()
                    ),
                }
            }
            log::info!("Store holds {} lesson(s)", app.store.count().await?);
            drop(app);
            if let Err(e) = watcher.await {
                log::warn!("Status watcher stopped abnormally: {}", e);
            }
        }

        Command::Links { corpus } => {
            let html = app.transport.fetch_listing_page().await?;
            let corpora = corpus.map_or_else(|| Corpus::ALL.to_vec(), |c| vec![c]);
            for corpus in corpora {
                let links = app.discovery.discover_html(&html, corpus);
                println!("[{}] {}", corpus, corpus.profile().building);
                for link in &links {
                    println!("  {}  {}", file_name_from_link(link), link);
                }
            }
        }

        Command::Parse { file, corpus, save } => {
            let bytes = tokio::fs::read(&file).await?;
            let is_text = file
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"));
            let parser = if is_text {
                DocumentParser::new(Arc::new(PlainTextExtractor))
            } else {
                app.parser.clone()
            };

            let lessons = tokio::task::spawn_blocking(move || parser.parse(&bytes, corpus))
                .await
                .map_err(AppError::from)??;
            print_lessons(&lessons);
            log::info!("Parsed {} lesson(s) from {}", lessons.len(), file.display());

            if save {
                let saved = app.store.upsert_many(&lessons).await?;
                log::info!("Saved {} lesson(s)", saved);
            }
        }

        Command::Group { name, date } => {
            print_lessons(&app.store.query_by_group_and_date(&name, date).await?);
        }

        Command::Teacher { name, date } => {
            print_lessons(&app.store.query_by_teacher_and_date(&name, date).await?);
        }

        Command::Groups => print_names(&app.store.distinct_groups().await?),

        Command::Teachers => print_names(&app.store.distinct_teachers().await?),

        Command::Subjects { group } => print_names(&app.store.distinct_subjects(&group).await?),

        Command::Validate | Command::Init { .. } => {
            unreachable!("handled before the app is built")
        }
    }

    Ok(())
}
