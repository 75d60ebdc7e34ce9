//! juritrack CLI
//!
//! Thin local entry point around the scraping library. Results are printed
//! as JSON, the same shapes a service layer would return.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use juritrack::{
    error::{AppError, Result},
    models::{Config, CourtDirectory},
    pipeline::ScrapeOrchestrator,
    scrapers::ScraperRegistry,
    storage::{MemoryStore, ProcessStore},
    utils,
};

/// juritrack - Judicial process scraping toolkit
#[derive(Parser, Debug)]
#[command(name = "juritrack", version, about = "Judicial process scraping toolkit")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape a single process
    Scrape {
        /// CNJ case number (any display formatting accepted)
        case_number: String,

        /// Court acronym
        #[arg(long, default_value = "TJSP")]
        court: String,

        /// Ignore the freshness window
        #[arg(long)]
        force: bool,
    },

    /// Scrape several processes concurrently
    Batch {
        /// CNJ case numbers
        case_numbers: Vec<String>,

        /// Court acronym
        #[arg(long, default_value = "TJSP")]
        court: String,

        /// Maximum in-flight scrapes (default from config)
        #[arg(long)]
        max_concurrent: Option<usize>,
    },

    /// List courts with an available scraper
    Courts,

    /// Check a CNJ case number offline
    Validate {
        /// CNJ case number
        case_number: String,
    },
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);
    config.validate()?;

    let registry = Arc::new(ScraperRegistry::with_default_scrapers(
        config.scraper.clone(),
    ));
    let directory = CourtDirectory::new(config.courts.clone());
    let store: Arc<dyn ProcessStore> = Arc::new(MemoryStore::new());
    let orchestrator = ScrapeOrchestrator::new(
        Arc::clone(&registry),
        store,
        directory,
        config.scraper.clone(),
    );

    match cli.command {
        Command::Scrape {
            case_number,
            court,
            force,
        } => {
            let outcome = orchestrator.scrape_one(&case_number, &court, force).await;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }

        Command::Batch {
            case_numbers,
            court,
            max_concurrent,
        } => {
            if case_numbers.is_empty() {
                return Err(AppError::validation("No case numbers given"));
            }
            let batch = orchestrator
                .scrape_many(&case_numbers, &court, max_concurrent)
                .await;
            println!("{}", serde_json::to_string_pretty(&batch)?);
        }

        Command::Courts => {
            for acronym in registry.available_courts() {
                println!("{acronym}");
            }
        }

        Command::Validate { case_number } => {
            if !utils::validate_cnj_number(&case_number) {
                return Err(AppError::validation(format!(
                    "Invalid CNJ case number: {case_number}"
                )));
            }
            if let Some(parts) = utils::extract_cnj_parts(&case_number) {
                println!("valid: {}", parts.canonical());
                println!("  sequential: {}", parts.sequential);
                println!("  check digits: {}", parts.check_digit);
                println!("  year: {}", parts.year);
                println!("  segment: {}", parts.segment);
                println!("  court: {}", parts.court_code);
                println!("  origin: {}", parts.origin_code);
            }
        }
    }

    Ok(())
}
