//! CLI runner - resolves inputs and executes a harvest

use crate::cli::commands::Cli;
use crate::config::{is_valid_seconds, HarvestSettings};
use crate::engine::{HarvestEngine, HarvestReport, RunOutcome};
use crate::error::{Error, Result};
use crate::events::FileEventLog;
use crate::http::SearchClient;
use crate::session::{Console, ConsoleSupplier, CredentialSupplier, StdConsole};
use crate::sink::open_sink;
use crate::state::CheckpointStore;
use crate::types::{OptionStringExt, SessionCredential};
use std::io::Write;
use tokio::io::AsyncBufRead;
use tracing::info;

/// What the operator supplied for this run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunInputs {
    /// Search term
    pub query: String,
    /// Initial session credential
    pub credential: SessionCredential,
}

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Settings from the config file (or defaults) with flag overrides applied
    pub fn settings(&self) -> Result<HarvestSettings> {
        let mut settings = match &self.cli.config {
            Some(path) => HarvestSettings::load(path)?,
            None => HarvestSettings::default(),
        };

        if let Some(dir) = &self.cli.output_dir {
            settings.output_dir.clone_from(dir);
        }
        if let Some(format) = self.cli.format {
            settings.output_format = format;
        }
        if let Some(page) = self.cli.start_page {
            settings.start_page = page;
        }
        if let Some(delay) = self.cli.delay {
            settings.page_delay_secs = delay;
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Run the harvest end to end
    pub async fn run(&self) -> Result<()> {
        let mut settings = self.settings()?;
        let mut console = StdConsole::stdio();

        let inputs = gather_inputs(&self.cli, &mut settings, &mut console).await?;
        info!(
            "Results will be saved to: {}",
            settings.output_path().display()
        );

        let supplier = ConsoleSupplier::new(console);
        let report = harvest(&settings, inputs, Box::new(supplier)).await?;

        println!("{}", summary(&report, &settings));
        Ok(())
    }
}

/// Resolve query, credential and pacing from flags, checkpoint and prompts.
///
/// Query and credential are asked for when missing. In an interactive run
/// the start page and page delay are asked for too, unless given as flags
/// or taken from a checkpoint.
pub async fn gather_inputs<R, W>(
    cli: &Cli,
    settings: &mut HarvestSettings,
    console: &mut Console<R, W>,
) -> Result<RunInputs>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    let query = match cli.query.clone().none_if_empty() {
        Some(query) => query.trim().to_string(),
        None => {
            ask_required(
                console,
                "Enter search query: ",
                "Search query cannot be empty.",
            )
            .await?
        }
    };

    let credential = match cli.session.as_deref().and_then(SessionCredential::new) {
        Some(credential) => credential,
        None => {
            let token = ask_required(
                console,
                "Enter session ID (x-search-session): ",
                "Session ID cannot be empty.",
            )
            .await?;
            SessionCredential::new(token)
                .ok_or_else(|| Error::prompt("Session ID cannot be empty"))?
        }
    };

    let mut resumed = false;
    if cli.resume {
        let store = CheckpointStore::new(settings.checkpoint_path());
        match store.resume_page(&query).await? {
            Some(page) => {
                info!("Resuming '{query}' from checkpoint at page {page}");
                settings.start_page = page;
                resumed = true;
            }
            None => info!("No resumable checkpoint for '{query}'"),
        }
    }

    if cli.is_interactive() {
        if cli.start_page.is_none() && !resumed {
            settings.start_page = ask_start_page(console, settings.start_page).await?;
        }
        if cli.delay.is_none() {
            settings.page_delay_secs = ask_delay(console, settings.page_delay_secs).await?;
        }
    }

    Ok(RunInputs { query, credential })
}

async fn ask_required<R, W>(
    console: &mut Console<R, W>,
    prompt: &str,
    empty_message: &str,
) -> Result<String>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    loop {
        match console.ask(prompt).await? {
            None => return Err(Error::prompt("Input closed before a value was entered")),
            Some(answer) if answer.is_empty() => console.say(empty_message)?,
            Some(answer) => return Ok(answer),
        }
    }
}

async fn ask_start_page<R, W>(console: &mut Console<R, W>, default: u32) -> Result<u32>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    let prompt = format!("Enter start page (default {default}): ");
    loop {
        let Some(answer) = console.ask(&prompt).await?.none_if_empty() else {
            return Ok(default);
        };
        match answer.parse::<u32>() {
            Ok(page) if page >= 1 => return Ok(page),
            _ => console.say("Start page must be a positive integer.")?,
        }
    }
}

async fn ask_delay<R, W>(console: &mut Console<R, W>, default: f64) -> Result<f64>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    let prompt = format!("Enter delay between pages in seconds (default {default}): ");
    loop {
        let Some(answer) = console.ask(&prompt).await?.none_if_empty() else {
            return Ok(default);
        };
        match answer.parse::<f64>() {
            Ok(delay) if is_valid_seconds(delay) => return Ok(delay),
            _ => console.say("Delay must be a non-negative number.")?,
        }
    }
}

/// Open the event log, sink, client and checkpoint described by `settings`
/// and harvest `inputs.query`.
pub async fn harvest(
    settings: &HarvestSettings,
    inputs: RunInputs,
    supplier: Box<dyn CredentialSupplier>,
) -> Result<HarvestReport> {
    let events = FileEventLog::open(settings.log_path())?;
    let sink = open_sink(settings.output_format, settings.output_path()).await?;
    let client = SearchClient::new(settings.http_config())?;

    let mut engine = HarvestEngine::new(Box::new(client), sink, Box::new(events), supplier)
        .with_config(settings.harvest_config())
        .with_checkpoint(CheckpointStore::new(settings.checkpoint_path()));

    engine.run(&inputs.query, inputs.credential).await
}

/// Human-readable run summary
pub fn summary(report: &HarvestReport, settings: &HarvestSettings) -> String {
    let headline = match report.outcome {
        RunOutcome::Done => format!(
            "Scraping complete: fetched {} page(s)",
            report.pages_fetched
        ),
        RunOutcome::Stopped(reason) => match report.resume_page {
            Some(page) => format!(
                "Scraping stopped ({reason}). Resume with --start-page {page} or --resume"
            ),
            None => format!("Scraping stopped ({reason})"),
        },
    };

    [
        headline,
        format!("Total results collected: {}", report.collected),
        format!("Results saved to: {}", settings.output_path().display()),
        format!("Log file: {}", settings.log_path().display()),
    ]
    .join("\n")
}
