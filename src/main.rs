//! CLI entry point for the campus line check.
//!
//! Provides subcommands for reading a location's line stats, voting on a
//! line, polling every location on an interval, checking posting
//! eligibility, and using the exchange board.

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use line_check::backend::Backends;
use line_check::clock::{Clock, SystemClock};
use line_check::config::Config;
use line_check::eligibility::EligibilityPolicy;
use line_check::exchange::{ExchangeBoard, NewPost, POST_LIST_LIMIT};
use line_check::linecheck::{LineCheckAggregator, LineSnapshot, ReportIngestion};
use line_check::output::{append_record, print_json, print_summary};
use line_check::report::Location;
use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;
use tracing::Instrument;
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "line_check")]
#[command(about = "Crowdsourced dining line checks for campus", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum Vote {
    /// The line is long
    Long,
    /// The line is short
    Short,
}

#[derive(Subcommand)]
enum Commands {
    /// Show how busy a location's line is over the last 30 minutes
    Stats {
        /// Location name or slug (e.g. "Chick-fil-A", "williams")
        #[arg(value_name = "LOCATION")]
        location: String,

        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// CSV file to append the reading to
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Report whether a location's line is long or short
    Report {
        #[arg(value_name = "LOCATION")]
        location: String,

        #[arg(value_enum)]
        vote: Vote,
    },
    /// Poll every known location, logging a reading each round
    Watch {
        /// Seconds between rounds
        #[arg(short = 'r', long, default_value_t = 60)]
        sample_rate: u64,

        /// Number of rounds (0 = infinite)
        #[arg(short = 'n', long, default_value_t = 1)]
        num_samples: usize,

        /// Maximum number of concurrent stats queries
        #[arg(short, long, default_value_t = 2)]
        concurrency: usize,

        /// CSV file to append readings to
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Check whether an email address may post
    CheckEmail {
        #[arg(value_name = "EMAIL")]
        email: String,
    },
    /// Add a post to the exchange board
    ExchangePost {
        #[arg(short, long)]
        title: String,

        #[arg(short, long, default_value = "")]
        body: String,

        /// sale, study group, or other
        #[arg(short, long, default_value = "sale")]
        kind: String,

        #[arg(short = 'C', long, default_value = "")]
        contact: String,
    },
    /// List the newest exchange posts
    ExchangeList {
        #[arg(short, long, default_value_t = POST_LIST_LIMIT)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/line_check.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("line_check.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    match cli.command {
        Commands::Stats {
            location,
            format,
            output,
        } => {
            let backends = Backends::open(&config, clock.clone())?;
            let aggregator = LineCheckAggregator::new(backends.reports, clock.clone());
            let location = location_name(&location);

            let stats = aggregator.get_stats(&location).await;
            let snapshot = LineSnapshot::new(&location, stats, clock.now());
            match format {
                Format::Text => print_summary(&snapshot),
                Format::Json => print_json(&snapshot)?,
            }
            if let Some(path) = output {
                append_record(&path, &snapshot)?;
            }
        }
        Commands::Report { location, vote } => {
            let backends = Backends::open(&config, clock.clone())?;
            let ingestion = ReportIngestion::new(backends.reports.clone());
            let aggregator = LineCheckAggregator::new(backends.reports, clock.clone());
            let location = location_name(&location);

            let is_long = matches!(vote, Vote::Long);
            if !ingestion.submit_report(&location, is_long).await {
                bail!("Could not submit. Check your connection and try again.");
            }

            // Re-read so the voter sees the reading including their own vote.
            let stats = aggregator.get_stats(&location).await;
            print_summary(&LineSnapshot::new(&location, stats, clock.now()));
        }
        Commands::Watch {
            sample_rate,
            num_samples,
            concurrency,
            output,
        } => {
            let backends = Backends::open(&config, clock.clone())?;
            let aggregator = LineCheckAggregator::new(backends.reports, clock.clone());
            watch(aggregator, clock, sample_rate, num_samples, concurrency, output).await?;
        }
        Commands::CheckEmail { email } => {
            let policy = EligibilityPolicy::new(config.student_email_suffix.clone());
            if policy.allows(&email) {
                info!(email = %email.trim(), "Eligible to post");
            } else {
                warn!(email = %email.trim(), suffix = policy.suffix(), "Not eligible: use your student email");
            }
        }
        Commands::ExchangePost {
            title,
            body,
            kind,
            contact,
        } => {
            let backends = Backends::open(&config, clock)?;
            let board = ExchangeBoard::new(backends.posts);
            let post = NewPost {
                title,
                body,
                kind: kind.parse()?,
                contact,
            };
            if !board.add_post(&post).await {
                bail!("Could not post. Check your connection and try again.");
            }
        }
        Commands::ExchangeList { limit } => {
            let backends = Backends::open(&config, clock)?;
            let board = ExchangeBoard::new(backends.posts);

            let posts = board.recent_posts(limit).await;
            info!(count = posts.len(), "Exchange posts");
            for post in &posts {
                info!(
                    id = %post.id,
                    kind = %post.kind,
                    contact = %post.contact,
                    posted = %post.timestamp,
                    "{}: {}",
                    post.title,
                    post.body
                );
            }
        }
    }

    Ok(())
}

/// Resolves a known location's slug or name to its stored name. Anything else
/// passes through untouched, since stores accept any location key.
fn location_name(raw: &str) -> String {
    match raw.parse::<Location>() {
        Ok(location) => location.name().to_string(),
        Err(_) => {
            warn!(location = raw, "Not a known location, querying it as given");
            raw.trim().to_string()
        }
    }
}

/// Reads every known location each round, concurrently, appending readings
/// to `output` when given.
#[tracing::instrument(skip(aggregator, clock, output))]
async fn watch(
    aggregator: LineCheckAggregator,
    clock: Arc<dyn Clock>,
    sample_rate: u64,
    num_samples: usize,
    concurrency: usize,
    output: Option<String>,
) -> Result<()> {
    if concurrency == 0 {
        bail!("concurrency must be at least 1");
    }
    if num_samples == 0 {
        info!(sample_rate, "Sampling infinitely. Press Ctrl+C to stop.");
    } else {
        info!(num_samples, sample_rate, "Starting sample collection");
    }

    let semaphore = Arc::new(tokio::sync::Semaphore::new(concurrency));
    let mut sample_count = 0;

    loop {
        // Check if we've reached the sample limit (0 = infinite)
        if num_samples > 0 && sample_count >= num_samples {
            break;
        }
        sample_count += 1;

        info!(sample = sample_count, started = %Utc::now(), "Starting sample round");

        let mut tasks = vec![];
        for location in Location::ALL {
            let sem = semaphore.clone();
            let aggregator = aggregator.clone();
            let clock = clock.clone();

            let span = tracing::info_span!("watch_location", location = %location);

            let task = tokio::spawn(
                async move {
                    let _permit = sem.acquire().await.ok()?;

                    let stats = aggregator.get_stats(location.name()).await;
                    let snapshot = LineSnapshot::new(location.name(), stats, clock.now());
                    print_summary(&snapshot);
                    Some(snapshot)
                }
                .instrument(span),
            );
            tasks.push(task);
        }

        // Readings are written one at a time, in location order, once the round is in.
        let mut snapshots = Vec::with_capacity(tasks.len());
        for task in tasks {
            if let Some(snapshot) = task.await.context("watch task panicked")? {
                snapshots.push(snapshot);
            }
        }
        if let Some(path) = &output {
            for snapshot in &snapshots {
                if let Err(e) = append_record(path, snapshot) {
                    error!(error = %e, location = %snapshot.location, "Failed to write reading");
                }
            }
        }

        // If not the last sample, wait before next iteration
        if num_samples == 0 || sample_count < num_samples {
            info!(sample_rate, "Waiting before next sample");
            tokio::time::sleep(tokio::time::Duration::from_secs(sample_rate)).await;
        }
    }

    info!("Finished watching");
    Ok(())
}
