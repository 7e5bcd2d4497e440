//! Screen Usage Agent CLI
//!
//! Tracks foreground-application usage and flags unusual sessions.

use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand};
use screen_usage_agent::{
    core::{categorize, display_name, system_clock, SessionSummary, Severity},
    history::{daily_usage, productivity_score, JsonFileStore},
    notify::{ConsoleNotifier, NotifierGate, OutboxMailer},
    provider::{ActiveWindowProvider, NoopProvider, ReplayProvider},
    Config, ProfileSet, SessionReport, UsageTracker, VERSION,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::warn;

#[derive(Parser)]
#[command(name = "screen-usage")]
#[command(version = VERSION)]
#[command(about = "Foreground-application usage tracker with anomaly detection", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Track one session
    Track {
        /// Session length in seconds (defaults to the configured length)
        #[arg(long, short)]
        duration: Option<u64>,

        /// Profile key whose app limits apply
        #[arg(long, short)]
        profile: Option<String>,

        /// JSON-lines file of window samples to replay
        #[arg(long)]
        replay: Option<PathBuf>,

        /// Replay the file from the start when it runs out
        #[arg(long = "loop")]
        looping: bool,
    },

    /// List stored sessions
    History {
        /// Show at most this many recent sessions
        #[arg(long, short, default_value = "10")]
        limit: usize,
    },

    /// Score the most recent session against earlier ones
    Analyze,

    /// Refit the anomaly model on stored history
    Retrain,

    /// Show productivity score and per-day usage
    Trends {
        /// Number of days to include
        #[arg(long, default_value = "7")]
        days: u32,
    },

    /// Show how an application is categorized
    Categorize {
        /// Application identifier, e.g. chrome.exe
        app: String,
    },

    /// List profiles and their app limits
    Profiles,

    /// Show configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        init: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Track {
            duration,
            profile,
            replay,
            looping,
        } => cmd_track(duration, profile.as_deref(), replay, looping),
        Commands::History { limit } => cmd_history(limit),
        Commands::Analyze => cmd_analyze(),
        Commands::Retrain => cmd_retrain(),
        Commands::Trends { days } => cmd_trends(days),
        Commands::Categorize { app } => {
            cmd_categorize(&app);
            Ok(())
        }
        Commands::Profiles => cmd_profiles(),
        Commands::Config { init } => cmd_config(init),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn load_config() -> Config {
    match Config::load() {
        Ok(config) => config,
        Err(e) => {
            warn!("Using default configuration: {}", e);
            Config::default()
        }
    }
}

fn open_tracker(config: &Config) -> UsageTracker<JsonFileStore> {
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }

    let clock = system_clock();
    let gate = NotifierGate::new(clock.clone(), config.notification_cooldown())
        .with_notification_sink(Box::new(ConsoleNotifier))
        .with_email_sink(Box::new(OutboxMailer::new(config.outbox_path())));
    let store = JsonFileStore::new(config.history_path());
    UsageTracker::open(config, store, gate, clock)
}

fn cmd_track(
    duration: Option<u64>,
    profile_key: Option<&str>,
    replay: Option<PathBuf>,
    looping: bool,
) -> anyhow::Result<()> {
    let config = load_config();
    let profiles = ProfileSet::load(&config.profiles_path()).context("loading profiles")?;
    let (key, profile) = match profile_key {
        Some(key) => match profiles.get(key) {
            Some(profile) => (key, profile),
            None => bail!("unknown profile '{key}'"),
        },
        None => profiles
            .default_profile()
            .context("no profiles configured")?,
    };

    let mut provider: Box<dyn ActiveWindowProvider> = match &replay {
        Some(path) => Box::new(
            ReplayProvider::from_file(path)
                .with_context(|| format!("reading replay file {}", path.display()))?
                .looping(looping),
        ),
        None => {
            eprintln!("Warning: No window source given, nothing will be recorded (use --replay).");
            Box::new(NoopProvider)
        }
    };

    let duration = duration.unwrap_or(config.default_session_secs);
    println!("Screen Usage Agent v{VERSION}");
    println!();
    println!("Tracking for {duration}s with profile '{key}' ({})", profile.name);
    println!("Press Ctrl+C to stop early.");
    println!();

    let stop = Arc::new(AtomicBool::new(false));
    ctrlc_handler(stop.clone())?;

    let mut tracker = open_tracker(&config);
    let report = tracker.track_session(&mut provider, profile, duration, &stop, |update| {
        print!(
            "\r[{:>5.1}%] {:<40} {:>5}s",
            update.progress() * 100.0,
            display_name(update.application_id),
            update.elapsed_seconds
        );
        let _ = std::io::stdout().flush();
    });
    println!();
    println!();

    print_report(&report);
    Ok(())
}

fn print_report(report: &SessionReport) {
    let Some(summary) = &report.summary else {
        println!("No application usage recorded.");
        return;
    };

    println!("Session Summary");
    println!("===============");
    print_summary(summary);
    println!();

    println!("Applications:");
    for record in &report.session.records {
        let category = record.category();
        println!(
            "  {:<40} {:>7.1} min  {} {}",
            record.display_name,
            record.minutes(),
            category.emoji(),
            category
        );
    }
    println!();

    if !report.insights.is_empty() {
        println!("Insights:");
        for insight in &report.insights {
            let tag = match insight.severity {
                Severity::Warning => "warning",
                Severity::Info => "info",
                Severity::Health => "health",
            };
            println!("  [{tag}] {}", insight.message);
        }
        println!();
    }

    println!("Recommendations:");
    for tip in &report.recommendations {
        println!("  {tip}");
    }
    println!();

    println!(
        "Anomaly check: {} (score {:.3})",
        if report.anomaly.is_anomaly {
            "unusual session"
        } else {
            "normal"
        },
        report.anomaly.score
    );
    println!("  {}", report.anomaly.explanation);

    if !report.persisted {
        eprintln!("Warning: Session could not be saved to history.");
    }
    if report.retrained {
        println!("Anomaly model retrained.");
    }
}

fn print_summary(summary: &SessionSummary) {
    println!("  Total time: {:.1} min", summary.total_minutes);
    println!("  Applications: {}", summary.app_count);
    println!("  Most used: {}", display_name(&summary.most_used));
    println!("  Average per app: {:.1} min", summary.average_minutes);
    for (category, minutes) in &summary.categories {
        println!("  {} {:<14} {:.1} min", category.emoji(), category, minutes);
    }
}

fn cmd_history(limit: usize) -> anyhow::Result<()> {
    let config = load_config();
    let tracker = open_tracker(&config);
    let sessions = tracker.history().sessions();

    if sessions.is_empty() {
        println!("No sessions recorded yet.");
        println!("Run 'screen-usage track' to record one.");
        return Ok(());
    }

    println!(
        "Showing {} of {} session(s)",
        limit.min(sessions.len()),
        sessions.len()
    );
    println!();
    for session in sessions.iter().rev().take(limit) {
        let most_used = SessionSummary::from_session(session)
            .map(|s| display_name(&s.most_used))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}  {:>7.1} min  {:>2} app(s)  {}",
            session.timestamp.format("%Y-%m-%d %H:%M:%S"),
            session.total_minutes(),
            session.records.len(),
            most_used
        );
    }
    Ok(())
}

fn cmd_analyze() -> anyhow::Result<()> {
    let config = load_config();
    let tracker = open_tracker(&config);

    match tracker.analyze_latest() {
        Some(report) => {
            println!(
                "Latest session: {} (score {:.3})",
                if report.is_anomaly {
                    "unusual"
                } else {
                    "normal"
                },
                report.score
            );
            println!("  {}", report.explanation);
        }
        None => println!("No sessions recorded yet."),
    }
    Ok(())
}

fn cmd_retrain() -> anyhow::Result<()> {
    let config = load_config();
    let mut tracker = open_tracker(&config);

    if tracker.retrain() {
        println!(
            "Model retrained on {} session(s).",
            tracker.history().len()
        );
        Ok(())
    } else {
        bail!(
            "not enough history to train (have {}, need at least 2)",
            tracker.history().len()
        )
    }
}

fn cmd_trends(days: u32) -> anyhow::Result<()> {
    let config = load_config();
    let tracker = open_tracker(&config);
    let sessions = tracker.history().sessions();

    println!("Productivity score: {:.1}%", productivity_score(sessions));
    println!();

    let trends = daily_usage(sessions, days, Utc::now(), config.tz());
    if trends.is_empty() {
        println!("No usage in the last {days} day(s).");
        return Ok(());
    }

    println!("Daily usage (last {days} day(s), {}):", config.timezone);
    for (day, minutes) in &trends.daily_minutes {
        println!("  {day}  {minutes:>7.1} min");
    }
    println!();
    println!("By category:");
    for (category, per_day) in &trends.category_minutes {
        let minutes: f64 = per_day.values().sum();
        println!("  {} {:<14} {:>7.1} min", category.emoji(), category, minutes);
    }
    println!();
    println!("Total: {:.1} min", trends.total_minutes);
    println!("Average per day: {:.1} min", trends.average_daily_minutes);
    Ok(())
}

fn cmd_categorize(app: &str) {
    let category = categorize(app);
    println!("{}", display_name(app));
    println!("  Category: {} {}", category.emoji(), category);
    println!("  Color: {}", category.color());
}

fn cmd_profiles() -> anyhow::Result<()> {
    let config = load_config();
    let profiles = ProfileSet::load(&config.profiles_path()).context("loading profiles")?;

    for (key, profile) in &profiles.profiles {
        println!(
            "{key}: {}{}",
            profile.name,
            if profile.is_default { " (default)" } else { "" }
        );
        if profile.app_limits.is_empty() {
            println!("  No app limits");
        }
        let mut limits: Vec<_> = profile.app_limits.iter().collect();
        limits.sort();
        for (app, minutes) in limits {
            println!("  {:<40} {minutes} min", display_name(app));
        }
    }
    Ok(())
}

fn cmd_config(init: bool) -> anyhow::Result<()> {
    let config = load_config();

    if init {
        config.save().context("saving configuration")?;
        println!("Wrote {:?}", Config::config_path());
        println!();
    }

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!("History: {:?}", config.history_path());
    println!("Profiles: {:?}", config.profiles_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).context("serializing configuration")?
    );
    Ok(())
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(stop: Arc<AtomicBool>) -> anyhow::Result<()> {
    ctrlc::set_handler(move || {
        stop.store(true, Ordering::SeqCst);
    })
    .context("setting Ctrl+C handler")
}
