//! Activity Monitor CLI
//!
//! Samples workstation input activity, writes a daily activity log and
//! optionally ships hourly aggregates to an rqlite node.

use activity_monitor::{
    activity_log::ActivityLog,
    config::Config,
    core::{HourlySink, Monitor, MonitorSettings},
    source::platform_source,
    SharedActivityLog, VERSION,
};
use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "activity-monitor")]
#[command(version = VERSION)]
#[command(about = "Workstation input-activity monitor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start monitoring until interrupted
    Start(StartArgs),

    /// Show today's log file and the effective settings
    Status,

    /// Show configuration
    Config,
}

#[derive(Args, Debug, Default)]
struct StartArgs {
    /// Directory for the daily log files
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Log file prefix (<base>-YYYY-MM-DD.log)
    #[arg(long)]
    base_name: Option<String>,

    /// rqlite base URL for hourly aggregates, e.g. http://192.168.1.6:4001
    #[arg(long)]
    remote_url: Option<String>,

    /// Basic auth username for the rqlite node
    #[arg(long)]
    remote_user: Option<String>,

    /// Basic auth password for the rqlite node
    #[arg(long)]
    remote_password: Option<String>,

    /// Disable the remote sink even if one is configured
    #[arg(long)]
    local_only: bool,
}

impl StartArgs {
    fn apply(self, config: &mut Config) {
        if let Some(dir) = self.log_dir {
            config.log_dir = dir;
        }
        if let Some(base) = self.base_name {
            config.log_base_name = base;
        }
        if let Some(url) = self.remote_url {
            config.remote.base_url = Some(url);
        }
        if let Some(user) = self.remote_user {
            config.remote.username = Some(user);
        }
        if let Some(password) = self.remote_password {
            config.remote.password = Some(password);
        }
        if self.local_only {
            config.remote.base_url = None;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Start(args) => cmd_start(args),
        Commands::Status => cmd_status(),
        Commands::Config => cmd_config(),
    }
}

fn cmd_start(args: StartArgs) -> Result<()> {
    let mut config = Config::load().context("Failed to load configuration")?;
    args.apply(&mut config);
    config.validate()?;

    let log = ActivityLog::open_shared(&config.log_dir, &config.log_base_name)
        .context("Failed to open activity log")?;
    let settings = MonitorSettings::from_config(&config);
    let sink = build_sink(&config, &settings, &log)?;

    let monitor = Monitor::new(settings, platform_source(), log.clone(), sink)
        .context("Failed to start monitor")?;

    let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(1);
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.try_send(());
    })
    .context("Error setting Ctrl+C handler")?;

    println!("Activity Monitor v{VERSION}");
    println!(
        "Logging to {}",
        log.path_for(Local::now().date_naive()).display()
    );
    println!("Press Ctrl+C to stop");

    monitor.run(&shutdown_rx);
    Ok(())
}

#[cfg(feature = "remote")]
fn build_sink(
    config: &Config,
    settings: &MonitorSettings,
    log: &SharedActivityLog,
) -> Result<HourlySink> {
    use activity_monitor::remote::{BlockingRemoteStoreClient, UploadWorker};

    if !config.remote.is_enabled() {
        return Ok(HourlySink::LocalOnly);
    }

    let client = BlockingRemoteStoreClient::new(&config.remote)
        .context("Failed to create remote store client")?;
    let endpoint = client.base_url().to_string();
    let uploader = UploadWorker::spawn(Box::new(client), log.clone())
        .context("Failed to start upload worker")?;

    tracing::info!(endpoint = %endpoint, "remote sink enabled");
    Ok(HourlySink::remote(chrono::Utc::now(), settings, uploader, endpoint))
}

#[cfg(not(feature = "remote"))]
fn build_sink(
    config: &Config,
    _settings: &MonitorSettings,
    _log: &SharedActivityLog,
) -> Result<HourlySink> {
    if config.remote.is_enabled() {
        tracing::warn!("remote sink configured but the remote feature is not compiled in");
    }
    Ok(HourlySink::LocalOnly)
}

fn cmd_status() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    println!("Activity Monitor Status");
    println!("=======================");
    println!();
    println!("Configuration:");
    println!("  Sample interval: {}s", config.sample_interval.as_secs());
    println!("  Window size: {}s", config.window_size.as_secs());
    println!(
        "  Active idle threshold: {}s",
        config.active_idle_threshold.as_secs()
    );
    println!(
        "  Remote sink: {}",
        config
            .remote
            .base_url
            .as_deref()
            .filter(|_| config.remote.is_enabled())
            .unwrap_or("disabled")
    );
    println!();

    let path = activity_monitor::activity_log::writer::day_file_path(
        &config.log_dir,
        &config.log_base_name,
        Local::now().date_naive(),
    );
    println!("Today's log: {}", path.display());

    let meta = match std::fs::metadata(&path) {
        Ok(meta) => meta,
        Err(_) => {
            println!("  (not written yet)");
            return Ok(());
        }
    };
    println!("  Size: {} bytes", meta.len());

    if let Some(last) = last_line(&path)? {
        println!("  Last line: {last}");
    }
    Ok(())
}

fn last_line(path: &std::path::Path) -> Result<Option<String>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Cannot read {}", path.display()))?;
    let mut last = None;
    for line in BufReader::new(file).lines() {
        let line = line?;
        if !line.trim().is_empty() {
            last = Some(line);
        }
    }
    Ok(last)
}

fn cmd_config() -> Result<()> {
    let mut config = Config::load().context("Failed to load configuration")?;
    if config.remote.password.is_some() {
        config.remote.password = Some("<redacted>".to_string());
    }

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();

    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
