use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use grade_monitor::alert::Notifier;
use grade_monitor::auth::Credentials;
use grade_monitor::config::{Config, ConfigOverrides};
use grade_monitor::grading::metrics::{compute_metrics, CourseWeights};
use grade_monitor::output::csv::courses_to_csv;
use grade_monitor::output::json::{render_json, render_report_json};
use grade_monitor::output::table::{render_course_table, render_metrics_table};
use grade_monitor::prompt::{parse_interval, prompt_credentials, prompt_interval};
use grade_monitor::records::CourseRecord;
use grade_monitor::snapshot::SnapshotStore;
use grade_monitor::watch::history::PollHistory;
use grade_monitor::watch::poller::Poller;
use grade_monitor::watch::source::{PortalSource, ReqwestConnector};
use grade_monitor::watch::RecordSource;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Parser)]
#[command(
    name = "grade-monitor",
    about = "Polls the academic portal and reports newly posted grades"
)]
struct Cli {
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[arg(long = "output-dir", global = true)]
    output_dir: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Poll until interrupted, alerting on new grades.
    Watch {
        #[arg(short, long)]
        username: Option<String>,
        /// Seconds between cycles (10-3600); prompted when omitted.
        #[arg(short, long, value_parser = parse_interval_arg)]
        interval: Option<u64>,
        /// Stop after this many cycles instead of polling forever.
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        iterations: Option<u64>,
        /// Treat the newest saved snapshot as already seen.
        #[arg(long)]
        resume: bool,
    },
    /// Fetch once and print, without saving.
    Once {
        #[arg(short, long)]
        username: Option<String>,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// Render a saved snapshot (the newest one by default).
    Report {
        #[arg(short, long)]
        file: Option<PathBuf>,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

fn parse_interval_arg(raw: &str) -> Result<u64, String> {
    parse_interval(raw).map_err(|err| err.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(Some(&config_path))?;
    config.apply_overrides(ConfigOverrides {
        output_dir: cli.output_dir.clone(),
    });

    match cli.command {
        Commands::Config { init, show } => handle_config_command(init, show, &config, &config_path),
        Commands::Watch {
            username,
            interval,
            iterations,
            resume,
        } => run_watch(&config, username, interval, iterations, resume).await,
        Commands::Once { username, output } => {
            let credentials = read_credentials(username.as_deref())?;
            let source = PortalSource::new(ReqwestConnector::new(&config), &config, credentials);
            let records = source.fetch_records().await?;
            print_records(&records, &config, output)
        }
        Commands::Report { file, output } => {
            let records = load_report(&config, file.as_deref())?;
            print_records(&records, &config, output)
        }
    }
}

fn handle_config_command(init: bool, show: bool, config: &Config, config_path: &Path) -> Result<()> {
    if init {
        Config::write_template(config_path)?;
        println!("Wrote config template to {}", config_path.display());
    }
    if show || !init {
        println!("{}", render_json(config)?);
    }
    Ok(())
}

async fn run_watch(
    config: &Config,
    username: Option<String>,
    interval: Option<u64>,
    iterations: Option<u64>,
    resume: bool,
) -> Result<()> {
    let source = verified_source(config, username).await?;
    let interval = match interval {
        Some(secs) => secs,
        None => prompt_interval(&mut std::io::stdin().lock(), &mut std::io::stdout())?,
    };

    let store = SnapshotStore::open(&config.resolved_output_dir())?;
    let history = if resume {
        match store.load_latest()? {
            Some((path, records)) => {
                info!(path = %path.display(), courses = records.len(), "resuming from snapshot");
                PollHistory::seeded(&records)
            }
            None => {
                warn!("no snapshot to resume from, starting fresh");
                PollHistory::new()
            }
        }
    } else {
        PollHistory::new()
    };

    let notifier = Notifier::from_config(&config.alerts)?;
    let mut poller = Poller::new(
        source,
        notifier,
        store,
        CourseWeights::from_config(&config.grading),
        Duration::from_secs(interval),
    )
    .with_history(history);
    info!(interval_secs = interval, "watching for new grades");
    poller.run(iterations).await;
    Ok(())
}

/// Logs in once up front, asking for credentials again until the portal accepts them.
async fn verified_source(
    config: &Config,
    mut username: Option<String>,
) -> Result<PortalSource<ReqwestConnector>> {
    loop {
        let credentials = read_credentials(username.as_deref())?;
        let source = PortalSource::new(ReqwestConnector::new(config), config, credentials);
        match source.login().await {
            Ok(_) => {
                println!("登录成功：{}", source.credentials().username);
                return Ok(source);
            }
            Err(err) => {
                warn!("login check failed: {err}");
                println!("登录失败，请重新输入账号密码（{err}）");
                username = None;
            }
        }
    }
}

fn read_credentials(username: Option<&str>) -> Result<Credentials> {
    prompt_credentials(&mut std::io::stdin().lock(), &mut std::io::stdout(), username)
}

fn load_report(config: &Config, file: Option<&Path>) -> Result<Vec<CourseRecord>> {
    if let Some(path) = file {
        return SnapshotStore::load(path);
    }
    let store = SnapshotStore::open(&config.resolved_output_dir())?;
    let (path, records) = store.load_latest()?.ok_or_else(|| {
        anyhow!(
            "no snapshot found in {}; pass --file",
            store.dir().display()
        )
    })?;
    info!(path = %path.display(), "rendering snapshot");
    Ok(records)
}

fn print_records(records: &[CourseRecord], config: &Config, format: OutputFormat) -> Result<()> {
    let metrics = compute_metrics(records, CourseWeights::from_config(&config.grading));
    match format {
        OutputFormat::Table => {
            println!("{}", render_course_table(records));
            println!("{}", render_metrics_table(&metrics));
        }
        OutputFormat::Json => println!("{}", render_report_json(records, &metrics)?),
        OutputFormat::Csv => {
            warn!("CSV output omits metrics");
            print!("{}", courses_to_csv(records)?);
        }
    }
    Ok(())
}
