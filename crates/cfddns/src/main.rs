//! # cfddns
//!
//! One-shot Cloudflare dynamic DNS updater. Each invocation detects the
//! current public address, reconciles every configured record against it,
//! and exits; scheduling belongs to cron or a systemd timer.
//!
//! Exit status is 0 when every record that needed an update got one (a run
//! with nothing to do also counts), 1 for configuration errors, detection
//! failure, or any record left un-updated.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use cfddns_core::{Config, IpCache, Reconciler, RunReport};
use cfddns_ip_http::IpDetector;
use cfddns_provider_cloudflare::CloudflareProvider;

#[derive(Parser, Debug)]
#[command(name = "cfddns", version, about = "Keep Cloudflare DNS records pointed at this host's public IP")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = cfddns_core::config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Path to the last-applied IP cache file
    #[arg(long, default_value = cfddns_core::cache::DEFAULT_CACHE_PATH)]
    cache_file: PathBuf,

    /// Log intended updates without sending them
    #[arg(long)]
    dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Debug, Clone, Copy)]
enum RunExitCode {
    /// Every record that needed an update got one
    Success = 0,
    /// Configuration error, detection failure, or an un-updated record
    Failure = 1,
}

impl From<RunExitCode> for ExitCode {
    fn from(code: RunExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        other => {
            eprintln!("Invalid log level '{other}' (use trace, debug, info, warn or error)");
            return RunExitCode::Failure.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return RunExitCode::Failure.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return RunExitCode::Failure.into();
        }
    };

    rt.block_on(async {
        match run(cli).await {
            Ok(code) => code,
            Err(e) => {
                error!("{:#}", e);
                RunExitCode::Failure
            }
        }
    })
    .into()
}

async fn run(cli: Cli) -> Result<RunExitCode> {
    let config = Config::load(&cli.config)?;
    info!(
        "Loaded configuration for {} domain(s) from {}",
        config.domains.len(),
        cli.config.display()
    );

    if cli.dry_run {
        info!("[DRY-RUN] No DNS records will be modified");
    }

    let detector = IpDetector::new();
    let current_ip = detector
        .detect_v4()
        .await
        .context("cannot proceed without a public IPv4 address")?;
    info!("Current public IPv4 address: {}", current_ip);

    let current_ipv6 = if config.wants_ipv6() {
        let ip = detector.detect_v6().await;
        if let Some(ip) = ip {
            info!("Current public IPv6 address: {}", ip);
        }
        ip
    } else {
        None
    };

    let cache = IpCache::new(&cli.cache_file);
    let cached_ip = cache.load().await;
    match cached_ip {
        Some(ip) if ip == current_ip => {
            info!("Cached IP matches current IP, verifying records anyway");
        }
        Some(ip) => info!("IP changed since last run: {} -> {}", ip, current_ip),
        None => info!("No cached IP, reconciling all records"),
    }

    let provider = CloudflareProvider::new(config.api_token.clone(), cli.dry_run)?;

    let reconciler = Reconciler::new(Box::new(provider), config.domains);
    let report = reconciler.run(current_ip, current_ipv6).await;

    if report.cache_should_update(current_ip, cached_ip, cli.dry_run) {
        if let Err(e) = cache.store(current_ip).await {
            warn!("{}", e);
        }
    }

    summarize(&report);
    Ok(if report.is_success() {
        RunExitCode::Success
    } else {
        RunExitCode::Failure
    })
}

fn summarize(report: &RunReport) {
    if report.missing_records > 0 {
        warn!(
            "{} configured record(s) do not exist at the provider and were skipped",
            report.missing_records
        );
    }

    if report.fetch_failures == 0 && report.updates_needed == 0 {
        info!("All DNS records across all domains are already up to date");
    } else if report.is_success() {
        info!(
            "Successfully updated all {} DNS record(s) that needed it",
            report.updates_succeeded
        );
    } else {
        error!(
            "Updated {}/{} DNS record(s); {} lookup failure(s)",
            report.updates_succeeded, report.updates_needed, report.fetch_failures
        );
    }
}
