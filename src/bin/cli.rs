//! mvc-watch CLI
//!
//! Polls the NJ MVC appointment portal and posts new slots to Slack.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::Local;
use clap::{Parser, Subcommand};
use mvc_watch::{
    error::Result,
    models::{Config, PollTarget, catalog},
    pipeline::{Monitor, MonitorSettings},
    services::{
        ConsoleNotifier, HttpSource, Notifier, SlackNotifier, SlotPoller, TypePlan, resolver,
    },
    utils::http,
};

/// mvc-watch - NJ MVC appointment slot watcher
#[derive(Parser, Debug)]
#[command(
    name = "mvc-watch",
    version,
    about = "Watches the NJ MVC appointment portal for new slots"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll forever and notify about new slots
    Run {
        /// Log messages instead of posting them to Slack
        #[arg(long)]
        dry_run: bool,
    },

    /// Run a single poll cycle and list every slot found
    Once {
        /// Post new slots to Slack as the loop would
        #[arg(long)]
        notify: bool,
    },

    /// Validate configuration and show the resolved targets
    Validate,

    /// List supported appointment types and their locations
    Catalog,
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
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_fatal_config() => {
            log::error!("Invalid configuration: {}", e);
            ExitCode::from(2)
        }
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Catalog => print_catalog(),

        Command::Validate => {
            let (config, plans) = prepare(&cli.config)?;
            let mut total = 0;
            for plan in &plans {
                log::info!(
                    "{} (code {}): {} location(s)",
                    plan.appointment_type.name,
                    plan.appointment_type.code,
                    plan.locations.len()
                );
                for target in plan.targets() {
                    log::debug!("    {}", target.url(&config.polling.portal_base));
                    total += 1;
                }
            }
            if config.slack.bot_token.is_none() || config.slack.channel_id.is_none() {
                log::warn!("Slack credentials missing; only `run --dry-run` will work");
            }
            log::info!("✓ Config OK ({} target(s))", total);
        }

        Command::Run { dry_run } => {
            let (config, plans) = prepare(&cli.config)?;
            let settings = MonitorSettings::from(&config.polling);
            let mut monitor =
                build_monitor(&config, resolver::flatten(&plans), settings, !dry_run)?;
            tokio::select! {
                _ = monitor.run() => {}
                signal = tokio::signal::ctrl_c() => {
                    signal?;
                    log::info!("Interrupted, shutting down");
                }
            }
        }

        Command::Once { notify } => {
            let (config, plans) = prepare(&cli.config)?;
            let mut settings = MonitorSettings::from(&config.polling);
            if !notify {
                // Listing only: retry an outage target without waiting.
                settings = settings.without_outage_pause();
            }
            let mut monitor = build_monitor(&config, resolver::flatten(&plans), settings, notify)?;
            if notify {
                let report = monitor.run_cycle(Local::now().date_naive()).await;
                log::info!(
                    "Polled {} target(s): {} slot(s) listed, {} new, {} unreachable, {} outage(s)",
                    report.targets,
                    report.found,
                    report.new_slots.len(),
                    report.unreachable,
                    report.outages
                );
            } else {
                let harvest = monitor.harvest().await;
                for slot in &harvest.slots {
                    log::info!(
                        "{} | {} | {} {} | {}",
                        slot.appointment_type,
                        slot.location,
                        slot.date,
                        slot.display_time(),
                        slot.url
                    );
                }
                log::info!(
                    "Polled {} target(s): {} slot(s), {} unreachable, {} outage(s)",
                    monitor.targets().len(),
                    harvest.slots.len(),
                    harvest.unreachable,
                    harvest.outages
                );
            }
        }
    }

    Ok(())
}

/// Load, override and validate the configuration, then resolve its filters.
fn prepare(path: &Path) -> Result<(Config, Vec<TypePlan>)> {
    let mut config = Config::load_or_default(path)?;
    config.apply_env();
    config.validate()?;
    log::info!("Loaded configuration from {}", path.display());

    let plans = resolver::resolve(&config.monitor)?;
    Ok((config, plans))
}

fn build_monitor(
    config: &Config,
    targets: Vec<PollTarget>,
    settings: MonitorSettings,
    notify: bool,
) -> Result<Monitor> {
    let source = HttpSource::new(&config.polling)?;
    let poller = SlotPoller::new(Box::new(source), config.polling.portal_base.clone());

    let notifier: Box<dyn Notifier> = if notify {
        let client = http::create_async_client(&config.polling)?;
        Box::new(SlackNotifier::from_config(&config.slack, client)?)
    } else {
        Box::new(ConsoleNotifier)
    };

    Ok(Monitor::new(
        poller,
        notifier,
        targets,
        settings,
        Local::now().date_naive(),
    ))
}

fn print_catalog() {
    for kind in catalog::supported_types() {
        log::info!("{} (code {})", kind.name, kind.code);
        for location in catalog::locations_for(kind.name).unwrap_or(&[]) {
            log::info!("    {} ({})", location.name, location.code);
        }
    }
}
