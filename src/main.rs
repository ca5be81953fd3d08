// Main entrypoint for the tagit binary.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use tagit::config::{Config, Mode, Overrides};
use tagit::driver::{Driver, PassOutcome};
use tagit::probe::ProcessExecutor;
use tagit::registry::ConsulRegistry;
use tagit::shutdown::{GracefulShutdown, DEFAULT_GRACEFUL_TIMEOUT};
use tagit::systemd::Fields;

/// Tagit - keeps Consul service tags in sync with the output of a probe script
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file path (default: $HOME/.tagit.yaml when present)
    #[arg(long, global = true, value_name = "FILE", env = "TAGIT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the probe every interval and reconcile the service tags
    Run(ServiceArgs),
    /// Remove every tag carrying the prefix from the service, once
    Cleanup(ServiceArgs),
    /// Print a systemd unit that runs `tagit run` with the given flags
    Systemd(SystemdArgs),
}

#[derive(Args, Debug)]
struct ServiceArgs {
    /// Consul agent address
    #[arg(short = 'c', long, env = "TAGIT_CONSUL_ADDR")]
    consul_addr: Option<String>,
    /// Consul service id to manage
    #[arg(short = 's', long, env = "TAGIT_SERVICE_ID")]
    service_id: Option<String>,
    /// Command whose whitespace-separated output becomes tags
    #[arg(short = 'x', long, env = "TAGIT_SCRIPT")]
    script: Option<String>,
    /// Prefix of the tags this process owns
    #[arg(short = 'p', long, env = "TAGIT_TAG_PREFIX")]
    tag_prefix: Option<String>,
    /// Time between reconciliation passes (e.g. 30s, 5m)
    #[arg(short = 'i', long, env = "TAGIT_INTERVAL", value_parser = humantime::parse_duration)]
    interval: Option<Duration>,
    /// Consul ACL token
    #[arg(short = 't', long, env = "TAGIT_TOKEN", hide_env_values = true)]
    token: Option<String>,
    /// Upper bound on one probe run
    #[arg(long, env = "TAGIT_SCRIPT_TIMEOUT", value_parser = humantime::parse_duration)]
    script_timeout: Option<Duration>,
    /// Log level filter (trace, debug, info, warn, error)
    #[arg(long, env = "TAGIT_LOG_LEVEL")]
    log_level: Option<String>,
}

impl From<ServiceArgs> for Overrides {
    fn from(args: ServiceArgs) -> Self {
        Overrides {
            consul_addr: args.consul_addr,
            token: args.token,
            service_id: args.service_id,
            script: args.script,
            tag_prefix: args.tag_prefix,
            interval: args.interval,
            script_timeout: args.script_timeout,
            log_level: args.log_level,
        }
    }
}

#[derive(Args, Debug)]
struct SystemdArgs {
    #[arg(long)]
    service_id: Option<String>,
    #[arg(long)]
    script: Option<String>,
    #[arg(long)]
    tag_prefix: Option<String>,
    /// Interval passed through verbatim (e.g. 5s)
    #[arg(long)]
    interval: Option<String>,
    #[arg(long)]
    token: Option<String>,
    #[arg(long)]
    consul_addr: Option<String>,
    #[arg(long)]
    user: Option<String>,
    #[arg(long)]
    group: Option<String>,
}

impl From<SystemdArgs> for Fields {
    fn from(args: SystemdArgs) -> Self {
        Fields {
            service_id: args.service_id.unwrap_or_default(),
            script: args.script.unwrap_or_default(),
            tag_prefix: args.tag_prefix.unwrap_or_default(),
            interval: args.interval.unwrap_or_default(),
            token: args.token,
            consul_addr: args.consul_addr,
            user: args.user.unwrap_or_default(),
            group: args.group.unwrap_or_default(),
        }
    }
}

/// Loads the file layer, applies flag and env overrides, then validates for `mode`.
fn load_cfg(
    path: Option<PathBuf>,
    overrides: Overrides,
    mode: Mode,
) -> Result<(Config, Option<PathBuf>)> {
    let (mut cfg, used) = Config::discover(path.as_deref())?;
    cfg.apply(overrides);
    cfg.validate(mode).context("invalid configuration")?;
    Ok((cfg, used))
}

/// Configures structured logging on stderr; stdout stays free for command output.
fn configure_logger(cfg: &Config) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.logs().level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if cfg.is_prod() {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .init();
    }
}

fn log_config_source(used: &Option<PathBuf>) {
    match used {
        Some(path) => info!(
            component = "config",
            event = "load_success",
            path = ?path,
            "config loaded"
        ),
        None => info!(
            component = "config",
            event = "load_defaults",
            "no config file found, using defaults, environment and flags"
        ),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Systemd(args) => {
            let unit = Fields::from(args)
                .render()
                .context("error generating systemd service file")?;
            println!("{}", unit);
            Ok(())
        }
        Command::Run(args) => {
            let (cfg, used) = load_cfg(cli.config, args.into(), Mode::Run)?;
            configure_logger(&cfg);
            log_config_source(&used);
            runtime()?.block_on(async_run(cfg))
        }
        Command::Cleanup(args) => {
            let (cfg, used) = load_cfg(cli.config, args.into(), Mode::Cleanup)?;
            configure_logger(&cfg);
            log_config_source(&used);
            runtime()?.block_on(async_cleanup(cfg))
        }
    }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")
}

fn build_driver(cfg: &Config) -> Result<Driver> {
    let registry = Arc::new(ConsulRegistry::new(cfg.registry())?);
    let executor = Arc::new(ProcessExecutor::new(cfg.service().script_timeout));
    Ok(Driver::new(cfg.driver(), registry, executor))
}

async fn async_run(cfg: Config) -> Result<()> {
    let shutdown_token = CancellationToken::new();
    let graceful_shutdown =
        GracefulShutdown::new(shutdown_token.clone()).with_timeout(DEFAULT_GRACEFUL_TIMEOUT);

    let driver = build_driver(&cfg)?;
    let driver_token = graceful_shutdown.token();
    graceful_shutdown.spawn(async move {
        driver.run(driver_token).await;
    });

    if let Err(e) = graceful_shutdown.await_shutdown().await {
        error!(
            component = "main",
            scope = "service",
            event = "graceful_shutdown_failed",
            error = %e,
            "failed to gracefully shut down service"
        );
        return Err(e);
    }
    Ok(())
}

async fn async_cleanup(cfg: Config) -> Result<()> {
    let driver = build_driver(&cfg)?;
    let service = &cfg.service().id;

    match driver.cleanup().await {
        Ok(PassOutcome::Updated(tags)) => {
            info!(
                component = "main",
                event = "cleanup_done",
                service = %service,
                tags = ?tags,
                "removed managed tags"
            );
            Ok(())
        }
        Ok(PassOutcome::Unchanged) => {
            info!(
                component = "main",
                event = "cleanup_noop",
                service = %service,
                "no managed tags to remove"
            );
            Ok(())
        }
        Err(e) => {
            error!(
                component = "main",
                event = "cleanup_failed",
                service = %service,
                kind = e.kind(),
                error = %e,
                "failed to clean up tags"
            );
            Err(e).context("cleanup failed")
        }
    }
}
