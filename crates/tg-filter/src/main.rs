use anyhow::Context;
use clap::{Parser, Subcommand};
use tg_common::config::TrustConfig;
use tg_common::error::AppError;
use tg_common::types::{HostDescriptor, WorkloadPolicy};
use tg_filter::AdmissionFilter;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "trustgate")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one admission check and exit 0 on allow, 1 on deny.
    Check {
        #[arg(long)]
        hostname: String,
        #[arg(long)]
        ip: String,
        /// Image property as `key=value`, e.g. `trust=true` or `tags={"location":["us"]}`.
        #[arg(long = "property", value_parser = parse_property)]
        properties: Vec<(String, String)>,
        /// Hostnames from the compute-node inventory.
        #[arg(long = "known-host")]
        known_hosts: Vec<String>,
    },
}

fn parse_property(raw: &str) -> Result<(String, String), AppError> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| AppError::InvalidInput(format!("expected key=value, got {raw}")))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(AppError::InvalidInput(format!("empty property key in {raw}")));
    }
    Ok((key.to_string(), value.to_string()))
}

fn report_setup_error(err: AppError) -> AppError {
    tracing::error!(code = err.code(), %err, "trustgate setup failed");
    err
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Check {
            hostname,
            ip,
            properties,
            known_hosts,
        } => {
            let config = TrustConfig::from_env()
                .map_err(report_setup_error)
                .context("loading trust configuration")?;
            let filter = AdmissionFilter::new(&config)
                .map_err(report_setup_error)
                .context("building admission filter")?
                .with_known_hosts(known_hosts);

            let host = HostDescriptor {
                hostname,
                host_ip: ip,
            };
            let policy: WorkloadPolicy = properties.into_iter().collect();
            let decision = filter.decide(&host, &policy);

            tracing::info!(hostname = %host.hostname, %decision, "admission check complete");
            println!("{decision}");

            if !decision.is_allowed() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
