//! Spot Advisor CLI
//!
//! Query instance rankings, price forecasts and availability zone
//! recommendations from a running spot-advisor service.

mod client;
mod commands;
mod config;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commands::{cache, families, predict, recommend, zones};

/// Spot Advisor CLI
#[derive(Parser)]
#[command(name = "spotctl")]
#[command(author, version, about = "CLI for the Spot Advisor recommendation service", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via SPOTCTL_API_URL env var)
    #[arg(long, env = "SPOTCTL_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Output format (defaults to the configured format, then table)
    #[arg(long, short, global = true)]
    pub format: Option<output::OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rank spot instance types for a workload
    Recommend(recommend::RecommendArgs),

    /// Forecast the spot price of an instance type
    Predict {
        /// Instance type (e.g., m5.large)
        instance_type: String,

        /// Region (defaults to the configured region)
        #[arg(long, short)]
        region: Option<String>,
    },

    /// Rank availability zones for an instance type
    Zones {
        /// Instance type (e.g., m5.large)
        instance_type: String,

        /// Region (defaults to the configured region)
        #[arg(long, short)]
        region: Option<String>,

        /// Weight profile: balanced, high-capacity or low-cost
        #[arg(long, short)]
        profile: Option<String>,

        /// Rank by price only
        #[arg(long, conflicts_with = "profile")]
        plain: bool,
    },

    /// Inspect the advisor cache
    #[command(subcommand)]
    Cache(CacheCommands),

    /// List instance families in the advisor catalog
    Families,

    /// Manage local CLI settings
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Show cache hit/miss counters
    Stats,

    /// Drop expired cache entries
    Refresh,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the current settings
    Show,

    /// Update settings
    Set {
        /// Advisor API URL
        #[arg(long)]
        url: Option<String>,

        /// Default region for predict, zones and recommend
        #[arg(long)]
        region: Option<String>,

        /// Default output format
        #[arg(long, value_enum)]
        output: Option<output::OutputFormat>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = config::Config::load()?;

    let format = cli
        .format
        .or_else(|| {
            settings
                .default_format
                .as_deref()
                .and_then(output::OutputFormat::from_config)
        })
        .unwrap_or_default();

    let api_url = settings.resolve_api_url(cli.api_url.as_deref());
    let connect = || client::ApiClient::new(&api_url);
    let default_region = settings.default_region.clone();

    // Execute command
    match cli.command {
        Commands::Recommend(args) => {
            let requirements = args.into_requirements(default_region.as_deref())?;
            recommend::recommend(&connect()?, requirements, format).await?;
        }
        Commands::Predict {
            instance_type,
            region,
        } => {
            let region = region.or(default_region);
            predict::predict(&connect()?, &instance_type, region, format).await?;
        }
        Commands::Zones {
            instance_type,
            region,
            profile,
            plain,
        } => {
            let query = zones::zone_query(region.or(default_region), profile, plain);
            zones::zones(&connect()?, &instance_type, query, format).await?;
        }
        Commands::Cache(cache_cmd) => match cache_cmd {
            CacheCommands::Stats => cache::show_stats(&connect()?, format).await?,
            CacheCommands::Refresh => cache::refresh(&connect()?, format).await?,
        },
        Commands::Families => families::list_families(&connect()?, format).await?,
        // Local settings only, no API call
        Commands::Config(config_cmd) => run_config(config_cmd, settings, format)?,
    }

    Ok(())
}

fn run_config(
    command: ConfigCommands,
    mut settings: config::Config,
    format: output::OutputFormat,
) -> Result<()> {
    match command {
        ConfigCommands::Show => match format {
            output::OutputFormat::Json => output::print_json(&settings)?,
            output::OutputFormat::Table => {
                println!("api_url:        {}", settings.resolve_api_url(None));
                println!(
                    "default_region: {}",
                    settings.default_region.as_deref().unwrap_or("(server default)")
                );
                println!(
                    "default_format: {}",
                    settings.default_format.as_deref().unwrap_or("table")
                );
            }
        },
        ConfigCommands::Set {
            url,
            region,
            output: default_format,
        } => {
            if url.is_none() && region.is_none() && default_format.is_none() {
                output::print_info("Nothing to update");
                return Ok(());
            }
            if let Some(url) = url {
                url::Url::parse(&url).context("Invalid API URL")?;
                settings.api_url = Some(url);
            }
            if let Some(region) = region {
                settings.default_region = Some(region);
            }
            if let Some(default_format) = default_format {
                let name = match default_format {
                    output::OutputFormat::Table => "table",
                    output::OutputFormat::Json => "json",
                };
                settings.default_format = Some(name.to_string());
            }
            let path = settings.save()?;
            output::print_success(&format!("Saved settings to {}", path.display()));
        }
    }

    Ok(())
}
