use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use coinfolio::config::{default_config_path, ResolvedConfig};
use coinfolio::context::AppContext;
use coinfolio::duration::format_duration;
use coinfolio::format::{format_amount, format_money, format_money_change, format_percent, format_share};
use coinfolio::models::{CheckStatus, Sourced};
use coinfolio::server::{self, AppState};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "coinfolio")]
#[command(about = "Crypto portfolio aggregation for a personal finance dashboard")]
struct Cli {
    /// Path to config file (defaults to ./coinfolio.toml, then the data directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API server
    Serve {
        /// Address to listen on (overrides server.bind)
        #[arg(long)]
        bind: Option<String>,
    },
    /// Show portfolio totals and allocation
    Summary {
        #[arg(long)]
        json: bool,
    },
    /// List held assets
    Assets {
        #[arg(long)]
        json: bool,
    },
    /// Show one asset with price history
    Asset {
        /// Exchange currency code, e.g. btc
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Check connectivity to the exchange and market APIs
    Check {
        #[arg(long)]
        json: bool,
    },
    /// Show the resolved configuration
    Config,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true).json())
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .init();
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn fallback_note<T>(sourced: &Sourced<T>) {
    if sourced.is_fallback() {
        println!("(market data unavailable: showing placeholder data)\n");
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
    }
    info!("shutdown requested");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let config = ResolvedConfig::load_or_default(&config_path)
        .with_context(|| format!("Failed to load config: {}", config_path.display()))?;

    if let Command::Config = cli.command {
        print_config(&config, &config_path);
        return Ok(());
    }

    let ctx = AppContext::from_config(&config).await?;
    let service = ctx.service();
    let currency = service.reporting_currency().to_string();

    match cli.command {
        Command::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            ctx.start_maintenance();
            let app = server::router(AppState::new(service), &config.server);
            let result = server::serve(app, &bind, shutdown_signal()).await;
            ctx.shutdown();
            result?;
        }
        Command::Summary { json } => {
            let sourced = service.summary().await;
            if json {
                print_json(&server::SummaryResponse::from(sourced))?;
            } else {
                fallback_note(&sourced);
                let summary = sourced.value();
                println!("Total value: {}", format_money(summary.total_value, &currency));
                println!(
                    "24h change:  {} ({})",
                    format_money_change(summary.total_change_24h, &currency),
                    format_percent(Some(summary.total_change_percent_24h))
                );
                println!();
                for asset in &summary.assets {
                    println!(
                        "{:<6} {:>18} {:>7} {:>8}",
                        asset.symbol,
                        format_money(asset.value, &currency),
                        format_share(asset.ratio),
                        format_percent(asset.change_percent_24h)
                    );
                }
            }
        }
        Command::Assets { json } => {
            let sourced = service.assets().await;
            if json {
                let is_fallback = sourced.is_fallback();
                print_json(&server::AssetsResponse {
                    assets: sourced.into_inner().into_iter().map(Into::into).collect(),
                    is_fallback,
                })?;
            } else {
                fallback_note(&sourced);
                if sourced.value().is_empty() {
                    println!("No holdings.");
                }
                for asset in sourced.value() {
                    println!(
                        "{:<6} {:>14} @ {:>14} = {:>16} {:>8}",
                        asset.symbol,
                        format_amount(asset.amount),
                        format_money(asset.current_price, &currency),
                        format_money(asset.value, &currency),
                        format_percent(asset.change_percent_24h)
                    );
                }
            }
        }
        Command::Asset { id, json } => {
            let sourced = service.asset_detail(&id).await?;
            if json {
                print_json(&server::DetailResponse::from(sourced))?;
            } else {
                fallback_note(&sourced);
                let detail = sourced.value();
                let asset = &detail.asset;
                println!("{} ({})", asset.name, asset.symbol);
                println!("Amount:     {}", format_amount(asset.amount));
                println!("Price:      {}", format_money(asset.current_price, &currency));
                println!("Value:      {}", format_money(asset.value, &currency));
                println!("24h change: {}", format_percent(asset.change_percent_24h));
                if let Some(rank) = detail.rank {
                    println!("Rank:       #{rank}");
                }
                if let Some(cap) = detail.market_cap {
                    println!("Market cap: {}", format_money(cap, &currency));
                }
                if !detail.price_history.is_empty() {
                    println!();
                    for point in &detail.price_history {
                        println!(
                            "{}  {}",
                            point.date.format("%Y-%m-%d %H:%M"),
                            format_money(point.price, &currency)
                        );
                    }
                }
            }
        }
        Command::Check { json } => {
            let report = service.check_connections().await;
            if json {
                print_json(&report)?;
            } else {
                for result in &report.results {
                    let mark = match result.status {
                        CheckStatus::Success => "ok",
                        CheckStatus::Error => "FAIL",
                    };
                    println!("{:<10} {:<4} {}", result.service, mark, result.message);
                }
                println!("overall: {:?}", report.overall);
            }
        }
        Command::Config => {}
    }

    Ok(())
}

fn print_config(config: &ResolvedConfig, config_path: &std::path::Path) {
    match &config.config_path {
        Some(path) => println!("Config file:        {}", path.display()),
        None => println!("Config file:        {} (not found, using defaults)", config_path.display()),
    }
    println!("Reporting currency: {}", config.reporting_currency);
    println!("History window:     {} days", config.history_days);
    println!("Server bind:        {}", config.server.bind);
    if config.server.cors_origins.is_empty() {
        println!("CORS origins:       any");
    } else {
        println!("CORS origins:       {}", config.server.cors_origins.join(", "));
    }
    let limit = &config.server.rate_limit;
    if limit.enabled {
        println!(
            "API rate limit:     {} requests per {}",
            limit.requests,
            format_duration(limit.window)
        );
    } else {
        println!("API rate limit:     disabled");
    }
    println!("HTTP timeout:       {}", format_duration(config.http.timeout));
    println!(
        "Retry:              {} retries, base delay {}",
        config.retry.max_retries,
        format_duration(config.retry.base_delay)
    );
    println!(
        "Cache:              market {}, default {}, purge every {}",
        format_duration(config.cache.market_ttl),
        format_duration(config.cache.default_ttl),
        format_duration(config.cache.purge_interval)
    );
    println!("Balance API:        {}", config.balance.base_url);
    println!("Credentials:        {}", config.balance.credentials.describe());
    println!("Market API:         {}", config.market.base_url);
    if let Some(var) = &config.market.api_key_env {
        println!("Market API key env: {var}");
    }
    println!("Assets:");
    for (code, id) in config.assets.iter() {
        println!("  {code:<6} -> {id}");
    }
}
