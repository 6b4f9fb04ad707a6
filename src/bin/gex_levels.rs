//! GEX levels CLI
//!
//! Fetches (or loads) an option chain, computes gamma exposure levels,
//! projects them onto the target future and writes the merged JSON document.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gex_levels::prelude::*;

#[derive(Parser)]
#[command(name = "gex-levels")]
#[command(about = "Compute dealer gamma exposure levels and project them onto a correlated future")]
struct Args {
    /// JSON engine configuration (missing fields use defaults)
    #[arg(long, env = "GEX_CONFIG")]
    config: Option<PathBuf>,

    /// Options underlying, e.g. QQQ
    #[arg(long)]
    symbol: Option<String>,

    /// Ticker the levels are projected onto, e.g. MNQ
    #[arg(long)]
    target: Option<String>,

    /// Quote symbol for the target's live price, e.g. MNQ=F
    #[arg(long)]
    target_quote: Option<String>,

    /// Read the chain from a saved snapshot instead of Yahoo Finance
    #[arg(long)]
    input: Option<PathBuf>,

    /// Target price to use instead of fetching one
    #[arg(long)]
    target_spot: Option<f64>,

    /// Always project with this fixed multiplier
    #[arg(long)]
    fixed_multiplier: Option<f64>,

    /// Number of High Gamma levels
    #[arg(long)]
    top_n: Option<usize>,

    /// Keep only strikes within this fraction of spot, e.g. 0.2
    #[arg(long)]
    strike_band: Option<f64>,

    /// What the Put/Call Walls rank strikes by
    #[arg(long, value_enum)]
    wall_basis: Option<WallBasisArg>,

    /// Evaluation date (YYYY-MM-DD), defaults to today or the snapshot's date
    #[arg(long)]
    as_of: Option<NaiveDate>,

    /// Output file for the merged levels
    #[arg(long, default_value = "levels.json")]
    output: PathBuf,

    /// Also save the collected chain here for later replay
    #[arg(long)]
    dump_snapshot: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum WallBasisArg {
    Gex,
    OpenInterest,
}

impl From<WallBasisArg> for WallBasis {
    fn from(arg: WallBasisArg) -> Self {
        match arg {
            WallBasisArg::Gex => WallBasis::Gex,
            WallBasisArg::OpenInterest => WallBasis::OpenInterest,
        }
    }
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false))
        .init();
}

fn build_config(args: &Args) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    if let Some(symbol) = &args.symbol {
        config.source_ticker = symbol.to_uppercase();
    }
    if let Some(target) = &args.target {
        config.target_ticker = target.to_uppercase();
    }
    if let Some(quote) = &args.target_quote {
        config.target_quote_symbol = Some(quote.clone());
    }
    if let Some(m) = args.fixed_multiplier {
        config.projection = ProjectionConfig::fixed(m);
    }
    if let Some(n) = args.top_n {
        config.levels.top_n = n;
    }
    if let Some(band) = args.strike_band {
        config.filter.strike_band_percent = Some(band);
    }
    if let Some(basis) = args.wall_basis {
        config.levels.wall_basis = basis.into();
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();
    let config = build_config(&args)?;
    let engine = GexEngine::new(config)?;
    let cfg = engine.config();

    let (snapshot, target_spot) = match &args.input {
        Some(path) => {
            let mut snapshot = load_snapshot(path)
                .with_context(|| format!("loading snapshot {}", path.display()))?;
            if let Some(as_of) = args.as_of {
                snapshot.as_of = as_of;
            }
            (snapshot, args.target_spot)
        }
        None => {
            let yahoo = YahooClient::new()?;
            let as_of = args.as_of.unwrap_or_else(|| Local::now().date_naive());
            let snapshot = yahoo
                .snapshot(&cfg.source_ticker, as_of)
                .with_context(|| format!("fetching {} option chain", cfg.source_ticker))?;

            let target_spot = match (args.target_spot, &cfg.target_quote_symbol) {
                (Some(price), _) => Some(price),
                (None, Some(symbol)) => match yahoo.spot(symbol) {
                    Ok(price) => Some(price),
                    Err(e) => {
                        warn!("Could not fetch {} price: {}", symbol, e);
                        None
                    }
                },
                (None, None) => None,
            };
            (snapshot, target_spot)
        }
    };

    if let Some(path) = &args.dump_snapshot {
        save_snapshot(path, &snapshot)?;
    }

    let report = engine.compute(&snapshot, target_spot, timestamp_now())?;
    LevelStore::new(&args.output)
        .write(&report)
        .with_context(|| format!("writing {}", args.output.display()))?;

    println!(
        "\n{} spot {:.2} → {} (ratio {:.4}{})",
        cfg.source_ticker,
        snapshot.spot,
        cfg.target_ticker,
        report.ratio,
        if report.used_fixed_ratio { ", fixed" } else { "" }
    );
    println!("Net GEX: {:.0}\n", report.net_gex());
    for (name, value) in report.merged().present() {
        println!("  {:<28} {:>12.2}", name, value);
    }
    info!("Levels written to {}", args.output.display());

    Ok(())
}
