//! Example: Compute GEX levels from a synthetic QQQ chain
//!
//! Run with: cargo run --example compute_levels

use chrono::{Duration, NaiveDate};
use gex_levels::prelude::*;

fn main() -> GexResult<()> {
    let as_of = NaiveDate::from_ymd_opt(2025, 1, 20).unwrap();
    let spot = 520.0;

    // A week of daily expiries plus a monthly, with open interest peaking
    // a few strikes either side of spot
    let mut snapshot = ChainSnapshot::new("QQQ", spot, as_of);
    for days in [0, 1, 2, 3, 4, 25] {
        let expiry = as_of + Duration::days(days);
        for i in -10..=10 {
            let strike = spot + 2.5 * i as f64;
            let skew = 0.18 - 0.002 * i as f64;
            let call_oi = (4000.0 * (-((i - 4) as f64).powi(2) / 18.0).exp()) as u64 + 200;
            let put_oi = (5000.0 * (-((i + 5) as f64).powi(2) / 18.0).exp()) as u64 + 200;

            snapshot.add_contract(OptionContract::call(strike, expiry, skew, call_oi));
            snapshot.add_contract(OptionContract::put(strike, expiry, skew + 0.01, put_oi));
        }
    }

    let engine = GexEngine::new(EngineConfig::qqq_to_mnq())?;
    let report = engine.compute(&snapshot, Some(21150.0), timestamp_now())?;

    println!("=== GEX Levels ===\n");
    println!("Spot: {:.2}  Contracts: {}", spot, snapshot.len());
    println!("Net GEX: {:.0}", report.net_gex());
    println!(
        "Ratio: {:.4}{}\n",
        report.ratio,
        if report.used_fixed_ratio { " (fixed)" } else { "" }
    );

    for (name, value) in report.source.iter() {
        match value {
            Some(v) => println!("  {:<24} {:>10.2}", name, v),
            None => println!("  {:<24} {:>10}", name, "-"),
        }
    }

    println!("\n=== Projected ===\n");
    for (name, value) in report.projected.present() {
        println!("  {:<24} {:>10.2}", name, value);
    }

    // Same chain with the open-interest wall rule
    let mut config = EngineConfig::qqq_to_mnq();
    config.levels.wall_basis = WallBasis::OpenInterest;
    let oi_report = GexEngine::new(config)?.compute(&snapshot, None, timestamp_now())?;

    println!("\n=== Open Interest Walls ===\n");
    for kind in [
        LevelKind::PutWall,
        LevelKind::CallWall,
        LevelKind::PutWall0Dte,
        LevelKind::CallWall0Dte,
    ] {
        let value = oi_report.source.level("QQQ", kind);
        println!("  {:<24} {:>10}", kind.key("QQQ"), fmt_level(value));
    }

    println!("\n{}", serde_json::to_string_pretty(&report).unwrap_or_default());
    Ok(())
}

fn fmt_level(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string())
}
