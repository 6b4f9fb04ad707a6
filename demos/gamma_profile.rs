//! Example: Per-strike gamma exposure profile
//!
//! Shows Black-Scholes gamma across strikes, then the aggregated net and
//! cumulative GEX curve with the gamma flip marked.
//!
//! Run with: cargo run --example gamma_profile

use chrono::{Duration, NaiveDate};
use gex_levels::prelude::*;

fn main() -> GexResult<()> {
    let spot = 500.0;
    let rate = 0.05;
    let vol = 0.20;

    println!("=== Gamma by Strike (vol {:.0}%) ===\n", vol * 100.0);
    println!("{:>8} {:>10} {:>10} {:>10}", "Strike", "7d", "30d", "90d");
    for i in -4..=4 {
        let strike = spot + 10.0 * i as f64;
        let g: Vec<f64> = [7.0, 30.0, 90.0]
            .iter()
            .map(|days| gamma(spot, strike, days / 365.0, rate, vol))
            .collect::<GexResult<_>>()?;
        println!("{:>8.1} {:>10.5} {:>10.5} {:>10.5}", strike, g[0], g[1], g[2]);
    }

    let as_of = NaiveDate::from_ymd_opt(2025, 1, 20).unwrap();
    let expiry = as_of + Duration::days(14);
    let contracts: Vec<OptionContract> = (-6..=6)
        .flat_map(|i| {
            let strike = spot + 5.0 * i as f64;
            let call_oi = if i >= 0 { 3000 + 400 * i as u64 } else { 800 };
            let put_oi = if i <= 0 { 3500 + 500 * (-i) as u64 } else { 900 };
            [
                OptionContract::call(strike, expiry, vol, call_oi),
                OptionContract::put(strike, expiry, vol + 0.02, put_oi),
            ]
        })
        .collect();

    let model = ExposureModel::new(rate);
    let contributions = model.contributions(&contracts, spot, as_of, &ContractFilter::default())?;
    let curve = aggregate(&contributions);
    let flip = gamma_flip(&curve);

    println!("\n=== GEX Curve ({} strikes) ===\n", curve.len());
    println!("{:>8} {:>14} {:>14}", "Strike", "Net GEX", "Cumulative");
    for point in curve.points() {
        let marker = if Some(point.strike) == flip { "  <- flip" } else { "" };
        println!(
            "{:>8.1} {:>14.0} {:>14.0}{}",
            point.strike, point.gex, point.cumulative_gex, marker
        );
    }
    println!("\nTotal: {:.0}", curve.total_gex());

    Ok(())
}
