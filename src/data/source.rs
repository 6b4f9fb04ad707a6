//! Market data source abstraction
//!
//! Anything that can deliver a spot price, the listed expirations and the
//! per-expiry chain for a symbol. The engine only needs the assembled
//! `ChainSnapshot`; `snapshot()` collects every expiration before returning.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::core::{ChainSnapshot, GexError, GexResult, OptionContract, OptionSide};

/// Calls and puts for one expiration
#[derive(Debug, Clone, Default)]
pub struct ChainRows {
    pub calls: Vec<OptionContract>,
    pub puts: Vec<OptionContract>,
}

impl ChainRows {
    /// Split a mixed list by side
    pub fn from_contracts(contracts: impl IntoIterator<Item = OptionContract>) -> Self {
        let (calls, puts) = contracts
            .into_iter()
            .partition(|c: &OptionContract| c.side == OptionSide::Call);
        Self { calls, puts }
    }

    pub fn len(&self) -> usize {
        self.calls.len() + self.puts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty() && self.puts.is_empty()
    }

    pub fn into_contracts(self) -> impl Iterator<Item = OptionContract> {
        self.calls.into_iter().chain(self.puts)
    }
}

/// Provider of spot prices and option chains
pub trait MarketDataSource {
    /// Latest price for a symbol
    fn spot(&self, symbol: &str) -> GexResult<f64>;

    /// Listed expirations for a symbol
    fn expirations(&self, symbol: &str) -> GexResult<Vec<NaiveDate>>;

    /// Chain rows for one expiration
    fn chain(&self, symbol: &str, expiry: NaiveDate) -> GexResult<ChainRows>;

    /// Full batch across all expirations.
    ///
    /// An expiration that fails to load is logged and skipped; no listed
    /// expirations at all is an error.
    fn snapshot(&self, symbol: &str, as_of: NaiveDate) -> GexResult<ChainSnapshot> {
        let spot = self.spot(symbol)?;
        let expiries = self.expirations(symbol)?;
        if expiries.is_empty() {
            return Err(GexError::data(format!("no expirations returned for {}", symbol)));
        }

        let mut snapshot = ChainSnapshot::new(symbol, spot, as_of);
        for expiry in expiries {
            match self.chain(symbol, expiry) {
                Ok(rows) => {
                    tracing::debug!(%expiry, rows = rows.len(), "loaded chain");
                    snapshot.contracts.extend(rows.into_contracts());
                }
                Err(e) => {
                    tracing::warn!("Failed to get chain for {}: {}", expiry, e);
                }
            }
        }

        tracing::info!(
            symbol,
            spot,
            contracts = snapshot.len(),
            expiries = snapshot.expiries().len(),
            "collected chain snapshot"
        );
        Ok(snapshot)
    }
}

/// In-memory source for replay and tests
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    spots: HashMap<String, f64>,
    chains: HashMap<String, Vec<(NaiveDate, ChainRows)>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Source that replays a stored snapshot
    pub fn from_snapshot(snapshot: &ChainSnapshot) -> Self {
        let mut source = Self::new();
        source.set_spot(&snapshot.underlying, snapshot.spot);
        for expiry in snapshot.expiries() {
            let rows = snapshot
                .contracts
                .iter()
                .filter(|c| c.expiry == expiry)
                .cloned();
            source.set_chain(&snapshot.underlying, expiry, ChainRows::from_contracts(rows));
        }
        source
    }

    pub fn set_spot(&mut self, symbol: &str, price: f64) {
        self.spots.insert(symbol.to_string(), price);
    }

    pub fn set_chain(&mut self, symbol: &str, expiry: NaiveDate, rows: ChainRows) {
        let chains = self.chains.entry(symbol.to_string()).or_default();
        chains.retain(|(e, _)| *e != expiry);
        chains.push((expiry, rows));
        chains.sort_by_key(|(e, _)| *e);
    }
}

impl MarketDataSource for InMemorySource {
    fn spot(&self, symbol: &str) -> GexResult<f64> {
        self.spots
            .get(symbol)
            .copied()
            .ok_or_else(|| GexError::data(format!("no price for {}", symbol)))
    }

    fn expirations(&self, symbol: &str) -> GexResult<Vec<NaiveDate>> {
        Ok(self
            .chains
            .get(symbol)
            .map(|chains| chains.iter().map(|(e, _)| *e).collect())
            .unwrap_or_default())
    }

    fn chain(&self, symbol: &str, expiry: NaiveDate) -> GexResult<ChainRows> {
        self.chains
            .get(symbol)
            .and_then(|chains| chains.iter().find(|(e, _)| *e == expiry))
            .map(|(_, rows)| rows.clone())
            .ok_or_else(|| GexError::data(format!("no chain for {} {}", symbol, expiry)))
    }
}
