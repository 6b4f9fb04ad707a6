//! Yahoo Finance data fetcher
//!
//! Spot prices (ETFs and front-month futures such as `MNQ=F`) and option
//! chains from Yahoo Finance's unofficial API.
//!
//! Note: Yahoo Finance data is delayed ~15 minutes and intended for
//! personal use.

use chrono::{DateTime, NaiveDate};
use serde::Deserialize;

use crate::core::{GexError, GexResult, OptionContract, OptionSide};

use super::source::{ChainRows, MarketDataSource};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com/v7/finance";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Yahoo Finance API client
pub struct YahooClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooClient {
    pub fn new() -> GexResult<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Client against another endpoint (mirrors, proxies)
    pub fn with_base_url(base_url: impl Into<String>) -> GexResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| GexError::network(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str, what: &str) -> GexResult<T> {
        tracing::debug!(url, "GET");
        self.client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| GexError::network(e.to_string()))?
            .json()
            .map_err(|e| GexError::data(format!("Failed to parse {}: {}", what, e)))
    }

    /// Latest regular-market price for a symbol
    pub fn get_quote(&self, symbol: &str) -> GexResult<f64> {
        let url = format!("{}/quote?symbols={}", self.base_url, symbol);
        let response: YahooQuoteResponse = self.get_json(&url, "quote")?;

        let price = response
            .quote_response
            .result
            .into_iter()
            .next()
            .and_then(|q| q.regular_market_price)
            .ok_or_else(|| GexError::data(format!("No quote data returned for {}", symbol)))?;

        if !price.is_finite() || price <= 0.0 {
            return Err(GexError::data(format!("bad price for {}: {}", symbol, price)));
        }
        Ok(price)
    }

    /// Listed option expiration dates
    pub fn get_expirations(&self, symbol: &str) -> GexResult<Vec<NaiveDate>> {
        let url = format!("{}/options/{}", self.base_url, symbol);
        let response: YahooOptionsResponse = self.get_json(&url, "options")?;
        let chain = first_chain(response, symbol)?;

        Ok(chain
            .expiration_dates
            .iter()
            .filter_map(|&ts| DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive()))
            .collect())
    }

    /// Calls and puts for one expiration
    pub fn get_option_chain(&self, symbol: &str, expiry: NaiveDate) -> GexResult<ChainRows> {
        let expiry_ts = expiry
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .ok_or_else(|| GexError::invalid_input(format!("bad expiry {}", expiry)))?;

        let url = format!("{}/options/{}?date={}", self.base_url, symbol, expiry_ts);
        let response: YahooOptionsResponse = self.get_json(&url, "options")?;
        let chain = first_chain(response, symbol)?;

        Ok(convert_chain(chain, expiry))
    }
}

impl MarketDataSource for YahooClient {
    fn spot(&self, symbol: &str) -> GexResult<f64> {
        self.get_quote(symbol)
    }

    fn expirations(&self, symbol: &str) -> GexResult<Vec<NaiveDate>> {
        self.get_expirations(symbol)
    }

    fn chain(&self, symbol: &str, expiry: NaiveDate) -> GexResult<ChainRows> {
        self.get_option_chain(symbol, expiry)
    }
}

fn first_chain(response: YahooOptionsResponse, symbol: &str) -> GexResult<YahooOptionChainData> {
    response
        .option_chain
        .result
        .into_iter()
        .next()
        .ok_or_else(|| GexError::data(format!("No options data returned for {}", symbol)))
}

fn convert_chain(chain: YahooOptionChainData, expiry: NaiveDate) -> ChainRows {
    let mut rows = ChainRows::default();
    if let Some(options) = chain.options.into_iter().next() {
        rows.calls = options
            .calls
            .iter()
            .filter_map(|row| convert_row(row, expiry, OptionSide::Call))
            .collect();
        rows.puts = options
            .puts
            .iter()
            .filter_map(|row| convert_row(row, expiry, OptionSide::Put))
            .collect();
    }
    rows
}

/// Rows without a usable strike are dropped; bad IV becomes unquoted and
/// missing OI becomes zero.
fn convert_row(data: &YahooOptionData, expiry: NaiveDate, side: OptionSide) -> Option<OptionContract> {
    let strike = data.strike.filter(|k| k.is_finite() && *k > 0.0)?;
    let implied_vol = data.implied_volatility.filter(|v| v.is_finite() && *v >= 0.0);
    let open_interest = data.open_interest.filter(|&oi| oi > 0).unwrap_or(0) as u64;

    let mut contract = OptionContract::new(strike, side, expiry, implied_vol, open_interest);
    contract.symbol = data.contract_symbol.clone();
    Some(contract)
}

// Yahoo Finance API response structures

#[derive(Debug, Deserialize)]
struct YahooQuoteResponse {
    #[serde(rename = "quoteResponse")]
    quote_response: YahooQuoteResult,
}

#[derive(Debug, Deserialize)]
struct YahooQuoteResult {
    result: Vec<YahooQuoteData>,
}

#[derive(Debug, Deserialize)]
struct YahooQuoteData {
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct YahooOptionsResponse {
    #[serde(rename = "optionChain")]
    option_chain: YahooOptionChain,
}

#[derive(Debug, Deserialize)]
struct YahooOptionChain {
    result: Vec<YahooOptionChainData>,
}

#[derive(Debug, Deserialize)]
struct YahooOptionChainData {
    #[serde(rename = "expirationDates", default)]
    expiration_dates: Vec<i64>,
    #[serde(default)]
    options: Vec<YahooOptions>,
}

#[derive(Debug, Deserialize)]
struct YahooOptions {
    #[serde(default)]
    calls: Vec<YahooOptionData>,
    #[serde(default)]
    puts: Vec<YahooOptionData>,
}

#[derive(Debug, Deserialize)]
struct YahooOptionData {
    #[serde(rename = "contractSymbol")]
    contract_symbol: Option<String>,
    strike: Option<f64>,
    #[serde(rename = "openInterest")]
    open_interest: Option<i64>,
    #[serde(rename = "impliedVolatility")]
    implied_volatility: Option<f64>,
}
