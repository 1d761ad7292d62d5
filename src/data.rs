//! Market data sources
//!
//! Price histories come in through the [`MarketDataSource`] port. Two
//! sources ship with the crate:
//!
//! - [`SyntheticMarketData`]: seeded daily random walk anchored at a current
//!   price, for paper runs and tests
//! - [`CsvMarketData`]: `{data_dir}/{SYMBOL}.csv` files with
//!   `timestamp,price` rows, for reproducible offline runs

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{PipelineError, PipelineResult};
use crate::PricePoint;

/// Supplies ordered price histories per (network, symbol)
pub trait MarketDataSource {
    /// Up to `lookback` daily points, oldest first
    fn price_history(
        &self,
        network: &str,
        symbol: &str,
        lookback: usize,
    ) -> PipelineResult<Vec<PricePoint>>;
}

// =============================================================================
// Synthetic random walk
// =============================================================================

/// Range the anchor price is drawn from when none is configured
const ANCHOR_PRICE_RANGE: std::ops::Range<f64> = 10.0..2000.0;

/// Seeded geometric random walk with normally distributed daily returns.
///
/// Each (network, symbol) gets its own stream derived from the base seed,
/// so histories are stable across runs and independent of call order.
#[derive(Debug, Clone)]
pub struct SyntheticMarketData {
    seed: u64,
    daily_volatility: f64,
    end: DateTime<Utc>,
    reference_prices: BTreeMap<String, f64>,
}

impl SyntheticMarketData {
    pub fn new(seed: u64, daily_volatility: f64) -> Self {
        SyntheticMarketData {
            seed,
            daily_volatility,
            end: Utc::now(),
            reference_prices: BTreeMap::new(),
        }
    }

    /// Timestamp of the most recent point
    pub fn with_end(mut self, end: DateTime<Utc>) -> Self {
        self.end = end;
        self
    }

    /// Current prices to anchor the walk at, by symbol
    pub fn with_reference_prices(mut self, prices: BTreeMap<String, f64>) -> Self {
        self.reference_prices = prices;
        self
    }

    fn stream_seed(&self, network: &str, symbol: &str) -> u64 {
        let digest = Sha256::digest(format!("{}:{}:{}", self.seed, network, symbol).as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        u64::from_le_bytes(bytes)
    }
}

impl MarketDataSource for SyntheticMarketData {
    fn price_history(
        &self,
        network: &str,
        symbol: &str,
        lookback: usize,
    ) -> PipelineResult<Vec<PricePoint>> {
        let mut rng = StdRng::seed_from_u64(self.stream_seed(network, symbol));
        let anchor = match self.reference_prices.get(symbol) {
            Some(price) => *price,
            None => rng.random_range(ANCHOR_PRICE_RANGE),
        };
        if !(anchor.is_finite() && anchor > 0.0) {
            return Err(PipelineError::MarketData(format!(
                "reference price for {} must be positive, got {}",
                symbol, anchor
            )));
        }

        let returns = Normal::new(0.0, self.daily_volatility).map_err(|e| {
            PipelineError::MarketData(format!(
                "invalid daily volatility {}: {}",
                self.daily_volatility, e
            ))
        })?;

        // Walk backwards from the current price, then flip to oldest first
        let mut prices = Vec::with_capacity(lookback);
        let mut price = anchor;
        for i in 0..lookback {
            if i > 0 {
                let daily_return = returns.sample(&mut rng);
                price = (price * (1.0 + daily_return)).max(f64::MIN_POSITIVE);
            }
            prices.push(price);
        }
        prices.reverse();

        let start = self.end - Duration::days(lookback as i64 - 1);
        let history = prices
            .into_iter()
            .enumerate()
            .map(|(i, price)| PricePoint::new(start + Duration::days(i as i64), price))
            .collect::<Vec<_>>();

        debug!(network, symbol, points = history.len(), "Generated synthetic history");
        Ok(history)
    }
}

// =============================================================================
// CSV price files
// =============================================================================

/// Reads `{data_dir}/{SYMBOL}.csv`; the network is ignored
#[derive(Debug, Clone)]
pub struct CsvMarketData {
    data_dir: PathBuf,
}

impl CsvMarketData {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        CsvMarketData {
            data_dir: data_dir.into(),
        }
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.data_dir.join(format!("{}.csv", symbol))
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|ndt| DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc))
        })
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|ndt| DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc))
        })
}

/// Load a `timestamp,price` CSV file (header row expected)
pub fn load_price_csv(path: impl AsRef<Path>) -> PipelineResult<Vec<PricePoint>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path).map_err(|e| {
        PipelineError::MarketData(format!("failed to open {}: {}", path.display(), e))
    })?;

    let mut points = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| {
            PipelineError::MarketData(format!("failed to read row {}: {}", row_idx + 1, e))
        })?;

        let raw_ts = record.get(0).ok_or_else(|| {
            PipelineError::MarketData(format!("row {}: missing timestamp column", row_idx + 1))
        })?;
        let timestamp = parse_timestamp(raw_ts.trim()).ok_or_else(|| {
            PipelineError::MarketData(format!(
                "row {}: failed to parse timestamp '{}'",
                row_idx + 1,
                raw_ts
            ))
        })?;

        let price: f64 = record
            .get(1)
            .ok_or_else(|| {
                PipelineError::MarketData(format!("row {}: missing price column", row_idx + 1))
            })?
            .trim()
            .parse()
            .map_err(|_| {
                PipelineError::MarketData(format!("row {}: failed to parse price", row_idx + 1))
            })?;

        points.push(PricePoint::new(timestamp, price));
    }

    Ok(points)
}

impl MarketDataSource for CsvMarketData {
    fn price_history(
        &self,
        _network: &str,
        symbol: &str,
        lookback: usize,
    ) -> PipelineResult<Vec<PricePoint>> {
        let mut points = load_price_csv(self.path_for(symbol))?;
        if points.len() > lookback {
            points.drain(..points.len() - lookback);
        }
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;

    fn end() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_synthetic_is_deterministic_per_symbol() {
        let source = SyntheticMarketData::new(7, 0.02).with_end(end());
        let a = source.price_history("arbitrum", "ETH", 30).unwrap();
        let b = source.price_history("arbitrum", "ETH", 30).unwrap();
        let other = source.price_history("arbitrum", "LINK", 30).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, other);
        assert_eq!(a.len(), 30);
        assert_eq!(a.last().unwrap().timestamp, end());
        assert!(a.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert!(a.iter().all(|p| p.price > 0.0));
    }

    #[test]
    fn test_synthetic_anchors_at_reference_price() {
        let source = SyntheticMarketData::new(1, 0.02)
            .with_end(end())
            .with_reference_prices(BTreeMap::from([("USDC".to_string(), 1.0)]));
        let history = source.price_history("polygon", "USDC", 10).unwrap();
        assert_eq!(history.last().unwrap().price, 1.0);
    }

    #[test]
    fn test_synthetic_rejects_invalid_volatility() {
        let source = SyntheticMarketData::new(42, f64::NAN);
        let err = source.price_history("arbitrum", "ETH", 10).unwrap_err();
        assert!(matches!(err, PipelineError::MarketData(_)));
    }

    #[test]
    fn test_csv_loads_and_keeps_tail() {
        let dir = std::env::temp_dir().join(format!("qt_csv_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("ETH.csv"),
            "timestamp,price\n2024-01-01,100\n2024-01-02 00:00:00,101.5\n2024-01-03T00:00:00Z,99\n",
        )
        .unwrap();

        let source = CsvMarketData::new(&dir);
        let history = source.price_history("arbitrum", "ETH", 2).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].price, 101.5);
        assert_eq!(history[1].price, 99.0);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_csv_rejects_bad_price() {
        let dir = std::env::temp_dir().join(format!("qt_csv_bad_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("ETH.csv"), "timestamp,price\n2024-01-01,abc\n").unwrap();

        let err = CsvMarketData::new(&dir)
            .price_history("arbitrum", "ETH", 10)
            .unwrap_err();
        assert!(matches!(err, PipelineError::MarketData(_)));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_csv_is_market_data_error() {
        let err = CsvMarketData::new("/nonexistent/qt")
            .price_history("arbitrum", "ETH", 10)
            .unwrap_err();
        assert!(matches!(err, PipelineError::MarketData(_)));
    }
}
