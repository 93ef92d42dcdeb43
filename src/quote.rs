use serde::{Deserialize, Serialize};

/// Last trade of the current session. `index` is 1-based; `0` means no trade
/// has happened yet today.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Tick {
    pub index: u64,
    /// Trade time as HHmmss.
    pub time: u32,
    /// Best bid at trade time.
    pub bid: f64,
    /// Best ask at trade time.
    pub ask: f64,
    pub volume: u64,
    /// In/out market flag.
    pub inout: i32,
}

/// Immutable snapshot of one symbol's quote data, replaced wholesale on each
/// refresh. Field names mirror the upstream JSON records (camelCase).
///
/// The engine keys everything on the lowercased symbol id; the snapshot itself
/// keeps whatever casing the upstream returned.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Quote {
    pub symbol_id: String,
    pub name: String,
    /// Decimal places for price formatting.
    pub dp: u32,
    /// Trade date as yyyyMMdd.
    pub date: u32,
    pub prev_volume: u64,
    /// Previous close, the session's reference price.
    pub prev_close: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub avg_price: f64,
    pub upper_limit: f64,
    pub down_limit: f64,
    pub total_volume: u64,
    pub tick: Tick,
    /// Five best bid prices.
    pub bid: [f64; 5],
    /// Five best ask prices.
    pub ask: [f64; 5],
    pub bid_size: [u64; 5],
    pub ask_size: [u64; 5],
}

impl Quote {
    /// Placeholder returned for symbols not yet resolved: all zero fields,
    /// name derived from the symbol's base code.
    pub fn empty(symbol_id: &str) -> Self {
        Quote {
            symbol_id: symbol_id.to_string(),
            name: base_code(symbol_id).to_string(),
            ..Default::default()
        }
    }

    /// Change versus previous close; `0` unless both prices are set.
    pub fn change(&self) -> f64 {
        if self.prev_close == 0.0 || self.close == 0.0 {
            0.0
        } else {
            self.close - self.prev_close
        }
    }

    /// Change as a percentage of previous close; `0` unless both prices are set.
    pub fn change_ratio(&self) -> f64 {
        if self.prev_close == 0.0 || self.close == 0.0 {
            0.0
        } else {
            100.0 * (self.close - self.prev_close) / self.prev_close
        }
    }
}

/// Provider-specific base code: the symbol id with any market suffix
/// stripped, e.g. `"2330.TW"` -> `"2330"`.
pub fn base_code(symbol_id: &str) -> &str {
    symbol_id.split('.').next().unwrap_or(symbol_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_quote_derives_name_from_base_code() {
        let quote = Quote::empty("2330.TW");
        assert_eq!(quote.symbol_id, "2330.TW");
        assert_eq!(quote.name, "2330");
        assert_eq!(quote.close, 0.0);
        assert_eq!(quote.tick.index, 0);
    }

    #[test]
    fn test_base_code_without_suffix() {
        assert_eq!(base_code("2330"), "2330");
        assert_eq!(base_code("IX0001.TW"), "IX0001");
    }

    #[test]
    fn test_change_is_zero_when_either_price_missing() {
        let mut quote = Quote::empty("2330.TW");
        quote.prev_close = 100.0;
        assert_eq!(quote.change(), 0.0);
        assert_eq!(quote.change_ratio(), 0.0);

        quote.prev_close = 0.0;
        quote.close = 105.0;
        assert_eq!(quote.change(), 0.0);
        assert_eq!(quote.change_ratio(), 0.0);
    }

    #[test]
    fn test_change_and_ratio() {
        let mut quote = Quote::empty("2330.TW");
        quote.prev_close = 100.0;
        quote.close = 105.0;
        assert_eq!(quote.change(), 5.0);
        assert_eq!(quote.change_ratio(), 5.0);
    }

    #[test]
    fn test_deserialize_upstream_record() {
        let json = r#"{
            "symbolId": "2330.TW",
            "name": "TSMC",
            "dp": 2,
            "date": 20260828,
            "prevClose": 100.0,
            "open": 101.0,
            "high": 106.0,
            "low": 99.5,
            "close": 105.0,
            "upperLimit": 110.0,
            "downLimit": 90.0,
            "totalVolume": 12345,
            "tick": { "index": 42, "time": 93005, "bid": 104.5, "ask": 105.0, "volume": 3, "inout": 1 },
            "bid": [104.5, 104.0, 103.5, 103.0, 102.5],
            "bidSize": [10, 20, 30, 40, 50]
        }"#;

        let quote: Quote = serde_json::from_str(json).unwrap();
        assert_eq!(quote.symbol_id, "2330.TW");
        assert_eq!(quote.dp, 2);
        assert_eq!(quote.tick.time, 93005);
        assert_eq!(quote.bid[0], 104.5);
        assert_eq!(quote.bid_size[4], 50);
        // Fields absent from the record default to zero.
        assert_eq!(quote.avg_price, 0.0);
        assert_eq!(quote.ask, [0.0; 5]);
    }
}
