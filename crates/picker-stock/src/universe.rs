//! Ticker universe grouped by market

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const FRANCE_SYMBOLS: &[&str] = &[
    "ML.PA", "ALSTOM.PA", "DG.PA", "PUB.PA", "RNO.PA", "ACA.PA", "BN.PA", "AI.PA", "STM.PA",
    "CAP.PA",
];

const ASIA_SYMBOLS: &[&str] = &[
    "9984.T",
    "700.HK",
    "005930.KQ",
    "RELIANCE.NS",
    "BABA",
    "TCEHY",
    "JD",
    "NTES",
    "SE",
    "SONY",
];

const US_SYMBOLS: &[&str] = &[
    "NVDA", "TSLA", "PLTR", "SOFI", "COIN", "AMD", "RBLX", "UPST", "CRWD", "FSLY", "NET",
];

/// Market a ticker pool belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    France,
    Asia,
    Us,
}

impl Market {
    /// All markets in universe order
    pub const ALL: [Market; 3] = [Market::France, Market::Asia, Market::Us];

    /// Built-in ticker pool for this market
    pub fn symbols(self) -> &'static [&'static str] {
        match self {
            Market::France => FRANCE_SYMBOLS,
            Market::Asia => ASIA_SYMBOLS,
            Market::Us => US_SYMBOLS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Market::France => "france",
            Market::Asia => "asia",
            Market::Us => "us",
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Market {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "france" | "fr" => Ok(Market::France),
            "asia" => Ok(Market::Asia),
            "us" | "usa" => Ok(Market::Us),
            other => Err(format!("unknown market '{other}', expected france, asia or us")),
        }
    }
}

/// Ordered, duplicate-free list of symbols fetched each cycle
///
/// The order here becomes the order of the fetched batch, which in turn decides
/// how ties are broken when ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Universe {
    symbols: Vec<String>,
}

impl Universe {
    /// France, then Asia, then US pools
    pub fn default_universe() -> Self {
        Self::for_markets(&Market::ALL)
    }

    /// Concatenate the pools of the given markets
    pub fn for_markets(markets: &[Market]) -> Self {
        Self::from_symbols(
            markets
                .iter()
                .flat_map(|market| market.symbols().iter().copied()),
        )
    }

    /// Build a universe from arbitrary symbols
    ///
    /// Symbols are trimmed and upper-cased; blanks are dropped and only the first
    /// occurrence of a repeated symbol is kept.
    pub fn from_symbols<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut unique: Vec<String> = Vec::new();
        for symbol in symbols {
            let symbol = symbol.as_ref().trim().to_ascii_uppercase();
            if !symbol.is_empty() && !unique.contains(&symbol) {
                unique.push(symbol);
            }
        }
        Self { symbols: unique }
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl Default for Universe {
    fn default() -> Self {
        Self::default_universe()
    }
}
