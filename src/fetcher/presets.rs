//! Predefined API options with their published rate limits and usage
//! guides. The guide content is data for the embedding UI; the engine uses
//! the catalog to attribute calls to a provider and enforce pre-flight
//! quota checks on test fetches.

use once_cell::sync::Lazy;

use crate::models::{RateLimit, RatePeriod};

pub struct GuideParam {
    pub name: &'static str,
    pub description: &'static str,
    pub example: &'static str,
}

pub struct ApiGuide {
    pub title: &'static str,
    pub description: &'static str,
    pub parameters: Vec<GuideParam>,
    pub example_url: &'static str,
    pub common_fields: Vec<&'static str>,
}

pub struct ApiPreset {
    pub name: &'static str,
    pub url: &'static str,
    pub provider: &'static str,
    pub rate_limit: RateLimit,
    pub guide: ApiGuide,
}

pub static PRESETS: Lazy<Vec<ApiPreset>> = Lazy::new(|| {
    vec![
        ApiPreset {
            name: "Bitcoin Price (Coinbase)",
            url: "https://api.coinbase.com/v2/exchange-rates?currency=BTC",
            provider: "coinbase",
            rate_limit: RateLimit {
                requests: 10_000,
                period: RatePeriod::Hour,
            },
            guide: ApiGuide {
                title: "Coinbase Exchange Rates API",
                description: "Get real-time cryptocurrency exchange rates",
                parameters: vec![GuideParam {
                    name: "currency",
                    description: "Base currency code (BTC, ETH, etc.)",
                    example: "BTC",
                }],
                example_url: "https://api.coinbase.com/v2/exchange-rates?currency=BTC",
                common_fields: vec![
                    "data.currency",
                    "data.rates.USD",
                    "data.rates.EUR",
                    "data.rates.INR",
                ],
            },
        },
        ApiPreset {
            name: "Stock & Crypto Data (Twelve Data)",
            url: "https://api.twelvedata.com/time_series?symbol=AAPL&interval=1day&outputsize=1&apikey=b0055776c7ca49f9873244ab2853648c",
            provider: "twelvedata",
            rate_limit: RateLimit {
                requests: 8,
                period: RatePeriod::Minute,
            },
            guide: ApiGuide {
                title: "Twelve Data Time Series API",
                description: "Get historical and real-time stock/crypto data",
                parameters: vec![
                    GuideParam {
                        name: "symbol",
                        description: "Stock ticker or crypto pair",
                        example: "AAPL, MSFT, BTC/USD",
                    },
                    GuideParam {
                        name: "interval",
                        description: "Time interval",
                        example: "1min, 5min, 1day, 1week",
                    },
                    GuideParam {
                        name: "outputsize",
                        description: "Number of data points",
                        example: "1-5000",
                    },
                ],
                example_url: "https://api.twelvedata.com/time_series?symbol=AAPL&interval=1day&outputsize=1&apikey=b0055776c7ca49f9873244ab2853648c",
                common_fields: vec![
                    "meta.symbol",
                    "meta.interval",
                    "values.0.open",
                    "values.0.high",
                    "values.0.low",
                    "values.0.close",
                    "values.0.volume",
                ],
            },
        },
        ApiPreset {
            name: "Stock Market Data (Alpha Vantage)",
            url: "https://www.alphavantage.co/query?function=GLOBAL_QUOTE&symbol=IBM&apikey=CAILWE2UT20LBDOE",
            provider: "alphavantage",
            rate_limit: RateLimit {
                requests: 25,
                period: RatePeriod::Day,
            },
            guide: ApiGuide {
                title: "Alpha Vantage Global Quote API",
                description: "Get latest stock price and trading information",
                parameters: vec![
                    GuideParam {
                        name: "function",
                        description: "API function",
                        example: "GLOBAL_QUOTE, TIME_SERIES_DAILY",
                    },
                    GuideParam {
                        name: "symbol",
                        description: "Stock ticker symbol",
                        example: "IBM, AAPL, MSFT",
                    },
                ],
                example_url: "https://www.alphavantage.co/query?function=GLOBAL_QUOTE&symbol=IBM&apikey=CAILWE2UT20LBDOE",
                common_fields: vec![
                    "Global Quote.01. symbol",
                    "Global Quote.05. price",
                    "Global Quote.09. change",
                    "Global Quote.10. change percent",
                ],
            },
        },
    ]
});

/// Looks a preset up by its exact URL, the way a selected radio option is
/// matched back to its provider.
pub fn find_by_url(url: &str) -> Option<&'static ApiPreset> {
    PRESETS.iter().find(|preset| preset.url == url)
}

pub fn find_by_provider(provider: &str) -> Option<&'static ApiPreset> {
    PRESETS.iter().find(|preset| preset.provider == provider)
}
