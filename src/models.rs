use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a widget renders its selected fields. The engine only stores the
/// choice; rendering happens in the embedding UI.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DisplayType {
    Card,
    Table,
    Chart,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RatePeriod {
    Minute,
    Hour,
    Day,
}

impl RatePeriod {
    /// Fixed period-to-milliseconds mapping.
    pub fn as_millis(&self) -> i64 {
        match self {
            RatePeriod::Minute => 60_000,
            RatePeriod::Hour => 3_600_000,
            RatePeriod::Day => 86_400_000,
        }
    }

    pub fn duration(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.as_millis())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub requests: u32,
    pub period: RatePeriod,
}

/// A configured dashboard widget. Immutable once created, except for its
/// position in the owning list.
///
/// Serialized field names match the persisted widget list blob
/// (`displayType`, `rateLimit`).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Widget {
    pub id: String,
    pub name: String,
    pub api: String,
    /// Refresh interval in seconds, at least [`MIN_REFRESH_SECS`].
    pub refresh: u64,
    /// Dotted field paths to extract from each payload. Non-empty.
    pub fields: Vec<String>,
    #[serde(rename = "displayType")]
    pub display_type: DisplayType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(rename = "rateLimit", skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimit>,
}

/// Minimum allowed widget refresh interval.
pub const MIN_REFRESH_SECS: u64 = 5;

/// User-supplied widget configuration before an id is assigned.
#[derive(Debug, Clone)]
pub struct WidgetDraft {
    pub name: String,
    pub api: String,
    pub refresh: u64,
    pub fields: Vec<String>,
    pub display_type: DisplayType,
    pub provider: Option<String>,
    pub rate_limit: Option<RateLimit>,
}

/// Per-provider API usage counter with its window reset point.
///
/// `resetTime` is persisted as epoch milliseconds, matching the usage blob
/// format.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct RateUsageRecord {
    pub count: u32,
    #[serde(rename = "resetTime", with = "chrono::serde::ts_milliseconds")]
    pub reset_time: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Parses the persisted theme string, defaulting to dark for anything
    /// unrecognized.
    pub fn parse(raw: &str) -> Theme {
        match raw {
            "light" => Theme::Light,
            _ => Theme::Dark,
        }
    }
}

/// The exported configuration document: `{widgets, theme}`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DashboardConfig {
    pub widgets: Vec<Widget>,
    pub theme: Theme,
}
