//! FinBoard engine: the non-visual half of a configurable finance
//! dashboard.
//!
//! Widgets poll a financial JSON API on a fixed interval; selected fields
//! are resolved out of each payload by dotted path and formatted for
//! display. Per-provider API usage is counted against configured quotas
//! with a rolling window reset. Widget list, theme and the usage map
//! persist as JSON blobs in a local SQLite key/value store.
//!
//! Typical embedding:
//!
//! ```no_run
//! use finboard::{db, Dashboard};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let pool = db::init(&db::default_data_dir()).await?;
//! let dashboard = Dashboard::open(pool).await?;
//!
//! for widget in dashboard.widgets() {
//!     let _state = dashboard.poller(&widget.id).unwrap().state();
//!     // render `_state.borrow()` with fields::resolve / fields::format_value
//! }
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod db;
pub mod fetcher;
pub mod fields;
pub mod models;

pub use crate::core::dashboard::Dashboard;
pub use crate::core::poller::{Phase, WidgetPoller, WidgetState};
pub use crate::core::rate_tracker::RateTracker;
pub use crate::fetcher::{ApiClient, FetchError, JsonSource};
pub use crate::models::{
    DashboardConfig, DisplayType, RateLimit, RatePeriod, RateUsageRecord, Theme, Widget,
    WidgetDraft,
};

/// Installs a global `tracing` subscriber honoring `RUST_LOG`. Embedders
/// that configure their own subscriber can skip this; calling it twice is
/// harmless.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
