//! The dashboard engine: owns the widget list and theme, keeps them
//! persisted, runs one poller per widget, and fronts sample fetches for
//! the add-widget flow.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{bail, Result};
use serde_json::Value;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::core::poller::WidgetPoller;
use crate::core::rate_tracker::RateTracker;
use crate::db;
use crate::fetcher::{presets, ApiClient, FetchError, JsonSource};
use crate::models::{DashboardConfig, Theme, Widget, WidgetDraft, MIN_REFRESH_SECS};

pub struct Dashboard {
    pool: SqlitePool,
    source: Arc<dyn JsonSource>,
    tracker: RateTracker,
    widgets: Vec<Widget>,
    pollers: HashMap<String, WidgetPoller>,
    theme: Theme,
}

impl Dashboard {
    /// Opens the dashboard over an initialized store and starts a poller
    /// for every persisted widget.
    pub async fn open(pool: SqlitePool) -> Result<Self> {
        Self::with_source(pool, Arc::new(ApiClient::new())).await
    }

    /// Same as [`Dashboard::open`] with an injected JSON source; tests use
    /// this to substitute stubs for the network.
    pub async fn with_source(pool: SqlitePool, source: Arc<dyn JsonSource>) -> Result<Self> {
        let widgets = db::load_widgets(&pool).await?;
        let theme = db::load_theme(&pool).await?;

        let mut dashboard = Self {
            tracker: RateTracker::new(pool.clone()),
            pool,
            source,
            widgets: Vec::new(),
            pollers: HashMap::new(),
            theme,
        };

        tracing::info!(count = widgets.len(), "restoring persisted widgets");
        for widget in widgets {
            dashboard.start_poller(&widget);
            dashboard.widgets.push(widget);
        }

        Ok(dashboard)
    }

    pub fn widgets(&self) -> &[Widget] {
        &self.widgets
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub async fn set_theme(&mut self, theme: Theme) -> Result<()> {
        self.theme = theme;
        db::save_theme(&self.pool, theme).await
    }

    /// Validates a draft, assigns it an id, persists the updated list and
    /// starts polling. Returns the created widget.
    pub async fn add_widget(&mut self, draft: WidgetDraft) -> Result<Widget> {
        if draft.name.trim().is_empty() {
            bail!("widget name must not be empty");
        }
        if draft.api.trim().is_empty() {
            bail!("widget API URL must not be empty");
        }
        if draft.fields.is_empty() {
            bail!("select at least one field to display");
        }
        if draft.refresh < MIN_REFRESH_SECS {
            bail!("refresh interval must be at least {}s", MIN_REFRESH_SECS);
        }
        if draft.provider.is_some() != draft.rate_limit.is_some() {
            bail!("provider and rate limit must be set together");
        }

        let widget = Widget {
            id: Uuid::new_v4().to_string(),
            name: draft.name,
            api: draft.api,
            refresh: draft.refresh,
            fields: draft.fields,
            display_type: draft.display_type,
            provider: draft.provider,
            rate_limit: draft.rate_limit,
        };

        self.widgets.push(widget.clone());
        db::save_widgets(&self.pool, &self.widgets).await?;
        self.start_poller(&widget);

        tracing::info!(widget = %widget.name, id = %widget.id, "widget added");
        Ok(widget)
    }

    /// Stops the widget's poller and drops it from the persisted list.
    /// Returns whether anything was removed.
    pub async fn remove_widget(&mut self, id: &str) -> Result<bool> {
        self.pollers.remove(id);

        let before = self.widgets.len();
        self.widgets.retain(|w| w.id != id);
        if self.widgets.len() == before {
            return Ok(false);
        }

        db::save_widgets(&self.pool, &self.widgets).await?;
        tracing::info!(id, "widget removed");
        Ok(true)
    }

    /// Splice-reorder: the dragged widget is pulled out and re-inserted at
    /// the target's original position. Unknown ids are ignored.
    pub async fn move_widget(&mut self, dragged_id: &str, target_id: &str) -> Result<()> {
        if dragged_id == target_id {
            return Ok(());
        }

        let drag_index = self.widgets.iter().position(|w| w.id == dragged_id);
        let target_index = self.widgets.iter().position(|w| w.id == target_id);

        if let (Some(drag_index), Some(target_index)) = (drag_index, target_index) {
            let dragged = self.widgets.remove(drag_index);
            self.widgets.insert(target_index, dragged);
            db::save_widgets(&self.pool, &self.widgets).await?;
        }

        Ok(())
    }

    /// One-off sample fetch for field discovery. URLs that match a preset
    /// get a pre-flight quota check and count against the provider on
    /// success.
    pub async fn test_fetch(&self, url: &str) -> Result<Value> {
        let preset = presets::find_by_url(url);

        if let Some(preset) = preset {
            let remaining = self
                .tracker
                .remaining(preset.provider, preset.rate_limit.requests)
                .await?;
            if remaining == 0 {
                let reset_in = self.tracker.time_until_reset(preset.provider).await?;
                return Err(FetchError::RateLimited { reset_in }.into());
            }
        }

        let sample = self.source.fetch_json(url).await?;

        if let Some(preset) = preset {
            self.tracker
                .record_call(preset.provider, preset.rate_limit.period)
                .await?;
        }

        Ok(sample)
    }

    /// The exported configuration document, pretty-printed.
    pub fn export_config(&self) -> Result<String> {
        let config = DashboardConfig {
            widgets: self.widgets.clone(),
            theme: self.theme,
        };
        Ok(serde_json::to_string_pretty(&config)?)
    }

    pub fn poller(&self, id: &str) -> Option<&WidgetPoller> {
        self.pollers.get(id)
    }

    pub fn rate_tracker(&self) -> &RateTracker {
        &self.tracker
    }

    fn start_poller(&mut self, widget: &Widget) {
        let poller = WidgetPoller::spawn(
            widget.clone(),
            self.source.clone(),
            Some(self.tracker.clone()),
        );
        self.pollers.insert(widget.id.clone(), poller);
    }
}
