//! Shared site state: the content snapshot and the partials compiled from it.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::content::{ChangeEvent, ChangeSource, ContentSnapshot};
use crate::events::PipelineEvent;
use crate::storage::ContentStore;
use crate::templates::{RegistrationReport, TemplateError, TemplateRegistry};

/// Snapshot and registry, always kept in step.
#[derive(Debug)]
pub struct Site {
    snapshot: ContentSnapshot,
    registry: TemplateRegistry,
}

pub type SharedSite = Arc<RwLock<Site>>;

impl Site {
    /// Build the site and register every partial the snapshot holds.
    pub fn new(snapshot: ContentSnapshot, mut registry: TemplateRegistry) -> Self {
        let report = registry.register_all(&snapshot);
        crate::log_event!(
            "site",
            "loaded",
            "{} keys, {} partials",
            snapshot.len(),
            report.registered
        );
        Self { snapshot, registry }
    }

    pub fn shared(self) -> SharedSite {
        Arc::new(RwLock::new(self))
    }

    pub fn snapshot(&self) -> &ContentSnapshot {
        &self.snapshot
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// Patch the snapshot with `change` and re-register all partials.
    pub fn apply(&mut self, change: &ChangeEvent) -> RegistrationReport {
        let changed = self.snapshot.apply(change);
        crate::debug_event!("site", "applied", "{changed} of {} keys changed", change.len());
        self.registry.register_all(&self.snapshot)
    }

    pub fn render<T: Serialize>(&self, source: &str, data: &T) -> Result<String, TemplateError> {
        self.registry.render_source(source, data)
    }
}

/// The single writer of a [`SharedSite`].
///
/// Applies every change from the bus, whatever its source. Readers hold the
/// read lock only while rendering. When the receiver lags behind the bus and
/// a store is attached, the whole document is reloaded and merged so no key
/// stays stale.
pub struct SiteUpdater {
    site: SharedSite,
    store: Option<Arc<dyn ContentStore>>,
}

impl SiteUpdater {
    pub fn new(site: SharedSite) -> Self {
        Self { site, store: None }
    }

    /// Reload from `store` after missed events.
    pub fn with_store(mut self, store: Arc<dyn ContentStore>) -> Self {
        self.store = Some(store);
        self
    }

    async fn resync(&self) {
        let Some(store) = &self.store else {
            return;
        };
        match store.load_all().await {
            Ok(snapshot) => {
                let change = ChangeEvent::from_entries(snapshot.iter(), ChangeSource::Database);
                let report = self.site.write().await.apply(&change);
                crate::log_event!("site", "resynced", "{} keys reloaded", change.len());
                for (name, reason) in report.failed {
                    tracing::warn!("[site] keeping previous {name}: {reason}");
                }
            }
            Err(e) => tracing::error!("[site] reload after lag failed: {e}"),
        }
    }

    pub async fn run(self, mut events: broadcast::Receiver<PipelineEvent>) {
        loop {
            match events.recv().await {
                Ok(PipelineEvent::ContentChanged(change)) => {
                    let report = self.site.write().await.apply(&change);
                    let keys: Vec<&str> = change.keys().collect();
                    crate::log_event!("site", "updated", "{}", keys.join(", "));
                    for (name, reason) in report.failed {
                        tracing::warn!("[site] keeping previous {name}: {reason}");
                    }
                }
                Ok(PipelineEvent::ContentPersisted) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("[site] fell behind, {skipped} events lost");
                    self.resync().await;
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}
