//! Watch command: local template edits into the database.

use std::sync::Arc;
use std::time::Duration;

use crate::config::Settings;
use crate::events::EventBus;
use crate::io::IdleIndicator;
use crate::storage::{ContentStore, ContentSynchronizer, MongoStore};
use crate::watcher::DirectoryWatcher;

/// Connect to the database and persist every accepted edit until interrupted.
pub async fn run_watch(settings: &Settings) -> anyhow::Result<()> {
    let uri = settings.database.resolve_uri()?;
    let mongo = MongoStore::connect(&uri, &settings.database.name).await?;
    let store = Arc::new(mongo.content(&settings.database.content_collection));

    let bus = EventBus::default();
    let watcher = start_local_pipeline(settings, store, &bus)?;

    tokio::select! {
        result = watcher.run(bus.clone()) => result?,
        _ = tokio::signal::ctrl_c() => {
            crate::log_event!("watch", "stopped", "ctrl-c");
        }
    }
    Ok(())
}

/// Spawn the synchronizer and indicator, then build the directory watcher.
///
/// Subscribers are attached before the watcher exists so the first edit is
/// never missed.
pub fn start_local_pipeline(
    settings: &Settings,
    store: Arc<dyn ContentStore>,
    bus: &EventBus,
) -> anyhow::Result<DirectoryWatcher> {
    let synchronizer = ContentSynchronizer::new(store, bus.clone());
    tokio::spawn(synchronizer.run(bus.subscribe()));

    if settings.watch.indicator && IdleIndicator::enabled() {
        let indicator = IdleIndicator::new(Duration::from_millis(settings.watch.indicator_period_ms));
        tokio::spawn(indicator.run(bus.subscribe()));
    }

    let watcher = DirectoryWatcher::builder()
        .root(&settings.watch.root)
        .debounce_ms(settings.watch.debounce_ms)
        .build()?;

    crate::log_event!(
        "watch",
        "ready",
        "{} ({}ms window)",
        watcher.root().display(),
        settings.watch.debounce_ms
    );
    Ok(watcher)
}
