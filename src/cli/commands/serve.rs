//! Serve command: the site plus the database change listener.

use std::sync::Arc;

use crate::config::Settings;
use crate::content::ContentSnapshot;
use crate::events::EventBus;
use crate::http::{self, AppState};
use crate::members::MemberRepository;
use crate::site::{Site, SiteUpdater};
use crate::storage::{ContentStore, MongoStore};
use crate::stream::ChangeStreamListener;
use crate::templates::TemplateRegistry;

use super::watch::start_local_pipeline;

pub async fn run_serve(settings: &Settings, watch: bool) -> anyhow::Result<()> {
    let uri = settings.database.resolve_uri()?;
    let mongo = MongoStore::connect(&uri, &settings.database.name).await?;
    let content = Arc::new(mongo.content(&settings.database.content_collection));
    let members = Arc::new(
        MemberRepository::open(mongo.collection(&settings.database.member_collection)).await?,
    );

    let snapshot = match content.load_all().await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!("[serve] failed to load content, starting empty: {e}");
            ContentSnapshot::new()
        }
    };
    let registry = TemplateRegistry::new(settings.templates.fragment_prefix.clone());
    let site = Site::new(snapshot, registry).shared();

    let bus = EventBus::default();
    let updater = SiteUpdater::new(site.clone()).with_store(content.clone());
    tokio::spawn(updater.run(bus.subscribe()));

    let listener = ChangeStreamListener::new(bus.clone());
    let collection = content.collection().clone();
    tokio::spawn(async move {
        let state = listener.run(collection).await;
        tracing::warn!("[stream] listener stopped ({state:?}), database edits no longer apply");
    });

    if watch {
        let watcher = start_local_pipeline(settings, content.clone(), &bus)?;
        let watcher_bus = bus.clone();
        tokio::spawn(async move {
            if let Err(e) = watcher.run(watcher_bus).await {
                tracing::error!("[watcher] stopped: {e}");
            }
        });
    }

    let state = AppState::new(site, members.clone(), members, &settings.templates);
    let router = http::router(state, &settings.server.static_dirs);
    http::serve(router, &settings.server.bind_address()).await
}
