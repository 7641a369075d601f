//! Recursive watcher over the template directory.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use notify::event::CreateKind;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::content::{ChangeEvent, file_key};
use crate::events::{EventBus, PipelineEvent};

use super::debouncer::{Admission, Clock, Debouncer, SystemClock};
use super::error::WatchError;

/// Raw notifications buffered between the notify thread and the event loop.
const NOTIFY_CHANNEL_CAPACITY: usize = 100;

/// Turns raw filesystem notifications under a root directory into
/// [`ChangeEvent`]s, one per physical save.
///
/// Notifications that cannot be read, read as empty, have no usable file key
/// or repeat content inside the debounce window are dropped. Nothing that
/// happens to a single file stops the watcher.
pub struct DirectoryWatcher<C: Clock = SystemClock> {
    root: PathBuf,
    debouncer: Debouncer<C>,
    /// Raw notifications from the notify backend thread.
    event_rx: mpsc::Receiver<notify::Result<Event>>,
    /// Paths from the current raw event not yet looked at.
    pending: VecDeque<PathBuf>,
    /// The underlying file watcher, kept alive while we read from it.
    _watcher: Option<notify::RecommendedWatcher>,
}

impl DirectoryWatcher<SystemClock> {
    pub fn builder() -> DirectoryWatcherBuilder {
        DirectoryWatcherBuilder::new()
    }
}

impl<C: Clock> DirectoryWatcher<C> {
    /// Build a watcher over an existing notification channel.
    ///
    /// Whoever owns the sending half decides what counts as a notification;
    /// the builder wires it to `notify`.
    pub fn from_receiver(
        root: PathBuf,
        event_rx: mpsc::Receiver<notify::Result<Event>>,
        debouncer: Debouncer<C>,
    ) -> Self {
        Self {
            root,
            debouncer,
            event_rx,
            pending: VecDeque::new(),
            _watcher: None,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Wait for the next accepted change.
    ///
    /// Returns `None` only when the notification source is gone.
    pub async fn next_change(&mut self) -> Option<ChangeEvent> {
        loop {
            while let Some(path) = self.pending.pop_front() {
                if let Some(change) = self.ingest(&path).await {
                    return Some(change);
                }
            }

            match self.event_rx.recv().await? {
                Ok(event) => {
                    if is_content_event(&event.kind) {
                        self.pending.extend(event.paths);
                    } else {
                        crate::debug_event!("watcher", "ignored", "{:?}", event.kind);
                    }
                }
                Err(e) => {
                    tracing::error!("[watcher] file watch error: {e}");
                }
            }
        }
    }

    /// Read `path` and turn it into a change if it passes every filter.
    pub async fn ingest(&mut self, path: &Path) -> Option<ChangeEvent> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("[watcher] failed to open {}: {e}", path.display());
                return None;
            }
        };

        if bytes.is_empty() {
            crate::debug_event!("watcher", "dropped", "empty read {}", path.display());
            return None;
        }

        let Some(key) = file_key(path) else {
            crate::debug_event!("watcher", "dropped", "no key for {}", path.display());
            return None;
        };

        match self.debouncer.admit(&key, &bytes) {
            Admission::Accepted => {
                let content = String::from_utf8_lossy(&bytes).into_owned();
                crate::log_event!("watcher", "accepted", "{key} ({} bytes)", bytes.len());
                Some(ChangeEvent::local(key, content))
            }
            Admission::Suppressed => {
                crate::debug_event!("watcher", "suppressed", "duplicate for {key}");
                None
            }
        }
    }

    /// Publish every accepted change until the notification source closes.
    pub async fn run(mut self, bus: EventBus) -> Result<(), WatchError> {
        crate::log_event!(
            "watcher",
            "started",
            "{} ({} ms debounce)",
            self.root.display(),
            self.debouncer.window().as_millis()
        );

        while let Some(change) = self.next_change().await {
            bus.publish(PipelineEvent::ContentChanged(change));
        }

        Err(WatchError::ChannelClosed)
    }
}

/// Raw event kinds that may carry new file content.
fn is_content_event(kind: &EventKind) -> bool {
    match kind {
        EventKind::Create(CreateKind::Folder) => false,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Any => true,
        EventKind::Access(_) | EventKind::Remove(_) | EventKind::Other => false,
    }
}

/// Builder for a [`DirectoryWatcher`] backed by `notify`.
pub struct DirectoryWatcherBuilder {
    root: Option<PathBuf>,
    debounce_ms: u64,
}

impl DirectoryWatcherBuilder {
    pub fn new() -> Self {
        Self {
            root: None,
            debounce_ms: 100,
        }
    }

    /// Directory to watch recursively.
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Set the debounce window in milliseconds.
    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.debounce_ms = ms;
        self
    }

    /// Build the watcher and start receiving notifications.
    pub fn build(self) -> Result<DirectoryWatcher, WatchError> {
        let root = self.root.ok_or_else(|| WatchError::InitFailed {
            reason: "Root directory is required".to_string(),
        })?;

        let (tx, rx) = mpsc::channel(NOTIFY_CHANNEL_CAPACITY);

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = tx.blocking_send(res);
        })?;

        watcher
            .watch(&root, RecursiveMode::Recursive)
            .map_err(|e| WatchError::PathWatchFailed {
                path: root.clone(),
                reason: e.to_string(),
            })?;

        crate::debug_event!("watcher", "watching", "{}", root.display());

        let mut directory_watcher =
            DirectoryWatcher::from_receiver(root, rx, Debouncer::new(self.debounce_ms));
        directory_watcher._watcher = Some(watcher);
        Ok(directory_watcher)
    }
}

impl Default for DirectoryWatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watcher::debouncer::ManualClock;
    use notify::event::{DataChange, ModifyKind, RemoveKind};
    use std::time::Duration;
    use tempfile::TempDir;

    fn manual_watcher() -> (
        DirectoryWatcher<ManualClock>,
        mpsc::Sender<notify::Result<Event>>,
        ManualClock,
        TempDir,
    ) {
        let dir = TempDir::new().unwrap();
        let (tx, rx) = mpsc::channel(16);
        let clock = ManualClock::new();
        let debouncer = Debouncer::with_clock(Duration::from_millis(100), clock.clone());
        let watcher = DirectoryWatcher::from_receiver(dir.path().to_path_buf(), rx, debouncer);
        (watcher, tx, clock, dir)
    }

    fn modify(path: &Path) -> notify::Result<Event> {
        Ok(Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path(path.to_path_buf()))
    }

    #[tokio::test]
    async fn test_ingest_derives_key_and_content() {
        let (mut watcher, _tx, _clock, dir) = manual_watcher();
        let path = dir.path().join("page.html");
        std::fs::write(&path, "<div>A</div>").unwrap();

        let change = watcher.ingest(&path).await.unwrap();
        assert_eq!(change.get("page"), Some("<div>A</div>"));
        assert_eq!(change.source(), crate::content::ChangeSource::Local);
    }

    #[tokio::test]
    async fn test_ingest_drops_empty_and_missing_files() {
        let (mut watcher, _tx, _clock, dir) = manual_watcher();
        let empty = dir.path().join("empty.html");
        std::fs::write(&empty, "").unwrap();

        assert!(watcher.ingest(&empty).await.is_none());
        assert!(watcher.ingest(&dir.path().join("gone.html")).await.is_none());
    }

    #[tokio::test]
    async fn test_next_change_skips_noise_until_a_real_save() {
        let (mut watcher, tx, clock, dir) = manual_watcher();
        let page = dir.path().join("page.html");
        std::fs::write(&page, "<div>A</div>").unwrap();

        tx.send(Ok(Event::new(EventKind::Remove(RemoveKind::File))
            .add_path(dir.path().join("old.html"))))
            .await
            .unwrap();
        tx.send(modify(&page)).await.unwrap();
        tx.send(modify(&page)).await.unwrap();

        let first = watcher.next_change().await.unwrap();
        assert_eq!(first.get("page"), Some("<div>A</div>"));

        // The duplicate is swallowed; a later save after the window gets through
        clock.advance(Duration::from_millis(150));
        std::fs::write(&page, "<div>B</div>").unwrap();
        tx.send(modify(&page)).await.unwrap();

        let second = watcher.next_change().await.unwrap();
        assert_eq!(second.get("page"), Some("<div>B</div>"));
    }

    #[tokio::test]
    async fn test_next_change_ends_when_source_closes() {
        let (mut watcher, tx, _clock, _dir) = manual_watcher();
        drop(tx);
        assert!(watcher.next_change().await.is_none());
    }

    #[test]
    fn test_content_event_kinds() {
        assert!(is_content_event(&EventKind::Modify(ModifyKind::Any)));
        assert!(is_content_event(&EventKind::Create(CreateKind::File)));
        assert!(!is_content_event(&EventKind::Create(CreateKind::Folder)));
        assert!(!is_content_event(&EventKind::Remove(RemoveKind::File)));
    }

    #[test]
    fn test_builder_requires_existing_root() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");

        let result = DirectoryWatcher::builder().root(&missing).build();
        assert!(matches!(result, Err(WatchError::PathWatchFailed { .. })));

        let result = DirectoryWatcher::builder().build();
        assert!(matches!(result, Err(WatchError::InitFailed { .. })));
    }
}
