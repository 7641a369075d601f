//! Live template editing for a database-backed site.
//!
//! Templates are edited as files, persisted into one aggregate MongoDB
//! document, and rendered from an in-memory snapshot that follows both local
//! edits and database change notifications.

pub mod cli;
pub mod config;
pub mod content;
pub mod events;
pub mod http;
pub mod io;
pub mod logging;
pub mod members;
pub mod site;
pub mod storage;
pub mod stream;
pub mod templates;
pub mod watcher;

pub use config::Settings;
pub use content::{ChangeEvent, ChangeSource, ContentSnapshot};
pub use events::{EventBus, PipelineEvent};
pub use site::{SharedSite, Site, SiteUpdater};
pub use storage::{ContentStore, ContentSynchronizer, MemoryContentStore, MongoStore};
pub use stream::{ChangeStreamListener, ListenerState};
pub use templates::TemplateRegistry;
pub use watcher::{Debouncer, DirectoryWatcher};
