//! Live-edit watcher for the template directory.
//!
//! # Architecture
//!
//! ```text
//! notify::RecommendedWatcher (own thread)
//!         | raw events (bounded mpsc)
//!         v
//! DirectoryWatcher
//!   - read file, drop empty reads
//!   - derive file key (page.html -> page)
//!   - Debouncer gate (per key, injectable clock)
//!         | PipelineEvent::ContentChanged
//!         v
//!     EventBus ---> ContentSynchronizer, SiteUpdater, IdleIndicator
//! ```

mod debouncer;
mod directory;
mod error;

pub use debouncer::{Admission, Clock, Debouncer, GateState, ManualClock, SystemClock};
pub use directory::{DirectoryWatcher, DirectoryWatcherBuilder};
pub use error::WatchError;
