//! Database change stream listener.
//!
//! Edits made directly in the database (or by another instance) reach the
//! running site through here. Each notification becomes one
//! [`ChangeEvent`](crate::content::ChangeEvent) holding every field it touched,
//! tagged with a database source so the synchronizer never writes it back.

mod change;
mod listener;

pub use change::{ChangeKind, ChangeRecord};
pub use listener::{ChangeStreamListener, ListenerState};
