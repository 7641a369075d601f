use std::path::PathBuf;
use std::sync::Arc;

use crate::config::TemplatesConfig;
use crate::members::{MemberStore, MemberWriter};
use crate::site::SharedSite;

/// Shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub site: SharedSite,
    pub members: Arc<dyn MemberStore>,
    pub member_writer: Arc<dyn MemberWriter>,
    /// Snapshot key of the landing page.
    pub index_key: String,
    /// Where pages are read from when the snapshot lacks them.
    pub fallback_dir: PathBuf,
}

impl AppState {
    pub fn new(
        site: SharedSite,
        members: Arc<dyn MemberStore>,
        member_writer: Arc<dyn MemberWriter>,
        templates: &TemplatesConfig,
    ) -> Self {
        Self {
            site,
            members,
            member_writer,
            index_key: templates.index_key.clone(),
            fallback_dir: templates.fallback_dir.clone(),
        }
    }
}
