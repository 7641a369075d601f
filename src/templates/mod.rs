//! Handlebars templates built from the content snapshot.

pub mod ids;
mod registry;

use std::path::PathBuf;

use thiserror::Error;

pub use ids::{element_id, page_context};
pub use registry::{RegistrationReport, TemplateRegistry};

/// How a content key takes part in rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind<'a> {
    /// Registered as a partial under `name`, usable as `{{> name}}`.
    Partial { name: &'a str },
    /// A whole page, rendered on request.
    Page,
}

/// Classify `key` against the fragment prefix.
///
/// Keys starting with `prefix` are partials named after the key itself. An
/// empty prefix marks nothing as a partial.
pub fn classify<'a>(key: &'a str, prefix: &str) -> FragmentKind<'a> {
    if !prefix.is_empty() && key.starts_with(prefix) {
        FragmentKind::Partial { name: key }
    } else {
        FragmentKind::Page
    }
}

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Cannot read template {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Template failed to render: {0}")]
    Render(#[from] handlebars::RenderError),
}
