use handlebars::Handlebars;
use serde::Serialize;

use crate::content::ContentSnapshot;

use super::{FragmentKind, TemplateError, classify};

/// Outcome of one [`TemplateRegistry::register_all`] pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RegistrationReport {
    pub registered: usize,
    /// `(partial, reason)` for every fragment that did not compile.
    pub failed: Vec<(String, String)>,
}

/// Named partials compiled from the snapshot, plus strict-mode rendering.
///
/// A partial that fails to compile keeps its previous registration, if any;
/// one broken fragment never blocks the others.
pub struct TemplateRegistry {
    engine: Handlebars<'static>,
    prefix: String,
}

impl TemplateRegistry {
    pub fn new(prefix: impl Into<String>) -> Self {
        let mut engine = Handlebars::new();
        engine.set_strict_mode(true);
        Self {
            engine,
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Register every fragment key in `snapshot` as a partial.
    ///
    /// Safe to call repeatedly: each call replaces the partials it touches.
    pub fn register_all(&mut self, snapshot: &ContentSnapshot) -> RegistrationReport {
        let mut report = RegistrationReport::default();

        for (key, content) in snapshot.iter() {
            let FragmentKind::Partial { name } = classify(key, &self.prefix) else {
                continue;
            };

            match self.engine.register_partial(name, content) {
                Ok(()) => report.registered += 1,
                Err(e) => {
                    tracing::warn!("[templates] partial {name} does not compile: {e}");
                    report.failed.push((name.to_string(), e.to_string()));
                }
            }
        }

        crate::debug_event!(
            "templates",
            "registered",
            "{} partials, {} failed",
            report.registered,
            report.failed.len()
        );
        report
    }

    pub fn has_partial(&self, name: &str) -> bool {
        self.engine.has_template(name)
    }

    /// Compile and render `source` against `data` in strict mode.
    pub fn render_source<T: Serialize>(&self, source: &str, data: &T) -> Result<String, TemplateError> {
        Ok(self.engine.render_template(source, data)?)
    }
}

impl std::fmt::Debug for TemplateRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRegistry")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}
