//! # Template Variable Resolution
//!
//! Expands `${...}` placeholders in pipeline template documents before they
//! are published. The only expression kind understood today is
//! `${ImportValue:<export name>}`, which is replaced by the value of the named
//! export from the [`ExportRegistry`]. Placeholders are expanded in object
//! keys as well as in string values. Other expressions pass through
//! untouched so Spinnaker's own templating (SpEL, Jinja) keeps working.
//!
//! Resolution is all-or-nothing: the first placeholder that cannot be resolved
//! fails the whole document.

use crate::crd::Document;
use crate::exports::{ExportRegistry, RegistryError};
use crate::observability::metrics;
use regex::{Captures, Regex};
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, LazyLock};
use thiserror::Error;
use tracing::{debug, warn};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([^}]+)\}").expect("placeholder pattern is valid - this should never happen")
});

const IMPORT_VALUE_PREFIX: &str = "ImportValue:";

#[derive(Debug, Error)]
pub enum ResolveError {
    /// The export does not exist (yet); retry after a delay
    #[error("export {name} not found")]
    NotFound { name: String },
    #[error("export {name} has no value")]
    MissingValue { name: String },
    #[error("failed to look up export {name}: {source}")]
    Registry {
        name: String,
        #[source]
        source: RegistryError,
    },
}

impl ResolveError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolveError::NotFound { .. })
    }
}

/// Resolves `${ImportValue:...}` placeholders against an export registry
#[derive(Clone)]
pub struct TemplateResolver {
    registry: Arc<dyn ExportRegistry>,
}

impl std::fmt::Debug for TemplateResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateResolver").finish_non_exhaustive()
    }
}

impl TemplateResolver {
    #[must_use]
    pub fn new(registry: Arc<dyn ExportRegistry>) -> Self {
        Self { registry }
    }

    /// Return a copy of `document` with every import placeholder substituted
    ///
    /// # Errors
    /// Returns [`ResolveError::NotFound`] when an export does not exist and
    /// other variants when the registry cannot be read
    pub async fn resolve(&self, document: &Document) -> Result<Document, ResolveError> {
        let mut names = BTreeSet::new();
        collect_map_imports(document, &mut names);
        if names.is_empty() {
            return Ok(document.clone());
        }

        let mut values = HashMap::with_capacity(names.len());
        for name in names {
            let value = self.lookup_export(&name).await?;
            values.insert(name, value);
        }

        Ok(substitute_map(document, &values))
    }

    /// Find the value of export `name`, walking every registry page if needed
    ///
    /// # Errors
    /// Returns [`ResolveError::NotFound`] if no page contains the export
    pub async fn lookup_export(&self, name: &str) -> Result<String, ResolveError> {
        let mut next_token = None;
        loop {
            let page = match self.registry.list_exports(next_token).await {
                Ok(page) => page,
                Err(source) => {
                    metrics::increment_export_lookups("error");
                    return Err(ResolveError::Registry {
                        name: name.to_string(),
                        source,
                    });
                }
            };

            if let Some(export) = page.exports.into_iter().find(|e| e.name == name) {
                metrics::increment_export_lookups("found");
                debug!(export = name, "export.resolved");
                return export.value.ok_or_else(|| ResolveError::MissingValue {
                    name: name.to_string(),
                });
            }

            match page.next_token {
                Some(token) if !token.is_empty() => next_token = Some(token),
                _ => break,
            }
        }

        metrics::increment_export_lookups("not_found");
        warn!(export = name, "export.not_found");
        Err(ResolveError::NotFound {
            name: name.to_string(),
        })
    }
}

fn import_name(expression: &str) -> Option<&str> {
    expression.strip_prefix(IMPORT_VALUE_PREFIX)
}

fn collect_text_imports(text: &str, names: &mut BTreeSet<String>) {
    for captures in PLACEHOLDER.captures_iter(text) {
        if let Some(name) = import_name(&captures[1]) {
            names.insert(name.to_string());
        }
    }
}

fn collect_map_imports(map: &Map<String, Value>, names: &mut BTreeSet<String>) {
    for (key, value) in map {
        collect_text_imports(key, names);
        collect_imports(value, names);
    }
}

fn collect_imports(value: &Value, names: &mut BTreeSet<String>) {
    match value {
        Value::String(text) => collect_text_imports(text, names),
        Value::Array(items) => items.iter().for_each(|item| collect_imports(item, names)),
        Value::Object(map) => collect_map_imports(map, names),
        _ => {}
    }
}

fn replace_imports(text: &str, values: &HashMap<String, String>) -> String {
    PLACEHOLDER
        .replace_all(text, |captures: &Captures| {
            import_name(&captures[1])
                .and_then(|name| values.get(name))
                .cloned()
                .unwrap_or_else(|| captures[0].to_string())
        })
        .into_owned()
}

fn substitute_map(map: &Map<String, Value>, values: &HashMap<String, String>) -> Map<String, Value> {
    map.iter()
        .map(|(key, v)| (replace_imports(key, values), substitute(v, values)))
        .collect()
}

fn substitute(value: &Value, values: &HashMap<String, String>) -> Value {
    match value {
        Value::String(text) => Value::String(replace_imports(text, values)),
        Value::Array(items) => Value::Array(items.iter().map(|v| substitute(v, values)).collect()),
        Value::Object(map) => Value::Object(substitute_map(map, values)),
        other => other.clone(),
    }
}
