//! # Desired-State Documents
//!
//! The `spec` of every Spinnaker resource is an opaque JSON document that is
//! handed to Spinnaker as-is. The controller only reads the handful of
//! identifying fields it needs (`id`, `name`, `application`).

use serde_json::{Map, Value};

/// Opaque desired-state payload
pub type Document = Map<String, Value>;

/// Read a string field from a document
///
/// Returns `None` when the field is missing or not a non-empty string.
#[must_use]
pub fn string_field<'a>(document: &'a Document, field: &str) -> Option<&'a str> {
    document
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Implements `JsonSchema` for a spec struct that wraps a free-form [`Document`]
///
/// The generated CRD schema keeps every field the user writes
/// (`x-kubernetes-preserve-unknown-fields`).
macro_rules! free_form_schema {
    ($spec:ty) => {
        impl schemars::JsonSchema for $spec {
            fn inline_schema() -> bool {
                true
            }

            fn schema_name() -> std::borrow::Cow<'static, str> {
                stringify!($spec).into()
            }

            fn json_schema(_: &mut schemars::SchemaGenerator) -> schemars::Schema {
                schemars::json_schema!({
                    "type": "object",
                    "x-kubernetes-preserve-unknown-fields": true
                })
            }
        }
    };
}

pub(crate) use free_form_schema;
