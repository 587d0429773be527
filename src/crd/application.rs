//! # Application
//!
//! A Spinnaker application. The spec is the application document sent to
//! Spinnaker; its `name` is always overwritten with the resource name.
//!
//! # Example
//!
//! ```yaml
//! apiVersion: spinnaker.kaidotdev.github.io/v1
//! kind: Application
//! metadata:
//!   name: foo
//! spec:
//!   email: owner@example.com
//!   cloudProviders: kubernetes
//! ```

use super::document::{free_form_schema, Document};
use super::status::SpinnakerResourceStatus;
use kube::CustomResource;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[kube(
    group = "spinnaker.kaidotdev.github.io",
    version = "v1",
    kind = "Application",
    status = "SpinnakerResourceStatus",
    printcolumn = r#"{"name":"PHASE", "type":"string", "jsonPath":".status.phase"}"#
)]
pub struct ApplicationSpec {
    #[serde(flatten)]
    pub document: Document,
}

free_form_schema!(ApplicationSpec);
