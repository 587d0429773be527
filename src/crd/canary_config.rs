//! # Canary Config
//!
//! A Kayenta canary configuration. The document must carry an `id`.

use super::document::{free_form_schema, Document};
use super::status::SpinnakerResourceStatus;
use kube::CustomResource;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[kube(
    group = "spinnaker.kaidotdev.github.io",
    version = "v1",
    kind = "CanaryConfig",
    status = "SpinnakerResourceStatus",
    printcolumn = r#"{"name":"SPINNAKER-CANARY-CONFIG-NAME", "type":"string", "jsonPath":".status.spinnakerResource.name"}"#,
    printcolumn = r#"{"name":"SPINNAKER-CANARY-CONFIG-ID", "type":"string", "jsonPath":".status.spinnakerResource.id"}"#
)]
pub struct CanaryConfigSpec {
    #[serde(flatten)]
    pub document: Document,
}

free_form_schema!(CanaryConfigSpec);
