//! # Pipeline
//!
//! A Spinnaker pipeline configuration. Spinnaker cannot update a pipeline in
//! place through this controller, so the pipeline is saved once.

use super::document::{free_form_schema, Document};
use super::status::SpinnakerResourceStatus;
use kube::CustomResource;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[kube(
    group = "spinnaker.kaidotdev.github.io",
    version = "v1",
    kind = "Pipeline",
    namespaced,
    status = "SpinnakerResourceStatus",
    printcolumn = r#"{"name":"SPINNAKER-APPLICATION", "type":"string", "jsonPath":".status.spinnakerResource.applicationName"}"#,
    printcolumn = r#"{"name":"SPINNAKER-PIPELINE-ID", "type":"string", "jsonPath":".status.spinnakerResource.id"}"#
)]
pub struct PipelineSpec {
    #[serde(flatten)]
    pub document: Document,
}

free_form_schema!(PipelineSpec);
