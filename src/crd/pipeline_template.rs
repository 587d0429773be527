//! # Pipeline Template
//!
//! A managed pipeline template. String values may contain `${ImportValue:<export>}`
//! placeholders that are resolved against CloudFormation exports before publishing.

use super::document::{free_form_schema, Document};
use super::status::SpinnakerResourceStatus;
use kube::CustomResource;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[kube(
    group = "spinnaker.kaidotdev.github.io",
    version = "v1",
    kind = "PipelineTemplate",
    status = "SpinnakerResourceStatus",
    printcolumn = r#"{"name":"PHASE", "type":"string", "jsonPath":".status.phase"}"#
)]
pub struct PipelineTemplateSpec {
    #[serde(flatten)]
    pub document: Document,
}

free_form_schema!(PipelineTemplateSpec);
