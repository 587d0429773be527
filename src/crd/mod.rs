//! # Custom Resource Definitions
//!
//! CRD types for the Spinnaker resources reconciled by this controller.
//!
//! ## Module Structure
//!
//! - `application.rs` - Spinnaker applications
//! - `pipeline.rs` - Spinnaker pipelines
//! - `pipeline_template.rs` - Managed pipeline templates
//! - `canary_config.rs` - Kayenta canary configs
//! - `status.rs` - Status shared by every kind
//! - `document.rs` - Free-form desired-state documents

mod application;
mod canary_config;
mod document;
mod pipeline;
mod pipeline_template;
mod status;

pub use application::{Application, ApplicationSpec};
pub use canary_config::{CanaryConfig, CanaryConfigSpec};
pub use document::{string_field, Document};
pub use pipeline::{Pipeline, PipelineSpec};
pub use pipeline_template::{PipelineTemplate, PipelineTemplateSpec};
pub use status::{Condition, SpinnakerResourceRef, SpinnakerResourceStatus};

use crate::constants::FINALIZER_NAME;
use kube::{Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Common view over every Spinnaker custom resource
///
/// Gives the reconciliation core access to the desired-state document, the
/// observed status and the deletion/finalizer bookkeeping without knowing
/// the concrete kind.
pub trait SpinnakerResource:
    Resource<DynamicType = ()>
    + Clone
    + std::fmt::Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    /// Kind name as registered with the API server
    const KIND: &'static str;

    /// Desired-state payload
    fn document(&self) -> &Document;

    /// Observed status, if the controller has written one
    fn observed(&self) -> Option<&SpinnakerResourceStatus>;

    /// Deletion has been requested (never reverts once set)
    fn deletion_requested(&self) -> bool {
        self.meta().deletion_timestamp.is_some()
    }

    /// Remote cleanup is still owed
    fn has_finalizer(&self) -> bool {
        self.finalizers().iter().any(|f| f == FINALIZER_NAME)
    }

    /// Hash recorded at the last completed apply (empty if never applied)
    fn last_hash(&self) -> &str {
        self.observed().map_or("", |s| s.hash.as_str())
    }

    /// `kind/namespace/name` key used for logs and backoff tracking
    fn resource_key(&self) -> String {
        match self.namespace() {
            Some(ns) => format!("{}/{}/{}", Self::KIND, ns, self.name_any()),
            None => format!("{}/{}", Self::KIND, self.name_any()),
        }
    }
}

macro_rules! spinnaker_resource {
    ($kind:ty, $name:literal) => {
        impl SpinnakerResource for $kind {
            const KIND: &'static str = $name;

            fn document(&self) -> &Document {
                &self.spec.document
            }

            fn observed(&self) -> Option<&SpinnakerResourceStatus> {
                self.status.as_ref()
            }
        }
    };
}

spinnaker_resource!(Application, "Application");
spinnaker_resource!(Pipeline, "Pipeline");
spinnaker_resource!(PipelineTemplate, "PipelineTemplate");
spinnaker_resource!(CanaryConfig, "CanaryConfig");
