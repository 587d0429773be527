//! # Kinds
//!
//! Remote handlers for each Spinnaker resource kind and the glue that lets the
//! generic reconcile entry point build them.

mod application;
mod canary_config;
mod pipeline;
mod pipeline_template;

pub use application::ApplicationHandler;
pub use canary_config::CanaryConfigHandler;
pub use pipeline::PipelineHandler;
pub use pipeline_template::PipelineTemplateHandler;

use super::lifecycle::RemoteHandler;
use super::types::Reconciler;
use crate::crd::{Application, CanaryConfig, Pipeline, PipelineTemplate, SpinnakerResource};
use kube::{Api, Client, ResourceExt};

/// A resource kind the controller knows how to reconcile
pub trait ManagedKind: SpinnakerResource {
    type Handler: RemoteHandler<Self>;

    fn handler(ctx: &Reconciler) -> Self::Handler;

    /// API handle scoped to where `resource` lives
    fn api(client: Client, resource: &Self) -> Api<Self>;
}

impl ManagedKind for Application {
    type Handler = ApplicationHandler;

    fn handler(ctx: &Reconciler) -> Self::Handler {
        ApplicationHandler::new(ctx.executor.clone())
    }

    fn api(client: Client, _: &Self) -> Api<Self> {
        Api::all(client)
    }
}

impl ManagedKind for PipelineTemplate {
    type Handler = PipelineTemplateHandler;

    fn handler(ctx: &Reconciler) -> Self::Handler {
        PipelineTemplateHandler::new(ctx.executor.clone(), ctx.resolver.clone())
    }

    fn api(client: Client, _: &Self) -> Api<Self> {
        Api::all(client)
    }
}

impl ManagedKind for Pipeline {
    type Handler = PipelineHandler;

    fn handler(ctx: &Reconciler) -> Self::Handler {
        PipelineHandler::new(ctx.executor.gate().clone())
    }

    fn api(client: Client, resource: &Self) -> Api<Self> {
        let namespace = resource.namespace().unwrap_or_else(|| "default".to_string());
        Api::namespaced(client, &namespace)
    }
}

impl ManagedKind for CanaryConfig {
    type Handler = CanaryConfigHandler;

    fn handler(ctx: &Reconciler) -> Self::Handler {
        CanaryConfigHandler::new(ctx.executor.gate().clone())
    }

    fn api(client: Client, _: &Self) -> Api<Self> {
        Api::all(client)
    }
}
