//! # Kind Registry
//!
//! Static table of every resource kind the controller manages. The table
//! drives CRD generation and decides which controllers start.

use super::watch_loop::run_controller;
use crate::controller::reconciler::{ManagedKind, Reconciler};
use crate::crd::{Application, CanaryConfig, Pipeline, PipelineTemplate, SpinnakerResource};
use futures::future::{FutureExt, LocalBoxFuture};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::{Client, CustomResourceExt};
use std::sync::Arc;

/// One managed kind
pub struct KindRegistration {
    pub kind: &'static str,
    /// Generated CRD manifest
    pub crd: fn() -> CustomResourceDefinition,
    /// Runs the kind's controller until shutdown
    pub run: fn(Client, Arc<Reconciler>) -> LocalBoxFuture<'static, ()>,
}

impl std::fmt::Debug for KindRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KindRegistration")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

fn run_kind<K: ManagedKind>(client: Client, reconciler: Arc<Reconciler>) -> LocalBoxFuture<'static, ()> {
    run_controller::<K>(client, reconciler).boxed_local()
}

pub static KINDS: &[KindRegistration] = &[
    KindRegistration {
        kind: Application::KIND,
        crd: <Application as CustomResourceExt>::crd,
        run: run_kind::<Application>,
    },
    KindRegistration {
        kind: PipelineTemplate::KIND,
        crd: <PipelineTemplate as CustomResourceExt>::crd,
        run: run_kind::<PipelineTemplate>,
    },
    KindRegistration {
        kind: Pipeline::KIND,
        crd: <Pipeline as CustomResourceExt>::crd,
        run: run_kind::<Pipeline>,
    },
    KindRegistration {
        kind: CanaryConfig::KIND,
        crd: <CanaryConfig as CustomResourceExt>::crd,
        run: run_kind::<CanaryConfig>,
    },
];

/// Look up a registration by kind name (case-insensitive)
#[must_use]
pub fn find(kind: &str) -> Option<&'static KindRegistration> {
    KINDS.iter().find(|k| k.kind.eq_ignore_ascii_case(kind))
}
