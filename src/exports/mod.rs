//! # Export Registry
//!
//! Read-only access to externally exported values (CloudFormation stack
//! outputs) that pipeline templates can import by name.

mod cloudformation;

pub use cloudformation::CloudFormationExports;

use async_trait::async_trait;
use thiserror::Error;

/// A single exported value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub name: String,
    /// `None` when the registry lists the export without a value
    pub value: Option<String>,
}

/// One page of a paginated export listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportPage {
    pub exports: Vec<Export>,
    /// Token for the next page; `None` on the last page
    pub next_token: Option<String>,
}

/// Registry access fault (authentication, transport, ...)
#[derive(Debug, Error)]
#[error("failed to list exports: {0}")]
pub struct RegistryError(#[source] pub anyhow::Error);

/// Paginated source of exported values
#[async_trait]
pub trait ExportRegistry: Send + Sync {
    /// List one page of exports starting at `next_token`
    async fn list_exports(&self, next_token: Option<String>) -> Result<ExportPage, RegistryError>;
}
