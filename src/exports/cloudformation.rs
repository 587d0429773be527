//! # CloudFormation Exports
//!
//! [`ExportRegistry`] backed by the CloudFormation `ListExports` API.
//!
//! Credentials come from the AWS SDK default chain, which covers IRSA
//! (IAM Roles for Service Accounts) on EKS as well as static credentials.

use super::{Export, ExportPage, ExportRegistry, RegistryError};
use async_trait::async_trait;
use aws_sdk_cloudformation::Client as CloudFormationClient;
use tracing::{debug, info};

/// CloudFormation export registry
#[derive(Debug, Clone)]
pub struct CloudFormationExports {
    client: CloudFormationClient,
}

impl CloudFormationExports {
    /// Create a registry using the default AWS credential chain and region
    pub async fn from_env() -> Self {
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .load()
            .await;
        info!(
            "CloudFormation export registry initialized (region: {})",
            sdk_config
                .region()
                .map_or_else(|| "unset".to_string(), ToString::to_string)
        );
        Self {
            client: CloudFormationClient::new(&sdk_config),
        }
    }
}

#[async_trait]
impl ExportRegistry for CloudFormationExports {
    async fn list_exports(&self, next_token: Option<String>) -> Result<ExportPage, RegistryError> {
        let output = self
            .client
            .list_exports()
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| RegistryError(anyhow::Error::new(e)))?;

        let exports: Vec<Export> = output
            .exports()
            .iter()
            .filter_map(|export| {
                export.name().map(|name| Export {
                    name: name.to_string(),
                    value: export.value().map(str::to_string),
                })
            })
            .collect();

        debug!(count = exports.len(), "cloudformation.list_exports");

        Ok(ExportPage {
            exports,
            next_token: output.next_token().map(str::to_string),
        })
    }
}
