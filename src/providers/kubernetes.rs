//! Kubernetes TLS secret access through `kube`.

use std::path::Path;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{Api, PostParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tracing::debug;

use super::ClusterSecrets;
use crate::errors::UpdateError;

const PROVIDER: &str = "k8s-secret";

/// Secret reader/writer for one cluster.
#[derive(Clone)]
pub struct KubeSecrets {
    client: Client,
}

impl KubeSecrets {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connect using an explicit kubeconfig, or the standard lookup
    /// (`KUBECONFIG`, `~/.kube/config`, in-cluster service account) when `None`.
    pub async fn connect(kubeconfig: Option<&Path>) -> Result<Self, UpdateError> {
        let client = match kubeconfig {
            Some(path) => {
                debug!(path = %path.display(), "Loading kubeconfig");
                let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
                    UpdateError::provider(
                        PROVIDER,
                        format!("failed to read kubeconfig {}: {}", path.display(), e),
                    )
                })?;
                let config =
                    Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                        .await
                        .map_err(|e| {
                            UpdateError::provider(PROVIDER, format!("failed to build kubeconfig: {}", e))
                        })?;
                Client::try_from(config).map_err(|e| {
                    UpdateError::provider(PROVIDER, format!("failed to create Kubernetes client: {}", e))
                })?
            }
            None => Client::try_default().await.map_err(|e| {
                UpdateError::provider(PROVIDER, format!("failed to create Kubernetes client: {}", e))
            })?,
        };

        Ok(Self::new(client))
    }
}

#[async_trait]
impl ClusterSecrets for KubeSecrets {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret, UpdateError> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        api.get(name).await.map_err(|e| {
            UpdateError::provider(PROVIDER, format!("failed to get Kubernetes secret: {}", e))
        })
    }

    async fn replace_secret(
        &self,
        namespace: &str,
        name: &str,
        secret: &Secret,
    ) -> Result<(), UpdateError> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        api.replace(name, &PostParams::default(), secret).await.map_err(|e| {
            UpdateError::provider(PROVIDER, format!("failed to update Kubernetes secret: {}", e))
        })?;
        Ok(())
    }
}
