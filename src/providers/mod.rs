//! External publishing backends.
//!
//! Every system a certificate can be pushed to sits behind a small capability
//! trait so the dispatcher only depends on the operations it needs:
//! - [`CdnClient`]: set a CDN domain's server certificate
//! - [`CertificateService`]: upload a certificate and obtain its identifier
//! - [`ObjectStorage`]: bind a certificate to a bucket's custom domain
//! - [`GatewayAdmin`]: register an SSL object with a gateway admin API
//! - [`ClusterSecrets`]: read and replace a Kubernetes secret
//!
//! Clients are built per project through a [`ProviderFactory`], because
//! credentials and endpoints are project settings. [`LiveProviders`] is the
//! production factory.
//!
//! # Security Considerations
//!
//! - Implementations MUST NOT log private keys or access key secrets
//! - Errors carry provider messages, never request bodies

pub mod aliyun;
pub mod apisix;
pub mod kubernetes;
pub mod oss;

use std::path::PathBuf;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use serde::{Deserialize, Serialize};

use crate::config::AccessKey;
use crate::errors::{Error, UpdateError};

pub use aliyun::{AliyunEndpoints, CasClient, CdnApiClient, RpcClient};
pub use apisix::ApisixAdminClient;
pub use kubernetes::KubeSecrets;
pub use oss::OssClient;

/// Raw HTTP reply for calls whose success criteria belong to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

/// Request to switch a CDN domain to a new server certificate.
#[derive(Clone, PartialEq, Eq)]
pub struct ServerCertificateRequest {
    pub domain_name: String,
    pub cert_name: String,
    pub server_certificate_status: String,
    pub server_certificate: String,
    pub private_key: String,
}

impl std::fmt::Debug for ServerCertificateRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerCertificateRequest")
            .field("domain_name", &self.domain_name)
            .field("cert_name", &self.cert_name)
            .field("server_certificate_status", &self.server_certificate_status)
            .finish_non_exhaustive()
    }
}

/// Certificate binding for a bucket custom domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CnameBinding {
    pub domain: String,
    pub cert_id: String,
    pub force: bool,
}

/// Body of a gateway SSL object.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SslPayload {
    pub cert: String,
    pub key: String,
    pub snis: Vec<String>,
}

impl std::fmt::Debug for SslPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SslPayload").field("snis", &self.snis).finish_non_exhaustive()
    }
}

#[async_trait]
pub trait CdnClient: Send + Sync {
    /// Set the domain's server certificate. Returns a short response summary for the report.
    async fn set_domain_server_certificate(
        &self,
        request: &ServerCertificateRequest,
    ) -> Result<String, UpdateError>;
}

#[async_trait]
pub trait CertificateService: Send + Sync {
    /// Upload a certificate under `name`.
    ///
    /// Transport failures are errors; the HTTP status and body are returned
    /// as-is so the caller can apply its own success criteria.
    async fn upload_certificate(
        &self,
        name: &str,
        cert: &str,
        key: &str,
    ) -> Result<HttpReply, UpdateError>;
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Attach a certificate to one of the bucket's custom domains.
    async fn bind_cname_certificate(
        &self,
        bucket: &str,
        binding: &CnameBinding,
    ) -> Result<(), UpdateError>;
}

#[async_trait]
pub trait GatewayAdmin: Send + Sync {
    /// PUT an SSL object to `url`, authenticating with `admin_key`.
    async fn put_ssl(
        &self,
        url: &str,
        admin_key: &str,
        payload: &SslPayload,
    ) -> Result<HttpReply, UpdateError>;
}

#[async_trait]
pub trait ClusterSecrets: Send + Sync {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret, UpdateError>;

    async fn replace_secret(
        &self,
        namespace: &str,
        name: &str,
        secret: &Secret,
    ) -> Result<(), UpdateError>;
}

/// Builds backend clients for one project.
#[async_trait]
pub trait ProviderFactory: Send + Sync {
    fn cdn(&self, credentials: &AccessKey) -> Result<Box<dyn CdnClient>, UpdateError>;

    fn certificate_service(
        &self,
        credentials: &AccessKey,
    ) -> Result<Box<dyn CertificateService>, UpdateError>;

    fn object_storage(
        &self,
        credentials: &AccessKey,
        endpoint: &str,
    ) -> Result<Box<dyn ObjectStorage>, UpdateError>;

    fn gateway(&self) -> Result<Box<dyn GatewayAdmin>, UpdateError>;

    async fn cluster_secrets(&self) -> Result<Box<dyn ClusterSecrets>, UpdateError>;
}

/// Production factory backed by `reqwest` and `kube`.
#[derive(Debug, Clone)]
pub struct LiveProviders {
    http: reqwest::Client,
    endpoints: AliyunEndpoints,
    kubeconfig: Option<PathBuf>,
}

impl LiveProviders {
    /// Create the factory. No request timeout is set; client defaults apply.
    pub fn new(kubeconfig: Option<PathBuf>) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::config_with_source("Failed to build HTTP client", e))?;

        Ok(Self { http, endpoints: AliyunEndpoints::default(), kubeconfig })
    }

    /// Shared HTTP client, also used for webhook delivery
    pub fn http_client(&self) -> &reqwest::Client {
        &self.http
    }

    /// Point the Aliyun RPC clients at different endpoints
    pub fn with_endpoints(mut self, endpoints: AliyunEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }
}

#[async_trait]
impl ProviderFactory for LiveProviders {
    fn cdn(&self, credentials: &AccessKey) -> Result<Box<dyn CdnClient>, UpdateError> {
        let rpc = RpcClient::new(
            self.http.clone(),
            &self.endpoints.cdn,
            aliyun::CDN_API_VERSION,
            credentials.clone(),
        );
        Ok(Box::new(CdnApiClient::new(rpc)))
    }

    fn certificate_service(
        &self,
        credentials: &AccessKey,
    ) -> Result<Box<dyn CertificateService>, UpdateError> {
        let rpc = RpcClient::new(
            self.http.clone(),
            &self.endpoints.cas,
            aliyun::CAS_API_VERSION,
            credentials.clone(),
        );
        Ok(Box::new(CasClient::new(rpc)))
    }

    fn object_storage(
        &self,
        credentials: &AccessKey,
        endpoint: &str,
    ) -> Result<Box<dyn ObjectStorage>, UpdateError> {
        let client = OssClient::new(self.http.clone(), endpoint, credentials.clone())?;
        Ok(Box::new(client))
    }

    fn gateway(&self) -> Result<Box<dyn GatewayAdmin>, UpdateError> {
        Ok(Box::new(ApisixAdminClient::new(self.http.clone())))
    }

    async fn cluster_secrets(&self) -> Result<Box<dyn ClusterSecrets>, UpdateError> {
        let client = KubeSecrets::connect(self.kubeconfig.as_deref()).await?;
        Ok(Box::new(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssl_payload_serializes_exact_fields() {
        let payload = SslPayload {
            cert: "CERT".to_string(),
            key: "KEY".to_string(),
            snis: vec!["a.example.com".to_string(), "b.example.com".to_string()],
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "cert": "CERT",
                "key": "KEY",
                "snis": ["a.example.com", "b.example.com"]
            })
        );
    }

    #[test]
    fn test_debug_output_hides_key_material() {
        let payload = SslPayload {
            cert: "CERT".to_string(),
            key: "PRIVATE".to_string(),
            snis: vec!["a.example.com".to_string()],
        };
        assert!(!format!("{:?}", payload).contains("PRIVATE"));

        let request = ServerCertificateRequest {
            domain_name: "cdn.example.com".to_string(),
            cert_name: "cert20240115103000.123".to_string(),
            server_certificate_status: "on".to_string(),
            server_certificate: "CERT".to_string(),
            private_key: "PRIVATE".to_string(),
        };
        let printed = format!("{:?}", request);
        assert!(printed.contains("cdn.example.com"));
        assert!(!printed.contains("PRIVATE"));
    }

    #[tokio::test]
    async fn test_live_factory_builds_http_clients() {
        let factory = LiveProviders::new(None).unwrap();
        let credentials = AccessKey { id: "id".to_string(), secret: "secret".to_string() };

        assert!(factory.cdn(&credentials).is_ok());
        assert!(factory.certificate_service(&credentials).is_ok());
        assert!(factory.object_storage(&credentials, "oss-cn-hangzhou.aliyuncs.com").is_ok());
        assert!(factory.gateway().is_ok());
    }
}
