//! Certificate dispatcher
//!
//! Maps a resolved [`Project`] onto exactly one publishing strategy. Each
//! strategy overwrites whatever the target currently holds; re-running with
//! the same certificate converges to the same state.

use std::collections::BTreeMap;

use k8s_openapi::ByteString;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::{AliCdnTarget, AliOssTarget, ApisixTarget, K8sSecretTarget, Project, Target};
use crate::errors::UpdateError;
use crate::observability::Transcript;
use crate::providers::aliyun::percent_encode;
use crate::providers::apisix::SSL_RESOURCE_PATH;
use crate::providers::{CnameBinding, ProviderFactory, ServerCertificateRequest, SslPayload};
use crate::utils::{extract_dns_names, CertificateArtifact, CertificateNamer};

/// Secret data keys for TLS material
pub const TLS_CERT_KEY: &str = "tls.crt";
pub const TLS_PRIVATE_KEY_KEY: &str = "tls.key";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UploadUserCertificateBody {
    cert_id: Option<i64>,
}

/// Gateway admin URL for a project's SSL object.
///
/// The object id is the project name, query-escaped: RFC 3986 unreserved
/// characters are kept, spaces become `+` and everything else is `%XX`.
pub fn gateway_ssl_url(admin_url: &str, project_name: &str) -> String {
    let id = project_name.split(' ').map(percent_encode).collect::<Vec<_>>().join("+");
    format!("{}{}/{}", admin_url.trim_end_matches('/'), SSL_RESOURCE_PATH, id)
}

/// Certificate identifier bound to a bucket: `<id>-<region>`
pub fn oss_cert_id(cert_id: i64, region: &str) -> String {
    format!("{}-{}", cert_id, region)
}

pub struct CertificateDispatcher<F> {
    providers: F,
    namer: CertificateNamer,
}

impl<F: ProviderFactory> CertificateDispatcher<F> {
    pub fn new(providers: F, namer: CertificateNamer) -> Self {
        Self { providers, namer }
    }

    /// Publish the certificate/key pair to the project's target.
    pub async fn update_certificate(
        &self,
        project: &Project,
        artifact: &CertificateArtifact,
        transcript: &mut Transcript,
    ) -> Result<(), UpdateError> {
        let cert_name = self.namer.generate();
        transcript.info(format_args!("Generated certificate name: {}", cert_name));

        match &project.target {
            Target::AliCdn(target) => self.update_cdn(target, &cert_name, artifact, transcript).await,
            Target::AliOss(target) => {
                self.update_object_storage(target, &cert_name, artifact, transcript).await
            }
            Target::Apisix(target) => self.update_gateway(project, target, artifact, transcript).await,
            Target::K8sSecret(target) => self.update_cluster_secret(target, artifact, transcript).await,
        }
    }

    async fn update_cdn(
        &self,
        target: &AliCdnTarget,
        cert_name: &str,
        artifact: &CertificateArtifact,
        transcript: &mut Transcript,
    ) -> Result<(), UpdateError> {
        let client = self.providers.cdn(&target.credentials())?;

        let response = client
            .set_domain_server_certificate(&ServerCertificateRequest {
                domain_name: target.domain.clone(),
                cert_name: cert_name.to_string(),
                server_certificate_status: "on".to_string(),
                server_certificate: artifact.cert_pem(),
                private_key: artifact.key_pem(),
            })
            .await?;

        transcript.info(format_args!("Alicdn response: {}", response.trim()));
        Ok(())
    }

    async fn update_object_storage(
        &self,
        target: &AliOssTarget,
        cert_name: &str,
        artifact: &CertificateArtifact,
        transcript: &mut Transcript,
    ) -> Result<(), UpdateError> {
        let credentials = target.credentials();

        let cas = self.providers.certificate_service(&credentials)?;
        let reply =
            cas.upload_certificate(cert_name, &artifact.cert_pem(), &artifact.key_pem()).await?;
        if reply.status != 200 {
            return Err(UpdateError::provider(
                "cas",
                format!("CAS response error (status {}): {}", reply.status, reply.body),
            ));
        }

        let cert_id = serde_json::from_str::<UploadUserCertificateBody>(&reply.body)
            .ok()
            .and_then(|body| body.cert_id)
            .ok_or_else(|| {
                UpdateError::provider("cas", format!("CAS response has no CertId: {}", reply.body))
            })?;
        debug!(cert_id, cert_name, "Certificate uploaded to CAS");

        let storage = self.providers.object_storage(&credentials, &target.oss_endpoint)?;
        storage
            .bind_cname_certificate(
                &target.oss_bucket,
                &CnameBinding {
                    domain: target.domain.clone(),
                    cert_id: oss_cert_id(cert_id, &target.oss_region),
                    force: true,
                },
            )
            .await?;

        transcript.info("Certificate bound successfully to OSS");
        Ok(())
    }

    async fn update_gateway(
        &self,
        project: &Project,
        target: &ApisixTarget,
        artifact: &CertificateArtifact,
        transcript: &mut Transcript,
    ) -> Result<(), UpdateError> {
        let snis = extract_dns_names(&artifact.cert)?;
        debug!(?snis, "Extracted SNIs from certificate");

        let payload = SslPayload { cert: artifact.cert_pem(), key: artifact.key_pem(), snis };
        let url = gateway_ssl_url(&target.apisix_admin_url, &project.name);

        let gateway = self.providers.gateway()?;
        let reply = gateway.put_ssl(&url, &target.apisix_admin_key, &payload).await?;

        if reply.status != 200 && reply.status != 201 {
            return Err(UpdateError::provider(
                "apisix",
                format!("APISIX Admin API responded with status {}: {}", reply.status, reply.body),
            ));
        }

        transcript.info("Certificate updated successfully in APISIX");
        Ok(())
    }

    async fn update_cluster_secret(
        &self,
        target: &K8sSecretTarget,
        artifact: &CertificateArtifact,
        transcript: &mut Transcript,
    ) -> Result<(), UpdateError> {
        let namespace = &target.k8s_namespace;
        let name = &target.k8s_secret_name;

        let secrets = self.providers.cluster_secrets().await?;
        let mut secret = secrets.get_secret(namespace, name).await?;

        let data = secret.data.get_or_insert_with(BTreeMap::new);
        data.insert(TLS_CERT_KEY.to_string(), ByteString(artifact.cert.clone()));
        data.insert(TLS_PRIVATE_KEY_KEY.to_string(), ByteString(artifact.key.clone()));

        secrets.replace_secret(namespace, name, &secret).await?;

        info!(%namespace, %name, "Kubernetes secret replaced");
        transcript.info(format_args!(
            "Kubernetes secret '{}' in namespace '{}' updated successfully",
            name, namespace
        ));
        Ok(())
    }
}
