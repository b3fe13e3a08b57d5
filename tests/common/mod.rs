//! Common test utilities for all integration tests.
//!
//! Provides throwaway certificate files and a recording provider factory.

#![allow(dead_code)]
#![allow(clippy::duplicate_mod)]

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use async_trait::async_trait;
use certpush::config::AccessKey;
use certpush::errors::UpdateError;
use certpush::providers::{
    ApisixAdminClient, CdnClient, CertificateService, ClusterSecrets, CnameBinding, GatewayAdmin,
    HttpReply, ObjectStorage, ProviderFactory, ServerCertificateRequest, SslPayload,
};
use k8s_openapi::api::core::v1::Secret;
use rcgen::generate_simple_self_signed;
use tempfile::TempDir;

/// Ephemeral certificate/key pair written to disk.
pub struct TestCertificateFiles {
    temp_dir: TempDir,
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
    pub cert_pem: String,
    pub key_pem: String,
}

impl TestCertificateFiles {
    /// Self-signed certificate whose SAN list is `names`, in that order.
    pub fn with_sans(names: &[&str]) -> anyhow::Result<Self> {
        let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        let certified = generate_simple_self_signed(names).context("build certificate")?;
        let temp_dir = TempDir::new().context("create temp dir")?;

        let cert_pem = certified.cert.pem();
        let key_pem = certified.key_pair.serialize_pem();

        let cert_path = temp_dir.path().join("fullchain.pem");
        let key_path = temp_dir.path().join("privkey.pem");
        fs::write(&cert_path, &cert_pem).context("write certificate")?;
        fs::write(&key_path, &key_pem).context("write private key")?;

        Ok(Self { temp_dir, cert_path, key_path, cert_pem, key_pem })
    }

    /// Path inside the temp dir that does not exist.
    pub fn missing_path(&self) -> PathBuf {
        self.temp_dir.path().join("does-not-exist.pem")
    }
}

/// One provider interaction observed by [`RecordingProviders`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Cdn { access_key_id: String, request: ServerCertificateRequest },
    CasUpload { access_key_id: String, name: String },
    OssBind { endpoint: String, bucket: String, binding: CnameBinding },
    GatewayPut { url: String, admin_key: String, snis: Vec<String> },
    SecretGet { namespace: String, name: String },
    SecretReplace { namespace: String, name: String, secret: Secret },
}

struct State {
    calls: Vec<Call>,
    cdn_failure: Option<String>,
    cas_reply: HttpReply,
    oss_failure: Option<String>,
    gateway_reply: HttpReply,
    gateway_http: Option<reqwest::Client>,
    secrets: BTreeMap<(String, String), Secret>,
}

/// Provider factory that records every call and answers from canned replies.
#[derive(Clone)]
pub struct RecordingProviders {
    state: Arc<Mutex<State>>,
}

impl Default for RecordingProviders {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                calls: Vec::new(),
                cdn_failure: None,
                cas_reply: HttpReply {
                    status: 200,
                    body: r#"{"CertId":12345,"RequestId":"req-1"}"#.to_string(),
                },
                oss_failure: None,
                gateway_reply: HttpReply { status: 200, body: "{}".to_string() },
                gateway_http: None,
                secrets: BTreeMap::new(),
            })),
        }
    }
}

impl RecordingProviders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn fail_cdn(self, message: &str) -> Self {
        self.state.lock().unwrap().cdn_failure = Some(message.to_string());
        self
    }

    pub fn cas_reply(self, status: u16, body: &str) -> Self {
        self.state.lock().unwrap().cas_reply = HttpReply { status, body: body.to_string() };
        self
    }

    pub fn fail_oss(self, message: &str) -> Self {
        self.state.lock().unwrap().oss_failure = Some(message.to_string());
        self
    }

    pub fn gateway_reply(self, status: u16, body: &str) -> Self {
        self.state.lock().unwrap().gateway_reply = HttpReply { status, body: body.to_string() };
        self
    }

    /// Send gateway PUTs over real HTTP instead of answering them locally.
    pub fn with_live_gateway(self) -> Self {
        self.state.lock().unwrap().gateway_http = Some(reqwest::Client::new());
        self
    }

    pub fn with_secret(self, namespace: &str, name: &str, secret: Secret) -> Self {
        self.state
            .lock()
            .unwrap()
            .secrets
            .insert((namespace.to_string(), name.to_string()), secret);
        self
    }

    pub fn secret(&self, namespace: &str, name: &str) -> Option<Secret> {
        self.state
            .lock()
            .unwrap()
            .secrets
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }
}

struct RecordingCdn {
    providers: RecordingProviders,
    access_key_id: String,
}

#[async_trait]
impl CdnClient for RecordingCdn {
    async fn set_domain_server_certificate(
        &self,
        request: &ServerCertificateRequest,
    ) -> Result<String, UpdateError> {
        self.providers.record(Call::Cdn {
            access_key_id: self.access_key_id.clone(),
            request: request.clone(),
        });
        match self.providers.state.lock().unwrap().cdn_failure.clone() {
            Some(message) => Err(UpdateError::provider("alicdn", message)),
            None => Ok(r#"{"RequestId":"cdn-req"}"#.to_string()),
        }
    }
}

struct RecordingCas {
    providers: RecordingProviders,
    access_key_id: String,
}

#[async_trait]
impl CertificateService for RecordingCas {
    async fn upload_certificate(
        &self,
        name: &str,
        _cert: &str,
        _key: &str,
    ) -> Result<HttpReply, UpdateError> {
        self.providers.record(Call::CasUpload {
            access_key_id: self.access_key_id.clone(),
            name: name.to_string(),
        });
        Ok(self.providers.state.lock().unwrap().cas_reply.clone())
    }
}

struct RecordingOss {
    providers: RecordingProviders,
    endpoint: String,
}

#[async_trait]
impl ObjectStorage for RecordingOss {
    async fn bind_cname_certificate(
        &self,
        bucket: &str,
        binding: &CnameBinding,
    ) -> Result<(), UpdateError> {
        self.providers.record(Call::OssBind {
            endpoint: self.endpoint.clone(),
            bucket: bucket.to_string(),
            binding: binding.clone(),
        });
        match self.providers.state.lock().unwrap().oss_failure.clone() {
            Some(message) => Err(UpdateError::provider("alioss", message)),
            None => Ok(()),
        }
    }
}

struct RecordingGateway {
    providers: RecordingProviders,
}

#[async_trait]
impl GatewayAdmin for RecordingGateway {
    async fn put_ssl(
        &self,
        url: &str,
        admin_key: &str,
        payload: &SslPayload,
    ) -> Result<HttpReply, UpdateError> {
        self.providers.record(Call::GatewayPut {
            url: url.to_string(),
            admin_key: admin_key.to_string(),
            snis: payload.snis.clone(),
        });

        let live = self.providers.state.lock().unwrap().gateway_http.clone();
        match live {
            Some(http) => ApisixAdminClient::new(http).put_ssl(url, admin_key, payload).await,
            None => Ok(self.providers.state.lock().unwrap().gateway_reply.clone()),
        }
    }
}

struct RecordingSecrets {
    providers: RecordingProviders,
}

#[async_trait]
impl ClusterSecrets for RecordingSecrets {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret, UpdateError> {
        self.providers
            .record(Call::SecretGet { namespace: namespace.to_string(), name: name.to_string() });
        self.providers.secret(namespace, name).ok_or_else(|| {
            UpdateError::provider(
                "k8s-secret",
                format!("secrets \"{}\" not found in namespace {}", name, namespace),
            )
        })
    }

    async fn replace_secret(
        &self,
        namespace: &str,
        name: &str,
        secret: &Secret,
    ) -> Result<(), UpdateError> {
        self.providers.record(Call::SecretReplace {
            namespace: namespace.to_string(),
            name: name.to_string(),
            secret: secret.clone(),
        });
        self.providers
            .state
            .lock()
            .unwrap()
            .secrets
            .insert((namespace.to_string(), name.to_string()), secret.clone());
        Ok(())
    }
}

#[async_trait]
impl ProviderFactory for RecordingProviders {
    fn cdn(&self, credentials: &AccessKey) -> Result<Box<dyn CdnClient>, UpdateError> {
        Ok(Box::new(RecordingCdn {
            providers: self.clone(),
            access_key_id: credentials.id.clone(),
        }))
    }

    fn certificate_service(
        &self,
        credentials: &AccessKey,
    ) -> Result<Box<dyn CertificateService>, UpdateError> {
        Ok(Box::new(RecordingCas {
            providers: self.clone(),
            access_key_id: credentials.id.clone(),
        }))
    }

    fn object_storage(
        &self,
        _credentials: &AccessKey,
        endpoint: &str,
    ) -> Result<Box<dyn ObjectStorage>, UpdateError> {
        Ok(Box::new(RecordingOss { providers: self.clone(), endpoint: endpoint.to_string() }))
    }

    fn gateway(&self) -> Result<Box<dyn GatewayAdmin>, UpdateError> {
        Ok(Box::new(RecordingGateway { providers: self.clone() }))
    }

    async fn cluster_secrets(&self) -> Result<Box<dyn ClusterSecrets>, UpdateError> {
        Ok(Box::new(RecordingSecrets { providers: self.clone() }))
    }
}
