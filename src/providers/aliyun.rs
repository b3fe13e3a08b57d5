//! Aliyun RPC-style API access (CDN and Certificate Management Service).
//!
//! Requests use signature version 1.0: parameters are sorted, RFC 3986
//! encoded, and signed with HMAC-SHA1 keyed by `"<AccessKeySecret>&"`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use ring::hmac;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use super::{CdnClient, CertificateService, HttpReply, ServerCertificateRequest};
use crate::config::AccessKey;
use crate::errors::UpdateError;

pub const CDN_API_VERSION: &str = "2018-05-10";
pub const CAS_API_VERSION: &str = "2020-04-07";

/// Everything except RFC 3986 unreserved characters is encoded.
const RPC_ENCODE_SET: &AsciiSet =
    &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// Service endpoints for the RPC clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliyunEndpoints {
    pub cdn: String,
    pub cas: String,
}

impl Default for AliyunEndpoints {
    fn default() -> Self {
        Self {
            cdn: "https://cdn.aliyuncs.com".to_string(),
            cas: "https://cas.aliyuncs.com".to_string(),
        }
    }
}

pub fn percent_encode(value: &str) -> String {
    utf8_percent_encode(value, RPC_ENCODE_SET).to_string()
}

/// Canonical string a request signature is computed over.
pub fn string_to_sign(method: &str, params: &BTreeMap<String, String>) -> String {
    let canonical = params
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    format!("{}&{}&{}", method, percent_encode("/"), percent_encode(&canonical))
}

/// Base64 HMAC-SHA1 signature of `string_to_sign`.
pub fn sign(string_to_sign: &str, access_key_secret: &str) -> String {
    let key = hmac::Key::new(
        hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY,
        format!("{}&", access_key_secret).as_bytes(),
    );
    STANDARD.encode(hmac::sign(&key, string_to_sign.as_bytes()).as_ref())
}

/// Error document returned by RPC APIs.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RpcErrorBody {
    code: Option<String>,
    message: Option<String>,
    request_id: Option<String>,
}

/// Signed RPC caller for one API product.
#[derive(Debug, Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    endpoint: String,
    version: &'static str,
    credentials: AccessKey,
}

impl RpcClient {
    pub fn new(
        http: reqwest::Client,
        endpoint: &str,
        version: &'static str,
        credentials: AccessKey,
    ) -> Self {
        Self { http, endpoint: endpoint.trim_end_matches('/').to_string(), version, credentials }
    }

    /// Public parameters shared by every call, without the signature.
    fn common_params(&self, action: &str) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        params.insert("Action".to_string(), action.to_string());
        params.insert("Format".to_string(), "JSON".to_string());
        params.insert("Version".to_string(), self.version.to_string());
        params.insert("AccessKeyId".to_string(), self.credentials.id.clone());
        params.insert("SignatureMethod".to_string(), "HMAC-SHA1".to_string());
        params.insert("SignatureVersion".to_string(), "1.0".to_string());
        params.insert("SignatureNonce".to_string(), Uuid::new_v4().to_string());
        params.insert(
            "Timestamp".to_string(),
            Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        );
        params
    }

    /// Sign and POST an action. Returns the raw reply whatever its status.
    pub async fn call(
        &self,
        provider: &'static str,
        action: &str,
        params: &[(&str, &str)],
    ) -> Result<HttpReply, UpdateError> {
        let mut form = self.common_params(action);
        for (key, value) in params {
            form.insert((*key).to_string(), (*value).to_string());
        }

        let signature = sign(&string_to_sign("POST", &form), &self.credentials.secret);
        form.insert("Signature".to_string(), signature);

        debug!(endpoint = %self.endpoint, action, "Calling Aliyun API");

        let response = self
            .http
            .post(format!("{}/", self.endpoint))
            .form(&form)
            .send()
            .await
            .map_err(|e| UpdateError::provider(provider, format!("{} request failed: {}", action, e)))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            UpdateError::provider(provider, format!("failed to read {} response: {}", action, e))
        })?;

        debug!(action, status, "Aliyun API responded");
        Ok(HttpReply { status, body })
    }
}

/// Turn a non-2xx RPC reply into a provider error with the API's code and message.
pub fn rpc_error(provider: &'static str, action: &str, reply: &HttpReply) -> UpdateError {
    match serde_json::from_str::<RpcErrorBody>(&reply.body) {
        Ok(RpcErrorBody { code: Some(code), message, request_id }) => {
            let mut message = format!(
                "{} failed with status {}: {}: {}",
                action,
                reply.status,
                code,
                message.unwrap_or_default()
            );
            if let Some(request_id) = request_id {
                message.push_str(&format!(" (RequestId: {})", request_id));
            }
            UpdateError::provider(provider, message)
        }
        _ => UpdateError::provider(
            provider,
            format!("{} failed with status {}: {}", action, reply.status, reply.body),
        ),
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// CDN `SetDomainServerCertificate` client
#[derive(Debug, Clone)]
pub struct CdnApiClient {
    rpc: RpcClient,
}

impl CdnApiClient {
    pub fn new(rpc: RpcClient) -> Self {
        Self { rpc }
    }
}

#[async_trait]
impl CdnClient for CdnApiClient {
    async fn set_domain_server_certificate(
        &self,
        request: &ServerCertificateRequest,
    ) -> Result<String, UpdateError> {
        const ACTION: &str = "SetDomainServerCertificate";

        let reply = self
            .rpc
            .call(
                "alicdn",
                ACTION,
                &[
                    ("DomainName", request.domain_name.as_str()),
                    ("CertName", request.cert_name.as_str()),
                    ("CertType", "upload"),
                    ("ServerCertificateStatus", request.server_certificate_status.as_str()),
                    ("ServerCertificate", request.server_certificate.as_str()),
                    ("PrivateKey", request.private_key.as_str()),
                ],
            )
            .await?;

        if !is_success(reply.status) {
            return Err(rpc_error("alicdn", ACTION, &reply));
        }

        Ok(reply.body)
    }
}

/// Certificate Management Service `UploadUserCertificate` client
#[derive(Debug, Clone)]
pub struct CasClient {
    rpc: RpcClient,
}

impl CasClient {
    pub fn new(rpc: RpcClient) -> Self {
        Self { rpc }
    }
}

#[async_trait]
impl CertificateService for CasClient {
    async fn upload_certificate(
        &self,
        name: &str,
        cert: &str,
        key: &str,
    ) -> Result<HttpReply, UpdateError> {
        self.rpc
            .call("cas", "UploadUserCertificate", &[("Name", name), ("Cert", cert), ("Key", key)])
            .await
    }
}
