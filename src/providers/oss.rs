//! Aliyun OSS bucket custom-domain (CNAME) certificate binding.
//!
//! Uses `PutBucketCname` with a `CertificateConfiguration` and the OSS v1
//! header signature: `Authorization: OSS <AccessKeyId>:<Signature>`.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use ring::hmac;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::{CnameBinding, ObjectStorage};
use crate::config::AccessKey;
use crate::errors::UpdateError;

const PROVIDER: &str = "alioss";
const CONTENT_TYPE: &str = "application/xml";

#[derive(Debug, Serialize)]
#[serde(rename = "BucketCnameConfiguration")]
struct BucketCnameConfiguration {
    #[serde(rename = "Cname")]
    cname: CnameXml,
}

#[derive(Debug, Serialize)]
struct CnameXml {
    #[serde(rename = "Domain")]
    domain: String,
    #[serde(rename = "CertificateConfiguration")]
    certificate_configuration: CertificateConfigurationXml,
}

#[derive(Debug, Serialize)]
struct CertificateConfigurationXml {
    #[serde(rename = "CertId")]
    cert_id: String,
    #[serde(rename = "Force")]
    force: bool,
}

#[derive(Debug, Deserialize)]
struct OssErrorBody {
    #[serde(rename = "Code")]
    code: String,
    #[serde(rename = "Message", default)]
    message: String,
}

/// XML body for a CNAME certificate binding
pub fn cname_body(binding: &CnameBinding) -> Result<String, UpdateError> {
    let document = BucketCnameConfiguration {
        cname: CnameXml {
            domain: binding.domain.clone(),
            certificate_configuration: CertificateConfigurationXml {
                cert_id: binding.cert_id.clone(),
                force: binding.force,
            },
        },
    };

    quick_xml::se::to_string(&document)
        .map_err(|e| UpdateError::provider(PROVIDER, format!("failed to encode CNAME request: {}", e)))
}

/// OSS v1 signature over the verb, content headers, date and canonical resource.
pub fn signature(
    secret: &str,
    verb: &str,
    content_md5: &str,
    content_type: &str,
    date: &str,
    canonical_resource: &str,
) -> String {
    let string_to_sign =
        format!("{}\n{}\n{}\n{}\n{}", verb, content_md5, content_type, date, canonical_resource);
    let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, secret.as_bytes());
    STANDARD.encode(hmac::sign(&key, string_to_sign.as_bytes()).as_ref())
}

/// Bucket client for one OSS endpoint.
#[derive(Debug, Clone)]
pub struct OssClient {
    http: reqwest::Client,
    endpoint: Url,
    credentials: AccessKey,
    path_style: bool,
}

impl OssClient {
    /// `endpoint` may omit the scheme (`oss-cn-hangzhou.aliyuncs.com`); HTTPS is assumed.
    pub fn new(
        http: reqwest::Client,
        endpoint: &str,
        credentials: AccessKey,
    ) -> Result<Self, UpdateError> {
        let endpoint = endpoint.trim();
        let with_scheme = if endpoint.contains("://") {
            endpoint.to_string()
        } else {
            format!("https://{}", endpoint)
        };

        let endpoint = Url::parse(&with_scheme).map_err(|e| {
            UpdateError::provider(PROVIDER, format!("invalid OSS endpoint '{}': {}", endpoint, e))
        })?;
        if endpoint.host_str().is_none() {
            return Err(UpdateError::provider(
                PROVIDER,
                format!("OSS endpoint '{}' has no host", with_scheme),
            ));
        }

        Ok(Self { http, endpoint, credentials, path_style: false })
    }

    /// Address the bucket as a path segment instead of a virtual host
    pub fn with_path_style(mut self, path_style: bool) -> Self {
        self.path_style = path_style;
        self
    }

    fn cname_url(&self, bucket: &str) -> String {
        let scheme = self.endpoint.scheme();
        let host = self.endpoint.host_str().unwrap_or_default();
        let authority = match self.endpoint.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        if self.path_style {
            format!("{}://{}/{}/?cname&comp=add", scheme, authority, bucket)
        } else {
            format!("{}://{}.{}/?cname&comp=add", scheme, bucket, authority)
        }
    }
}

#[async_trait]
impl ObjectStorage for OssClient {
    async fn bind_cname_certificate(
        &self,
        bucket: &str,
        binding: &CnameBinding,
    ) -> Result<(), UpdateError> {
        let body = cname_body(binding)?;
        let content_md5 = STANDARD.encode(md5::compute(body.as_bytes()).0);
        let date = Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string();
        let canonical_resource = format!("/{}/?cname&comp=add", bucket);
        let signature = signature(
            &self.credentials.secret,
            "PUT",
            &content_md5,
            CONTENT_TYPE,
            &date,
            &canonical_resource,
        );

        let url = self.cname_url(bucket);
        debug!(%url, domain = %binding.domain, cert_id = %binding.cert_id, "Binding OSS CNAME certificate");

        let response = self
            .http
            .put(&url)
            .header("Content-Type", CONTENT_TYPE)
            .header("Content-MD5", content_md5)
            .header("Date", date)
            .header("Authorization", format!("OSS {}:{}", self.credentials.id, signature))
            .body(body)
            .send()
            .await
            .map_err(|e| UpdateError::provider(PROVIDER, format!("PutBucketCname request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let text = response.text().await.unwrap_or_default();
        let message = match quick_xml::de::from_str::<OssErrorBody>(&text) {
            Ok(error) => format!(
                "PutBucketCname failed with status {}: {}: {}",
                status.as_u16(),
                error.code,
                error.message
            ),
            Err(_) => format!("PutBucketCname failed with status {}: {}", status.as_u16(), text),
        };
        Err(UpdateError::provider(PROVIDER, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials() -> AccessKey {
        AccessKey { id: "LTAI-oss".to_string(), secret: "oss-secret".to_string() }
    }

    fn binding() -> CnameBinding {
        CnameBinding {
            domain: "static.example.com".to_string(),
            cert_id: "12345-cn-hangzhou".to_string(),
            force: true,
        }
    }

    #[test]
    fn test_cname_body_layout() {
        let body = cname_body(&binding()).unwrap();
        assert_eq!(
            body,
            "<BucketCnameConfiguration><Cname><Domain>static.example.com</Domain>\
             <CertificateConfiguration><CertId>12345-cn-hangzhou</CertId><Force>true</Force>\
             </CertificateConfiguration></Cname></BucketCnameConfiguration>"
        );
    }

    #[test]
    fn test_signature_is_deterministic_and_keyed() {
        let a = signature("secret", "PUT", "md5", CONTENT_TYPE, "date", "/bucket/?cname&comp=add");
        let b = signature("secret", "PUT", "md5", CONTENT_TYPE, "date", "/bucket/?cname&comp=add");
        let c = signature("other", "PUT", "md5", CONTENT_TYPE, "date", "/bucket/?cname&comp=add");
        assert_eq!(a, b);
        assert_ne!(a, c);
        // HMAC-SHA1 is 20 bytes, 28 characters in base64
        assert_eq!(a.len(), 28);
    }

    #[test]
    fn test_endpoint_without_scheme_defaults_to_https() {
        let client =
            OssClient::new(reqwest::Client::new(), "oss-cn-hangzhou.aliyuncs.com", credentials())
                .unwrap();
        assert_eq!(
            client.cname_url("assets"),
            "https://assets.oss-cn-hangzhou.aliyuncs.com/?cname&comp=add"
        );
    }

    #[test]
    fn test_path_style_url() {
        let client = OssClient::new(reqwest::Client::new(), "http://127.0.0.1:9000", credentials())
            .unwrap()
            .with_path_style(true);
        assert_eq!(client.cname_url("assets"), "http://127.0.0.1:9000/assets/?cname&comp=add");
    }

    #[test]
    fn test_invalid_endpoint_is_rejected() {
        let err = OssClient::new(reqwest::Client::new(), "http://", credentials()).unwrap_err();
        assert!(matches!(err, UpdateError::Provider { provider: "alioss", .. }));
    }

    #[tokio::test]
    async fn test_bind_sends_signed_put() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/assets/"))
            .and(query_param("comp", "add"))
            .and(header_exists("Authorization"))
            .and(header_exists("Content-MD5"))
            .and(body_string_contains("<CertId>12345-cn-hangzhou</CertId>"))
            .and(body_string_contains("<Force>true</Force>"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = OssClient::new(reqwest::Client::new(), &server.uri(), credentials())
            .unwrap()
            .with_path_style(true);
        client.bind_cname_certificate("assets", &binding()).await.unwrap();
    }

    #[tokio::test]
    async fn test_bind_reports_oss_error_code() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(403).set_body_string(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
                 <Error><Code>SignatureDoesNotMatch</Code><Message>The request signature we calculated does not match.</Message></Error>",
            ))
            .mount(&server)
            .await;

        let client = OssClient::new(reqwest::Client::new(), &server.uri(), credentials())
            .unwrap()
            .with_path_style(true);
        let err = client.bind_cname_certificate("assets", &binding()).await.unwrap_err();
        assert!(err.to_string().contains("SignatureDoesNotMatch"));
        assert!(err.to_string().contains("403"));
    }
}
