//! # Project Model
//!
//! A project record as it appears in the configuration file ([`ProjectSpec`])
//! and its resolved form ([`Project`]), whose [`Target`] carries exactly the
//! fields the selected publishing mode needs.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::errors::UpdateError;

/// Publishing mechanism selected by a project's `mode` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Aliyun CDN domain server certificate
    AliCdn,
    /// Aliyun OSS custom domain bound through the certificate service
    AliOss,
    /// APISIX admin API SSL object
    Apisix,
    /// Kubernetes TLS secret
    K8sSecret,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::AliCdn, Mode::AliOss, Mode::Apisix, Mode::K8sSecret];

    /// Tag used in the configuration file
    pub const fn as_str(&self) -> &'static str {
        match self {
            Mode::AliCdn => "alicdn",
            Mode::AliOss => "alioss",
            Mode::Apisix => "apisix",
            Mode::K8sSecret => "k8s-secret",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = UpdateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| UpdateError::unsupported_mode(s))
    }
}

/// Raw project record exactly as written in the configuration file.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSpec {
    pub name: String,
    pub mode: String,
    pub access_key_id: String,
    pub access_key_secret: String,
    pub domain: String,
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
    pub oss_bucket: String,
    pub oss_endpoint: String,
    pub oss_region: String,
    pub apisix_admin_url: String,
    pub apisix_admin_key: String,
    pub k8s_namespace: String,
    pub k8s_secret_name: String,
}

/// Access key pair for Aliyun APIs.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessKey {
    pub id: String,
    pub secret: String,
}

impl fmt::Debug for AccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessKey").field("id", &self.id).field("secret", &REDACTED).finish()
    }
}

#[derive(Clone, PartialEq, Validate)]
pub struct AliCdnTarget {
    #[validate(length(min = 1))]
    pub access_key_id: String,
    #[validate(length(min = 1))]
    pub access_key_secret: String,
    #[validate(length(min = 1))]
    pub domain: String,
}

#[derive(Clone, PartialEq, Validate)]
pub struct AliOssTarget {
    #[validate(length(min = 1))]
    pub access_key_id: String,
    #[validate(length(min = 1))]
    pub access_key_secret: String,
    #[validate(length(min = 1))]
    pub domain: String,
    #[validate(length(min = 1))]
    pub oss_bucket: String,
    #[validate(length(min = 1))]
    pub oss_endpoint: String,
    #[validate(length(min = 1))]
    pub oss_region: String,
}

#[derive(Clone, PartialEq, Validate)]
pub struct ApisixTarget {
    #[validate(length(min = 1))]
    pub apisix_admin_url: String,
    #[validate(length(min = 1))]
    pub apisix_admin_key: String,
}

#[derive(Debug, Clone, PartialEq, Validate)]
pub struct K8sSecretTarget {
    #[validate(length(min = 1))]
    pub k8s_namespace: String,
    #[validate(length(min = 1))]
    pub k8s_secret_name: String,
}

const REDACTED: &str = "<redacted>";

impl fmt::Debug for ProjectSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectSpec")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &REDACTED)
            .field("domain", &self.domain)
            .field("cert_path", &self.cert_path)
            .field("key_path", &self.key_path)
            .field("oss_bucket", &self.oss_bucket)
            .field("oss_endpoint", &self.oss_endpoint)
            .field("oss_region", &self.oss_region)
            .field("apisix_admin_url", &self.apisix_admin_url)
            .field("apisix_admin_key", &REDACTED)
            .field("k8s_namespace", &self.k8s_namespace)
            .field("k8s_secret_name", &self.k8s_secret_name)
            .finish()
    }
}

impl fmt::Debug for AliCdnTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AliCdnTarget")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &REDACTED)
            .field("domain", &self.domain)
            .finish()
    }
}

impl fmt::Debug for AliOssTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AliOssTarget")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &REDACTED)
            .field("domain", &self.domain)
            .field("oss_bucket", &self.oss_bucket)
            .field("oss_endpoint", &self.oss_endpoint)
            .field("oss_region", &self.oss_region)
            .finish()
    }
}

impl fmt::Debug for ApisixTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApisixTarget")
            .field("apisix_admin_url", &self.apisix_admin_url)
            .field("apisix_admin_key", &REDACTED)
            .finish()
    }
}

impl AliCdnTarget {
    pub fn credentials(&self) -> AccessKey {
        AccessKey { id: self.access_key_id.clone(), secret: self.access_key_secret.clone() }
    }
}

impl AliOssTarget {
    pub fn credentials(&self) -> AccessKey {
        AccessKey { id: self.access_key_id.clone(), secret: self.access_key_secret.clone() }
    }
}

/// Mode-specific publishing target; one variant per [`Mode`].
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    AliCdn(AliCdnTarget),
    AliOss(AliOssTarget),
    Apisix(ApisixTarget),
    K8sSecret(K8sSecretTarget),
}

impl Target {
    pub fn mode(&self) -> Mode {
        match self {
            Target::AliCdn(_) => Mode::AliCdn,
            Target::AliOss(_) => Mode::AliOss,
            Target::Apisix(_) => Mode::Apisix,
            Target::K8sSecret(_) => Mode::K8sSecret,
        }
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        match self {
            Target::AliCdn(target) => target.validate(),
            Target::AliOss(target) => target.validate(),
            Target::Apisix(target) => target.validate(),
            Target::K8sSecret(target) => target.validate(),
        }
    }
}

/// A project whose mode-required fields have all been checked.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub name: String,
    pub domain: String,
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
    pub target: Target,
}

impl Project {
    pub fn mode(&self) -> Mode {
        self.target.mode()
    }
}

impl ProjectSpec {
    /// Resolve the raw record into a [`Project`].
    ///
    /// Fails with [`UpdateError::UnsupportedMode`] for unknown tags and with
    /// [`UpdateError::MissingConfig`] listing every empty field the mode requires.
    pub fn resolve(&self) -> Result<Project, UpdateError> {
        let mode: Mode = self.mode.parse()?;

        let target = match mode {
            Mode::AliCdn => Target::AliCdn(AliCdnTarget {
                access_key_id: self.access_key_id.clone(),
                access_key_secret: self.access_key_secret.clone(),
                domain: self.domain.clone(),
            }),
            Mode::AliOss => Target::AliOss(AliOssTarget {
                access_key_id: self.access_key_id.clone(),
                access_key_secret: self.access_key_secret.clone(),
                domain: self.domain.clone(),
                oss_bucket: self.oss_bucket.clone(),
                oss_endpoint: self.oss_endpoint.clone(),
                oss_region: self.oss_region.clone(),
            }),
            Mode::Apisix => Target::Apisix(ApisixTarget {
                apisix_admin_url: self.apisix_admin_url.clone(),
                apisix_admin_key: self.apisix_admin_key.clone(),
            }),
            Mode::K8sSecret => Target::K8sSecret(K8sSecretTarget {
                k8s_namespace: self.k8s_namespace.clone(),
                k8s_secret_name: self.k8s_secret_name.clone(),
            }),
        };

        target.validate().map_err(|errors| missing_fields(mode, &errors))?;

        Ok(Project {
            name: self.name.clone(),
            domain: self.domain.clone(),
            cert_path: self.cert_path.clone(),
            key_path: self.key_path.clone(),
            target,
        })
    }
}

fn missing_fields(mode: Mode, errors: &ValidationErrors) -> UpdateError {
    let mut fields: Vec<String> =
        errors.field_errors().keys().map(|field| field.to_string()).collect();
    fields.sort();
    UpdateError::missing_config(mode.as_str(), fields)
}
