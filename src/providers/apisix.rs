//! APISIX admin API client for SSL objects.

use async_trait::async_trait;
use tracing::{debug, trace};

use super::{GatewayAdmin, HttpReply, SslPayload};
use crate::errors::UpdateError;

/// Header carrying the admin key
pub const ADMIN_KEY_HEADER: &str = "X-API-KEY";

/// Path prefix of SSL objects on the admin API
pub const SSL_RESOURCE_PATH: &str = "/apisix/admin/ssls";

#[derive(Debug, Clone)]
pub struct ApisixAdminClient {
    http: reqwest::Client,
}

impl ApisixAdminClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl GatewayAdmin for ApisixAdminClient {
    async fn put_ssl(
        &self,
        url: &str,
        admin_key: &str,
        payload: &SslPayload,
    ) -> Result<HttpReply, UpdateError> {
        debug!(%url, snis = ?payload.snis, "PUT SSL object");

        let response = self
            .http
            .put(url)
            .header(ADMIN_KEY_HEADER, admin_key)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                UpdateError::provider(
                    "apisix",
                    format!("failed to send request to APISIX Admin API: {}", e),
                )
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_else(|_| "<unable to read body>".to_string());
        trace!(status, %body, "APISIX admin response");

        Ok(HttpReply { status, body })
    }
}
