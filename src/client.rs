//! HTTP client for the DLN attribution API
//!
//! Every request carries the `x-api-key` header and a JSON content type.
//! Failures of any kind (transport, non-2xx status, malformed body) are
//! logged and surface as `None`. Each call is attempted exactly once.

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::SdkConfig;
use crate::error::ApiError;
use crate::model::{
    DeeplinkMatch, Fingerprint, InitRequest, InitResponse, MatchRequest, MatchResponse,
    ReferrerLookupResponse,
};

const API_KEY_HEADER: &str = "x-api-key";

/// HTTP client wrapper for the attribution API
///
/// Holds the base URL and API key; cheap to share behind an `Arc`.
pub struct AttributionClient {
    client: Client,
    base_url: String,
    api_key: String,
    enable_logs: bool,
}

impl AttributionClient {
    pub fn new(config: &SdkConfig) -> Self {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            enable_logs: config.enable_logs,
        }
    }

    /// `POST init`: app and account metadata, including custom domains.
    pub async fn init(&self) -> Option<InitResponse> {
        let body = InitRequest {
            api_key: &self.api_key,
        };
        let response = self.post_json::<_, InitResponse>("init", &body).await?;
        crate::dln_debug!(
            self.enable_logs,
            app_id = %response.app.id,
            custom_domains = response.app.custom_domains.len(),
            "init response received"
        );
        Some(response)
    }

    /// `POST match`: candidate clicks for this fingerprint.
    pub async fn find_deferred_user(&self, fingerprint: &Fingerprint) -> Option<MatchResponse> {
        let body = MatchRequest { fingerprint };
        crate::dln_debug!(self.enable_logs, ?fingerprint, "sending match request");
        let response = self.post_json::<_, MatchResponse>("match", &body).await?;
        crate::dln_debug!(
            self.enable_logs,
            matches = response.matches.len(),
            ttl_seconds = response.ttl_seconds,
            "match response received"
        );
        Some(response)
    }

    /// `GET referrer-lookup`: the deep link behind an install referrer.
    ///
    /// `fp_id` takes precedence when both ids are given. Returns `None` without
    /// a request when neither is given, and when the server reports
    /// `success: false`.
    pub async fn lookup_referrer(
        &self,
        fp_id: Option<&str>,
        deeplink_id: Option<&str>,
    ) -> Option<DeeplinkMatch> {
        let query = match (fp_id, deeplink_id) {
            (Some(fp_id), _) => ("fp_id", fp_id),
            (None, Some(deeplink_id)) => ("deeplink_id", deeplink_id),
            (None, None) => return None,
        };
        crate::dln_debug!(self.enable_logs, param = query.0, value = query.1, "looking up referrer");

        let request = self
            .client
            .get(self.endpoint("referrer-lookup"))
            .query(&[query]);
        let response = self
            .fetch::<ReferrerLookupResponse>("referrer-lookup", request)
            .await?;

        if response.success {
            crate::dln_debug!(self.enable_logs, deeplink = ?response.deeplink, "referrer lookup succeeded");
            response.deeplink
        } else {
            crate::dln_debug!(self.enable_logs, message = ?response.message, "referrer lookup found nothing");
            None
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(&self, endpoint: &str, body: &B) -> Option<T> {
        let body = match serde_json::to_vec(body) {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!(endpoint, error = %err, "failed to encode DLN API request");
                return None;
            }
        };
        let request = self.client.post(self.endpoint(endpoint)).body(body);
        self.fetch(endpoint, request).await
    }

    /// Sends the request once and absorbs any failure into `None`.
    async fn fetch<T: DeserializeOwned>(&self, endpoint: &str, request: RequestBuilder) -> Option<T> {
        match self.send(request).await {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(endpoint, error = %err, "DLN API request failed");
                None
            }
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request
            .header(API_KEY_HEADER, &self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;

        // Body is drained on every path, error statuses included
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::Status { status, body });
        }

        Ok(serde_json::from_str(&body)?)
    }
}
