//! Shared helpers for the integration tests
//!
//! Spins up an in-process axum server that mimics the DLN attribution API,
//! counts the requests it receives, and answers with scripted responses.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tempfile::NamedTempFile;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use deeplinknow::{PlatformServices, SdkConfig, StaticPlatform};

pub const API_KEY: &str = "test-api-key";

/// Scripted answer for one endpoint
#[derive(Clone)]
pub enum Reply {
    Json(StatusCode, Value),
    Raw(StatusCode, String),
}

impl Reply {
    fn into_response(self) -> Response {
        match self {
            Reply::Json(status, body) => (status, Json(body)).into_response(),
            Reply::Raw(status, body) => (status, body).into_response(),
        }
    }
}

/// State of the mock attribution API
pub struct MockApi {
    pub init_calls: AtomicUsize,
    pub match_calls: AtomicUsize,
    pub lookup_calls: AtomicUsize,
    pub init_reply: Mutex<Reply>,
    pub match_reply: Mutex<Reply>,
    pub lookup_reply: Mutex<Reply>,
    /// Delay before answering `init`, to observe the SDK mid-startup
    pub init_delay: Mutex<Duration>,
    /// `x-api-key` header of every request, in arrival order
    pub api_keys: Mutex<Vec<Option<String>>>,
    /// `content-type` header of every request, in arrival order
    pub content_types: Mutex<Vec<Option<String>>>,
    pub last_match_body: Mutex<Option<Value>>,
    pub last_init_body: Mutex<Option<Value>>,
    pub last_lookup_query: Mutex<Option<HashMap<String, String>>>,
}

impl Default for MockApi {
    fn default() -> Self {
        Self {
            init_calls: AtomicUsize::new(0),
            match_calls: AtomicUsize::new(0),
            lookup_calls: AtomicUsize::new(0),
            init_reply: Mutex::new(Reply::Json(StatusCode::OK, init_body(&[]))),
            match_reply: Mutex::new(Reply::Json(StatusCode::OK, match_body())),
            lookup_reply: Mutex::new(Reply::Json(StatusCode::OK, lookup_body(true))),
            init_delay: Mutex::new(Duration::ZERO),
            api_keys: Mutex::new(Vec::new()),
            content_types: Mutex::new(Vec::new()),
            last_match_body: Mutex::new(None),
            last_init_body: Mutex::new(None),
            last_lookup_query: Mutex::new(None),
        }
    }
}

impl MockApi {
    pub fn init_calls(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    pub fn match_calls(&self) -> usize {
        self.match_calls.load(Ordering::SeqCst)
    }

    pub fn lookup_calls(&self) -> usize {
        self.lookup_calls.load(Ordering::SeqCst)
    }

    fn record_headers(&self, headers: &HeaderMap) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };
        self.api_keys.lock().push(header("x-api-key"));
        self.content_types.lock().push(header("content-type"));
    }
}

async fn init_handler(
    State(api): State<Arc<MockApi>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    api.init_calls.fetch_add(1, Ordering::SeqCst);
    api.record_headers(&headers);
    *api.last_init_body.lock() = serde_json::from_str(&body).ok();

    let delay = *api.init_delay.lock();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let reply = api.init_reply.lock().clone();
    reply.into_response()
}

async fn match_handler(
    State(api): State<Arc<MockApi>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    api.match_calls.fetch_add(1, Ordering::SeqCst);
    api.record_headers(&headers);
    *api.last_match_body.lock() = serde_json::from_str(&body).ok();

    let reply = api.match_reply.lock().clone();
    reply.into_response()
}

async fn lookup_handler(
    State(api): State<Arc<MockApi>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    api.lookup_calls.fetch_add(1, Ordering::SeqCst);
    api.record_headers(&headers);
    *api.last_lookup_query.lock() = Some(query);

    let reply = api.lookup_reply.lock().clone();
    reply.into_response()
}

/// Starts the mock API on an ephemeral port and returns its base URL.
pub async fn spawn_mock_api(api: Arc<MockApi>) -> String {
    let app = Router::new()
        .route("/api/v1/sdk/init", post(init_handler))
        .route("/api/v1/sdk/match", post(match_handler))
        .route("/api/v1/sdk/referrer-lookup", get(lookup_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(api);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock API");
    let addr = listener.local_addr().expect("Failed to read mock API address");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Mock API crashed");
    });

    format!("http://{}/api/v1/sdk/", addr)
}

/// Base URL nothing listens on, for transport failures.
pub async fn unreachable_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/api/v1/sdk/", addr)
}

/// Config pointing at `base_url` with a fresh on-disk referrer store.
pub fn test_config(base_url: &str) -> (SdkConfig, NamedTempFile) {
    let temp_db = NamedTempFile::new().expect("Failed to create temp file");
    let config = SdkConfig::new(API_KEY)
        .with_api_base_url(base_url)
        .with_logs(true)
        .with_storage_path(temp_db.path())
        .with_request_timeout(Duration::from_secs(5));
    (config, temp_db)
}

pub fn platform_services(platform: &Arc<StaticPlatform>) -> PlatformServices {
    PlatformServices::from_shared(platform.clone())
}

pub fn deeplink_json(id: &str) -> Value {
    json!({
        "id": id,
        "target_url": format!("https://deeplinknow.com/product/{id}"),
        "metadata": { "source": "test" },
        "campaign_id": "summer",
        "matched_at": "2026-01-17T13:40:00Z",
        "expires_at": "2026-01-18T13:40:00Z"
    })
}

pub fn init_body(custom_domains: &[(&str, bool)]) -> Value {
    let domains: Vec<Value> = custom_domains
        .iter()
        .map(|(domain, verified)| json!({ "domain": domain, "verified": verified }))
        .collect();

    json!({
        "app": {
            "id": "app_1",
            "name": "Test App",
            "timezone": "UTC",
            "android_package_name": "com.example.app",
            "android_sha256_cert": null,
            "ios_bundle_id": null,
            "ios_app_store_id": null,
            "ios_app_prefix": null,
            "custom_domains": domains
        },
        "account": {
            "status": "active",
            "credits_remaining": 1000,
            "rate_limits": { "matches_per_second": 10, "matches_per_day": 10000 }
        }
    })
}

pub fn match_body() -> Value {
    json!({
        "matches": [
            {
                "deeplink": deeplink_json("dl_low"),
                "confidence_score": 42.0,
                "match_details": {
                    "ip_match": { "matched": false, "score": 0.0 },
                    "device_match": {
                        "matched": true,
                        "score": 30.0,
                        "components": {
                            "platform": true,
                            "os_version": true,
                            "device_model": false,
                            "hardware_fingerprint": false
                        }
                    },
                    "locale_match": {
                        "matched": true,
                        "score": 12.0,
                        "components": { "language": true, "timezone": true }
                    }
                }
            },
            {
                "deeplink": deeplink_json("dl_high"),
                "confidence_score": 91.5,
                "match_details": {
                    "ip_match": { "matched": true, "score": 40.0 },
                    "device_match": {
                        "matched": true,
                        "score": 35.0,
                        "components": {
                            "platform": true,
                            "os_version": true,
                            "device_model": true,
                            "hardware_fingerprint": true
                        }
                    },
                    "locale_match": {
                        "matched": true,
                        "score": 16.5,
                        "components": { "language": true, "timezone": true }
                    },
                    "time_proximity": { "score": 0.9, "time_difference_minutes": 3 }
                }
            }
        ],
        "ttl_seconds": 3600
    })
}

pub fn lookup_body(success: bool) -> Value {
    if success {
        json!({ "success": true, "deeplink": deeplink_json("dl_referrer"), "message": null })
    } else {
        json!({ "success": false, "deeplink": null, "message": "not found" })
    }
}
