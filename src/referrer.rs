//! Install-referrer attribution, resolved at most once per install
//!
//! The first successful pass stores a [`ReferrerData`] in the
//! [`ReferrerStore`]; every later call is answered from that record without
//! touching the network. A failed backend lookup is still recorded, so a
//! flaky backend cannot cause repeated lookups.

use std::sync::{Arc, LazyLock};

use chrono::Utc;
use parking_lot::Mutex;
use regex::Regex;

use crate::client::AttributionClient;
use crate::model::ReferrerData;
use crate::platform::{InstallReferrerClient, ReferrerSetup};
use crate::storage::{ReferrerStore, KEY_PROCESSED_AT, KEY_REFERRER_DATA};

static FP_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new("fp_id=([^&]+)").expect("valid regex"));
static DEEPLINK_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("deeplink_id=([^&]+)").expect("valid regex"));

/// Extracts `fp_id` and `deeplink_id` from a raw referrer string.
///
/// The first occurrence of each wins.
///
/// # Example
///
/// ```
/// # use deeplinknow::referrer::parse_referrer_string;
/// let (fp_id, deeplink_id) = parse_referrer_string("utm_source=ads&fp_id=abc123");
/// assert_eq!(fp_id.as_deref(), Some("abc123"));
/// assert_eq!(deeplink_id, None);
/// ```
pub fn parse_referrer_string(referrer: &str) -> (Option<String>, Option<String>) {
    let capture = |re: &Regex| {
        re.captures(referrer)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    };
    (capture(&FP_ID), capture(&DEEPLINK_ID))
}

/// Ends the install-referrer connection when dropped, including when the
/// owning future is cancelled mid-flight.
struct ConnectionGuard {
    client: Arc<dyn InstallReferrerClient>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.client.end_connection();
    }
}

pub struct ReferrerCache {
    store: ReferrerStore,
    api: Arc<AttributionClient>,
    install_referrer: Arc<dyn InstallReferrerClient>,
    cached: Mutex<Option<ReferrerData>>,
    processing: tokio::sync::Mutex<()>,
    enable_logs: bool,
}

impl ReferrerCache {
    pub fn new(
        store: ReferrerStore,
        api: Arc<AttributionClient>,
        install_referrer: Arc<dyn InstallReferrerClient>,
        enable_logs: bool,
    ) -> Self {
        Self {
            store,
            api,
            install_referrer,
            cached: Mutex::new(None),
            processing: tokio::sync::Mutex::new(()),
            enable_logs,
        }
    }

    /// True once a referrer has been processed on this install.
    pub fn has_processed(&self) -> bool {
        match self.store.contains(KEY_PROCESSED_AT) {
            Ok(processed) => processed,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read referrer store");
                false
            }
        }
    }

    /// The stored referrer result. Missing or unreadable records are `None`.
    pub fn get_cached(&self) -> Option<ReferrerData> {
        if let Some(data) = self.cached.lock().clone() {
            return Some(data);
        }

        let json = match self.store.get(KEY_REFERRER_DATA) {
            Ok(Some(json)) => json,
            Ok(None) => {
                crate::dln_debug!(self.enable_logs, "no cached referrer data");
                return None;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to read cached referrer data");
                return None;
            }
        };

        match serde_json::from_str::<ReferrerData>(&json) {
            Ok(data) => {
                *self.cached.lock() = Some(data.clone());
                Some(data)
            }
            Err(err) => {
                tracing::warn!(error = %err, "discarding unreadable referrer data");
                None
            }
        }
    }

    /// Persists `data` together with the processed marker.
    pub fn store(&self, data: &ReferrerData) {
        *self.cached.lock() = Some(data.clone());

        let json = match serde_json::to_string(data) {
            Ok(json) => json,
            Err(err) => {
                tracing::warn!(error = %err, "failed to serialize referrer data");
                return;
            }
        };
        let processed_at = data.processed_at.to_string();

        match self.store.put_all(&[
            (KEY_REFERRER_DATA, json.as_str()),
            (KEY_PROCESSED_AT, processed_at.as_str()),
        ]) {
            Ok(()) => crate::dln_debug!(self.enable_logs, "cached referrer data"),
            Err(err) => tracing::warn!(error = %err, "failed to cache referrer data"),
        }
    }

    /// Resolves the install referrer once and returns the stored result.
    ///
    /// # Flow
    ///
    /// 1. Already processed: return the cached record, no network call
    /// 2. Read the raw referrer from the platform; empty or unavailable stops here
    /// 3. Extract `fp_id` / `deeplink_id`; neither present stops here
    /// 4. Look the ids up on the backend and store the outcome, success or not
    pub async fn process(&self) -> Option<ReferrerData> {
        let _processing = self.processing.lock().await;

        if self.has_processed() {
            crate::dln_debug!(self.enable_logs, "install referrer already processed");
            return self.get_cached();
        }

        crate::dln_debug!(self.enable_logs, "processing install referrer");
        let referrer_string = match self.fetch_install_referrer().await {
            Some(referrer) if !referrer.is_empty() => referrer,
            _ => {
                crate::dln_debug!(self.enable_logs, "no install referrer found");
                return None;
            }
        };

        let (fp_id, deeplink_id) = parse_referrer_string(&referrer_string);
        crate::dln_debug!(self.enable_logs, ?fp_id, ?deeplink_id, "parsed install referrer");
        if fp_id.is_none() && deeplink_id.is_none() {
            crate::dln_debug!(self.enable_logs, "no referrer parameters found");
            return None;
        }

        let deeplink_data = self
            .api
            .lookup_referrer(fp_id.as_deref(), deeplink_id.as_deref())
            .await;

        let data = ReferrerData {
            referrer_string,
            fp_id,
            deeplink_id,
            deeplink_data,
            processed_at: Utc::now().timestamp_millis(),
        };
        self.store(&data);

        crate::dln_debug!(self.enable_logs, "install referrer processing complete");
        Some(data)
    }

    async fn fetch_install_referrer(&self) -> Option<String> {
        let _connection = ConnectionGuard {
            client: self.install_referrer.clone(),
        };

        match self.install_referrer.start_connection().await {
            ReferrerSetup::Ok => match self.install_referrer.install_referrer().await {
                Ok(referrer) => {
                    crate::dln_debug!(self.enable_logs, referrer = %referrer, "install referrer received");
                    Some(referrer)
                }
                Err(err) => {
                    tracing::warn!(error = %err, "failed to get install referrer");
                    None
                }
            },
            setup => {
                crate::dln_debug!(self.enable_logs, ?setup, "install referrer not available");
                None
            }
        }
    }
}
