//! Data models for the attribution SDK
//!
//! This module defines all the data structures exchanged with the DLN backend
//! and handed to the embedding application, including:
//! - The device fingerprint sent for deferred deep-link matching
//! - Match, init and referrer-lookup responses
//! - Resolved deep links and cached install-referrer results
//!
//! Every wire field is snake_case, which is also the Rust field naming, so no
//! renames are needed.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Platform tag carried in every fingerprint.
///
/// The backend only understands these two values.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
}

impl Platform {
    /// Wire representation (`"ios"` or `"android"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Ios => "ios",
            Platform::Android => "android",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Device and session signals sent to the matcher
///
/// Built fresh for every match request by
/// [`FingerprintBuilder`](crate::fingerprint::FingerprintBuilder) and never
/// persisted.
///
/// # Example
/// ```json
/// {
///   "user_agent": "Mozilla/5.0 (Linux; Android 14; Pixel 8) ...",
///   "platform": "android",
///   "os_version": "14",
///   "device_model": "Pixel 8",
///   "language": "en",
///   "timezone": "Europe/Berlin",
///   "installed_at": "2026-01-17T13:40:00Z",
///   "last_opened_at": "2026-01-17T13:42:10Z",
///   "advertising_id": "",
///   "vendor_id": "",
///   "hardware_fingerprint": "-3f2a91c",
///   "screen_width": 1080,
///   "screen_height": 2400,
///   "pixel_ratio": 2.625
/// }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Fingerprint {
    pub user_agent: String,

    pub platform: Platform,

    pub os_version: String,

    pub device_model: String,

    /// ISO 639 language code of the current locale
    pub language: String,

    /// IANA timezone identifier
    pub timezone: String,

    /// First launch in this process, `yyyy-MM-dd'T'HH:mm:ss'Z'`
    pub installed_at: String,

    /// Time of this fingerprint, `yyyy-MM-dd'T'HH:mm:ss'Z'`
    pub last_opened_at: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,

    /// Empty when the platform does not expose one
    #[serde(default)]
    pub advertising_id: String,

    /// Empty when the platform does not expose one
    #[serde(default)]
    pub vendor_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware_fingerprint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen_width: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen_height: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pixel_ratio: Option<f32>,
}

/// A deep link resolved by the backend
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DeeplinkMatch {
    pub id: String,

    /// Destination the app should open
    pub target_url: String,

    /// Arbitrary key/value data attached to the link by the dashboard
    #[serde(default)]
    pub metadata: Map<String, Value>,

    pub campaign_id: Option<String>,

    /// Kept as sent; the backend does not promise a single timestamp format
    #[serde(default)]
    pub matched_at: String,

    #[serde(default)]
    pub expires_at: String,
}

/// Score for a signal without sub-components (IP address)
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct MatchComponentDetails {
    pub matched: bool,
    pub score: f64,
}

/// Which device attributes agreed with the click
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct DeviceComponents {
    pub platform: bool,
    pub os_version: bool,
    pub device_model: bool,
    pub hardware_fingerprint: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct DeviceMatchDetails {
    pub matched: bool,
    pub score: f64,
    #[serde(default)]
    pub components: DeviceComponents,
}

/// Which locale attributes agreed with the click
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct LocaleComponents {
    pub language: bool,
    pub timezone: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct LocaleMatchDetails {
    pub matched: bool,
    pub score: f64,
    #[serde(default)]
    pub components: LocaleComponents,
}

/// How close the install was to the click in time
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TimeProximityDetails {
    pub score: f64,
    pub time_difference_minutes: i64,
}

/// Per-signal breakdown of a confidence score
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct MatchDetails {
    #[serde(default)]
    pub ip_match: MatchComponentDetails,

    #[serde(default)]
    pub device_match: DeviceMatchDetails,

    #[serde(default)]
    pub locale_match: LocaleMatchDetails,

    /// Only sent by newer backends
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_proximity: Option<TimeProximityDetails>,
}

/// A candidate click the matcher associated with this install
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Match {
    pub deeplink: Option<DeeplinkMatch>,

    /// Server-defined continuous scale; higher is stronger
    pub confidence_score: f64,

    #[serde(default)]
    pub match_details: MatchDetails,
}

/// Response of `POST match`
///
/// # Example
/// ```json
/// {
///   "matches": [
///     {
///       "deeplink": { "id": "dl_1", "target_url": "https://deeplinknow.com/p/1", ... },
///       "confidence_score": 87.5,
///       "match_details": { "ip_match": { "matched": true, "score": 40.0 }, ... }
///     }
///   ],
///   "ttl_seconds": 3600
/// }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MatchResponse {
    #[serde(default)]
    pub matches: Vec<Match>,

    pub ttl_seconds: u64,
}

impl MatchResponse {
    /// Match with the highest confidence score, if any.
    pub fn best_match(&self) -> Option<&Match> {
        self.matches
            .iter()
            .max_by(|a, b| a.confidence_score.total_cmp(&b.confidence_score))
    }
}

/// Custom domain configured for the app in the dashboard
///
/// Both fields are nullable on the wire; only entries with a domain and
/// `verified == true` are ever trusted.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct CustomDomain {
    pub domain: Option<String>,
    pub verified: Option<bool>,
}

/// App metadata from `init`
///
/// Only `custom_domains` drives behavior; every other field may be missing.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppInfo {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub timezone: String,
    pub android_package_name: Option<String>,
    pub android_sha256_cert: Option<String>,
    pub ios_bundle_id: Option<String>,
    pub ios_app_store_id: Option<String>,
    pub ios_app_prefix: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub custom_domains: Vec<CustomDomain>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct RateLimits {
    #[serde(deserialize_with = "null_as_default")]
    pub matches_per_second: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub matches_per_day: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AccountInfo {
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(deserialize_with = "null_as_default")]
    pub credits_remaining: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub rate_limits: RateLimits,
}

/// Response of `POST init`
///
/// Missing or `null` sections decode as empty so the verified domains are
/// never lost to incomplete account metadata.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct InitResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub app: AppInfo,

    #[serde(default)]
    pub account: Option<AccountInfo>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Request payload for `POST init`
#[derive(Serialize, Debug)]
pub struct InitRequest<'a> {
    pub api_key: &'a str,
}

/// Request payload for `POST match`
#[derive(Serialize, Debug)]
pub struct MatchRequest<'a> {
    pub fingerprint: &'a Fingerprint,
}

/// Response of `GET referrer-lookup`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReferrerLookupResponse {
    pub success: bool,
    pub deeplink: Option<DeeplinkMatch>,
    pub message: Option<String>,
}

/// Outcome of processing the install referrer, persisted once per install
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReferrerData {
    /// Raw referrer string handed over by the platform
    pub referrer_string: String,

    pub fp_id: Option<String>,

    pub deeplink_id: Option<String>,

    /// `None` when the lookup failed or found nothing
    pub deeplink_data: Option<DeeplinkMatch>,

    /// Epoch milliseconds
    pub processed_at: i64,
}

/// A deep link delivered to the app's [`DeepLinkCallback`](crate::DeepLinkCallback)
///
/// # Example
/// `https://deeplinknow.com/product/123?campaign=summer` becomes
/// ```json
/// { "route": "product/123", "params": { "campaign": "summer" } }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct DeepLinkData {
    /// Path without its leading slash
    pub route: String,

    pub params: HashMap<String, String>,
}

/// Result of [`parse_deep_link`](crate::link::parse_deep_link)
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDeepLink {
    /// Path as it appears in the URL, leading slash included
    pub path: String,

    pub params: HashMap<String, String>,
}

impl ParsedDeepLink {
    /// Convert into the callback payload, stripping one leading `/`.
    pub fn into_deep_link_data(self) -> DeepLinkData {
        let route = self
            .path
            .strip_prefix('/')
            .unwrap_or(&self.path)
            .to_string();
        DeepLinkData {
            route,
            params: self.params,
        }
    }
}
