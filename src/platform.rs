//! Platform collaborators
//!
//! The SDK never talks to the operating system directly. Hosts hand it
//! implementations of these traits, bundled in [`PlatformServices`]. A
//! headless [`StaticPlatform`] covers desktop hosts, the `dln` probe and tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::{distr::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};

use crate::error::PlatformError;
use crate::model::Platform;

/// Raw display metrics as reported by the platform.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct DisplayMetrics {
    pub width_pixels: u32,
    pub height_pixels: u32,
    /// Physical pixels per density-independent pixel
    pub density: f32,
    /// Screen width in density-independent pixels
    pub width_dp: u32,
    /// Screen height in density-independent pixels
    pub height_dp: u32,
}

impl Default for DisplayMetrics {
    fn default() -> Self {
        Self {
            width_pixels: 1080,
            height_pixels: 2400,
            density: 2.625,
            width_dp: 411,
            height_dp: 914,
        }
    }
}

/// Device, locale and display information used to build fingerprints.
pub trait DeviceInfo: Send + Sync {
    fn platform(&self) -> Platform;

    fn os_version(&self) -> String;

    fn device_model(&self) -> String;

    fn language(&self) -> String;

    fn timezone(&self) -> String;

    /// Stable per-device identifier, if the platform exposes one.
    fn device_id(&self) -> Option<String>;

    fn advertising_id(&self) -> Option<String> {
        None
    }

    fn vendor_id(&self) -> Option<String> {
        None
    }

    fn display_metrics(&self) -> DisplayMetrics;

    /// Browser-like user agent the matcher compares against click records.
    fn user_agent(&self) -> String {
        let os = self.os_version();
        let model = self.device_model();
        match self.platform() {
            Platform::Android => format!(
                "Mozilla/5.0 (Linux; Android {os}; {model}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.120 Mobile Safari/537.36"
            ),
            Platform::Ios => format!(
                "Mozilla/5.0 ({model}; CPU iPhone OS {} like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Mobile/15E148",
                os.replace('.', "_")
            ),
        }
    }
}

/// Read access to the system clipboard.
#[async_trait]
pub trait ClipboardService: Send + Sync {
    /// Current plain-text content; `Ok(None)` when the clipboard is empty.
    async fn read_text(&self) -> Result<Option<String>, PlatformError>;
}

/// Outcome of connecting to the install-referrer service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferrerSetup {
    Ok,
    FeatureNotSupported,
    ServiceUnavailable,
    Disconnected,
    /// Any other platform response code
    Other(i32),
}

/// Connection-oriented install-referrer service.
///
/// Every `start_connection` is paired with exactly one `end_connection`, on
/// success, failure and cancellation alike.
#[async_trait]
pub trait InstallReferrerClient: Send + Sync {
    async fn start_connection(&self) -> ReferrerSetup;

    /// Raw referrer string; only valid after a successful `start_connection`.
    async fn install_referrer(&self) -> Result<String, PlatformError>;

    fn end_connection(&self);
}

/// The platform collaborators a service is built with.
#[derive(Clone)]
pub struct PlatformServices {
    pub device: Arc<dyn DeviceInfo>,
    pub clipboard: Arc<dyn ClipboardService>,
    pub install_referrer: Arc<dyn InstallReferrerClient>,
}

impl PlatformServices {
    /// Use one object for all three collaborators.
    pub fn from_shared<P>(platform: Arc<P>) -> Self
    where
        P: DeviceInfo + ClipboardService + InstallReferrerClient + 'static,
    {
        Self {
            device: platform.clone(),
            clipboard: platform.clone(),
            install_referrer: platform,
        }
    }
}

/// Static description of a device for [`StaticPlatform`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DeviceProfile {
    pub platform: Platform,
    pub os_version: String,
    pub device_model: String,
    pub language: String,
    pub timezone: String,
    pub device_id: Option<String>,
    pub advertising_id: Option<String>,
    pub vendor_id: Option<String>,
    pub display: DisplayMetrics,
}

impl Default for DeviceProfile {
    /// An Android phone with a random 16-character device id.
    fn default() -> Self {
        let device_id: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(16)
            .map(char::from)
            .collect();

        Self {
            platform: Platform::Android,
            os_version: "14".to_string(),
            device_model: "Pixel 8".to_string(),
            language: "en".to_string(),
            timezone: "UTC".to_string(),
            device_id: Some(device_id.to_lowercase()),
            advertising_id: None,
            vendor_id: None,
            display: DisplayMetrics::default(),
        }
    }
}

/// What the install-referrer service of a [`StaticPlatform`] answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaticReferrer {
    Available(String),
    Unavailable(ReferrerSetup),
    /// Connects but fails to return the referrer
    Failing(String),
}

/// In-process platform with settable clipboard and install referrer
///
/// Counts install-referrer connections so callers can verify that every
/// connection is released.
#[derive(Debug)]
pub struct StaticPlatform {
    profile: DeviceProfile,
    clipboard: Mutex<Option<String>>,
    referrer: Mutex<StaticReferrer>,
    connections_started: AtomicUsize,
    connections_ended: AtomicUsize,
}

impl StaticPlatform {
    pub fn new(profile: DeviceProfile) -> Self {
        Self {
            profile,
            clipboard: Mutex::new(None),
            referrer: Mutex::new(StaticReferrer::Unavailable(ReferrerSetup::FeatureNotSupported)),
            connections_started: AtomicUsize::new(0),
            connections_ended: AtomicUsize::new(0),
        }
    }

    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    pub fn set_clipboard(&self, text: Option<&str>) {
        *self.clipboard.lock() = text.map(str::to_string);
    }

    pub fn set_install_referrer(&self, referrer: StaticReferrer) {
        *self.referrer.lock() = referrer;
    }

    pub fn connections_started(&self) -> usize {
        self.connections_started.load(Ordering::SeqCst)
    }

    pub fn connections_ended(&self) -> usize {
        self.connections_ended.load(Ordering::SeqCst)
    }
}

impl Default for StaticPlatform {
    fn default() -> Self {
        Self::new(DeviceProfile::default())
    }
}

impl DeviceInfo for StaticPlatform {
    fn platform(&self) -> Platform {
        self.profile.platform
    }

    fn os_version(&self) -> String {
        self.profile.os_version.clone()
    }

    fn device_model(&self) -> String {
        self.profile.device_model.clone()
    }

    fn language(&self) -> String {
        self.profile.language.clone()
    }

    fn timezone(&self) -> String {
        self.profile.timezone.clone()
    }

    fn device_id(&self) -> Option<String> {
        self.profile.device_id.clone()
    }

    fn advertising_id(&self) -> Option<String> {
        self.profile.advertising_id.clone()
    }

    fn vendor_id(&self) -> Option<String> {
        self.profile.vendor_id.clone()
    }

    fn display_metrics(&self) -> DisplayMetrics {
        self.profile.display
    }
}

#[async_trait]
impl ClipboardService for StaticPlatform {
    async fn read_text(&self) -> Result<Option<String>, PlatformError> {
        Ok(self.clipboard.lock().clone())
    }
}

#[async_trait]
impl InstallReferrerClient for StaticPlatform {
    async fn start_connection(&self) -> ReferrerSetup {
        self.connections_started.fetch_add(1, Ordering::SeqCst);
        match &*self.referrer.lock() {
            StaticReferrer::Unavailable(setup) => *setup,
            _ => ReferrerSetup::Ok,
        }
    }

    async fn install_referrer(&self) -> Result<String, PlatformError> {
        match &*self.referrer.lock() {
            StaticReferrer::Available(referrer) => Ok(referrer.clone()),
            StaticReferrer::Failing(reason) => Err(PlatformError(reason.clone())),
            StaticReferrer::Unavailable(setup) => {
                Err(PlatformError(format!("install referrer unavailable: {setup:?}")))
            }
        }
    }

    fn end_connection(&self) {
        self.connections_ended.fetch_add(1, Ordering::SeqCst);
    }
}
