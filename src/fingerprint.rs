//! Device fingerprint construction
//!
//! Assembles the [`Fingerprint`] sent to the matcher from the host's
//! [`DeviceInfo`] plus the screen overrides in [`SdkConfig`]. Some devices
//! misreport raw pixel counts, so implausible values are recomputed from the
//! density-independent size.

use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};

use crate::config::SdkConfig;
use crate::model::Fingerprint;
use crate::platform::{DeviceInfo, DisplayMetrics};

/// Raw widths outside this range are not trusted.
pub const PLAUSIBLE_WIDTH: std::ops::RangeInclusive<u32> = 320..=1440;
/// Raw heights outside this range are not trusted.
pub const PLAUSIBLE_HEIGHT: std::ops::RangeInclusive<u32> = 480..=2960;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

static INSTALLED_AT: OnceLock<DateTime<Utc>> = OnceLock::new();

/// Screen size in pixels plus the pixel ratio reported with it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenMetrics {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f32,
}

/// Configuration-supplied screen values, mostly used on emulators.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScreenOverrides {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub pixel_ratio: Option<f32>,
}

impl From<&SdkConfig> for ScreenOverrides {
    fn from(config: &SdkConfig) -> Self {
        Self {
            width: config.override_screen_width,
            height: config.override_screen_height,
            pixel_ratio: config.override_pixel_ratio,
        }
    }
}

pub struct FingerprintBuilder {
    device: Arc<dyn DeviceInfo>,
    overrides: ScreenOverrides,
    installed_at: DateTime<Utc>,
    enable_logs: bool,
}

impl FingerprintBuilder {
    /// The install timestamp is taken from the first builder created in this
    /// process and shared by every later one.
    pub fn new(device: Arc<dyn DeviceInfo>, overrides: ScreenOverrides, enable_logs: bool) -> Self {
        let installed_at = *INSTALLED_AT.get_or_init(Utc::now);
        Self {
            device,
            overrides,
            installed_at,
            enable_logs,
        }
    }

    /// Builds a fresh fingerprint. `last_opened_at` is the current time.
    pub fn build(&self) -> Fingerprint {
        let device = self.device.as_ref();
        let screen = self.screen_metrics();
        let platform = device.platform();
        let os_version = device.os_version();
        let language = device.language();
        let timezone = device.timezone();

        let hardware_fingerprint = hardware_fingerprint(&[
            Some(platform.to_string()),
            Some(os_version.clone()),
            Some(screen.width.to_string()),
            Some(screen.height.to_string()),
            Some(format!("{:?}", screen.pixel_ratio)),
            Some(language.clone()),
            Some(timezone.clone()),
        ]);

        Fingerprint {
            user_agent: device.user_agent(),
            platform,
            os_version,
            device_model: device.device_model(),
            language,
            timezone,
            installed_at: format_timestamp(self.installed_at),
            last_opened_at: format_timestamp(Utc::now()),
            device_id: device.device_id(),
            advertising_id: device.advertising_id().unwrap_or_default(),
            vendor_id: device.vendor_id().unwrap_or_default(),
            hardware_fingerprint: Some(hardware_fingerprint),
            screen_width: Some(screen.width),
            screen_height: Some(screen.height),
            pixel_ratio: Some(screen.pixel_ratio),
        }
    }

    /// Screen size to report: overrides first, then plausible raw values,
    /// then the density-independent fallback.
    pub fn screen_metrics(&self) -> ScreenMetrics {
        let raw = self.device.display_metrics();

        if let (Some(width), Some(height)) = (self.overrides.width, self.overrides.height) {
            let pixel_ratio = self.overrides.pixel_ratio.unwrap_or(raw.density);
            crate::dln_debug!(self.enable_logs, width, height, pixel_ratio, "using override screen dimensions");
            return ScreenMetrics {
                width,
                height,
                pixel_ratio,
            };
        }

        let metrics = resolve_screen_metrics(&raw);
        if metrics.width != raw.width_pixels || metrics.height != raw.height_pixels {
            crate::dln_debug!(
                self.enable_logs,
                raw_width = raw.width_pixels,
                raw_height = raw.height_pixels,
                width = metrics.width,
                height = metrics.height,
                "raw display metrics out of range, recomputed from dp"
            );
        }
        metrics
    }
}

/// Picks raw pixel counts when both fall in the plausible window, otherwise
/// `round(dp * density)`.
pub fn resolve_screen_metrics(display: &DisplayMetrics) -> ScreenMetrics {
    if PLAUSIBLE_WIDTH.contains(&display.width_pixels)
        && PLAUSIBLE_HEIGHT.contains(&display.height_pixels)
    {
        return ScreenMetrics {
            width: display.width_pixels,
            height: display.height_pixels,
            pixel_ratio: display.density,
        };
    }

    ScreenMetrics {
        width: (display.width_dp as f32 * display.density).round() as u32,
        height: (display.height_dp as f32 * display.density).round() as u32,
        pixel_ratio: display.density,
    }
}

/// Joins the present components with `|` and hashes the result with
/// [`simple_hash`].
pub fn hardware_fingerprint(components: &[Option<String>]) -> String {
    let joined = components
        .iter()
        .flatten()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("|");
    simple_hash(&joined)
}

/// 32-bit rolling hash (`h = h * 31 + unit`) over UTF-16 code units,
/// rendered as signed lowercase hex so every DLN SDK produces the same value.
pub fn simple_hash(input: &str) -> String {
    let hash = input
        .encode_utf16()
        .fold(0i32, |hash, unit| hash.wrapping_mul(31).wrapping_add(i32::from(unit)));

    if hash < 0 {
        format!("-{:x}", hash.unsigned_abs())
    } else {
        format!("{hash:x}")
    }
}

/// `yyyy-MM-dd'T'HH:mm:ss'Z'` in UTC.
pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}
