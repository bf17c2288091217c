//! SDK configuration
//!
//! Built in code with [`SdkConfig::new`] and the `with_*` setters, or read
//! from the environment with [`SdkConfig::from_env`].
//!
//! # Environment Variables
//!
//! - `DLN_API_KEY` - API key issued by the dashboard (required)
//! - `DLN_API_BASE_URL` - Attribution API base (default: `https://deeplinknow.com/api/v1/sdk/`)
//! - `DLN_ENABLE_LOGS` - `true`/`1` to emit debug diagnostics (default: false)
//! - `DLN_SCREEN_WIDTH`, `DLN_SCREEN_HEIGHT`, `DLN_PIXEL_RATIO` - screen overrides
//! - `DLN_URI_SCHEME` - clipboard token prefix (default: `dln://`)
//! - `DLN_STORAGE_PATH` - referrer store file (default: in-memory)
//! - `DLN_REQUEST_TIMEOUT_SECS` - per-request timeout (default: 30)

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SdkError;

pub const DEFAULT_API_BASE_URL: &str = "https://deeplinknow.com/api/v1/sdk/";
pub const DEFAULT_URI_SCHEME: &str = "dln://";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SdkConfig {
    pub api_key: String,

    pub api_base_url: String,

    /// Emit debug diagnostics through `tracing`
    #[serde(default)]
    pub enable_logs: bool,

    pub override_screen_width: Option<u32>,

    pub override_screen_height: Option<u32>,

    pub override_pixel_ratio: Option<f32>,

    /// Prefix that marks a clipboard entry as a DLN token
    pub uri_scheme: String,

    /// Where the referrer store lives; in-memory when `None`
    pub storage_path: Option<PathBuf>,

    pub request_timeout: Duration,
}

impl SdkConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            enable_logs: false,
            override_screen_width: None,
            override_screen_height: None,
            override_pixel_ratio: None,
            uri_scheme: DEFAULT_URI_SCHEME.to_string(),
            storage_path: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_logs(mut self, enable_logs: bool) -> Self {
        self.enable_logs = enable_logs;
        self
    }

    pub fn with_screen_override(mut self, width: u32, height: u32, pixel_ratio: Option<f32>) -> Self {
        self.override_screen_width = Some(width);
        self.override_screen_height = Some(height);
        self.override_pixel_ratio = pixel_ratio;
        self
    }

    pub fn with_uri_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.uri_scheme = scheme.into();
        self
    }

    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = Some(path.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Reads the configuration from `DLN_*` environment variables.
    ///
    /// Does not load `.env` itself; binaries call `dotenvy::dotenv()` first.
    pub fn from_env() -> Result<Self, SdkError> {
        let api_key = env::var("DLN_API_KEY")
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or(SdkError::MissingConfig("DLN_API_KEY"))?;

        let mut config = Self::new(api_key);

        if let Ok(url) = env::var("DLN_API_BASE_URL") {
            config.api_base_url = url;
        }
        if let Ok(flag) = env::var("DLN_ENABLE_LOGS") {
            config.enable_logs = matches!(flag.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        config.override_screen_width = parse_var("DLN_SCREEN_WIDTH")?;
        config.override_screen_height = parse_var("DLN_SCREEN_HEIGHT")?;
        config.override_pixel_ratio = parse_var("DLN_PIXEL_RATIO")?;
        if let Ok(scheme) = env::var("DLN_URI_SCHEME") {
            config.uri_scheme = scheme;
        }
        config.storage_path = env::var_os("DLN_STORAGE_PATH").map(PathBuf::from);
        if let Some(secs) = parse_var::<u64>("DLN_REQUEST_TIMEOUT_SECS")? {
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

fn parse_var<T: FromStr>(key: &'static str) -> Result<Option<T>, SdkError> {
    match env::var(key) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| SdkError::InvalidConfig { key, value }),
        Err(_) => Ok(None),
    }
}
