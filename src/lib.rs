//! DeepLinkNow attribution SDK
//!
//! Validates incoming deep links against the app's domain allowlist,
//! fingerprints the device for deferred deep-link matching, and recovers
//! attribution from the install referrer and the clipboard.
//!
//! # Example
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use deeplinknow::{DeepLinkNow, DeepLinkData, PlatformServices, SdkConfig, StaticPlatform};
//! # async fn run() -> Result<(), deeplinknow::SdkError> {
//! let dln = DeepLinkNow::new();
//! dln.set_deep_link_callback(Some(Arc::new(|link: DeepLinkData| {
//!     println!("open {}", link.route);
//! })));
//!
//! let platform = PlatformServices::from_shared(Arc::new(StaticPlatform::default()));
//! let service = dln.init(SdkConfig::new("api-key"), platform)?;
//! service.wait_until_ready().await;
//! let matches = service.find_deferred_user().await;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod fingerprint;
pub mod link;
pub mod logging;
pub mod model;
pub mod platform;
pub mod referrer;
pub mod service;
pub mod storage;

pub use config::SdkConfig;
pub use error::SdkError;
pub use model::{DeepLinkData, DeeplinkMatch, Fingerprint, MatchResponse, Platform, ReferrerData};
pub use platform::{PlatformServices, StaticPlatform};
pub use service::{AttributionService, DeepLinkCallback, DeepLinkNow, LifecycleState};

// Used by `dln_debug!` expansions in downstream crates
#[doc(hidden)]
pub use tracing;
