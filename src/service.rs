//! SDK lifecycle and deep-link dispatch
//!
//! [`DeepLinkNow`] is the handle the host application owns. `init` builds an
//! [`AttributionService`] synchronously, so built-in domains work right away,
//! and runs the rest of the startup on a background Tokio task:
//!
//! 1. Fetch app config from the `init` endpoint and merge verified domains
//! 2. Resolve the install referrer (at most once per install)
//! 3. Flush a callback registered before `init`, and any link that arrived
//!    while no callback was set
//! 4. Mark the service ready

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle;
use tokio::sync::watch;

use crate::client::AttributionClient;
use crate::config::SdkConfig;
use crate::domain::DomainRegistry;
use crate::error::SdkError;
use crate::fingerprint::{FingerprintBuilder, ScreenOverrides};
use crate::link::{host_of, parse_deep_link};
use crate::model::{DeepLinkData, DeeplinkMatch, Fingerprint, InitResponse, MatchResponse, ParsedDeepLink, ReferrerData};
use crate::platform::{ClipboardService, PlatformServices};
use crate::referrer::ReferrerCache;
use crate::storage::ReferrerStore;

/// Receives deep links handled by the SDK.
///
/// Implemented for any `Fn(DeepLinkData) + Send + Sync` closure.
pub trait DeepLinkCallback: Send + Sync {
    fn on_deep_link_open(&self, data: DeepLinkData);
}

impl<F> DeepLinkCallback for F
where
    F: Fn(DeepLinkData) + Send + Sync,
{
    fn on_deep_link_open(&self, data: DeepLinkData) {
        self(data)
    }
}

/// Where the SDK is in its startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Initializing,
    Ready,
}

/// Callback and early-link slots, guarded together so a link and a
/// registration racing each other cannot lose the link.
#[derive(Default)]
struct Dispatch {
    callback: Option<Arc<dyn DeepLinkCallback>>,
    pending_callback: Option<Arc<dyn DeepLinkCallback>>,
    pending_link: Option<DeepLinkData>,
}

/// A running SDK instance
///
/// Holds no reference back to the host; the host decides its lifetime by
/// holding the [`DeepLinkNow`] handle or the `Arc` returned from `init`.
pub struct AttributionService {
    config: SdkConfig,
    domains: DomainRegistry,
    api: Arc<AttributionClient>,
    fingerprints: FingerprintBuilder,
    referrer: ReferrerCache,
    clipboard: Arc<dyn ClipboardService>,
    init_response: RwLock<Option<InitResponse>>,
    dispatch: Mutex<Dispatch>,
    state: watch::Sender<LifecycleState>,
}

impl AttributionService {
    fn new(config: SdkConfig, platform: PlatformServices, store: ReferrerStore) -> Self {
        let enable_logs = config.enable_logs;
        let api = Arc::new(AttributionClient::new(&config));
        let referrer = ReferrerCache::new(store, api.clone(), platform.install_referrer, enable_logs);
        let fingerprints = FingerprintBuilder::new(platform.device, ScreenOverrides::from(&config), enable_logs);
        let (state, _) = watch::channel(LifecycleState::Initializing);

        Self {
            domains: DomainRegistry::new(enable_logs),
            api,
            fingerprints,
            referrer,
            clipboard: platform.clipboard,
            init_response: RwLock::new(None),
            dispatch: Mutex::new(Dispatch::default()),
            state,
            config,
        }
    }

    /// Background startup sequence. Never fails: a missing init response
    /// leaves only the built-in domains.
    async fn initialize(self: Arc<Self>) {
        crate::dln_debug!(self.config.enable_logs, base_url = %self.config.api_base_url, "initializing DLN");

        if let Some(response) = self.api.init().await {
            self.domains.merge_verified(&response.app.custom_domains);
            crate::dln_debug!(self.config.enable_logs, domains = ?self.domains.domains(), "valid domains");
            *self.init_response.write() = Some(response);
        }

        self.referrer.process().await;

        // A callback set directly on the service after `init` supersedes the
        // one registered before it
        let pending = {
            let mut dispatch = self.dispatch.lock();
            let pending = dispatch.pending_callback.take();
            pending.filter(|_| dispatch.callback.is_none())
        };
        if let Some(callback) = pending {
            crate::dln_debug!(self.config.enable_logs, "registering pending deep link callback");
            self.set_deep_link_callback(Some(callback));
        }

        self.state.send_replace(LifecycleState::Ready);
        crate::dln_debug!(self.config.enable_logs, "DLN ready");
    }

    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    pub fn is_ready(&self) -> bool {
        self.state() == LifecycleState::Ready
    }

    /// Resolves once the background startup has finished.
    pub async fn wait_until_ready(&self) {
        let mut state = self.state.subscribe();
        // The sender lives in `self`, so the channel cannot close here
        let _ = state.wait_for(|state| *state == LifecycleState::Ready).await;
    }

    pub fn is_valid_domain(&self, host: &str) -> bool {
        self.domains.is_valid_domain(host)
    }

    /// Domains currently trusted, built-ins included.
    pub fn valid_domains(&self) -> Vec<String> {
        self.domains.domains()
    }

    pub fn domain_registry(&self) -> &DomainRegistry {
        &self.domains
    }

    pub fn parse_deep_link(&self, url: &str) -> Option<ParsedDeepLink> {
        parse_deep_link(&self.domains, url)
    }

    /// Routes `url` to the registered callback.
    ///
    /// Returns true whenever the URL belongs to an allowed domain, whether or
    /// not a callback ran or succeeded. A panicking callback is logged and
    /// otherwise ignored. A link arriving before startup finishes with no
    /// callback registered is kept (one slot, newest wins) and delivered when
    /// a callback is set.
    pub fn handle_deep_link(&self, url: &str) -> bool {
        crate::dln_debug!(self.config.enable_logs, url, "handling deep link");

        let Some(parsed) = self.parse_deep_link(url) else {
            crate::dln_debug!(self.config.enable_logs, url, "ignoring deep link from invalid domain");
            return false;
        };
        let data = parsed.into_deep_link_data();
        crate::dln_debug!(self.config.enable_logs, route = %data.route, params = ?data.params, "parsed deep link");

        let callback = {
            let mut dispatch = self.dispatch.lock();
            match dispatch.callback.clone() {
                Some(callback) => Some(callback),
                None if !self.is_ready() => {
                    crate::dln_debug!(self.config.enable_logs, "holding deep link until a callback is registered");
                    dispatch.pending_link = Some(data.clone());
                    None
                }
                None => {
                    crate::dln_debug!(self.config.enable_logs, "no deep link callback registered");
                    None
                }
            }
        };

        if let Some(callback) = callback {
            self.deliver(callback.as_ref(), data);
        }
        true
    }

    /// Replaces the callback; `None` removes it. A held early link is
    /// delivered to the new callback immediately.
    pub fn set_deep_link_callback(&self, callback: Option<Arc<dyn DeepLinkCallback>>) {
        let pending_link = {
            let mut dispatch = self.dispatch.lock();
            dispatch.callback = callback.clone();
            if callback.is_some() {
                dispatch.pending_link.take()
            } else {
                None
            }
        };
        crate::dln_debug!(
            self.config.enable_logs,
            registered = callback.is_some(),
            "deep link callback updated"
        );

        if let (Some(callback), Some(link)) = (callback, pending_link) {
            self.deliver(callback.as_ref(), link);
        }
    }

    fn deliver(&self, callback: &dyn DeepLinkCallback, data: DeepLinkData) {
        match catch_unwind(AssertUnwindSafe(|| callback.on_deep_link_open(data))) {
            Ok(()) => crate::dln_debug!(self.config.enable_logs, "deep link callback triggered"),
            Err(_) => tracing::warn!("deep link callback panicked"),
        }
    }

    /// Builds a fingerprint for this device as it is right now.
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprints.build()
    }

    /// Asks the matcher which prior clicks this install corresponds to.
    pub async fn find_deferred_user(&self) -> Option<MatchResponse> {
        crate::dln_debug!(self.config.enable_logs, "finding deferred user");
        let fingerprint = self.fingerprints.build();
        self.api.find_deferred_user(&fingerprint).await
    }

    /// True when the clipboard holds a token in the configured URI scheme.
    pub async fn has_deep_link_token(&self) -> bool {
        self.read_clipboard()
            .await
            .is_some_and(|text| text.starts_with(&self.config.uri_scheme))
    }

    /// Clipboard text, if the SDK is ready and the text is a link on an
    /// allowed domain.
    pub async fn check_clipboard(&self) -> Option<String> {
        if !self.is_ready() {
            tracing::warn!("DLN not ready, skipping clipboard check");
            return None;
        }

        let text = self.read_clipboard().await?;
        let host = host_of(&text)?;
        if self.domains.is_valid_domain(&host) {
            crate::dln_debug!(self.config.enable_logs, "found deep link token in clipboard");
            Some(text)
        } else {
            None
        }
    }

    async fn read_clipboard(&self) -> Option<String> {
        match self.clipboard.read_text().await {
            Ok(text) => text.filter(|text| !text.is_empty()),
            Err(err) => {
                tracing::warn!(error = %err, "failed to read clipboard");
                None
            }
        }
    }

    /// Deep link resolved from the install referrer, if any.
    pub fn deferred_deep_link(&self) -> Option<DeeplinkMatch> {
        let link = self.referrer.get_cached()?.deeplink_data;
        crate::dln_debug!(self.config.enable_logs, deeplink = ?link, "deferred deep link");
        link
    }

    /// The stored install-referrer result, if one was processed.
    pub fn referrer_data(&self) -> Option<ReferrerData> {
        self.referrer.get_cached()
    }

    pub fn referrer_cache(&self) -> &ReferrerCache {
        &self.referrer
    }

    /// Last successful init payload.
    pub fn init_response(&self) -> Option<InitResponse> {
        self.init_response.read().clone()
    }
}

/// Handle owned by the host application's composition root
///
/// Before [`init`](Self::init) every instance accessor fails with
/// [`SdkError::NotInitialized`].
#[derive(Default)]
pub struct DeepLinkNow {
    instance: Mutex<Option<Arc<AttributionService>>>,
    pending_callback: Mutex<Option<Arc<dyn DeepLinkCallback>>>,
}

impl DeepLinkNow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the service and starts its background initialization.
    ///
    /// Returns without waiting for the network. Must be called from within a
    /// Tokio runtime. Calling it again returns the existing instance and does
    /// not start a second initialization.
    pub fn init(
        &self,
        config: SdkConfig,
        platform: PlatformServices,
    ) -> Result<Arc<AttributionService>, SdkError> {
        let mut instance = self.instance.lock();
        if let Some(existing) = instance.as_ref() {
            tracing::warn!("DLN already initialized, ignoring init");
            return Ok(existing.clone());
        }

        let runtime = Handle::try_current().map_err(|_| SdkError::NoRuntime)?;
        let store = match &config.storage_path {
            Some(path) => ReferrerStore::open(path)?,
            None => ReferrerStore::in_memory()?,
        };

        let service = Arc::new(AttributionService::new(config, platform, store));
        service.dispatch.lock().pending_callback = self.pending_callback.lock().take();
        runtime.spawn(service.clone().initialize());

        *instance = Some(service.clone());
        Ok(service)
    }

    /// The running service.
    pub fn instance(&self) -> Result<Arc<AttributionService>, SdkError> {
        self.instance.lock().clone().ok_or(SdkError::NotInitialized)
    }

    pub fn state(&self) -> LifecycleState {
        match self.instance.lock().as_ref() {
            Some(service) => service.state(),
            None => LifecycleState::Uninitialized,
        }
    }

    /// Sets the callback on the running service, or keeps it (one slot, last
    /// write wins) until `init` has finished.
    pub fn set_deep_link_callback(&self, callback: Option<Arc<dyn DeepLinkCallback>>) {
        let service = {
            let instance = self.instance.lock();
            match instance.as_ref() {
                Some(service) => service.clone(),
                None => {
                    // Written under the instance lock so a concurrent `init` cannot miss it
                    *self.pending_callback.lock() = callback;
                    return;
                }
            }
        };
        service.set_deep_link_callback(callback);
    }

    /// Routes `url` through the running service; false before `init`.
    pub fn handle_deep_link(&self, url: &str) -> bool {
        match self.instance() {
            Ok(service) => service.handle_deep_link(url),
            Err(_) => false,
        }
    }
}
