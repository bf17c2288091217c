//! Diagnostic logging gated by [`SdkConfig::enable_logs`](crate::SdkConfig).
//!
//! Warnings are always emitted through `tracing::warn!`. Chatty diagnostics
//! go through [`dln_debug!`](crate::dln_debug) so hosts that did not opt in
//! never see them, whatever their subscriber filter says.

/// Emit a `tracing::debug!` event only when the given flag is set.
///
/// ```
/// # use deeplinknow::dln_debug;
/// let enable_logs = true;
/// dln_debug!(enable_logs, domain = "deeplinknow.com", "domain accepted");
/// ```
#[macro_export]
macro_rules! dln_debug {
    ($enabled:expr, $($arg:tt)*) => {
        if $enabled {
            $crate::tracing::debug!($($arg)*);
        }
    };
}
