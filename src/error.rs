//! Error types for the SDK
//!
//! Only [`SdkError`] ever reaches the embedding application. [`ApiError`] and
//! [`PlatformError`] describe failures that the SDK absorbs into `None` /
//! `false` results after logging them.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors visible to the embedding application.
#[derive(Debug, Error)]
pub enum SdkError {
    /// An instance method was requested before [`DeepLinkNow::init`](crate::DeepLinkNow::init).
    #[error("DLN not initialized")]
    NotInitialized,

    /// `init` was called outside of a Tokio runtime, so the background
    /// initialization task cannot be spawned.
    #[error("DLN must be initialized from within a Tokio runtime")]
    NoRuntime,

    /// The referrer store could not be opened.
    #[error("Storage error: {0}")]
    Storage(#[from] redb::Error),

    /// A required configuration value is missing.
    #[error("Missing configuration value: {0}")]
    MissingConfig(&'static str),

    /// A configuration value could not be parsed.
    #[error("Invalid value for {key}: {value:?}")]
    InvalidConfig { key: &'static str, value: String },
}

/// Failure of a single request against the attribution API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, TLS, body read).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// The response body was not the JSON document we expected.
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Failure reported by a platform collaborator (clipboard, install referrer).
#[derive(Debug, Clone, Error)]
#[error("platform service failed: {0}")]
pub struct PlatformError(pub String);
