//! Platform publisher contract
//!
//! Per-platform adapters implement [`Publisher`]; the scheduler only ever
//! sees the typed error classification, never platform error strings.

mod http;

pub use http::HttpPublisher;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Article, PlatformConfig};

/// What publishing an article produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    /// Public URL of the published artifact
    pub url: String,
}

/// How a publish failure should be handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishErrorKind {
    /// The cached platform session is no longer valid. Retrying without a
    /// fresh login cannot succeed, so this is terminal.
    CredentialExpired,
    /// Anything plausibly temporary: network failures, rate limits, 5xx.
    Transient,
    /// The platform rejected the content itself; retrying the same payload
    /// cannot succeed.
    Permanent,
}

/// A classified publish failure
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct PublishError {
    pub kind: PublishErrorKind,
    pub message: String,
}

impl PublishError {
    #[must_use]
    pub fn credential_expired(message: impl Into<String>) -> Self {
        Self {
            kind: PublishErrorKind::CredentialExpired,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: PublishErrorKind::Transient,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            kind: PublishErrorKind::Permanent,
            message: message.into(),
        }
    }

    /// Whether the scheduler may spend retry budget on this failure
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.kind, PublishErrorKind::Transient)
    }
}

/// A per-platform publishing adapter.
///
/// The wire format of each platform is the adapter's business; the core only
/// relies on the receipt/error contract.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish the article with the given platform options
    async fn publish(
        &self,
        article: &Article,
        config: &PlatformConfig,
    ) -> Result<PublishReceipt, PublishError>;
}
