//! Resilient risk resolution
//!
//! [`ResilientRiskResolver`] asks the external classifier (when enabled) and
//! converges on [`classify_locally`] whenever that does not yield a usable
//! tier. Callers always get a [`RiskTier`] back; no error escapes.

use crate::classifier::RiskClassifier;
use crate::error::{Error, Result};
use crate::fallback::classify_locally;
use crate::retry::RetryPolicy;
use crate::types::{PaymentMethod, RiskResolutionRequest, RiskTier};
use futures_util::FutureExt;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Resolver configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Consult the external classifier at all
    pub external_enabled: bool,

    /// Budget for a single remote attempt
    pub timeout: Duration,

    /// Additional attempts after a transient failure
    pub retry_count: u32,

    /// Pause between attempts
    pub retry_delay: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            external_enabled: false,
            timeout: Duration::from_secs(5),
            retry_count: 2,
            retry_delay: Duration::from_millis(500),
        }
    }
}

impl ResolverConfig {
    /// Reject settings that would make every remote attempt fail instantly
    pub fn validate(&self) -> Result<()> {
        if self.external_enabled && self.timeout.is_zero() {
            return Err(Error::InvalidConfig(
                "timeout must be greater than zero when the external classifier is enabled".to_string(),
            ));
        }
        Ok(())
    }

    /// Retry policy derived from this configuration
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::fixed(self.retry_count, self.retry_delay)
    }
}

/// Why the local rules were used instead of the remote answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// External classifier switched off
    Disabled,
    /// Enabled, but no classifier was wired in
    NoClassifier,
    /// Remote answered with a tier name we do not know
    InvalidTier,
    /// Every attempt failed with a transient error
    AttemptsExhausted,
    /// An attempt failed in a way retrying cannot fix
    NonRetryable,
    /// Caller gave up before an answer arrived
    Cancelled,
}

impl FallbackReason {
    /// Stable label, used for logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackReason::Disabled => "disabled",
            FallbackReason::NoClassifier => "no_classifier",
            FallbackReason::InvalidTier => "invalid_tier",
            FallbackReason::AttemptsExhausted => "attempts_exhausted",
            FallbackReason::NonRetryable => "non_retryable",
            FallbackReason::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a tier came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum ResolutionSource {
    /// External classifier
    Remote,
    /// Local rules
    Fallback(FallbackReason),
}

impl ResolutionSource {
    /// Whether the local rules produced the tier
    pub fn is_fallback(&self) -> bool {
        matches!(self, ResolutionSource::Fallback(_))
    }
}

/// Outcome of one resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskResolution {
    /// Tier assigned to the transaction
    pub tier: RiskTier,

    /// Where the tier came from
    pub source: ResolutionSource,
}

/// Classifies transactions, preferring the external service when enabled
pub struct ResilientRiskResolver {
    config: ResolverConfig,
    retry: RetryPolicy,
    classifier: Option<Arc<dyn RiskClassifier>>,
}

impl fmt::Debug for ResilientRiskResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResilientRiskResolver")
            .field("config", &self.config)
            .field("has_classifier", &self.classifier.is_some())
            .finish()
    }
}

impl ResilientRiskResolver {
    /// Create a resolver backed by `classifier`
    pub fn new(config: ResolverConfig, classifier: Arc<dyn RiskClassifier>) -> Self {
        Self {
            retry: config.retry_policy(),
            config,
            classifier: Some(classifier),
        }
    }

    /// Create a resolver that only ever uses the local rules
    pub fn local_only() -> Self {
        Self {
            config: ResolverConfig::default(),
            retry: RetryPolicy::fixed(0, Duration::ZERO),
            classifier: None,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Classify a transaction. Never fails.
    pub async fn resolve(&self, amount: Decimal, method: Option<PaymentMethod>) -> RiskTier {
        self.resolve_detailed(amount, method).await.tier
    }

    /// Classify a transaction and report where the tier came from
    pub async fn resolve_detailed(
        &self,
        amount: Decimal,
        method: Option<PaymentMethod>,
    ) -> RiskResolution {
        self.resolve_cancellable(amount, method, &CancellationToken::new())
            .await
    }

    /// Like [`resolve_detailed`](Self::resolve_detailed), but gives up on the
    /// remote service as soon as `cancel` fires. The in-flight attempt is
    /// dropped and the local rules answer instead.
    pub async fn resolve_cancellable(
        &self,
        amount: Decimal,
        method: Option<PaymentMethod>,
        cancel: &CancellationToken,
    ) -> RiskResolution {
        if !self.config.external_enabled {
            debug!("External risk classifier disabled, using local rules");
            return fallback(amount, method, FallbackReason::Disabled);
        }

        let classifier = match &self.classifier {
            Some(c) => c.as_ref(),
            None => {
                warn!("External risk classifier enabled but not configured, using local rules");
                return fallback(amount, method, FallbackReason::NoClassifier);
            }
        };

        let request = RiskResolutionRequest::new(amount, method);
        let attempts = self
            .retry
            .execute("risk classification", |_| attempt(classifier, &request, self.config.timeout));

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("Risk classification cancelled by caller, using local rules");
                return fallback(amount, method, FallbackReason::Cancelled);
            }
            result = attempts => result,
        };

        match result {
            Ok(outcome) => match outcome.parse_tier() {
                Some(tier) => RiskResolution {
                    tier,
                    source: ResolutionSource::Remote,
                },
                None => {
                    warn!(
                        "Risk classifier returned invalid tier {:?}, using local rules",
                        outcome.tier
                    );
                    fallback(amount, method, FallbackReason::InvalidTier)
                }
            },
            Err(e) if e.is_transient() => {
                warn!("Risk classifier unavailable after retries: {}", e);
                fallback(amount, method, FallbackReason::AttemptsExhausted)
            }
            Err(e) => {
                warn!("Risk classifier failed: {}", e);
                fallback(amount, method, FallbackReason::NonRetryable)
            }
        }
    }
}

/// One remote attempt bounded by `timeout`. A panicking classifier counts as
/// a failed attempt.
async fn attempt(
    classifier: &dyn RiskClassifier,
    request: &RiskResolutionRequest,
    timeout: Duration,
) -> Result<crate::types::RemoteRiskOutcome> {
    let call = AssertUnwindSafe(classifier.classify(request)).catch_unwind();

    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(result)) => result,
        Ok(Err(_)) => Err(Error::Internal("risk classifier panicked".to_string())),
        Err(_) => Err(Error::Timeout(timeout)),
    }
}

fn fallback(amount: Decimal, method: Option<PaymentMethod>, reason: FallbackReason) -> RiskResolution {
    RiskResolution {
        tier: classify_locally(amount, method),
        source: ResolutionSource::Fallback(reason),
    }
}
