//! Risk Engine for CashPlus
//!
//! Fraud-risk classification for point-of-sale transactions. A transaction is
//! always given a [`RiskTier`]: the external classifier is consulted when it is
//! enabled, bounded by a timeout and a fixed-delay retry policy, and every
//! failure path degrades to the deterministic local rules in [`fallback`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod classifier;
pub mod error;
pub mod fallback;
pub mod resolver;
pub mod retry;
pub mod types;

pub use classifier::{HttpRiskClassifier, RiskClassifier};
pub use error::{Error, Result};
pub use fallback::classify_locally;
pub use resolver::{FallbackReason, ResilientRiskResolver, ResolutionSource, ResolverConfig, RiskResolution};
pub use retry::RetryPolicy;
pub use types::*;
