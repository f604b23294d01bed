//! Security Module for CashPlus
//!
//! Session lifecycle for the API:
//! - Opaque, randomly generated session tokens
//! - Sliding expiration (every successful validation refreshes the session)
//! - Lazy eviction on access plus bulk sweeping driven by the host
//!
//! # Usage
//!
//! ```rust
//! use security::session::{SessionConfig, SessionStore};
//!
//! let store = SessionStore::new(SessionConfig::default());
//!
//! let token = store.create("operator-42");
//! assert!(store.validate(&token));
//!
//! store.invalidate(&token);
//! assert!(!store.validate(&token));
//! ```
//!
//! The store is an ordinary value: construct one per process (or per test) and
//! share it behind an `Arc`. It never spawns work of its own; the host decides
//! when to call [`SessionStore::sweep_expired`].

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod clock;
pub mod error;
pub mod session;

// Re-exports for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::SessionError;
pub use session::{SessionConfig, SessionStore, SESSION_TOKEN_HEADER};
