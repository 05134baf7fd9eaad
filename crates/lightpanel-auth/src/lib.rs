//! Authentication for the lightpanel web settings page.
//!
//! This crate provides:
//!
//! - A fixed-capacity [`SessionManager`] with idle expiry and
//!   least-recently-active eviction
//! - bcrypt password verification and hashing
//! - A [`Clock`] abstraction so expiry can be driven by a simulated clock
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐  password  ┌──────────────────┐
//! │   Gateway        │───────────▶│ verify_password  │
//! │   (HTTP)         │            │ (bcrypt)         │
//! └────────┬─────────┘            └──────────────────┘
//!          │ create / validate / destroy
//! ┌────────▼─────────┐
//! │  SessionManager  │──▶ Clock (SystemClock | ManualClock)
//! │  [Slot; 8]       │
//! └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use lightpanel_auth::{SessionConfig, SessionManager};
//!
//! let sessions = SessionManager::new(&SessionConfig::default());
//! let token = sessions.create().unwrap();
//! assert!(sessions.validate(token.as_str()));
//!
//! sessions.destroy(token.as_str());
//! assert!(!sessions.validate(token.as_str()));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod clock;
pub mod error;
pub mod password;
pub mod session;

pub use clock::{Clock, SystemClock};
pub use error::{AuthError, Result};
pub use password::{check_password, hash_password, verify_password, DEFAULT_COST};
pub use session::{SessionManager, SessionToken};

#[cfg(any(test, feature = "test-utils"))]
pub use clock::ManualClock;

use serde::Deserialize;

/// Default number of concurrent sessions.
pub const SESSION_CAPACITY: usize = 8;

/// Default idle timeout, in seconds.
pub const SESSION_IDLE_TIMEOUT_SECS: i64 = 3600;

/// Session table settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Number of session slots.
    pub capacity: usize,
    /// Idle time after which a session is invalid, in seconds.
    pub idle_timeout_seconds: i64,
}

impl SessionConfig {
    /// The idle timeout as a duration.
    #[must_use]
    pub fn idle_timeout(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.idle_timeout_seconds)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            capacity: SESSION_CAPACITY,
            idle_timeout_seconds: SESSION_IDLE_TIMEOUT_SECS,
        }
    }
}
