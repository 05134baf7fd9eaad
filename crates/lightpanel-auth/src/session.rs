//! Fixed-capacity session table.
//!
//! Each slot is either free or holds the blake3 digest of a token plus the
//! time it was last used. The raw token is only ever held by the client.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::{AuthError, Result};
use crate::SessionConfig;

/// Number of random bytes in a session token.
pub const TOKEN_BYTES: usize = 32;

/// An issued session token (64 lowercase hex characters).
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    fn generate() -> Result<Self> {
        let mut bytes = [0u8; TOKEN_BYTES];
        getrandom::getrandom(&mut bytes).map_err(|e| AuthError::TokenGeneration(e.to_string()))?;
        Ok(Self(hex::encode(bytes)))
    }

    /// The token text, for placing in a cookie.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the token text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Free,
    Occupied {
        digest: blake3::Hash,
        last_active: DateTime<Utc>,
    },
}

/// Table of authenticated web sessions.
///
/// All operations take one lock around the whole table, so concurrent
/// requests never interleave on a slot.
#[derive(Debug)]
pub struct SessionManager {
    idle_timeout: chrono::Duration,
    clock: Arc<dyn Clock>,
    slots: Mutex<Vec<Slot>>,
}

impl SessionManager {
    /// Create a manager using the system clock.
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a manager with an explicit time source.
    ///
    /// A capacity of zero is raised to one.
    #[must_use]
    pub fn with_clock(config: &SessionConfig, clock: Arc<dyn Clock>) -> Self {
        let capacity = config.capacity.max(1);
        Self {
            idle_timeout: config.idle_timeout(),
            clock,
            slots: Mutex::new(vec![Slot::Free; capacity]),
        }
    }

    /// Issue a new session.
    ///
    /// Uses the first free slot; when the table is full the least recently
    /// active session is evicted.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::TokenGeneration`] if the entropy source fails.
    pub fn create(&self) -> Result<SessionToken> {
        let token = SessionToken::generate()?;
        let digest = blake3::hash(token.as_str().as_bytes());
        let now = self.clock.now();

        let mut slots = self.slots.lock();
        self.expire_idle(&mut slots, now);

        let index = if let Some(free) = slots.iter().position(|s| matches!(s, Slot::Free)) {
            free
        } else {
            let oldest = slots
                .iter()
                .enumerate()
                .filter_map(|(i, slot)| match slot {
                    Slot::Occupied { last_active, .. } => Some((i, *last_active)),
                    Slot::Free => None,
                })
                .min_by_key(|(_, last_active)| *last_active)
                .map_or(0, |(i, _)| i);
            warn!(slot = oldest, "Session table full; evicting least recently active session");
            oldest
        };

        slots[index] = Slot::Occupied {
            digest,
            last_active: now,
        };
        info!(slot = index, "Session created");
        Ok(token)
    }

    /// Check a token, refreshing its activity time on success.
    ///
    /// Every idle-expired slot seen during the scan is freed.
    #[must_use]
    pub fn validate(&self, token: &str) -> bool {
        if token.is_empty() {
            return false;
        }
        let wanted = blake3::hash(token.as_bytes());
        let now = self.clock.now();

        let mut slots = self.slots.lock();
        self.expire_idle(&mut slots, now);

        for slot in slots.iter_mut() {
            if let Slot::Occupied {
                digest,
                last_active,
            } = slot
            {
                if *digest == wanted {
                    *last_active = now;
                    return true;
                }
            }
        }
        false
    }

    /// [`validate`](Self::validate) as a `Result`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::SessionInvalid`] if the token is not live.
    pub fn require(&self, token: &str) -> Result<()> {
        if self.validate(token) {
            Ok(())
        } else {
            Err(AuthError::SessionInvalid)
        }
    }

    /// End a session. Unknown or empty tokens are ignored.
    pub fn destroy(&self, token: &str) {
        if token.is_empty() {
            return;
        }
        let wanted = blake3::hash(token.as_bytes());

        let mut slots = self.slots.lock();
        for (index, slot) in slots.iter_mut().enumerate() {
            if matches!(slot, Slot::Occupied { digest, .. } if *digest == wanted) {
                *slot = Slot::Free;
                info!(slot = index, "Session destroyed");
                return;
            }
        }
    }

    /// Number of live sessions.
    #[must_use]
    pub fn active_count(&self) -> usize {
        let now = self.clock.now();
        let mut slots = self.slots.lock();
        self.expire_idle(&mut slots, now);
        slots
            .iter()
            .filter(|s| matches!(s, Slot::Occupied { .. }))
            .count()
    }

    /// Table size.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.lock().len()
    }

    fn expire_idle(&self, slots: &mut [Slot], now: DateTime<Utc>) {
        for (index, slot) in slots.iter_mut().enumerate() {
            if let Slot::Occupied { last_active, .. } = slot {
                if now - *last_active > self.idle_timeout {
                    *slot = Slot::Free;
                    debug!(slot = index, "Session expired");
                }
            }
        }
    }
}
