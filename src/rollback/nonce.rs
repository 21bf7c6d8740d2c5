//! Per-session, per-action request tokens
//!
//! A token is a truncated SHA-256 over `tick|action|session|secret`, where
//! the tick advances every half lifetime. Tokens from the current and the
//! previous tick verify, so a token lives between half and a full lifetime.

use crate::core::time::{Clock, SystemClock};
use sha2::{Digest, Sha256};
use std::sync::Arc;

pub const DEFAULT_NONCE_LIFETIME_SECS: i64 = 24 * 60 * 60;
const TOKEN_LEN: usize = 10;

pub trait NonceVerifier: Send + Sync {
    fn verify(&self, nonce: &str, action: &str, session: &str) -> bool;
}

/// Action name a rollback token is bound to
pub fn rollback_nonce_action(basename: &str) -> String {
    format!("rollback-plugin_{}", basename)
}

pub struct TickNonce {
    secret: String,
    lifetime_secs: i64,
    clock: Arc<dyn Clock>,
}

impl TickNonce {
    pub fn new(secret: impl Into<String>, lifetime_secs: i64) -> Self {
        Self {
            secret: secret.into(),
            lifetime_secs: lifetime_secs.max(2),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn tick_at(&self, unix_now: i64) -> i64 {
        let half = self.lifetime_secs / 2;
        // Ceiling division; unix_now is never negative in practice
        (unix_now + half - 1).div_euclid(half)
    }

    fn token(&self, tick: i64, action: &str, session: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!("{}|{}|{}|{}", tick, action, session, self.secret).as_bytes());
        let hash_hex = format!("{:x}", hasher.finalize());
        hash_hex[..TOKEN_LEN].to_string()
    }

    pub fn create(&self, action: &str, session: &str) -> String {
        self.create_at(self.clock.unix_now(), action, session)
    }

    pub fn create_at(&self, unix_now: i64, action: &str, session: &str) -> String {
        self.token(self.tick_at(unix_now), action, session)
    }

    pub fn verify_at(&self, unix_now: i64, nonce: &str, action: &str, session: &str) -> bool {
        if nonce.is_empty() {
            return false;
        }
        let tick = self.tick_at(unix_now);
        [tick, tick - 1]
            .iter()
            .any(|t| constant_time_eq(self.token(*t, action, session).as_bytes(), nonce.as_bytes()))
    }
}

impl NonceVerifier for TickNonce {
    fn verify(&self, nonce: &str, action: &str, session: &str) -> bool {
        self.verify_at(self.clock.unix_now(), nonce, action, session)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::ManualClock;

    const DAY: i64 = 86_400;

    #[test]
    fn test_token_verifies_for_same_action_and_session() {
        let nonces = TickNonce::new("s3cret", DAY);
        let token = nonces.create_at(1_700_000_000, "rollback", "alice");
        assert_eq!(token.len(), 10);
        assert!(nonces.verify_at(1_700_000_000, &token, "rollback", "alice"));
        assert!(!nonces.verify_at(1_700_000_000, &token, "rollback", "bob"));
        assert!(!nonces.verify_at(1_700_000_000, &token, "delete", "alice"));
        assert!(!nonces.verify_at(1_700_000_000, "", "rollback", "alice"));
    }

    #[test]
    fn test_token_depends_on_secret() {
        let token = TickNonce::new("one", DAY).create_at(0, "rollback", "alice");
        assert!(!TickNonce::new("two", DAY).verify_at(0, &token, "rollback", "alice"));
    }

    #[test]
    fn test_token_expires_after_two_ticks() {
        let nonces = TickNonce::new("s3cret", DAY);
        let issued = 1_700_000_000;
        let token = nonces.create_at(issued, "rollback", "alice");

        // Always valid for at least half a lifetime
        assert!(nonces.verify_at(issued + DAY / 2 - 1, &token, "rollback", "alice"));
        // Never valid after a full lifetime
        assert!(!nonces.verify_at(issued + DAY + 1, &token, "rollback", "alice"));
    }

    #[test]
    fn test_verify_uses_clock() {
        let clock = Arc::new(ManualClock::at(1_700_000_000));
        let nonces = TickNonce::new("s3cret", DAY).with_clock(clock.clone());
        let token = nonces.create("rollback", "alice");
        assert!(nonces.verify(&token, "rollback", "alice"));
        clock.advance(2 * DAY);
        assert!(!nonces.verify(&token, "rollback", "alice"));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
    }
}
