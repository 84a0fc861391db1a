//! The update challenge.
//!
//! A single slot holds the most recently issued challenge. Issuing replaces
//! whatever was there; consuming always empties it, whether or not the
//! update that follows is accepted. Only one publisher is expected, so a
//! second `GET /update` racing the first simply wins.

use std::net::SocketAddr;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rand::rngs::OsRng;
use rand::Rng;

use crate::error::{Result, ServerError};

/// An issued challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Challenge {
    /// Seed the publisher must derive its key from. Never zero.
    pub value: i64,
    /// Peer that requested it, when known.
    pub client: Option<SocketAddr>,
}

#[derive(Debug)]
enum Slot {
    Idle,
    Issued(Challenge),
}

/// Single-slot challenge issuer.
#[derive(Debug)]
pub struct ChallengeIssuer {
    slot: Mutex<Slot>,
}

impl ChallengeIssuer {
    /// New issuer with no challenge outstanding.
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot::Idle),
        }
    }

    // The slot holds plain data, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Draw a fresh challenge for `client`, replacing any outstanding one.
    pub fn issue(&self, client: Option<SocketAddr>) -> i64 {
        let value = OsRng.gen_range(1..=i64::MAX);
        *self.lock() = Slot::Issued(Challenge { value, client });
        tracing::debug!(client = ?client, "challenge issued");
        value
    }

    /// Take the outstanding challenge, leaving the issuer idle.
    pub fn consume(&self) -> Result<Challenge> {
        match std::mem::replace(&mut *self.lock(), Slot::Idle) {
            Slot::Issued(challenge) if challenge.value != 0 => Ok(challenge),
            _ => Err(ServerError::NoChallenge),
        }
    }

    /// Whether a challenge is outstanding.
    pub fn is_issued(&self) -> bool {
        matches!(*self.lock(), Slot::Issued(_))
    }
}

impl Default for ChallengeIssuer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[test]
    fn test_idle_consume_fails() {
        let issuer = ChallengeIssuer::new();
        assert!(!issuer.is_issued());
        assert!(matches!(issuer.consume(), Err(ServerError::NoChallenge)));
    }

    #[test]
    fn test_challenge_is_single_use() {
        let issuer = ChallengeIssuer::new();
        let value = issuer.issue(Some(addr(4000)));
        assert!(value > 0);

        let challenge = issuer.consume().unwrap();
        assert_eq!(challenge.value, value);
        assert_eq!(challenge.client, Some(addr(4000)));

        assert!(matches!(issuer.consume(), Err(ServerError::NoChallenge)));
    }

    #[test]
    fn test_issue_replaces() {
        let issuer = ChallengeIssuer::new();
        issuer.issue(Some(addr(1)));
        let second = issuer.issue(Some(addr(2)));

        let challenge = issuer.consume().unwrap();
        assert_eq!(challenge.value, second);
        assert_eq!(challenge.client, Some(addr(2)));
    }

    #[test]
    fn test_values_are_positive() {
        let issuer = ChallengeIssuer::new();
        for _ in 0..1000 {
            assert!(issuer.issue(None) >= 1);
        }
    }
}
