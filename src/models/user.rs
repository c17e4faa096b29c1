// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Anonymized user identity.
//!
//! The raw channel ID of the account owner never leaves this module: callers
//! only ever see its SHA-256 digest, or a random anonymous token when the
//! account has no channel.

use ring::rand::{SecureRandom, SystemRandom};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Prefix of identities generated for accounts without a channel.
pub const ANONYMOUS_PREFIX: &str = "anon_";

/// Opaque user identifier written alongside each subscription.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Stable identity: lowercase hex SHA-256 of the channel ID.
    pub fn from_channel_id(channel_id: &str) -> Self {
        Self(hex::encode(Sha256::digest(channel_id.as_bytes())))
    }

    /// Fresh random identity for an account whose channel is unknown.
    pub fn anonymous() -> anyhow::Result<Self> {
        let mut bytes = [0u8; 16];
        SystemRandom::new()
            .fill(&mut bytes)
            .map_err(|_| anyhow::anyhow!("system random source unavailable"))?;
        Ok(Self(format!("{}{}", ANONYMOUS_PREFIX, hex::encode(bytes))))
    }

    pub fn is_anonymous(&self) -> bool {
        self.0.starts_with(ANONYMOUS_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_identity_is_deterministic() {
        let a = UserId::from_channel_id("UCxyz");
        let b = UserId::from_channel_id("UCxyz");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
        assert!(!a.is_anonymous());
    }

    #[test]
    fn hashed_identity_hides_channel_id() {
        let id = UserId::from_channel_id("UCxyz");
        assert!(!id.as_str().contains("UCxyz"));
        assert!(id
            .as_str()
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn hashed_identity_is_sha256_hex() {
        assert_eq!(
            UserId::from_channel_id("abc").as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn different_channels_hash_differently() {
        assert_ne!(
            UserId::from_channel_id("UCone"),
            UserId::from_channel_id("UCtwo")
        );
    }

    #[test]
    fn anonymous_identities_are_fresh() {
        let a = UserId::anonymous().unwrap();
        let b = UserId::anonymous().unwrap();
        assert!(a.is_anonymous());
        assert!(b.is_anonymous());
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), ANONYMOUS_PREFIX.len() + 32);
    }
}
