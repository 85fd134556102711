//! Argon2id password hashing.
//!
//! Hashes are PHC strings carrying their own salt and cost parameters.
//! Verification goes through `argon2`'s `PasswordVerifier`, which compares
//! digests in constant time.

use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString, rand_core::OsRng,
    },
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::task;

use crate::config::SecurityConfig;

pub struct PasswordHasher {
    params: Params,
    /// Hash of a throwaway secret with the live parameters. Verified against
    /// when a username is unknown so both failure paths do the same work.
    dummy_hash: String,
    verifications: AtomicU64,
    dummy_verifications: AtomicU64,
}

impl PasswordHasher {
    pub fn new(config: &SecurityConfig) -> Result<Self> {
        let params = Params::new(
            config.argon2_memory_cost_kib,
            config.argon2_time_cost,
            config.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;

        let mut hasher = Self {
            params,
            dummy_hash: String::new(),
            verifications: AtomicU64::new(0),
            dummy_verifications: AtomicU64::new(0),
        };
        hasher.dummy_hash = hasher
            .hash(&crate::services::token_service::random_hex(16))
            .context("Failed to prepare dummy password hash")?;

        Ok(hasher)
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

        Ok(hash.to_string())
    }

    /// Returns false for a wrong password and for an unparseable stored hash.
    #[must_use]
    pub fn verify(&self, password: &str, password_hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(password_hash) else {
            tracing::warn!("Stored password hash is not a valid PHC string");
            return false;
        };

        self.argon2()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    /// Hash on the blocking pool; Argon2 is CPU and memory heavy.
    pub async fn hash_blocking(self: &Arc<Self>, password: String) -> Result<String> {
        let hasher = Arc::clone(self);
        task::spawn_blocking(move || hasher.hash(&password))
            .await
            .context("Password hashing task panicked")?
    }

    /// Verify on the blocking pool. With `None` the password is checked
    /// against the dummy hash and the result is always false.
    pub async fn verify_blocking(
        self: &Arc<Self>,
        password: String,
        password_hash: Option<String>,
    ) -> Result<bool> {
        let hasher = Arc::clone(self);
        task::spawn_blocking(move || {
            hasher.verifications.fetch_add(1, Ordering::Relaxed);
            match password_hash {
                Some(hash) => hasher.verify(&password, &hash),
                None => {
                    hasher.dummy_verifications.fetch_add(1, Ordering::Relaxed);
                    let _ = hasher.verify(&password, &hasher.dummy_hash);
                    false
                }
            }
        })
        .await
        .context("Password verification task panicked")
    }

    /// Argon2 verifications run through [`Self::verify_blocking`].
    #[must_use]
    pub fn verifications(&self) -> u64 {
        self.verifications.load(Ordering::Relaxed)
    }

    /// How many of those ran against the dummy hash for an unknown account.
    #[must_use]
    pub fn dummy_verifications(&self) -> u64 {
        self.dummy_verifications.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap_hasher() -> PasswordHasher {
        let config = SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            ..SecurityConfig::default()
        };
        PasswordHasher::new(&config).unwrap()
    }

    #[test]
    fn hash_is_salted_and_verifies() {
        let hasher = cheap_hasher();
        let first = hasher.hash("secret1").unwrap();
        let second = hasher.hash("secret1").unwrap();

        assert!(first.starts_with("$argon2id$"));
        assert_ne!(first, second);
        assert!(!first.contains("secret1"));
        assert!(hasher.verify("secret1", &first));
        assert!(hasher.verify("secret1", &second));
        assert!(!hasher.verify("secret2", &first));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        let hasher = cheap_hasher();
        assert!(!hasher.verify("anything", "not-a-phc-string"));
    }

    #[tokio::test]
    async fn blocking_helpers_match_sync_versions() {
        let hasher = Arc::new(cheap_hasher());
        let hash = hasher.hash_blocking("pw-123456".to_string()).await.unwrap();

        assert!(
            hasher
                .verify_blocking("pw-123456".to_string(), Some(hash))
                .await
                .unwrap()
        );
        assert!(
            !hasher
                .verify_blocking("pw-123456".to_string(), None)
                .await
                .unwrap()
        );
        assert_eq!(hasher.verifications(), 2);
        assert_eq!(hasher.dummy_verifications(), 1);
    }
}
