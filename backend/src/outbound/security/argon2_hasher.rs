//! Argon2id implementation of the `PasswordHasher` port.
//!
//! Hashes are PHC strings, so parameters and salt travel with the hash and
//! older hashes keep verifying if the defaults change.

use argon2::Argon2;
use argon2::password_hash::{
    Error as PhcError, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use async_trait::async_trait;
use rand::RngCore as _;
use rand::rngs::OsRng;
use tokio::task;

use crate::domain::ports::{PasswordHasher, PasswordHasherError};

const SALT_LEN: usize = 16;

/// Argon2id password hasher with the crate's default parameters.
///
/// Each call runs on Tokio's blocking pool so request workers stay free
/// while the key derivation runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2PasswordHasher;

impl Argon2PasswordHasher {
    /// Create a hasher.
    pub const fn new() -> Self {
        Self
    }
}

fn hash_blocking(password: &str) -> Result<String, PasswordHasherError> {
    let mut salt_bytes = [0_u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|err| PasswordHasherError::hash(err.to_string()))?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| PasswordHasherError::hash(err.to_string()))
}

fn verify_blocking(password: &str, encoded: &str) -> Result<bool, PasswordHasherError> {
    let parsed = PasswordHash::new(encoded)
        .map_err(|err| PasswordHasherError::malformed_hash(err.to_string()))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(PhcError::Password) => Ok(false),
        Err(err) => Err(PasswordHasherError::hash(err.to_string())),
    }
}

async fn run_blocking<T, F>(work: F) -> Result<T, PasswordHasherError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, PasswordHasherError> + Send + 'static,
{
    task::spawn_blocking(work)
        .await
        .map_err(|err| PasswordHasherError::hash(format!("hashing task failed: {err}")))?
}

#[async_trait]
impl PasswordHasher for Argon2PasswordHasher {
    async fn hash(&self, password: &str) -> Result<String, PasswordHasherError> {
        let password = password.to_owned();
        run_blocking(move || hash_blocking(&password)).await
    }

    async fn verify(&self, password: &str, encoded: &str) -> Result<bool, PasswordHasherError> {
        let password = password.to_owned();
        let encoded = encoded.to_owned();
        run_blocking(move || verify_blocking(&password, &encoded)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[tokio::test]
    async fn hashes_verify_only_the_original_password() {
        let hasher = Argon2PasswordHasher::new();
        let encoded = hasher.hash("testpass123").await.expect("hash");
        assert!(encoded.starts_with("$argon2id$"));
        assert!(hasher.verify("testpass123", &encoded).await.expect("verify"));
        assert!(!hasher.verify("wrongpass", &encoded).await.expect("verify"));
    }

    #[tokio::test]
    async fn salts_differ_between_hashes() {
        let hasher = Argon2PasswordHasher::new();
        let first = hasher.hash("same").await.expect("hash");
        let second = hasher.hash("same").await.expect("hash");
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn malformed_hashes_are_reported() {
        let err = Argon2PasswordHasher::new()
            .verify("pw", "not-a-phc-string")
            .await
            .expect_err("malformed");
        assert!(matches!(err, PasswordHasherError::MalformedHash { .. }));
    }

    #[rstest]
    fn hashing_leaves_a_single_threaded_executor_responsive() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime");
        runtime.block_on(async {
            let hasher = Argon2PasswordHasher::new();
            let hashing = tokio::spawn(async move { hasher.hash("testpass123").await });
            // Inline hashing would finish within the first poll of the task.
            let mut turns = 0_u32;
            while !hashing.is_finished() {
                turns += 1;
                tokio::task::yield_now().await;
            }
            assert!(turns > 2, "executor stalled while hashing ({turns} turns)");
            let encoded = hashing.await.expect("join").expect("hash");
            assert!(encoded.starts_with("$argon2id$"));
        });
    }
}
