//! Password hashing for account credentials.
//!
//! Argon2id with parameters tuned so a single verification costs on the
//! order of 100ms on commodity hardware, which is the point: stolen hashes
//! must be expensive to brute-force.

use anyhow::anyhow;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::shared::errors::{ApiError, ApiResult};

const MEMORY_COST_KIB: u32 = 65536;
const TIME_COST: u32 = 3;
const PARALLELISM: u32 = 4;
const OUTPUT_LENGTH: usize = 32;

fn hasher() -> ApiResult<Argon2<'static>> {
    let params = Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, Some(OUTPUT_LENGTH))
        .map_err(|e| ApiError::Internal(anyhow!("invalid argon2 parameters: {e}")))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(anyhow!("failed to hash password: {e}")))?;
    Ok(hash.to_string())
}

/// Returns Ok(false) on a mismatch; only malformed hashes are errors.
pub fn verify_password(password: &str, hash: &str) -> ApiResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| ApiError::Internal(anyhow!("invalid password hash format: {e}")))?;

    match hasher()?.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(ApiError::Internal(anyhow!(
            "password verification failed: {e}"
        ))),
    }
}
