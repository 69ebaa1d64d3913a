//! Argon2id password hashing for EMAIL provider credentials.

use argon2::{
    password_hash::{
        PasswordHash, PasswordHasher as Argon2PasswordHasher, PasswordVerifier, SaltString,
    },
    Argon2, Params,
};
use rand::rngs::OsRng;

pub const MIN_PASSWORD_LENGTH: usize = 8;

// 4 MiB, 3 iterations, 1 lane.
const MEMORY_KIB: u32 = 4096;
const ITERATIONS: u32 = 3;
const LANES: u32 = 1;

/// Minimum-length check applied before hashing. The original system had no
/// further composition rules.
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        ));
    }
    Ok(())
}

pub struct PasswordService;

impl PasswordService {
    pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
        let params = Params::new(MEMORY_KIB, ITERATIONS, LANES, None)
            .map_err(|_| argon2::password_hash::Error::Algorithm)?;
        let hasher = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

        let salt = SaltString::generate(&mut OsRng);
        Ok(hasher.hash_password(password.as_bytes(), &salt)?.to_string())
    }

    /// Distinguishes "wrong password" (`Ok(false)`) from a malformed or
    /// corrupt stored hash (`Err`).
    pub fn verify_password(
        password: &str,
        stored_hash: &str,
    ) -> Result<bool, argon2::password_hash::Error> {
        let parsed = PasswordHash::new(stored_hash)?;
        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
