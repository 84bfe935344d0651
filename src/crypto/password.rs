//! Staff password hashing.
//!
//! PBKDF2-SHA256 with a per-account random salt. Verification compares
//! digests in constant time.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::keys::{generate_salt, KEY_LENGTH};

#[cfg(not(test))]
const STAFF_ITERATIONS: u32 = super::keys::PBKDF2_ITERATIONS;
// Test builds hash fast; stored hashes never outlive the test process
#[cfg(test)]
const STAFF_ITERATIONS: u32 = 1_000;

/// Hash a password with a fresh salt. Returns `(hash, salt)`.
pub fn hash_password(password: &str) -> (Vec<u8>, Vec<u8>) {
    let salt = generate_salt();
    let hash = derive(password, &salt, STAFF_ITERATIONS);
    (hash, salt.to_vec())
}

/// Check a password against a stored hash + salt.
pub fn verify_password(password: &str, hash: &[u8], salt: &[u8]) -> bool {
    let candidate = derive(password, salt, STAFF_ITERATIONS);
    candidate.ct_eq(hash).into()
}

fn derive(password: &str, salt: &[u8], iterations: u32) -> Vec<u8> {
    let mut out = vec![0u8; KEY_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut out);
    out
}
