//! Cryptographic utilities for reset token generation
//!
//! Reset tokens carry 256 bits of entropy from the operating system CSPRNG,
//! which makes brute-force guessing infeasible over the one-hour token
//! lifetime. Tokens are hex-encoded so they survive URLs and email clients
//! unescaped.

use rand::{TryRngCore, rngs::OsRng};

/// Number of random bytes in a reset token (hex-encodes to 64 characters).
pub const RESET_TOKEN_BYTES: usize = 32;

/// Generate a cryptographically secure password reset token.
///
/// # Returns
///
/// A hex-encoded random token (64 characters).
///
/// # Panics
///
/// Panics if the OS random number generator fails. This indicates a critical
/// system failure (e.g., /dev/urandom unavailable) from which recovery is not
/// possible for security-sensitive operations.
pub fn generate_reset_token() -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .expect("OS RNG failure - system entropy source unavailable");
    hex::encode(bytes)
}
