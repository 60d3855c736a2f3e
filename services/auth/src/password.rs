//! Salted password digests.
//!
//! Digests are stored as `{hex(derived_hash)}.{hex(salt)}`. The
//! delimiter never occurs in hex output, so splitting is unambiguous.
//! Derivation uses scrypt with fixed cost parameters; the cost is the
//! security feature, which is why callers run these functions under
//! `spawn_blocking` rather than on the async workers.

use anyhow::{Context, Result};
use rand::RngCore;
use scrypt::Params;

/// Salt length in bytes before hex encoding.
const SALT_LEN: usize = 16;

/// Derived hash length in bytes before hex encoding.
const HASH_LEN: usize = 64;

/// scrypt cost: N = 2^14, r = 8, p = 1.
const LOG_N: u8 = 14;
const R: u32 = 8;
const P: u32 = 1;

fn params() -> Result<Params> {
    Params::new(LOG_N, R, P, HASH_LEN).context("invalid scrypt parameters")
}

fn derive(plaintext: &str, salt: &[u8]) -> Result<[u8; HASH_LEN]> {
    let mut out = [0u8; HASH_LEN];
    scrypt::scrypt(plaintext.as_bytes(), salt, &params()?, &mut out)
        .context("scrypt derivation failed")?;
    Ok(out)
}

/// Derive a digest from a plaintext password with a fresh random salt.
pub fn hash(plaintext: &str) -> Result<String> {
    let mut salt = [0u8; SALT_LEN];
    rand::rngs::OsRng.fill_bytes(&mut salt);

    let derived = derive(plaintext, &salt)?;
    Ok(format!("{}.{}", hex::encode(derived), hex::encode(salt)))
}

/// Verify a plaintext password against a stored digest.
///
/// Returns `false` on any malformed digest (missing delimiter, non-hex
/// components) rather than erroring; a corrupted stored digest must read
/// as "wrong password", never as a server fault.
pub fn verify(plaintext: &str, digest: &str) -> bool {
    let Some((hash_hex, salt_hex)) = digest.split_once('.') else {
        return false;
    };
    let Ok(stored_hash) = hex::decode(hash_hex) else {
        return false;
    };
    let Ok(salt) = hex::decode(salt_hex) else {
        return false;
    };

    let Ok(derived) = derive(plaintext, &salt) else {
        return false;
    };
    constant_time_eq(&derived, &stored_hash)
}

/// Burn one full derivation against a fixed salt. The authenticator
/// calls this on the unknown-user path so a lookup miss costs the same
/// as a wrong password.
pub fn dummy_verify(plaintext: &str) {
    let _ = derive(plaintext, &[0u8; SALT_LEN]);
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
