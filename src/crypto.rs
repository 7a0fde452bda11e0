//! Textbook RSA-style encrypt/decrypt, reused as both an envelope and a
//! signing primitive. No padding scheme is applied — spec is explicit that
//! adding PKCS#1/OAEP here would break interop with existing key files, and
//! this crate is not trying to be production cryptography.

use num_bigint::BigUint;
use sha2::{Digest, Sha256};

use crate::bigint::pow_mod;
use crate::error::CryptoError;
use crate::keys::CompositeKey;

/// Interprets the UTF-8 bytes of `msg` as a little-endian integer `m < n`
/// and returns the base64 wire form of `m^e mod n`.
pub fn encrypt(e: &BigUint, n: &BigUint, msg: &str) -> Result<String, CryptoError> {
    let m = BigUint::from_bytes_le(msg.as_bytes());
    if &m >= n {
        return Err(CryptoError::MessageTooLarge);
    }
    let c = pow_mod(&m, e, n);
    Ok(crate::keys::int_to_wire(&c))
}

/// Inverse of [`encrypt`]: decodes `wire`, raises it to `d mod n`, and
/// interprets the result as UTF-8 text.
pub fn decrypt(d: &BigUint, n: &BigUint, wire: &str) -> Result<String, CryptoError> {
    let c = crate::keys::wire_to_int(wire).map_err(|_| CryptoError::InvalidUtf8)?;
    let m = pow_mod(&c, d, n);
    String::from_utf8(m.to_bytes_le()).map_err(|_| CryptoError::InvalidUtf8)
}

/// [`encrypt`] split from a composite key.
pub fn encrypt_with_key(key: &CompositeKey, msg: &str) -> Result<String, CryptoError> {
    encrypt(&key.value, &key.modulus, msg)
}

/// [`decrypt`] split from a composite key.
pub fn decrypt_with_key(key: &CompositeKey, wire: &str) -> Result<String, CryptoError> {
    decrypt(&key.value, &key.modulus, wire)
}

/// Hex-encoded SHA-256 digest of the given fields, concatenated in the
/// order the caller provides them.
pub fn sha256_hex(parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hex::encode(hasher.finalize())
}

/// Signs a digest under a private key: `encrypt_with_key(private, digest)`.
pub fn sign(private: &CompositeKey, digest_hex: &str) -> Result<String, CryptoError> {
    encrypt_with_key(private, digest_hex)
}

/// Verifies a signature under the matching public key by decrypting and
/// comparing against a freshly computed digest.
pub fn verify(public: &CompositeKey, signature: &str, digest_hex: &str) -> bool {
    match decrypt_with_key(public, signature) {
        Ok(recovered) => recovered == digest_hex,
        Err(_) => false,
    }
}
