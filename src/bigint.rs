//! Arbitrary-precision integer primitives.
//!
//! Thin wrappers over `num-bigint` / `num-traits` — there is nothing novel
//! here, the crate already does the hard part. This module exists so the
//! rest of the codebase has one place to go for modular exponentiation and
//! modular inverses instead of reaching for `num_bigint` directly.

use num_bigint::BigUint;
use num_traits::{One, Zero};

use crate::error::CryptoError;

/// `base^exp mod modulus`.
pub fn pow_mod(base: &BigUint, exp: &BigUint, modulus: &BigUint) -> BigUint {
    base.modpow(exp, modulus)
}

/// Greatest common divisor of two non-negative integers.
pub fn gcd(a: &BigUint, b: &BigUint) -> BigUint {
    let (mut a, mut b) = (a.clone(), b.clone());
    while !b.is_zero() {
        let r = &a % &b;
        a = b;
        b = r;
    }
    a
}

/// Extended Euclidean algorithm over signed big integers, returning
/// `(gcd, x, y)` such that `a*x + b*y == gcd`.
///
/// Used to derive the RSA-style decryption exponent `d = e^-1 mod totient`.
fn extended_gcd_signed(a: &num_bigint::BigInt, b: &num_bigint::BigInt) -> (num_bigint::BigInt, num_bigint::BigInt, num_bigint::BigInt) {
    use num_bigint::BigInt;
    if b.is_zero() {
        return (a.clone(), BigInt::one(), BigInt::zero());
    }
    let (g, x1, y1) = extended_gcd_signed(b, &(a % b));
    let x = y1.clone();
    let y = x1 - (a / b) * y1;
    (g, x, y)
}

/// Modular inverse of `a` modulo `modulus`: the `d` such that `a*d ≡ 1 (mod modulus)`.
///
/// Fails with [`CryptoError::NoModularInverse`] when `gcd(a, modulus) != 1`.
pub fn mod_inverse(a: &BigUint, modulus: &BigUint) -> Result<BigUint, CryptoError> {
    use num_bigint::BigInt;
    let a_signed = BigInt::from(a.clone());
    let m_signed = BigInt::from(modulus.clone());
    let (g, x, _y) = extended_gcd_signed(&a_signed, &m_signed);
    if g != BigInt::one() {
        return Err(CryptoError::NoModularInverse);
    }
    let m = m_signed.clone();
    let inv = ((x % &m) + &m) % &m;
    Ok(inv.to_biguint().expect("non-negative by construction"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pow_mod_matches_naive() {
        let base = BigUint::from(4u32);
        let exp = BigUint::from(13u32);
        let modulus = BigUint::from(497u32);
        assert_eq!(pow_mod(&base, &exp, &modulus), BigUint::from(445u32));
    }

    #[test]
    fn gcd_of_coprime_is_one() {
        assert_eq!(gcd(&BigUint::from(17u32), &BigUint::from(13u32)), BigUint::one());
    }

    #[test]
    fn mod_inverse_round_trips() {
        let e = BigUint::from(17u32);
        let totient = BigUint::from(3120u32);
        let d = mod_inverse(&e, &totient).unwrap();
        assert_eq!((&e * &d) % &totient, BigUint::one());
    }

    #[test]
    fn mod_inverse_rejects_non_coprime() {
        let a = BigUint::from(4u32);
        let m = BigUint::from(8u32);
        assert!(mod_inverse(&a, &m).is_err());
    }
}
