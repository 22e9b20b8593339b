//! Threshold secret sharing for paper keys
//!
//! Splits a symmetric key into n shares with threshold k using polynomial
//! secret sharing over GF(256). Each byte of the key is protected by its own
//! random polynomial with the key byte as constant term; a share is the
//! polynomial evaluations at a fixed non-zero x-index. Any k shares recover
//! the key via Lagrange interpolation at x = 0; fewer than k reveal nothing.

use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Error, Result};

/// Share x-coordinate. Must be non-zero and unique per split.
pub type ShareIndex = u8;

/// One fragment of a split key
///
/// Alone it carries no information about the key. Shares are only meaningful
/// together with other shares produced by the same `split` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct KeyShare {
    /// x-coordinate of the polynomial evaluations (1-based)
    pub index: ShareIndex,

    /// Shares required to reconstruct the key
    pub threshold: u8,

    /// Polynomial evaluations, one byte per secret byte
    #[serde(with = "hex::serde")]
    pub value: Vec<u8>,
}

impl KeyShare {
    /// Encode as hex for out-of-band dispatch to a guardian
    pub fn to_hex(&self) -> String {
        hex::encode(&self.value)
    }
}

/// Split `secret` into `n` shares requiring `k` to reconstruct
///
/// Requires `1 <= k <= n <= 255` and a non-empty secret. Coefficients are
/// drawn from the OS RNG.
pub fn split(secret: &[u8], n: u8, k: u8) -> Result<Vec<KeyShare>> {
    if secret.is_empty() {
        return Err(Error::InvalidThreshold("secret must not be empty".into()));
    }
    if k == 0 || k > n {
        return Err(Error::InvalidThreshold(format!(
            "threshold {} out of range for {} shares",
            k, n
        )));
    }

    let mut shares: Vec<KeyShare> = (1..=n)
        .map(|index| KeyShare {
            index,
            threshold: k,
            value: vec![0u8; secret.len()],
        })
        .collect();

    let mut coeffs = vec![Gf256::ZERO; k as usize];
    for (byte_index, &secret_byte) in secret.iter().enumerate() {
        // Constant term is the secret byte, higher coefficients are random
        coeffs[0] = Gf256(secret_byte);
        for c in coeffs.iter_mut().skip(1) {
            let mut b = [0u8; 1];
            OsRng.fill_bytes(&mut b);
            *c = Gf256(b[0]);
        }

        for share in &mut shares {
            share.value[byte_index] = Gf256::eval_poly(&coeffs, Gf256(share.index)).0;
        }
    }
    for c in coeffs.iter_mut() {
        c.0 = 0;
    }

    Ok(shares)
}

/// Reconstruct the key from at least `threshold` shares
///
/// Fails with `InsufficientShares` below the threshold, `DuplicateShare` on
/// repeated x-indices, and `InvalidShare` on malformed input (zero index,
/// mismatched threshold or length).
pub fn combine(shares: &[KeyShare]) -> Result<Vec<u8>> {
    let first = shares.first().ok_or(Error::InsufficientShares {
        got: 0,
        need: 1,
    })?;

    let threshold = first.threshold as usize;
    let secret_len = first.value.len();

    if shares.len() < threshold {
        return Err(Error::InsufficientShares {
            got: shares.len(),
            need: threshold,
        });
    }

    let mut seen = [false; 256];
    for share in shares.iter().take(threshold) {
        if share.index == 0 {
            return Err(Error::InvalidShare("share index must be non-zero".into()));
        }
        if seen[share.index as usize] {
            return Err(Error::DuplicateShare(share.index));
        }
        seen[share.index as usize] = true;

        if share.threshold as usize != threshold {
            return Err(Error::InvalidShare(format!(
                "threshold mismatch: {} vs {}",
                share.threshold, threshold
            )));
        }
        if share.value.len() != secret_len {
            return Err(Error::InvalidShare(format!(
                "length mismatch: {} vs {}",
                share.value.len(),
                secret_len
            )));
        }
    }

    let mut secret = vec![0u8; secret_len];
    let mut points = Vec::with_capacity(threshold);
    for (byte_index, out) in secret.iter_mut().enumerate() {
        points.clear();
        for share in shares.iter().take(threshold) {
            points.push((Gf256(share.index), Gf256(share.value[byte_index])));
        }
        *out = Gf256::lagrange_at_zero(&points).0;
    }

    Ok(secret)
}

/// Element of GF(256) with the AES reduction polynomial
#[derive(Clone, Copy, PartialEq, Eq)]
struct Gf256(u8);

impl Gf256 {
    const ZERO: Self = Gf256(0);
    const ONE: Self = Gf256(1);

    fn add(self, rhs: Self) -> Self {
        Gf256(self.0 ^ rhs.0)
    }

    fn mul(self, rhs: Self) -> Self {
        let mut a = self.0;
        let mut b = rhs.0;
        let mut res = 0u8;
        while b != 0 {
            if b & 1 != 0 {
                res ^= a;
            }
            let carry = a & 0x80;
            a <<= 1;
            if carry != 0 {
                // x^8 + x^4 + x^3 + x + 1
                a ^= 0x1B;
            }
            b >>= 1;
        }
        Gf256(res)
    }

    /// Multiplicative inverse via a^254; zero has no inverse
    fn invert(self) -> Result<Self> {
        if self.0 == 0 {
            return Err(Error::InvalidShare("zero element has no inverse".into()));
        }
        let mut t = self;
        for _ in 0..253 {
            t = t.mul(self);
        }
        Ok(t)
    }

    /// Horner evaluation of a polynomial given in increasing-degree order
    fn eval_poly(coeffs: &[Self], x: Self) -> Self {
        let mut acc = Gf256::ZERO;
        for &c in coeffs.iter().rev() {
            acc = acc.mul(x).add(c);
        }
        acc
    }

    /// Interpolate f(0) from (x, y) points with distinct non-zero x
    fn lagrange_at_zero(points: &[(Self, Self)]) -> Self {
        let mut acc = Gf256::ZERO;
        for (i, &(xi, yi)) in points.iter().enumerate() {
            let mut num = Gf256::ONE;
            let mut den = Gf256::ONE;
            for (j, &(xj, _)) in points.iter().enumerate() {
                if i != j {
                    num = num.mul(xj);
                    // Subtraction is XOR in GF(2^8)
                    den = den.mul(xj.add(xi));
                }
            }
            // den is a product of non-zero elements, so invert cannot fail
            let basis = num.mul(den.invert().unwrap_or(Gf256::ZERO));
            acc = acc.add(basis.mul(yi));
        }
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_combine_roundtrip() {
        let secret = [0x42u8; 32];
        let shares = split(&secret, 3, 3).unwrap();
        assert_eq!(shares.len(), 3);

        let recovered = combine(&shares).unwrap();
        assert_eq!(recovered, secret);
    }

    #[test]
    fn test_combine_any_k_of_n() {
        let secret = b"the paper key material".to_vec();
        let shares = split(&secret, 5, 3).unwrap();

        // Any 3 of the 5 shares reconstruct the secret
        let subset = vec![shares[4].clone(), shares[1].clone(), shares[3].clone()];
        assert_eq!(combine(&subset).unwrap(), secret);
    }

    #[test]
    fn test_insufficient_shares() {
        let shares = split(&[7u8; 16], 3, 3).unwrap();
        let result = combine(&shares[..2]);
        assert!(matches!(
            result,
            Err(Error::InsufficientShares { got: 2, need: 3 })
        ));
    }

    #[test]
    fn test_duplicate_share_index() {
        let shares = split(&[7u8; 16], 3, 3).unwrap();
        let dup = vec![shares[0].clone(), shares[0].clone(), shares[1].clone()];
        assert!(matches!(combine(&dup), Err(Error::DuplicateShare(_))));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let mut shares = split(&[7u8; 16], 3, 3).unwrap();
        shares[1].value.truncate(8);
        assert!(matches!(combine(&shares), Err(Error::InvalidShare(_))));
    }

    #[test]
    fn test_zero_index_rejected() {
        let mut shares = split(&[7u8; 16], 3, 3).unwrap();
        shares[0].index = 0;
        assert!(matches!(combine(&shares), Err(Error::InvalidShare(_))));
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(split(&[1u8; 4], 3, 0).is_err());
        assert!(split(&[1u8; 4], 3, 4).is_err());
        assert!(split(&[], 3, 3).is_err());
    }

    #[test]
    fn test_shares_differ_from_secret() {
        let secret = [0xA5u8; 32];
        let shares = split(&secret, 3, 3).unwrap();
        for share in &shares {
            assert_ne!(share.value.as_slice(), secret.as_slice());
        }
    }

    #[test]
    fn test_gf256_inverse() {
        for v in 1..=255u8 {
            let e = Gf256(v);
            assert_eq!(e.mul(e.invert().unwrap()).0, 1);
        }
    }
}
