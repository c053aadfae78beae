// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Paillier multiplication proof (Π^mul, CGGMP21 Figure 29): proves that a
// ciphertext `cap_c` encrypts the product of the plaintext `x` hidden in
// `cap_x = Enc(x; rho_x)` with the plaintext hidden in `cap_y`, i.e.
// `cap_c = cap_y^x * rho^N mod N^2`, without revealing `x`.

use crate::common::{
    hash::sha512_256i_tagged,
    hash_utils::rejection_sample,
    int::ModInt,
    random::get_random_positive_relatively_prime_int,
    slice::{bigints_to_bytes, multi_bytes_to_bigints},
};

use num_bigint_dig::{BigInt, Sign};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use log::error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MulProofError {
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("proof generation failed: {0}")]
    ProofGenerationError(String),
    #[error("byte conversion error: expected {expected} parts, got {got}")]
    ByteConversionError { expected: usize, got: usize },
}

const PROOF_MUL_BYTES_PARTS: usize = 5;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofMul {
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub a: BigInt,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub b: BigInt,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub z: BigInt,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub u: BigInt,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub v: BigInt,
}

impl ProofMul {
    #[allow(clippy::too_many_arguments)]
    pub fn new<R: CryptoRng + RngCore>(
        session: &[u8],
        n: &BigInt,
        cap_x: &BigInt,
        cap_y: &BigInt,
        cap_c: &BigInt,
        x: &BigInt,
        rho_x: &BigInt,
        rho: &BigInt,
        rng: &mut R,
    ) -> Result<Self, MulProofError> {
        if n.sign() != Sign::Plus {
            return Err(MulProofError::InvalidParameters("N must be positive".to_string()));
        }

        let n_square = n * n;
        let mod_n_square = ModInt::new(n_square);

        let alpha = get_random_positive_relatively_prime_int(rng, n)
            .ok_or_else(|| MulProofError::ProofGenerationError("failed to sample alpha".to_string()))?;
        let r = get_random_positive_relatively_prime_int(rng, n)
            .ok_or_else(|| MulProofError::ProofGenerationError("failed to sample r".to_string()))?;
        let s = get_random_positive_relatively_prime_int(rng, n)
            .ok_or_else(|| MulProofError::ProofGenerationError("failed to sample s".to_string()))?;

        // A = Enc_N(alpha; r) mod N^2
        let gamma_n = n + BigInt::from(1);
        let g_alpha = mod_n_square.exp(&gamma_n, &alpha);
        let r_n = mod_n_square.exp(&r, n);
        let a_val = mod_n_square.mul(&g_alpha, &r_n);

        // B = Y^alpha * s^N mod N^2
        let y_alpha = mod_n_square.exp(cap_y, &alpha);
        let s_n = mod_n_square.exp(&s, n);
        let b_val = mod_n_square.mul(&y_alpha, &s_n);

        let hash_input = vec![n, cap_x, cap_y, cap_c, &a_val, &b_val];
        let e_hash = sha512_256i_tagged(session, &hash_input)
            .ok_or_else(|| MulProofError::ProofGenerationError("failed to hash challenge".to_string()))?;
        let e = rejection_sample(n, &e_hash);

        let z = &alpha + &e * x;
        let rho_x_e = mod_n_square.exp(rho_x, &e);
        let u = mod_n_square.mul(&r, &rho_x_e);
        let rho_e = mod_n_square.exp(rho, &e);
        let v = mod_n_square.mul(&s, &rho_e);

        Ok(Self { a: a_val, b: b_val, z, u, v })
    }

    pub fn verify(&self, session: &[u8], n: &BigInt, cap_x: &BigInt, cap_y: &BigInt, cap_c: &BigInt) -> bool {
        if self.a.sign() == Sign::NoSign || self.b.sign() == Sign::NoSign {
            error!("ProofMul verify: failed basic validation");
            return false;
        }

        let hash_input = vec![n, cap_x, cap_y, cap_c, &self.a, &self.b];
        let e_hash = match sha512_256i_tagged(session, &hash_input) {
            Some(h) => h,
            None => {
                error!("ProofMul verify: failed to hash challenge");
                return false;
            }
        };
        let e = rejection_sample(n, &e_hash);

        let n_square = n * n;
        let mod_n_square = ModInt::new(n_square);

        // Enc_N(z; u) == A * X^e mod N^2
        let gamma_n = n + BigInt::from(1);
        let g_z = mod_n_square.exp(&gamma_n, &self.z);
        let u_n = mod_n_square.exp(&self.u, n);
        let lhs1 = mod_n_square.mul(&g_z, &u_n);
        let x_e = mod_n_square.exp(cap_x, &e);
        let rhs1 = mod_n_square.mul(&self.a, &x_e);
        if lhs1 != rhs1 {
            error!("ProofMul verify: X-ciphertext relation check failed");
            return false;
        }

        // Y^z * v^N == B * C^e mod N^2
        let y_z = mod_n_square.exp(cap_y, &self.z);
        let v_n = mod_n_square.exp(&self.v, n);
        let lhs2 = mod_n_square.mul(&y_z, &v_n);
        let c_e = mod_n_square.exp(cap_c, &e);
        let rhs2 = mod_n_square.mul(&self.b, &c_e);
        if lhs2 != rhs2 {
            error!("ProofMul verify: C-ciphertext relation check failed");
            return false;
        }

        true
    }

    pub fn to_bytes(&self) -> Vec<Vec<u8>> {
        bigints_to_bytes(&[&self.a, &self.b, &self.z, &self.u, &self.v])
    }

    pub fn from_bytes(bzs: &[Vec<u8>]) -> Result<Self, MulProofError> {
        if bzs.len() != PROOF_MUL_BYTES_PARTS {
            return Err(MulProofError::ByteConversionError { expected: PROOF_MUL_BYTES_PARTS, got: bzs.len() });
        }
        let ints = multi_bytes_to_bigints(bzs);
        Ok(Self { a: ints[0].clone(), b: ints[1].clone(), z: ints[2].clone(), u: ints[3].clone(), v: ints[4].clone() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::random::get_random_positive_int;
    use crate::common::safe_prime::get_safe_prime_details;
    use crate::crypto::paillier::PublicKey;
    use rand::thread_rng;

    #[test]
    fn test_mul_proof_create_verify() {
        let mut rng = thread_rng();
        let session = b"test_mul_proof";

        let p = get_safe_prime_details(512, 1, &mut rng).unwrap();
        let q = get_safe_prime_details(512, 1, &mut rng).unwrap();
        let n = p.safe_prime() * q.safe_prime();
        let pk = PublicKey { n: n.clone() };

        let x = get_random_positive_int(&mut rng, &n).unwrap();
        let y = get_random_positive_int(&mut rng, &n).unwrap();
        let (cap_x, rho_x) = pk.encrypt_and_return_randomness(&mut rng, &x).unwrap();
        let (cap_y, _) = pk.encrypt_and_return_randomness(&mut rng, &y).unwrap();

        let n_square = &n * &n;
        let mod_n_square = ModInt::new(n_square);
        let rho = get_random_positive_relatively_prime_int(&mut rng, &n).unwrap();
        let y_x = mod_n_square.exp(&cap_y, &x);
        let rho_n = mod_n_square.exp(&rho, &n);
        let cap_c = mod_n_square.mul(&y_x, &rho_n);

        let proof = ProofMul::new(session, &n, &cap_x, &cap_y, &cap_c, &x, &rho_x, &rho, &mut rng)
            .expect("proof generation failed");

        assert!(proof.verify(session, &n, &cap_x, &cap_y, &cap_c));
        assert!(!proof.verify(b"wrong", &n, &cap_x, &cap_y, &cap_c));
    }
}
