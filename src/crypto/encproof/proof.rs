// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Paillier encryption-in-range proof (Π^enc, CGGMP21 Figure 14): proves a
// ciphertext K encrypts a plaintext k lying in [-q^3, q^3] under a Paillier
// public key N0, using an auxiliary ring-Pedersen commitment (NTilde, s, t).

use crate::common::{
    hash::sha512_256i_tagged,
    hash_utils::rejection_sample,
    int::{is_in_interval, ModInt},
    random::{get_random_positive_int, get_random_positive_relatively_prime_int},
    slice::{bigints_to_bytes, multi_bytes_to_bigints},
};
use crate::crypto::paillier::PublicKey;

use num_bigint_dig::{BigInt, Sign};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use log::error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncProofError {
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("proof generation failed: {0}")]
    ProofGenerationError(String),
    #[error("byte conversion error: expected {expected} parts, got {got}")]
    ByteConversionError { expected: usize, got: usize },
}

const PROOF_ENC_BYTES_PARTS: usize = 6;

/// Proof that a Paillier ciphertext `k_ciphertext` encrypts a value in
/// `[-q^3, q^3]` (Fig 14).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofEnc {
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub s: BigInt,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub a: BigInt,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub c: BigInt,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub z1: BigInt,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub z2: BigInt,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub z3: BigInt,
}

impl ProofEnc {
    #[allow(clippy::too_many_arguments)]
    pub fn new<R: CryptoRng + RngCore>(
        session: &[u8],
        curve_q: &BigInt,
        n0: &BigInt,
        n_cap: &BigInt,
        s_param: &BigInt,
        t_param: &BigInt,
        k_ciphertext: &BigInt,
        k: &BigInt,
        rho: &BigInt,
        rng: &mut R,
    ) -> Result<Self, EncProofError> {
        if n0.sign() != Sign::Plus || n_cap.sign() != Sign::Plus {
            return Err(EncProofError::InvalidParameters("N0 and NTilde must be positive".to_string()));
        }

        let mod_n_cap = ModInt::new(n_cap.clone());
        let n0_square = n0 * n0;
        let mod_n0_square = ModInt::new(n0_square.clone());

        let q3 = curve_q.pow(3);
        let q_n_cap = curve_q * n_cap;
        let q3_n_cap = &q3 * n_cap;

        let alpha = get_random_positive_int(rng, &q3)
            .ok_or_else(|| EncProofError::ProofGenerationError("failed to sample alpha".to_string()))?;
        let mu = get_random_positive_int(rng, &q_n_cap)
            .ok_or_else(|| EncProofError::ProofGenerationError("failed to sample mu".to_string()))?;
        let r = get_random_positive_relatively_prime_int(rng, n0)
            .ok_or_else(|| EncProofError::ProofGenerationError("failed to sample r".to_string()))?;
        let gamma = get_random_positive_int(rng, &q3_n_cap)
            .ok_or_else(|| EncProofError::ProofGenerationError("failed to sample gamma".to_string()))?;

        // S = s^k * t^mu mod NTilde
        let s_k = mod_n_cap.exp(s_param, k);
        let t_mu = mod_n_cap.exp(t_param, &mu);
        let s_val = mod_n_cap.mul(&s_k, &t_mu);

        // A = Enc_{N0}(alpha; r) = (N0+1)^alpha * r^N0 mod N0^2
        let gamma_n0 = n0 + BigInt::from(1);
        let g_alpha = mod_n0_square.exp(&gamma_n0, &alpha);
        let r_n0 = mod_n0_square.exp(&r, n0);
        let a_val = mod_n0_square.mul(&g_alpha, &r_n0);

        // C = s^alpha * t^gamma mod NTilde
        let s_alpha = mod_n_cap.exp(s_param, &alpha);
        let t_gamma = mod_n_cap.exp(t_param, &gamma);
        let c_val = mod_n_cap.mul(&s_alpha, &t_gamma);

        let hash_input = vec![n0, n_cap, s_param, t_param, k_ciphertext, &a_val, &s_val, &c_val];
        let e_hash = sha512_256i_tagged(session, &hash_input)
            .ok_or_else(|| EncProofError::ProofGenerationError("failed to hash challenge".to_string()))?;
        let e = rejection_sample(curve_q, &e_hash);

        let z1 = &alpha + &e * k;
        let rho_e = mod_n0_square.exp(rho, &e);
        let z2 = mod_n0_square.mul(&r, &rho_e);
        let z3 = &gamma + &e * &mu;

        Ok(Self { s: s_val, a: a_val, c: c_val, z1, z2, z3 })
    }

    pub fn verify(
        &self,
        session: &[u8],
        curve_q: &BigInt,
        n0: &BigInt,
        n_cap: &BigInt,
        s_param: &BigInt,
        t_param: &BigInt,
        k_ciphertext: &BigInt,
    ) -> bool {
        if !self.validate_basic() {
            error!("ProofEnc verify: failed basic validation");
            return false;
        }

        let q3 = curve_q.pow(3);
        if !is_in_interval(&self.z1.abs(), &q3) {
            error!("ProofEnc verify: z1 out of range");
            return false;
        }

        let hash_input = vec![n0, n_cap, s_param, t_param, k_ciphertext, &self.a, &self.s, &self.c];
        let e_hash = match sha512_256i_tagged(session, &hash_input) {
            Some(h) => h,
            None => {
                error!("ProofEnc verify: failed to hash challenge");
                return false;
            }
        };
        let e = rejection_sample(curve_q, &e_hash);

        let n0_square = n0 * n0;
        let mod_n0_square = ModInt::new(n0_square);
        let mod_n_cap = ModInt::new(n_cap.clone());

        // Enc_{N0}(z1; z2) == A * K^e mod N0^2
        let gamma_n0 = n0 + BigInt::from(1);
        let g_z1 = mod_n0_square.exp(&gamma_n0, &self.z1);
        let z2_n0 = mod_n0_square.exp(&self.z2, n0);
        let lhs1 = mod_n0_square.mul(&g_z1, &z2_n0);
        let k_e = mod_n0_square.exp(k_ciphertext, &e);
        let rhs1 = mod_n0_square.mul(&self.a, &k_e);
        if lhs1 != rhs1 {
            error!("ProofEnc verify: ciphertext consistency check failed");
            return false;
        }

        // s^z1 * t^z3 == C * S^e mod NTilde
        let s_z1 = mod_n_cap.exp(s_param, &self.z1);
        let t_z3 = mod_n_cap.exp(t_param, &self.z3);
        let lhs2 = mod_n_cap.mul(&s_z1, &t_z3);
        let s_e = mod_n_cap.exp(&self.s, &e);
        let rhs2 = mod_n_cap.mul(&self.c, &s_e);
        if lhs2 != rhs2 {
            error!("ProofEnc verify: ring-Pedersen commitment check failed");
            return false;
        }

        true
    }

    pub fn validate_basic(&self) -> bool {
        self.s.sign() != Sign::NoSign
            && self.a.sign() != Sign::NoSign
            && self.c.sign() != Sign::NoSign
    }

    pub fn to_bytes(&self) -> Vec<Vec<u8>> {
        bigints_to_bytes(&[&self.s, &self.a, &self.c, &self.z1, &self.z2, &self.z3])
    }

    pub fn from_bytes(bzs: &[Vec<u8>]) -> Result<Self, EncProofError> {
        if bzs.len() != PROOF_ENC_BYTES_PARTS {
            return Err(EncProofError::ByteConversionError { expected: PROOF_ENC_BYTES_PARTS, got: bzs.len() });
        }
        let ints = multi_bytes_to_bigints(bzs);
        Ok(Self {
            s: ints[0].clone(),
            a: ints[1].clone(),
            c: ints[2].clone(),
            z1: ints[3].clone(),
            z2: ints[4].clone(),
            z3: ints[5].clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ring_pedersen_params::RingPedersenParams;
    use crate::common::safe_prime::get_safe_prime_details;
    use rand::thread_rng;

    fn get_k256_q() -> BigInt {
        let q_bytes = k256::Scalar::ORDER.to_be_bytes();
        BigInt::from_bytes_be(num_bigint_dig::Sign::Plus, &q_bytes)
    }

    #[test]
    fn test_enc_proof_create_verify() {
        let mut rng = thread_rng();
        let q = get_k256_q();
        let session = b"test_enc_proof";

        let safe_p = get_safe_prime_details(512, 1, &mut rng).unwrap();
        let safe_q = get_safe_prime_details(512, 1, &mut rng).unwrap();
        let n0 = safe_p.safe_prime() * safe_q.safe_prime();

        let rp = RingPedersenParams::new(&mut rng, 2048).unwrap();
        let n_cap = rp.n();
        let s_param = rp.s();
        let t_param = rp.t();

        let pk = PublicKey { n: n0.clone() };
        let k = get_random_positive_int(&mut rng, &q).unwrap();
        let (ciphertext, rho) = pk.encrypt_and_return_randomness(&mut rng, &k).unwrap();

        let proof = ProofEnc::new(session, &q, &n0, &n_cap, &s_param, &t_param, &ciphertext, &k, &rho, &mut rng)
            .expect("proof generation failed");

        assert!(proof.verify(session, &q, &n0, &n_cap, &s_param, &t_param, &ciphertext));
        assert!(!proof.verify(b"wrong", &q, &n0, &n_cap, &s_param, &t_param, &ciphertext));

        let mut tampered = proof.clone();
        tampered.z1 += BigInt::from(1);
        assert!(!tampered.verify(session, &q, &n0, &n_cap, &s_param, &t_param, &ciphertext));
    }
}
