// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Knowledge-of-exponent-vs-Paillier-encryption proof (Π^log*, CGGMP21
// Figure 25): proves a ciphertext `cap_c` encrypts the discrete log `x` of a
// curve point `cap_x = x*g`, for `x` in `[-q^3, q^3]`. Supersedes the
// GG18-era "PDL with slack" proof for the same statement.

use crate::common::{
    hash::sha512_256i_tagged,
    hash_utils::rejection_sample,
    int::{is_in_interval, ModInt},
    random::{get_random_positive_int, get_random_positive_relatively_prime_int},
    slice::{bigints_to_bytes, multi_bytes_to_bigints},
};
use crate::crypto::ecpoint::ECPoint;
use crate::crypto::paillier::PublicKey;

use elliptic_curve::CurveArithmetic;
use num_bigint_dig::{BigInt, Sign};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use log::error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LogStarProofError {
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("proof generation failed: {0}")]
    ProofGenerationError(String),
    #[error("point error: {0}")]
    PointError(String),
    #[error("byte conversion error: expected {expected} parts, got {got}")]
    ByteConversionError { expected: usize, got: usize },
}

const LOG_STAR_PROOF_BYTES_PARTS: usize = 8;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofLogStar<C: CurveArithmetic> {
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub s: BigInt,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub a: BigInt,
    #[serde(bound(serialize = "ECPoint<C>: Serialize", deserialize = "ECPoint<C>: Deserialize<'de>"))]
    pub y: ECPoint<C>,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub d: BigInt,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub z1: BigInt,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub z2: BigInt,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub z3: BigInt,
}

impl<C> ProofLogStar<C>
where
    C: CurveArithmetic,
    ECPoint<C>: Clone + PartialEq + Serialize + for<'de> Deserialize<'de>,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new<R: CryptoRng + RngCore>(
        session: &[u8],
        curve_q: &BigInt,
        n0: &BigInt,
        n_cap: &BigInt,
        s_param: &BigInt,
        t_param: &BigInt,
        cap_c: &BigInt,
        g: &ECPoint<C>,
        cap_x: &ECPoint<C>,
        x: &BigInt,
        rho: &BigInt,
        rng: &mut R,
    ) -> Result<Self, LogStarProofError> {
        if n0.sign() != Sign::Plus || n_cap.sign() != Sign::Plus {
            return Err(LogStarProofError::InvalidParameters("N0 and NTilde must be positive".to_string()));
        }

        let mod_n_cap = ModInt::new(n_cap.clone());
        let n0_square = n0 * n0;
        let mod_n0_square = ModInt::new(n0_square.clone());

        let q3 = curve_q.pow(3);
        let q_n_cap = curve_q * n_cap;
        let q3_n_cap = &q3 * n_cap;

        let alpha = get_random_positive_int(rng, &q3)
            .ok_or_else(|| LogStarProofError::ProofGenerationError("failed to sample alpha".to_string()))?;
        let mu = get_random_positive_int(rng, &q_n_cap)
            .ok_or_else(|| LogStarProofError::ProofGenerationError("failed to sample mu".to_string()))?;
        let r = get_random_positive_relatively_prime_int(rng, n0)
            .ok_or_else(|| LogStarProofError::ProofGenerationError("failed to sample r".to_string()))?;
        let gamma = get_random_positive_int(rng, &q3_n_cap)
            .ok_or_else(|| LogStarProofError::ProofGenerationError("failed to sample gamma".to_string()))?;

        let s_x = mod_n_cap.exp(s_param, x);
        let t_mu = mod_n_cap.exp(t_param, &mu);
        let s_val = mod_n_cap.mul(&s_x, &t_mu);

        let gamma_n0 = n0 + BigInt::from(1);
        let g_alpha = mod_n0_square.exp(&gamma_n0, &alpha);
        let r_n0 = mod_n0_square.exp(&r, n0);
        let a_val = mod_n0_square.mul(&g_alpha, &r_n0);

        let y_val = g.scalar_mul(&alpha);

        let s_alpha = mod_n_cap.exp(s_param, &alpha);
        let t_gamma = mod_n_cap.exp(t_param, &gamma);
        let d_val = mod_n_cap.mul(&s_alpha, &t_gamma);

        let (gx, gy) = (g.x(), g.y());
        let (xx, xy) = (cap_x.x(), cap_x.y());
        let hash_input = vec![n0, n_cap, s_param, t_param, cap_c, &gx, &gy, &xx, &xy, &a_val, &y_val.x(), &y_val.y(), &s_val, &d_val];
        let e_hash = sha512_256i_tagged(session, &hash_input)
            .ok_or_else(|| LogStarProofError::ProofGenerationError("failed to hash challenge".to_string()))?;
        let e = rejection_sample(curve_q, &e_hash);

        let z1 = &alpha + &e * x;
        let rho_e = mod_n0_square.exp(rho, &e);
        let z2 = mod_n0_square.mul(&r, &rho_e);
        let z3 = &gamma + &e * &mu;

        Ok(Self { s: s_val, a: a_val, y: y_val, d: d_val, z1, z2, z3 })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn verify(
        &self,
        session: &[u8],
        curve_q: &BigInt,
        n0: &BigInt,
        n_cap: &BigInt,
        s_param: &BigInt,
        t_param: &BigInt,
        cap_c: &BigInt,
        g: &ECPoint<C>,
        cap_x: &ECPoint<C>,
    ) -> bool {
        let q3 = curve_q.pow(3);
        if !is_in_interval(&self.z1.abs(), &q3) {
            error!("ProofLogStar verify: z1 out of range");
            return false;
        }

        let (gx, gy) = (g.x(), g.y());
        let (xx, xy) = (cap_x.x(), cap_x.y());
        let hash_input = vec![n0, n_cap, s_param, t_param, cap_c, &gx, &gy, &xx, &xy, &self.a, &self.y.x(), &self.y.y(), &self.s, &self.d];
        let e_hash = match sha512_256i_tagged(session, &hash_input) {
            Some(h) => h,
            None => {
                error!("ProofLogStar verify: failed to hash challenge");
                return false;
            }
        };
        let e = rejection_sample(curve_q, &e_hash);

        let n0_square = n0 * n0;
        let mod_n0_square = ModInt::new(n0_square);
        let mod_n_cap = ModInt::new(n_cap.clone());

        let gamma_n0 = n0 + BigInt::from(1);
        let g_z1 = mod_n0_square.exp(&gamma_n0, &self.z1);
        let z2_n0 = mod_n0_square.exp(&self.z2, n0);
        let lhs1 = mod_n0_square.mul(&g_z1, &z2_n0);
        let c_e = mod_n0_square.exp(cap_c, &e);
        let rhs1 = mod_n0_square.mul(&self.a, &c_e);
        if lhs1 != rhs1 {
            error!("ProofLogStar verify: ciphertext consistency check failed");
            return false;
        }

        let lhs2 = g.scalar_mul(&self.z1);
        let rhs2 = match self.y.add(&cap_x.scalar_mul(&e)) {
            Ok(p) => p,
            Err(_) => return false,
        };
        if lhs2 != rhs2 {
            error!("ProofLogStar verify: discrete-log consistency check failed");
            return false;
        }

        let s_z1 = mod_n_cap.exp(s_param, &self.z1);
        let t_z3 = mod_n_cap.exp(t_param, &self.z3);
        let lhs3 = mod_n_cap.mul(&s_z1, &t_z3);
        let s_e = mod_n_cap.exp(&self.s, &e);
        let rhs3 = mod_n_cap.mul(&self.d, &s_e);
        if lhs3 != rhs3 {
            error!("ProofLogStar verify: ring-Pedersen commitment check failed");
            return false;
        }

        true
    }

    pub fn to_bytes(&self) -> Vec<Vec<u8>> {
        let (yx, yy) = (self.y.x(), self.y.y());
        bigints_to_bytes(&[&self.s, &self.a, &yx, &yy, &self.d, &self.z1, &self.z2, &self.z3])
    }

    pub fn from_bytes(bzs: &[Vec<u8>]) -> Result<Self, LogStarProofError> {
        if bzs.len() != LOG_STAR_PROOF_BYTES_PARTS {
            return Err(LogStarProofError::ByteConversionError { expected: LOG_STAR_PROOF_BYTES_PARTS, got: bzs.len() });
        }
        let ints = multi_bytes_to_bigints(bzs);
        let y = ECPoint::from_coords(&ints[2], &ints[3]).map_err(|e| LogStarProofError::PointError(e.to_string()))?;
        Ok(Self {
            s: ints[0].clone(),
            a: ints[1].clone(),
            y,
            d: ints[4].clone(),
            z1: ints[5].clone(),
            z2: ints[6].clone(),
            z3: ints[7].clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ring_pedersen_params::RingPedersenParams;
    use crate::common::safe_prime::get_safe_prime_details;
    use k256::Secp256k1;
    use rand::thread_rng;

    fn get_k256_q() -> BigInt {
        let q_bytes = k256::Scalar::ORDER.to_be_bytes();
        BigInt::from_bytes_be(num_bigint_dig::Sign::Plus, &q_bytes)
    }

    #[test]
    fn test_log_star_proof_create_verify() {
        let mut rng = thread_rng();
        let q = get_k256_q();
        let session = b"test_log_star_proof";

        let safe_p = get_safe_prime_details(512, 1, &mut rng).unwrap();
        let safe_q = get_safe_prime_details(512, 1, &mut rng).unwrap();
        let n0 = safe_p.safe_prime() * safe_q.safe_prime();

        let rp = RingPedersenParams::new(&mut rng, 2048).unwrap();
        let n_cap = rp.n();
        let s_param = rp.s();
        let t_param = rp.t();

        let pk = PublicKey { n: n0.clone() };
        let x = get_random_positive_int(&mut rng, &q).unwrap();
        let (cap_c, rho) = pk.encrypt_and_return_randomness(&mut rng, &x).unwrap();
        let g = ECPoint::<Secp256k1>::generator();
        let cap_x = g.scalar_mul(&x);

        let proof = ProofLogStar::new(session, &q, &n0, &n_cap, &s_param, &t_param, &cap_c, &g, &cap_x, &x, &rho, &mut rng)
            .expect("proof generation failed");

        assert!(proof.verify(session, &q, &n0, &n_cap, &s_param, &t_param, &cap_c, &g, &cap_x));
        assert!(!proof.verify(b"wrong", &q, &n0, &n_cap, &s_param, &t_param, &cap_c, &g, &cap_x));
    }
}
