// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Paillier affine-operation-with-group-commitment-in-range proof (Π^aff-g,
// CGGMP21 Figure 15): ties together two Paillier public keys N0 and N1 and a
// curve point. Proves knowledge of x, y, rho, rho_y such that
// `cap_d = cap_c^x * Enc_{N0}(y; rho)`, `cap_y = Enc_{N1}(y; rho_y)`, and
// `cap_x = x*g`, with x and y in their respective ranges. This is the core
// building block of the MtA-with-group-commitment step used in threshold
// presigning.

use crate::common::{
    hash::sha512_256i_tagged,
    hash_utils::rejection_sample,
    int::{is_in_interval, ModInt},
    random::{get_random_positive_int, get_random_positive_relatively_prime_int},
    slice::{bigints_to_bytes, multi_bytes_to_bigints},
};
use crate::crypto::ecpoint::ECPoint;

use elliptic_curve::CurveArithmetic;
use num_bigint_dig::{BigInt, Sign};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use log::error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AffGProofError {
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("proof generation failed: {0}")]
    ProofGenerationError(String),
    #[error("point error: {0}")]
    PointError(String),
    #[error("byte conversion error: expected {expected} parts, got {got}")]
    ByteConversionError { expected: usize, got: usize },
}

const AFF_G_PROOF_BYTES_PARTS: usize = 14;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofAffG<C: CurveArithmetic> {
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub a: BigInt,
    #[serde(bound(serialize = "ECPoint<C>: Serialize", deserialize = "ECPoint<C>: Deserialize<'de>"))]
    pub bx: ECPoint<C>,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub by: BigInt,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub e: BigInt,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub s: BigInt,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub f: BigInt,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub t: BigInt,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub z1: BigInt,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub z2: BigInt,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub z3: BigInt,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub z4: BigInt,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub w: BigInt,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub wy: BigInt,
}

impl<C> ProofAffG<C>
where
    C: CurveArithmetic,
    ECPoint<C>: Clone + PartialEq + Serialize + for<'de> Deserialize<'de>,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new<R: CryptoRng + RngCore>(
        session: &[u8],
        curve_q: &BigInt,
        n0: &BigInt,
        n1: &BigInt,
        n_cap: &BigInt,
        s_param: &BigInt,
        t_param: &BigInt,
        cap_c: &BigInt,
        cap_d: &BigInt,
        cap_y: &BigInt,
        g: &ECPoint<C>,
        cap_x: &ECPoint<C>,
        x: &BigInt,
        y: &BigInt,
        rho: &BigInt,
        rho_y: &BigInt,
        rng: &mut R,
    ) -> Result<Self, AffGProofError> {
        if n0.sign() != Sign::Plus || n1.sign() != Sign::Plus || n_cap.sign() != Sign::Plus {
            return Err(AffGProofError::InvalidParameters("N0, N1 and NTilde must be positive".to_string()));
        }

        let mod_n_cap = ModInt::new(n_cap.clone());
        let mod_n0_square = ModInt::new(n0 * n0);
        let mod_n1_square = ModInt::new(n1 * n1);

        let q3 = curve_q.pow(3);
        let q_n_cap = curve_q * n_cap;
        let q3_n_cap = &q3 * n_cap;

        let alpha = get_random_positive_int(rng, &q3)
            .ok_or_else(|| AffGProofError::ProofGenerationError("failed to sample alpha".to_string()))?;
        let beta = get_random_positive_int(rng, &q3)
            .ok_or_else(|| AffGProofError::ProofGenerationError("failed to sample beta".to_string()))?;
        let r = get_random_positive_relatively_prime_int(rng, n0)
            .ok_or_else(|| AffGProofError::ProofGenerationError("failed to sample r".to_string()))?;
        let r_y = get_random_positive_relatively_prime_int(rng, n1)
            .ok_or_else(|| AffGProofError::ProofGenerationError("failed to sample r_y".to_string()))?;
        let gamma = get_random_positive_int(rng, &q3_n_cap)
            .ok_or_else(|| AffGProofError::ProofGenerationError("failed to sample gamma".to_string()))?;
        let m = get_random_positive_int(rng, &q_n_cap)
            .ok_or_else(|| AffGProofError::ProofGenerationError("failed to sample m".to_string()))?;
        let delta = get_random_positive_int(rng, &q3_n_cap)
            .ok_or_else(|| AffGProofError::ProofGenerationError("failed to sample delta".to_string()))?;
        let mu = get_random_positive_int(rng, &q_n_cap)
            .ok_or_else(|| AffGProofError::ProofGenerationError("failed to sample mu".to_string()))?;

        // A = C^alpha * Enc_{N0}(beta; r) mod N0^2
        let c_alpha = mod_n0_square.exp(cap_c, &alpha);
        let gamma_n0 = n0 + BigInt::from(1);
        let g0_beta = mod_n0_square.exp(&gamma_n0, &beta);
        let r_n0 = mod_n0_square.exp(&r, n0);
        let enc_beta0 = mod_n0_square.mul(&g0_beta, &r_n0);
        let a_val = mod_n0_square.mul(&c_alpha, &enc_beta0);

        let bx_val = g.scalar_mul(&alpha);

        // By = Enc_{N1}(beta; r_y) mod N1^2
        let gamma_n1 = n1 + BigInt::from(1);
        let g1_beta = mod_n1_square.exp(&gamma_n1, &beta);
        let ry_n1 = mod_n1_square.exp(&r_y, n1);
        let by_val = mod_n1_square.mul(&g1_beta, &ry_n1);

        let s_alpha = mod_n_cap.exp(s_param, &alpha);
        let t_gamma = mod_n_cap.exp(t_param, &gamma);
        let e_val = mod_n_cap.mul(&s_alpha, &t_gamma);

        let s_x = mod_n_cap.exp(s_param, x);
        let t_m = mod_n_cap.exp(t_param, &m);
        let s_val = mod_n_cap.mul(&s_x, &t_m);

        let s_beta = mod_n_cap.exp(s_param, &beta);
        let t_delta = mod_n_cap.exp(t_param, &delta);
        let f_val = mod_n_cap.mul(&s_beta, &t_delta);

        let s_y = mod_n_cap.exp(s_param, y);
        let t_mu = mod_n_cap.exp(t_param, &mu);
        let t_val = mod_n_cap.mul(&s_y, &t_mu);

        let (gx, gy) = (g.x(), g.y());
        let (xx, xy) = (cap_x.x(), cap_x.y());
        let (bxx, bxy) = (bx_val.x(), bx_val.y());
        let hash_input = vec![
            n0, n1, n_cap, s_param, t_param, cap_c, cap_d, cap_y, &gx, &gy, &xx, &xy,
            &a_val, &bxx, &bxy, &by_val, &e_val, &s_val, &f_val, &t_val,
        ];
        let e_hash = sha512_256i_tagged(session, &hash_input)
            .ok_or_else(|| AffGProofError::ProofGenerationError("failed to hash challenge".to_string()))?;
        let e = rejection_sample(curve_q, &e_hash);

        let z1 = &alpha + &e * x;
        let z2 = &beta + &e * y;
        let z3 = &gamma + &e * &m;
        let z4 = &delta + &e * &mu;
        let rho_e = mod_n0_square.exp(rho, &e);
        let w = mod_n0_square.mul(&r, &rho_e);
        let rho_y_e = mod_n1_square.exp(rho_y, &e);
        let wy = mod_n1_square.mul(&r_y, &rho_y_e);

        Ok(Self { a: a_val, bx: bx_val, by: by_val, e: e_val, s: s_val, f: f_val, t: t_val, z1, z2, z3, z4, w, wy })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn verify(
        &self,
        session: &[u8],
        curve_q: &BigInt,
        n0: &BigInt,
        n1: &BigInt,
        n_cap: &BigInt,
        s_param: &BigInt,
        t_param: &BigInt,
        cap_c: &BigInt,
        cap_d: &BigInt,
        cap_y: &BigInt,
        g: &ECPoint<C>,
        cap_x: &ECPoint<C>,
    ) -> bool {
        let q3 = curve_q.pow(3);
        if !is_in_interval(&self.z1.abs(), &q3) || !is_in_interval(&self.z2.abs(), &q3) {
            error!("ProofAffG verify: z1/z2 out of range");
            return false;
        }

        let (gx, gy) = (g.x(), g.y());
        let (xx, xy) = (cap_x.x(), cap_x.y());
        let (bxx, bxy) = (self.bx.x(), self.bx.y());
        let hash_input = vec![
            n0, n1, n_cap, s_param, t_param, cap_c, cap_d, cap_y, &gx, &gy, &xx, &xy,
            &self.a, &bxx, &bxy, &self.by, &self.e, &self.s, &self.f, &self.t,
        ];
        let e_hash = match sha512_256i_tagged(session, &hash_input) {
            Some(h) => h,
            None => {
                error!("ProofAffG verify: failed to hash challenge");
                return false;
            }
        };
        let e = rejection_sample(curve_q, &e_hash);

        let mod_n0_square = ModInt::new(n0 * n0);
        let mod_n1_square = ModInt::new(n1 * n1);
        let mod_n_cap = ModInt::new(n_cap.clone());

        // C^z1 * Enc_{N0}(z2; w) == A * D^e mod N0^2
        let c_z1 = mod_n0_square.exp(cap_c, &self.z1);
        let gamma_n0 = n0 + BigInt::from(1);
        let g0_z2 = mod_n0_square.exp(&gamma_n0, &self.z2);
        let w_n0 = mod_n0_square.exp(&self.w, n0);
        let enc_z2 = mod_n0_square.mul(&g0_z2, &w_n0);
        let lhs1 = mod_n0_square.mul(&c_z1, &enc_z2);
        let d_e = mod_n0_square.exp(cap_d, &e);
        let rhs1 = mod_n0_square.mul(&self.a, &d_e);
        if lhs1 != rhs1 {
            error!("ProofAffG verify: ciphertext relation check failed");
            return false;
        }

        // g^z1 == Bx + e*X
        let lhs2 = g.scalar_mul(&self.z1);
        let rhs2 = match self.bx.add(&cap_x.scalar_mul(&e)) {
            Ok(p) => p,
            Err(_) => return false,
        };
        if lhs2 != rhs2 {
            error!("ProofAffG verify: point relation check failed");
            return false;
        }

        // Enc_{N1}(z2; wy) == By * Y^e mod N1^2
        let gamma_n1 = n1 + BigInt::from(1);
        let g1_z2 = mod_n1_square.exp(&gamma_n1, &self.z2);
        let wy_n1 = mod_n1_square.exp(&self.wy, n1);
        let lhs3 = mod_n1_square.mul(&g1_z2, &wy_n1);
        let y_e = mod_n1_square.exp(cap_y, &e);
        let rhs3 = mod_n1_square.mul(&self.by, &y_e);
        if lhs3 != rhs3 {
            error!("ProofAffG verify: Y-ciphertext relation check failed");
            return false;
        }

        // s^z1 * t^z3 == E * S^e mod NCap
        let s_z1 = mod_n_cap.exp(s_param, &self.z1);
        let t_z3 = mod_n_cap.exp(t_param, &self.z3);
        let lhs4 = mod_n_cap.mul(&s_z1, &t_z3);
        let s_e = mod_n_cap.exp(&self.s, &e);
        let rhs4 = mod_n_cap.mul(&self.e, &s_e);
        if lhs4 != rhs4 {
            error!("ProofAffG verify: ring-Pedersen check (x) failed");
            return false;
        }

        // s^z2 * t^z4 == F * T^e mod NCap
        let s_z2 = mod_n_cap.exp(s_param, &self.z2);
        let t_z4 = mod_n_cap.exp(t_param, &self.z4);
        let lhs5 = mod_n_cap.mul(&s_z2, &t_z4);
        let t_e = mod_n_cap.exp(&self.t, &e);
        let rhs5 = mod_n_cap.mul(&self.f, &t_e);
        if lhs5 != rhs5 {
            error!("ProofAffG verify: ring-Pedersen check (y) failed");
            return false;
        }

        true
    }

    pub fn to_bytes(&self) -> Vec<Vec<u8>> {
        let (bxx, bxy) = (self.bx.x(), self.bx.y());
        bigints_to_bytes(&[
            &self.a, &bxx, &bxy, &self.by, &self.e, &self.s, &self.f, &self.t,
            &self.z1, &self.z2, &self.z3, &self.z4, &self.w, &self.wy,
        ])
    }

    pub fn from_bytes(bzs: &[Vec<u8>]) -> Result<Self, AffGProofError> {
        if bzs.len() != AFF_G_PROOF_BYTES_PARTS {
            return Err(AffGProofError::ByteConversionError { expected: AFF_G_PROOF_BYTES_PARTS, got: bzs.len() });
        }
        let ints = multi_bytes_to_bigints(bzs);
        let bx = ECPoint::from_coords(&ints[1], &ints[2]).map_err(|e| AffGProofError::PointError(e.to_string()))?;
        Ok(Self {
            a: ints[0].clone(),
            bx,
            by: ints[3].clone(),
            e: ints[4].clone(),
            s: ints[5].clone(),
            f: ints[6].clone(),
            t: ints[7].clone(),
            z1: ints[8].clone(),
            z2: ints[9].clone(),
            z3: ints[10].clone(),
            z4: ints[11].clone(),
            w: ints[12].clone(),
            wy: ints[13].clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ring_pedersen_params::RingPedersenParams;
    use crate::common::safe_prime::get_safe_prime_details;
    use crate::crypto::paillier::PublicKey;
    use k256::Secp256k1;
    use rand::thread_rng;

    fn get_k256_q() -> BigInt {
        let q_bytes = k256::Scalar::ORDER.to_be_bytes();
        BigInt::from_bytes_be(num_bigint_dig::Sign::Plus, &q_bytes)
    }

    #[test]
    fn test_aff_g_proof_create_verify() {
        let mut rng = thread_rng();
        let q = get_k256_q();
        let session = b"test_aff_g_proof";

        let p0 = get_safe_prime_details(512, 1, &mut rng).unwrap();
        let q0 = get_safe_prime_details(512, 1, &mut rng).unwrap();
        let n0 = p0.safe_prime() * q0.safe_prime();
        let p1 = get_safe_prime_details(512, 1, &mut rng).unwrap();
        let q1 = get_safe_prime_details(512, 1, &mut rng).unwrap();
        let n1 = p1.safe_prime() * q1.safe_prime();

        let rp = RingPedersenParams::new(&mut rng, 2048).unwrap();
        let n_cap = rp.n();
        let s_param = rp.s();
        let t_param = rp.t();

        let pk0 = PublicKey { n: n0.clone() };
        let pk1 = PublicKey { n: n1.clone() };

        let x = get_random_positive_int(&mut rng, &q).unwrap();
        let y = get_random_positive_int(&mut rng, &q).unwrap();

        let (cap_c, _) = pk0.encrypt_and_return_randomness(&mut rng, &get_random_positive_int(&mut rng, &q).unwrap()).unwrap();
        let c_x = ModInt::new(n0.clone() * &n0).exp(&cap_c, &x);
        let (enc_y, rho) = pk0.encrypt_and_return_randomness(&mut rng, &y).unwrap();
        let cap_d = ModInt::new(n0.clone() * &n0).mul(&c_x, &enc_y);
        let (cap_y, rho_y) = pk1.encrypt_and_return_randomness(&mut rng, &y).unwrap();

        let g = ECPoint::<Secp256k1>::generator();
        let cap_x = g.scalar_mul(&x);

        let proof = ProofAffG::new(
            session, &q, &n0, &n1, &n_cap, &s_param, &t_param, &cap_c, &cap_d, &cap_y, &g, &cap_x,
            &x, &y, &rho, &rho_y, &mut rng,
        )
        .expect("proof generation failed");

        assert!(proof.verify(session, &q, &n0, &n1, &n_cap, &s_param, &t_param, &cap_c, &cap_d, &cap_y, &g, &cap_x));
        assert!(!proof.verify(b"wrong", &q, &n0, &n1, &n_cap, &s_param, &t_param, &cap_c, &cap_d, &cap_y, &g, &cap_x));
    }
}
