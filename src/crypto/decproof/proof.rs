// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Paillier decryption-in-the-exponent proof (Π^dec, CGGMP21 Figure 28):
// proves that a ciphertext `cap_d` combined with a known ciphertext `cap_k`
// decrypts to the discrete log `y` of a curve point `cap_s`, given that
// `cap_x = x*g` is the public commitment to the scalar `x` blinding `cap_k`,
// i.e. `cap_d = cap_k^(-x) * Enc_{N0}(y; rho)`.

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
pub enum DecProofError {
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("proof generation failed: {0}")]
    ProofGenerationError(String),
    #[error("point error: {0}")]
    PointError(String),
    #[error("byte conversion error: expected {expected} parts, got {got}")]
    ByteConversionError { expected: usize, got: usize },
}

const DEC_PROOF_BYTES_PARTS: usize = 14;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofDec<C: CurveArithmetic> {
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub a: BigInt,
    #[serde(bound(serialize = "ECPoint<C>: Serialize", deserialize = "ECPoint<C>: Deserialize<'de>"))]
    pub b: ECPoint<C>,
    #[serde(bound(serialize = "ECPoint<C>: Serialize", deserialize = "ECPoint<C>: Deserialize<'de>"))]
    pub cc: ECPoint<C>,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub e_cmt: BigInt,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub s_cmt: BigInt,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub f_cmt: BigInt,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub t_cmt: BigInt,
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
}

impl<C> ProofDec<C>
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
        cap_k: &BigInt,
        cap_d: &BigInt,
        g: &ECPoint<C>,
        cap_x: &ECPoint<C>,
        cap_s: &ECPoint<C>,
        x: &BigInt,
        y: &BigInt,
        rho: &BigInt,
        rng: &mut R,
    ) -> Result<Self, DecProofError> {
        if n0.sign() != Sign::Plus || n_cap.sign() != Sign::Plus {
            return Err(DecProofError::InvalidParameters("N0 and NTilde must be positive".to_string()));
        }

        let mod_n_cap = ModInt::new(n_cap.clone());
        let mod_n0_square = ModInt::new(n0 * n0);

        let q3 = curve_q.pow(3);
        let q_n_cap = curve_q * n_cap;
        let q3_n_cap = &q3 * n_cap;

        let alpha = get_random_positive_int(rng, &q3)
            .ok_or_else(|| DecProofError::ProofGenerationError("failed to sample alpha".to_string()))?;
        let beta = get_random_positive_int(rng, &q3)
            .ok_or_else(|| DecProofError::ProofGenerationError("failed to sample beta".to_string()))?;
        let r = get_random_positive_relatively_prime_int(rng, n0)
            .ok_or_else(|| DecProofError::ProofGenerationError("failed to sample r".to_string()))?;
        let gamma = get_random_positive_int(rng, &q3_n_cap)
            .ok_or_else(|| DecProofError::ProofGenerationError("failed to sample gamma".to_string()))?;
        let m = get_random_positive_int(rng, &q_n_cap)
            .ok_or_else(|| DecProofError::ProofGenerationError("failed to sample m".to_string()))?;
        let delta = get_random_positive_int(rng, &q3_n_cap)
            .ok_or_else(|| DecProofError::ProofGenerationError("failed to sample delta".to_string()))?;
        let mu = get_random_positive_int(rng, &q_n_cap)
            .ok_or_else(|| DecProofError::ProofGenerationError("failed to sample mu".to_string()))?;

        // A = K^(-alpha) * Enc_{N0}(beta; r) mod N0^2
        let k_inv = mod_n0_square
            .mod_inverse(cap_k)
            .ok_or_else(|| DecProofError::ProofGenerationError("K is not invertible mod N0^2".to_string()))?;
        let k_neg_alpha = mod_n0_square.exp(&k_inv, &alpha);
        let gamma_n0 = n0 + BigInt::from(1);
        let g_beta = mod_n0_square.exp(&gamma_n0, &beta);
        let r_n0 = mod_n0_square.exp(&r, n0);
        let enc_beta = mod_n0_square.mul(&g_beta, &r_n0);
        let a_val = mod_n0_square.mul(&k_neg_alpha, &enc_beta);

        let b_val = g.scalar_mul(&beta);
        let cc_val = g.scalar_mul(&alpha);

        let s_alpha = mod_n_cap.exp(s_param, &alpha);
        let t_gamma = mod_n_cap.exp(t_param, &gamma);
        let e_cmt = mod_n_cap.mul(&s_alpha, &t_gamma);

        let s_x = mod_n_cap.exp(s_param, x);
        let t_m = mod_n_cap.exp(t_param, &m);
        let s_cmt = mod_n_cap.mul(&s_x, &t_m);

        let s_beta = mod_n_cap.exp(s_param, &beta);
        let t_delta = mod_n_cap.exp(t_param, &delta);
        let f_cmt = mod_n_cap.mul(&s_beta, &t_delta);

        let s_y = mod_n_cap.exp(s_param, y);
        let t_mu = mod_n_cap.exp(t_param, &mu);
        let t_cmt = mod_n_cap.mul(&s_y, &t_mu);

        let (gx, gy) = (g.x(), g.y());
        let (xx, xy) = (cap_x.x(), cap_x.y());
        let (spx, spy) = (cap_s.x(), cap_s.y());
        let (bx, by) = (b_val.x(), b_val.y());
        let (ccx, ccy) = (cc_val.x(), cc_val.y());
        let hash_input = vec![
            n0, n_cap, s_param, t_param, cap_k, cap_d, &gx, &gy, &xx, &xy, &spx, &spy,
            &a_val, &bx, &by, &ccx, &ccy, &e_cmt, &s_cmt, &f_cmt, &t_cmt,
        ];
        let e_hash = sha512_256i_tagged(session, &hash_input)
            .ok_or_else(|| DecProofError::ProofGenerationError("failed to hash challenge".to_string()))?;
        let e = rejection_sample(curve_q, &e_hash);

        let z1 = &alpha + &e * x;
        let z2 = &beta + &e * y;
        let z3 = &gamma + &e * &m;
        let z4 = &delta + &e * &mu;
        let rho_e = mod_n0_square.exp(rho, &e);
        let w = mod_n0_square.mul(&r, &rho_e);

        Ok(Self { a: a_val, b: b_val, cc: cc_val, e_cmt, s_cmt, f_cmt, t_cmt, z1, z2, z3, z4, w })
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
        cap_k: &BigInt,
        cap_d: &BigInt,
        g: &ECPoint<C>,
        cap_x: &ECPoint<C>,
        cap_s: &ECPoint<C>,
    ) -> bool {
        let q3 = curve_q.pow(3);
        if !is_in_interval(&self.z1.abs(), &q3) || !is_in_interval(&self.z2.abs(), &q3) {
            error!("ProofDec verify: z1/z2 out of range");
            return false;
        }

        let (gx, gy) = (g.x(), g.y());
        let (xx, xy) = (cap_x.x(), cap_x.y());
        let (spx, spy) = (cap_s.x(), cap_s.y());
        let (bx, by) = (self.b.x(), self.b.y());
        let (ccx, ccy) = (self.cc.x(), self.cc.y());
        let hash_input = vec![
            n0, n_cap, s_param, t_param, cap_k, cap_d, &gx, &gy, &xx, &xy, &spx, &spy,
            &self.a, &bx, &by, &ccx, &ccy, &self.e_cmt, &self.s_cmt, &self.f_cmt, &self.t_cmt,
        ];
        let e_hash = match sha512_256i_tagged(session, &hash_input) {
            Some(h) => h,
            None => {
                error!("ProofDec verify: failed to hash challenge");
                return false;
            }
        };
        let e = rejection_sample(curve_q, &e_hash);

        let mod_n0_square = ModInt::new(n0 * n0);
        let mod_n_cap = ModInt::new(n_cap.clone());

        // K^(-z1) * Enc_{N0}(z2; w) == A * D^e mod N0^2
        let k_inv = match mod_n0_square.mod_inverse(cap_k) {
            Some(inv) => inv,
            None => {
                error!("ProofDec verify: K is not invertible mod N0^2");
                return false;
            }
        };
        let k_neg_z1 = mod_n0_square.exp(&k_inv, &self.z1);
        let gamma_n0 = n0 + BigInt::from(1);
        let g_z2 = mod_n0_square.exp(&gamma_n0, &self.z2);
        let w_n0 = mod_n0_square.exp(&self.w, n0);
        let enc_z2 = mod_n0_square.mul(&g_z2, &w_n0);
        let lhs1 = mod_n0_square.mul(&k_neg_z1, &enc_z2);
        let d_e = mod_n0_square.exp(cap_d, &e);
        let rhs1 = mod_n0_square.mul(&self.a, &d_e);
        if lhs1 != rhs1 {
            error!("ProofDec verify: ciphertext relation check failed");
            return false;
        }

        // g^z1 == Cc + e*X
        let lhs2 = g.scalar_mul(&self.z1);
        let rhs2 = match self.cc.add(&cap_x.scalar_mul(&e)) {
            Ok(p) => p,
            Err(_) => return false,
        };
        if lhs2 != rhs2 {
            error!("ProofDec verify: X point relation check failed");
            return false;
        }

        // g^z2 == B + e*S
        let lhs3 = g.scalar_mul(&self.z2);
        let rhs3 = match self.b.add(&cap_s.scalar_mul(&e)) {
            Ok(p) => p,
            Err(_) => return false,
        };
        if lhs3 != rhs3 {
            error!("ProofDec verify: S point relation check failed");
            return false;
        }

        // s^z1 * t^z3 == E * S_cmt^e mod NCap
        let s_z1 = mod_n_cap.exp(s_param, &self.z1);
        let t_z3 = mod_n_cap.exp(t_param, &self.z3);
        let lhs4 = mod_n_cap.mul(&s_z1, &t_z3);
        let s_cmt_e = mod_n_cap.exp(&self.s_cmt, &e);
        let rhs4 = mod_n_cap.mul(&self.e_cmt, &s_cmt_e);
        if lhs4 != rhs4 {
            error!("ProofDec verify: ring-Pedersen check (x) failed");
            return false;
        }

        // s^z2 * t^z4 == F * T^e mod NCap
        let s_z2 = mod_n_cap.exp(s_param, &self.z2);
        let t_z4 = mod_n_cap.exp(t_param, &self.z4);
        let lhs5 = mod_n_cap.mul(&s_z2, &t_z4);
        let t_cmt_e = mod_n_cap.exp(&self.t_cmt, &e);
        let rhs5 = mod_n_cap.mul(&self.f_cmt, &t_cmt_e);
        if lhs5 != rhs5 {
            error!("ProofDec verify: ring-Pedersen check (y) failed");
            return false;
        }

        true
    }

    pub fn to_bytes(&self) -> Vec<Vec<u8>> {
        let (bx, by) = (self.b.x(), self.b.y());
        let (ccx, ccy) = (self.cc.x(), self.cc.y());
        bigints_to_bytes(&[
            &self.a, &bx, &by, &ccx, &ccy, &self.e_cmt, &self.s_cmt, &self.f_cmt, &self.t_cmt,
            &self.z1, &self.z2, &self.z3, &self.z4, &self.w,
        ])
    }

    pub fn from_bytes(bzs: &[Vec<u8>]) -> Result<Self, DecProofError> {
        if bzs.len() != DEC_PROOF_BYTES_PARTS {
            return Err(DecProofError::ByteConversionError { expected: DEC_PROOF_BYTES_PARTS, got: bzs.len() });
        }
        let ints = multi_bytes_to_bigints(bzs);
        let b = ECPoint::from_coords(&ints[1], &ints[2]).map_err(|e| DecProofError::PointError(e.to_string()))?;
        let cc = ECPoint::from_coords(&ints[3], &ints[4]).map_err(|e| DecProofError::PointError(e.to_string()))?;
        Ok(Self {
            a: ints[0].clone(),
            b,
            cc,
            e_cmt: ints[5].clone(),
            s_cmt: ints[6].clone(),
            f_cmt: ints[7].clone(),
            t_cmt: ints[8].clone(),
            z1: ints[9].clone(),
            z2: ints[10].clone(),
            z3: ints[11].clone(),
            z4: ints[12].clone(),
            w: ints[13].clone(),
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
    fn test_dec_proof_create_verify() {
        let mut rng = thread_rng();
        let q = get_k256_q();
        let session = b"test_dec_proof";

        let p = get_safe_prime_details(512, 1, &mut rng).unwrap();
        let qp = get_safe_prime_details(512, 1, &mut rng).unwrap();
        let n0 = p.safe_prime() * qp.safe_prime();

        let rp = RingPedersenParams::new(&mut rng, 2048).unwrap();
        let n_cap = rp.n();
        let s_param = rp.s();
        let t_param = rp.t();

        let pk = PublicKey { n: n0.clone() };
        let x = get_random_positive_int(&mut rng, &q).unwrap();
        let y = get_random_positive_int(&mut rng, &q).unwrap();

        let n0_square = &n0 * &n0;
        let mod_n0_square = ModInt::new(n0_square);
        let (cap_k, _) = pk.encrypt_and_return_randomness(&mut rng, &get_random_positive_int(&mut rng, &q).unwrap()).unwrap();
        let (enc_y, rho) = pk.encrypt_and_return_randomness(&mut rng, &y).unwrap();
        let k_inv = mod_n0_square.mod_inverse(&cap_k).unwrap();
        let k_neg_x = mod_n0_square.exp(&k_inv, &x);
        let cap_d = mod_n0_square.mul(&k_neg_x, &enc_y);

        let g = ECPoint::<Secp256k1>::generator();
        let cap_x = g.scalar_mul(&x);
        let cap_s = g.scalar_mul(&y);

        let proof = ProofDec::new(
            session, &q, &n0, &n_cap, &s_param, &t_param, &cap_k, &cap_d, &g, &cap_x, &cap_s, &x, &y, &rho, &mut rng,
        )
        .expect("proof generation failed");

        assert!(proof.verify(session, &q, &n0, &n_cap, &s_param, &t_param, &cap_k, &cap_d, &g, &cap_x, &cap_s));
        assert!(!proof.verify(b"wrong", &q, &n0, &n_cap, &s_param, &t_param, &cap_k, &cap_d, &g, &cap_x, &cap_s));
    }
}
