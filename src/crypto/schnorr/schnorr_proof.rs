// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Translation of tss-lib-go/crypto/schnorr/schnorr_proof.go

use crate::{
    common::{
        hash::sha512_256i_tagged,
        int::ModInt,
        random::get_random_positive_int,
        hash_utils::rejection_sample,
    },
    crypto::ecpoint::{ECPoint, PointError},
    tss::Curve, // Assuming trait for curve operations & params
};

use elliptic_curve::CurveArithmetic;
use elliptic_curve::scalar::Scalar;
use num_bigint_dig::{BigInt};
use num_traits::Zero;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use log::error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchnorrError {
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("point operation failed: {0}")]
    PointError(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

impl From<PointError> for SchnorrError {
    fn from(err: PointError) -> Self {
        SchnorrError::PointError(err.to_string())
    }
}

/// Schnorr ZK proof of knowledge of the discrete logarithm `x` such that `X = g^x`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZkProof<C: Curve + CurveArithmetic> {
     // Need to handle ECPoint serialization
    #[serde(bound(serialize = "ECPoint<C>: Serialize", deserialize = "ECPoint<C>: Deserialize<'de>"))]
    pub alpha: ECPoint<C>,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub t: BigInt,
}

/// Schnorr ZK proof of knowledge `s`, `l` such that `V = R^s * g^l`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZkvProof<C: Curve + CurveArithmetic> {
    // Need to handle ECPoint serialization
    #[serde(bound(serialize = "ECPoint<C>: Serialize", deserialize = "ECPoint<C>: Deserialize<'de>"))]
    pub alpha: ECPoint<C>,
     #[serde(with = "crate::serde_support::bigint_bytes")]
    pub t: BigInt,
     #[serde(with = "crate::serde_support::bigint_bytes")]
    pub u: BigInt,
}

impl<C> ZkProof<C>
where
    C: Curve + CurveArithmetic,
    // Add bounds needed for ECPoint ops
     ECPoint<C>: Clone + PartialEq + Serialize + for<'de> Deserialize<'de>,
    // Assuming methods exist & BigInt can be converted to Scalar
{
    /// Creates a new Schnorr ZK proof `(α, t)` for `X = g^x`. (GG18Spec Fig. 16)
    /// `α = g^a`
    /// `c = H(session, X, g, α)`
    /// `t = a + c*x mod q`
    pub fn new<
        R: CryptoRng + RngCore
    >(
        session: &[u8],
        q: &BigInt,
        x_priv: &BigInt,       // The secret x
        x_pub: &ECPoint<C>, // The public point X = g^x
        rng: &mut R,
    ) -> Result<Self, SchnorrError> {
         if x_priv.sign() == num_bigint_dig::Sign::Minus || !x_pub.validate_basic() {
             return Err(SchnorrError::InvalidParameters("x or X are invalid".to_string()));
         }
        let mod_q = ModInt::new(q.clone());
        let g = ECPoint::<C>::generator(); // Assuming generator access

        // a <- Zq
        let a = get_random_positive_int(rng, q)
            .ok_or_else(|| SchnorrError::InternalError("Failed to generate random 'a'".to_string()))?;

        // α = g^a
        let alpha = ECPoint::<C>::scalar_base_mult(&a);

        // c = H(session, X, g, α)
        let (x_pub_x, x_pub_y) = x_pub.coords();
        let (g_x, g_y) = g.coords();
        let (alpha_x, alpha_y) = alpha.coords();

        let c_hash = sha512_256i_tagged(
            session,
            &[&x_pub_x, &x_pub_y, &g_x, &g_y, &alpha_x, &alpha_y],
        ).ok_or_else(|| SchnorrError::InternalError("Failed to compute challenge hash c".to_string()))?;

        // Rejection sample c
        let c = rejection_sample(q, &c_hash);

        // t = a + c*x mod q
        let cx = mod_q.mul(&c, x_priv);
        let t = mod_q.add(&a, &cx);

        Ok(Self { alpha, t })
    }

    /// Verifies a Schnorr ZK proof. (GG18Spec Fig. 16)
    /// Checks if `g^t == α * X^c`
    pub fn verify(
        &self,
        session: &[u8],
        q: &BigInt,
        x_pub: &ECPoint<C>, // The public point X = g^x
    ) -> bool {
         if !self.validate_basic() || !x_pub.validate_basic() {
             return false;
         }
        let mod_q = ModInt::new(q.clone());
        let g = ECPoint::<C>::generator();

        // Recalculate c = H(session, X, g, α)
        let (x_pub_x, x_pub_y) = x_pub.coords();
        let (g_x, g_y) = g.coords();
        let (alpha_x, alpha_y) = self.alpha.coords();

         let c_hash = match sha512_256i_tagged(
             session,
             &[&x_pub_x, &x_pub_y, &g_x, &g_y, &alpha_x, &alpha_y],
         ) {
             Some(h) => h,
             None => {
                 error!("ZKProof verify: failed to compute challenge hash c");
                 return false;
             }
         };

        let c = rejection_sample(q, &c_hash);

        // Left side: g^t
        let gt = ECPoint::<C>::scalar_base_mult(&self.t);

        // Right side: α * X^c
        let xc = x_pub.scalar_mul(&c);
        let alpha_plus_xc = match self.alpha.add(&xc) {
            Ok(p) => p,
            Err(_) => {
                 error!("ZKProof verify: point addition failed for alpha * X^c");
                 return false;
            }
         };

        // Check g^t == α * X^c
        gt == alpha_plus_xc
    }

    /// Basic validation of proof components.
    pub fn validate_basic(&self) -> bool {
        self.alpha.validate_basic() // t is BigInt, always valid
    }
}

impl<C> ZkvProof<C>
where
    C: Curve + CurveArithmetic,
    // Add bounds needed for ECPoint ops
     ECPoint<C>: Clone + PartialEq + Serialize + for<'de> Deserialize<'de>,
{
    /// Creates a new Schnorr ZK proof `(α, t, u)` for `V = R^s * g^l`. (GG18Spec Fig. 17)
    /// `α = R^a * g^b`
    /// `c = H(session, V, R, g, α)`
    /// `t = a + c*s mod q`
    /// `u = b + c*l mod q`
    pub fn new<
        R: CryptoRng + RngCore
    >(
        session: &[u8],
        q: &BigInt,
        s: &BigInt, // Secret s
        l: &BigInt, // Secret l
        v_pub: &ECPoint<C>, // Public V = R^s * g^l
        r_pub: &ECPoint<C>, // Public R
        rng: &mut R,
    ) -> Result<Self, SchnorrError> {
         if s.sign() == num_bigint_dig::Sign::Minus ||
            l.sign() == num_bigint_dig::Sign::Minus ||
            !v_pub.validate_basic() ||
            !r_pub.validate_basic()
         {
             return Err(SchnorrError::InvalidParameters("s, l, V, or R are invalid".to_string()));
         }
        let mod_q = ModInt::new(q.clone());
        let g = ECPoint::<C>::generator();

        // a, b <- Zq
        let a = get_random_positive_int(rng, q)
            .ok_or_else(|| SchnorrError::InternalError("Failed to generate random 'a'".to_string()))?;
        let b = get_random_positive_int(rng, q)
            .ok_or_else(|| SchnorrError::InternalError("Failed to generate random 'b'".to_string()))?;

        // α = R^a * g^b
        let ra = r_pub.scalar_mul(&a);
        let gb = ECPoint::<C>::scalar_base_mult(&b);
        let alpha = ra.add(&gb)?; // Handle potential point error

        // c = H(session, V, R, g, α)
        let (v_x, v_y) = v_pub.coords();
        let (r_x, r_y) = r_pub.coords();
        let (g_x, g_y) = g.coords();
        let (alpha_x, alpha_y) = alpha.coords();

        let c_hash = sha512_256i_tagged(
            session,
            &[&v_x, &v_y, &r_x, &r_y, &g_x, &g_y, &alpha_x, &alpha_y],
        ).ok_or_else(|| SchnorrError::InternalError("Failed to compute challenge hash c".to_string()))?;
        let c = rejection_sample(q, &c_hash);

        // t = a + c*s mod q
        let cs = mod_q.mul(&c, s);
        let t = mod_q.add(&a, &cs);

        // u = b + c*l mod q
        let cl = mod_q.mul(&c, l);
        let u = mod_q.add(&b, &cl);

        Ok(Self { alpha, t, u })
    }

    /// Verifies a Schnorr ZK proof `(α, t, u)`. (GG18Spec Fig. 17)
    /// Checks if `R^t * g^u == α * V^c`
    pub fn verify(
        &self,
        session: &[u8],
        q: &BigInt,
        v_pub: &ECPoint<C>,
        r_pub: &ECPoint<C>,
    ) -> bool {
         if !self.validate_basic() || !v_pub.validate_basic() || !r_pub.validate_basic() {
            return false;
        }
        let mod_q = ModInt::new(q.clone());
        let g = ECPoint::<C>::generator();

        // Recalculate c = H(session, V, R, g, α)
        let (v_x, v_y) = v_pub.coords();
        let (r_x, r_y) = r_pub.coords();
        let (g_x, g_y) = g.coords();
        let (alpha_x, alpha_y) = self.alpha.coords();

        let c_hash = match sha512_256i_tagged(
            session,
            &[&v_x, &v_y, &r_x, &r_y, &g_x, &g_y, &alpha_x, &alpha_y],
         ) {
            Some(h) => h,
            None => {
                error!("ZKVProof verify: failed to compute challenge hash c");
                return false;
            }
        };
        let c = rejection_sample(q, &c_hash);

        // Left side: R^t * g^u
        let rt = r_pub.scalar_mul(&self.t);
        let gu = ECPoint::<C>::scalar_base_mult(&self.u);
        let lhs = match rt.add(&gu) {
            Ok(p) => p,
            Err(_) => {
                 error!("ZKVProof verify: point addition failed for R^t * g^u");
                 return false;
            }
         };

        // Right side: α * V^c
        let vc = v_pub.scalar_mul(&c);
        let rhs = match self.alpha.add(&vc) {
            Ok(p) => p,
             Err(_) => {
                 error!("ZKVProof verify: point addition failed for alpha * V^c");
                 return false;
            }
         };

        // Check R^t * g^u == α * V^c
        lhs == rhs
    }

    /// Basic validation of proof components.
    pub fn validate_basic(&self) -> bool {
        self.alpha.validate_basic() // t, u are BigInts, always valid
    }
}

/// Schnorr ZK proof of knowledge of `sigma`, `l` such that `T = sigma*G + l*H`
/// for an auxiliary base point `H` independent of the generator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TProof<C: Curve + CurveArithmetic> {
    #[serde(bound(serialize = "ECPoint<C>: Serialize", deserialize = "ECPoint<C>: Deserialize<'de>"))]
    pub alpha: ECPoint<C>,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub t: BigInt,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub u: BigInt,
}

impl<C> TProof<C>
where
    C: Curve + CurveArithmetic,
    ECPoint<C>: Clone + PartialEq + Serialize + for<'de> Deserialize<'de>,
{
    /// `alpha = a*G + b*H; c = H(session, T, G, H, alpha); t = a + c*sigma mod q; u = b + c*l mod q`
    pub fn new<R: CryptoRng + RngCore>(
        session: &[u8],
        q: &BigInt,
        sigma: &BigInt,
        l: &BigInt,
        t_pub: &ECPoint<C>,
        h_base: &ECPoint<C>,
        rng: &mut R,
    ) -> Result<Self, SchnorrError> {
        if !t_pub.validate_basic() || !h_base.validate_basic() {
            return Err(SchnorrError::InvalidParameters("T or H are invalid".to_string()));
        }
        let mod_q = ModInt::new(q.clone());
        let g = ECPoint::<C>::generator();

        let a = get_random_positive_int(rng, q)
            .ok_or_else(|| SchnorrError::InternalError("Failed to generate random 'a'".to_string()))?;
        let b = get_random_positive_int(rng, q)
            .ok_or_else(|| SchnorrError::InternalError("Failed to generate random 'b'".to_string()))?;

        let ag = ECPoint::<C>::scalar_base_mult(&a);
        let bh = h_base.scalar_mul(&b);
        let alpha = ag.add(&bh)?;

        let (t_x, t_y) = t_pub.coords();
        let (g_x, g_y) = g.coords();
        let (h_x, h_y) = h_base.coords();
        let (alpha_x, alpha_y) = alpha.coords();

        let c_hash = sha512_256i_tagged(
            session,
            &[&t_x, &t_y, &g_x, &g_y, &h_x, &h_y, &alpha_x, &alpha_y],
        ).ok_or_else(|| SchnorrError::InternalError("Failed to compute challenge hash c".to_string()))?;
        let c = rejection_sample(q, &c_hash);

        let c_sigma = mod_q.mul(&c, sigma);
        let t = mod_q.add(&a, &c_sigma);
        let c_l = mod_q.mul(&c, l);
        let u = mod_q.add(&b, &c_l);

        Ok(Self { alpha, t, u })
    }

    /// Checks `t*G + u*H == alpha + c*T`.
    pub fn verify(
        &self,
        session: &[u8],
        q: &BigInt,
        t_pub: &ECPoint<C>,
        h_base: &ECPoint<C>,
    ) -> bool {
        if !self.validate_basic() || !t_pub.validate_basic() || !h_base.validate_basic() {
            return false;
        }
        let g = ECPoint::<C>::generator();

        let (t_x, t_y) = t_pub.coords();
        let (g_x, g_y) = g.coords();
        let (h_x, h_y) = h_base.coords();
        let (alpha_x, alpha_y) = self.alpha.coords();

        let c_hash = match sha512_256i_tagged(
            session,
            &[&t_x, &t_y, &g_x, &g_y, &h_x, &h_y, &alpha_x, &alpha_y],
        ) {
            Some(h) => h,
            None => {
                error!("TProof verify: failed to compute challenge hash c");
                return false;
            }
        };
        let c = rejection_sample(q, &c_hash);

        let tg = ECPoint::<C>::scalar_base_mult(&self.t);
        let uh = h_base.scalar_mul(&self.u);
        let lhs = match tg.add(&uh) {
            Ok(p) => p,
            Err(_) => {
                error!("TProof verify: point addition failed for t*G + u*H");
                return false;
            }
        };

        let tc = t_pub.scalar_mul(&c);
        let rhs = match self.alpha.add(&tc) {
            Ok(p) => p,
            Err(_) => {
                error!("TProof verify: point addition failed for alpha + c*T");
                return false;
            }
        };

        lhs == rhs
    }

    pub fn validate_basic(&self) -> bool {
        self.alpha.validate_basic()
    }
}

/// Schnorr ZK proof tying `S = sigma*R` and `T = sigma*G + l*H` under a shared witness `sigma`,
/// with an extra additive blinding `l` on the second equation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StProof<C: Curve + CurveArithmetic> {
    #[serde(bound(serialize = "ECPoint<C>: Serialize", deserialize = "ECPoint<C>: Deserialize<'de>"))]
    pub alpha: ECPoint<C>,
    #[serde(bound(serialize = "ECPoint<C>: Serialize", deserialize = "ECPoint<C>: Deserialize<'de>"))]
    pub beta: ECPoint<C>,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub t: BigInt,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub u: BigInt,
}

impl<C> StProof<C>
where
    C: Curve + CurveArithmetic,
    ECPoint<C>: Clone + PartialEq + Serialize + for<'de> Deserialize<'de>,
{
    /// `alpha = a*R; beta = a*G + b*H; c = H(session, S, T, R, G, H, alpha, beta);`
    /// `t = a + c*sigma mod q; u = b + c*l mod q`
    #[allow(clippy::too_many_arguments)]
    pub fn new<R: CryptoRng + RngCore>(
        session: &[u8],
        q: &BigInt,
        sigma: &BigInt,
        l: &BigInt,
        s_pub: &ECPoint<C>,
        t_pub: &ECPoint<C>,
        r_pub: &ECPoint<C>,
        h_base: &ECPoint<C>,
        rng: &mut R,
    ) -> Result<Self, SchnorrError> {
        if !s_pub.validate_basic() || !t_pub.validate_basic() || !r_pub.validate_basic() || !h_base.validate_basic() {
            return Err(SchnorrError::InvalidParameters("S, T, R or H are invalid".to_string()));
        }
        let mod_q = ModInt::new(q.clone());
        let g = ECPoint::<C>::generator();

        let a = get_random_positive_int(rng, q)
            .ok_or_else(|| SchnorrError::InternalError("Failed to generate random 'a'".to_string()))?;
        let b = get_random_positive_int(rng, q)
            .ok_or_else(|| SchnorrError::InternalError("Failed to generate random 'b'".to_string()))?;

        let alpha = r_pub.scalar_mul(&a);
        let ag = ECPoint::<C>::scalar_base_mult(&a);
        let bh = h_base.scalar_mul(&b);
        let beta = ag.add(&bh)?;

        let (s_x, s_y) = s_pub.coords();
        let (t_x, t_y) = t_pub.coords();
        let (r_x, r_y) = r_pub.coords();
        let (g_x, g_y) = g.coords();
        let (h_x, h_y) = h_base.coords();
        let (alpha_x, alpha_y) = alpha.coords();
        let (beta_x, beta_y) = beta.coords();

        let c_hash = sha512_256i_tagged(
            session,
            &[
                &s_x, &s_y, &t_x, &t_y, &r_x, &r_y, &g_x, &g_y, &h_x, &h_y,
                &alpha_x, &alpha_y, &beta_x, &beta_y,
            ],
        ).ok_or_else(|| SchnorrError::InternalError("Failed to compute challenge hash c".to_string()))?;
        let c = rejection_sample(q, &c_hash);

        let c_sigma = mod_q.mul(&c, sigma);
        let t = mod_q.add(&a, &c_sigma);
        let c_l = mod_q.mul(&c, l);
        let u = mod_q.add(&b, &c_l);

        Ok(Self { alpha, beta, t, u })
    }

    /// Checks `t*R == alpha + c*S` and `t*G + u*H == beta + c*T`.
    #[allow(clippy::too_many_arguments)]
    pub fn verify(
        &self,
        session: &[u8],
        q: &BigInt,
        s_pub: &ECPoint<C>,
        t_pub: &ECPoint<C>,
        r_pub: &ECPoint<C>,
        h_base: &ECPoint<C>,
    ) -> bool {
        if !self.validate_basic() || !s_pub.validate_basic() || !t_pub.validate_basic()
            || !r_pub.validate_basic() || !h_base.validate_basic()
        {
            return false;
        }
        let g = ECPoint::<C>::generator();

        let (s_x, s_y) = s_pub.coords();
        let (t_x, t_y) = t_pub.coords();
        let (r_x, r_y) = r_pub.coords();
        let (g_x, g_y) = g.coords();
        let (h_x, h_y) = h_base.coords();
        let (alpha_x, alpha_y) = self.alpha.coords();
        let (beta_x, beta_y) = self.beta.coords();

        let c_hash = match sha512_256i_tagged(
            session,
            &[
                &s_x, &s_y, &t_x, &t_y, &r_x, &r_y, &g_x, &g_y, &h_x, &h_y,
                &alpha_x, &alpha_y, &beta_x, &beta_y,
            ],
        ) {
            Some(h) => h,
            None => {
                error!("StProof verify: failed to compute challenge hash c");
                return false;
            }
        };
        let c = rejection_sample(q, &c_hash);

        let tr = r_pub.scalar_mul(&self.t);
        let sc = s_pub.scalar_mul(&c);
        let rhs1 = match self.alpha.add(&sc) {
            Ok(p) => p,
            Err(_) => {
                error!("StProof verify: point addition failed for alpha + c*S");
                return false;
            }
        };
        if tr != rhs1 {
            return false;
        }

        let tg = ECPoint::<C>::scalar_base_mult(&self.t);
        let uh = h_base.scalar_mul(&self.u);
        let lhs2 = match tg.add(&uh) {
            Ok(p) => p,
            Err(_) => {
                error!("StProof verify: point addition failed for t*G + u*H");
                return false;
            }
        };
        let tc = t_pub.scalar_mul(&c);
        let rhs2 = match self.beta.add(&tc) {
            Ok(p) => p,
            Err(_) => {
                error!("StProof verify: point addition failed for beta + c*T");
                return false;
            }
        };

        lhs2 == rhs2
    }

    pub fn validate_basic(&self) -> bool {
        self.alpha.validate_basic() && self.beta.validate_basic()
    }
}

/// Schnorr ZK proof that the same discrete log `x` underlies `H1 = x*G` and `H2 = x*G2`
/// over two independent bases.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcddhProof<C: Curve + CurveArithmetic> {
    #[serde(bound(serialize = "ECPoint<C>: Serialize", deserialize = "ECPoint<C>: Deserialize<'de>"))]
    pub alpha1: ECPoint<C>,
    #[serde(bound(serialize = "ECPoint<C>: Serialize", deserialize = "ECPoint<C>: Deserialize<'de>"))]
    pub alpha2: ECPoint<C>,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub t: BigInt,
}

impl<C> EcddhProof<C>
where
    C: Curve + CurveArithmetic,
    ECPoint<C>: Clone + PartialEq + Serialize + for<'de> Deserialize<'de>,
{
    /// `alpha1 = a*G1; alpha2 = a*G2; c = H(H1,H2,G1,G2,alpha1,alpha2); t = a + c*x mod q`
    ///
    /// `g1_base` and `g2_base` are arbitrary bases (not necessarily the curve
    /// generator) — this proves `x` is the same discrete log of `H1` w.r.t.
    /// `G1` and of `H2` w.r.t. `G2`.
    pub fn new<R: CryptoRng + RngCore>(
        session: &[u8],
        q: &BigInt,
        x_priv: &BigInt,
        g1_base: &ECPoint<C>,
        g2_base: &ECPoint<C>,
        h1_pub: &ECPoint<C>,
        h2_pub: &ECPoint<C>,
        rng: &mut R,
    ) -> Result<Self, SchnorrError> {
        if !g1_base.validate_basic() || !g2_base.validate_basic() || !h1_pub.validate_basic() || !h2_pub.validate_basic() {
            return Err(SchnorrError::InvalidParameters("G1, G2, H1 or H2 are invalid".to_string()));
        }
        let mod_q = ModInt::new(q.clone());

        let a = get_random_positive_int(rng, q)
            .ok_or_else(|| SchnorrError::InternalError("Failed to generate random 'a'".to_string()))?;

        let alpha1 = g1_base.scalar_mul(&a);
        let alpha2 = g2_base.scalar_mul(&a);

        let (h1_x, h1_y) = h1_pub.coords();
        let (h2_x, h2_y) = h2_pub.coords();
        let (g1_x, g1_y) = g1_base.coords();
        let (g2_x, g2_y) = g2_base.coords();
        let (alpha1_x, alpha1_y) = alpha1.coords();
        let (alpha2_x, alpha2_y) = alpha2.coords();

        let c_hash = sha512_256i_tagged(
            session,
            &[
                &h1_x, &h1_y, &h2_x, &h2_y, &g1_x, &g1_y, &g2_x, &g2_y,
                &alpha1_x, &alpha1_y, &alpha2_x, &alpha2_y,
            ],
        ).ok_or_else(|| SchnorrError::InternalError("Failed to compute challenge hash c".to_string()))?;
        let c = rejection_sample(q, &c_hash);

        let cx = mod_q.mul(&c, x_priv);
        let t = mod_q.add(&a, &cx);

        Ok(Self { alpha1, alpha2, t })
    }

    /// Checks `t*G1 == alpha1 + c*H1` and `t*G2 == alpha2 + c*H2`.
    pub fn verify(
        &self,
        session: &[u8],
        q: &BigInt,
        g1_base: &ECPoint<C>,
        g2_base: &ECPoint<C>,
        h1_pub: &ECPoint<C>,
        h2_pub: &ECPoint<C>,
    ) -> bool {
        if !self.validate_basic() || !g1_base.validate_basic() || !g2_base.validate_basic() || !h1_pub.validate_basic() || !h2_pub.validate_basic() {
            return false;
        }

        let (h1_x, h1_y) = h1_pub.coords();
        let (h2_x, h2_y) = h2_pub.coords();
        let (g1_x, g1_y) = g1_base.coords();
        let (g2_x, g2_y) = g2_base.coords();
        let (alpha1_x, alpha1_y) = self.alpha1.coords();
        let (alpha2_x, alpha2_y) = self.alpha2.coords();

        let c_hash = match sha512_256i_tagged(
            session,
            &[
                &h1_x, &h1_y, &h2_x, &h2_y, &g1_x, &g1_y, &g2_x, &g2_y,
                &alpha1_x, &alpha1_y, &alpha2_x, &alpha2_y,
            ],
        ) {
            Some(h) => h,
            None => {
                error!("EcddhProof verify: failed to compute challenge hash c");
                return false;
            }
        };
        let c = rejection_sample(q, &c_hash);

        let tg1 = g1_base.scalar_mul(&self.t);
        let h1c = h1_pub.scalar_mul(&c);
        let rhs1 = match self.alpha1.add(&h1c) {
            Ok(p) => p,
            Err(_) => {
                error!("EcddhProof verify: point addition failed for alpha1 + c*H1");
                return false;
            }
        };
        if tg1 != rhs1 {
            return false;
        }

        let tg2 = g2_base.scalar_mul(&self.t);
        let h2c = h2_pub.scalar_mul(&c);
        let rhs2 = match self.alpha2.add(&h2c) {
            Ok(p) => p,
            Err(_) => {
                error!("EcddhProof verify: point addition failed for alpha2 + c*H2");
                return false;
            }
        };

        tg2 == rhs2
    }

    pub fn validate_basic(&self) -> bool {
        self.alpha1.validate_basic() && self.alpha2.validate_basic()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::ecpoint::ECPoint;
    use k256::Secp256k1;
    use num_traits::One;
    use rand::thread_rng;

     // Helper to get curve order Q for K256
     fn get_k256_q() -> BigInt {
         let q_bytes = k256::Scalar::ORDER.to_be_bytes();
         BigInt::from_bytes_be(num_bigint_dig::Sign::Plus, &q_bytes)
     }

    #[test]
    fn test_zkp_proof_verify() {
        let mut rng = thread_rng();
        let q = get_k256_q();

        // Setup: secret x, public X = g^x
        let x_priv = get_random_positive_int(&mut rng, &q).unwrap();
        let x_pub = ECPoint::<Secp256k1>::scalar_base_mult(&x_priv);
        let session = b"test_session_zkp";

        // 1. Create proof
        let proof = ZkProof::new(session, &q, &x_priv, &x_pub, &mut rng).unwrap();

        // 2. Verify proof
        assert!(proof.verify(session, &q, &x_pub), "ZKProof verification failed");

        // 3. Verify failure with wrong session
        assert!(!proof.verify(b"wrong_session", &q, &x_pub), "ZKProof verification succeeded with wrong session");

        // 4. Verify failure with wrong public key X
        let x_priv_wrong = get_random_positive_int(&mut rng, &q).unwrap();
        let x_pub_wrong = ECPoint::<Secp256k1>::scalar_base_mult(&x_priv_wrong);
        assert!(!proof.verify(session, &q, &x_pub_wrong), "ZKProof verification succeeded with wrong X");

        // 5. Verify failure with tampered proof `t`
        let mut tampered_proof_t = proof.clone();
        tampered_proof_t.t += BigInt::one();
        assert!(!tampered_proof_t.verify(session, &q, &x_pub), "ZKProof verification succeeded with tampered t");

         // 6. Verify failure with tampered proof `alpha`
         let mut tampered_proof_alpha = proof.clone();
         let random_scalar = get_random_positive_int(&mut rng, &q).unwrap();
         let random_point = ECPoint::<Secp256k1>::scalar_base_mult(&random_scalar);
         tampered_proof_alpha.alpha = tampered_proof_alpha.alpha.add(&random_point).unwrap();
         assert!(!tampered_proof_alpha.verify(session, &q, &x_pub), "ZKProof verification succeeded with tampered alpha");
    }

    #[test]
    fn test_zkv_proof_verify() {
        let mut rng = thread_rng();
        let q = get_k256_q();
        let g = ECPoint::<Secp256k1>::generator();

        // Setup: secrets s, l
        let s = get_random_positive_int(&mut rng, &q).unwrap();
        let l = get_random_positive_int(&mut rng, &q).unwrap();

        // Public points R (random), V = R^s * g^l
        let r_priv = get_random_positive_int(&mut rng, &q).unwrap();
        let r_pub = ECPoint::<Secp256k1>::scalar_base_mult(&r_priv);
        let rs = r_pub.scalar_mul(&s);
        let gl = g.scalar_mul(&l);
        let v_pub = rs.add(&gl).unwrap();

        let session = b"test_session_zkv";

        // 1. Create proof
        let proof = ZkvProof::new(session, &q, &s, &l, &v_pub, &r_pub, &mut rng).unwrap();

        // 2. Verify proof
        assert!(proof.verify(session, &q, &v_pub, &r_pub), "ZKVProof verification failed");

        // 3. Verify failure with wrong session
        assert!(!proof.verify(b"wrong_session", &q, &v_pub, &r_pub), "ZKVProof verification succeeded with wrong session");

        // 4. Verify failure with wrong public key V
        let s_wrong = get_random_positive_int(&mut rng, &q).unwrap();
        let rs_wrong = r_pub.scalar_mul(&s_wrong);
        let v_pub_wrong = rs_wrong.add(&gl).unwrap();
        assert!(!proof.verify(session, &q, &v_pub_wrong, &r_pub), "ZKVProof verification succeeded with wrong V");

        // 5. Verify failure with wrong public key R
        let r_priv_wrong = get_random_positive_int(&mut rng, &q).unwrap();
        let r_pub_wrong = ECPoint::<Secp256k1>::scalar_base_mult(&r_priv_wrong);
        assert!(!proof.verify(session, &q, &v_pub, &r_pub_wrong), "ZKVProof verification succeeded with wrong R");

        // 6. Verify failure with tampered proof `t`
        let mut tampered_proof_t = proof.clone();
        tampered_proof_t.t += BigInt::one();
        assert!(!tampered_proof_t.verify(session, &q, &v_pub, &r_pub), "ZKVProof verification succeeded with tampered t");

        // 7. Verify failure with tampered proof `u`
        let mut tampered_proof_u = proof.clone();
        tampered_proof_u.u += BigInt::one();
        assert!(!tampered_proof_u.verify(session, &q, &v_pub, &r_pub), "ZKVProof verification succeeded with tampered u");

         // 8. Verify failure with tampered proof `alpha`
         let mut tampered_proof_alpha = proof.clone();
         let random_scalar = get_random_positive_int(&mut rng, &q).unwrap();
         let random_point = ECPoint::<Secp256k1>::scalar_base_mult(&random_scalar);
         tampered_proof_alpha.alpha = tampered_proof_alpha.alpha.add(&random_point).unwrap();
         assert!(!tampered_proof_alpha.verify(session, &q, &v_pub, &r_pub), "ZKVProof verification succeeded with tampered alpha");
    }

    #[test]
    fn test_t_proof_verify() {
        let mut rng = thread_rng();
        let q = get_k256_q();

        let h_priv = get_random_positive_int(&mut rng, &q).unwrap();
        let h_base = ECPoint::<Secp256k1>::scalar_base_mult(&h_priv);

        let sigma = get_random_positive_int(&mut rng, &q).unwrap();
        let l = get_random_positive_int(&mut rng, &q).unwrap();
        let sg = ECPoint::<Secp256k1>::scalar_base_mult(&sigma);
        let lh = h_base.scalar_mul(&l);
        let t_pub = sg.add(&lh).unwrap();

        let session = b"test_session_t";
        let proof = TProof::new(session, &q, &sigma, &l, &t_pub, &h_base, &mut rng).unwrap();
        assert!(proof.verify(session, &q, &t_pub, &h_base), "TProof verification failed");
        assert!(!proof.verify(b"wrong", &q, &t_pub, &h_base), "TProof verified with wrong session");

        let mut tampered = proof.clone();
        tampered.t += BigInt::one();
        assert!(!tampered.verify(session, &q, &t_pub, &h_base), "TProof verified with tampered t");
    }

    #[test]
    fn test_st_proof_verify() {
        let mut rng = thread_rng();
        let q = get_k256_q();
        let g = ECPoint::<Secp256k1>::generator();

        let r_priv = get_random_positive_int(&mut rng, &q).unwrap();
        let r_pub = ECPoint::<Secp256k1>::scalar_base_mult(&r_priv);
        let h_priv = get_random_positive_int(&mut rng, &q).unwrap();
        let h_base = ECPoint::<Secp256k1>::scalar_base_mult(&h_priv);

        let sigma = get_random_positive_int(&mut rng, &q).unwrap();
        let l = get_random_positive_int(&mut rng, &q).unwrap();
        let s_pub = r_pub.scalar_mul(&sigma);
        let sg = g.scalar_mul(&sigma);
        let lh = h_base.scalar_mul(&l);
        let t_pub = sg.add(&lh).unwrap();

        let session = b"test_session_st";
        let proof = StProof::new(session, &q, &sigma, &l, &s_pub, &t_pub, &r_pub, &h_base, &mut rng).unwrap();
        assert!(proof.verify(session, &q, &s_pub, &t_pub, &r_pub, &h_base), "StProof verification failed");
        assert!(!proof.verify(b"wrong", &q, &s_pub, &t_pub, &r_pub, &h_base), "StProof verified with wrong session");

        let mut tampered = proof.clone();
        tampered.t += BigInt::one();
        assert!(!tampered.verify(session, &q, &s_pub, &t_pub, &r_pub, &h_base), "StProof verified with tampered t");
    }

    #[test]
    fn test_ecddh_proof_verify() {
        let mut rng = thread_rng();
        let q = get_k256_q();

        let g1_priv = get_random_positive_int(&mut rng, &q).unwrap();
        let g1_base = ECPoint::<Secp256k1>::scalar_base_mult(&g1_priv);
        let g2_priv = get_random_positive_int(&mut rng, &q).unwrap();
        let g2_base = ECPoint::<Secp256k1>::scalar_base_mult(&g2_priv);

        let x_priv = get_random_positive_int(&mut rng, &q).unwrap();
        let h1_pub = g1_base.scalar_mul(&x_priv);
        let h2_pub = g2_base.scalar_mul(&x_priv);

        let session = b"test_session_ecddh";
        let proof = EcddhProof::new(session, &q, &x_priv, &g1_base, &g2_base, &h1_pub, &h2_pub, &mut rng).unwrap();
        assert!(proof.verify(session, &q, &g1_base, &g2_base, &h1_pub, &h2_pub), "EcddhProof verification failed");
        assert!(!proof.verify(b"wrong", &q, &g1_base, &g2_base, &h1_pub, &h2_pub), "EcddhProof verified with wrong session");

        let x_wrong = get_random_positive_int(&mut rng, &q).unwrap();
        let h2_wrong = g2_base.scalar_mul(&x_wrong);
        assert!(!proof.verify(session, &q, &g1_base, &g2_base, &h1_pub, &h2_wrong), "EcddhProof verified with inconsistent H2");
    }
}
 