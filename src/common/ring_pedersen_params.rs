// Translation & adaptation of tss-lib-go/crypto/utils.go's NTildei/H1i/H2i generation,
// generalized into its own reusable Ring-Pedersen commitment setup for the
// CGGMP21-style ZK proofs (FacProof, ModProof, aff-g/dec/mul/enc/log*).

use crate::common::{
    random::{get_random_generator_of_quadratic_residue, get_random_positive_relatively_prime_int},
    safe_prime::{get_safe_prime_details, SafePrimeError},
};
use num_bigint_dig::BigInt;
use num_traits::One;
use rand::{CryptoRng, RngCore};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RingPedersenError {
    #[error("failed to generate safe primes: {0}")]
    PrimeGeneration(#[from] SafePrimeError),
    #[error("failed to generate ring generator")]
    GeneratorFailed,
}

/// A Ring-Pedersen commitment setup `(N, s, t)` with `s = t^lambda mod N` for
/// a secret `lambda`, used as the auxiliary modulus in range-style ZK proofs.
/// The prime factorization of `N` and `lambda` are discarded once the public
/// parameters are derived; only the verifier-visible `(N, s, t)` are kept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RingPedersenParams {
    n: BigInt,
    s: BigInt,
    t: BigInt,
}

impl RingPedersenParams {
    /// Generates a fresh Ring-Pedersen setup with modulus of the given bit
    /// length (the product of two safe primes of `bits/2` bits each).
    pub fn new<R: CryptoRng + RngCore>(rng: &mut R, bits: usize) -> Result<Self, RingPedersenError> {
        let prime_bits = bits / 2;
        let safe_p = get_safe_prime_details(prime_bits, 1, rng)?;
        let safe_q = get_safe_prime_details(prime_bits, 1, rng)?;
        let p = safe_p.safe_prime();
        let q = safe_q.safe_prime();
        Self::from_safe_primes(rng, &p, &q)
    }

    /// Builds a Ring-Pedersen setup directly from two already-generated safe
    /// primes, avoiding a second prime search when the caller already has a
    /// Paillier modulus's factors on hand.
    pub fn from_safe_primes<R: CryptoRng + RngCore>(
        rng: &mut R,
        p: &BigInt,
        q: &BigInt,
    ) -> Result<Self, RingPedersenError> {
        let n = p * q;
        let phi_n = (p - BigInt::one()) * (q - BigInt::one());

        let t = get_random_generator_of_quadratic_residue(rng, &n).ok_or(RingPedersenError::GeneratorFailed)?;
        let lambda = get_random_positive_relatively_prime_int(rng, &phi_n)
            .ok_or(RingPedersenError::GeneratorFailed)?;

        let mod_n = crate::common::int::ModInt::new(n.clone());
        let s = mod_n.exp(&t, &lambda);

        Ok(RingPedersenParams { n, s, t })
    }

    pub fn n(&self) -> BigInt {
        self.n.clone()
    }

    pub fn s(&self) -> BigInt {
        self.s.clone()
    }

    pub fn t(&self) -> BigInt {
        self.t.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;

    #[test]
    fn generates_consistent_params() {
        let mut rng = thread_rng();
        let rp = RingPedersenParams::new(&mut rng, 256).expect("ring pedersen setup should succeed");
        assert!(rp.n().bits() >= 200);
        assert_ne!(rp.s(), BigInt::from(0));
        assert_ne!(rp.t(), BigInt::from(0));
    }
}
