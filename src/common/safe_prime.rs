// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Translation & adaptation of tss-lib-go/common/safe_prime.go

use num_bigint_dig::{BigInt, RandBigInt};
use num_integer::Integer;
use num_prime::{nt_funcs, PrimalityTestConfig};
use num_traits::One;
use rand::{rngs::StdRng, CryptoRng, RngCore, SeedableRng};
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex as TokioMutex};

/// Primes below 1000, used to reject obviously-composite candidates before
/// paying for a full Miller-Rabin/Baillie-PSW pass.
pub const SMALL_PRIMES: [u32; 168] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
    101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151, 157, 163, 167, 173, 179, 181, 191, 193,
    197, 199, 211, 223, 227, 229, 233, 239, 241, 251, 257, 263, 269, 271, 277, 281, 283, 293, 307,
    311, 313, 317, 331, 337, 347, 349, 353, 359, 367, 373, 379, 383, 389, 397, 401, 409, 419, 421,
    431, 433, 439, 443, 449, 457, 461, 463, 467, 479, 487, 491, 499, 503, 509, 521, 523, 541, 547,
    557, 563, 569, 571, 577, 587, 593, 599, 601, 607, 613, 617, 619, 631, 641, 643, 647, 653, 659,
    661, 673, 677, 683, 691, 701, 709, 719, 727, 733, 739, 743, 751, 757, 761, 769, 773, 787, 797,
    809, 811, 821, 823, 827, 829, 839, 853, 857, 859, 863, 877, 881, 883, 887, 907, 911, 919, 929,
    937, 941, 947, 953, 967, 971, 977, 983, 991, 997,
];

pub const DEFAULT_SAFE_PRIME_GEN_TIMEOUT: Duration = Duration::from_secs(5 * 60);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SafePrimeError {
    #[error("safe prime size must be at least 8 bits")]
    BitLenTooSmall,
    #[error("number of primes must be greater than 0")]
    NumPrimesZero,
    #[error("safe prime generation timed out")]
    Timeout,
    #[error("safe prime generation failed: {0}")]
    GenerationFailed(String),
}

/// A Sophie Germain prime `q` together with its associated safe prime
/// `p = 2q + 1`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GermainSafePrime {
    q: BigInt,
    p: BigInt,
}

impl GermainSafePrime {
    /// The Sophie Germain prime itself.
    pub fn prime(&self) -> BigInt {
        self.q.clone()
    }

    /// The associated safe prime `p = 2q + 1`.
    pub fn safe_prime(&self) -> BigInt {
        self.p.clone()
    }

    /// Re-validates both primality conditions and the `p = 2q + 1` relation.
    pub fn validate(&self) -> bool {
        self.p == (&self.q << 1) + BigInt::one() && is_probably_prime(&self.q) && is_probably_prime(&self.p)
    }
}

fn has_small_factor(n: &BigInt) -> bool {
    for sp in SMALL_PRIMES.iter() {
        let sp = BigInt::from(*sp);
        if n == &sp {
            continue;
        }
        if (n % &sp).is_zero() {
            return true;
        }
    }
    false
}

fn is_probably_prime(n: &BigInt) -> bool {
    nt_funcs::is_prime(n, Some(PrimalityTestConfig::strict())).probably()
}

/// Draws a single Sophie Germain / safe prime candidate pair of the requested
/// bit length. Returns `None` if the candidate failed any of the cheap
/// screening checks or the final primality tests; callers loop until `Some`.
fn try_one_candidate<R: RngCore + CryptoRng>(bits: usize, rng: &mut R) -> Option<GermainSafePrime> {
    if bits < 8 {
        return None;
    }
    let mut q = rng.gen_bigint(bits as u64 - 1);
    q.set_bit(bits as u64 - 2, true);
    q.set_bit(0, true);

    if has_small_factor(&q) {
        return None;
    }
    let p = (&q << 1) + BigInt::one();
    if has_small_factor(&p) {
        return None;
    }
    if !is_probably_prime(&q) || !is_probably_prime(&p) {
        return None;
    }
    Some(GermainSafePrime { q, p })
}

/// Synchronously finds one safe prime of the given bit length, racing
/// `concurrency` OS threads against each other and returning the first hit.
pub fn get_safe_prime_details<R: RngCore + CryptoRng>(
    bits: usize,
    concurrency: usize,
    rng: &mut R,
) -> Result<GermainSafePrime, SafePrimeError> {
    if bits < 8 {
        return Err(SafePrimeError::BitLenTooSmall);
    }
    let concurrency = concurrency.max(1);
    let mut local_rngs = Vec::with_capacity(concurrency);
    for _ in 0..concurrency {
        local_rngs.push(
            StdRng::from_rng(&mut *rng).map_err(|e| SafePrimeError::GenerationFailed(e.to_string()))?,
        );
    }

    let found = Arc::new(AtomicBool::new(false));
    let (tx, rx) = std::sync::mpsc::channel();

    std::thread::scope(|scope| {
        for mut local_rng in local_rngs {
            let tx = tx.clone();
            let found = Arc::clone(&found);
            scope.spawn(move || {
                while !found.load(Ordering::Relaxed) {
                    if let Some(sp) = try_one_candidate(bits, &mut local_rng) {
                        found.store(true, Ordering::Relaxed);
                        let _ = tx.send(sp);
                        return;
                    }
                }
            });
        }
        drop(tx);
        rx.recv()
            .map_err(|_| SafePrimeError::GenerationFailed("all workers exited without a result".into()))
    })
}

/// Concurrently searches for `count` safe primes of the given bit length
/// using `concurrency` blocking worker tasks, bounded by
/// [`DEFAULT_SAFE_PRIME_GEN_TIMEOUT`]. `rng` seeds each worker's independent
/// generator so workers never contend on a shared lock while searching.
pub async fn get_random_safe_primes_concurrent<R>(
    bits: usize,
    count: usize,
    concurrency: usize,
    rng: Arc<TokioMutex<R>>,
) -> Result<Vec<GermainSafePrime>, SafePrimeError>
where
    R: RngCore + CryptoRng + Send + 'static,
{
    if bits < 8 {
        return Err(SafePrimeError::BitLenTooSmall);
    }
    if count == 0 {
        return Err(SafePrimeError::NumPrimesZero);
    }
    let concurrency = concurrency.max(1);
    let (tx, mut rx) = mpsc::unbounded_channel::<GermainSafePrime>();
    let remaining = Arc::new(AtomicUsize::new(count));
    let cancel = Arc::new(AtomicBool::new(false));

    let mut handles = Vec::with_capacity(concurrency);
    for _ in 0..concurrency {
        let mut local_rng = {
            let mut guard = rng.lock().await;
            StdRng::from_rng(&mut *guard).map_err(|e| SafePrimeError::GenerationFailed(e.to_string()))?
        };
        let tx = tx.clone();
        let remaining = Arc::clone(&remaining);
        let cancel = Arc::clone(&cancel);
        handles.push(tokio::task::spawn_blocking(move || {
            while !cancel.load(Ordering::Relaxed) {
                if remaining.load(Ordering::Relaxed) == 0 {
                    return;
                }
                if let Some(sp) = try_one_candidate(bits, &mut local_rng) {
                    let claimed = remaining
                        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |r| {
                            if r == 0 {
                                None
                            } else {
                                Some(r - 1)
                            }
                        })
                        .is_ok();
                    if claimed && tx.send(sp).is_err() {
                        return;
                    }
                }
            }
        }));
    }
    drop(tx);

    let collect = async {
        let mut results = Vec::with_capacity(count);
        while results.len() < count {
            match rx.recv().await {
                Some(sp) => results.push(sp),
                None => break,
            }
        }
        results
    };

    let outcome = tokio::time::timeout(DEFAULT_SAFE_PRIME_GEN_TIMEOUT, collect).await;
    cancel.store(true, Ordering::Relaxed);
    for handle in handles {
        handle.abort();
    }

    match outcome {
        Ok(results) if results.len() == count => Ok(results),
        Ok(_) => Err(SafePrimeError::GenerationFailed(
            "workers exited before producing enough primes".into(),
        )),
        Err(_) => Err(SafePrimeError::Timeout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;

    #[test]
    fn small_factor_rejects_composites() {
        assert!(has_small_factor(&BigInt::from(91))); // 7*13
        assert!(!has_small_factor(&BigInt::from(101)));
    }

    #[test]
    fn validates_known_safe_prime() {
        let sgp = GermainSafePrime {
            q: BigInt::from(11),
            p: BigInt::from(23),
        };
        assert!(sgp.validate());
    }

    #[test]
    fn rejects_non_safe_prime() {
        let sgp = GermainSafePrime {
            q: BigInt::from(10),
            p: BigInt::from(21),
        };
        assert!(!sgp.validate());
    }

    #[test]
    fn finds_a_safe_prime_pair() {
        let mut rng = thread_rng();
        let sp = get_safe_prime_details(64, 2, &mut rng).expect("should find a safe prime");
        assert!(sp.validate());
        assert_eq!(sp.safe_prime(), (&sp.prime() << 1) + BigInt::one());
    }

    #[test]
    fn rejects_too_small_bit_length() {
        let mut rng = thread_rng();
        assert_eq!(get_safe_prime_details(4, 1, &mut rng), Err(SafePrimeError::BitLenTooSmall));
    }

    #[tokio::test]
    async fn finds_multiple_safe_primes_concurrently() {
        let rng_arc = Arc::new(TokioMutex::new(thread_rng()));
        let primes = get_random_safe_primes_concurrent(64, 2, 2, rng_arc).await.unwrap();
        assert_eq!(primes.len(), 2);
        for sp in &primes {
            assert!(sp.validate());
        }
    }
}
