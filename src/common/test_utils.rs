//! Small helpers shared by test code across the `common` and `tss` packages.

use num_bigint_dig::{BigInt, RandBigInt};
use rand::RngCore;

/// Returns a uniformly random `BigInt` in `[low, high]`.
pub fn generate_random_bigint_in_range<R: RngCore>(rng: &mut R, low: &BigInt, high: &BigInt) -> BigInt {
    rng.gen_bigint_range(low, &(high + BigInt::from(1)))
}
