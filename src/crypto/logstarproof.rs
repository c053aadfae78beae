// Knowledge-of-exponent-vs-Paillier-encryption proof (CGGMP21 Figure 25).

mod proof;

pub use proof::*;
