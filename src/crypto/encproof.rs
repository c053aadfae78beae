// Paillier encryption-in-range proof (CGGMP21 Figure 14).

mod proof;

pub use proof::*;
