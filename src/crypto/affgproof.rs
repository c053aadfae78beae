// Paillier affine operation with group commitment in range (CGGMP21 Figure 15).

mod proof;

pub use proof::*;
