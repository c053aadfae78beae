// Paillier decryption-in-the-exponent proof (CGGMP21 Figure 28).

mod proof;

pub use proof::*;
