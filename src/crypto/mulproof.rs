// Paillier multiplication proof (CGGMP21 Figure 29).

mod proof;

pub use proof::*;
