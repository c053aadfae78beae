// Translation of tss-lib-go/crypto/facproof/proof.go

mod proof;

pub use proof::*;
