// Translation of tss-lib-go/crypto/modproof/proof.go

mod proof;

pub use proof::*;
