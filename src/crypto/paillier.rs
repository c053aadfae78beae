// Translation of tss-lib-go/crypto/paillier/paillier.go

mod paillier;

pub use paillier::*;
