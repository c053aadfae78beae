// Translation of tss-lib-go/crypto/schnorr_proof.go

mod schnorr_proof;

pub use schnorr_proof::*;
