// Translation of tss-lib-go/crypto/dlnproof/dln_proof.go

mod proof;

pub use proof::*;
