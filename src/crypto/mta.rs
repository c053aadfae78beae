// Translation of tss-lib-go/crypto/mta/proofs.go and tss-lib-go/crypto/mta/range_proof.go

mod proofs;
mod range_proof;

pub use proofs::*;
pub use range_proof::*;
