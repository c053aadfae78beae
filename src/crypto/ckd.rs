// Translation of tss-lib-go/crypto/ckd/child_key_derivation.go

mod child_key_derivation;

pub use child_key_derivation::*;
