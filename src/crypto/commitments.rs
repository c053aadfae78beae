// Translation of tss-lib-go/crypto/commitments.go

mod commitment;
mod commitment_builder;

pub use commitment::*;
pub use commitment_builder::*;
