pub mod ecpoint;
pub mod utils;
pub mod commitments;
pub mod paillier;
pub mod vss;
pub mod schnorr;
pub mod mta;
pub mod ckd;
pub mod dlnproof;
pub mod facproof;
pub mod modproof;
pub mod encproof;
pub mod logstarproof;
pub mod affgproof;
pub mod mulproof;
pub mod decproof;