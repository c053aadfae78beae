// Translation of tss-lib-go/tss/*.go package layout.

pub mod curve;
pub mod error;
pub mod message;
pub mod party_id;
pub mod params;
pub mod round;
pub mod party;

/// Generic curve-arithmetic trait bound used throughout `crypto::*` to stay
/// polymorphic over the concrete elliptic curve (`k256::Secp256k1`,
/// `p256::NistP256`, ...). Re-exported here so protocol/crypto code can write
/// `use crate::tss::Curve;` without depending on the `elliptic-curve` crate
/// directly. Not to be confused with [`curve::Curve`], the runtime curve-name
/// enum used to select which curve a protocol run operates over.
pub use elliptic_curve::Curve;

pub use curve::Curve as CurveName;
pub use error::{RoundErr, RoundError};
pub use party_id::PartyID;
pub use params::{Parameters, ReSharingParameters};
pub use round::Round;
