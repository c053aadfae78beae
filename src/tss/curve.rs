// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Translation of tss-lib-go/tss/curve.go

use num_bigint_dig::BigInt;
use num_traits::Num;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Order (group order of the base point) of the secp256k1 curve.
const SECP256K1_ORDER_HEX: &str = "fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141";
/// Order of the NIST P-256 curve's base point.
const NIST_P256_ORDER_HEX: &str = "ffffffff00000000ffffffffffffffffbce6faada7179e84f3b9cac2fc632551";
/// Order `L` of the Ed25519 prime-order subgroup: `2^252 + 27742317777372353535851937790883648493`.
const ED25519_ORDER_HEX: &str = "1000000000000000000000000000000014def9dea2f79cd65812631a5cf5d3";

/// Enum representing the elliptic curves a protocol run can operate over.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Curve {
    Secp256k1,
    NistP256,
    Ed25519,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CurveError {
    #[error("unsupported curve name: {0}")]
    UnsupportedCurve(String),
}

impl Curve {
    /// Returns the string representation of the curve name.
    pub fn name(&self) -> &'static str {
        match self {
            Curve::Secp256k1 => "secp256k1",
            Curve::NistP256 => "nistp256",
            Curve::Ed25519 => "ed25519",
        }
    }

    /// Returns the curve enum variant from its string name.
    pub fn from_name(name: &str) -> Result<Self, CurveError> {
        match name {
            "secp256k1" => Ok(Curve::Secp256k1),
            "nistp256" => Ok(Curve::NistP256),
            "ed25519" => Ok(Curve::Ed25519),
            other => Err(CurveError::UnsupportedCurve(other.to_string())),
        }
    }

    /// Returns the order of the curve's base point (its scalar field size).
    pub fn order(&self) -> BigInt {
        let hex = match self {
            Curve::Secp256k1 => SECP256K1_ORDER_HEX,
            Curve::NistP256 => NIST_P256_ORDER_HEX,
            Curve::Ed25519 => ED25519_ORDER_HEX,
        };
        BigInt::from_str_radix(hex, 16).expect("hardcoded curve order is valid hex")
    }

    /// Returns the bit length of the curve order.
    pub fn order_bit_len(&self) -> usize {
        match self {
            Curve::Secp256k1 => 256,
            Curve::NistP256 => 256,
            Curve::Ed25519 => 253,
        }
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::Zero;

    #[test]
    fn test_curve_names() {
        assert_eq!(Curve::Secp256k1.name(), "secp256k1");
        assert_eq!(Curve::Ed25519.name(), "ed25519");

        assert_eq!(Curve::from_name("secp256k1"), Ok(Curve::Secp256k1));
        assert_eq!(Curve::from_name("ed25519"), Ok(Curve::Ed25519));
        assert!(Curve::from_name("invalid").is_err());
    }

    #[test]
    fn test_curve_order() {
        let secp_order = Curve::Secp256k1.order();
        let ed_order = Curve::Ed25519.order();

        assert!(secp_order > BigInt::zero());
        assert!(ed_order > BigInt::zero());

        let expected_ed_order = BigInt::from(2u32).pow(252)
            + BigInt::from_str_radix("27742317777372353535851937790883648493", 10).unwrap();
        assert_eq!(ed_order, expected_ed_order);

        assert_eq!(Curve::Secp256k1.order_bit_len(), 256);
        assert_eq!(Curve::Ed25519.order_bit_len(), 253);
    }
}
