// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Translation & adaptation of tss-lib-go/crypto/ecpoint.go
//
// `ECPoint<C>` is a thin, BigInt-facing wrapper around the concrete elliptic
// curve arithmetic of the `elliptic-curve` crate ecosystem (`k256`, `p256`).
// Internally it always normalizes through `BigInt` affine coordinates so that
// it composes with the rest of the crate's arbitrary-precision proof code;
// the conversion to/from the curve's native field representation happens at
// the boundary (`from_coords`/`coords`, `from_bytes`/`to_bytes`).

use elliptic_curve::ops::Reduce;
use elliptic_curve::sec1::{FromEncodedPoint, ModulusSize, ToEncodedPoint};
use elliptic_curve::{CurveArithmetic, FieldBytesSize};
use num_bigint_dig::{BigInt, Sign};
use num_traits::Zero;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PointError {
    #[error("point is not on curve: x={x}, y={y}")]
    NotOnCurve { x: BigInt, y: BigInt },
    #[error("failed to decompress point: {0}")]
    DecompressionError(String),
    #[error("invalid coordinates: point is the identity")]
    InvalidCoords,
    #[error("flatten/unflatten error: {0}")]
    FlattenError(String),
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),
}

/// A point on elliptic curve `C`, represented as `None` for the identity
/// (point at infinity) or `Some` affine coordinates otherwise. All public
/// arithmetic takes and returns `BigInt`; the curve's native scalar/field
/// types never escape this module.
pub struct ECPoint<C: CurveArithmetic> {
    coords: Option<(BigInt, BigInt)>,
    _curve: PhantomData<C>,
}

impl<C: CurveArithmetic> Clone for ECPoint<C> {
    fn clone(&self) -> Self {
        Self { coords: self.coords.clone(), _curve: PhantomData }
    }
}

impl<C: CurveArithmetic> fmt::Debug for ECPoint<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.coords {
            Some((x, y)) => f.debug_struct("ECPoint").field("x", x).field("y", y).finish(),
            None => write!(f, "ECPoint(identity)"),
        }
    }
}

impl<C: CurveArithmetic> PartialEq for ECPoint<C> {
    fn eq(&self, other: &Self) -> bool {
        self.coords == other.coords
    }
}
impl<C: CurveArithmetic> Eq for ECPoint<C> {}

/// Reduces a `BigInt` modulo the curve order and converts it to `C::Scalar`.
fn bigint_to_scalar<C: CurveArithmetic>(k: &BigInt) -> C::Scalar
where
    C::Scalar: Reduce<C::Uint, Bytes = elliptic_curve::FieldBytes<C>>,
{
    let bytes = bigint_to_field_bytes::<C>(k);
    C::Scalar::reduce_bytes(&bytes)
}

/// Encodes a (non-negative, truncated to the field width) `BigInt` into a
/// fixed-width big-endian byte array sized for curve `C`'s field.
fn bigint_to_field_bytes<C: CurveArithmetic>(value: &BigInt) -> elliptic_curve::FieldBytes<C> {
    let (_, mut be_bytes) = value.to_bytes_be();
    let size = <FieldBytesSize<C> as elliptic_curve::generic_array::typenum::Unsigned>::to_usize();
    if be_bytes.len() > size {
        let start = be_bytes.len() - size;
        be_bytes = be_bytes[start..].to_vec();
    }
    let mut buf = vec![0u8; size];
    let offset = size - be_bytes.len();
    buf[offset..].copy_from_slice(&be_bytes);
    elliptic_curve::FieldBytes::<C>::clone_from_slice(&buf)
}

impl<C> ECPoint<C>
where
    C: CurveArithmetic,
    C::AffinePoint: FromEncodedPoint<C> + ToEncodedPoint<C>,
    C::Scalar: Reduce<C::Uint, Bytes = elliptic_curve::FieldBytes<C>>,
    FieldBytesSize<C>: ModulusSize,
{
    /// The identity element (point at infinity).
    pub fn identity() -> Self {
        Self { coords: None, _curve: PhantomData }
    }

    /// The curve's base point generator.
    pub fn generator() -> Self {
        Self::scalar_base_mult(&BigInt::from(1))
    }

    /// Builds a point from its affine `(x, y)` coordinates, checking the
    /// point actually lies on the curve.
    pub fn from_coords(x: &BigInt, y: &BigInt) -> Result<Self, PointError> {
        let x_bytes = bigint_to_field_bytes::<C>(x);
        let y_bytes = bigint_to_field_bytes::<C>(y);
        let encoded = elliptic_curve::sec1::EncodedPoint::<C>::from_affine_coordinates(&x_bytes, &y_bytes, false);
        let affine = C::AffinePoint::from_encoded_point(&encoded);
        if affine.is_none().into() {
            return Err(PointError::NotOnCurve { x: x.clone(), y: y.clone() });
        }
        Ok(Self { coords: Some((x.clone(), y.clone())), _curve: PhantomData })
    }

    /// Decodes a point from SEC1 (compressed or uncompressed) bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PointError> {
        let encoded = elliptic_curve::sec1::EncodedPoint::<C>::from_bytes(bytes)
            .map_err(|e| PointError::InvalidEncoding(e.to_string()))?;
        let affine = C::AffinePoint::from_encoded_point(&encoded);
        if affine.is_none().into() {
            return Err(PointError::DecompressionError("point decode failed".to_string()));
        }
        Self::from_affine(affine.unwrap())
    }

    fn from_affine(affine: C::AffinePoint) -> Result<Self, PointError> {
        let uncompressed = affine.to_encoded_point(false);
        let x = uncompressed
            .x()
            .ok_or_else(|| PointError::DecompressionError("missing x coordinate".to_string()))?;
        let y = uncompressed
            .y()
            .ok_or_else(|| PointError::DecompressionError("missing y coordinate".to_string()))?;
        Ok(Self {
            coords: Some((BigInt::from_bytes_be(Sign::Plus, x), BigInt::from_bytes_be(Sign::Plus, y))),
            _curve: PhantomData,
        })
    }

    fn to_projective(&self) -> C::ProjectivePoint {
        match &self.coords {
            None => C::ProjectivePoint::default(),
            Some((x, y)) => {
                let x_bytes = bigint_to_field_bytes::<C>(x);
                let y_bytes = bigint_to_field_bytes::<C>(y);
                let encoded = elliptic_curve::sec1::EncodedPoint::<C>::from_affine_coordinates(&x_bytes, &y_bytes, false);
                let affine = C::AffinePoint::from_encoded_point(&encoded).expect("coords were already validated");
                C::ProjectivePoint::from(affine)
            }
        }
    }

    fn from_projective(point: C::ProjectivePoint) -> Self {
        use elliptic_curve::group::Group;
        if bool::from(point.is_identity()) {
            return Self::identity();
        }
        let affine: C::AffinePoint = point.into();
        Self::from_affine(affine).expect("projective-derived affine point is always valid")
    }

    /// Returns the X coordinate. Returns 0 for the identity.
    pub fn x(&self) -> BigInt {
        self.coords.as_ref().map(|(x, _)| x.clone()).unwrap_or_else(BigInt::zero)
    }

    /// Returns the Y coordinate. Returns 0 for the identity.
    pub fn y(&self) -> BigInt {
        self.coords.as_ref().map(|(_, y)| y.clone()).unwrap_or_else(BigInt::zero)
    }

    /// Returns `(x, y)`. Returns `(0, 0)` for the identity.
    pub fn coords(&self) -> (BigInt, BigInt) {
        (self.x(), self.y())
    }

    /// Adds another point to this point.
    pub fn add(&self, other: &Self) -> Result<Self, PointError> {
        let sum = self.to_projective() + other.to_projective();
        Ok(Self::from_projective(sum))
    }

    /// Performs scalar multiplication `k * self`, reducing `k` mod the curve order.
    pub fn scalar_mul(&self, k: &BigInt) -> Self {
        let scalar = bigint_to_scalar::<C>(k);
        Self::from_projective(self.to_projective() * scalar)
    }

    /// Multiplies the curve's generator by `k`, reducing `k` mod the curve order.
    pub fn scalar_base_mult(k: &BigInt) -> Self {
        use elliptic_curve::group::Group;
        let scalar = bigint_to_scalar::<C>(k);
        Self::from_projective(C::ProjectivePoint::generator() * scalar)
    }

    /// True if this is the identity element (point at infinity).
    pub fn is_identity(&self) -> bool {
        self.coords.is_none()
    }

    /// A point is considered valid if it is not the identity (its
    /// on-curve-ness was already checked at construction time).
    pub fn validate_basic(&self) -> bool {
        !self.is_identity()
    }

    /// Serializes the point as SEC1 compressed bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        match &self.coords {
            None => vec![0u8],
            Some((x, y)) => {
                let x_bytes = bigint_to_field_bytes::<C>(x);
                let y_bytes = bigint_to_field_bytes::<C>(y);
                let encoded = elliptic_curve::sec1::EncodedPoint::<C>::from_affine_coordinates(&x_bytes, &y_bytes, true);
                encoded.as_bytes().to_vec()
            }
        }
    }
}

/// Flattens a slice of points into their `(x, y)` coordinate pairs. Errors if
/// any point is the identity, since it has no unique affine representation.
pub fn flatten_ec_points<C>(points: &[ECPoint<C>]) -> Result<Vec<BigInt>, PointError>
where
    C: CurveArithmetic,
    C::AffinePoint: FromEncodedPoint<C> + ToEncodedPoint<C>,
    C::Scalar: Reduce<C::Uint, Bytes = elliptic_curve::FieldBytes<C>>,
    FieldBytesSize<C>: ModulusSize,
{
    let mut flat = Vec::with_capacity(points.len() * 2);
    for point in points {
        if point.is_identity() {
            return Err(PointError::FlattenError("cannot flatten identity point".to_string()));
        }
        let (x, y) = point.coords();
        flat.push(x);
        flat.push(y);
    }
    Ok(flat)
}

/// Inverse of [`flatten_ec_points`].
pub fn un_flatten_ec_points<C>(coords: &[BigInt]) -> Result<Vec<ECPoint<C>>, PointError>
where
    C: CurveArithmetic,
    C::AffinePoint: FromEncodedPoint<C> + ToEncodedPoint<C>,
    C::Scalar: Reduce<C::Uint, Bytes = elliptic_curve::FieldBytes<C>>,
    FieldBytesSize<C>: ModulusSize,
{
    if coords.len() % 2 != 0 {
        return Err(PointError::FlattenError("input length must be even".to_string()));
    }
    let mut points = Vec::with_capacity(coords.len() / 2);
    for pair in coords.chunks_exact(2) {
        points.push(ECPoint::<C>::from_coords(&pair[0], &pair[1])?);
    }
    Ok(points)
}

impl<C> Serialize for ECPoint<C>
where
    C: CurveArithmetic,
    C::AffinePoint: FromEncodedPoint<C> + ToEncodedPoint<C>,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        #[derive(Serialize)]
        struct Helper {
            #[serde(with = "crate::serde_support::opt_bigint_bytes")]
            x: Option<BigInt>,
            #[serde(with = "crate::serde_support::opt_bigint_bytes")]
            y: Option<BigInt>,
        }
        let (x, y) = match &self.coords {
            Some((x, y)) => (Some(x.clone()), Some(y.clone())),
            None => (None, None),
        };
        Helper { x, y }.serialize(serializer)
    }
}

impl<'de, C> Deserialize<'de> for ECPoint<C>
where
    C: CurveArithmetic,
    C::AffinePoint: FromEncodedPoint<C> + ToEncodedPoint<C>,
    C::Scalar: Reduce<C::Uint, Bytes = elliptic_curve::FieldBytes<C>>,
    FieldBytesSize<C>: ModulusSize,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Helper {
            #[serde(with = "crate::serde_support::opt_bigint_bytes")]
            x: Option<BigInt>,
            #[serde(with = "crate::serde_support::opt_bigint_bytes")]
            y: Option<BigInt>,
        }
        let helper = Helper::deserialize(deserializer)?;
        match (helper.x, helper.y) {
            (Some(x), Some(y)) => {
                ECPoint::<C>::from_coords(&x, &y).map_err(|e| serde::de::Error::custom(e.to_string()))
            }
            _ => Ok(ECPoint::<C>::identity()),
        }
    }
}

pub type K256Point = ECPoint<k256::Secp256k1>;
pub type P256Point = ECPoint<p256::NistP256>;

#[cfg(test)]
mod tests {
    use super::*;
    use k256::Secp256k1;
    use num_traits::One;

    #[test]
    fn generator_is_not_identity_and_roundtrips_bytes() {
        let g = ECPoint::<Secp256k1>::generator();
        assert!(!g.is_identity());
        let bytes = g.to_bytes();
        assert_eq!(bytes.len(), 33);
        let g2 = ECPoint::<Secp256k1>::from_bytes(&bytes).unwrap();
        assert_eq!(g, g2);
    }

    #[test]
    fn scalar_base_mult_matches_repeated_addition() {
        let g = ECPoint::<Secp256k1>::generator();
        let three_g = ECPoint::<Secp256k1>::scalar_base_mult(&BigInt::from(3));
        let sum = g.add(&g).unwrap().add(&g).unwrap();
        assert_eq!(three_g, sum);
    }

    #[test]
    fn identity_has_zero_coords_and_is_detected() {
        let id = ECPoint::<Secp256k1>::identity();
        assert!(id.is_identity());
        assert_eq!(id.coords(), (BigInt::zero(), BigInt::zero()));
    }

    #[test]
    fn scalar_mul_by_one_is_identity_op() {
        let g = ECPoint::<Secp256k1>::generator();
        let same = g.scalar_mul(&BigInt::one());
        assert_eq!(g, same);
    }

    #[test]
    fn from_coords_rejects_off_curve_points() {
        let result = ECPoint::<Secp256k1>::from_coords(&BigInt::from(1), &BigInt::from(2));
        assert!(result.is_err());
    }

    #[test]
    fn flatten_and_unflatten_round_trip() {
        let points = vec![
            ECPoint::<Secp256k1>::generator(),
            ECPoint::<Secp256k1>::scalar_base_mult(&BigInt::from(2)),
        ];
        let flat = flatten_ec_points(&points).unwrap();
        let back: Vec<ECPoint<Secp256k1>> = un_flatten_ec_points(&flat).unwrap();
        assert_eq!(points, back);
    }
}
