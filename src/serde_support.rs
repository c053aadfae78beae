//! Shared `serde` helpers for encoding `BigInt` values as big-endian byte
//! strings rather than their (slow, verbose) native decimal form.

use num_bigint_dig::{BigInt, Sign};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub mod bigint_bytes {
    use super::*;

    pub fn serialize<S>(value: &BigInt, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let (sign, bytes) = value.to_bytes_be();
        let negative = sign == Sign::Minus;
        (negative, serde_bytes_vec(bytes)).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BigInt, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (negative, bytes): (bool, Vec<u8>) = Deserialize::deserialize(deserializer)?;
        let sign = if negative { Sign::Minus } else { Sign::Plus };
        Ok(BigInt::from_bytes_be(sign, &bytes))
    }

    fn serde_bytes_vec(bytes: Vec<u8>) -> Vec<u8> {
        bytes
    }
}

pub mod vec_bigint_bytes {
    use super::*;

    pub fn serialize<S>(values: &[BigInt], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let encoded: Vec<(bool, Vec<u8>)> = values
            .iter()
            .map(|v| {
                let (sign, bytes) = v.to_bytes_be();
                (sign == Sign::Minus, bytes)
            })
            .collect();
        encoded.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<BigInt>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded: Vec<(bool, Vec<u8>)> = Deserialize::deserialize(deserializer)?;
        Ok(encoded
            .into_iter()
            .map(|(negative, bytes)| {
                let sign = if negative { Sign::Minus } else { Sign::Plus };
                BigInt::from_bytes_be(sign, &bytes)
            })
            .collect())
    }
}

pub mod opt_bigint_bytes {
    use super::*;

    pub fn serialize<S>(value: &Option<BigInt>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(v) => {
                let (sign, bytes) = v.to_bytes_be();
                Some((sign == Sign::Minus, bytes)).serialize(serializer)
            }
            None => None::<(bool, Vec<u8>)>.serialize(serializer),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<BigInt>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded: Option<(bool, Vec<u8>)> = Deserialize::deserialize(deserializer)?;
        Ok(encoded.map(|(negative, bytes)| {
            let sign = if negative { Sign::Minus } else { Sign::Plus };
            BigInt::from_bytes_be(sign, &bytes)
        }))
    }
}

pub mod vec_opt_bigint_bytes {
    use super::*;

    pub fn serialize<S>(values: &[Option<BigInt>], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let encoded: Vec<Option<(bool, Vec<u8>)>> = values
            .iter()
            .map(|opt| {
                opt.as_ref().map(|v| {
                    let (sign, bytes) = v.to_bytes_be();
                    (sign == Sign::Minus, bytes)
                })
            })
            .collect();
        encoded.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Option<BigInt>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded: Vec<Option<(bool, Vec<u8>)>> = Deserialize::deserialize(deserializer)?;
        Ok(encoded
            .into_iter()
            .map(|opt| {
                opt.map(|(negative, bytes)| {
                    let sign = if negative { Sign::Minus } else { Sign::Plus };
                    BigInt::from_bytes_be(sign, &bytes)
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Wrapper(#[serde(with = "bigint_bytes")] BigInt);

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct VecWrapper(#[serde(with = "vec_bigint_bytes")] Vec<BigInt>);

    #[test]
    fn round_trips_positive_and_negative() {
        for n in [BigInt::from(0), BigInt::from(12345), BigInt::from(-987654321i64)] {
            let w = Wrapper(n.clone());
            let bytes = serde_json::to_vec(&w).unwrap();
            let back: Wrapper = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(back.0, n);
        }
    }

    #[test]
    fn round_trips_vec() {
        let v = VecWrapper(vec![BigInt::from(1), BigInt::from(-2), BigInt::from(300)]);
        let bytes = serde_json::to_vec(&v).unwrap();
        let back: VecWrapper = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, v);
    }
}
