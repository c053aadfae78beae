// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Translation of tss-lib-go/tss/party_id.go

use num_bigint_dig::BigInt;
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};
use std::{
    cmp::Ordering,
    collections::HashSet,
    fmt,
    hash::{Hash, Hasher},
};

/// Represents a participant in the TSS protocol rounds.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PartyID {
    /// A unique string ID for the party (derived from key).
    pub id: String,
    /// A human-readable identifier.
    pub moniker: String,
    /// A unique identifying key (e.g., derived from the party's Paillier public key).
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub key: BigInt,
    /// Zero-based index assigned after sorting parties by key.
    pub index: i32,
}

impl PartyID {
    /// Creates a new `PartyID`. `index` starts at -1 until `sort_party_ids` assigns it.
    pub fn new(id: String, moniker: String, key: BigInt) -> Self {
        Self { id, moniker, key, index: -1 }
    }

    pub fn validate_basic(&self) -> bool {
        !self.key.is_zero() && self.index >= 0
    }
}

// Ordering, equality and hashing are based solely on `key`, matching the
// Go implementation's comparison semantics.
impl Ord for PartyID {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl PartialOrd for PartyID {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PartyID {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for PartyID {}

impl Hash for PartyID {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for PartyID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{},{}}}", self.index, self.moniker)
    }
}

/// Sorts a slice of `PartyID`s in place by their `key` and assigns indices.
pub fn sort_party_ids(ids: &mut [PartyID], start_at: Option<i32>) {
    ids.sort_unstable();
    let start_index = start_at.unwrap_or(0);
    for (i, id) in ids.iter_mut().enumerate() {
        id.index = start_index + i as i32;
    }
}

/// Finds a `PartyID` within a slice by its `key`.
pub fn find_party_by_key<'a>(ids: &'a [PartyID], key: &BigInt) -> Option<&'a PartyID> {
    ids.iter().find(|p| &p.key == key)
}

/// Returns a new vector of `PartyID`s excluding the specified one.
pub fn exclude_party(ids: &[PartyID], exclude: &PartyID) -> Vec<PartyID> {
    ids.iter().filter(|&p| p != exclude).cloned().collect()
}

/// Converts a slice of `PartyID`s to a vector of their keys.
pub fn get_party_keys(ids: &[PartyID]) -> Vec<BigInt> {
    ids.iter().map(|p| p.key.clone()).collect()
}

/// Generates a list of mock `PartyID`s for tests, sorted with indices assigned.
pub fn generate_test_party_ids(count: usize, start_at: Option<i32>) -> Vec<PartyID> {
    use crate::common::test_utils::generate_random_bigint_in_range;
    use rand::thread_rng;

    let start_index = start_at.unwrap_or(0);
    let mut rng = thread_rng();
    let base_key = generate_random_bigint_in_range(
        &mut rng,
        &(BigInt::from(1u32) << 255),
        &((BigInt::from(1u32) << 256) - BigInt::one()),
    );

    let mut keys = HashSet::new();
    let mut ids = Vec::with_capacity(count);

    while ids.len() < count {
        let offset = BigInt::from(ids.len() as i32);
        let key = &base_key + offset;

        if keys.insert(key.clone()) {
            let i = ids.len() as i32 + start_index;
            ids.push(PartyID {
                id: format!("id_{}", i),
                moniker: format!("P[{}]", i),
                key,
                index: -1,
            });
        }
    }

    sort_party_ids(&mut ids, start_at);
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_party_id_validate_basic() {
        let key1 = BigInt::from(123);
        let mut p1 = PartyID::new("p1".to_string(), "Moniker1".to_string(), key1.clone());
        assert!(!p1.validate_basic());

        p1.index = 0;
        assert!(p1.validate_basic());

        let mut p0 = PartyID::new("p0".to_string(), "Moniker0".to_string(), BigInt::zero());
        p0.index = 0;
        assert!(!p0.validate_basic());
    }

    #[test]
    fn test_party_id_sorting() {
        let mut ids = vec![
            PartyID::new("p3".to_string(), "P3".to_string(), BigInt::from(300)),
            PartyID::new("p1".to_string(), "P1".to_string(), BigInt::from(100)),
            PartyID::new("p2".to_string(), "P2".to_string(), BigInt::from(200)),
        ];

        sort_party_ids(&mut ids, None);

        assert_eq!(ids[0].key, BigInt::from(100));
        assert_eq!(ids[0].index, 0);
        assert_eq!(ids[1].key, BigInt::from(200));
        assert_eq!(ids[1].index, 1);
        assert_eq!(ids[2].key, BigInt::from(300));
        assert_eq!(ids[2].index, 2);

        sort_party_ids(&mut ids, Some(10));
        assert_eq!(ids[0].index, 10);
        assert_eq!(ids[1].index, 11);
        assert_eq!(ids[2].index, 12);
    }

    #[test]
    fn test_party_id_equality_and_hashing() {
        let p1a = PartyID { id: "a".into(), moniker: "A".into(), key: BigInt::from(100), index: 0 };
        let p1b = PartyID { id: "b".into(), moniker: "B".into(), key: BigInt::from(100), index: 1 };
        let p2 = PartyID { id: "c".into(), moniker: "C".into(), key: BigInt::from(200), index: 2 };

        assert_eq!(p1a, p1b);
        assert_ne!(p1a, p2);

        let mut set = HashSet::new();
        assert!(set.insert(p1a.clone()));
        assert!(!set.insert(p1b.clone()));
        assert!(set.insert(p2.clone()));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_find_party_by_key() {
        let mut ids = vec![
            PartyID::new("p3".to_string(), "P3".to_string(), BigInt::from(300)),
            PartyID::new("p1".to_string(), "P1".to_string(), BigInt::from(100)),
            PartyID::new("p2".to_string(), "P2".to_string(), BigInt::from(200)),
        ];
        sort_party_ids(&mut ids, None);

        let key_to_find = BigInt::from(200);
        let found = find_party_by_key(&ids, &key_to_find);
        assert!(found.is_some());
        assert_eq!(found.unwrap().key, key_to_find);
        assert_eq!(found.unwrap().moniker, "P2");

        let key_not_found = BigInt::from(400);
        assert!(find_party_by_key(&ids, &key_not_found).is_none());
    }

    #[test]
    fn test_exclude_party() {
        let mut ids = vec![
            PartyID::new("p3".to_string(), "P3".to_string(), BigInt::from(300)),
            PartyID::new("p1".to_string(), "P1".to_string(), BigInt::from(100)),
            PartyID::new("p2".to_string(), "P2".to_string(), BigInt::from(200)),
        ];
        sort_party_ids(&mut ids, None);

        let party_to_exclude = ids[1].clone();
        let excluded = exclude_party(&ids, &party_to_exclude);

        assert_eq!(excluded.len(), 2);
        assert_eq!(excluded[0].key, BigInt::from(100));
        assert_eq!(excluded[1].key, BigInt::from(300));
    }

    #[test]
    fn test_generate_test_party_ids() {
        let count = 5;
        let ids = generate_test_party_ids(count, Some(1));

        assert_eq!(ids.len(), count);
        let mut last_key = BigInt::zero();
        let mut keys = HashSet::new();
        for (i, id) in ids.iter().enumerate() {
            assert_eq!(id.index, (i + 1) as i32);
            assert!(id.key > last_key);
            assert!(keys.insert(id.key.clone()));
            last_key = id.key.clone();
        }
    }
}
