// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Save data, temp data and final output shared by the re-sharing rounds.
//
// Messages are keyed by the sender's `PartyID.key` rather than a positional
// index: a physical party's index in the old committee's `Parameters` and in
// the new committee's `ReSharingParameters` need not agree (and an old-only
// or new-only party doesn't appear in both), so the stable cross-committee
// identity is the key, not the index.

use crate::{
    crypto::{
        ecpoint::K256Point,
        vss::{Share as VssShare, VerificationVector},
    },
    protocols::ecdsa::keygen::types::{LocalPartySaveData, LocalPreParams},
    tss::message::ParsedMessage,
};

use k256::Secp256k1;
use num_bigint_dig::BigInt;
use std::{collections::HashMap, sync::Arc};

/// Final output of a completed re-sharing run for a party that ends up on
/// the new committee. Parties that belong only to the old committee finish
/// the protocol with nothing to save and send `None` on the same channel.
pub type ReSharingOutput = Option<LocalPartySaveData>;

/// Messages received so far, keyed by the sender's `PartyID.key`.
#[derive(Default, Debug)]
pub struct ReSharingMessageStore {
    pub dg_round1_message1s: HashMap<BigInt, Arc<dyn ParsedMessage>>,
    pub dg_round1_message2s: HashMap<BigInt, Arc<dyn ParsedMessage>>,
    pub dg_round2_message1s: HashMap<BigInt, Arc<dyn ParsedMessage>>,
    pub dg_round2_message2s: HashMap<BigInt, Arc<dyn ParsedMessage>>,
    pub dg_round3_messages: HashMap<BigInt, Arc<dyn ParsedMessage>>,
}

impl ReSharingMessageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Scratch state that only needs to live for the duration of a single
/// re-sharing run.
#[derive(Debug)]
pub struct ReSharingTempData {
    pub message_store: ReSharingMessageStore,

    /// (old committee) This party's old Shamir share, weighted by its
    /// Lagrange coefficient within the old committee: `lambda_i * xi`. This
    /// is the sub-secret re-shared (via a fresh, degree-`new_threshold`
    /// polynomial) among the new committee.
    pub sub_share: Option<BigInt>,
    pub vs: Option<VerificationVector<Secp256k1>>,
    pub shares: Option<Vec<VssShare>>,
    pub decommit_poly_g: Option<Vec<BigInt>>,

    /// (new committee) This party's newly assembled private share: the sum
    /// of every old committee member's sub-share evaluated at this party.
    pub new_xi: Option<BigInt>,
    /// (new committee) Public shares for every new committee member,
    /// derived from the componentwise sum of every old member's
    /// verification vector.
    pub new_big_xj: Vec<Option<K256Point>>,
    pub new_ecdsa_pub: Option<K256Point>,

    /// (new committee) This party's own Paillier/ring-Pedersen pre-params
    /// for the new committee: reused from `keys.local_pre_params` if this
    /// party was already on the old committee and it validated, otherwise
    /// freshly generated in round 2. Only the public half of this is ever
    /// put on the wire (in `DGRound2Message2`); it is carried here so round
    /// 4 can assemble the final save data with the matching secret key.
    pub new_pre_params: Option<LocalPreParams>,

    pub ssid: Option<Vec<u8>>,
    pub ssid_nonce: Option<BigInt>,
}

impl ReSharingTempData {
    pub fn new(new_party_count: usize) -> Self {
        ReSharingTempData {
            message_store: ReSharingMessageStore::new(),
            sub_share: None,
            vs: None,
            shares: None,
            decommit_poly_g: None,
            new_xi: None,
            new_big_xj: vec![None; new_party_count],
            new_ecdsa_pub: None,
            new_pre_params: None,
            ssid: None,
            ssid_nonce: None,
        }
    }
}
