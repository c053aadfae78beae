// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Wire messages exchanged by the re-sharing rounds.

use crate::{
    crypto::{
        dlnproof::Proof as DlnProof,
        paillier::PublicKey as PaillierPk,
    },
    tss::message::MessageContent,
};

use num_bigint_dig::BigInt;
use serde::{Deserialize, Serialize};

/// Round 1 broadcast (old committee): commitment to the verification vector
/// of this party's sub-share re-sharing polynomial.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DGRound1Message1 {
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub commitment: BigInt,
}

impl DGRound1Message1 {
    pub const TYPE_URL: &'static str = "ecdsa.resharing.DGRound1Message1";

    pub fn new(commitment: BigInt) -> Self {
        DGRound1Message1 { commitment }
    }
}

impl MessageContent for DGRound1Message1 {
    fn validate_basic(&self) -> bool {
        self.commitment.sign() != num_bigint_dig::Sign::Minus
    }

    fn message_type(&self) -> &'static str {
        Self::TYPE_URL
    }
}

/// Round 1 point-to-point (old committee -> new committee): this old
/// party's sub-share of the secret, evaluated at the recipient's index.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DGRound1Message2 {
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub share: BigInt,
}

impl DGRound1Message2 {
    pub const TYPE_URL: &'static str = "ecdsa.resharing.DGRound1Message2";

    pub fn new(share: BigInt) -> Self {
        DGRound1Message2 { share }
    }
}

impl MessageContent for DGRound1Message2 {
    fn validate_basic(&self) -> bool {
        true
    }

    fn message_type(&self) -> &'static str {
        Self::TYPE_URL
    }
}

/// Round 2 broadcast (old committee): decommitment of round 1's
/// verification vector, letting the new committee verify their shares.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DGRound2Message1 {
    pub de_commitment: Vec<BigInt>,
}

impl DGRound2Message1 {
    pub const TYPE_URL: &'static str = "ecdsa.resharing.DGRound2Message1";

    pub fn new(de_commitment: Vec<BigInt>) -> Self {
        DGRound2Message1 { de_commitment }
    }
}

impl MessageContent for DGRound2Message1 {
    fn validate_basic(&self) -> bool {
        !self.de_commitment.is_empty()
    }

    fn message_type(&self) -> &'static str {
        Self::TYPE_URL
    }
}

/// Round 2 broadcast (new committee): this party's fresh (or reused)
/// Paillier key and ring-Pedersen setup, for use by the rest of the new
/// committee in later signing runs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DGRound2Message2 {
    pub paillier_pk: PaillierPk,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub ntilde: BigInt,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub h1: BigInt,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub h2: BigInt,
    pub dln_proof_1: DlnProof,
    pub dln_proof_2: DlnProof,
}

impl DGRound2Message2 {
    pub const TYPE_URL: &'static str = "ecdsa.resharing.DGRound2Message2";

    pub fn new(paillier_pk: PaillierPk, ntilde: BigInt, h1: BigInt, h2: BigInt, dln_proof_1: DlnProof, dln_proof_2: DlnProof) -> Self {
        DGRound2Message2 { paillier_pk, ntilde, h1, h2, dln_proof_1, dln_proof_2 }
    }
}

impl MessageContent for DGRound2Message2 {
    fn validate_basic(&self) -> bool {
        self.h1 != self.h2 && self.ntilde.bits() > 0
    }

    fn message_type(&self) -> &'static str {
        Self::TYPE_URL
    }
}

/// Round 3 broadcast (new committee): acknowledgement that this party has
/// verified every old committee member's share and is ready to finalize.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DGRound3Message {
    pub ack: bool,
}

impl DGRound3Message {
    pub const TYPE_URL: &'static str = "ecdsa.resharing.DGRound3Message";

    pub fn new() -> Self {
        DGRound3Message { ack: true }
    }
}

impl Default for DGRound3Message {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageContent for DGRound3Message {
    fn validate_basic(&self) -> bool {
        self.ack
    }

    fn message_type(&self) -> &'static str {
        Self::TYPE_URL
    }
}
