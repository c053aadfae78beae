// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Wire messages exchanged by the four ECDSA keygen rounds.

use crate::{
    crypto::{
        dlnproof::Proof as DlnProof,
        facproof::ProofFac,
        modproof::ProofMod,
        paillier::{PaillierProof, PublicKey as PaillierPk},
    },
    tss::message::MessageContent,
};

use num_bigint_dig::BigInt;
use serde::{Deserialize, Serialize};

/// Round 1 broadcast: commitment to this party's VSS polynomial plus its
/// Paillier public key and ring-Pedersen (Ntilde, h1, h2) setup, each backed
/// by a DLN proof of knowledge of the discrete log relating h1 and h2.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KGRound1Message {
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub commitment: BigInt,
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

impl KGRound1Message {
    pub const TYPE_URL: &'static str = "ecdsa.keygen.KGRound1Message";

    pub fn new(
        commitment: BigInt,
        paillier_pk: PaillierPk,
        ntilde: BigInt,
        h1: BigInt,
        h2: BigInt,
        dln_proof_1: DlnProof,
        dln_proof_2: DlnProof,
    ) -> Self {
        KGRound1Message { commitment, paillier_pk, ntilde, h1, h2, dln_proof_1, dln_proof_2 }
    }
}

impl MessageContent for KGRound1Message {
    fn validate_basic(&self) -> bool {
        self.commitment.sign() != num_bigint_dig::Sign::Minus
            && self.ntilde.bits() > 0
            && self.h1.bits() > 0
            && self.h2.bits() > 0
    }

    fn message_type(&self) -> &'static str {
        Self::TYPE_URL
    }
}

/// Round 2, part 1: a point-to-point VSS share for a single recipient, plus
/// a factorization proof of this sender's own Paillier modulus against the
/// recipient's ring-Pedersen setup.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KGRound2Message1 {
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub share: BigInt,
    pub fac_proof: ProofFac,
}

impl KGRound2Message1 {
    pub const TYPE_URL: &'static str = "ecdsa.keygen.KGRound2Message1";

    pub fn new(share: BigInt, fac_proof: ProofFac) -> Self {
        KGRound2Message1 { share, fac_proof }
    }
}

impl MessageContent for KGRound2Message1 {
    fn validate_basic(&self) -> bool {
        self.fac_proof.validate_basic()
    }

    fn message_type(&self) -> &'static str {
        Self::TYPE_URL
    }
}

/// Round 2, part 2: broadcast decommitment of this party's round-1
/// commitment (revealing its VSS verification vector), plus a proof that
/// its own Paillier modulus is a valid Blum integer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KGRound2Message2 {
    #[serde(with = "crate::serde_support::vec_bigint_bytes")]
    pub de_commitment: Vec<BigInt>,
    pub mod_proof: ProofMod,
}

impl KGRound2Message2 {
    pub const TYPE_URL: &'static str = "ecdsa.keygen.KGRound2Message2";

    pub fn new(de_commitment: Vec<BigInt>, mod_proof: ProofMod) -> Self {
        KGRound2Message2 { de_commitment, mod_proof }
    }
}

impl MessageContent for KGRound2Message2 {
    fn validate_basic(&self) -> bool {
        !self.de_commitment.is_empty() && self.mod_proof.validate_basic()
    }

    fn message_type(&self) -> &'static str {
        Self::TYPE_URL
    }
}

/// Round 3 broadcast: a proof, under this party's own Paillier key, that its
/// share of the secret is consistent with the aggregate ECDSA public key.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KGRound3Message {
    pub paillier_proof: PaillierProof,
}

impl KGRound3Message {
    pub const TYPE_URL: &'static str = "ecdsa.keygen.KGRound3Message";

    pub fn new(paillier_proof: PaillierProof) -> Self {
        KGRound3Message { paillier_proof }
    }
}

impl MessageContent for KGRound3Message {
    fn validate_basic(&self) -> bool {
        !self.paillier_proof.proof.is_empty()
    }

    fn message_type(&self) -> &'static str {
        Self::TYPE_URL
    }
}
