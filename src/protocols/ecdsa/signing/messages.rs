// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Wire messages exchanged by the nine ECDSA signing rounds.

use crate::{
    crypto::{
        ecpoint::K256Point,
        mta::{ProofBob, ProofBobWC, RangeProofAlice},
        schnorr::{EcddhProof, ZkProof, ZkvProof},
    },
    tss::message::MessageContent,
};

use k256::Secp256k1;
use num_bigint_dig::BigInt;
use serde::{Deserialize, Serialize};

/// Round 1, part 1: broadcast commitment to `Gamma_i = gamma_i * G`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignRound1Message1 {
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub commitment: BigInt,
}

impl SignRound1Message1 {
    pub const TYPE_URL: &'static str = "ecdsa.signing.SignRound1Message1";

    pub fn new(commitment: BigInt) -> Self {
        SignRound1Message1 { commitment }
    }
}

impl MessageContent for SignRound1Message1 {
    fn validate_basic(&self) -> bool {
        self.commitment.sign() != num_bigint_dig::Sign::Minus
    }

    fn message_type(&self) -> &'static str {
        Self::TYPE_URL
    }
}

/// Round 1, part 2: a point-to-point Paillier encryption of `k_i`, plus a
/// range proof that the plaintext is well-formed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignRound1Message2 {
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub c_ki: BigInt,
    pub range_proof: RangeProofAlice,
}

impl SignRound1Message2 {
    pub const TYPE_URL: &'static str = "ecdsa.signing.SignRound1Message2";

    pub fn new(c_ki: BigInt, range_proof: RangeProofAlice) -> Self {
        SignRound1Message2 { c_ki, range_proof }
    }
}

impl MessageContent for SignRound1Message2 {
    fn validate_basic(&self) -> bool {
        self.c_ki.sign() != num_bigint_dig::Sign::Minus && self.range_proof.validate_basic()
    }

    fn message_type(&self) -> &'static str {
        Self::TYPE_URL
    }
}

/// Round 2: the MtA and MtA-with-check responses for, respectively,
/// `k_i * gamma_j` and `k_i * w_j`, sent point-to-point from the responder
/// (Bob) back to the initiator (Alice).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignRound2Message {
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub c_beta: BigInt,
    pub proof_bob: ProofBob,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub c_mu: BigInt,
    pub proof_bob_wc: ProofBobWC<Secp256k1>,
}

impl SignRound2Message {
    pub const TYPE_URL: &'static str = "ecdsa.signing.SignRound2Message";

    pub fn new(c_beta: BigInt, proof_bob: ProofBob, c_mu: BigInt, proof_bob_wc: ProofBobWC<Secp256k1>) -> Self {
        SignRound2Message { c_beta, proof_bob, c_mu, proof_bob_wc }
    }
}

impl MessageContent for SignRound2Message {
    fn validate_basic(&self) -> bool {
        self.c_beta.sign() != num_bigint_dig::Sign::Minus
            && self.c_mu.sign() != num_bigint_dig::Sign::Minus
            && self.proof_bob.validate_basic()
            && self.proof_bob_wc.validate_basic()
    }

    fn message_type(&self) -> &'static str {
        Self::TYPE_URL
    }
}

/// Round 3 broadcast: this party's additive share `delta_i` of `k * gamma`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignRound3Message {
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub delta_i: BigInt,
}

impl SignRound3Message {
    pub const TYPE_URL: &'static str = "ecdsa.signing.SignRound3Message";

    pub fn new(delta_i: BigInt) -> Self {
        SignRound3Message { delta_i }
    }
}

impl MessageContent for SignRound3Message {
    fn validate_basic(&self) -> bool {
        true
    }

    fn message_type(&self) -> &'static str {
        Self::TYPE_URL
    }
}

/// Round 4 broadcast: decommitment of `Gamma_i`, plus a Schnorr proof of
/// knowledge of `gamma_i`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignRound4Message {
    #[serde(with = "crate::serde_support::vec_bigint_bytes")]
    pub de_commitment: Vec<BigInt>,
    pub gamma_proof: ZkProof<Secp256k1>,
}

impl SignRound4Message {
    pub const TYPE_URL: &'static str = "ecdsa.signing.SignRound4Message";

    pub fn new(de_commitment: Vec<BigInt>, gamma_proof: ZkProof<Secp256k1>) -> Self {
        SignRound4Message { de_commitment, gamma_proof }
    }
}

impl MessageContent for SignRound4Message {
    fn validate_basic(&self) -> bool {
        !self.de_commitment.is_empty() && self.gamma_proof.validate_basic()
    }

    fn message_type(&self) -> &'static str {
        Self::TYPE_URL
    }
}

/// Round 5 broadcast: commitment to `R_i = k_i * R`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignRound5Message {
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub commitment: BigInt,
}

impl SignRound5Message {
    pub const TYPE_URL: &'static str = "ecdsa.signing.SignRound5Message";

    pub fn new(commitment: BigInt) -> Self {
        SignRound5Message { commitment }
    }
}

impl MessageContent for SignRound5Message {
    fn validate_basic(&self) -> bool {
        self.commitment.sign() != num_bigint_dig::Sign::Minus
    }

    fn message_type(&self) -> &'static str {
        Self::TYPE_URL
    }
}

/// Round 6 broadcast: decommitment of `R_i`, plus `V_i = R * sigma_i + l_i * G`
/// (fresh blinding `l_i`) tied together with a `ZkvProof`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignRound6Message {
    #[serde(with = "crate::serde_support::vec_bigint_bytes")]
    pub de_commitment: Vec<BigInt>,
    pub v_i: K256Point,
    pub zkv_proof: ZkvProof<Secp256k1>,
}

impl SignRound6Message {
    pub const TYPE_URL: &'static str = "ecdsa.signing.SignRound6Message";

    pub fn new(de_commitment: Vec<BigInt>, v_i: K256Point, zkv_proof: ZkvProof<Secp256k1>) -> Self {
        SignRound6Message { de_commitment, v_i, zkv_proof }
    }
}

impl MessageContent for SignRound6Message {
    fn validate_basic(&self) -> bool {
        !self.de_commitment.is_empty() && self.v_i.validate_basic() && self.zkv_proof.validate_basic()
    }

    fn message_type(&self) -> &'static str {
        Self::TYPE_URL
    }
}

/// Round 7 broadcast: commitment to the pair `(U_i, T_i)` used by the
/// two-phase consistency check.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignRound7Message {
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub commitment: BigInt,
}

impl SignRound7Message {
    pub const TYPE_URL: &'static str = "ecdsa.signing.SignRound7Message";

    pub fn new(commitment: BigInt) -> Self {
        SignRound7Message { commitment }
    }
}

impl MessageContent for SignRound7Message {
    fn validate_basic(&self) -> bool {
        self.commitment.sign() != num_bigint_dig::Sign::Minus
    }

    fn message_type(&self) -> &'static str {
        Self::TYPE_URL
    }
}

/// Round 8 broadcast: decommitment of `(U_i, T_i)`, plus an `EcddhProof`
/// tying both to the same witness `rho_i` (`U_i = rho_i * V`, `T_i = rho_i * A`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignRound8Message {
    #[serde(with = "crate::serde_support::vec_bigint_bytes")]
    pub de_commitment: Vec<BigInt>,
    pub ecddh_proof: EcddhProof<Secp256k1>,
}

impl SignRound8Message {
    pub const TYPE_URL: &'static str = "ecdsa.signing.SignRound8Message";

    pub fn new(de_commitment: Vec<BigInt>, ecddh_proof: EcddhProof<Secp256k1>) -> Self {
        SignRound8Message { de_commitment, ecddh_proof }
    }
}

impl MessageContent for SignRound8Message {
    fn validate_basic(&self) -> bool {
        !self.de_commitment.is_empty() && self.ecddh_proof.validate_basic()
    }

    fn message_type(&self) -> &'static str {
        Self::TYPE_URL
    }
}

/// Round 9 broadcast: this party's share `s_i = m * k_i + r * sigma_i` of the
/// final ECDSA signature scalar.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignRound9Message {
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub s_i: BigInt,
}

impl SignRound9Message {
    pub const TYPE_URL: &'static str = "ecdsa.signing.SignRound9Message";

    pub fn new(s_i: BigInt) -> Self {
        SignRound9Message { s_i }
    }
}

impl MessageContent for SignRound9Message {
    fn validate_basic(&self) -> bool {
        true
    }

    fn message_type(&self) -> &'static str {
        Self::TYPE_URL
    }
}
