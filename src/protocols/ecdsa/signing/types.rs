// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Save data, temp data and final output shared by the nine ECDSA signing rounds.

use crate::{
    crypto::ecpoint::K256Point,
    tss::message::ParsedMessage,
};

use num_bigint_dig::BigInt;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};

/// Final output of a completed signing run: the assembled ECDSA signature
/// plus the hashed message it covers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignatureData {
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub r: BigInt,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub s: BigInt,
    /// `r` and `s` as fixed-width 32-byte big-endian values, concatenated.
    pub signature: Vec<u8>,
    /// The standard ECDSA recovery id (0..=3).
    pub recovery_id: u8,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub m: BigInt,
}

/// Messages received so far, keyed by the sender's party index.
#[derive(Default, Debug)]
pub struct SigningMessageStore {
    pub sign_round1_message1s: HashMap<i32, Arc<dyn ParsedMessage>>,
    pub sign_round1_message2s: HashMap<i32, Arc<dyn ParsedMessage>>,
    pub sign_round2_messages: HashMap<i32, Arc<dyn ParsedMessage>>,
    pub sign_round3_messages: HashMap<i32, Arc<dyn ParsedMessage>>,
    pub sign_round4_messages: HashMap<i32, Arc<dyn ParsedMessage>>,
    pub sign_round5_messages: HashMap<i32, Arc<dyn ParsedMessage>>,
    pub sign_round6_messages: HashMap<i32, Arc<dyn ParsedMessage>>,
    pub sign_round7_messages: HashMap<i32, Arc<dyn ParsedMessage>>,
    pub sign_round8_messages: HashMap<i32, Arc<dyn ParsedMessage>>,
    pub sign_round9_messages: HashMap<i32, Arc<dyn ParsedMessage>>,
}

impl SigningMessageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Scratch state that only needs to live for the duration of a single signing
/// run; discarded once round 9 sends the final `SignatureData`.
///
/// Per-counterparty MtA intermediates are keyed by the other party's index:
/// `alpha[j]` is this party's share of `k_i * gamma_j` (this party as Alice,
/// decrypted from party `j`'s round 2 response); `beta[j]` is this party's own
/// share of `k_j * gamma_i` (this party as Bob, kept locally when responding
/// to party `j`'s round 1 ciphertext). `mu`/`nu` are the analogous pair for
/// the `k * w` product.
#[derive(Debug)]
pub struct LocalTempData {
    pub message_store: SigningMessageStore,

    /// This party's Lagrange-adjusted key share `w_i = lambda_i * x_i mod q`.
    pub w_i: Option<BigInt>,
    /// Public counterparts `W_j = lambda_j * X_j` for every party, derived
    /// from the keygen output and each party's Lagrange coefficient.
    pub big_w_j: Vec<Option<K256Point>>,

    pub k_i: Option<BigInt>,
    /// Paillier randomness used to produce `c_ki`, needed later to prove
    /// knowledge of `k_i` via `RangeProofAlice`.
    pub k_i_randomness: Option<BigInt>,
    pub c_ki: Option<BigInt>,

    pub gamma_i: Option<BigInt>,
    pub big_gamma_i: Option<K256Point>,
    pub de_commit_big_gamma_i: Option<Vec<BigInt>>,

    pub alpha: HashMap<usize, BigInt>,
    pub beta: HashMap<usize, BigInt>,
    pub mu: HashMap<usize, BigInt>,
    pub nu: HashMap<usize, BigInt>,

    pub delta_i: Option<BigInt>,
    pub sigma_i: Option<BigInt>,
    pub delta: Option<BigInt>,
    pub big_gamma: Option<K256Point>,

    /// `R = Gamma * delta^-1`, the shared nonce-inverse point; `r = R.x mod q`.
    pub r_point: Option<K256Point>,
    pub big_r_i: Option<K256Point>,
    pub de_commit_big_r_i: Option<Vec<BigInt>>,

    pub l_i: Option<BigInt>,
    pub v_i: Option<K256Point>,
    /// `A = sum_j R_j`, `V = sum_j V_j`: public aggregates used by the
    /// two-phase consistency check in rounds 7-8.
    pub big_a: Option<K256Point>,
    pub big_v: Option<K256Point>,

    pub rho_i: Option<BigInt>,
    pub big_u_i: Option<K256Point>,
    pub big_t_i: Option<K256Point>,
    pub de_commit_u_t_i: Option<Vec<BigInt>>,

    pub s_i: Option<BigInt>,

    pub ssid: Option<Vec<u8>>,
    pub ssid_nonce: Option<BigInt>,
}

impl LocalTempData {
    pub fn new(party_count: usize) -> Self {
        LocalTempData {
            message_store: SigningMessageStore::new(),
            w_i: None,
            big_w_j: vec![None; party_count],
            k_i: None,
            k_i_randomness: None,
            c_ki: None,
            gamma_i: None,
            big_gamma_i: None,
            de_commit_big_gamma_i: None,
            alpha: HashMap::with_capacity(party_count),
            beta: HashMap::with_capacity(party_count),
            mu: HashMap::with_capacity(party_count),
            nu: HashMap::with_capacity(party_count),
            delta_i: None,
            sigma_i: None,
            delta: None,
            big_gamma: None,
            r_point: None,
            big_r_i: None,
            de_commit_big_r_i: None,
            l_i: None,
            v_i: None,
            big_a: None,
            big_v: None,
            rho_i: None,
            big_u_i: None,
            big_t_i: None,
            de_commit_u_t_i: None,
            s_i: None,
            ssid: None,
            ssid_nonce: None,
        }
    }
}
