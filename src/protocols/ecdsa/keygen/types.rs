// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Save data, temp data and pre-computed (Paillier/ring-Pedersen) parameters
// shared by the ECDSA keygen rounds.

use crate::{
    crypto::{
        ecpoint::K256Point,
        paillier::{self, PrivateKey as PaillierSk, PublicKey as PaillierPk},
        vss::{Share as VssShare, VerificationVector},
    },
    tss::message::ParsedMessage,
};

use k256::Secp256k1;
use num_bigint_dig::BigInt;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc, time::Duration};
use thiserror::Error;

const PRE_PARAMS_BIT_LEN: usize = 2048;
const NTILDE_BIT_LEN: usize = 2048;

#[derive(Error, Debug)]
pub enum PreParamsError {
    #[error("safe prime generation failed: {0}")]
    SafePrime(#[from] crate::common::safe_prime::SafePrimeError),
    #[error("failed to build Paillier key pair: {0}")]
    Paillier(#[from] paillier::PaillierError),
    #[error("pre-params generation failed: {0}")]
    Other(String),
}

/// The safe-prime-derived material each party generates for itself ahead of
/// round 1: a Paillier key pair and a ring-Pedersen (Ntilde, h1, h2) setup
/// together with the discrete logs relating h1 and h2, needed to produce the
/// two DLN proofs sent in round 1.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LocalPreParams {
    pub paillier_sk: Option<PaillierSk>,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub paillier_p: BigInt,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub paillier_q: BigInt,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub ntilde_i: BigInt,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub h1i: BigInt,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub h2i: BigInt,
    /// Sophie-Germain factors of `ntilde_i` (i.e. `ntilde_i = (2p+1)(2q+1)`),
    /// used as the DLN proof's working modulus `p*q`.
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub ntilde_p: BigInt,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub ntilde_q: BigInt,
    /// Discrete log `alpha` such that `h2i = h1i^alpha mod ntilde_i`.
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub alpha: BigInt,
    /// Discrete log `beta` such that `h1i = h2i^beta mod ntilde_i`.
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub beta: BigInt,
}

impl Default for LocalPreParams {
    fn default() -> Self {
        LocalPreParams {
            paillier_sk: None,
            paillier_p: BigInt::from(0),
            paillier_q: BigInt::from(0),
            ntilde_i: BigInt::from(0),
            h1i: BigInt::from(0),
            h2i: BigInt::from(0),
            ntilde_p: BigInt::from(0),
            ntilde_q: BigInt::from(0),
            alpha: BigInt::from(0),
            beta: BigInt::from(0),
        }
    }
}

impl LocalPreParams {
    /// True once a full, consistent set of pre-params (Paillier key plus
    /// ring-Pedersen setup and its DLN exponents) has been generated.
    pub fn validate_with_proof(&self) -> bool {
        self.paillier_sk.is_some() && self.ntilde_i.bits() > 0 && self.alpha.bits() > 0 && self.beta.bits() > 0
    }

    /// Generates a fresh set of pre-params: a 2048-bit Paillier modulus and an
    /// independent ring-Pedersen setup of the same bit length, bounded by
    /// `timeout`. Blocks the calling thread; round 1 calls this from a plain
    /// (non-async) `start()`.
    pub fn generate_pre_params(timeout: Duration) -> Result<Self, PreParamsError> {
        Self::generate_pre_params_with_concurrency(timeout, 4)
    }

    pub fn generate_pre_params_with_concurrency(
        timeout: Duration,
        concurrency: usize,
    ) -> Result<Self, PreParamsError> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| PreParamsError::Other(format!("failed to start local runtime: {}", e)))?;
        rt.block_on(async move {
            let rng = Arc::new(tokio::sync::Mutex::new(rand::thread_rng()));

            let (paillier_sk, _paillier_pk) = tokio::time::timeout(
                timeout,
                paillier::generate_key_pair(rng.clone(), PRE_PARAMS_BIT_LEN, concurrency),
            )
            .await
            .map_err(|_| crate::common::safe_prime::SafePrimeError::Timeout)??;

            let paillier_p = paillier_sk
                .p()
                .cloned()
                .ok_or_else(|| PreParamsError::Other("Paillier key pair missing p".to_string()))?;
            let paillier_q = paillier_sk
                .q()
                .cloned()
                .ok_or_else(|| PreParamsError::Other("Paillier key pair missing q".to_string()))?;

            let ntilde_safe_primes = tokio::time::timeout(
                timeout,
                crate::common::safe_prime::get_random_safe_primes_concurrent(
                    NTILDE_BIT_LEN / 2,
                    2,
                    concurrency,
                    rng.clone(),
                ),
            )
            .await
            .map_err(|_| crate::common::safe_prime::SafePrimeError::Timeout)??;

            let ntilde_p = ntilde_safe_primes[0].prime();
            let ntilde_q = ntilde_safe_primes[1].prime();
            let ntilde_safe_p = ntilde_safe_primes[0].safe_prime();
            let ntilde_safe_q = ntilde_safe_primes[1].safe_prime();

            let mut local_rng = rand::thread_rng();
            let ntilde_i = &ntilde_safe_p * &ntilde_safe_q;
            let ntilde_phi = &ntilde_p * &ntilde_q;
            let mod_ntilde_phi = crate::common::int::ModInt::new(ntilde_phi.clone());
            let mod_ntilde = crate::common::int::ModInt::new(ntilde_i.clone());

            let h1i = crate::common::random::get_random_generator_of_quadratic_residue(&mut local_rng, &ntilde_i)
                .ok_or_else(|| PreParamsError::Other("failed to sample h1".to_string()))?;
            let alpha =
                crate::common::random::get_random_positive_relatively_prime_int(&mut local_rng, &ntilde_phi)
                    .ok_or_else(|| PreParamsError::Other("failed to sample alpha".to_string()))?;
            let beta = mod_ntilde_phi
                .mod_inverse(&alpha)
                .ok_or_else(|| PreParamsError::Other("alpha has no inverse mod phi(ntilde)".to_string()))?;
            let h2i = mod_ntilde.exp(&h1i, &alpha);

            Ok(LocalPreParams {
                paillier_sk: Some(paillier_sk),
                paillier_p,
                paillier_q,
                ntilde_i,
                h1i,
                h2i,
                ntilde_p,
                ntilde_q,
                alpha,
                beta,
            })
        })
    }
}

/// Final output of a completed keygen run: each party's share of the ECDSA
/// private key, plus everything needed to verify and use the other
/// parties' shares in later signing/re-sharing rounds.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LocalPartySaveData {
    pub local_pre_params: LocalPreParams,
    #[serde(with = "crate::serde_support::vec_bigint_bytes")]
    pub ks: Vec<BigInt>,
    #[serde(with = "crate::serde_support::bigint_bytes")]
    pub share_id: BigInt,
    #[serde(with = "crate::serde_support::opt_bigint_bytes")]
    pub xi: Option<BigInt>,
    pub ecdsa_pub: Option<K256Point>,
    pub big_xj: Vec<Option<K256Point>>,
    pub paillier_sk: Option<PaillierSk>,
    pub paillier_pks: Vec<Option<PaillierPk>>,
    #[serde(with = "crate::serde_support::vec_opt_bigint_bytes")]
    pub ntilde_j: Vec<Option<BigInt>>,
    #[serde(with = "crate::serde_support::vec_opt_bigint_bytes")]
    pub h1j: Vec<Option<BigInt>>,
    #[serde(with = "crate::serde_support::vec_opt_bigint_bytes")]
    pub h2j: Vec<Option<BigInt>>,
}

impl LocalPartySaveData {
    pub fn new(party_count: usize) -> Self {
        LocalPartySaveData {
            local_pre_params: LocalPreParams::default(),
            ks: Vec::with_capacity(party_count),
            share_id: BigInt::from(0),
            xi: None,
            ecdsa_pub: None,
            big_xj: vec![None; party_count],
            paillier_sk: None,
            paillier_pks: vec![None; party_count],
            ntilde_j: vec![None; party_count],
            h1j: vec![None; party_count],
            h2j: vec![None; party_count],
        }
    }
}

/// Messages received so far, keyed by the sender's party index.
#[derive(Default, Debug)]
pub struct KeygenMessageStore {
    pub kg_round1_messages: HashMap<i32, Arc<dyn ParsedMessage>>,
    pub kg_round2_message1s: HashMap<i32, Arc<dyn ParsedMessage>>,
    pub kg_round2_message2s: HashMap<i32, Arc<dyn ParsedMessage>>,
    pub kg_round3_messages: HashMap<i32, Arc<dyn ParsedMessage>>,
}

impl KeygenMessageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Scratch state that only needs to live for the duration of a single keygen
/// run; discarded once round 4 sends the final `LocalPartySaveData`.
#[derive(Debug)]
pub struct LocalTempData {
    pub message_store: KeygenMessageStore,
    pub ui: Option<BigInt>,
    pub kgcs: Vec<Option<BigInt>>,
    pub vs: Option<VerificationVector<Secp256k1>>,
    pub shares: Option<Vec<VssShare>>,
    pub decommit_poly_g: Option<Vec<BigInt>>,
    pub ssid: Option<Vec<u8>>,
    pub ssid_nonce: Option<BigInt>,
}

impl LocalTempData {
    pub fn new(party_count: usize) -> Self {
        LocalTempData {
            message_store: KeygenMessageStore::new(),
            ui: None,
            kgcs: vec![None; party_count],
            vs: None,
            shares: None,
            decommit_poly_g: None,
            ssid: None,
            ssid_nonce: None,
        }
    }
}

/// Convenience accessor mirroring the Go library's `shares.Vss[i].Share`
/// indexing: the VSS shares are generated in the same order as
/// `Parameters::parties().party_ids()`, so a party's own share sits at its
/// own index.
pub trait SharesExt {
    fn get_share(&self, index: usize) -> &BigInt;
}

impl SharesExt for Vec<VssShare> {
    fn get_share(&self, index: usize) -> &BigInt {
        &self[index].share
    }
}
