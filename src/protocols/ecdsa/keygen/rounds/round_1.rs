// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Translation of tss-lib-go/ecdsa/keygen/round_1.go

use crate::{
    common::random::get_random_positive_int,
    crypto::{
        commitments::HashCommitDecommit,
        dlnproof,
        ecpoint::flatten_ec_points,
        vss,
    },
    protocols::ecdsa::keygen::{
        messages::KGRound1Message,
        rounds::{base::BaseRound, round_2::Round2},
        types::{LocalPartySaveData, LocalPreParams, LocalTempData},
    },
    terr,
    tss::{
        error::RoundError,
        message::{MessageRoutingInfo, ParsedMessage, ParsedMessageImpl, TssMessage},
        params::Parameters,
        party_id::PartyID,
        round::Round,
    },
};

use k256::Secp256k1;
use log::{debug, info};
use num_bigint_dig::BigInt;
use num_traits::Zero;
use rand::thread_rng;
use std::sync::{mpsc::Sender, Arc, Mutex};

#[derive(Debug)]
pub struct Round1 {
    base: BaseRound,
    params: Arc<Parameters>,
    save: Arc<Mutex<LocalPartySaveData>>,
    temp: Arc<Mutex<LocalTempData>>,
    out_ch: Sender<Box<dyn TssMessage + Send>>,
    end_ch: Sender<LocalPartySaveData>,
}

impl Round1 {
    pub fn new(
        params: Arc<Parameters>,
        save: Arc<Mutex<LocalPartySaveData>>,
        temp: Arc<Mutex<LocalTempData>>,
        out_ch: Sender<Box<dyn TssMessage + Send>>,
        end_ch: Sender<LocalPartySaveData>,
    ) -> Self {
        let base = BaseRound::new(1, params.party_count());
        Self { base, params, save, temp, out_ch, end_ch }
    }

    /// Generates the SSID (Session Shared ID) for the protocol execution.
    /// SSID = H(sid, P1_id, ..., Pn_id, nonce)
    fn get_ssid(&self) -> Result<Vec<u8>, RoundError> {
        let party_ids = self.params.parties().party_ids();
        let mut string_ids: Vec<&str> = party_ids.iter().map(|p| p.id.as_str()).collect();
        string_ids.sort();

        let sid = "tss-lib-keygen-session";

        let mut data_to_hash = sid.as_bytes().to_vec();
        for id_str in string_ids {
            data_to_hash.extend_from_slice(id_str.as_bytes());
        }

        let temp_data = self.temp.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
        let nonce = temp_data.ssid_nonce.as_ref().ok_or_else(|| self.wrap_error(terr!("SSID nonce not set"), vec![]))?;
        data_to_hash.extend_from_slice(&nonce.to_bytes_be().1);

        use sha2::{Digest, Sha256};
        let hash = Sha256::digest(&data_to_hash);
        Ok(hash.to_vec())
    }
}

impl Round for Round1 {
    fn params(&self) -> &Parameters {
        &self.params
    }

    fn round_number(&self) -> i32 {
        self.base.round_number()
    }

    fn start(&self) -> Result<(), RoundError> {
        if self.base.started() {
            return Err(self.wrap_error(terr!("round 1 already started"), vec![]));
        }
        self.base.set_started();
        self.base.reset_ok();

        let current_party_id = self.params.party_id();
        let i = current_party_id.index;

        info!(target: "tss-lib", party_id = ?current_party_id, "keygen round 1 starting: generating VSS shares and commitments");

        // 1. Sample this party's additive share ui of the secret key.
        let ec_order = self.params.ec().order();
        let mut rng = thread_rng();
        let ui = get_random_positive_int(&mut rng, &ec_order)
            .ok_or_else(|| self.wrap_error(terr!("failed to generate random ui"), vec![current_party_id.as_ref().clone()]))?;

        {
            let mut temp_data_lock = self
                .temp
                .lock()
                .map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![current_party_id.as_ref().clone()]))?;
            temp_data_lock.ui = Some(ui.clone());
        }

        // 2. Split ui into a (threshold, n) Feldman VSS sharing.
        let threshold = self.params.threshold();
        let all_party_keys: Vec<BigInt> = self.params.parties().party_ids().iter().map(|p| p.key.clone()).collect();
        let (vs, shares) = vss::create::<Secp256k1, _>(&ec_order, threshold, &ui, &all_party_keys, &mut rng)
            .map_err(|e| self.wrap_error(e, vec![current_party_id.as_ref().clone()]))?;

        {
            let mut save_data_lock = self
                .save
                .lock()
                .map_err(|e| self.wrap_error(terr!("failed to lock save data: {}", e), vec![current_party_id.as_ref().clone()]))?;
            save_data_lock.ks = all_party_keys;
            save_data_lock.share_id = current_party_id.key.clone();
        }

        // 3. Commit to the VSS verification vector: C_i = H(r, V_i0, ..., V_it).
        let flattened_points = flatten_ec_points(&vs.vector)
            .map_err(|e| self.wrap_error(terr!("failed to flatten VSS commitments: {}", e), vec![current_party_id.as_ref().clone()]))?;
        let point_refs: Vec<&BigInt> = flattened_points.iter().collect();
        let commit_decommit = HashCommitDecommit::new(&mut rng, &point_refs);

        // 4-11. Generate (or reuse) Paillier keys and a ring-Pedersen setup, then
        // prove knowledge of the discrete logs relating h1i and h2i.
        let pre_params = {
            let mut save_data_lock = self
                .save
                .lock()
                .map_err(|e| self.wrap_error(terr!("failed to lock save data: {}", e), vec![current_party_id.as_ref().clone()]))?;
            if save_data_lock.local_pre_params.validate_with_proof() {
                debug!(target: "tss-lib", party_id = ?current_party_id, "using pre-computed Paillier/ring-Pedersen params");
                save_data_lock.local_pre_params.clone()
            } else {
                debug!(target: "tss-lib", party_id = ?current_party_id, "generating new Paillier/ring-Pedersen params");
                let new_pre_params = LocalPreParams::generate_pre_params_with_concurrency(
                    self.params.safe_prime_gen_timeout(),
                    self.params.concurrency(),
                )
                .map_err(|e| self.wrap_error(e, vec![current_party_id.as_ref().clone()]))?;
                info!(target: "tss-lib", party_id = ?current_party_id, "finished generating Paillier/ring-Pedersen params");
                save_data_lock.local_pre_params = new_pre_params.clone();
                new_pre_params
            }
        };

        let dln_proof1 = dlnproof::Proof::new(
            &pre_params.h1i,
            &pre_params.h2i,
            &pre_params.alpha,
            &pre_params.ntilde_p,
            &pre_params.ntilde_q,
            &pre_params.ntilde_i,
            &mut rng,
        )
        .map_err(|e| self.wrap_error(e, vec![current_party_id.as_ref().clone()]))?;
        let dln_proof2 = dlnproof::Proof::new(
            &pre_params.h2i,
            &pre_params.h1i,
            &pre_params.beta,
            &pre_params.ntilde_p,
            &pre_params.ntilde_q,
            &pre_params.ntilde_i,
            &mut rng,
        )
        .map_err(|e| self.wrap_error(e, vec![current_party_id.as_ref().clone()]))?;

        let paillier_pk = pre_params
            .paillier_sk
            .as_ref()
            .ok_or_else(|| self.wrap_error(terr!("pre-params missing Paillier key"), vec![current_party_id.as_ref().clone()]))?
            .public_key
            .clone();

        {
            let mut temp_data_lock = self
                .temp
                .lock()
                .map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![current_party_id.as_ref().clone()]))?;
            let mut save_data_lock = self
                .save
                .lock()
                .map_err(|e| self.wrap_error(terr!("failed to lock save data: {}", e), vec![current_party_id.as_ref().clone()]))?;

            temp_data_lock.ssid_nonce = Some(BigInt::zero());
            temp_data_lock.vs = Some(vs);
            temp_data_lock.shares = Some(shares);
            temp_data_lock.decommit_poly_g = Some(commit_decommit.d.clone());

            save_data_lock.ntilde_j[i as usize] = Some(pre_params.ntilde_i.clone());
            save_data_lock.h1j[i as usize] = Some(pre_params.h1i.clone());
            save_data_lock.h2j[i as usize] = Some(pre_params.h2i.clone());
            save_data_lock.paillier_pks[i as usize] = Some(paillier_pk.clone());
            save_data_lock.paillier_sk = pre_params.paillier_sk.clone();

            let ssid = self.get_ssid()?;
            temp_data_lock.ssid = Some(ssid);
        }

        // BROADCAST: commitment, Paillier PK, ring-Pedersen setup, DLN proofs.
        let round1_msg = KGRound1Message::new(
            commit_decommit.c.clone(),
            paillier_pk,
            pre_params.ntilde_i.clone(),
            pre_params.h1i.clone(),
            pre_params.h2i.clone(),
            dln_proof1,
            dln_proof2,
        );

        let routing = MessageRoutingInfo::broadcast(current_party_id.as_ref().clone());
        let tss_msg = ParsedMessageImpl::from_content(routing, &round1_msg)
            .map_err(|e| self.wrap_error(e, vec![current_party_id.as_ref().clone()]))?;

        {
            let mut temp_data_lock = self
                .temp
                .lock()
                .map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![current_party_id.as_ref().clone()]))?;
            temp_data_lock.message_store.kg_round1_messages.insert(i, Arc::new(tss_msg.clone()));
        }

        self.out_ch
            .send(Box::new(tss_msg))
            .map_err(|e| self.wrap_error(terr!("failed to send round 1 message: {}", e), vec![]))?;

        info!(target: "tss-lib", party_id = ?current_party_id, "keygen round 1 finished successfully");
        Ok(())
    }

    fn can_accept(&self, msg: &dyn ParsedMessage) -> bool {
        msg.is_broadcast() && msg.type_tag() == KGRound1Message::TYPE_URL
    }

    fn update(&self) -> Result<bool, RoundError> {
        let mut all_ok = true;
        let required_count = self.params().party_count();

        let temp_data = self.temp.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;

        for j in 0..required_count {
            if self.base.is_ok(j) {
                continue;
            }
            if temp_data.message_store.kg_round1_messages.contains_key(&(j as i32)) {
                self.base.set_ok(j);
            } else {
                all_ok = false;
            }
        }
        debug!(target: "tss-lib", party_id = ?self.params.party_id(), ok_parties = ?self.base.get_ok_vec(), "round 1 update check");
        Ok(all_ok)
    }

    fn can_proceed(&self) -> bool {
        self.base.get_ok_vec().iter().all(|&ok| ok)
    }

    fn next_round(&self) -> Option<Arc<dyn Round>> {
        self.base.set_started_unwrapped();
        Some(Arc::new(Round2::new(
            self.params.clone(),
            self.save.clone(),
            self.temp.clone(),
            self.out_ch.clone(),
            self.end_ch.clone(),
        )))
    }

    fn waiting_for(&self) -> Vec<PartyID> {
        let party_ids = self.params.parties().party_ids();
        self.base.waiting_for(party_ids)
    }
}
