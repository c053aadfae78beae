// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Old committee: decommit round 1's VSS verification vector.
// New committee: publish (fresh or reused) Paillier/ring-Pedersen params.

use crate::{
    crypto::dlnproof,
    protocols::ecdsa::{
        keygen::{rounds::BaseRound, types::{LocalPartySaveData, LocalPreParams}},
        resharing::{
            messages::{DGRound2Message1, DGRound2Message2},
            rounds::round_3::Round3,
            types::{ReSharingOutput, ReSharingTempData},
        },
    },
    terr,
    tss::{
        error::RoundError,
        message::{MessageRoutingInfo, ParsedMessage, ParsedMessageImpl, TssMessage},
        params::{Parameters, ReSharingParameters},
        party_id::PartyID,
        round::Round,
    },
};

use log::{debug, info};
use rand::thread_rng;
use std::sync::{mpsc::Sender, Arc, Mutex};

#[derive(Debug)]
pub struct Round2 {
    base: BaseRound,
    params: Arc<ReSharingParameters>,
    keys: Arc<LocalPartySaveData>,
    temp: Arc<Mutex<ReSharingTempData>>,
    out_ch: Sender<Box<dyn TssMessage + Send>>,
    end_ch: Sender<ReSharingOutput>,
}

impl Round2 {
    pub fn new(
        params: Arc<ReSharingParameters>,
        keys: Arc<LocalPartySaveData>,
        temp: Arc<Mutex<ReSharingTempData>>,
        out_ch: Sender<Box<dyn TssMessage + Send>>,
        end_ch: Sender<ReSharingOutput>,
    ) -> Self {
        let base = BaseRound::new(2, params.old_and_new_party_count());
        Self { base, params, keys, temp, out_ch, end_ch }
    }
}

impl Round for Round2 {
    fn params(&self) -> &Parameters {
        self.params.base_params()
    }

    fn round_number(&self) -> i32 {
        self.base.round_number()
    }

    fn start(&self) -> Result<(), RoundError> {
        if self.base.started() {
            return Err(self.wrap_error(terr!("round 2 already started"), vec![]));
        }
        self.base.set_started();
        self.base.reset_ok();

        let current_party_id = self.params.party_id();

        if self.params.is_old_committee() {
            info!(target: "tss-lib", party_id = ?current_party_id, "re-sharing round 2: broadcasting VSS decommitment");
            let decommitment = {
                let temp_lock = self.temp.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
                temp_lock.decommit_poly_g.clone().ok_or_else(|| self.wrap_error(terr!("missing VSS decommitment"), vec![current_party_id.as_ref().clone()]))?
            };

            let r2msg1 = DGRound2Message1::new(decommitment);
            let routing = MessageRoutingInfo {
                from: current_party_id.as_ref().clone(),
                to: None,
                is_broadcast: true,
                is_to_old_committee: false,
                is_to_old_and_new_committees: true,
            };
            let tss_msg = ParsedMessageImpl::from_content(routing, &r2msg1).map_err(|e| self.wrap_error(e, vec![]))?;
            {
                let mut temp_lock = self.temp.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
                temp_lock.message_store.dg_round2_message1s.insert(current_party_id.key.clone(), Arc::new(tss_msg.clone()));
            }
            self.out_ch.send(Box::new(tss_msg)).map_err(|e| self.wrap_error(terr!("failed to send round 2 message 1: {}", e), vec![]))?;
        }

        if self.params.is_new_committee() {
            info!(target: "tss-lib", party_id = ?current_party_id, "re-sharing round 2: publishing Paillier/ring-Pedersen params");
            let mut rng = thread_rng();

            let pre_params = if self.keys.local_pre_params.validate_with_proof() {
                debug!(target: "tss-lib", party_id = ?current_party_id, "reusing pre-computed Paillier/ring-Pedersen params from old committee");
                self.keys.local_pre_params.clone()
            } else {
                debug!(target: "tss-lib", party_id = ?current_party_id, "generating new Paillier/ring-Pedersen params");
                let fresh = LocalPreParams::generate_pre_params_with_concurrency(
                    self.params.safe_prime_gen_timeout(),
                    self.params.concurrency(),
                )
                .map_err(|e| self.wrap_error(e, vec![current_party_id.as_ref().clone()]))?;
                info!(target: "tss-lib", party_id = ?current_party_id, "finished generating Paillier/ring-Pedersen params");
                fresh
            };

            let dln_proof_1 = dlnproof::Proof::new(
                &pre_params.h1i,
                &pre_params.h2i,
                &pre_params.alpha,
                &pre_params.ntilde_p,
                &pre_params.ntilde_q,
                &pre_params.ntilde_i,
                &mut rng,
            )
            .map_err(|e| self.wrap_error(e, vec![current_party_id.as_ref().clone()]))?;
            let dln_proof_2 = dlnproof::Proof::new(
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
                let mut temp_lock = self.temp.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
                temp_lock.new_pre_params = Some(pre_params.clone());
            }

            let r2msg2 = DGRound2Message2::new(
                paillier_pk,
                pre_params.ntilde_i.clone(),
                pre_params.h1i.clone(),
                pre_params.h2i.clone(),
                dln_proof_1,
                dln_proof_2,
            );
            let routing = MessageRoutingInfo::broadcast(current_party_id.as_ref().clone());
            let tss_msg = ParsedMessageImpl::from_content(routing, &r2msg2).map_err(|e| self.wrap_error(e, vec![]))?;
            {
                let mut temp_lock = self.temp.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
                temp_lock.message_store.dg_round2_message2s.insert(current_party_id.key.clone(), Arc::new(tss_msg.clone()));
            }
            self.out_ch.send(Box::new(tss_msg)).map_err(|e| self.wrap_error(terr!("failed to send round 2 message 2: {}", e), vec![]))?;
        }

        info!(target: "tss-lib", party_id = ?current_party_id, "re-sharing round 2 finished successfully");
        Ok(())
    }

    fn can_accept(&self, msg: &dyn ParsedMessage) -> bool {
        match msg.type_tag() {
            t if t == DGRound2Message1::TYPE_URL => msg.is_broadcast(),
            t if t == DGRound2Message2::TYPE_URL => msg.is_broadcast(),
            _ => false,
        }
    }

    fn update(&self) -> Result<bool, RoundError> {
        if !self.params.is_new_committee() {
            return Ok(true);
        }
        let temp = self.temp.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
        for party in self.params.old_parties().party_ids() {
            if !temp.message_store.dg_round2_message1s.contains_key(&party.key) {
                return Ok(false);
            }
        }
        for party in self.params.new_parties().party_ids() {
            if !temp.message_store.dg_round2_message2s.contains_key(&party.key) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn can_proceed(&self) -> bool {
        true
    }

    fn next_round(&self) -> Option<Arc<dyn Round>> {
        self.base.set_started_unwrapped();
        if !self.params.is_new_committee() {
            let _ = self.end_ch.send(None);
            return None;
        }
        Some(Arc::new(Round3::new(
            self.params.clone(),
            self.keys.clone(),
            self.temp.clone(),
            self.out_ch.clone(),
            self.end_ch.clone(),
        )))
    }

    fn waiting_for(&self) -> Vec<PartyID> {
        if !self.params.is_new_committee() {
            return Vec::new();
        }
        let temp = match self.temp.lock() {
            Ok(t) => t,
            Err(_) => return Vec::new(),
        };
        let mut waiting = Vec::new();
        for party in self.params.old_parties().party_ids() {
            if !temp.message_store.dg_round2_message1s.contains_key(&party.key) {
                waiting.push(party.clone());
            }
        }
        for party in self.params.new_parties().party_ids() {
            if !temp.message_store.dg_round2_message2s.contains_key(&party.key) {
                waiting.push(party.clone());
            }
        }
        waiting
    }
}
