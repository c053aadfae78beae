// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Translation of tss-lib-go/ecdsa/keygen/round_2.go

use crate::{
    crypto::{facproof, modproof},
    protocols::ecdsa::keygen::{
        messages::{KGRound1Message, KGRound2Message1, KGRound2Message2},
        rounds::{
            base::BaseRound,
            dln_proof_verifier::{verify_dln_proofs, DlnProofVerifierContext},
            round_3::Round3,
        },
        types::{LocalPartySaveData, LocalTempData, SharesExt},
    },
    terr,
    tss::{
        error::RoundError,
        message::{decode_content, MessageRoutingInfo, ParsedMessage, ParsedMessageImpl, TssMessage},
        params::Parameters,
        party_id::PartyID,
        round::Round,
    },
};

use log::{debug, error, info, warn};
use rand::thread_rng;
use std::collections::HashMap;
use std::sync::{mpsc::Sender, Arc, Mutex};

const PAILLIER_BITS_LEN: usize = 2048;

#[derive(Debug)]
pub struct Round2 {
    base: BaseRound,
    params: Arc<Parameters>,
    save: Arc<Mutex<LocalPartySaveData>>,
    temp: Arc<Mutex<LocalTempData>>,
    out_ch: Sender<Box<dyn TssMessage + Send>>,
    end_ch: Sender<LocalPartySaveData>,
}

impl Round2 {
    pub fn new(
        params: Arc<Parameters>,
        save: Arc<Mutex<LocalPartySaveData>>,
        temp: Arc<Mutex<LocalTempData>>,
        out_ch: Sender<Box<dyn TssMessage + Send>>,
        end_ch: Sender<LocalPartySaveData>,
    ) -> Self {
        let base = BaseRound::new(2, params.party_count());
        Self { base, params, save, temp, out_ch, end_ch }
    }

    fn get_context_bytes(&self, index: i32) -> Result<Vec<u8>, RoundError> {
        let temp_data = self.temp.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
        let ssid = temp_data.ssid.as_ref().ok_or_else(|| self.wrap_error(terr!("SSID not set"), vec![]))?;
        let mut context_bytes = ssid.clone();
        context_bytes.extend_from_slice(&index.to_be_bytes());
        Ok(context_bytes)
    }
}

impl Round for Round2 {
    fn params(&self) -> &Parameters {
        &self.params
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
        let i = current_party_id.index as usize;

        info!(target: "tss-lib", party_id = ?current_party_id, "keygen round 2 starting: verifying DLN proofs, sending VSS shares");

        let round1_messages = {
            let temp_data = self.temp.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![current_party_id.as_ref().clone()]))?;
            temp_data.message_store.kg_round1_messages.clone()
        };

        let mut h1h2_seen: HashMap<String, ()> = HashMap::with_capacity(self.params.party_count() * 2);
        let mut dln_contexts = Vec::with_capacity(round1_messages.len());
        for parsed_msg_arc in round1_messages.values() {
            let r1_msg: KGRound1Message = decode_content(parsed_msg_arc.as_ref())
                .map_err(|e| self.wrap_error(e, vec![parsed_msg_arc.from().clone()]))?;

            if r1_msg.paillier_pk.n.bits() != PAILLIER_BITS_LEN {
                return Err(self.wrap_error(
                    terr!("Paillier modulus has insufficient bits ({})", r1_msg.paillier_pk.n.bits()),
                    vec![parsed_msg_arc.from().clone()],
                ));
            }
            if r1_msg.h1 == r1_msg.h2 {
                return Err(self.wrap_error(terr!("h1 and h2 are equal"), vec![parsed_msg_arc.from().clone()]));
            }
            if r1_msg.ntilde.bits() != PAILLIER_BITS_LEN {
                return Err(self.wrap_error(terr!("Ntilde has insufficient bits ({})", r1_msg.ntilde.bits()), vec![parsed_msg_arc.from().clone()]));
            }

            let h1_hex = hex::encode(r1_msg.h1.to_bytes_be().1);
            let h2_hex = hex::encode(r1_msg.h2.to_bytes_be().1);
            if h1h2_seen.contains_key(&h1_hex) || h1h2_seen.contains_key(&h2_hex) {
                return Err(self.wrap_error(terr!("h1 or h2 was already used by another party"), vec![parsed_msg_arc.from().clone()]));
            }
            h1h2_seen.insert(h1_hex, ());
            h1h2_seen.insert(h2_hex, ());

            dln_contexts.push(DlnProofVerifierContext::new(r1_msg, parsed_msg_arc.from().clone()));
        }

        debug!(target: "tss-lib", party_id = ?current_party_id, concurrency = self.params.concurrency(), "verifying DLN proofs");
        let dln_results = verify_dln_proofs(&dln_contexts, self.params.concurrency())
            .map_err(|e| self.wrap_error(e, vec![]))?;

        let mut culprits = Vec::new();
        for result in dln_results {
            if !result.proof1_valid || !result.proof2_valid {
                error!(target: "tss-lib", party_id = ?current_party_id, culprit = ?result.culprit, "DLN proof verification failed");
                culprits.push(result.culprit);
            }
        }
        if !culprits.is_empty() {
            return Err(self.wrap_error(terr!("DLN proof verification failed"), culprits));
        }
        info!(target: "tss-lib", party_id = ?current_party_id, "DLN proofs verified successfully");

        {
            let mut save_data_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock save data: {}", e), vec![current_party_id.as_ref().clone()]))?;
            let mut temp_data_lock = self.temp.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![current_party_id.as_ref().clone()]))?;

            for (party_idx, parsed_msg_arc) in &round1_messages {
                let party_idx_usize = *party_idx as usize;
                if party_idx_usize == i {
                    continue;
                }
                let r1_msg: KGRound1Message = decode_content(parsed_msg_arc.as_ref())
                    .map_err(|e| self.wrap_error(e, vec![parsed_msg_arc.from().clone()]))?;

                save_data_lock.paillier_pks[party_idx_usize] = Some(r1_msg.paillier_pk);
                save_data_lock.ntilde_j[party_idx_usize] = Some(r1_msg.ntilde);
                save_data_lock.h1j[party_idx_usize] = Some(r1_msg.h1);
                save_data_lock.h2j[party_idx_usize] = Some(r1_msg.h2);
                temp_data_lock.kgcs[party_idx_usize] = Some(r1_msg.commitment);
            }
        }

        // P2P: send each peer its VSS share plus a factorization proof of our
        // own Paillier modulus against their ring-Pedersen setup.
        let (shares, own_sk_n, own_p, own_q, h1_vec, h2_vec, ntilde_vec) = {
            let temp_data_lock = self.temp.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![current_party_id.as_ref().clone()]))?;
            let save_data_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock save data: {}", e), vec![current_party_id.as_ref().clone()]))?;
            (
                temp_data_lock.shares.clone().ok_or_else(|| self.wrap_error(terr!("missing VSS shares"), vec![current_party_id.as_ref().clone()]))?,
                save_data_lock.paillier_sk.as_ref().map(|sk| sk.public_key.n.clone())
                    .ok_or_else(|| self.wrap_error(terr!("missing Paillier SK"), vec![current_party_id.as_ref().clone()]))?,
                save_data_lock.local_pre_params.paillier_p.clone(),
                save_data_lock.local_pre_params.paillier_q.clone(),
                save_data_lock.h1j.iter().map(|opt| opt.clone().unwrap()).collect::<Vec<_>>(),
                save_data_lock.h2j.iter().map(|opt| opt.clone().unwrap()).collect::<Vec<_>>(),
                save_data_lock.ntilde_j.iter().map(|opt| opt.clone().unwrap()).collect::<Vec<_>>(),
            )
        };

        let context_i = self.get_context_bytes(i as i32)?;
        let ec_order = self.params.ec().order();
        let all_parties = self.params.parties().party_ids().to_vec();

        for (j, party_j) in all_parties.iter().enumerate() {
            let fac_proof = facproof::ProofFac::new(
                &context_i,
                &ec_order,
                &own_sk_n,
                &ntilde_vec[j],
                &h1_vec[j],
                &h2_vec[j],
                &own_p,
                &own_q,
                &mut thread_rng(),
            )
            .map_err(|e| self.wrap_error(e, vec![party_j.clone()]))?;

            let r2msg1 = KGRound2Message1::new(shares.get_share(j).clone(), fac_proof);

            if j == i {
                let routing = MessageRoutingInfo::broadcast(current_party_id.as_ref().clone());
                let tss_msg = ParsedMessageImpl::from_content(routing, &r2msg1).map_err(|e| self.wrap_error(e, vec![]))?;
                let mut temp_data_lock = self.temp.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![current_party_id.as_ref().clone()]))?;
                temp_data_lock.message_store.kg_round2_message1s.insert(i as i32, Arc::new(tss_msg));
            } else {
                let routing = MessageRoutingInfo::point_to_point(current_party_id.as_ref().clone(), party_j.clone());
                let tss_msg = ParsedMessageImpl::from_content(routing, &r2msg1).map_err(|e| self.wrap_error(e, vec![]))?;
                debug!(target: "tss-lib", party_id = ?current_party_id, to_party_idx = j, "sending VSS share and FacProof");
                self.out_ch.send(Box::new(tss_msg)).map_err(|e| self.wrap_error(terr!("failed to send round 2 message 1: {}", e), vec![]))?;
            }
        }

        // BROADCAST: decommitment of our VSS verification vector, plus a
        // proof that our own Paillier modulus is a valid Blum integer.
        let (decommitment_di, paillier_sk_n) = {
            let mut temp_data_lock = self.temp.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![current_party_id.as_ref().clone()]))?;
            let save_data_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock save data: {}", e), vec![current_party_id.as_ref().clone()]))?;
            (
                temp_data_lock.decommit_poly_g.take().ok_or_else(|| self.wrap_error(terr!("missing VSS decommitment"), vec![current_party_id.as_ref().clone()]))?,
                save_data_lock.paillier_sk.as_ref().map(|sk| sk.public_key.n.clone())
                    .ok_or_else(|| self.wrap_error(terr!("missing Paillier SK"), vec![current_party_id.as_ref().clone()]))?,
            )
        };

        let mod_proof = modproof::ProofMod::new(&context_i, &paillier_sk_n, &own_p, &own_q, &mut thread_rng())
            .map_err(|e| self.wrap_error(e, vec![current_party_id.as_ref().clone()]))?;

        let r2msg2 = KGRound2Message2::new(decommitment_di, mod_proof);
        let routing = MessageRoutingInfo::broadcast(current_party_id.as_ref().clone());
        let tss_msg = ParsedMessageImpl::from_content(routing, &r2msg2).map_err(|e| self.wrap_error(e, vec![]))?;

        {
            let mut temp_data_lock = self.temp.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![current_party_id.as_ref().clone()]))?;
            temp_data_lock.message_store.kg_round2_message2s.insert(i as i32, Arc::new(tss_msg.clone()));
        }

        debug!(target: "tss-lib", party_id = ?current_party_id, "broadcasting decommitment and ModProof");
        self.out_ch.send(Box::new(tss_msg)).map_err(|e| self.wrap_error(terr!("failed to send round 2 message 2: {}", e), vec![]))?;

        info!(target: "tss-lib", party_id = ?current_party_id, "keygen round 2 finished successfully");
        Ok(())
    }

    fn can_accept(&self, msg: &dyn ParsedMessage) -> bool {
        let from = msg.from();
        if from.index < 0 || from.index as usize >= self.params.party_count() {
            warn!(target: "tss-lib", party_id = ?self.params.party_id(), from_party = ?from, "message from invalid party index ignored");
            return false;
        }
        match msg.type_tag() {
            t if t == KGRound2Message1::TYPE_URL => !msg.is_broadcast(),
            t if t == KGRound2Message2::TYPE_URL => msg.is_broadcast(),
            _ => false,
        }
    }

    fn update(&self) -> Result<bool, RoundError> {
        let mut all_ok = true;
        let required_parties = self.params.party_count();

        let temp_data = self.temp.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;

        for j in 0..required_parties {
            if self.base.is_ok(j) {
                continue;
            }
            if temp_data.message_store.kg_round2_message1s.contains_key(&(j as i32))
                && temp_data.message_store.kg_round2_message2s.contains_key(&(j as i32))
            {
                self.base.set_ok(j);
            } else {
                all_ok = false;
            }
        }
        debug!(target: "tss-lib", party_id = ?self.params.party_id(), ok_parties = ?self.base.get_ok_vec(), "round 2 update check");
        Ok(all_ok)
    }

    fn can_proceed(&self) -> bool {
        self.base.get_ok_vec().iter().all(|&ok| ok)
    }

    fn next_round(&self) -> Option<Arc<dyn Round>> {
        self.base.set_started_unwrapped();
        Some(Arc::new(Round3::new(
            self.params.clone(),
            self.save.clone(),
            self.temp.clone(),
            self.out_ch.clone(),
            self.end_ch.clone(),
        )))
    }

    fn waiting_for(&self) -> Vec<PartyID> {
        self.base.waiting_for(self.params.parties().party_ids())
    }
}
