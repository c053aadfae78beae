// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Translation of tss-lib-go/ecdsa/keygen/round_3.go

use crate::{
    crypto::{
        ecpoint::K256Point,
        vss::Share as VssShare,
    },
    protocols::ecdsa::keygen::{
        messages::{KGRound2Message1, KGRound2Message2, KGRound3Message},
        rounds::{base::BaseRound, round_4::Round4, verify_vss::{verify_vss_share_and_proofs, VssVerifyContext}},
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

use k256::Secp256k1;
use log::{debug, error, info};
use num_bigint_dig::BigInt;
use num_traits::One;
use std::sync::{mpsc::Sender, Arc, Mutex};

#[derive(Debug)]
pub struct Round3 {
    base: BaseRound,
    params: Arc<Parameters>,
    save: Arc<Mutex<LocalPartySaveData>>,
    temp: Arc<Mutex<LocalTempData>>,
    out_ch: Sender<Box<dyn TssMessage + Send>>,
    end_ch: Sender<LocalPartySaveData>,
}

impl Round3 {
    pub fn new(
        params: Arc<Parameters>,
        save: Arc<Mutex<LocalPartySaveData>>,
        temp: Arc<Mutex<LocalTempData>>,
        out_ch: Sender<Box<dyn TssMessage + Send>>,
        end_ch: Sender<LocalPartySaveData>,
    ) -> Self {
        let base = BaseRound::new(3, params.party_count());
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

impl Round for Round3 {
    fn params(&self) -> &Parameters {
        &self.params
    }

    fn round_number(&self) -> i32 {
        self.base.round_number()
    }

    fn start(&self) -> Result<(), RoundError> {
        if self.base.started() {
            return Err(self.wrap_error(terr!("round 3 already started"), vec![]));
        }
        self.base.set_started();
        self.base.reset_ok();

        let current_party_id = self.params.party_id();
        let i_usize = current_party_id.index as usize;
        let ec_order = self.params.ec().order();

        info!(target: "tss-lib", party_id = ?current_party_id, "keygen round 3 starting: verifying VSS shares and proofs");

        // Sum received shares (plus our own) into our final secret share xi.
        let xi = {
            let temp_data_lock = self.temp.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![current_party_id.as_ref().clone()]))?;
            let own_share = temp_data_lock
                .shares
                .as_ref()
                .ok_or_else(|| self.wrap_error(terr!("missing own VSS shares"), vec![current_party_id.as_ref().clone()]))?
                .get_share(i_usize)
                .clone();

            let mut xi_acc = own_share;
            for (j, p2p_msg_arc) in &temp_data_lock.message_store.kg_round2_message1s {
                let j_usize = *j as usize;
                if j_usize == i_usize {
                    continue;
                }
                let r2msg1: KGRound2Message1 = decode_content(p2p_msg_arc.as_ref())
                    .map_err(|e| self.wrap_error(e, vec![p2p_msg_arc.from().clone()]))?;
                xi_acc = (&xi_acc + &r2msg1.share) % &ec_order;
            }
            xi_acc
        };

        {
            let mut save_data_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock save data: {}", e), vec![current_party_id.as_ref().clone()]))?;
            save_data_lock.xi = Some(xi);
        }

        // Build one verification context per peer, decommitting their VSS
        // verification vector and combining them into the aggregate vector.
        let mut combined_vss_commitments: Vec<K256Point> = Vec::new();
        let mut vss_contexts: Vec<VssVerifyContext> = Vec::with_capacity(self.params.party_count());

        {
            let temp_data_lock = self.temp.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![current_party_id.as_ref().clone()]))?;
            let save_data_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock save data: {}", e), vec![current_party_id.as_ref().clone()]))?;

            for j in 0..self.params.party_count() {
                let party_j = self.params.parties().party_ids()[j].clone();
                let context_j = self.get_context_bytes(j as i32)?;

                let r2msg1_arc = temp_data_lock.message_store.kg_round2_message1s.get(&(j as i32))
                    .ok_or_else(|| self.wrap_error(terr!("missing round 2 message 1 for party {}", j), vec![party_j.clone()]))?;
                let r2msg2_arc = temp_data_lock.message_store.kg_round2_message2s.get(&(j as i32))
                    .ok_or_else(|| self.wrap_error(terr!("missing round 2 message 2 for party {}", j), vec![party_j.clone()]))?;

                let r2msg1: KGRound2Message1 = decode_content(r2msg1_arc.as_ref())
                    .map_err(|e| self.wrap_error(e, vec![party_j.clone()]))?;
                let r2msg2: KGRound2Message2 = decode_content(r2msg2_arc.as_ref())
                    .map_err(|e| self.wrap_error(e, vec![party_j.clone()]))?;

                let commitment_c_j = temp_data_lock.kgcs[j].clone()
                    .ok_or_else(|| self.wrap_error(terr!("missing commitment C_{}", j), vec![party_j.clone()]))?;
                let paillier_pk_j = save_data_lock.paillier_pks[j].clone()
                    .ok_or_else(|| self.wrap_error(terr!("missing Paillier PK for party {}", j), vec![party_j.clone()]))?;
                let n_tilde_j = save_data_lock.ntilde_j[j].clone()
                    .ok_or_else(|| self.wrap_error(terr!("missing Ntilde for party {}", j), vec![party_j.clone()]))?;
                let h1_j = save_data_lock.h1j[j].clone()
                    .ok_or_else(|| self.wrap_error(terr!("missing H1 for party {}", j), vec![party_j.clone()]))?;
                let h2_j = save_data_lock.h2j[j].clone()
                    .ok_or_else(|| self.wrap_error(terr!("missing H2 for party {}", j), vec![party_j.clone()]))?;

                let received_vss_share_ij = VssShare {
                    threshold: self.params.threshold(),
                    id: current_party_id.key.clone(),
                    share: r2msg1.share.clone(),
                };

                vss_contexts.push(VssVerifyContext {
                    party_index: j,
                    commitment_c_j,
                    decommitment_d_j: r2msg2.de_commitment.clone(),
                    mod_proof: r2msg2.mod_proof.clone(),
                    fac_proof: r2msg1.fac_proof.clone(),
                    received_vss_share_ij,
                    paillier_pk_j,
                    n_tilde_j,
                    h1_j,
                    h2_j,
                    context_j,
                    no_proof_mod: self.params.no_proof_mod(),
                    no_proof_fac: self.params.no_proof_fac(),
                });
            }
        }

        debug!(target: "tss-lib", party_id = ?current_party_id, concurrency = self.params.concurrency(), "verifying VSS shares and proofs");
        let verification_results = verify_vss_share_and_proofs(
            vss_contexts,
            ec_order.clone(),
            self.params.threshold(),
            current_party_id.as_ref().clone(),
            self.params.concurrency(),
        )
        .map_err(|e| self.wrap_error(e, vec![]))?;

        let mut culprits = Vec::new();
        let mut points_by_party: Vec<Option<Vec<K256Point>>> = vec![None; self.params.party_count()];
        for result in verification_results {
            if !result.is_valid() {
                error!(target: "tss-lib", party_id = ?current_party_id, failed_party_idx = result.party_index, reason = ?result.error_reason, "VSS/proof verification failed");
                culprits.push(self.params.parties().party_ids()[result.party_index].clone());
            } else {
                points_by_party[result.party_index] = result.vss_points;
            }
        }
        if !culprits.is_empty() {
            return Err(self.wrap_error(terr!("VSS share or proof verification failed"), culprits));
        }
        info!(target: "tss-lib", party_id = ?current_party_id, "VSS shares and proofs verified successfully");

        for points in points_by_party.into_iter().flatten() {
            if combined_vss_commitments.is_empty() {
                combined_vss_commitments = points;
            } else {
                if combined_vss_commitments.len() != points.len() {
                    return Err(self.wrap_error(terr!("VSS commitment length mismatch"), vec![]));
                }
                for c in 0..combined_vss_commitments.len() {
                    combined_vss_commitments[c] = combined_vss_commitments[c]
                        .add(&points[c])
                        .map_err(|e| self.wrap_error(e, vec![]))?;
                }
            }
        }

        // X_j = V_0 + sum_{c=1..t} V_c * k_j^c, for each party j.
        let big_x_j = {
            let mut xs: Vec<Option<K256Point>> = vec![None; self.params.party_count()];
            for j in 0..self.params.party_count() {
                let party_j_key = &self.params.parties().party_ids()[j].key;
                let mut x_j = combined_vss_commitments[0].clone();
                let mut k_pow_c = BigInt::one();

                for c in 1..=self.params.threshold() {
                    k_pow_c = (&k_pow_c * party_j_key) % &ec_order;
                    let v_cj = &combined_vss_commitments[c];
                    let v_cj_pow_k = v_cj.scalar_mul(&k_pow_c);
                    x_j = x_j.add(&v_cj_pow_k).map_err(|e| self.wrap_error(e, vec![]))?;
                }
                xs[j] = Some(x_j);
            }
            xs
        };

        let pk_point = combined_vss_commitments[0].clone();
        info!(target: "tss-lib", party_id = ?current_party_id, "ECDSA public key computed");

        {
            let mut save_data_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock save data: {}", e), vec![current_party_id.as_ref().clone()]))?;
            save_data_lock.big_xj = big_x_j;
            save_data_lock.ecdsa_pub = Some(pk_point);
        }

        // BROADCAST: a Paillier correctness proof over the aggregate public key.
        let (paillier_sk, ecdsa_pub_key) = {
            let save_data_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock save data: {}", e), vec![current_party_id.as_ref().clone()]))?;
            (
                save_data_lock.paillier_sk.clone().ok_or_else(|| self.wrap_error(terr!("missing Paillier SK"), vec![current_party_id.as_ref().clone()]))?,
                save_data_lock.ecdsa_pub.clone().ok_or_else(|| self.wrap_error(terr!("missing ECDSA public key"), vec![current_party_id.as_ref().clone()]))?,
            )
        };

        let paillier_proof = paillier_sk
            .proof::<Secp256k1, _>(&mut rand::thread_rng(), &current_party_id.key, &ecdsa_pub_key)
            .map_err(|e| self.wrap_error(e, vec![current_party_id.as_ref().clone()]))?;

        let r3msg = KGRound3Message::new(paillier_proof);
        let routing = MessageRoutingInfo::broadcast(current_party_id.as_ref().clone());
        let tss_msg = ParsedMessageImpl::from_content(routing, &r3msg).map_err(|e| self.wrap_error(e, vec![]))?;

        {
            let mut temp_data_lock = self.temp.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![current_party_id.as_ref().clone()]))?;
            temp_data_lock.message_store.kg_round3_messages.insert(i_usize as i32, Arc::new(tss_msg.clone()));
        }

        debug!(target: "tss-lib", party_id = ?current_party_id, "broadcasting Paillier proof");
        self.out_ch.send(Box::new(tss_msg)).map_err(|e| self.wrap_error(terr!("failed to send round 3 message: {}", e), vec![]))?;

        info!(target: "tss-lib", party_id = ?current_party_id, "keygen round 3 finished successfully");
        Ok(())
    }

    fn can_accept(&self, msg: &dyn ParsedMessage) -> bool {
        msg.is_broadcast() && msg.type_tag() == KGRound3Message::TYPE_URL
    }

    fn update(&self) -> Result<bool, RoundError> {
        let mut all_ok = true;
        let required_count = self.params().party_count();

        let temp_data = self.temp.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;

        for j in 0..required_count {
            if self.base.is_ok(j) {
                continue;
            }
            if temp_data.message_store.kg_round3_messages.contains_key(&(j as i32)) {
                self.base.set_ok(j);
            } else {
                all_ok = false;
            }
        }
        debug!(target: "tss-lib", party_id = ?self.params.party_id(), ok_parties = ?self.base.get_ok_vec(), "round 3 update check");
        Ok(all_ok)
    }

    fn can_proceed(&self) -> bool {
        self.base.get_ok_vec().iter().all(|&ok| ok)
    }

    fn next_round(&self) -> Option<Arc<dyn Round>> {
        self.base.set_started_unwrapped();
        Some(Arc::new(Round4::new(
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
