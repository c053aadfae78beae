// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Translation of tss-lib-go/ecdsa/signing/round_9.go

use crate::{
    protocols::ecdsa::{
        keygen::{rounds::BaseRound, types::LocalPartySaveData},
        signing::{
            messages::{SignRound7Message, SignRound8Message, SignRound9Message},
            rounds::round_10::Round10,
            types::LocalTempData,
        },
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
use log::{debug, info};
use num_bigint_dig::BigInt;
use std::sync::{mpsc::Sender, Arc, Mutex};

#[derive(Debug)]
pub struct Round9 {
    base: BaseRound,
    params: Arc<Parameters>,
    keys: Arc<LocalPartySaveData>,
    m: BigInt,
    save: Arc<Mutex<LocalTempData>>,
    out_ch: Sender<Box<dyn TssMessage + Send>>,
    end_ch: Sender<crate::protocols::ecdsa::signing::types::SignatureData>,
}

impl Round9 {
    pub fn new(
        params: Arc<Parameters>,
        keys: Arc<LocalPartySaveData>,
        m: BigInt,
        save: Arc<Mutex<LocalTempData>>,
        out_ch: Sender<Box<dyn TssMessage + Send>>,
        end_ch: Sender<crate::protocols::ecdsa::signing::types::SignatureData>,
    ) -> Self {
        let base = BaseRound::new(9, params.party_count());
        Self { base, params, keys, m, save, out_ch, end_ch }
    }
}

impl Round for Round9 {
    fn params(&self) -> &Parameters {
        &self.params
    }

    fn round_number(&self) -> i32 {
        self.base.round_number()
    }

    fn start(&self) -> Result<(), RoundError> {
        if self.base.started() {
            return Err(self.wrap_error(terr!("round 9 already started"), vec![]));
        }
        self.base.set_started();
        self.base.reset_ok();

        let current_party_id = self.params.party_id();
        let i = current_party_id.index as usize;
        let q = self.params.ec().order();
        let mod_q = crate::common::int::ModInt::new(q.clone());

        info!(target: "tss-lib", party_id = ?current_party_id, "signing round 9 starting: verifying (U_j, T_j), broadcasting s_i");

        let (round7_messages, round8_messages) = {
            let save_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            (save_lock.message_store.sign_round7_messages.clone(), save_lock.message_store.sign_round8_messages.clone())
        };

        let (big_v, big_a, session) = {
            let save_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            (
                save_lock.big_v.clone().ok_or_else(|| self.wrap_error(terr!("missing V"), vec![]))?,
                save_lock.big_a.clone().ok_or_else(|| self.wrap_error(terr!("missing A"), vec![]))?,
                save_lock.ssid.clone().ok_or_else(|| self.wrap_error(terr!("SSID not set"), vec![]))?,
            )
        };

        for (j, party_j) in self.params.parties().party_ids().iter().enumerate() {
            let r7msg_arc = round7_messages
                .get(&(j as i32))
                .ok_or_else(|| self.wrap_error(terr!("missing round 7 message from party {}", j), vec![party_j.clone()]))?;
            let r7msg: SignRound7Message = decode_content(r7msg_arc.as_ref()).map_err(|e| self.wrap_error(e, vec![party_j.clone()]))?;

            let r8msg_arc = round8_messages
                .get(&(j as i32))
                .ok_or_else(|| self.wrap_error(terr!("missing round 8 message from party {}", j), vec![party_j.clone()]))?;
            let r8msg: SignRound8Message = decode_content(r8msg_arc.as_ref()).map_err(|e| self.wrap_error(e, vec![party_j.clone()]))?;

            let commit_decommit = crate::crypto::commitments::HashCommitDecommit { c: r7msg.commitment, d: r8msg.de_commitment.clone() };
            let (ok, flat_coords) = commit_decommit.decommit();
            if !ok {
                return Err(self.wrap_error(terr!("(U_i, T_i) decommitment failed for party {}", j), vec![party_j.clone()]));
            }
            let points = crate::crypto::ecpoint::un_flatten_ec_points::<Secp256k1>(&flat_coords)
                .map_err(|e| self.wrap_error(terr!("failed to un-flatten (U_i, T_i): {}", e), vec![party_j.clone()]))?;
            if points.len() != 2 {
                return Err(self.wrap_error(terr!("expected 2 points in (U_i, T_i) decommitment for party {}", j), vec![party_j.clone()]));
            }
            let big_u_j = &points[0];
            let big_t_j = &points[1];

            if !r8msg.ecddh_proof.verify(&session, &q, &big_v, &big_a, big_u_j, big_t_j) {
                return Err(self.wrap_error(terr!("EcddhProof verification of (U_i, T_i) failed for party {}", j), vec![party_j.clone()]));
            }
        }

        let (k_i, sigma_i, r_point) = {
            let save_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            (
                save_lock.k_i.clone().ok_or_else(|| self.wrap_error(terr!("missing k_i"), vec![]))?,
                save_lock.sigma_i.clone().ok_or_else(|| self.wrap_error(terr!("missing sigma_i"), vec![]))?,
                save_lock.r_point.clone().ok_or_else(|| self.wrap_error(terr!("missing R"), vec![]))?,
            )
        };
        let (r_x, _) = r_point.coords();
        let r = r_x.modpow(&BigInt::from(1), &q);

        let m_k = mod_q.mul(&self.m, &k_i);
        let r_sigma = mod_q.mul(&r, &sigma_i);
        let s_i = mod_q.add(&m_k, &r_sigma);

        {
            let mut save_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            save_lock.s_i = Some(s_i.clone());
        }

        let r9msg = SignRound9Message::new(s_i);
        let routing = MessageRoutingInfo::broadcast(current_party_id.as_ref().clone());
        let tss_msg = ParsedMessageImpl::from_content(routing, &r9msg).map_err(|e| self.wrap_error(e, vec![]))?;
        {
            let mut save_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            save_lock.message_store.sign_round9_messages.insert(i as i32, Arc::new(tss_msg.clone()));
        }
        debug!(target: "tss-lib", party_id = ?current_party_id, "broadcasting s_i");
        self.out_ch.send(Box::new(tss_msg)).map_err(|e| self.wrap_error(terr!("failed to send round 9 message: {}", e), vec![]))?;

        info!(target: "tss-lib", party_id = ?current_party_id, "signing round 9 finished successfully");
        Ok(())
    }

    fn can_accept(&self, msg: &dyn ParsedMessage) -> bool {
        match msg.type_tag() {
            t if t == SignRound9Message::TYPE_URL => msg.is_broadcast(),
            _ => false,
        }
    }

    fn update(&self) -> Result<bool, RoundError> {
        let mut all_ok = true;
        let required_count = self.params().party_count();

        let save = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
        for j in 0..required_count {
            if self.base.is_ok(j) {
                continue;
            }
            if save.message_store.sign_round9_messages.contains_key(&(j as i32)) {
                self.base.set_ok(j);
            } else {
                all_ok = false;
            }
        }
        Ok(all_ok)
    }

    fn can_proceed(&self) -> bool {
        self.base.get_ok_vec().iter().all(|&ok| ok)
    }

    fn next_round(&self) -> Option<Arc<dyn Round>> {
        self.base.set_started_unwrapped();
        Some(Arc::new(Round10::new(
            self.params.clone(),
            self.keys.clone(),
            self.m.clone(),
            self.save.clone(),
            self.out_ch.clone(),
            self.end_ch.clone(),
        )))
    }

    fn waiting_for(&self) -> Vec<PartyID> {
        self.base.waiting_for(self.params.parties().party_ids())
    }
}
