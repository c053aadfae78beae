// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Translation of tss-lib-go/ecdsa/signing/round_7.go

use crate::{
    crypto::{
        commitments::HashCommitDecommit,
        ecpoint::{flatten_ec_points, un_flatten_ec_points, ECPoint},
    },
    protocols::ecdsa::{
        keygen::{rounds::BaseRound, types::LocalPartySaveData},
        signing::{
            messages::{SignRound5Message, SignRound6Message, SignRound7Message},
            rounds::round_8::Round8,
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
use rand::thread_rng;
use std::sync::{mpsc::Sender, Arc, Mutex};

#[derive(Debug)]
pub struct Round7 {
    base: BaseRound,
    params: Arc<Parameters>,
    keys: Arc<LocalPartySaveData>,
    m: BigInt,
    save: Arc<Mutex<LocalTempData>>,
    out_ch: Sender<Box<dyn TssMessage + Send>>,
    end_ch: Sender<crate::protocols::ecdsa::signing::types::SignatureData>,
}

impl Round7 {
    pub fn new(
        params: Arc<Parameters>,
        keys: Arc<LocalPartySaveData>,
        m: BigInt,
        save: Arc<Mutex<LocalTempData>>,
        out_ch: Sender<Box<dyn TssMessage + Send>>,
        end_ch: Sender<crate::protocols::ecdsa::signing::types::SignatureData>,
    ) -> Self {
        let base = BaseRound::new(7, params.party_count());
        Self { base, params, keys, m, save, out_ch, end_ch }
    }
}

impl Round for Round7 {
    fn params(&self) -> &Parameters {
        &self.params
    }

    fn round_number(&self) -> i32 {
        self.base.round_number()
    }

    fn start(&self) -> Result<(), RoundError> {
        if self.base.started() {
            return Err(self.wrap_error(terr!("round 7 already started"), vec![]));
        }
        self.base.set_started();
        self.base.reset_ok();

        let current_party_id = self.params.party_id();
        let i = current_party_id.index as usize;
        let q = self.params.ec().order();

        info!(target: "tss-lib", party_id = ?current_party_id, "signing round 7 starting: aggregating R_j/V_j, committing to (U_i, T_i)");

        let (r_point, session) = {
            let save_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            (
                save_lock.r_point.clone().ok_or_else(|| self.wrap_error(terr!("missing R"), vec![]))?,
                save_lock.ssid.clone().ok_or_else(|| self.wrap_error(terr!("SSID not set"), vec![]))?,
            )
        };

        let (round5_messages, round6_messages) = {
            let save_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            (save_lock.message_store.sign_round5_messages.clone(), save_lock.message_store.sign_round6_messages.clone())
        };

        let mut big_a = ECPoint::<Secp256k1>::identity();
        let mut big_v = ECPoint::<Secp256k1>::identity();
        for (j, party_j) in self.params.parties().party_ids().iter().enumerate() {
            let r5msg_arc = round5_messages
                .get(&(j as i32))
                .ok_or_else(|| self.wrap_error(terr!("missing round 5 message from party {}", j), vec![party_j.clone()]))?;
            let r5msg: SignRound5Message = decode_content(r5msg_arc.as_ref()).map_err(|e| self.wrap_error(e, vec![party_j.clone()]))?;

            let r6msg_arc = round6_messages
                .get(&(j as i32))
                .ok_or_else(|| self.wrap_error(terr!("missing round 6 message from party {}", j), vec![party_j.clone()]))?;
            let r6msg: SignRound6Message = decode_content(r6msg_arc.as_ref()).map_err(|e| self.wrap_error(e, vec![party_j.clone()]))?;

            let commit_decommit = HashCommitDecommit { c: r5msg.commitment, d: r6msg.de_commitment.clone() };
            let (ok, flat_coords) = commit_decommit.decommit();
            if !ok {
                return Err(self.wrap_error(terr!("R_i decommitment failed for party {}", j), vec![party_j.clone()]));
            }
            let points = un_flatten_ec_points::<Secp256k1>(&flat_coords)
                .map_err(|e| self.wrap_error(terr!("failed to un-flatten R_i: {}", e), vec![party_j.clone()]))?;
            let big_r_j = points
                .into_iter()
                .next()
                .ok_or_else(|| self.wrap_error(terr!("R_i decommitment had no point"), vec![party_j.clone()]))?;

            if !r6msg.zkv_proof.verify(&session, &q, &r6msg.v_i, &r_point) {
                return Err(self.wrap_error(terr!("ZkvProof verification of V_i failed for party {}", j), vec![party_j.clone()]));
            }

            big_a = big_a.add(&big_r_j).map_err(|e| self.wrap_error(terr!("point addition failed: {}", e), vec![party_j.clone()]))?;
            big_v = big_v.add(&r6msg.v_i).map_err(|e| self.wrap_error(terr!("point addition failed: {}", e), vec![party_j.clone()]))?;
        }

        let mut rng = thread_rng();
        let rho_i = crate::common::random::get_random_positive_int(&mut rng, &q)
            .ok_or_else(|| self.wrap_error(terr!("failed to generate rho_i"), vec![current_party_id.as_ref().clone()]))?;
        let big_u_i = big_v.scalar_mul(&rho_i);
        let big_t_i = big_a.scalar_mul(&rho_i);

        let flattened = flatten_ec_points(&[big_u_i.clone(), big_t_i.clone()])
            .map_err(|e| self.wrap_error(terr!("failed to flatten (U_i, T_i): {}", e), vec![current_party_id.as_ref().clone()]))?;
        let point_refs: Vec<&BigInt> = flattened.iter().collect();
        let commit_decommit = HashCommitDecommit::new(&mut rng, &point_refs);

        {
            let mut save_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            save_lock.big_a = Some(big_a);
            save_lock.big_v = Some(big_v);
            save_lock.rho_i = Some(rho_i);
            save_lock.big_u_i = Some(big_u_i);
            save_lock.big_t_i = Some(big_t_i);
            save_lock.de_commit_u_t_i = Some(commit_decommit.d.clone());
        }

        let r7msg = SignRound7Message::new(commit_decommit.c);
        let routing = MessageRoutingInfo::broadcast(current_party_id.as_ref().clone());
        let tss_msg = ParsedMessageImpl::from_content(routing, &r7msg).map_err(|e| self.wrap_error(e, vec![]))?;
        {
            let mut save_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            save_lock.message_store.sign_round7_messages.insert(i as i32, Arc::new(tss_msg.clone()));
        }
        debug!(target: "tss-lib", party_id = ?current_party_id, "broadcasting commitment to (U_i, T_i)");
        self.out_ch.send(Box::new(tss_msg)).map_err(|e| self.wrap_error(terr!("failed to send round 7 message: {}", e), vec![]))?;

        info!(target: "tss-lib", party_id = ?current_party_id, "signing round 7 finished successfully");
        Ok(())
    }

    fn can_accept(&self, msg: &dyn ParsedMessage) -> bool {
        match msg.type_tag() {
            t if t == SignRound7Message::TYPE_URL => msg.is_broadcast(),
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
            if save.message_store.sign_round7_messages.contains_key(&(j as i32)) {
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
        Some(Arc::new(Round8::new(
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
