// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Translation of tss-lib-go/ecdsa/signing/round_5.go

use crate::{
    crypto::{
        commitments::HashCommitDecommit,
        ecpoint::{un_flatten_ec_points, ECPoint},
    },
    protocols::ecdsa::{
        keygen::{rounds::BaseRound, types::LocalPartySaveData},
        signing::{
            messages::{SignRound1Message1, SignRound4Message, SignRound5Message},
            rounds::round_6::Round6,
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
pub struct Round5 {
    base: BaseRound,
    params: Arc<Parameters>,
    keys: Arc<LocalPartySaveData>,
    m: BigInt,
    save: Arc<Mutex<LocalTempData>>,
    out_ch: Sender<Box<dyn TssMessage + Send>>,
    end_ch: Sender<crate::protocols::ecdsa::signing::types::SignatureData>,
}

impl Round5 {
    pub fn new(
        params: Arc<Parameters>,
        keys: Arc<LocalPartySaveData>,
        m: BigInt,
        save: Arc<Mutex<LocalTempData>>,
        out_ch: Sender<Box<dyn TssMessage + Send>>,
        end_ch: Sender<crate::protocols::ecdsa::signing::types::SignatureData>,
    ) -> Self {
        let base = BaseRound::new(5, params.party_count());
        Self { base, params, keys, m, save, out_ch, end_ch }
    }

    /// Decommits and aggregates every party's `Gamma_i`, verifying each
    /// `ZkProof` along the way. This is the consumer side of round 4's
    /// broadcast.
    fn aggregate_big_gamma(&self) -> Result<ECPoint<Secp256k1>, RoundError> {
        let session = {
            let save_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            save_lock.ssid.clone().ok_or_else(|| self.wrap_error(terr!("SSID not set"), vec![]))?
        };
        let q = self.params.ec().order();

        let (round1_message1s, round4_messages) = {
            let save_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            (save_lock.message_store.sign_round1_message1s.clone(), save_lock.message_store.sign_round4_messages.clone())
        };

        let mut big_gamma = ECPoint::<Secp256k1>::identity();
        for (j, party_j) in self.params.parties().party_ids().iter().enumerate() {
            let r1msg1_arc = round1_message1s
                .get(&(j as i32))
                .ok_or_else(|| self.wrap_error(terr!("missing round 1 message 1 from party {}", j), vec![party_j.clone()]))?;
            let r1msg1: SignRound1Message1 = decode_content(r1msg1_arc.as_ref()).map_err(|e| self.wrap_error(e, vec![party_j.clone()]))?;

            let r4msg_arc = round4_messages
                .get(&(j as i32))
                .ok_or_else(|| self.wrap_error(terr!("missing round 4 message from party {}", j), vec![party_j.clone()]))?;
            let r4msg: SignRound4Message = decode_content(r4msg_arc.as_ref()).map_err(|e| self.wrap_error(e, vec![party_j.clone()]))?;

            let commit_decommit = HashCommitDecommit { c: r1msg1.commitment, d: r4msg.de_commitment.clone() };
            let (ok, flat_coords) = commit_decommit.decommit();
            if !ok {
                return Err(self.wrap_error(terr!("Gamma_i decommitment failed for party {}", j), vec![party_j.clone()]));
            }
            let points = un_flatten_ec_points::<Secp256k1>(&flat_coords)
                .map_err(|e| self.wrap_error(terr!("failed to un-flatten Gamma_i: {}", e), vec![party_j.clone()]))?;
            let big_gamma_j = points
                .into_iter()
                .next()
                .ok_or_else(|| self.wrap_error(terr!("Gamma_i decommitment had no point"), vec![party_j.clone()]))?;

            if !r4msg.gamma_proof.verify(&session, &q, &big_gamma_j) {
                return Err(self.wrap_error(terr!("ZkProof verification of Gamma_i failed for party {}", j), vec![party_j.clone()]));
            }

            big_gamma = big_gamma.add(&big_gamma_j).map_err(|e| self.wrap_error(terr!("point addition failed: {}", e), vec![party_j.clone()]))?;
        }
        Ok(big_gamma)
    }
}

impl Round for Round5 {
    fn params(&self) -> &Parameters {
        &self.params
    }

    fn round_number(&self) -> i32 {
        self.base.round_number()
    }

    fn start(&self) -> Result<(), RoundError> {
        if self.base.started() {
            return Err(self.wrap_error(terr!("round 5 already started"), vec![]));
        }
        self.base.set_started();
        self.base.reset_ok();

        let current_party_id = self.params.party_id();
        let i = current_party_id.index as usize;
        let q = self.params.ec().order();
        let mod_q = crate::common::int::ModInt::new(q.clone());

        info!(target: "tss-lib", party_id = ?current_party_id, "signing round 5 starting: aggregating Gamma, deriving R, committing to R_i");

        let big_gamma = self.aggregate_big_gamma()?;

        let delta = {
            let save_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            save_lock.delta.clone().ok_or_else(|| self.wrap_error(terr!("missing delta"), vec![]))?
        };
        let delta_inv = mod_q
            .mod_inverse(&delta)
            .ok_or_else(|| self.wrap_error(terr!("delta has no inverse mod q"), vec![current_party_id.as_ref().clone()]))?;
        let r_point = big_gamma.scalar_mul(&delta_inv);

        let k_i = {
            let save_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            save_lock.k_i.clone().ok_or_else(|| self.wrap_error(terr!("missing k_i"), vec![]))?
        };
        let big_r_i = r_point.scalar_mul(&k_i);

        let mut rng = thread_rng();
        let (r_i_x, r_i_y) = big_r_i.coords();
        let commit_decommit = HashCommitDecommit::new(&mut rng, &[&r_i_x, &r_i_y]);

        {
            let mut save_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            save_lock.big_gamma = Some(big_gamma);
            save_lock.r_point = Some(r_point);
            save_lock.big_r_i = Some(big_r_i);
            save_lock.de_commit_big_r_i = Some(commit_decommit.d.clone());
        }

        let r5msg = SignRound5Message::new(commit_decommit.c);
        let routing = MessageRoutingInfo::broadcast(current_party_id.as_ref().clone());
        let tss_msg = ParsedMessageImpl::from_content(routing, &r5msg).map_err(|e| self.wrap_error(e, vec![]))?;
        {
            let mut save_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            save_lock.message_store.sign_round5_messages.insert(i as i32, Arc::new(tss_msg.clone()));
        }
        debug!(target: "tss-lib", party_id = ?current_party_id, "broadcasting commitment to R_i");
        self.out_ch.send(Box::new(tss_msg)).map_err(|e| self.wrap_error(terr!("failed to send round 5 message: {}", e), vec![]))?;

        info!(target: "tss-lib", party_id = ?current_party_id, "signing round 5 finished successfully");
        Ok(())
    }

    fn can_accept(&self, msg: &dyn ParsedMessage) -> bool {
        match msg.type_tag() {
            t if t == SignRound5Message::TYPE_URL => msg.is_broadcast(),
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
            if save.message_store.sign_round5_messages.contains_key(&(j as i32)) {
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
        Some(Arc::new(Round6::new(
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
