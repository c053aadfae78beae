// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Translation of tss-lib-go/ecdsa/signing/round_6.go

use crate::{
    crypto::schnorr::ZkvProof,
    protocols::ecdsa::{
        keygen::{rounds::BaseRound, types::LocalPartySaveData},
        signing::{
            messages::SignRound6Message,
            rounds::round_7::Round7,
            types::LocalTempData,
        },
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
use rand::thread_rng;
use std::sync::{mpsc::Sender, Arc, Mutex};

#[derive(Debug)]
pub struct Round6 {
    base: BaseRound,
    params: Arc<Parameters>,
    keys: Arc<LocalPartySaveData>,
    m: BigInt,
    save: Arc<Mutex<LocalTempData>>,
    out_ch: Sender<Box<dyn TssMessage + Send>>,
    end_ch: Sender<crate::protocols::ecdsa::signing::types::SignatureData>,
}

impl Round6 {
    pub fn new(
        params: Arc<Parameters>,
        keys: Arc<LocalPartySaveData>,
        m: BigInt,
        save: Arc<Mutex<LocalTempData>>,
        out_ch: Sender<Box<dyn TssMessage + Send>>,
        end_ch: Sender<crate::protocols::ecdsa::signing::types::SignatureData>,
    ) -> Self {
        let base = BaseRound::new(6, params.party_count());
        Self { base, params, keys, m, save, out_ch, end_ch }
    }
}

impl Round for Round6 {
    fn params(&self) -> &Parameters {
        &self.params
    }

    fn round_number(&self) -> i32 {
        self.base.round_number()
    }

    fn start(&self) -> Result<(), RoundError> {
        if self.base.started() {
            return Err(self.wrap_error(terr!("round 6 already started"), vec![]));
        }
        self.base.set_started();
        self.base.reset_ok();

        let current_party_id = self.params.party_id();
        let i = current_party_id.index as usize;
        let q = self.params.ec().order();

        info!(target: "tss-lib", party_id = ?current_party_id, "signing round 6 starting: committing to V_i = R*sigma_i + l_i*G");

        let (r_point, sigma_i, de_commit_big_r_i, session) = {
            let save_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            (
                save_lock.r_point.clone().ok_or_else(|| self.wrap_error(terr!("missing R"), vec![]))?,
                save_lock.sigma_i.clone().ok_or_else(|| self.wrap_error(terr!("missing sigma_i"), vec![]))?,
                save_lock.de_commit_big_r_i.clone().ok_or_else(|| self.wrap_error(terr!("missing R_i decommitment"), vec![]))?,
                save_lock.ssid.clone().ok_or_else(|| self.wrap_error(terr!("SSID not set"), vec![]))?,
            )
        };

        let mut rng = thread_rng();
        let l_i = crate::common::random::get_random_positive_int(&mut rng, &q)
            .ok_or_else(|| self.wrap_error(terr!("failed to generate l_i"), vec![current_party_id.as_ref().clone()]))?;

        let v_i = r_point
            .scalar_mul(&sigma_i)
            .add(&crate::crypto::ecpoint::ECPoint::<Secp256k1>::scalar_base_mult(&l_i))
            .map_err(|e| self.wrap_error(terr!("point addition failed: {}", e), vec![current_party_id.as_ref().clone()]))?;

        let zkv_proof = ZkvProof::<Secp256k1>::new(&session, &q, &sigma_i, &l_i, &v_i, &r_point, &mut rng)
            .map_err(|e| self.wrap_error(e, vec![current_party_id.as_ref().clone()]))?;

        {
            let mut save_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            save_lock.l_i = Some(l_i);
            save_lock.v_i = Some(v_i.clone());
        }

        let r6msg = SignRound6Message::new(de_commit_big_r_i, v_i, zkv_proof);
        let routing = MessageRoutingInfo::broadcast(current_party_id.as_ref().clone());
        let tss_msg = ParsedMessageImpl::from_content(routing, &r6msg).map_err(|e| self.wrap_error(e, vec![]))?;
        {
            let mut save_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            save_lock.message_store.sign_round6_messages.insert(i as i32, Arc::new(tss_msg.clone()));
        }
        debug!(target: "tss-lib", party_id = ?current_party_id, "broadcasting R_i decommitment and V_i");
        self.out_ch.send(Box::new(tss_msg)).map_err(|e| self.wrap_error(terr!("failed to send round 6 message: {}", e), vec![]))?;

        info!(target: "tss-lib", party_id = ?current_party_id, "signing round 6 finished successfully");
        Ok(())
    }

    fn can_accept(&self, msg: &dyn ParsedMessage) -> bool {
        match msg.type_tag() {
            t if t == SignRound6Message::TYPE_URL => msg.is_broadcast(),
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
            if save.message_store.sign_round6_messages.contains_key(&(j as i32)) {
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
        Some(Arc::new(Round7::new(
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
