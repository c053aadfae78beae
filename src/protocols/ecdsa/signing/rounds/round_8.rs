// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Translation of tss-lib-go/ecdsa/signing/round_8.go

use crate::{
    crypto::schnorr::EcddhProof,
    protocols::ecdsa::{
        keygen::{rounds::BaseRound, types::LocalPartySaveData},
        signing::{
            messages::SignRound8Message,
            rounds::round_9::Round9,
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
pub struct Round8 {
    base: BaseRound,
    params: Arc<Parameters>,
    keys: Arc<LocalPartySaveData>,
    m: BigInt,
    save: Arc<Mutex<LocalTempData>>,
    out_ch: Sender<Box<dyn TssMessage + Send>>,
    end_ch: Sender<crate::protocols::ecdsa::signing::types::SignatureData>,
}

impl Round8 {
    pub fn new(
        params: Arc<Parameters>,
        keys: Arc<LocalPartySaveData>,
        m: BigInt,
        save: Arc<Mutex<LocalTempData>>,
        out_ch: Sender<Box<dyn TssMessage + Send>>,
        end_ch: Sender<crate::protocols::ecdsa::signing::types::SignatureData>,
    ) -> Self {
        let base = BaseRound::new(8, params.party_count());
        Self { base, params, keys, m, save, out_ch, end_ch }
    }
}

impl Round for Round8 {
    fn params(&self) -> &Parameters {
        &self.params
    }

    fn round_number(&self) -> i32 {
        self.base.round_number()
    }

    fn start(&self) -> Result<(), RoundError> {
        if self.base.started() {
            return Err(self.wrap_error(terr!("round 8 already started"), vec![]));
        }
        self.base.set_started();
        self.base.reset_ok();

        let current_party_id = self.params.party_id();
        let i = current_party_id.index as usize;
        let q = self.params.ec().order();

        info!(target: "tss-lib", party_id = ?current_party_id, "signing round 8 starting: decommitting (U_i, T_i) with EcddhProof");

        let (rho_i, big_v, big_a, big_u_i, big_t_i, de_commit_u_t_i, session) = {
            let save_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            (
                save_lock.rho_i.clone().ok_or_else(|| self.wrap_error(terr!("missing rho_i"), vec![]))?,
                save_lock.big_v.clone().ok_or_else(|| self.wrap_error(terr!("missing V"), vec![]))?,
                save_lock.big_a.clone().ok_or_else(|| self.wrap_error(terr!("missing A"), vec![]))?,
                save_lock.big_u_i.clone().ok_or_else(|| self.wrap_error(terr!("missing U_i"), vec![]))?,
                save_lock.big_t_i.clone().ok_or_else(|| self.wrap_error(terr!("missing T_i"), vec![]))?,
                save_lock.de_commit_u_t_i.clone().ok_or_else(|| self.wrap_error(terr!("missing (U_i, T_i) decommitment"), vec![]))?,
                save_lock.ssid.clone().ok_or_else(|| self.wrap_error(terr!("SSID not set"), vec![]))?,
            )
        };

        let mut rng = thread_rng();
        let ecddh_proof = EcddhProof::<Secp256k1>::new(&session, &q, &rho_i, &big_v, &big_a, &big_u_i, &big_t_i, &mut rng)
            .map_err(|e| self.wrap_error(e, vec![current_party_id.as_ref().clone()]))?;

        let r8msg = SignRound8Message::new(de_commit_u_t_i, ecddh_proof);
        let routing = MessageRoutingInfo::broadcast(current_party_id.as_ref().clone());
        let tss_msg = ParsedMessageImpl::from_content(routing, &r8msg).map_err(|e| self.wrap_error(e, vec![]))?;
        {
            let mut save_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            save_lock.message_store.sign_round8_messages.insert(i as i32, Arc::new(tss_msg.clone()));
        }
        debug!(target: "tss-lib", party_id = ?current_party_id, "broadcasting (U_i, T_i) decommitment and EcddhProof");
        self.out_ch.send(Box::new(tss_msg)).map_err(|e| self.wrap_error(terr!("failed to send round 8 message: {}", e), vec![]))?;

        info!(target: "tss-lib", party_id = ?current_party_id, "signing round 8 finished successfully");
        Ok(())
    }

    fn can_accept(&self, msg: &dyn ParsedMessage) -> bool {
        match msg.type_tag() {
            t if t == SignRound8Message::TYPE_URL => msg.is_broadcast(),
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
            if save.message_store.sign_round8_messages.contains_key(&(j as i32)) {
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
        Some(Arc::new(Round9::new(
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
