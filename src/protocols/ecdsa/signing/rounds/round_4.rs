// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Translation of tss-lib-go/ecdsa/signing/round_4.go

use crate::{
    crypto::schnorr::ZkProof,
    protocols::ecdsa::{
        keygen::{rounds::BaseRound, types::LocalPartySaveData},
        signing::{
            messages::{SignRound3Message, SignRound4Message},
            rounds::round_5::Round5,
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
pub struct Round4 {
    base: BaseRound,
    params: Arc<Parameters>,
    keys: Arc<LocalPartySaveData>,
    m: BigInt,
    save: Arc<Mutex<LocalTempData>>,
    out_ch: Sender<Box<dyn TssMessage + Send>>,
    end_ch: Sender<crate::protocols::ecdsa::signing::types::SignatureData>,
}

impl Round4 {
    pub fn new(
        params: Arc<Parameters>,
        keys: Arc<LocalPartySaveData>,
        m: BigInt,
        save: Arc<Mutex<LocalTempData>>,
        out_ch: Sender<Box<dyn TssMessage + Send>>,
        end_ch: Sender<crate::protocols::ecdsa::signing::types::SignatureData>,
    ) -> Self {
        let base = BaseRound::new(4, params.party_count());
        Self { base, params, keys, m, save, out_ch, end_ch }
    }
}

impl Round for Round4 {
    fn params(&self) -> &Parameters {
        &self.params
    }

    fn round_number(&self) -> i32 {
        self.base.round_number()
    }

    fn start(&self) -> Result<(), RoundError> {
        if self.base.started() {
            return Err(self.wrap_error(terr!("round 4 already started"), vec![]));
        }
        self.base.set_started();
        self.base.reset_ok();

        let current_party_id = self.params.party_id();
        let i = current_party_id.index as usize;
        let q = self.params.ec().order();

        info!(target: "tss-lib", party_id = ?current_party_id, "signing round 4 starting: aggregating delta, broadcasting Gamma_i decommitment");

        let round3_messages = {
            let save_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            save_lock.message_store.sign_round3_messages.clone()
        };

        let mod_q = crate::common::int::ModInt::new(q.clone());
        let mut delta = BigInt::from(0);
        for (j, party_j) in self.params.parties().party_ids().iter().enumerate() {
            let parsed_msg = round3_messages
                .get(&(j as i32))
                .ok_or_else(|| self.wrap_error(terr!("missing round 3 message from party {}", j), vec![party_j.clone()]))?;
            let r3msg: SignRound3Message =
                decode_content(parsed_msg.as_ref()).map_err(|e| self.wrap_error(e, vec![party_j.clone()]))?;
            delta = mod_q.add(&delta, &r3msg.delta_i);
        }

        let (gamma_i, de_commit_big_gamma_i) = {
            let save_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            (
                save_lock.gamma_i.clone().ok_or_else(|| self.wrap_error(terr!("missing gamma_i"), vec![]))?,
                save_lock.de_commit_big_gamma_i.clone().ok_or_else(|| self.wrap_error(terr!("missing Gamma_i decommitment"), vec![]))?,
            )
        };

        let session = {
            let save_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            save_lock.ssid.clone().ok_or_else(|| self.wrap_error(terr!("SSID not set"), vec![]))?
        };
        let big_gamma_i = crate::crypto::ecpoint::ECPoint::<Secp256k1>::scalar_base_mult(&gamma_i);
        let gamma_proof = ZkProof::<Secp256k1>::new(&session, &q, &gamma_i, &big_gamma_i, &mut thread_rng())
            .map_err(|e| self.wrap_error(e, vec![current_party_id.as_ref().clone()]))?;

        {
            let mut save_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            save_lock.delta = Some(delta);
        }

        let r4msg = SignRound4Message::new(de_commit_big_gamma_i, gamma_proof);
        let routing = MessageRoutingInfo::broadcast(current_party_id.as_ref().clone());
        let tss_msg = ParsedMessageImpl::from_content(routing, &r4msg).map_err(|e| self.wrap_error(e, vec![]))?;
        {
            let mut save_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            save_lock.message_store.sign_round4_messages.insert(i as i32, Arc::new(tss_msg.clone()));
        }
        debug!(target: "tss-lib", party_id = ?current_party_id, "broadcasting Gamma_i decommitment and ZkProof");
        self.out_ch.send(Box::new(tss_msg)).map_err(|e| self.wrap_error(terr!("failed to send round 4 message: {}", e), vec![]))?;

        info!(target: "tss-lib", party_id = ?current_party_id, "signing round 4 finished successfully");
        Ok(())
    }

    fn can_accept(&self, msg: &dyn ParsedMessage) -> bool {
        match msg.type_tag() {
            t if t == SignRound4Message::TYPE_URL => msg.is_broadcast(),
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
            if save.message_store.sign_round4_messages.contains_key(&(j as i32)) {
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
        Some(Arc::new(Round5::new(
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
