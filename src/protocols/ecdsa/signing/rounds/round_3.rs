// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Translation of tss-lib-go/ecdsa/signing/round_3.go

use crate::{
    crypto::paillier::PrivateKey,
    protocols::ecdsa::{
        keygen::{rounds::BaseRound, types::LocalPartySaveData},
        signing::{
            messages::{SignRound2Message, SignRound3Message},
            rounds::round_4::Round4,
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

use log::{debug, error, info};
use num_bigint_dig::BigInt;
use std::sync::{mpsc::Sender, Arc, Mutex};

#[derive(Debug)]
pub struct Round3 {
    base: BaseRound,
    params: Arc<Parameters>,
    keys: Arc<LocalPartySaveData>,
    m: BigInt,
    save: Arc<Mutex<LocalTempData>>,
    out_ch: Sender<Box<dyn TssMessage + Send>>,
    end_ch: Sender<crate::protocols::ecdsa::signing::types::SignatureData>,
}

impl Round3 {
    pub fn new(
        params: Arc<Parameters>,
        keys: Arc<LocalPartySaveData>,
        m: BigInt,
        save: Arc<Mutex<LocalTempData>>,
        out_ch: Sender<Box<dyn TssMessage + Send>>,
        end_ch: Sender<crate::protocols::ecdsa::signing::types::SignatureData>,
    ) -> Self {
        let base = BaseRound::new(3, params.party_count());
        Self { base, params, keys, m, save, out_ch, end_ch }
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
        let i = current_party_id.index as usize;
        let q = self.params.ec().order();
        let mod_q = crate::common::int::ModInt::new(q.clone());

        info!(target: "tss-lib", party_id = ?current_party_id, "signing round 3 starting: decrypting MtA responses, aggregating delta_i/sigma_i");

        let round2_messages = {
            let save_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            save_lock.message_store.sign_round2_messages.clone()
        };

        let own_sk: PrivateKey = self
            .keys
            .paillier_sk
            .clone()
            .ok_or_else(|| self.wrap_error(terr!("missing own Paillier secret key"), vec![current_party_id.as_ref().clone()]))?;

        let (session, own_c_ki, big_w_i) = {
            let save_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            (
                save_lock.ssid.clone().ok_or_else(|| self.wrap_error(terr!("SSID not set"), vec![]))?,
                save_lock.c_ki.clone().ok_or_else(|| self.wrap_error(terr!("missing c_ki"), vec![]))?,
                save_lock.big_w_j[i].clone().ok_or_else(|| self.wrap_error(terr!("missing own W_i"), vec![]))?,
            )
        };
        let own_ntilde = self.keys.ntilde_j[i].clone().ok_or_else(|| self.wrap_error(terr!("missing own Ntilde"), vec![]))?;
        let own_h1 = self.keys.h1j[i].clone().ok_or_else(|| self.wrap_error(terr!("missing own h1"), vec![]))?;
        let own_h2 = self.keys.h2j[i].clone().ok_or_else(|| self.wrap_error(terr!("missing own h2"), vec![]))?;

        let mut culprits = Vec::new();
        let mut alpha_sum = BigInt::from(0);
        let mut mu_sum = BigInt::from(0);

        for (j, party_j) in self.params.parties().party_ids().iter().enumerate() {
            if j == i {
                continue;
            }
            let parsed_msg = round2_messages
                .get(&(j as i32))
                .ok_or_else(|| self.wrap_error(terr!("missing round 2 message from party {}", j), vec![party_j.clone()]))?;
            let r2msg: SignRound2Message =
                decode_content(parsed_msg.as_ref()).map_err(|e| self.wrap_error(e, vec![party_j.clone()]))?;

            if !r2msg.proof_bob_wc.verify(
                &session,
                &q,
                &own_sk.public_key,
                &own_ntilde,
                &own_h1,
                &own_h2,
                &own_c_ki,
                &r2msg.c_mu,
                &big_w_i,
            ) {
                error!(target: "tss-lib", party_id = ?current_party_id, culprit = ?party_j, "ProofBobWC verification failed in signing round 3");
                culprits.push(party_j.clone());
                continue;
            }
            if !r2msg.proof_bob.verify(&session, &q, &own_sk.public_key, &own_ntilde, &own_h1, &own_h2, &own_c_ki, &r2msg.c_beta) {
                error!(target: "tss-lib", party_id = ?current_party_id, culprit = ?party_j, "ProofBob verification failed in signing round 3");
                culprits.push(party_j.clone());
                continue;
            }

            let alpha_ij = own_sk.decrypt(&r2msg.c_beta).map_err(|e| self.wrap_error(e, vec![party_j.clone()]))?;
            let mu_ij = own_sk.decrypt(&r2msg.c_mu).map_err(|e| self.wrap_error(e, vec![party_j.clone()]))?;

            alpha_sum = mod_q.add(&alpha_sum, &alpha_ij);
            mu_sum = mod_q.add(&mu_sum, &mu_ij);
        }

        if !culprits.is_empty() {
            return Err(self.wrap_error(terr!("MtA proof verification failed"), culprits));
        }

        let (k_i, gamma_i, w_i) = {
            let save_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            (
                save_lock.k_i.clone().ok_or_else(|| self.wrap_error(terr!("missing k_i"), vec![]))?,
                save_lock.gamma_i.clone().ok_or_else(|| self.wrap_error(terr!("missing gamma_i"), vec![]))?,
                save_lock.w_i.clone().ok_or_else(|| self.wrap_error(terr!("missing w_i"), vec![]))?,
            )
        };

        let mut beta_sum = BigInt::from(0);
        let mut nu_sum = BigInt::from(0);
        {
            let save_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            for v in save_lock.beta.values() {
                beta_sum = mod_q.add(&beta_sum, v);
            }
            for v in save_lock.nu.values() {
                nu_sum = mod_q.add(&nu_sum, v);
            }
        }

        let k_gamma = mod_q.mul(&k_i, &gamma_i);
        let delta_i = mod_q.add(&mod_q.add(&k_gamma, &alpha_sum), &beta_sum);

        let k_w = mod_q.mul(&k_i, &w_i);
        let sigma_i = mod_q.add(&mod_q.add(&k_w, &mu_sum), &nu_sum);

        {
            let mut save_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            save_lock.delta_i = Some(delta_i.clone());
            save_lock.sigma_i = Some(sigma_i);
        }

        let r3msg = SignRound3Message::new(delta_i);
        let routing = MessageRoutingInfo::broadcast(current_party_id.as_ref().clone());
        let tss_msg = ParsedMessageImpl::from_content(routing, &r3msg).map_err(|e| self.wrap_error(e, vec![]))?;
        {
            let mut save_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            save_lock.message_store.sign_round3_messages.insert(i as i32, Arc::new(tss_msg.clone()));
        }
        debug!(target: "tss-lib", party_id = ?current_party_id, "broadcasting delta_i");
        self.out_ch.send(Box::new(tss_msg)).map_err(|e| self.wrap_error(terr!("failed to send round 3 message: {}", e), vec![]))?;

        info!(target: "tss-lib", party_id = ?current_party_id, "signing round 3 finished successfully");
        Ok(())
    }

    fn can_accept(&self, msg: &dyn ParsedMessage) -> bool {
        match msg.type_tag() {
            t if t == SignRound3Message::TYPE_URL => msg.is_broadcast(),
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
            if save.message_store.sign_round3_messages.contains_key(&(j as i32)) {
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
        Some(Arc::new(Round4::new(
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
