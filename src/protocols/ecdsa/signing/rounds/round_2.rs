// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Translation of tss-lib-go/ecdsa/signing/round_2.go

use crate::{
    crypto::mta::{ProofBob, ProofBobWC, RangeProofAlice},
    protocols::ecdsa::{
        keygen::{rounds::BaseRound, types::LocalPartySaveData},
        signing::{
            messages::{SignRound1Message2, SignRound2Message},
            rounds::round_3::Round3,
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
use log::{debug, error, info};
use num_bigint_dig::BigInt;
use rand::thread_rng;
use std::sync::{mpsc::Sender, Arc, Mutex};

#[derive(Debug)]
pub struct Round2 {
    base: BaseRound,
    params: Arc<Parameters>,
    keys: Arc<LocalPartySaveData>,
    m: BigInt,
    save: Arc<Mutex<LocalTempData>>,
    out_ch: Sender<Box<dyn TssMessage + Send>>,
    end_ch: Sender<crate::protocols::ecdsa::signing::types::SignatureData>,
}

impl Round2 {
    pub fn new(
        params: Arc<Parameters>,
        keys: Arc<LocalPartySaveData>,
        m: BigInt,
        save: Arc<Mutex<LocalTempData>>,
        out_ch: Sender<Box<dyn TssMessage + Send>>,
        end_ch: Sender<crate::protocols::ecdsa::signing::types::SignatureData>,
    ) -> Self {
        let base = BaseRound::new(2, params.party_count());
        Self { base, params, keys, m, save, out_ch, end_ch }
    }

    fn get_context(&self) -> Result<Vec<u8>, RoundError> {
        let save_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
        save_lock.ssid.clone().ok_or_else(|| self.wrap_error(terr!("SSID not set"), vec![]))
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
        let q = self.params.ec().order();
        let mod_q = crate::common::int::ModInt::new(q.clone());
        let session = self.get_context()?;

        info!(target: "tss-lib", party_id = ?current_party_id, "signing round 2 starting: verifying range proofs, computing MtA responses");

        let round1_message2s = {
            let save_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            save_lock.message_store.sign_round1_message2s.clone()
        };

        let (w_i, c_ki_self) = {
            let save_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            (
                save_lock.w_i.clone().ok_or_else(|| self.wrap_error(terr!("missing w_i"), vec![]))?,
                save_lock.c_ki.clone().ok_or_else(|| self.wrap_error(terr!("missing c_ki"), vec![]))?,
            )
        };
        let _ = c_ki_self;

        let own_ntilde = self.keys.ntilde_j[i].clone().ok_or_else(|| self.wrap_error(terr!("missing own Ntilde"), vec![]))?;
        let own_h1 = self.keys.h1j[i].clone().ok_or_else(|| self.wrap_error(terr!("missing own h1"), vec![]))?;
        let own_h2 = self.keys.h2j[i].clone().ok_or_else(|| self.wrap_error(terr!("missing own h2"), vec![]))?;

        let mut rng = thread_rng();
        let mut culprits = Vec::new();

        for (j, party_j) in self.params.parties().party_ids().iter().enumerate() {
            if j == i {
                continue;
            }
            let parsed_msg = round1_message2s
                .get(&(j as i32))
                .ok_or_else(|| self.wrap_error(terr!("missing round 1 message 2 from party {}", j), vec![party_j.clone()]))?;
            let r1msg2: SignRound1Message2 =
                decode_content(parsed_msg.as_ref()).map_err(|e| self.wrap_error(e, vec![party_j.clone()]))?;

            let pk_j = self.keys.paillier_pks[j]
                .clone()
                .ok_or_else(|| self.wrap_error(terr!("missing Paillier pk for party {}", j), vec![party_j.clone()]))?;

            if !r1msg2
                .range_proof
                .verify(&q, &pk_j, &own_ntilde, &own_h1, &own_h2, &r1msg2.c_ki)
            {
                error!(target: "tss-lib", party_id = ?current_party_id, culprit = ?party_j, "range proof verification failed in signing round 2");
                culprits.push(party_j.clone());
                continue;
            }

            let gamma_i = {
                let save_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
                save_lock.gamma_i.clone().ok_or_else(|| self.wrap_error(terr!("missing gamma_i"), vec![]))?
            };

            let ntilde_j = self.keys.ntilde_j[j].clone().ok_or_else(|| self.wrap_error(terr!("missing Ntilde for party {}", j), vec![party_j.clone()]))?;
            let h1j = self.keys.h1j[j].clone().ok_or_else(|| self.wrap_error(terr!("missing h1 for party {}", j), vec![party_j.clone()]))?;
            let h2j = self.keys.h2j[j].clone().ok_or_else(|| self.wrap_error(terr!("missing h2 for party {}", j), vec![party_j.clone()]))?;

            // MtA for the gamma-product k_j * gamma_i (no consistency check).
            let beta_prime = crate::common::random::get_random_positive_int(&mut rng, &pk_j.n)
                .ok_or_else(|| self.wrap_error(terr!("failed to generate beta_prime"), vec![party_j.clone()]))?;
            let (c_beta_prime, r_beta) = pk_j
                .encrypt_and_return_randomness(&mut rng, &beta_prime)
                .map_err(|e| self.wrap_error(e, vec![party_j.clone()]))?;
            let c_beta_mid = pk_j.homo_mult(&gamma_i, &r1msg2.c_ki).map_err(|e| self.wrap_error(e, vec![party_j.clone()]))?;
            let c_beta = pk_j.homo_add(&c_beta_mid, &c_beta_prime).map_err(|e| self.wrap_error(e, vec![party_j.clone()]))?;
            let beta_ji = mod_q.sub(&BigInt::from(0), &beta_prime);

            let proof_bob = ProofBob::new::<Secp256k1, _>(
                &session,
                &q,
                &pk_j,
                &ntilde_j,
                &h1j,
                &h2j,
                &r1msg2.c_ki,
                &c_beta,
                &gamma_i,
                &beta_prime,
                &r_beta,
                &mut rng,
            )
            .map_err(|e| self.wrap_error(e, vec![party_j.clone()]))?;

            // MtA for the w-product k_j * w_i (with consistency check against W_i).
            let big_w_i = {
                let save_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
                save_lock.big_w_j[i].clone().ok_or_else(|| self.wrap_error(terr!("missing own W_i"), vec![]))?
            };
            let nu_prime = crate::common::random::get_random_positive_int(&mut rng, &pk_j.n)
                .ok_or_else(|| self.wrap_error(terr!("failed to generate nu_prime"), vec![party_j.clone()]))?;
            let (c_nu_prime, r_nu) = pk_j
                .encrypt_and_return_randomness(&mut rng, &nu_prime)
                .map_err(|e| self.wrap_error(e, vec![party_j.clone()]))?;
            let c_mu_mid = pk_j.homo_mult(&w_i, &r1msg2.c_ki).map_err(|e| self.wrap_error(e, vec![party_j.clone()]))?;
            let c_mu = pk_j.homo_add(&c_mu_mid, &c_nu_prime).map_err(|e| self.wrap_error(e, vec![party_j.clone()]))?;
            let nu_ji = mod_q.sub(&BigInt::from(0), &nu_prime);

            let proof_bob_wc = ProofBobWC::<Secp256k1>::new(
                &session,
                &q,
                &pk_j,
                &ntilde_j,
                &h1j,
                &h2j,
                &r1msg2.c_ki,
                &c_mu,
                &w_i,
                &nu_prime,
                &r_nu,
                Some(&big_w_i),
                &mut rng,
            )
            .map_err(|e| self.wrap_error(e, vec![party_j.clone()]))?;

            {
                let mut save_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
                save_lock.beta.insert(j, beta_ji);
                save_lock.nu.insert(j, nu_ji);
            }

            let r2msg = SignRound2Message::new(c_beta, proof_bob, c_mu, proof_bob_wc);
            let routing = MessageRoutingInfo::point_to_point(current_party_id.as_ref().clone(), party_j.clone());
            let tss_msg = ParsedMessageImpl::from_content(routing, &r2msg).map_err(|e| self.wrap_error(e, vec![]))?;
            debug!(target: "tss-lib", party_id = ?current_party_id, to_party_idx = j, "sending MtA responses");
            self.out_ch.send(Box::new(tss_msg)).map_err(|e| self.wrap_error(terr!("failed to send round 2 message: {}", e), vec![]))?;
        }

        if !culprits.is_empty() {
            return Err(self.wrap_error(terr!("range proof verification failed"), culprits));
        }

        info!(target: "tss-lib", party_id = ?current_party_id, "signing round 2 finished successfully");
        Ok(())
    }

    fn can_accept(&self, msg: &dyn ParsedMessage) -> bool {
        match msg.type_tag() {
            t if t == SignRound2Message::TYPE_URL => !msg.is_broadcast(),
            _ => false,
        }
    }

    fn update(&self) -> Result<bool, RoundError> {
        let mut all_ok = true;
        let required_count = self.params().party_count();
        let i_usize = self.params.party_id().index as usize;

        let save = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
        for j in 0..required_count {
            if self.base.is_ok(j) {
                continue;
            }
            let have_msg = j == i_usize || save.message_store.sign_round2_messages.contains_key(&(j as i32));
            if have_msg {
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
        Some(Arc::new(Round3::new(
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
