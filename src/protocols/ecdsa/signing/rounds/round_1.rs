// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Translation of tss-lib-go/ecdsa/signing/round_1.go

use crate::{
    crypto::{
        commitments::HashCommitDecommit,
        ecpoint::ECPoint,
        mta::RangeProofAlice,
        vss::lagrange_coefficient,
    },
    protocols::ecdsa::{
        keygen::{rounds::BaseRound, types::LocalPartySaveData},
        signing::{
            messages::{SignRound1Message1, SignRound1Message2},
            rounds::round_2::Round2,
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
use log::info;
use num_bigint_dig::BigInt;
use rand::thread_rng;
use std::sync::{mpsc::Sender, Arc, Mutex};

#[derive(Debug)]
pub struct Round1 {
    base: BaseRound,
    params: Arc<Parameters>,
    keys: Arc<LocalPartySaveData>,
    m: BigInt,
    save: Arc<Mutex<LocalTempData>>,
    out_ch: Sender<Box<dyn TssMessage + Send>>,
    end_ch: Sender<crate::protocols::ecdsa::signing::types::SignatureData>,
}

impl Round1 {
    pub fn new(
        params: Arc<Parameters>,
        keys: Arc<LocalPartySaveData>,
        m: BigInt,
        save: Arc<Mutex<LocalTempData>>,
        out_ch: Sender<Box<dyn TssMessage + Send>>,
        end_ch: Sender<crate::protocols::ecdsa::signing::types::SignatureData>,
    ) -> Self {
        let base = BaseRound::new(1, params.party_count());
        Self { base, params, keys, m, save, out_ch, end_ch }
    }

    fn get_ssid(&self) -> Result<Vec<u8>, RoundError> {
        let party_ids = self.params.parties().party_ids();
        let mut string_ids: Vec<&str> = party_ids.iter().map(|p| p.id.as_str()).collect();
        string_ids.sort();

        let mut data_to_hash = b"tss-lib-signing-session".to_vec();
        for id_str in string_ids {
            data_to_hash.extend_from_slice(id_str.as_bytes());
        }
        data_to_hash.extend_from_slice(&self.m.to_bytes_be().1);

        use sha2::{Digest, Sha256};
        let hash = Sha256::digest(&data_to_hash);
        Ok(hash.to_vec())
    }
}

impl Round for Round1 {
    fn params(&self) -> &Parameters {
        &self.params
    }

    fn round_number(&self) -> i32 {
        self.base.round_number()
    }

    fn start(&self) -> Result<(), RoundError> {
        if self.base.started() {
            return Err(self.wrap_error(terr!("round 1 already started"), vec![]));
        }
        self.base.set_started();
        self.base.reset_ok();

        let current_party_id = self.params.party_id();
        let i = current_party_id.index;
        let i_usize = i as usize;

        info!(target: "tss-lib", party_id = ?current_party_id, "signing round 1 starting: Lagrange shares, VSS-share encryption, commitment to Gamma_i");

        let q = self.params.ec().order();
        let all_keys = &self.keys.ks;

        let xi = self
            .keys
            .xi
            .as_ref()
            .ok_or_else(|| self.wrap_error(terr!("missing secret key share xi"), vec![current_party_id.as_ref().clone()]))?;
        let lambda_i = lagrange_coefficient(&q, &current_party_id.key, all_keys)
            .map_err(|e| self.wrap_error(e, vec![current_party_id.as_ref().clone()]))?;
        let mod_q = crate::common::int::ModInt::new(q.clone());
        let w_i = mod_q.mul(&lambda_i, xi);

        let mut big_w_j = vec![None; self.params.party_count()];
        for (j, party_j) in self.params.parties().party_ids().iter().enumerate() {
            let lambda_j = lagrange_coefficient(&q, &party_j.key, all_keys)
                .map_err(|e| self.wrap_error(e, vec![party_j.clone()]))?;
            let big_xj = self.keys.big_xj[j]
                .clone()
                .ok_or_else(|| self.wrap_error(terr!("missing public key share for party {}", j), vec![party_j.clone()]))?;
            big_w_j[j] = Some(big_xj.scalar_mul(&lambda_j));
        }

        let mut rng = thread_rng();
        let k_i = crate::common::random::get_random_positive_int(&mut rng, &q)
            .ok_or_else(|| self.wrap_error(terr!("failed to generate random k_i"), vec![current_party_id.as_ref().clone()]))?;
        let gamma_i = crate::common::random::get_random_positive_int(&mut rng, &q)
            .ok_or_else(|| self.wrap_error(terr!("failed to generate random gamma_i"), vec![current_party_id.as_ref().clone()]))?;

        let own_paillier_pk = self.keys.paillier_pks[i_usize]
            .clone()
            .ok_or_else(|| self.wrap_error(terr!("missing own Paillier public key"), vec![current_party_id.as_ref().clone()]))?;
        let (c_ki, k_i_randomness) = own_paillier_pk
            .encrypt_and_return_randomness(&mut rng, &k_i)
            .map_err(|e| self.wrap_error(e, vec![current_party_id.as_ref().clone()]))?;

        let big_gamma_i = ECPoint::<Secp256k1>::scalar_base_mult(&gamma_i);
        let (gamma_x, gamma_y) = big_gamma_i.coords();
        let commit_decommit = HashCommitDecommit::new(&mut rng, &[&gamma_x, &gamma_y]);

        {
            let mut save_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            save_lock.w_i = Some(w_i);
            save_lock.big_w_j = big_w_j;
            save_lock.k_i = Some(k_i.clone());
            save_lock.k_i_randomness = Some(k_i_randomness);
            save_lock.c_ki = Some(c_ki.clone());
            save_lock.gamma_i = Some(gamma_i.clone());
            save_lock.big_gamma_i = Some(big_gamma_i);
            save_lock.de_commit_big_gamma_i = Some(commit_decommit.d.clone());
            save_lock.ssid_nonce = Some(BigInt::from(0));
            save_lock.ssid = Some(self.get_ssid()?);
        }

        // BROADCAST: commitment to Gamma_i.
        let r1msg1 = SignRound1Message1::new(commit_decommit.c);
        let routing = MessageRoutingInfo::broadcast(current_party_id.as_ref().clone());
        let tss_msg = ParsedMessageImpl::from_content(routing, &r1msg1).map_err(|e| self.wrap_error(e, vec![]))?;
        {
            let mut save_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            save_lock.message_store.sign_round1_message1s.insert(i, Arc::new(tss_msg.clone()));
        }
        self.out_ch.send(Box::new(tss_msg)).map_err(|e| self.wrap_error(terr!("failed to send round 1 message 1: {}", e), vec![]))?;

        // P2P: send every other party our Paillier ciphertext of k_i, with a
        // range proof verifiable against their own ring-Pedersen setup.
        for (j, party_j) in self.params.parties().party_ids().iter().enumerate() {
            if j == i_usize {
                continue;
            }
            let n_tilde_j = self.keys.ntilde_j[j].clone().ok_or_else(|| self.wrap_error(terr!("missing Ntilde for party {}", j), vec![party_j.clone()]))?;
            let h1j = self.keys.h1j[j].clone().ok_or_else(|| self.wrap_error(terr!("missing h1 for party {}", j), vec![party_j.clone()]))?;
            let h2j = self.keys.h2j[j].clone().ok_or_else(|| self.wrap_error(terr!("missing h2 for party {}", j), vec![party_j.clone()]))?;

            let range_proof = RangeProofAlice::new::<Secp256k1, _>(
                &q,
                &own_paillier_pk,
                &c_ki,
                &n_tilde_j,
                &h1j,
                &h2j,
                &k_i,
                &self
                    .save
                    .lock()
                    .map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?
                    .k_i_randomness
                    .clone()
                    .ok_or_else(|| self.wrap_error(terr!("missing k_i randomness"), vec![]))?,
                &mut rng,
            )
            .map_err(|e| self.wrap_error(e, vec![party_j.clone()]))?;

            let r1msg2 = SignRound1Message2::new(c_ki.clone(), range_proof);
            let routing = MessageRoutingInfo::point_to_point(current_party_id.as_ref().clone(), party_j.clone());
            let tss_msg = ParsedMessageImpl::from_content(routing, &r1msg2).map_err(|e| self.wrap_error(e, vec![]))?;
            self.out_ch.send(Box::new(tss_msg)).map_err(|e| self.wrap_error(terr!("failed to send round 1 message 2: {}", e), vec![]))?;
        }

        info!(target: "tss-lib", party_id = ?current_party_id, "signing round 1 finished successfully");
        Ok(())
    }

    fn can_accept(&self, msg: &dyn ParsedMessage) -> bool {
        match msg.type_tag() {
            t if t == SignRound1Message1::TYPE_URL => msg.is_broadcast(),
            t if t == SignRound1Message2::TYPE_URL => !msg.is_broadcast(),
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
            let have_msg1 = save.message_store.sign_round1_message1s.contains_key(&(j as i32));
            let have_msg2 = j == i_usize || save.message_store.sign_round1_message2s.contains_key(&(j as i32));
            if have_msg1 && have_msg2 {
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
        Some(Arc::new(Round2::new(
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
