// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Translation of tss-lib-go/ecdsa/keygen/round_4.go

use crate::{
    protocols::ecdsa::keygen::{
        messages::KGRound3Message,
        rounds::{
            base::BaseRound,
            paillier_proof_verifier::{PaillierProofVerifier, PaillierProofVerifierContext},
        },
        types::{LocalPartySaveData, LocalTempData},
    },
    terr,
    tss::{
        error::RoundError,
        message::{decode_content, ParsedMessage, TssMessage},
        params::Parameters,
        party_id::PartyID,
        round::Round,
    },
};

use log::{debug, error, info};
use std::sync::{mpsc::Sender, Arc, Mutex};

#[derive(Debug)]
pub struct Round4 {
    base: BaseRound,
    params: Arc<Parameters>,
    save: Arc<Mutex<LocalPartySaveData>>,
    temp: Arc<Mutex<LocalTempData>>,
    out_ch: Sender<Box<dyn TssMessage + Send>>,
    end_ch: Sender<LocalPartySaveData>,
}

impl Round4 {
    pub fn new(
        params: Arc<Parameters>,
        save: Arc<Mutex<LocalPartySaveData>>,
        temp: Arc<Mutex<LocalTempData>>,
        out_ch: Sender<Box<dyn TssMessage + Send>>,
        end_ch: Sender<LocalPartySaveData>,
    ) -> Self {
        let base = BaseRound::new(4, params.party_count());
        Self { base, params, save, temp, out_ch, end_ch }
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
        let i_usize = current_party_id.index as usize;

        info!(target: "tss-lib", party_id = ?current_party_id, "keygen round 4 starting: verifying Paillier proofs");

        let paillier_contexts: Vec<PaillierProofVerifierContext> = {
            let temp_data_lock = self.temp.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![current_party_id.as_ref().clone()]))?;
            let save_data_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock save data: {}", e), vec![current_party_id.as_ref().clone()]))?;

            let ecdsa_pub_key = save_data_lock
                .ecdsa_pub
                .clone()
                .ok_or_else(|| self.wrap_error(terr!("missing ECDSA public key"), vec![current_party_id.as_ref().clone()]))?;

            let mut contexts = Vec::with_capacity(self.params.party_count().saturating_sub(1));
            for j in 0..self.params.party_count() {
                if j == i_usize {
                    continue;
                }
                let msg_arc = temp_data_lock.message_store.kg_round3_messages.get(&(j as i32))
                    .ok_or_else(|| self.wrap_error(terr!("missing round 3 message for party {}", j), vec![self.params.parties().party_ids()[j].clone()]))?;
                let r3_msg: KGRound3Message = decode_content(msg_arc.as_ref())
                    .map_err(|e| self.wrap_error(e, vec![self.params.parties().party_ids()[j].clone()]))?;
                let paillier_pk_j = save_data_lock.paillier_pks[j].clone()
                    .ok_or_else(|| self.wrap_error(terr!("missing Paillier PK for party {}", j), vec![self.params.parties().party_ids()[j].clone()]))?;
                let party_id_j = self.params.parties().party_ids()[j].clone();

                contexts.push(PaillierProofVerifierContext {
                    paillier_pk: paillier_pk_j,
                    proof: r3_msg.paillier_proof,
                    associated_party_id: party_id_j,
                    ecdsa_pub: ecdsa_pub_key.clone(),
                });
            }
            contexts
        };

        debug!(target: "tss-lib", party_id = ?current_party_id, concurrency = self.params.concurrency(), "verifying Paillier proofs");
        let paillier_verifier = PaillierProofVerifier::new(self.params.concurrency());
        let expected_count = paillier_contexts.len();
        for context in paillier_contexts {
            paillier_verifier.verify_paillier_proof(context);
        }
        let paillier_results = paillier_verifier.collect_results(expected_count);

        let mut culprits = Vec::new();
        self.base.set_ok(i_usize);
        for result in paillier_results {
            if result.is_valid {
                self.base.set_ok(result.party_id.index as usize);
                debug!(target: "tss-lib", party_id = ?current_party_id, verified_party = ?result.party_id, "Paillier proof verified");
            } else {
                error!(target: "tss-lib", party_id = ?current_party_id, culprit = ?result.party_id, "Paillier proof verification failed");
                culprits.push(result.party_id);
            }
        }

        if !culprits.is_empty() {
            return Err(self.wrap_error(terr!("Paillier proof verification failed"), culprits));
        }

        info!(target: "tss-lib", party_id = ?current_party_id, "keygen round 4 finished successfully, sending result");
        let final_save_data = {
            let save_data_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock save data: {}", e), vec![current_party_id.as_ref().clone()]))?;
            save_data_lock.clone()
        };

        self.end_ch.send(final_save_data).map_err(|e| self.wrap_error(terr!("failed to send final save data: {}", e), vec![]))?;

        Ok(())
    }

    fn can_accept(&self, _msg: &dyn ParsedMessage) -> bool {
        false
    }

    fn update(&self) -> Result<bool, RoundError> {
        Ok(self.can_proceed())
    }

    fn can_proceed(&self) -> bool {
        self.base.get_ok_vec().iter().all(|&ok| ok)
    }

    fn next_round(&self) -> Option<Arc<dyn Round>> {
        None
    }

    fn waiting_for(&self) -> Vec<PartyID> {
        Vec::new()
    }
}
