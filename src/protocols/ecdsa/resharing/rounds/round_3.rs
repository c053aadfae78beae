// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// New committee only: verify every old committee member's sub-share and
// verification vector, assemble the new additive share and public shares,
// and check the new committee's ring-Pedersen DLN proofs.

use crate::{
    crypto::{
        commitments::HashCommitDecommit,
        ecpoint::{un_flatten_ec_points, K256Point, PointError},
        vss::Share as VssShare,
    },
    protocols::ecdsa::{
        keygen::{rounds::BaseRound, types::LocalPartySaveData},
        resharing::{
            messages::{DGRound1Message1, DGRound1Message2, DGRound2Message1, DGRound2Message2, DGRound3Message},
            rounds::round_4::Round4,
            types::{ReSharingOutput, ReSharingTempData},
        },
    },
    terr,
    tss::{
        error::RoundError,
        message::{decode_content, MessageRoutingInfo, ParsedMessage, ParsedMessageImpl, TssMessage},
        params::{Parameters, ReSharingParameters},
        party_id::PartyID,
        round::Round,
    },
};

use k256::Secp256k1;
use log::{debug, error, info};
use num_bigint_dig::BigInt;
use num_traits::{One, Zero};
use std::sync::{mpsc::Sender, Arc, Mutex};

#[derive(Debug)]
pub struct Round3 {
    base: BaseRound,
    params: Arc<ReSharingParameters>,
    keys: Arc<LocalPartySaveData>,
    temp: Arc<Mutex<ReSharingTempData>>,
    out_ch: Sender<Box<dyn TssMessage + Send>>,
    end_ch: Sender<ReSharingOutput>,
}

impl Round3 {
    pub fn new(
        params: Arc<ReSharingParameters>,
        keys: Arc<LocalPartySaveData>,
        temp: Arc<Mutex<ReSharingTempData>>,
        out_ch: Sender<Box<dyn TssMessage + Send>>,
        end_ch: Sender<ReSharingOutput>,
    ) -> Self {
        let base = BaseRound::new(3, params.old_and_new_party_count());
        Self { base, params, keys, temp, out_ch, end_ch }
    }
}

/// Evaluates a (possibly combined) verification vector `V` at `id`:
/// `V[0] + V[1]^id + V[2]^(id^2) + ... + V[t]^(id^t)`. Duplicates the `rhs`
/// accumulation in `Share::verify`, which only exposes the comparison, not
/// the evaluated point itself.
fn evaluate_vector_at(q: &BigInt, id: &BigInt, vector: &[K256Point]) -> Result<K256Point, PointError> {
    let mod_q = crate::common::int::ModInt::new(q.clone());
    let mut acc = vector[0].clone();
    let mut id_power_j = BigInt::one();
    for point_j in vector.iter().skip(1) {
        id_power_j = mod_q.mul(&id_power_j, id);
        let term = point_j.scalar_mul(&id_power_j);
        acc = acc.add(&term)?;
    }
    Ok(acc)
}

impl Round for Round3 {
    fn params(&self) -> &Parameters {
        self.params.base_params()
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

        if !self.params.is_new_committee() {
            info!(target: "tss-lib", party_id = ?current_party_id, "re-sharing round 3: not on the new committee, nothing to do");
            return Ok(());
        }

        info!(target: "tss-lib", party_id = ?current_party_id, "re-sharing round 3 starting: assembling new share from old committee's sub-shares");

        let q = self.params.ec().order();
        let new_threshold = self.params.new_threshold();
        let mod_q = crate::common::int::ModInt::new(q.clone());

        let (round1_message1s, round1_message2s, round2_message1s) = {
            let temp_lock = self.temp.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            (
                temp_lock.message_store.dg_round1_message1s.clone(),
                temp_lock.message_store.dg_round1_message2s.clone(),
                temp_lock.message_store.dg_round2_message1s.clone(),
            )
        };

        let mut new_xi = BigInt::zero();
        let mut combined_vector: Option<Vec<K256Point>> = None;

        for old_party in self.params.old_parties().party_ids() {
            let msg1 = round1_message1s
                .get(&old_party.key)
                .ok_or_else(|| self.wrap_error(terr!("missing commitment from old party"), vec![old_party.clone()]))?;
            let msg2 = round1_message2s
                .get(&old_party.key)
                .ok_or_else(|| self.wrap_error(terr!("missing sub-share from old party"), vec![old_party.clone()]))?;
            let decommit_msg = round2_message1s
                .get(&old_party.key)
                .ok_or_else(|| self.wrap_error(terr!("missing decommitment from old party"), vec![old_party.clone()]))?;

            let r1msg1: DGRound1Message1 = decode_content(msg1.as_ref()).map_err(|e| self.wrap_error(e, vec![old_party.clone()]))?;
            let r1msg2: DGRound1Message2 = decode_content(msg2.as_ref()).map_err(|e| self.wrap_error(e, vec![old_party.clone()]))?;
            let r2msg1: DGRound2Message1 = decode_content(decommit_msg.as_ref()).map_err(|e| self.wrap_error(e, vec![old_party.clone()]))?;

            let commit_decommit = HashCommitDecommit { c: r1msg1.commitment, d: r2msg1.de_commitment };
            let (ok, flat_coords) = commit_decommit.decommit();
            if !ok {
                error!(target: "tss-lib", party_id = ?current_party_id, culprit = ?old_party, "VSS decommitment failed");
                return Err(self.wrap_error(terr!("VSS decommitment failed"), vec![old_party.clone()]));
            }
            let vector = un_flatten_ec_points::<Secp256k1>(&flat_coords)
                .map_err(|e| self.wrap_error(terr!("failed to un-flatten VSS commitments: {}", e), vec![old_party.clone()]))?;

            let share = VssShare { threshold: new_threshold, id: current_party_id.key.clone(), share: r1msg2.share.clone() };
            let verification_vector = crate::crypto::vss::VerificationVector { vector: vector.clone() };
            if !share.verify(&q, &verification_vector) {
                error!(target: "tss-lib", party_id = ?current_party_id, culprit = ?old_party, "sub-share verification failed");
                return Err(self.wrap_error(terr!("sub-share verification failed"), vec![old_party.clone()]));
            }

            new_xi = mod_q.add(&new_xi, &r1msg2.share);

            combined_vector = Some(match combined_vector {
                None => vector,
                Some(existing) => {
                    let mut summed = Vec::with_capacity(existing.len());
                    for (a, b) in existing.iter().zip(vector.iter()) {
                        summed.push(a.add(b).map_err(|e| self.wrap_error(terr!("failed to combine VSS verification vectors: {}", e), vec![old_party.clone()]))?);
                    }
                    summed
                }
            });
        }

        let combined_vector = combined_vector.ok_or_else(|| self.wrap_error(terr!("no old committee contributions received"), vec![]))?;
        let new_ecdsa_pub = combined_vector[0].clone();

        let new_party_ids = self.params.new_parties().party_ids().to_vec();
        let mut new_big_xj: Vec<Option<K256Point>> = vec![None; new_party_ids.len()];
        for (j, party_j) in new_party_ids.iter().enumerate() {
            let point = evaluate_vector_at(&q, &party_j.key, &combined_vector)
                .map_err(|e| self.wrap_error(terr!("failed to evaluate combined VSS vector: {}", e), vec![party_j.clone()]))?;
            new_big_xj[j] = Some(point);
        }

        debug!(target: "tss-lib", party_id = ?current_party_id, "verifying new committee's ring-Pedersen DLN proofs");
        let round2_message2s = {
            let temp_lock = self.temp.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            temp_lock.message_store.dg_round2_message2s.clone()
        };
        for new_party in &new_party_ids {
            let msg = round2_message2s
                .get(&new_party.key)
                .ok_or_else(|| self.wrap_error(terr!("missing Paillier/ring-Pedersen params from new party"), vec![new_party.clone()]))?;
            let r2msg2: DGRound2Message2 = decode_content(msg.as_ref()).map_err(|e| self.wrap_error(e, vec![new_party.clone()]))?;

            if r2msg2.h1 == r2msg2.h2 {
                return Err(self.wrap_error(terr!("h1 and h2 are equal"), vec![new_party.clone()]));
            }
            if !r2msg2.dln_proof_1.verify(&r2msg2.h1, &r2msg2.h2, &r2msg2.ntilde)
                || !r2msg2.dln_proof_2.verify(&r2msg2.h2, &r2msg2.h1, &r2msg2.ntilde)
            {
                error!(target: "tss-lib", party_id = ?current_party_id, culprit = ?new_party, "DLN proof verification failed");
                return Err(self.wrap_error(terr!("DLN proof verification failed"), vec![new_party.clone()]));
            }
        }
        info!(target: "tss-lib", party_id = ?current_party_id, "DLN proofs verified successfully");

        {
            let mut temp_lock = self.temp.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            temp_lock.new_xi = Some(new_xi);
            temp_lock.new_big_xj = new_big_xj;
            temp_lock.new_ecdsa_pub = Some(new_ecdsa_pub);
        }

        let r3msg = DGRound3Message::new();
        let routing = MessageRoutingInfo::broadcast(current_party_id.as_ref().clone());
        let tss_msg = ParsedMessageImpl::from_content(routing, &r3msg).map_err(|e| self.wrap_error(e, vec![]))?;
        {
            let mut temp_lock = self.temp.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            temp_lock.message_store.dg_round3_messages.insert(current_party_id.key.clone(), Arc::new(tss_msg.clone()));
        }
        self.out_ch.send(Box::new(tss_msg)).map_err(|e| self.wrap_error(terr!("failed to send round 3 message: {}", e), vec![]))?;

        info!(target: "tss-lib", party_id = ?current_party_id, "re-sharing round 3 finished successfully");
        Ok(())
    }

    fn can_accept(&self, msg: &dyn ParsedMessage) -> bool {
        msg.is_broadcast() && msg.type_tag() == DGRound3Message::TYPE_URL
    }

    fn update(&self) -> Result<bool, RoundError> {
        if !self.params.is_new_committee() {
            return Ok(true);
        }
        let temp = self.temp.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
        for party in self.params.new_parties().party_ids() {
            if !temp.message_store.dg_round3_messages.contains_key(&party.key) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn can_proceed(&self) -> bool {
        true
    }

    fn next_round(&self) -> Option<Arc<dyn Round>> {
        self.base.set_started_unwrapped();
        Some(Arc::new(Round4::new(
            self.params.clone(),
            self.keys.clone(),
            self.temp.clone(),
            self.out_ch.clone(),
            self.end_ch.clone(),
        )))
    }

    fn waiting_for(&self) -> Vec<PartyID> {
        if !self.params.is_new_committee() {
            return Vec::new();
        }
        let temp = match self.temp.lock() {
            Ok(t) => t,
            Err(_) => return Vec::new(),
        };
        self.params
            .new_parties()
            .party_ids()
            .iter()
            .filter(|p| !temp.message_store.dg_round3_messages.contains_key(&p.key))
            .cloned()
            .collect()
    }
}
