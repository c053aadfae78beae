// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Old committee: re-share each party's old Shamir share as a fresh,
// degree-`new_threshold` sub-sharing among the new committee.

use crate::{
    crypto::{
        commitments::HashCommitDecommit,
        ecpoint::flatten_ec_points,
        vss::{self, lagrange_coefficient},
    },
    protocols::ecdsa::{
        keygen::{rounds::BaseRound, types::LocalPartySaveData},
        resharing::{
            messages::{DGRound1Message1, DGRound1Message2},
            rounds::round_2::Round2,
            types::{ReSharingOutput, ReSharingTempData},
        },
    },
    terr,
    tss::{
        error::RoundError,
        message::{MessageRoutingInfo, ParsedMessage, ParsedMessageImpl, TssMessage},
        params::{Parameters, ReSharingParameters},
        party_id::PartyID,
        round::Round,
    },
};

use k256::Secp256k1;
use log::{debug, info};
use num_bigint_dig::BigInt;
use num_traits::Zero;
use rand::thread_rng;
use std::sync::{mpsc::Sender, Arc, Mutex};

#[derive(Debug)]
pub struct Round1 {
    base: BaseRound,
    params: Arc<ReSharingParameters>,
    keys: Arc<LocalPartySaveData>,
    temp: Arc<Mutex<ReSharingTempData>>,
    out_ch: Sender<Box<dyn TssMessage + Send>>,
    end_ch: Sender<ReSharingOutput>,
}

impl Round1 {
    pub fn new(
        params: Arc<ReSharingParameters>,
        keys: Arc<LocalPartySaveData>,
        temp: Arc<Mutex<ReSharingTempData>>,
        out_ch: Sender<Box<dyn TssMessage + Send>>,
        end_ch: Sender<ReSharingOutput>,
    ) -> Self {
        let base = BaseRound::new(1, params.old_and_new_party_count());
        Self { base, params, keys, temp, out_ch, end_ch }
    }

    fn get_ssid(&self) -> Result<Vec<u8>, RoundError> {
        let mut string_ids: Vec<String> = self.params.old_and_new_parties().iter().map(|p| p.id.clone()).collect();
        string_ids.sort();

        let mut data_to_hash = b"tss-lib-resharing-session".to_vec();
        for id_str in string_ids {
            data_to_hash.extend_from_slice(id_str.as_bytes());
        }

        let temp_data = self.temp.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
        let nonce = temp_data.ssid_nonce.as_ref().ok_or_else(|| self.wrap_error(terr!("SSID nonce not set"), vec![]))?;
        data_to_hash.extend_from_slice(&nonce.to_bytes_be().1);

        use sha2::{Digest, Sha256};
        Ok(Sha256::digest(&data_to_hash).to_vec())
    }
}

impl Round for Round1 {
    fn params(&self) -> &Parameters {
        self.params.base_params()
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

        {
            let mut temp_lock = self.temp.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            temp_lock.ssid_nonce = Some(BigInt::zero());
        }
        let ssid = self.get_ssid()?;
        {
            let mut temp_lock = self.temp.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            temp_lock.ssid = Some(ssid);
        }

        if !self.params.is_old_committee() {
            info!(target: "tss-lib", party_id = ?current_party_id, "re-sharing round 1: not on the old committee, nothing to do");
            return Ok(());
        }

        info!(target: "tss-lib", party_id = ?current_party_id, "re-sharing round 1 starting: sub-sharing old share among the new committee");

        let q = self.params.ec().order();
        let old_ks: Vec<BigInt> = self.params.old_parties().party_ids().iter().map(|p| p.key.clone()).collect();
        let xi = self.keys.xi.clone().ok_or_else(|| self.wrap_error(terr!("missing old private share"), vec![current_party_id.as_ref().clone()]))?;

        let lambda_i = lagrange_coefficient(&q, &current_party_id.key, &old_ks).map_err(|e| self.wrap_error(e, vec![current_party_id.as_ref().clone()]))?;
        let mod_q = crate::common::int::ModInt::new(q.clone());
        let sub_share = mod_q.mul(&lambda_i, &xi);

        let mut rng = thread_rng();
        let new_ks: Vec<BigInt> = self.params.new_parties().party_ids().iter().map(|p| p.key.clone()).collect();
        let (vs, shares) = vss::create::<Secp256k1, _>(&q, self.params.new_threshold(), &sub_share, &new_ks, &mut rng)
            .map_err(|e| self.wrap_error(e, vec![current_party_id.as_ref().clone()]))?;

        let flattened = flatten_ec_points(&vs.vector).map_err(|e| self.wrap_error(terr!("failed to flatten VSS commitments: {}", e), vec![current_party_id.as_ref().clone()]))?;
        let point_refs: Vec<&BigInt> = flattened.iter().collect();
        let commit_decommit = HashCommitDecommit::new(&mut rng, &point_refs);

        {
            let mut temp_lock = self.temp.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            temp_lock.sub_share = Some(sub_share);
            temp_lock.vs = Some(vs);
            temp_lock.shares = Some(shares.clone());
            temp_lock.decommit_poly_g = Some(commit_decommit.d.clone());
        }

        let r1msg1 = DGRound1Message1::new(commit_decommit.c);
        let routing = MessageRoutingInfo {
            from: current_party_id.as_ref().clone(),
            to: None,
            is_broadcast: true,
            is_to_old_committee: false,
            is_to_old_and_new_committees: true,
        };
        let tss_msg = ParsedMessageImpl::from_content(routing, &r1msg1).map_err(|e| self.wrap_error(e, vec![]))?;
        {
            let mut temp_lock = self.temp.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            temp_lock.message_store.dg_round1_message1s.insert(current_party_id.key.clone(), Arc::new(tss_msg.clone()));
        }
        debug!(target: "tss-lib", party_id = ?current_party_id, "broadcasting commitment to sub-share VSS vector");
        self.out_ch.send(Box::new(tss_msg)).map_err(|e| self.wrap_error(terr!("failed to send round 1 message 1: {}", e), vec![]))?;

        for (j, party_j) in self.params.new_parties().party_ids().iter().enumerate() {
            let r1msg2 = DGRound1Message2::new(shares[j].share.clone());
            let routing = MessageRoutingInfo::point_to_point(current_party_id.as_ref().clone(), party_j.clone());
            let tss_msg = ParsedMessageImpl::from_content(routing, &r1msg2).map_err(|e| self.wrap_error(e, vec![]))?;

            if *party_j.as_ref() == *current_party_id.as_ref() {
                let mut temp_lock = self.temp.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
                temp_lock.message_store.dg_round1_message2s.insert(current_party_id.key.clone(), Arc::new(tss_msg));
            } else {
                debug!(target: "tss-lib", party_id = ?current_party_id, to_party = ?party_j, "sending sub-share");
                self.out_ch.send(Box::new(tss_msg)).map_err(|e| self.wrap_error(terr!("failed to send round 1 message 2: {}", e), vec![]))?;
            }
        }

        info!(target: "tss-lib", party_id = ?current_party_id, "re-sharing round 1 finished successfully");
        Ok(())
    }

    fn can_accept(&self, msg: &dyn ParsedMessage) -> bool {
        match msg.type_tag() {
            t if t == DGRound1Message1::TYPE_URL => msg.is_broadcast(),
            t if t == DGRound1Message2::TYPE_URL => !msg.is_broadcast(),
            _ => false,
        }
    }

    fn update(&self) -> Result<bool, RoundError> {
        if !self.params.is_new_committee() {
            return Ok(true);
        }
        let temp = self.temp.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
        for party in self.params.old_parties().party_ids() {
            if !temp.message_store.dg_round1_message1s.contains_key(&party.key) || !temp.message_store.dg_round1_message2s.contains_key(&party.key) {
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
        Some(Arc::new(Round2::new(
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
        self.params.old_parties().party_ids().to_vec()
    }
}
