// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// New committee only, terminal round: assembles and sends the final save
// data. Mirrors keygen's round 4 terminal-round contract (no outgoing
// message, `next_round` returns `None`).

use crate::{
    protocols::ecdsa::{
        keygen::{rounds::BaseRound, types::LocalPartySaveData},
        resharing::{
            messages::DGRound2Message2,
            types::{ReSharingOutput, ReSharingTempData},
        },
    },
    terr,
    tss::{
        error::RoundError,
        message::{decode_content, ParsedMessage, TssMessage},
        params::{Parameters, ReSharingParameters},
        party_id::PartyID,
        round::Round,
    },
};

use log::info;
use std::sync::{mpsc::Sender, Arc, Mutex};

#[derive(Debug)]
pub struct Round4 {
    base: BaseRound,
    params: Arc<ReSharingParameters>,
    keys: Arc<LocalPartySaveData>,
    temp: Arc<Mutex<ReSharingTempData>>,
    out_ch: Sender<Box<dyn TssMessage + Send>>,
    end_ch: Sender<ReSharingOutput>,
}

impl Round4 {
    pub fn new(
        params: Arc<ReSharingParameters>,
        keys: Arc<LocalPartySaveData>,
        temp: Arc<Mutex<ReSharingTempData>>,
        out_ch: Sender<Box<dyn TssMessage + Send>>,
        end_ch: Sender<ReSharingOutput>,
    ) -> Self {
        let base = BaseRound::new(4, params.old_and_new_party_count());
        Self { base, params, keys, temp, out_ch, end_ch }
    }
}

impl Round for Round4 {
    fn params(&self) -> &Parameters {
        self.params.base_params()
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

        if !self.params.is_new_committee() {
            return Ok(());
        }

        info!(target: "tss-lib", party_id = ?current_party_id, "re-sharing round 4 starting: assembling final save data");

        let new_party_ids = self.params.new_parties().party_ids().to_vec();
        let mut save = LocalPartySaveData::new(new_party_ids.len());
        save.ks = new_party_ids.iter().map(|p| p.key.clone()).collect();
        save.share_id = current_party_id.key.clone();

        let (new_xi, new_big_xj, new_ecdsa_pub, new_pre_params, round2_message2s) = {
            let temp_lock = self.temp.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![current_party_id.as_ref().clone()]))?;
            (
                temp_lock.new_xi.clone().ok_or_else(|| self.wrap_error(terr!("missing assembled private share"), vec![current_party_id.as_ref().clone()]))?,
                temp_lock.new_big_xj.clone(),
                temp_lock.new_ecdsa_pub.clone().ok_or_else(|| self.wrap_error(terr!("missing assembled public key"), vec![current_party_id.as_ref().clone()]))?,
                temp_lock.new_pre_params.clone().ok_or_else(|| self.wrap_error(terr!("missing Paillier/ring-Pedersen params"), vec![current_party_id.as_ref().clone()]))?,
                temp_lock.message_store.dg_round2_message2s.clone(),
            )
        };

        save.xi = Some(new_xi);
        save.big_xj = new_big_xj;
        save.ecdsa_pub = Some(new_ecdsa_pub);
        save.paillier_sk = new_pre_params.paillier_sk.clone();
        save.local_pre_params = new_pre_params;

        for (j, party_j) in new_party_ids.iter().enumerate() {
            let msg = round2_message2s
                .get(&party_j.key)
                .ok_or_else(|| self.wrap_error(terr!("missing Paillier/ring-Pedersen params for party {}", j), vec![party_j.clone()]))?;
            let r2msg2: DGRound2Message2 = decode_content(msg.as_ref()).map_err(|e| self.wrap_error(e, vec![party_j.clone()]))?;
            save.paillier_pks[j] = Some(r2msg2.paillier_pk);
            save.ntilde_j[j] = Some(r2msg2.ntilde);
            save.h1j[j] = Some(r2msg2.h1);
            save.h2j[j] = Some(r2msg2.h2);
        }

        info!(target: "tss-lib", party_id = ?current_party_id, "re-sharing round 4 finished successfully, sending result");
        self.end_ch.send(Some(save)).map_err(|e| self.wrap_error(terr!("failed to send final save data: {}", e), vec![]))?;

        Ok(())
    }

    fn can_accept(&self, _msg: &dyn ParsedMessage) -> bool {
        false
    }

    fn update(&self) -> Result<bool, RoundError> {
        Ok(true)
    }

    fn can_proceed(&self) -> bool {
        true
    }

    fn next_round(&self) -> Option<Arc<dyn Round>> {
        None
    }

    fn waiting_for(&self) -> Vec<PartyID> {
        Vec::new()
    }
}
