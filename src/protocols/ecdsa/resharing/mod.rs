// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Translation of tss-lib-go/ecdsa/resharing/local_party.go

pub mod messages;
pub mod rounds;
pub mod types;

use crate::{
    protocols::ecdsa::{
        keygen::types::LocalPartySaveData,
        resharing::{
            messages::{DGRound1Message1, DGRound1Message2, DGRound2Message1, DGRound2Message2, DGRound3Message},
            rounds::round_1::Round1,
            types::{ReSharingOutput, ReSharingTempData},
        },
    },
    terr,
    tss::{
        error::RoundError,
        message::{MessageRoutingInfo, ParsedMessage, ParsedMessageImpl, TssMessage},
        party::{base_start, base_update, default_validate_message, BaseParty, Party},
        party_id::PartyID,
        params::ReSharingParameters,
        round::Round,
    },
};

use std::fmt;
use std::sync::{mpsc::Sender, Arc, Mutex};

const TASK_NAME: &str = "ecdsa-resharing";

/// A single participant running the four-round re-sharing protocol. Parties
/// that belong only to the old committee finish after round 2 with `None`
/// on `end_ch`; parties on the new committee run through round 4 and finish
/// with `Some(new save data)`.
#[derive(Debug)]
pub struct LocalParty {
    base: BaseParty,
    params: Arc<ReSharingParameters>,
    keys: Arc<LocalPartySaveData>,
    temp: Arc<Mutex<ReSharingTempData>>,
    out_ch: Sender<Box<dyn TssMessage + Send>>,
    end_ch: Sender<ReSharingOutput>,
}

impl LocalParty {
    pub fn new(
        params: Arc<ReSharingParameters>,
        keys: Arc<LocalPartySaveData>,
        out_ch: Sender<Box<dyn TssMessage + Send>>,
        end_ch: Sender<ReSharingOutput>,
    ) -> Arc<Self> {
        let new_party_count = params.new_party_count();
        let temp = Arc::new(Mutex::new(ReSharingTempData::new(new_party_count)));
        let party_id = params.party_id().as_ref().clone();

        let params_for_round = params.clone();
        let keys_for_round = keys.clone();
        let temp_for_round = temp.clone();
        let out_ch_for_round = out_ch.clone();
        let end_ch_for_round = end_ch.clone();

        let first_round_provider = Arc::new(move || -> Arc<dyn Round> {
            Arc::new(Round1::new(
                params_for_round.clone(),
                keys_for_round.clone(),
                temp_for_round.clone(),
                out_ch_for_round.clone(),
                end_ch_for_round.clone(),
            ))
        });

        Arc::new(LocalParty {
            base: BaseParty::new(party_id, first_round_provider),
            params,
            keys,
            temp,
            out_ch,
            end_ch,
        })
    }

    pub fn params(&self) -> &Arc<ReSharingParameters> {
        &self.params
    }
}

impl fmt::Display for LocalParty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LocalParty{{party_id={}, round={}}}",
            self.params.party_id(),
            self.base.default_current_round().map(|r| r.round_number()).unwrap_or(0)
        )
    }
}

impl Party for LocalParty {
    fn start(&self) -> Result<(), RoundError> {
        base_start(self, TASK_NAME)
    }

    fn update(&self, msg: Arc<dyn ParsedMessage>) -> Result<bool, RoundError> {
        base_update(self, msg, TASK_NAME)
    }

    fn is_running(&self) -> bool {
        self.base.default_is_running()
    }

    fn waiting_for(&self) -> Vec<PartyID> {
        self.base.default_waiting_for()
    }

    fn validate_message(&self, msg: &Arc<dyn ParsedMessage>) -> Result<bool, RoundError> {
        default_validate_message(self, msg)
    }

    fn store_message(&self, msg: Arc<dyn ParsedMessage>) -> Result<bool, RoundError> {
        let from_key = msg.from().key.clone();

        let mut temp = self.temp.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
        match msg.type_tag() {
            t if t == DGRound1Message1::TYPE_URL => {
                temp.message_store.dg_round1_message1s.insert(from_key, msg);
            }
            t if t == DGRound1Message2::TYPE_URL => {
                temp.message_store.dg_round1_message2s.insert(from_key, msg);
            }
            t if t == DGRound2Message1::TYPE_URL => {
                temp.message_store.dg_round2_message1s.insert(from_key, msg);
            }
            t if t == DGRound2Message2::TYPE_URL => {
                temp.message_store.dg_round2_message2s.insert(from_key, msg);
            }
            t if t == DGRound3Message::TYPE_URL => {
                temp.message_store.dg_round3_messages.insert(from_key, msg);
            }
            other => {
                return Err(self.wrap_error(terr!("received message with unknown type tag: {}", other), vec![msg.from().clone()]));
            }
        }
        Ok(true)
    }

    fn first_round(&self) -> Arc<dyn Round> {
        self.base.default_first_round()
    }

    fn wrap_error<E: std::error::Error + Send + Sync + 'static>(&self, error: E, culprits: Vec<PartyID>) -> RoundError {
        self.base.default_wrap_error(error, culprits)
    }

    fn party_id(&self) -> &PartyID {
        self.base.default_party_id()
    }

    fn set_round(&self, round: Arc<dyn Round>) -> Result<(), RoundError> {
        self.base.default_set_round(round)
    }

    fn current_round(&self) -> Option<Arc<dyn Round>> {
        self.base.default_current_round()
    }

    fn advance_round(&self) {
        self.base.default_advance_round()
    }
}

impl LocalParty {
    /// Parses raw wire bytes plus out-of-band routing metadata into a
    /// `ParsedMessage` and feeds it through `update`.
    pub fn update_from_bytes(
        &self,
        wire_bytes: Vec<u8>,
        type_tag: String,
        from: PartyID,
        to: Option<PartyID>,
    ) -> Result<bool, RoundError> {
        let routing = match to {
            Some(to_party) => MessageRoutingInfo::point_to_point(from, to_party),
            None => MessageRoutingInfo::broadcast(from),
        };
        let parsed = ParsedMessageImpl::from_wire(routing, type_tag, wire_bytes);
        self.update(Arc::new(parsed))
    }
}
