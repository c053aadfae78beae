// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Translation of tss-lib-go/ecdsa/signing/local_party.go

pub mod messages;
pub mod rounds;
pub mod types;

use crate::{
    protocols::ecdsa::{
        keygen::types::LocalPartySaveData,
        signing::{
            messages::{
                SignRound1Message1, SignRound1Message2, SignRound2Message, SignRound3Message, SignRound4Message, SignRound5Message,
                SignRound6Message, SignRound7Message, SignRound8Message, SignRound9Message,
            },
            rounds::round_1::Round1,
            types::{LocalTempData, SignatureData},
        },
    },
    terr,
    tss::{
        error::RoundError,
        message::{MessageRoutingInfo, ParsedMessage, ParsedMessageImpl, TssMessage},
        party::{base_start, base_update, default_validate_message, BaseParty, Party},
        party_id::PartyID,
        params::Parameters,
        round::Round,
    },
};

use num_bigint_dig::BigInt;
use std::fmt;
use std::sync::{mpsc::Sender, Arc, Mutex};

const TASK_NAME: &str = "ecdsa-signing";

/// A single participant running the ten-round ECDSA signing protocol (nine
/// protocol rounds plus a final, message-less round that assembles and
/// verifies the signature).
#[derive(Debug)]
pub struct LocalParty {
    base: BaseParty,
    params: Arc<Parameters>,
    keys: Arc<LocalPartySaveData>,
    m: BigInt,
    temp: Arc<Mutex<LocalTempData>>,
    out_ch: Sender<Box<dyn TssMessage + Send>>,
    end_ch: Sender<SignatureData>,
}

impl LocalParty {
    pub fn new(
        params: Arc<Parameters>,
        keys: Arc<LocalPartySaveData>,
        m: BigInt,
        out_ch: Sender<Box<dyn TssMessage + Send>>,
        end_ch: Sender<SignatureData>,
    ) -> Arc<Self> {
        let party_count = params.party_count();
        let temp = Arc::new(Mutex::new(LocalTempData::new(party_count)));
        let party_id = params.party_id().as_ref().clone();

        let params_for_round = params.clone();
        let keys_for_round = keys.clone();
        let m_for_round = m.clone();
        let temp_for_round = temp.clone();
        let out_ch_for_round = out_ch.clone();
        let end_ch_for_round = end_ch.clone();

        let first_round_provider = Arc::new(move || -> Arc<dyn Round> {
            Arc::new(Round1::new(
                params_for_round.clone(),
                keys_for_round.clone(),
                m_for_round.clone(),
                temp_for_round.clone(),
                out_ch_for_round.clone(),
                end_ch_for_round.clone(),
            ))
        });

        Arc::new(LocalParty {
            base: BaseParty::new(party_id, first_round_provider),
            params,
            keys,
            m,
            temp,
            out_ch,
            end_ch,
        })
    }

    pub fn params(&self) -> &Arc<Parameters> {
        &self.params
    }

    pub fn message(&self) -> &BigInt {
        &self.m
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
        let from_index = msg.from().index;
        if from_index < 0 || from_index as usize >= self.params.party_count() {
            return Err(self.wrap_error(terr!("received message from party with invalid index: {}", from_index), vec![msg.from().clone()]));
        }

        let mut temp = self.temp.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
        match msg.type_tag() {
            t if t == SignRound1Message1::TYPE_URL => {
                temp.message_store.sign_round1_message1s.insert(from_index, msg);
            }
            t if t == SignRound1Message2::TYPE_URL => {
                temp.message_store.sign_round1_message2s.insert(from_index, msg);
            }
            t if t == SignRound2Message::TYPE_URL => {
                temp.message_store.sign_round2_messages.insert(from_index, msg);
            }
            t if t == SignRound3Message::TYPE_URL => {
                temp.message_store.sign_round3_messages.insert(from_index, msg);
            }
            t if t == SignRound4Message::TYPE_URL => {
                temp.message_store.sign_round4_messages.insert(from_index, msg);
            }
            t if t == SignRound5Message::TYPE_URL => {
                temp.message_store.sign_round5_messages.insert(from_index, msg);
            }
            t if t == SignRound6Message::TYPE_URL => {
                temp.message_store.sign_round6_messages.insert(from_index, msg);
            }
            t if t == SignRound7Message::TYPE_URL => {
                temp.message_store.sign_round7_messages.insert(from_index, msg);
            }
            t if t == SignRound8Message::TYPE_URL => {
                temp.message_store.sign_round8_messages.insert(from_index, msg);
            }
            t if t == SignRound9Message::TYPE_URL => {
                temp.message_store.sign_round9_messages.insert(from_index, msg);
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
