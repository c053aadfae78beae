// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Translation of tss-lib-go/tss/party.go

use crate::tss::{
    message::ParsedMessage,
    party_id::PartyID,
    round::Round,
    error::{RoundErr, RoundError},
};

use log::{debug, error, info};
use std::{
    error::Error as StdError,
    fmt::Debug,
    sync::{Arc, RwLock},
};

/// A participant (party) in a TSS protocol round.
pub trait Party: Send + Sync + Debug {
    /// Starts the first round of the protocol for this party.
    fn start(&self) -> Result<(), RoundError>;

    /// Updates the party state from a parsed message (received over the wire or locally).
    fn update(&self, msg: Arc<dyn ParsedMessage>) -> Result<bool, RoundError>;

    /// Returns true if the party is currently executing a round.
    fn is_running(&self) -> bool;

    /// Returns the list of parties that this party is currently waiting for messages from.
    fn waiting_for(&self) -> Vec<PartyID>;

    /// Validates an incoming message.
    fn validate_message(&self, msg: &Arc<dyn ParsedMessage>) -> Result<bool, RoundError>;

    /// Stores a validated message, possibly in the current round's state.
    fn store_message(&self, msg: Arc<dyn ParsedMessage>) -> Result<bool, RoundError>;

    /// Returns the initial round for this protocol execution.
    fn first_round(&self) -> Arc<dyn Round>;

    /// Wraps a standard error into a `RoundError`, associating it with culprits.
    fn wrap_error<E: StdError + Send + Sync + 'static>(&self, error: E, culprits: Vec<PartyID>) -> RoundError;

    /// Returns the `PartyID` of this party.
    fn party_id(&self) -> &PartyID;

    /// Sets the current round for the party. Errors if a round is already set.
    fn set_round(&self, round: Arc<dyn Round>) -> Result<(), RoundError>;

    /// Gets the current round.
    fn current_round(&self) -> Option<Arc<dyn Round>>;

    /// Advances to the next round.
    fn advance_round(&self);
}

/// A base implementation of the `Party` trait, holding the common
/// current-round bookkeeping shared by all protocol-specific party types.
#[derive(Debug)]
pub struct BaseParty {
    current_round: RwLock<Option<Arc<dyn Round>>>,
    first_round_provider: Arc<dyn Fn() -> Arc<dyn Round> + Send + Sync>,
    party_id: PartyID,
}

impl BaseParty {
    pub fn new(party_id: PartyID, first_round_provider: Arc<dyn Fn() -> Arc<dyn Round> + Send + Sync>) -> Self {
        Self {
            current_round: RwLock::new(None),
            first_round_provider,
            party_id,
        }
    }

    fn get_current_round_read(&self) -> Option<Arc<dyn Round>> {
        self.current_round.read().unwrap().clone()
    }

    pub fn default_is_running(&self) -> bool {
        self.get_current_round_read().is_some()
    }

    pub fn default_waiting_for(&self) -> Vec<PartyID> {
        match self.get_current_round_read() {
            Some(round) => round.waiting_for(),
            None => Vec::new(),
        }
    }

    pub fn default_wrap_error<E: StdError + Send + Sync + 'static>(
        &self,
        error: E,
        culprits: Vec<PartyID>,
    ) -> RoundError {
        match self.get_current_round_read() {
            Some(round) => round.wrap_error(error, culprits),
            None => RoundError::new(RoundErr::General(Box::new(error)), String::new(), -1, None, culprits),
        }
    }

    pub fn default_set_round(&self, round: Arc<dyn Round>) -> Result<(), RoundError> {
        let mut guard = self.current_round.write().unwrap();
        if guard.is_some() {
            return Err(self.default_wrap_error(
                std::io::Error::new(std::io::ErrorKind::Other, "a round is already set on this party"),
                vec![],
            ));
        }
        *guard = Some(round);
        Ok(())
    }

    pub fn default_current_round(&self) -> Option<Arc<dyn Round>> {
        self.get_current_round_read()
    }

    pub fn default_advance_round(&self) {
        let mut guard = self.current_round.write().unwrap();
        if let Some(current) = guard.take() {
            *guard = current.next_round();
        } else {
            error!(target: "tss", "party {} attempted to advance round when no round was set", self.party_id);
        }
    }

    pub fn default_party_id(&self) -> &PartyID {
        &self.party_id
    }

    pub fn default_first_round(&self) -> Arc<dyn Round> {
        (self.first_round_provider)()
    }
}

fn invalid_message<S: Into<String>>(msg: S) -> RoundErr {
    RoundErr::Validation(msg.into())
}

/// Default validation shared by all `Party` implementations: checks the
/// sender's `PartyID` and the message's own structural validity.
pub fn default_validate_message(
    party: &(impl Party + ?Sized),
    msg: &Arc<dyn ParsedMessage>,
) -> Result<bool, RoundError> {
    if !msg.from().validate_basic() {
        return Err(RoundError::new(
            invalid_message(format!("received msg with invalid sender: {:?}", msg.from())),
            String::new(),
            -1,
            None,
            vec![],
        ));
    }
    if !msg.validate_basic() {
        let culprit = msg.from().clone();
        return Err(RoundError::new(
            invalid_message("message failed validate_basic"),
            String::new(),
            -1,
            None,
            vec![culprit],
        ));
    }
    let _ = party;
    Ok(true)
}

/// Shared `Party::start` logic: validates the party's own ID, installs the
/// first round, and kicks it off.
pub fn base_start(party: &(impl Party + ?Sized), task_name: &str) -> Result<(), RoundError> {
    if !party.party_id().validate_basic() {
        return Err(party.wrap_error(
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("could not start: invalid PartyID {:?}", party.party_id()),
            ),
            vec![],
        ));
    }
    if party.is_running() {
        return Err(party.wrap_error(
            std::io::Error::new(std::io::ErrorKind::Other, "could not start: party is already running"),
            vec![],
        ));
    }

    let first_round = party.first_round();
    party.set_round(first_round.clone())?;

    info!(target: "tss", "party {} task {} starting round 1", party.party_id(), task_name);
    let result = first_round.start();
    info!(target: "tss", "party {} task {} finished initial round-1 processing", party.party_id(), task_name);
    result
}

/// Shared `Party::update` logic: stores the incoming message, then drives
/// the current round forward (and into subsequent rounds) as far as
/// already-stored messages allow.
pub fn base_update(
    party: &(impl Party + ?Sized),
    msg: Arc<dyn ParsedMessage>,
    task_name: &str,
) -> Result<bool, RoundError> {
    party.validate_message(&msg)?;
    debug!(target: "tss", "party {} task {} received message from {}", party.party_id(), task_name, msg.from());
    party.store_message(msg.clone())?;

    loop {
        let Some(current_round) = party.current_round() else {
            debug!(target: "tss", "party {} task {} update called but not running", party.party_id(), task_name);
            return Ok(true);
        };
        let round_num = current_round.round_number();
        debug!(target: "tss", "party {} task {} round {} update", party.party_id(), task_name, round_num);

        current_round.update()?;

        if !current_round.can_proceed() {
            debug!(target: "tss", "party {} task {} round {} waiting for more messages", party.party_id(), task_name, round_num);
            return Ok(true);
        }

        info!(target: "tss", "party {} task {} round {} finished, advancing", party.party_id(), task_name, round_num);
        party.advance_round();

        match party.current_round() {
            Some(next_round) => {
                let next_round_num = next_round.round_number();
                info!(target: "tss", "party {} task {} starting round {}", party.party_id(), task_name, next_round_num);
                next_round.start()?;
            }
            None => {
                info!(target: "tss", "party {} task {} protocol finished", party.party_id(), task_name);
                return Ok(true);
            }
        }
    }
}
