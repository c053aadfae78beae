// Translation of tss-lib-go/tss/peer_context.go

use crate::tss::party_id::PartyID;
use std::fmt;

/// Holds the (sorted) set of parties participating in a protocol run.
#[derive(Clone, Debug)]
pub struct PeerContext {
    party_ids: Vec<PartyID>,
}

impl PeerContext {
    pub fn new(party_ids: Vec<PartyID>) -> Self {
        PeerContext { party_ids }
    }

    pub fn party_ids(&self) -> &[PartyID] {
        &self.party_ids
    }

    pub fn len(&self) -> usize {
        self.party_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.party_ids.is_empty()
    }
}

impl fmt::Display for PeerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.party_ids.iter().map(|p| p.to_string()).collect();
        write!(f, "[{}]", names.join(", "))
    }
}
