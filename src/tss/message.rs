// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Translation of tss-lib-go/tss/message.go
//
// The original uses protobuf `Any` to carry arbitrary round-message payloads
// over the wire. This crate instead tags each message with a `&'static str`
// type name and carries the payload as JSON bytes, keeping the same
// "routing info + opaque content" shape without depending on a protobuf
// toolchain.

use crate::tss::party_id::PartyID;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MessageError {
    #[error("failed to encode message content: {0}")]
    Encode(#[from] serde_json::Error),
}

/// The content of a single TSS round message.
pub trait MessageContent: Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static {
    /// Performs basic validation on the message content.
    fn validate_basic(&self) -> bool;
    /// A stable type tag identifying this message's concrete Rust type.
    fn message_type(&self) -> &'static str;
}

/// Routing information and metadata for a TSS message.
pub trait MessageRouting {
    fn from(&self) -> &PartyID;
    fn to(&self) -> Option<&[PartyID]>; // None means broadcast
    fn is_broadcast(&self) -> bool;
    fn is_to_old_committee(&self) -> bool;
    fn is_to_old_and_new_committees(&self) -> bool;
}

/// A full TSS message, including routing and content.
pub trait TssMessage: MessageRouting + fmt::Debug + Send + Sync + 'static {
    /// Returns the type tag of the inner message content.
    fn type_tag(&self) -> &str;

    /// Returns the fully encoded bytes ready for wire transport, plus routing info.
    fn wire_bytes(&self) -> Result<(Vec<u8>, MessageRoutingInfo), MessageError>;
}

/// A message that has been received and parsed off the wire. Kept
/// object-safe (no generic methods) so it can be passed around as
/// `Arc<dyn ParsedMessage>`; use [`decode_content`] to recover the typed
/// payload.
pub trait ParsedMessage: TssMessage {
    /// Validates the basic structure of the parsed message.
    fn validate_basic(&self) -> bool;
}

/// Decodes a parsed message's payload into a concrete `MessageContent` type.
/// The caller is expected to know which type a message's `type_tag` maps to,
/// mirroring upstream's comment that type-specific validation only makes
/// sense once the content has been decoded.
pub fn decode_content<T: MessageContent>(msg: &dyn ParsedMessage) -> Result<T, MessageError> {
    let (bytes, _routing) = msg.wire_bytes()?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Concrete routing information.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRoutingInfo {
    pub from: PartyID,
    pub to: Option<Vec<PartyID>>, // None = broadcast
    pub is_broadcast: bool,
    pub is_to_old_committee: bool,
    pub is_to_old_and_new_committees: bool,
}

impl MessageRoutingInfo {
    pub fn broadcast(from: PartyID) -> Self {
        Self {
            from,
            to: None,
            is_broadcast: true,
            is_to_old_committee: false,
            is_to_old_and_new_committees: false,
        }
    }

    pub fn point_to_point(from: PartyID, to: PartyID) -> Self {
        Self {
            from,
            to: Some(vec![to]),
            is_broadcast: false,
            is_to_old_committee: false,
            is_to_old_and_new_committees: false,
        }
    }
}

impl MessageRouting for MessageRoutingInfo {
    fn from(&self) -> &PartyID {
        &self.from
    }
    fn to(&self) -> Option<&[PartyID]> {
        self.to.as_deref()
    }
    fn is_broadcast(&self) -> bool {
        self.is_broadcast
    }
    fn is_to_old_committee(&self) -> bool {
        self.is_to_old_committee
    }
    fn is_to_old_and_new_committees(&self) -> bool {
        self.is_to_old_and_new_committees
    }
}

/// Concrete implementation of a parsed TSS message: routing info plus an
/// opaque, type-tagged JSON payload.
#[derive(Debug, Clone)]
pub struct ParsedMessageImpl {
    routing: MessageRoutingInfo,
    type_tag: String,
    payload: Vec<u8>,
}

impl ParsedMessageImpl {
    /// Builds a message ready to send by encoding `content`.
    pub fn from_content<C: MessageContent>(routing: MessageRoutingInfo, content: &C) -> Result<Self, MessageError> {
        let payload = serde_json::to_vec(content)?;
        Ok(Self { routing, type_tag: content.message_type().to_string(), payload })
    }

    /// Reconstructs a message from raw wire bytes and its routing info.
    /// `type_tag` must be supplied out of band (e.g. via a message envelope).
    pub fn from_wire(routing: MessageRoutingInfo, type_tag: String, payload: Vec<u8>) -> Self {
        Self { routing, type_tag, payload }
    }
}

impl MessageRouting for ParsedMessageImpl {
    fn from(&self) -> &PartyID {
        self.routing.from()
    }
    fn to(&self) -> Option<&[PartyID]> {
        self.routing.to()
    }
    fn is_broadcast(&self) -> bool {
        self.routing.is_broadcast()
    }
    fn is_to_old_committee(&self) -> bool {
        self.routing.is_to_old_committee()
    }
    fn is_to_old_and_new_committees(&self) -> bool {
        self.routing.is_to_old_and_new_committees()
    }
}

impl TssMessage for ParsedMessageImpl {
    fn type_tag(&self) -> &str {
        &self.type_tag
    }

    fn wire_bytes(&self) -> Result<(Vec<u8>, MessageRoutingInfo), MessageError> {
        Ok((self.payload.clone(), self.routing.clone()))
    }
}

impl ParsedMessage for ParsedMessageImpl {
    fn validate_basic(&self) -> bool {
        !self.payload.is_empty()
    }
}

impl fmt::Display for MessageRoutingInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let to_str = match &self.to {
            Some(parties) => format!("{:?}", parties),
            None => "all".to_string(),
        };
        write!(f, "From: {}, To: {}", self.from, to_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint_dig::BigInt;

    #[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
    struct TestContent {
        value: u32,
    }

    impl MessageContent for TestContent {
        fn validate_basic(&self) -> bool {
            true
        }
        fn message_type(&self) -> &'static str {
            "TestContent"
        }
    }

    #[test]
    fn round_trips_content_through_wire_bytes() {
        let from = PartyID::new("a".into(), "A".into(), BigInt::from(1));
        let routing = MessageRoutingInfo::broadcast(from);
        let msg = ParsedMessageImpl::from_content(routing.clone(), &TestContent { value: 42 }).unwrap();
        let (bytes, got_routing) = msg.wire_bytes().unwrap();
        assert_eq!(got_routing, routing);
        let decoded: TestContent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded.value, 42);
    }

    #[test]
    fn broadcast_routing_has_no_recipients() {
        let from = PartyID::new("a".into(), "A".into(), BigInt::from(1));
        let routing = MessageRoutingInfo::broadcast(from);
        assert!(routing.is_broadcast());
        assert!(routing.to().is_none());
    }
}
