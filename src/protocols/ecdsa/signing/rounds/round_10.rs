// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Finalization round: no wire counterpart in the original protocol. Mirrors
// keygen's round 4 -- consumes the last round's broadcasts, does not itself
// send a protocol message, and delivers the final result on `end_ch`.

use crate::{
    common::int::ModInt,
    crypto::ecpoint::ECPoint,
    protocols::ecdsa::{
        keygen::{rounds::BaseRound, types::LocalPartySaveData},
        signing::{
            messages::SignRound9Message,
            types::{LocalTempData, SignatureData},
        },
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

use k256::Secp256k1;
use log::info;
use num_bigint_dig::BigInt;
use std::sync::{mpsc::Sender, Arc, Mutex};

#[derive(Debug)]
pub struct Round10 {
    base: BaseRound,
    params: Arc<Parameters>,
    keys: Arc<LocalPartySaveData>,
    m: BigInt,
    save: Arc<Mutex<LocalTempData>>,
    out_ch: Sender<Box<dyn TssMessage + Send>>,
    end_ch: Sender<SignatureData>,
}

impl Round10 {
    pub fn new(
        params: Arc<Parameters>,
        keys: Arc<LocalPartySaveData>,
        m: BigInt,
        save: Arc<Mutex<LocalTempData>>,
        out_ch: Sender<Box<dyn TssMessage + Send>>,
        end_ch: Sender<SignatureData>,
    ) -> Self {
        let base = BaseRound::new(10, params.party_count());
        Self { base, params, keys, m, save, out_ch, end_ch }
    }
}

fn bigint_to_32_bytes(x: &BigInt) -> Vec<u8> {
    let (_, mut bytes) = x.to_bytes_be();
    if bytes.len() < 32 {
        let mut padded = vec![0u8; 32 - bytes.len()];
        padded.append(&mut bytes);
        padded
    } else {
        bytes.split_off(bytes.len() - 32)
    }
}

impl Round for Round10 {
    fn params(&self) -> &Parameters {
        &self.params
    }

    fn round_number(&self) -> i32 {
        self.base.round_number()
    }

    fn start(&self) -> Result<(), RoundError> {
        if self.base.started() {
            return Err(self.wrap_error(terr!("round 10 already started"), vec![]));
        }
        self.base.set_started();
        self.base.reset_ok();

        let current_party_id = self.params.party_id();
        let q = self.params.ec().order();
        let mod_q = ModInt::new(q.clone());

        info!(target: "tss-lib", party_id = ?current_party_id, "signing round 10 starting: aggregating s_i, assembling signature");

        let round9_messages = {
            let save_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            save_lock.message_store.sign_round9_messages.clone()
        };

        let mut s = BigInt::from(0);
        for (j, party_j) in self.params.parties().party_ids().iter().enumerate() {
            let r9msg_arc = round9_messages
                .get(&(j as i32))
                .ok_or_else(|| self.wrap_error(terr!("missing round 9 message from party {}", j), vec![party_j.clone()]))?;
            let r9msg: SignRound9Message = decode_content(r9msg_arc.as_ref()).map_err(|e| self.wrap_error(e, vec![party_j.clone()]))?;
            s = mod_q.add(&s, &r9msg.s_i);
        }

        let r_point = {
            let save_lock = self.save.lock().map_err(|e| self.wrap_error(terr!("failed to lock temp data: {}", e), vec![]))?;
            save_lock.r_point.clone().ok_or_else(|| self.wrap_error(terr!("missing R"), vec![]))?
        };
        let (r_x, r_y) = r_point.coords();
        let r = r_x.modpow(&BigInt::from(1), &q);

        let ecdsa_pub = self
            .keys
            .ecdsa_pub
            .clone()
            .ok_or_else(|| self.wrap_error(terr!("missing ECDSA public key"), vec![current_party_id.as_ref().clone()]))?;

        let s_inv = mod_q
            .mod_inverse(&s)
            .ok_or_else(|| self.wrap_error(terr!("s has no inverse mod q"), vec![current_party_id.as_ref().clone()]))?;
        let u1 = mod_q.mul(&self.m, &s_inv);
        let u2 = mod_q.mul(&r, &s_inv);
        let check_point = ECPoint::<Secp256k1>::scalar_base_mult(&u1)
            .add(&ecdsa_pub.scalar_mul(&u2))
            .map_err(|e| self.wrap_error(terr!("point addition failed during signature check: {}", e), vec![current_party_id.as_ref().clone()]))?;
        let (check_x, _) = check_point.coords();
        if check_x.modpow(&BigInt::from(1), &q) != r {
            return Err(self.wrap_error(terr!("assembled signature failed verification against the ECDSA public key"), vec![]));
        }

        let recovery_id: u8 = (if r_y.bit(0) { 1 } else { 0 }) | (if r_x >= q { 2 } else { 0 });

        let mut signature = bigint_to_32_bytes(&r);
        signature.extend(bigint_to_32_bytes(&s));

        let sig_data = SignatureData {
            r,
            s,
            signature,
            recovery_id,
            m: self.m.clone(),
        };

        info!(target: "tss-lib", party_id = ?current_party_id, "signing round 10 finished successfully, sending result");
        self.end_ch.send(sig_data).map_err(|e| self.wrap_error(terr!("failed to send signature data: {}", e), vec![]))?;

        Ok(())
    }

    fn can_accept(&self, _msg: &dyn ParsedMessage) -> bool {
        false
    }

    fn update(&self) -> Result<bool, RoundError> {
        Ok(self.can_proceed())
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
