// Concurrent verification of the round-3 Paillier correctness proofs.

use crate::{
    crypto::{ecpoint::K256Point, paillier::PaillierProof, paillier::PublicKey as PaillierPk},
    tss::party_id::PartyID,
};
use k256::Secp256k1;
use std::sync::mpsc::{channel, Receiver, Sender};
use threadpool::ThreadPool;
use log::debug;

/// Everything needed to verify one peer's round-3 Paillier proof.
#[derive(Clone)]
pub struct PaillierProofVerifierContext {
    pub paillier_pk: PaillierPk,
    pub proof: PaillierProof,
    pub associated_party_id: PartyID,
    pub ecdsa_pub: K256Point,
}

pub struct PaillierProofVerificationResult {
    pub is_valid: bool,
    pub party_id: PartyID,
}

pub struct PaillierProofVerifier {
    pool: ThreadPool,
    sender: Sender<PaillierProofVerificationResult>,
    receiver: Receiver<PaillierProofVerificationResult>,
}

impl PaillierProofVerifier {
    pub fn new(concurrency: usize) -> Self {
        let (sender, receiver) = channel();
        let pool = ThreadPool::new(concurrency.max(1));
        Self { pool, sender, receiver }
    }

    pub fn verify_paillier_proof(&self, context: PaillierProofVerifierContext) {
        let sender_clone = self.sender.clone();
        self.pool.execute(move || {
            debug!(target: "tss-lib", party_id = ?context.associated_party_id, "verifying Paillier proof");
            let is_valid = context
                .proof
                .verify::<Secp256k1>(&context.paillier_pk.n, &context.associated_party_id.key, &context.ecdsa_pub)
                .unwrap_or(false);

            let result = PaillierProofVerificationResult { is_valid, party_id: context.associated_party_id };
            if sender_clone.send(result).is_err() {
                log::error!("failed to send Paillier verification result: receiver dropped");
            }
        });
    }

    pub fn collect_results(&self, expected_count: usize) -> Vec<PaillierProofVerificationResult> {
        self.pool.join();
        let results: Vec<_> = self.receiver.try_iter().collect();
        if results.len() != expected_count {
            log::error!(
                target: "tss-lib",
                expected = expected_count,
                actual = results.len(),
                "Paillier proof verification result count mismatch"
            );
        }
        results
    }
}
