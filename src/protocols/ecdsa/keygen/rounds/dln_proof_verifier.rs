// Concurrent verification of the DLN proofs carried in round-1 messages.
// Mirrors tss-lib-go's dlnproof verification goroutine pool.

use crate::{
    protocols::ecdsa::keygen::messages::KGRound1Message,
    terr,
    tss::party_id::PartyID,
};
use std::sync::mpsc::{channel, Receiver, Sender};
use threadpool::ThreadPool;
use log::debug;

/// Context needed to verify a single party's pair of DLN proofs.
#[derive(Clone)]
pub struct DlnProofVerifierContext {
    pub r1_msg: KGRound1Message,
    pub from_party_id: PartyID,
}

impl DlnProofVerifierContext {
    pub fn new(r1_msg: KGRound1Message, from_party_id: PartyID) -> Self {
        Self { r1_msg, from_party_id }
    }
}

/// Result of verifying one party's DLN proofs.
pub struct DlnProofVerificationResult {
    pub proof1_valid: bool,
    pub proof2_valid: bool,
    pub culprit: PartyID,
}

struct DlnProofVerifier {
    pool: ThreadPool,
    sender: Sender<DlnProofVerificationResult>,
    receiver: Receiver<DlnProofVerificationResult>,
}

impl DlnProofVerifier {
    fn new(concurrency: usize) -> Self {
        let (sender, receiver) = channel();
        let pool = ThreadPool::new(concurrency.max(1));
        Self { pool, sender, receiver }
    }

    fn verify(&self, context: DlnProofVerifierContext) {
        let sender_clone = self.sender.clone();
        self.pool.execute(move || {
            debug!(target: "tss-lib", party_id = ?context.from_party_id, "verifying DLN proofs");

            let h1 = &context.r1_msg.h1;
            let h2 = &context.r1_msg.h2;
            let ntilde = &context.r1_msg.ntilde;

            let proof1_valid = context.r1_msg.dln_proof_1.verify(h1, h2, ntilde);
            let proof2_valid = context.r1_msg.dln_proof_2.verify(h2, h1, ntilde);

            let result = DlnProofVerificationResult { proof1_valid, proof2_valid, culprit: context.from_party_id };
            if sender_clone.send(result).is_err() {
                log::error!("failed to send DLN verification result: receiver dropped");
            }
        });
    }

    fn collect_results(&self, expected_count: usize) -> Vec<DlnProofVerificationResult> {
        self.pool.join();
        let results: Vec<_> = self.receiver.try_iter().collect();
        if results.len() != expected_count {
            log::error!(
                target: "tss-lib",
                expected = expected_count,
                actual = results.len(),
                "DLN verification result count mismatch"
            );
        }
        results
    }
}

/// Verifies every context's pair of DLN proofs concurrently, using up to
/// `concurrency` worker threads.
pub fn verify_dln_proofs(
    contexts: &[DlnProofVerifierContext],
    concurrency: usize,
) -> Result<Vec<DlnProofVerificationResult>, std::io::Error> {
    let verifier = DlnProofVerifier::new(concurrency);
    for context in contexts {
        verifier.verify(context.clone());
    }
    let results = verifier.collect_results(contexts.len());
    if results.len() != contexts.len() {
        return Err(terr!(
            "DLN verification result count mismatch: expected {}, got {}",
            contexts.len(),
            results.len()
        ));
    }
    Ok(results)
}
