// Concurrent verification of a peer's VSS share, ModProof and FacProof,
// run once per peer during round 3.

use crate::{
    crypto::{
        commitments::HashCommitDecommit,
        ecpoint::{un_flatten_ec_points, K256Point},
        facproof::ProofFac,
        modproof::ProofMod,
        paillier::PublicKey as PaillierPk,
        vss::{Share as VssShare, VerificationVector},
    },
    terr,
    tss::party_id::PartyID,
};
use k256::Secp256k1;
use num_bigint_dig::BigInt;
use std::sync::mpsc::{channel, Receiver, Sender};
use threadpool::ThreadPool;
use log::debug;

/// Everything needed to verify one peer's contribution from round 2.
#[derive(Clone)]
pub struct VssVerifyContext {
    pub party_index: usize,
    pub commitment_c_j: BigInt,
    pub decommitment_d_j: Vec<BigInt>,
    pub mod_proof: ProofMod,
    pub fac_proof: ProofFac,
    pub received_vss_share_ij: VssShare,
    pub paillier_pk_j: PaillierPk,
    pub n_tilde_j: BigInt,
    pub h1_j: BigInt,
    pub h2_j: BigInt,
    pub context_j: Vec<u8>,
    pub no_proof_mod: bool,
    pub no_proof_fac: bool,
}

/// Outcome of verifying one peer, including the decommitted VSS points (used
/// by the caller to accumulate the combined verification vector).
pub struct VssVerificationResult {
    pub party_index: usize,
    pub vss_points: Option<Vec<K256Point>>,
    pub error_reason: Option<String>,
}

impl VssVerificationResult {
    pub fn is_valid(&self) -> bool {
        self.error_reason.is_none() && self.vss_points.is_some()
    }
}

struct VssVerifier {
    pool: ThreadPool,
    sender: Sender<VssVerificationResult>,
    receiver: Receiver<VssVerificationResult>,
}

impl VssVerifier {
    fn new(concurrency: usize) -> Self {
        let (sender, receiver) = channel();
        let pool = ThreadPool::new(concurrency.max(1));
        Self { pool, sender, receiver }
    }

    fn verify(&self, context: VssVerifyContext, curve_order: BigInt, threshold: usize, verifier_party_id: PartyID) {
        let sender_clone = self.sender.clone();
        self.pool.execute(move || {
            let party_idx = context.party_index;
            debug!(target: "tss-lib", verifier_id = ?verifier_party_id, target_party_idx = party_idx, "verifying VSS share and proofs");

            let mut error_reason: Option<String> = None;
            let mut vss_points_result: Option<Vec<K256Point>> = None;

            let commit_decommit = HashCommitDecommit { c: context.commitment_c_j.clone(), d: context.decommitment_d_j.clone() };
            let (ok, flat_coords) = commit_decommit.decommit();
            if !ok {
                error_reason = Some("VSS decommitment failed".to_string());
            } else {
                match un_flatten_ec_points::<Secp256k1>(&flat_coords) {
                    Ok(points) => vss_points_result = Some(points),
                    Err(e) => error_reason = Some(format!("failed to un-flatten VSS commitments: {}", e)),
                }
            }

            if error_reason.is_none() {
                let vss_points = vss_points_result.as_ref().unwrap();

                if !context.no_proof_mod && !context.mod_proof.verify(&context.context_j, &context.paillier_pk_j.n) {
                    error_reason = Some("ModProof verification failed".to_string());
                } else if context.no_proof_mod {
                    debug!(target: "tss-lib", verifier_id = ?verifier_party_id, target_party_idx = party_idx, "skipped ModProof verification");
                }

                if error_reason.is_none() {
                    let verification_vector = VerificationVector { vector: vss_points.clone() };
                    if !context.received_vss_share_ij.verify(&curve_order, &verification_vector) {
                        error_reason = Some("VSS share verification failed".to_string());
                    }
                }

                if error_reason.is_none() && !context.no_proof_fac {
                    if !context.fac_proof.verify(
                        &context.context_j,
                        &curve_order,
                        &context.paillier_pk_j.n,
                        &context.n_tilde_j,
                        &context.h1_j,
                        &context.h2_j,
                    ) {
                        error_reason = Some("FacProof verification failed".to_string());
                    }
                } else if error_reason.is_none() {
                    debug!(target: "tss-lib", verifier_id = ?verifier_party_id, target_party_idx = party_idx, "skipped FacProof verification");
                }
            }

            let result = VssVerificationResult {
                party_index: party_idx,
                vss_points: if error_reason.is_none() { vss_points_result } else { None },
                error_reason,
            };
            if sender_clone.send(result).is_err() {
                log::error!("failed to send VSS verification result for party {}: receiver dropped", party_idx);
            }
        });
    }

    fn collect_results(&self, expected_count: usize) -> Vec<VssVerificationResult> {
        self.pool.join();
        let results: Vec<_> = self.receiver.try_iter().collect();
        if results.len() != expected_count {
            log::error!(
                target: "tss-lib",
                expected = expected_count,
                actual = results.len(),
                "VSS verification result count mismatch"
            );
        }
        results
    }
}

/// Verifies every peer's VSS share, ModProof and FacProof concurrently.
pub fn verify_vss_share_and_proofs(
    contexts: Vec<VssVerifyContext>,
    curve_order: BigInt,
    threshold: usize,
    verifier_party_id: PartyID,
    concurrency: usize,
) -> Result<Vec<VssVerificationResult>, std::io::Error> {
    let verifier = VssVerifier::new(concurrency);
    let expected_count = contexts.len();
    for context in contexts {
        verifier.verify(context, curve_order.clone(), threshold, verifier_party_id.clone());
    }
    let results = verifier.collect_results(expected_count);
    if results.len() != expected_count {
        return Err(terr!(
            "VSS verification result count mismatch: expected {}, got {}",
            expected_count,
            results.len()
        ));
    }
    Ok(results)
}
