//! Mutation proposer: prompt the text backend, decode, retry, fall back.
//!
//! `propose` never fails. The backend may be down, may time out, or may
//! answer with prose instead of JSON - after the attempt budget is spent the
//! proposer substitutes a canned mutation so the variant keeps moving.

use crate::llm::LlmClient;
use crate::proposal::{decode_proposal, Learned, MutationProposal};
use crate::prompts;
use crate::variant::{Flavor, Step};
use tracing::{debug, warn};

/// Request-and-decode attempts per step before falling back.
pub const PROPOSAL_ATTEMPTS: u32 = 2;

/// Fixed `learned` text for fallback steps.
pub const FALLBACK_LEARNED: &str = "resilience +0.5, novelty +0.5 (heuristic fallback)";

/// Canned (planned, acted) pairs used when the backend yields nothing
/// usable. The plans name well-known hardening moves so the applier's
/// keyword path still mutates the pattern.
const FALLBACK_PLANS: &[(&str, &str)] = &[
    (
        "Introduce rate limiting at the public edge to absorb abusive traffic",
        "added a rate limiting component at the edge",
    ),
    (
        "Strengthen transport encryption between internal services",
        "enabled encrypted transport between services",
    ),
    (
        "Expand logging and monitoring coverage across components",
        "wired components into central monitoring",
    ),
];

/// The canned proposal for a given step. Rotates through the fallback list
/// so consecutive fallback steps differ.
pub fn fallback_proposal(step_index: usize) -> MutationProposal {
    let (planned, acted) = FALLBACK_PLANS[step_index % FALLBACK_PLANS.len()];
    MutationProposal {
        planned: planned.to_string(),
        acted: acted.to_string(),
        learned: Learned::Text(FALLBACK_LEARNED.to_string()),
        ..MutationProposal::default()
    }
}

/// Turns backend replies into typed proposals.
pub struct Proposer<'a> {
    client: &'a dyn LlmClient,
}

impl<'a> Proposer<'a> {
    pub fn new(client: &'a dyn LlmClient) -> Self {
        Self { client }
    }

    /// Request one mutation for the current pattern state. Infallible: any
    /// request or decode failure is retried, then replaced by a fallback.
    pub fn propose(
        &self,
        summary: &str,
        intent: &str,
        history: &[Step],
        flavor: &Flavor,
    ) -> MutationProposal {
        let prompt = prompts::build_mutation_prompt(summary, intent, history, flavor.bias);

        for attempt in 1..=PROPOSAL_ATTEMPTS {
            match self.client.generate(&prompt, flavor.temperature) {
                Ok(reply) => match decode_proposal(&reply) {
                    Ok(proposal) => {
                        debug!("proposal decoded on attempt {}", attempt);
                        return proposal;
                    }
                    Err(e) => warn!(
                        "proposal decode failed (attempt {}/{}): {}",
                        attempt, PROPOSAL_ATTEMPTS, e
                    ),
                },
                Err(e) => warn!(
                    "backend request failed (attempt {}/{}): {}",
                    attempt, PROPOSAL_ATTEMPTS, e
                ),
            }
        }

        warn!("attempt budget exhausted, using fallback proposal");
        fallback_proposal(history.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{FakeLlmClient, LlmError};
    use crate::variant::flavor_for;

    #[test]
    fn test_propose_decodes_valid_reply() {
        let client = FakeLlmClient::always_text(r#"{"planned": "add cache", "acted": "added"}"#);
        let proposer = Proposer::new(&client);
        let proposal = proposer.propose("s", "intent", &[], &flavor_for(0));
        assert_eq!(proposal.planned, "add cache");
        assert_eq!(client.call_count(), 1);
    }

    #[test]
    fn test_propose_retries_then_succeeds() {
        let client = FakeLlmClient::new(vec![
            Ok("no json here".to_string()),
            Ok(r#"{"planned": "second try"}"#.to_string()),
        ]);
        let proposer = Proposer::new(&client);
        let proposal = proposer.propose("s", "intent", &[], &flavor_for(0));
        assert_eq!(proposal.planned, "second try");
        assert_eq!(client.call_count(), 2);
    }

    #[test]
    fn test_propose_falls_back_after_budget() {
        let client = FakeLlmClient::always_error(LlmError::Timeout(60));
        let proposer = Proposer::new(&client);
        let proposal = proposer.propose("s", "intent", &[], &flavor_for(1));
        assert_eq!(client.call_count(), PROPOSAL_ATTEMPTS as usize);
        assert_eq!(proposal, fallback_proposal(0));
        assert_eq!(proposal.learned.flatten(), FALLBACK_LEARNED);
    }

    #[test]
    fn test_propose_falls_back_on_undecodable_text() {
        let client = FakeLlmClient::always_text("I am sorry, I cannot answer that.");
        let proposer = Proposer::new(&client);
        let proposal = proposer.propose("s", "intent", &[], &flavor_for(0));
        assert_eq!(client.call_count(), PROPOSAL_ATTEMPTS as usize);
        assert_eq!(proposal.learned.flatten(), FALLBACK_LEARNED);
    }

    #[test]
    fn test_fallback_rotation_by_step_index() {
        let first = fallback_proposal(0);
        let second = fallback_proposal(1);
        let wrapped = fallback_proposal(FALLBACK_PLANS.len());
        assert_ne!(first.planned, second.planned);
        assert_eq!(first.planned, wrapped.planned);
    }
}
