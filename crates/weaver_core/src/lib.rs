//! Weaver Core - architecture pattern evolution engine.
//!
//! Evolves a JSON "architecture pattern" toward a user intent: a text
//! backend proposes one mutation at a time, the applier turns it into a
//! deterministic state transition, the scorer ranks the outcome, and the
//! orchestrator explores several independent variants before picking a
//! winner. Completed runs are persisted to a local history store.
//!
//! The text backend is a collaborator, not a dependency: everything here
//! works against the [`llm::LlmClient`] trait, and every backend failure
//! degrades to a fallback instead of surfacing.

pub mod applier;
pub mod config;
pub mod history;
pub mod llm;
pub mod orchestrator;
pub mod pattern;
pub mod prompts;
pub mod proposal;
pub mod proposer;
pub mod reflection;
pub mod scoring;
pub mod variant;

pub use config::WeaverConfig;
pub use history::{RunHistory, RunRecord};
pub use llm::{HttpLlmClient, LlmClient, LlmConfig, LlmError};
pub use orchestrator::{EvolutionEngine, EvolveOptions, RunResult};
pub use pattern::{Pattern, PatternError};
pub use proposal::MutationProposal;
pub use reflection::Reflection;
pub use variant::{Step, VariantResult};
