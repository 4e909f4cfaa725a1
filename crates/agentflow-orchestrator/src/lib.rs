//! Specialist routing and multi-agent collaboration (spec §4.9-§4.10): a
//! keyword/LLM classifier that picks a specialist, and an orchestrator that
//! runs specialists in sequence, following handoff requests under a shared
//! budget with loop detection.

pub mod events;
pub mod orchestrator;
pub mod router;
pub mod types;

pub use events::CollaborationEvent;
pub use orchestrator::{
    AgentCollaborationConfig, CollaborationErrorType, CollaborationResult, CollaborationStep, MultiAgentOrchestrator,
};
pub use router::{AgentRouter, RoutingDecision, RoutingMethod};
pub use types::{default_specialist_configs, SpecialistConfig, SpecialistType};
