//! Streamed collaboration events (spec §4.10's `stream_execute`, and the
//! unified event-type union in spec's event-streaming-format note), grounded
//! on `orchestrator.py`'s `stream_execute` yield shapes and
//! `agentflow_graph::AgentEvent`'s tagged-enum convention.

use agentflow_graph::AgentEvent;
use serde::Serialize;

use crate::types::SpecialistType;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CollaborationEvent {
    Routing { specialist: SpecialistType, confidence: f64, reasoning: String },
    SpecialistStart { specialist: SpecialistType, specialist_name: String, step_number: u32 },
    /// A node-level event from the active specialist's single-agent graph,
    /// tagged with which specialist produced it.
    Specialist { specialist: SpecialistType, event: AgentEvent },
    Handoff { from_specialist: SpecialistType, to_specialist: SpecialistType, handoff_number: u32 },
    CollaborationComplete { agent_chain: Vec<SpecialistType>, handoff_count: u32, total_duration_ms: f64 },
    Error { error: String, message: String },
}
