//! The agent state machine (spec §3, §4.6-§4.8): budget checker, the
//! planner/executor/reflector/responder graph, and the runner that drives
//! it to completion or streams its events.

pub mod budget;
pub mod checkpoint;
pub mod deps;
pub mod events;
pub mod nodes;
pub mod runner;
pub mod state;

pub use budget::BudgetChecker;
pub use checkpoint::{Checkpointer, InMemoryCheckpointer};
pub use deps::NodeDeps;
pub use events::AgentEvent;
pub use runner::{AgentGraphConfig, AgentGraphRunner, RunOutcome};
pub use state::{AgentState, BudgetConfig, MemoryContextItem, NextAction};
