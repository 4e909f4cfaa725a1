//! Graph nodes (spec §4.7): planner, executor, reflector, responder.

pub mod executor;
pub mod planner;
pub mod reflector;
pub mod responder;
