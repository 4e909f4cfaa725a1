//! Optional checkpointing (spec §4.8): persist `AgentState` keyed by an
//! external `thread_id`, committed only between node boundaries so a crash
//! mid-node never leaves a half-written state behind.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::state::AgentState;

#[async_trait]
pub trait Checkpointer: Send + Sync {
    async fn save(&self, thread_id: &str, state: &AgentState);
    async fn load(&self, thread_id: &str) -> Option<AgentState>;
}

/// In-process checkpoint store. Grounded on the teacher's in-memory session
/// store pattern; a durable backend (sqlite, as `checkpoint_db_url` implies
/// in the original) is a natural place to extend this trait, not something
/// this crate needs to ship.
#[derive(Default)]
pub struct InMemoryCheckpointer {
    states: Mutex<HashMap<String, AgentState>>,
}

impl InMemoryCheckpointer {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Checkpointer for InMemoryCheckpointer {
    async fn save(&self, thread_id: &str, state: &AgentState) {
        self.states.lock().unwrap().insert(thread_id.to_string(), state.clone());
    }

    async fn load(&self, thread_id: &str) -> Option<AgentState> {
        self.states.lock().unwrap().get(thread_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::BudgetConfig;

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let checkpointer = InMemoryCheckpointer::new();
        let state = AgentState::new("hi", Vec::new(), &BudgetConfig::default());
        checkpointer.save("thread-1", &state).await;
        let loaded = checkpointer.load("thread-1").await.unwrap();
        assert_eq!(loaded.user_input, "hi");
    }

    #[tokio::test]
    async fn unknown_thread_returns_none() {
        let checkpointer = InMemoryCheckpointer::new();
        assert!(checkpointer.load("missing").await.is_none());
    }
}
