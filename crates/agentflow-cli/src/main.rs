//! Demonstration CLI (SPEC_FULL.md §16), grounded on
//! `skilllite/src/main.rs`'s `clap::Parser` + `match` dispatch shape.

mod cli;
mod ingest;
mod observability;
mod setup;

use std::collections::HashMap;
use std::sync::Arc;

use agentflow_core::ChatMessage;
use agentflow_graph::{AgentGraphConfig, AgentGraphRunner};
use agentflow_orchestrator::{AgentCollaborationConfig, AgentRouter, MultiAgentOrchestrator, SpecialistType};
use agentflow_tracing::{instrument, MetricsRegistry, SpanKind, Tracer};
use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { prompt, model, temperature } => run_single_agent(&prompt, &model, temperature).await?,
        Commands::Collaborate { prompt } => run_collaboration(&prompt).await?,
        Commands::Ingest { path, priority } => ingest::run(path, priority).await?,
    }

    Ok(())
}

async fn run_single_agent(prompt: &str, model: &str, temperature: f64) -> Result<()> {
    let deps = setup::build_node_deps(model, temperature);
    let runner = AgentGraphRunner::new(AgentGraphConfig::default(), deps, None);

    let tracer = Tracer::new();
    let span_builder = tracer.start_span("agent_execution", SpanKind::Internal, None, None);
    let started = std::time::Instant::now();

    let outcome = runner.execute(prompt, Vec::<ChatMessage>::new(), None).await;
    let latency_ms = started.elapsed().as_millis() as f64;
    let success = outcome.abort_reason.is_none();

    let metrics = MetricsRegistry::new();
    metrics.record_agent_execution("cli-demo", success, latency_ms, outcome.iterations, outcome.cost_spent, outcome.token_usage.values().sum());
    let span = instrument::record_agent_execution(
        span_builder,
        instrument::AgentExecutionAttrs {
            assistant_id: "cli-demo",
            user_id: "cli-user",
            conversation_id: "cli-session",
            input: prompt,
            output: &outcome.output,
            iterations: outcome.iterations,
            cost_usd: outcome.cost_spent,
            tokens_used: outcome.token_usage.values().sum(),
            tools_used_count: outcome.tools_used.len(),
            success,
            error: outcome.abort_reason.as_deref(),
        },
    );
    tracing::debug!(span_id = %span.span_id, latency_ms = span.latency_ms, "agent_execution span recorded");

    println!("{}", outcome.output);
    println!("(iterations={}, cost=${:.4}, tools_used={})", outcome.iterations, outcome.cost_spent, outcome.tools_used.len());
    Ok(())
}

async fn run_collaboration(prompt: &str) -> Result<()> {
    let router = AgentRouter::new(None, false, 0.3);
    let orchestrator = MultiAgentOrchestrator::new(router, AgentCollaborationConfig::default());

    let mut assistants: HashMap<SpecialistType, Arc<AgentGraphRunner>> = HashMap::new();
    for specialist in SpecialistType::ALL {
        let deps = setup::build_node_deps("gpt-4o", 0.7);
        assistants.insert(specialist, Arc::new(AgentGraphRunner::new(AgentGraphConfig::default(), deps, None)));
    }

    let result = orchestrator.execute(prompt, &assistants, Vec::<ChatMessage>::new()).await;

    println!("{}", result.final_output);
    println!(
        "(success={}, agent_chain={:?}, iterations={}, cost=${:.4})",
        result.success, result.agent_chain, result.total_iterations, result.total_cost_usd
    );
    if let Some(error) = result.error {
        println!("error: {error}");
    }
    Ok(())
}
