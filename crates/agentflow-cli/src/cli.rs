//! Command-line surface (spec §4.12's CLI supplement), grounded on
//! `skilllite/src/cli.rs`'s `clap::Parser`-derived `Commands` enum shape.

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "agentflow")]
#[command(author, version, about = "Single-agent graph runner, multi-agent orchestrator, and ingestion queue demo", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a single agent turn through the graph runner
    Run {
        /// The user prompt
        #[arg(value_name = "PROMPT")]
        prompt: String,

        /// Model name passed to the LLM collaborator
        #[arg(long, default_value = "gpt-4o")]
        model: String,

        /// Sampling temperature
        #[arg(long, default_value_t = 0.7)]
        temperature: f64,
    },

    /// Run a multi-agent collaboration through the orchestrator
    Collaborate {
        /// The user prompt
        #[arg(value_name = "PROMPT")]
        prompt: String,
    },

    /// Enqueue a document for ingestion on the background job queue
    Ingest {
        /// Path to the document to ingest
        #[arg(value_name = "PATH")]
        path: String,

        /// Priority: low, normal, high, or urgent
        #[arg(long, default_value = "normal")]
        priority: String,
    },
}
