//! Librarian Governance Engine — Demo CLI
//!
//! Runs one or all of the reference scenarios. Each scenario uses real
//! Librarian components (rule set, decision policy, escalation advisor,
//! hash-chained ledger, drift detector) wired together with a mock
//! specification catalog.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- approved
//!   cargo run -p demo -- critical
//!   cargo run -p demo -- high-threshold
//!   cargo run -p demo -- drift
//!   cargo run -p demo -- concurrent-append

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use librarian_contracts::error::LibrarianResult;
use librarian_ref_specs::scenarios::{
    approved_change, concurrent_append, critical_escalation, drift_scan, high_threshold,
};

// ── CLI definition ────────────────────────────────────────────────────────────

/// Librarian — governance engine for specification changes.
///
/// Each subcommand runs one or all of the reference scenarios, showing rule
/// evaluation, escalation, drift detection and audit chain integrity.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "Librarian governance engine reference demo",
    long_about = "Runs Librarian reference scenarios showing concurrent rule evaluation,\n\
                  threshold escalation, human review, drift detection, and\n\
                  hash-chained audit records."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all five scenarios in sequence.
    RunAll,
    /// Scenario A: compliant design approved.
    Approved,
    /// Scenario B: critical violation escalated, then rejected on review.
    Critical,
    /// Scenario C: four high-severity findings escalate at threshold 3.
    HighThreshold,
    /// Scenario D: drift scan finds a design ahead of its architecture.
    Drift,
    /// Scenario E: two replicas append against the same chain tail.
    ConcurrentAppend,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    print_banner();

    let result = match cli.command {
        Command::RunAll => run_all().await,
        Command::Approved => approved_change::run_scenario().await,
        Command::Critical => critical_escalation::run_scenario().await,
        Command::HighThreshold => high_threshold::run_scenario().await,
        Command::Drift => drift_scan::run_scenario().await,
        Command::ConcurrentAppend => concurrent_append::run_scenario().await,
    };

    match result {
        Ok(()) => {
            println!("All selected scenarios completed successfully.");
        }
        Err(e) => {
            eprintln!("Demo error: {}", e);
            std::process::exit(1);
        }
    }
}

// ── Scenario dispatch ─────────────────────────────────────────────────────────

async fn run_all() -> LibrarianResult<()> {
    approved_change::run_scenario().await?;
    critical_escalation::run_scenario().await?;
    high_threshold::run_scenario().await?;
    drift_scan::run_scenario().await?;
    concurrent_append::run_scenario().await?;
    Ok(())
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("Librarian — Specification Governance Engine");
    println!("Reference Demo");
    println!("===========================================");
    println!();
    println!("Evaluation pipeline per change request:");
    println!("  [1] Request shape validated");
    println!("  [2] Every compliance rule runs concurrently, isolated and time-boxed");
    println!("  [3] Decision policy → approved / revision_required / escalated");
    println!("  [4] Escalation advisor may only upgrade toward escalated");
    println!("  [5] Decision appended to the SHA-256 audit chain, then returned");
    println!();
}
