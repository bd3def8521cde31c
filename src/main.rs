//! Cicerone binary entry point

use anyhow::Result;
use clap::Parser;
use cicerone::cli::{Cli, Command};
use cicerone::config::Config;
use cicerone::orchestrator::{Orchestrator, TurnOutcome};
use cicerone::poi::OverpassPoiProvider;
use cicerone::retrieval::HttpRetriever;
use cicerone::session::SessionStore;
use cicerone::tools::{build_registry, ToolCache};
use cicerone::providers;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("cicerone={}", default_level))),
        )
        .with_target(false)
        .init();

    let config = Config::load(&cli.config)?;
    config.validate()?;

    let orchestrator = build_orchestrator(&config)?;

    match cli.command {
        Command::Chat { session } => run_chat(&orchestrator, session).await,
        Command::Plan { prompt } => run_plan(&orchestrator, &prompt).await,
    }
}

fn build_orchestrator(config: &Config) -> Result<Orchestrator> {
    let chain = providers::build_chain(config)?;
    let cache = Arc::new(ToolCache::new(config.cache.max_entries));
    let poi_provider = Arc::new(OverpassPoiProvider::new(config.poi.clone())?);
    let retriever = Arc::new(HttpRetriever::new(&config.retrieval)?);
    let registry = build_registry(config, poi_provider, retriever, cache)?;
    let sessions = Arc::new(SessionStore::new(config.session.idle_timeout_minutes));

    Ok(Orchestrator::new(chain, registry, sessions, config))
}

async fn run_chat(orchestrator: &Orchestrator, initial_session: Option<String>) -> Result<()> {
    println!("{}", "Cicerone — city trip planner".bold());
    println!("Type your request, or 'exit' to quit.\n");

    let mut editor = DefaultEditor::new()?;
    let mut session_id = initial_session;

    loop {
        match editor.readline(&"you> ".green().to_string()) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
                    break;
                }
                editor.add_history_entry(line)?;

                match orchestrator.handle_turn(session_id.as_deref(), line).await {
                    Ok(outcome) => {
                        session_id = Some(outcome.session_id.clone());
                        print_outcome(&outcome);
                    }
                    Err(e) => eprintln!("{} {}", "error:".red(), e),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{} {}", "error:".red(), e);
                break;
            }
        }
    }

    if let Some(id) = &session_id {
        println!("\nSession {} (pass --session to resume)", id.dimmed());
    }
    Ok(())
}

async fn run_plan(orchestrator: &Orchestrator, prompt: &str) -> Result<()> {
    let outcome = orchestrator.handle_turn(None, prompt).await?;
    print_outcome(&outcome);
    Ok(())
}

fn print_outcome(outcome: &TurnOutcome) {
    println!("\n{}\n", outcome.reply.cyan());

    if let Some(itinerary) = &outcome.itinerary {
        for day in &itinerary.days {
            println!("{}", format!("Day {}", day.day_number).bold());
            for activity in day.activities() {
                let travel = if activity.travel_from_previous_minutes > 0 {
                    format!("  ({} min travel)", activity.travel_from_previous_minutes)
                } else {
                    String::new()
                };
                println!(
                    "  {}-{}  {}{}",
                    activity.start_time.format("%H:%M"),
                    activity.end_time.format("%H:%M"),
                    activity.name,
                    travel.dimmed(),
                );
            }
        }
        println!();
    }

    if !outcome.sources.is_empty() {
        println!("{}", "Sources:".bold());
        for citation in &outcome.sources {
            println!("  {} — {}", citation.source, citation.url.dimmed());
        }
        println!();
    }
}
