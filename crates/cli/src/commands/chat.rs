//! `pathwise chat`: Interactive or single-message chat mode.

use pathwise_agent::{TurnError, TurnOutcome, TurnRequest};
use pathwise_config::AppConfig;
use std::io::Write;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(
    config_path: Option<&Path>,
    session: Option<String>,
    message: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;

    // Check for API key early: give a clear error
    if !config.has_api_key() && config.default_provider != "ollama" {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    GEMINI_API_KEY=...     (for Gemini, the default provider)");
        eprintln!("    OPENAI_API_KEY=...     (for OpenAI)");
        eprintln!("    PATHWISE_API_KEY=...   (generic)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_path().display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let (_stores, orchestrator) = super::build_runtime(&config).await?;
    let session = session.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    tracing::debug!(session = %session, "Chat session started");

    if let Some(msg) = message {
        // Single message mode
        eprint!("  Thinking...");
        let result = orchestrator.handle(TurnRequest::new(&session, msg)).await;
        eprint!("\r              \r");
        let outcome = result?;
        println!("{}", outcome.message);
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║      Pathwise Career Counselor: Chat         ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Provider:  {}", orchestrator.invoker().provider_name());
    println!("  Model:     {}", orchestrator.invoker().model());
    println!("  Session:   {session}");
    println!();
    println!("  Ask about colleges and engineering branches.");
    println!("  Type 'exit' or Ctrl+D to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "exit" | "quit") {
            break;
        }

        eprint!("  ...");
        let result = orchestrator.handle(TurnRequest::new(&session, line)).await;
        eprint!("\r     \r");
        print_turn(result);
    }

    println!();
    println!("  Goodbye! Resume later with: pathwise chat --session {session}");
    println!();
    Ok(())
}

fn print_turn(result: Result<TurnOutcome, TurnError>) {
    match result {
        Ok(outcome) => {
            println!();
            for line in outcome.message.lines() {
                println!("  Counselor > {line}");
            }
            if !outcome.persisted {
                eprintln!("  [Warning] This answer could not be saved to the session history.");
            }
            println!();
        }
        Err(e) => {
            eprintln!("  [Error at {}] {e}", e.stage());
            println!();
        }
    }
}
