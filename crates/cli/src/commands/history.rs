//! `pathwise history`: Print a session's turns.

use pathwise_core::session::SessionId;
use std::path::Path;

pub async fn run(
    config_path: Option<&Path>,
    session: &str,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let stores = pathwise_store::open_from_config(&config.storage).await?;

    let turns = stores.sessions.history(&SessionId::from(session)).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&turns)?);
        return Ok(());
    }

    if turns.is_empty() {
        println!("No turns recorded for session '{session}'.");
        return Ok(());
    }

    for turn in &turns {
        println!("[{}]", turn.timestamp.format("%Y-%m-%d %H:%M:%S UTC"));
        println!("  You       > {}", turn.user_input);
        for line in turn.bot_response.lines() {
            println!("  Counselor > {line}");
        }
        println!();
    }
    println!("{} turn(s)", turns.len());

    Ok(())
}
