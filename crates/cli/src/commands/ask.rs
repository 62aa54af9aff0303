//! `briefly ask` — Chat from the terminal through the same completion loop.

use std::io::Write;
use std::sync::Arc;

use briefly_agent::{ChunkReceiver, CompletionLoop};
use briefly_config::AppConfig;
use briefly_core::message::Message;
use tokio::io::AsyncBufReadExt;

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    export OPEN_AI_KEY='sk-...'");
        eprintln!("    export BRIEFLY_API_KEY='sk-...'");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let providers = briefly_providers::build_from_config(&config)?;
    let tools = Arc::new(briefly_tools::default_registry(&config.article));
    let chat = CompletionLoop::from_config(providers.completion, tools, &config);

    if let Some(msg) = message {
        // Single message mode
        let rx = chat.run(vec![Message::user(msg)])?;
        print_stream(rx).await?;
        return Ok(());
    }

    // Interactive mode: history lives only for this session
    println!();
    println!("  📰 Briefly — paste a news article URL or ask a question.");
    println!("  Model: {}", chat.model());
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    let mut history: Vec<Message> = Vec::new();
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();

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
        if line == "exit" || line == "quit" {
            break;
        }

        history.push(Message::user(line));
        let rx = chat.run(history.clone())?;
        match print_stream(rx).await {
            Ok(reply) => history.push(Message::assistant(reply)),
            Err(e) => {
                eprintln!("  ❌ {e}");
                history.pop();
            }
        }
        println!();
    }

    Ok(())
}

/// Print chunks as they arrive and return the full reply.
async fn print_stream(mut rx: ChunkReceiver) -> Result<String, Box<dyn std::error::Error>> {
    let mut reply = String::new();
    let mut stdout = std::io::stdout();

    while let Some(chunk) = rx.recv().await {
        let chunk = chunk?;
        stdout.write_all(chunk.as_bytes())?;
        stdout.flush()?;
        reply.push_str(&chunk);
    }
    println!();

    Ok(reply)
}
