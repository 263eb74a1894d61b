use std::sync::Arc;

use secrecy::ExposeSecret;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use talent_scout::config::ScreeningConfig;
use talent_scout::llm::{LlmConfig, create_provider};
use talent_scout::screening::{ConversationPhase, ConversationState, ConversationController, ProfileSnapshot};
use talent_scout::sessions::SessionRegistry;
use talent_scout::store::{FileSessionStore, SealingKey, SessionStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so the transcript on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let llm_config = LlmConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export GROQ_API_KEY=gsk_...");
        std::process::exit(1);
    });
    let config = ScreeningConfig::from_env();

    eprintln!("🤖 TalentScout Hiring Assistant v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", llm_config.model);
    eprintln!("   Sessions: {}", config.session_dir.display());
    eprintln!("   Say hello to begin. /profile shows what has been collected, /quit ends the chat.\n");

    let key = match &config.encryption_key {
        Some(encoded) => SealingKey::from_base64(encoded.expose_secret())?,
        None => {
            warn!("TALENT_SCOUT_ENCRYPTION_KEY not set; saved sessions use a one-off key");
            SealingKey::generate().0
        }
    };

    let llm = create_provider(&llm_config)?;
    let store: Arc<dyn SessionStore> =
        Arc::new(FileSessionStore::new(config.session_dir.clone(), key));
    let controller = Arc::new(ConversationController::new(config, Some(llm)));
    let registry = SessionRegistry::new(controller).with_store(store);
    let id = registry.open().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    eprint!("> ");

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            eprint!("> ");
            continue;
        }

        match line {
            "/profile" => {
                let snapshot = registry.snapshot(id).await?;
                let state = registry.state(id).await?;
                print_profile(&snapshot, &state);
            }
            "/quit" => break,
            _ => {
                let event = registry.submit(id, line).await?;
                println!("\n{}\n", event.prompt_text);
                if event.phase == ConversationPhase::Ended {
                    return Ok(());
                }
            }
        }
        eprint!("> ");
    }

    // /quit or EOF: close what is still open so the summary is shown and the session saved
    for event in registry.end_all().await {
        println!("\n{}\n", event.prompt_text);
    }
    Ok(())
}

fn print_profile(snapshot: &ProfileSnapshot, state: &ConversationState) {
    println!(
        "\nCollected {:.0}% ({}, turn {})",
        snapshot.completion_ratio * 100.0,
        snapshot.phase,
        snapshot.turn
    );
    for slot in &snapshot.slots {
        let value = state
            .profile
            .value(slot.field)
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".to_string());
        let mark = if slot.filled { "x" } else { " " };
        println!("  [{mark}] {}: {value}", slot.field.label());
    }
    println!();
}
