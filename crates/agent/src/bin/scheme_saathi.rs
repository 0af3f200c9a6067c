//! Scheme Saathi command-line driver
//!
//! Reads one user turn per stdin line and writes one JSON recommendation per
//! line. `/reset` starts a new conversation, `/health` prints index health,
//! `/quit` exits.

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use scheme_saathi_agent::{Recommendation, Recommender};
use scheme_saathi_config::{load_settings, Settings};
use scheme_saathi_core::SlotKey;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Priority: env vars > config/{env} > config/default > defaults
    let env = std::env::var("SCHEME_SAATHI_ENV").ok();
    let config = match load_settings(env.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            // Tracing not yet initialized
            eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
            Settings::default()
        },
    };

    init_tracing(&config);

    tracing::info!("Starting Scheme Saathi v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        environment = ?config.environment,
        config_path = env.as_deref().unwrap_or("default"),
        "Configuration loaded"
    );

    let recommender = Recommender::from_settings(&config)
        .await
        .context("failed to initialise recommender")?;
    let display_top_k = recommender.config().display_top_k;
    let mut state = recommender.new_conversation();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        let message = line.trim();
        if message.is_empty() {
            continue;
        }

        let output = match message {
            "/quit" | "/exit" => break,
            "/reset" => {
                state = recommender.new_conversation();
                tracing::info!("Conversation reset");
                continue;
            },
            "/health" => serde_json::to_string(&recommender.health().await)?,
            _ => {
                let rec = recommender.recommend_turn(&mut state, message, None).await;
                state.record_assistant(reply_text(&rec, display_top_k));
                serde_json::to_string(&rec.top(display_top_k))?
            },
        };

        stdout.write_all(output.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    tracing::info!("Input closed, shutting down");
    Ok(())
}

/// Assistant turn recorded in the conversation history
fn reply_text(rec: &Recommendation, display_top_k: usize) -> String {
    match rec.missing_field {
        Some(field) => question_for(field).to_string(),
        None if rec.candidates.is_empty() => "No matching schemes found.".to_string(),
        None => {
            let names: Vec<&str> = rec
                .candidates
                .iter()
                .take(display_top_k)
                .map(|c| c.scheme.scheme_name.as_str())
                .collect();
            format!("Schemes you may be eligible for: {}", names.join(", "))
        },
    }
}

fn question_for(field: SlotKey) -> &'static str {
    match field {
        SlotKey::Occupation => "What do you do? For example farmer, student, worker or business owner.",
        SlotKey::State => "Which state do you live in?",
        SlotKey::HelpType => {
            "What kind of help are you looking for? For example scholarship, loan, pension, health or housing."
        },
        SlotKey::Gender => "May I know your gender, age or caste category?",
        SlotKey::Age => "How old are you?",
        SlotKey::CasteCategory => "Which category do you belong to (General, OBC, SC, ST)?",
        SlotKey::Disability => "Do you have a disability?",
        SlotKey::Bpl => "Does your family hold a BPL card?",
        SlotKey::EducationLevel => "Are you in school or in college?",
    }
}

fn init_tracing(config: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.observability.log_level;
        format!("scheme_saathi={}", level).into()
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);
    // Logs go to stderr; stdout carries responses
    let fmt_layer = if config.observability.log_json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };
    subscriber.with(fmt_layer).init();
}
