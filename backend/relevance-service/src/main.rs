use anyhow::Context;
use relevance_service::{
    config::LogFormat, Config, RankedSuggestion, RelevanceEngine,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Scripted conversations replayed by the demo: (conversation, user, messages)
const SCRIPTS: &[(&str, &str, &[&str])] = &[
    (
        "demo-tech",
        "alice",
        &[
            "I need a new smartphone",
            "Something with a great camera, I love taking photos",
        ],
    ),
    (
        "demo-travel",
        "bob",
        &[
            "Wow, I'm planning a vacation trip this summer!",
            "Maybe somewhere with a nice hotel and good food",
        ],
    ),
    (
        "demo-fitness",
        "carol",
        &[
            "Getting back into fitness is so difficult",
            "I wonder how to start exercise again",
        ],
    ),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load config")?;

    // Initialize tracing
    match config.service.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(EnvFilter::from_default_env())
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(fmt::layer())
            .with(EnvFilter::from_default_env())
            .init(),
    }

    info!(service = %config.service.service_name, "Starting relevance demo");

    let engine = Arc::new(RelevanceEngine::new(config.engine.clone()));
    engine
        .update_preferences("alice", vec!["technology".to_string()], vec![])
        .context("Failed to seed preferences")?;

    let tasks: Vec<_> = SCRIPTS
        .iter()
        .map(|(conversation_id, user_id, messages)| {
            let engine = Arc::clone(&engine);
            tokio::task::spawn_blocking(move || {
                let mut transcript = Vec::with_capacity(messages.len());
                for message in messages.iter() {
                    let suggestion = engine.process_message(conversation_id, user_id, message)?;
                    transcript.push((message.to_string(), suggestion));
                }
                Ok::<_, relevance_service::EngineError>((*conversation_id, transcript))
            })
        })
        .collect();

    for outcome in futures::future::join_all(tasks).await {
        let (conversation_id, transcript) = match outcome.context("Conversation task panicked")? {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "Conversation failed");
                return Err(e.into());
            }
        };

        print_transcript(conversation_id, &transcript)?;

        if let Some(item_id) = transcript
            .last()
            .and_then(|(_, suggestion)| suggestion.item_id())
        {
            let reply =
                engine.process_item_response(conversation_id, item_id, "Yes, that sounds great!")?;
            println!("  follow-up -> {}", reply);
        }

        if let Some(analytics) = engine.get_analytics(conversation_id) {
            println!("  analytics: {}", serde_json::to_string(&analytics)?);
        }
    }

    println!(
        "stats: {}",
        serde_json::to_string_pretty(&engine.get_stats())?
    );
    println!(
        "cache: {}",
        serde_json::to_string_pretty(&engine.cache_stats())?
    );

    Ok(())
}

fn print_transcript(
    conversation_id: &str,
    transcript: &[(String, RankedSuggestion)],
) -> anyhow::Result<()> {
    println!("== {} ==", conversation_id);
    for (message, suggestion) in transcript {
        println!("  user: {}", message);
        println!("  bot:  {}", serde_json::to_string(suggestion)?);
    }
    Ok(())
}
