//! Smoke test for the chat history store against a live cache.
//!
//! Connects using `PARLEY_*` settings, writes a short conversation for a
//! throwaway identity, reads it back, and clears it.
//!
//! Usage:
//!   PARLEY_CACHE_URL=redis://127.0.0.1:6379/ \
//!   cargo run -p parley-store --example history_smoke

use std::sync::Arc;

use parley_core::models::{Button, Message, Sender};
use parley_store::{ChatHistoryStore, HealthMonitor, StoreConfig};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = StoreConfig::from_env();
    println!("Cache:   {}", config.cache_url);
    println!("Prefix:  {}", config.key_prefix);

    let store = Arc::new(ChatHistoryStore::redis(config)?);
    if !store.connect().await {
        return Err(eyre::eyre!("cache unreachable; is the server running?"));
    }
    let monitor = HealthMonitor::start(store.clone());

    let identity = format!("smoke-{}@example.com", uuid::Uuid::new_v4());
    let conversation = [
        Message::new(
            uuid::Uuid::new_v4().to_string(),
            "What can you do?",
            Sender::User,
            jiff::Timestamp::now(),
        ),
        Message::new(
            uuid::Uuid::new_v4().to_string(),
            "<p>Pick a topic:</p>",
            Sender::Bot,
            jiff::Timestamp::now(),
        )
        .with_buttons(vec![
            Button::new("billing", "Billing"),
            Button::new("support", "Support"),
        ]),
    ];

    for message in &conversation {
        if !store.add_message(&identity, message).await {
            return Err(eyre::eyre!("append failed for {}", message.id));
        }
    }

    let loaded = store.load_messages(&identity).await;
    println!("Loaded {} messages for {identity}:", loaded.len());
    for message in &loaded {
        println!("  [{}] {:?}: {}", message.timestamp, message.sender, message.text);
    }
    if let Some(ttl) = store.history_ttl(&identity).await {
        println!("Expires in {}s", ttl.as_secs());
    }

    store.clear_messages(&identity).await;
    monitor.shutdown().await;
    store.shutdown().await;
    Ok(())
}
