use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ai_client::GeminiClient;
use spark_api::{router, worker::spawn_generation_worker, AppState};
use spark_common::Config;
use spark_engine::prompt::{load_knowledge, ReplyPromptBuilder};
use spark_engine::{GenerationOrchestrator, MemoryReplyStore, OrchestratorConfig, ReplyStore};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("spark=info".parse()?))
        .init();

    info!("Spark reply pipeline starting...");

    let config = Config::from_env();
    config.log_redacted();

    let knowledge = match config.knowledge_path.as_deref() {
        Some(path) => {
            let entries = load_knowledge(path)?;
            info!(path, entries = entries.len(), "Knowledge base loaded");
            entries
        }
        None => Vec::new(),
    };

    let store: Arc<dyn ReplyStore> = Arc::new(MemoryReplyStore::new());
    let generator = Arc::new(GeminiClient::new());
    let orchestrator = Arc::new(GenerationOrchestrator::new(
        store.clone(),
        generator,
        ReplyPromptBuilder::new(config.suggestion_count, knowledge),
        OrchestratorConfig::from_config(&config),
    ));

    spawn_generation_worker(store.clone(), orchestrator);

    let state = Arc::new(AppState::new(store, &config));
    let app = router(state);

    let addr = format!("{}:{}", config.web_host, config.web_port);
    info!("Spark ingestion boundary listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
