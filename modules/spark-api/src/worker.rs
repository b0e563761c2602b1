use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

use spark_engine::{GenerationOrchestrator, ReplyStore};

/// Subscribe to record creation and drive each new pending record through
/// the orchestrator, strictly one at a time. Dispatch pacing upstream and
/// sequential processing here are the pipeline's only rate controls.
pub fn spawn_generation_worker(
    store: Arc<dyn ReplyStore>,
    orchestrator: Arc<GenerationOrchestrator>,
) -> tokio::task::JoinHandle<()> {
    let mut created = store.watch_created();
    tokio::spawn(async move {
        info!("Generation worker started");
        loop {
            match created.recv().await {
                Ok(id) => {
                    if let Err(e) = orchestrator.process(id).await {
                        // Failure is scoped to this record; the worker lives on.
                        error!(%id, error = %e, "Record processing failed");
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "Generation worker lagged; creation events dropped");
                }
                Err(RecvError::Closed) => {
                    info!("Creation channel closed, generation worker stopping");
                    break;
                }
            }
        }
    })
}
