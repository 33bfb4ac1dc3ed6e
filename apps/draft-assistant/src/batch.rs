//! Concurrent query batches over one shared retrieval service

use serde::Serialize;
use serde_json::{json, Value};
use tokio::task::JoinError;

use crate::server::DraftAssistant;
use crate::tools::call_tool;

/// Result of one query in a batch
#[derive(Debug, Clone, Serialize)]
pub struct BatchItem {
    pub query: String,
    pub result: Value,
}

/// Run `vector_search_email` for every query on blocking worker threads
///
/// Results come back in input order. Failed queries carry the structured
/// error payload instead of aborting the batch.
pub async fn run_batch(
    assistant: &DraftAssistant,
    queries: Vec<String>,
    k: usize,
) -> Vec<BatchItem> {
    let handles: Vec<_> = queries
        .into_iter()
        .map(|query| {
            let assistant = assistant.clone();
            let worker_query = query.clone();
            let handle = tokio::task::spawn_blocking(move || {
                call_tool(
                    &assistant,
                    "vector_search_email",
                    json!({ "query": worker_query, "k": k }),
                )
            });
            (query, handle)
        })
        .collect();

    let mut items = Vec::with_capacity(handles.len());
    for (query, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Batch worker for '{}' failed: {}", query, e);
                worker_failure(&e)
            }
        };
        items.push(BatchItem { query, result });
    }

    tracing::info!("Batch finished: {} queries", items.len());
    items
}

fn worker_failure(error: &JoinError) -> Value {
    json!({
        "isError": true,
        "error": {
            "kind": "worker_failed",
            "message": error.to_string(),
        }
    })
}
