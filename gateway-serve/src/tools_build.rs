//! Builds a per-request `ToolExecutor` from the `precise_context` domain and
//! the caller's `Identity` (§4.4). Lightweight: each `RagToolClient` only
//! clones config strings and shares the pooled `reqwest::Client`, so building
//! one per request (identity is request-scoped, unlike the tool set) is cheap.

use std::sync::Arc;

use config::PreciseContextConfig;
use gateway_core::identity::Identity;
use gateway_core::tools::backend::RagToolKind;
use gateway_core::tools::{RagToolClient, Tool, ToolExecutor};

const KNOWN_KINDS: [RagToolKind; 4] = [
    RagToolKind::CodebaseSearch,
    RagToolKind::SearchDefinitions,
    RagToolKind::SearchReferences,
    RagToolKind::KnowledgeBaseSearch,
];

pub fn build_tool_executor(precise_context: &PreciseContextConfig, http: reqwest::Client, identity: Identity) -> ToolExecutor {
    let mut tools: Vec<Arc<dyn Tool>> = Vec::new();
    for kind in KNOWN_KINDS {
        if let Some(backend) = precise_context.tools.get(kind.name()) {
            tools.push(Arc::new(RagToolClient::new(kind, http.clone(), backend.clone(), identity.clone())));
        }
    }
    ToolExecutor::new(tools)
}
