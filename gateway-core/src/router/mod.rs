//! The Model Router (§4.3): selects a downstream model for `model: "auto"`
//! and supplies a degradation-ordered candidate list.
//!
//! `RouterStrategy` is hot-reloadable: a config-reload event constructs a
//! brand-new value off the hot path and the caller swaps it into the
//! `ConfigStore`'s `model_router` domain atomically, matching the teacher's
//! `CachedResolver`/`ResolverRefresher` whole-value-swap pattern in
//! `model_spec/cached.rs`.

pub mod priority;
pub mod semantic;

pub use priority::PriorityRouter;
pub use semantic::SemanticRouter;

use crate::error::ChatError;
use crate::message::Message;

/// Result of a routing decision: the selected model plus the full
/// degradation-ordered candidate list (selected is always `candidates[0]`,
/// §8 property 6).
#[derive(Debug, Clone)]
pub struct RouteResult {
    pub selected: String,
    pub candidates: Vec<String>,
    /// Present only for the semantic strategy; used for the `x-user-input`
    /// response header (§4.3 step 7).
    pub classification_input: Option<String>,
}

pub enum RouterStrategy {
    Semantic(SemanticRouter),
    Priority(PriorityRouter),
}

impl RouterStrategy {
    pub async fn select(&self, messages: &[Message]) -> Result<RouteResult, ChatError> {
        match self {
            RouterStrategy::Semantic(r) => r.select(messages).await,
            RouterStrategy::Priority(r) => Ok(r.select()),
        }
    }
}
