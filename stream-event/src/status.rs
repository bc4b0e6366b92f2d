//! Tool-status side-channel event (see `gateway-core`'s streaming orchestrator).
//!
//! The orchestrator writes one of these before and after each tool execution so
//! that a parallel status-poll endpoint can report per-tool progress without
//! touching the SSE stream itself.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    Running,
    Success,
    Failed,
}

/// One tool's status at a point in time, keyed externally as `tool_status:<request_id>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolStatusEvent {
    pub tool_name: String,
    pub status: ToolStatus,
}
