//! The processor outcome record (§4.1): `handled`, `err`, `latency`.
//! Grounded on the teacher's `Node`/`NodeMiddleware` shape — narrow mutation
//! of a shared state value, with a recorded outcome rather than a returned
//! new value.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ProcessorOutcome {
    pub handled: bool,
    pub err: Option<String>,
    pub latency: Duration,
}

impl ProcessorOutcome {
    pub fn handled(latency: Duration) -> Self {
        Self {
            handled: true,
            err: None,
            latency,
        }
    }

    pub fn failed(err: impl Into<String>, latency: Duration) -> Self {
        Self {
            handled: false,
            err: Some(err.into()),
            latency,
        }
    }
}
