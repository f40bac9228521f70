//! Oracle adapter: one request in, one classified judgment out.

use crate::model::form::FormType;
use crate::oracle::prompt::{classify_reply, PromptContext};
use crate::oracle::{InconclusiveReason, OracleClient, OracleJudgment};
use log::{debug, warn};
use std::sync::Arc;
use std::time::Instant;

/// Wraps an injected `OracleClient` and normalizes its outcomes.
#[derive(Clone)]
pub struct OracleAdapter {
    client: Arc<dyn OracleClient>,
}

impl OracleAdapter {
    pub fn new(client: Arc<dyn OracleClient>) -> Self {
        Self { client }
    }

    /// Judges `line` at 1-indexed `position` against `form`.
    ///
    /// # Side effects
    /// - Exactly one oracle request; errors are not retried.
    /// - Emits `oracle_judge` events with outcome and duration. Line text is
    ///   never logged.
    pub fn judge(&self, line: &str, position: u32, form: FormType) -> OracleJudgment {
        let started_at = Instant::now();
        let context = PromptContext::new(line, position, form);

        let judgment = match self.client.request_judgment(&context) {
            Ok(reply) => classify_reply(&reply),
            Err(err) => {
                warn!(
                    "event=oracle_judge module=oracle status=error form={} position={} duration_ms={} error_code={} error={}",
                    form.storage_tag(),
                    position,
                    started_at.elapsed().as_millis(),
                    err.code(),
                    err
                );
                return OracleJudgment::Inconclusive(InconclusiveReason::Unavailable(err));
            }
        };

        debug!(
            "event=oracle_judge module=oracle status=ok form={} position={} outcome={} duration_ms={} line_chars={}",
            form.storage_tag(),
            position,
            judgment.outcome_label(),
            started_at.elapsed().as_millis(),
            line.chars().count()
        );
        judgment
    }
}
