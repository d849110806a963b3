//! Audit events emitted around every statement dispatch.

use uuid::Uuid;

/// Context attached to one dispatched statement.
#[derive(Debug, Clone)]
pub struct StatementContext {
    /// Fresh per dispatch; ties the dispatch event to its outcome event.
    pub correlation_id: Uuid,
    /// The full rendered SQL text.
    pub sql: String,
}

impl StatementContext {
    pub fn new(sql: String) -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            sql,
        }
    }
}

/// How a dispatched statement ended.
#[derive(Debug, Clone)]
pub enum StatementOutcome {
    Completed { fetched: usize, affected: u64 },
    Failed { error: String },
}

/// Receives audit events from the execution layer.
///
/// Methods default to no-ops so sinks implement only what they observe.
/// Sinks are injected into [`crate::engine::Engine`]; the engine itself
/// never decides where events go.
pub trait AuditSink: Send + Sync {
    /// A statement is about to hit the wire.
    fn on_dispatch(&self, _ctx: &StatementContext) {}

    /// The round trip for `ctx` ended.
    fn on_complete(&self, _ctx: &StatementContext, _outcome: &StatementOutcome) {}
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAudit;

impl AuditSink for NoopAudit {}

/// Emits events through `tracing`, one record per event, keyed by the
/// correlation id.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAudit;

impl AuditSink for TracingAudit {
    fn on_dispatch(&self, ctx: &StatementContext) {
        tracing::info!(
            correlation_id = %ctx.correlation_id,
            sql = %ctx.sql,
            "statement dispatched"
        );
    }

    fn on_complete(&self, ctx: &StatementContext, outcome: &StatementOutcome) {
        match outcome {
            StatementOutcome::Completed { fetched, affected } => {
                tracing::info!(
                    correlation_id = %ctx.correlation_id,
                    fetched,
                    affected,
                    "statement completed"
                );
            }
            StatementOutcome::Failed { error } => {
                tracing::error!(
                    correlation_id = %ctx.correlation_id,
                    sql = %ctx.sql,
                    error = %error,
                    "statement failed"
                );
            }
        }
    }
}
