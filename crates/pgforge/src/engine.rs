//! Execution engine: renders statements, dispatches them, audits both ends.

use std::sync::Arc;

use crate::audit::{AuditSink, NoopAudit, StatementContext, StatementOutcome};
use crate::error::SqlResult;
use crate::executor::SqlExecutor;
use crate::matrix::ResultMatrix;
use crate::stmt::SqlStatement;

/// Renders and executes statements over any [`SqlExecutor`].
///
/// Stateless apart from its audit sink, so one engine serves any number of
/// connections. Every dispatch gets a fresh correlation id tying its audit
/// events together; errors are audited and then propagated unchanged.
#[derive(Clone)]
pub struct Engine {
    audit: Arc<dyn AuditSink>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Engine with the discard-everything sink.
    pub fn new() -> Self {
        Self {
            audit: Arc::new(NoopAudit),
        }
    }

    /// Engine reporting to the given sink.
    pub fn with_audit(audit: Arc<dyn AuditSink>) -> Self {
        Self { audit }
    }

    /// Render `statement`, run it on `conn`, and assemble the result
    /// matrix.
    ///
    /// A generation error is audited as a failure and returned without
    /// touching the connection. An execution error is audited and
    /// propagated; degradation policies such as the update layer's `-1`
    /// sentinel live with the statement, not here.
    pub async fn execute<S, E>(&self, statement: &S, conn: &E) -> SqlResult<ResultMatrix>
    where
        S: SqlStatement,
        E: SqlExecutor,
    {
        let sql = match statement.to_sql() {
            Ok(sql) => sql,
            Err(err) => {
                // Nothing was rendered; the audit record still carries the
                // reason in place of the statement text.
                let ctx = StatementContext::new(format!("-- not rendered: {err}"));
                self.audit.on_complete(
                    &ctx,
                    &StatementOutcome::Failed {
                        error: err.to_string(),
                    },
                );
                return Err(err);
            }
        };

        let ctx = StatementContext::new(sql);
        self.audit.on_dispatch(&ctx);

        match conn.run_sql(&ctx.sql).await {
            Ok(raw) => {
                let matrix = ResultMatrix::new(raw.rows, raw.affected, raw.last_inserted_id);
                self.audit.on_complete(
                    &ctx,
                    &StatementOutcome::Completed {
                        fetched: matrix.total_fetched(),
                        affected: matrix.total_affected(),
                    },
                );
                Ok(matrix)
            }
            Err(err) => {
                self.audit.on_complete(
                    &ctx,
                    &StatementOutcome::Failed {
                        error: err.to_string(),
                    },
                );
                Err(err)
            }
        }
    }
}

/// Runs the given block inside a database transaction.
///
/// Begins a transaction on `$client` (a `tokio_postgres::Client` or a
/// pooled connection), binds it to `$tx`, and evaluates the block, which
/// must produce a [`SqlResult`](crate::SqlResult). Commits on `Ok`, rolls
/// back on `Err`; a rollback failure is folded into the reported error.
///
/// Statements built elsewhere run inside the transaction unchanged, since
/// `$tx` is itself a [`SqlExecutor`](crate::executor::SqlExecutor).
///
/// ```ignore
/// pgforge::transaction!(&mut client, tx, {
///     UpdateStatement::new()
///         .table("accounts")
///         .set_with_expression("balance", "balance - 100")
///         .where_clause(|w| { w.compare("id", CompareOp::Eq, 1); })
///         .execute(&engine, &tx)
///         .await?;
///     Ok(())
/// })?;
/// ```
#[macro_export]
macro_rules! transaction {
    ($client:expr, $tx:ident, $body:block) => {{
        let $tx = ($client)
            .transaction()
            .await
            .map_err($crate::SqlError::from)?;

        let __pgforge_tx_result = async { $body }.await;
        match __pgforge_tx_result {
            Ok(value) => {
                $tx.commit().await.map_err($crate::SqlError::from)?;
                Ok(value)
            }
            Err(error) => match $tx.rollback().await {
                Ok(()) => Err(error),
                Err(rollback_err) => Err($crate::SqlError::Connection(format!(
                    "{error} (rollback failed: {rollback_err})"
                ))),
            },
        }
    }};
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::{Map, Value};

    use super::*;
    use crate::condition::CompareOp;
    use crate::error::SqlError;
    use crate::executor::RawRows;
    use crate::stmt::{SelectStatement, UpdateStatement};

    /// Replays scripted responses keyed by SQL substring, recording every
    /// statement it receives.
    struct ScriptedExecutor {
        scripts: Vec<(&'static str, SqlResult<RawRows>)>,
        seen: Mutex<Vec<String>>,
    }

    impl ScriptedExecutor {
        fn new(scripts: Vec<(&'static str, SqlResult<RawRows>)>) -> Self {
            Self {
                scripts,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn rows(values: &[(&str, &str)]) -> RawRows {
            let mut row = Map::new();
            for (k, v) in values {
                row.insert(k.to_string(), Value::String(v.to_string()));
            }
            RawRows {
                rows: vec![row],
                affected: 0,
                last_inserted_id: None,
            }
        }
    }

    impl SqlExecutor for ScriptedExecutor {
        async fn run_sql(&self, sql: &str) -> SqlResult<RawRows> {
            self.seen.lock().unwrap().push(sql.to_string());
            for (needle, response) in &self.scripts {
                if sql.contains(needle) {
                    return match response {
                        Ok(raw) => Ok(raw.clone()),
                        Err(err) => Err(SqlError::generate(err.to_string())),
                    };
                }
            }
            panic!("no script for: {sql}");
        }
    }

    #[derive(Default)]
    struct CollectingSink {
        dispatched: Mutex<Vec<StatementContext>>,
        outcomes: Mutex<Vec<(StatementContext, StatementOutcome)>>,
    }

    impl AuditSink for CollectingSink {
        fn on_dispatch(&self, ctx: &StatementContext) {
            self.dispatched.lock().unwrap().push(ctx.clone());
        }

        fn on_complete(&self, ctx: &StatementContext, outcome: &StatementOutcome) {
            self.outcomes
                .lock()
                .unwrap()
                .push((ctx.clone(), outcome.clone()));
        }
    }

    #[tokio::test]
    async fn execute_audits_dispatch_and_completion_with_same_id() {
        let sink = Arc::new(CollectingSink::default());
        let engine = Engine::with_audit(sink.clone());
        let conn = ScriptedExecutor::new(vec![(
            "FROM users",
            Ok(ScriptedExecutor::rows(&[("id", "1")])),
        )]);

        let matrix = SelectStatement::new()
            .from("users")
            .execute(&engine, &conn)
            .await
            .unwrap();
        assert_eq!(matrix.first_row_i64("id").unwrap(), Some(1));

        let dispatched = sink.dispatched.lock().unwrap();
        let outcomes = sink.outcomes.lock().unwrap();
        assert_eq!(dispatched.len(), 1);
        assert_eq!(outcomes.len(), 1);
        assert_eq!(dispatched[0].correlation_id, outcomes[0].0.correlation_id);
        assert!(matches!(
            outcomes[0].1,
            StatementOutcome::Completed {
                fetched: 1,
                affected: 0
            }
        ));
    }

    #[tokio::test]
    async fn generation_error_fails_before_dispatch() {
        let sink = Arc::new(CollectingSink::default());
        let engine = Engine::with_audit(sink.clone());
        let conn = ScriptedExecutor::new(vec![]);

        let err = SelectStatement::new()
            .from("")
            .execute(&engine, &conn)
            .await
            .unwrap_err();
        assert!(err.is_generate());

        assert!(conn.seen.lock().unwrap().is_empty());
        assert!(sink.dispatched.lock().unwrap().is_empty());
        let outcomes = sink.outcomes.lock().unwrap();
        assert!(matches!(outcomes[0].1, StatementOutcome::Failed { .. }));
        // The audit record still names what went wrong in its sql field.
        assert!(outcomes[0].0.sql.contains("blank table"));
    }

    #[tokio::test]
    async fn execution_error_is_audited_and_propagated() {
        let sink = Arc::new(CollectingSink::default());
        let engine = Engine::with_audit(sink.clone());
        let conn = ScriptedExecutor::new(vec![(
            "FROM users",
            Err(SqlError::generate("connection reset")),
        )]);

        let err = SelectStatement::new()
            .from("users")
            .execute(&engine, &conn)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("connection reset"));
        assert!(matches!(
            sink.outcomes.lock().unwrap()[0].1,
            StatementOutcome::Failed { .. }
        ));
    }

    #[tokio::test]
    async fn update_degrades_every_failure_to_sentinel() {
        let engine = Engine::new();
        let conn = ScriptedExecutor::new(vec![]);

        // Generation failure: never reaches the connection.
        let affected = UpdateStatement::new()
            .table("users")
            .execute_for_affected_rows(&engine, &conn)
            .await;
        assert_eq!(affected, -1);
        assert!(conn.seen.lock().unwrap().is_empty());

        // Execution failure.
        let conn = ScriptedExecutor::new(vec![(
            "UPDATE users",
            Err(SqlError::generate("deadlock detected")),
        )]);
        let affected = UpdateStatement::new()
            .table("users")
            .set_with_value("state", "done")
            .execute_for_affected_rows(&engine, &conn)
            .await;
        assert_eq!(affected, -1);
    }

    #[tokio::test]
    async fn update_reports_affected_count_on_success() {
        let engine = Engine::new();
        let conn = ScriptedExecutor::new(vec![(
            "UPDATE users",
            Ok(RawRows {
                rows: vec![],
                affected: 7,
                last_inserted_id: None,
            }),
        )]);

        let affected = UpdateStatement::new()
            .table("users")
            .set_with_value("state", "done")
            .where_clause(|w| {
                w.compare("state", CompareOp::Eq, "pending");
            })
            .execute_for_affected_rows(&engine, &conn)
            .await;
        assert_eq!(affected, 7);
    }

    #[tokio::test]
    async fn pagination_composes_total_and_window() {
        let engine = Engine::new();
        let conn = ScriptedExecutor::new(vec![
            ("COUNT(*)", Ok(ScriptedExecutor::rows(&[("total", "42")]))),
            ("OFFSET 20", Ok(ScriptedExecutor::rows(&[("id", "21")]))),
        ]);

        let statement = SelectStatement::new().from("users").order_by_asc("id");
        let page = statement
            .execute_paginated(&engine, &conn, 3, 10)
            .await
            .unwrap();
        assert_eq!(page.total, 42);
        assert_eq!(page.matrix.first_row_i64("id").unwrap(), Some(21));

        // The count variant keeps only a cost-bounding LIMIT, no OFFSET.
        let seen = conn.seen.lock().unwrap();
        let count_sql = seen.iter().find(|s| s.contains("COUNT(*)")).unwrap();
        assert!(count_sql.contains("LIMIT 10 OFFSET 0"));
        let page_sql = seen.iter().find(|s| !s.contains("COUNT(*)")).unwrap();
        assert!(page_sql.contains("LIMIT 10 OFFSET 20"));
    }

    #[tokio::test]
    async fn pagination_rejects_bad_window_arguments() {
        let engine = Engine::new();
        let conn = ScriptedExecutor::new(vec![]);
        let statement = SelectStatement::new().from("users");

        let err = statement
            .execute_paginated(&engine, &conn, 1, 0)
            .await
            .unwrap_err();
        assert!(err.is_generate());

        let err = statement
            .execute_paginated(&engine, &conn, 0, 10)
            .await
            .unwrap_err();
        assert!(err.is_generate());
    }

    #[tokio::test]
    async fn pagination_source_statement_is_not_mutated() {
        let engine = Engine::new();
        let conn = ScriptedExecutor::new(vec![
            ("COUNT(*)", Ok(ScriptedExecutor::rows(&[("total", "0")]))),
            ("FROM users", Ok(RawRows::default())),
        ]);

        let statement = SelectStatement::new().from("users");
        let before = statement.to_sql().unwrap();
        statement
            .execute_paginated(&engine, &conn, 2, 5)
            .await
            .unwrap();
        assert_eq!(statement.to_sql().unwrap(), before);
    }
}
