use super::*;
use crate::condition::CompareOp;

#[test]
fn select_end_to_end_text() {
    let sql = SelectStatement::new()
        .from_aliased("users", "u")
        .column_expr("u.id")
        .column_expr("u.name")
        .left_join(|j| {
            j.table("orders")
                .alias("o")
                .on_raw("o.user_id = u.id")
        })
        .where_clause(|w| {
            w.compare("u.age", CompareOp::Gte, 18)
                .amongst("u.state", ["active", "trial"]);
        })
        .group_by("u.id")
        .having(|h| {
            h.raw("COUNT(o.id) > 0");
        })
        .order_by_desc("u.id")
        .limit_offset(20, 40)
        .to_sql()
        .unwrap();

    assert_eq!(
        sql,
        "SELECT u.id,u.name FROM users AS u LEFT JOIN orders AS o ON o.user_id = u.id \
         WHERE (u.age >= 18 AND u.state IN ('active','trial')) \
         GROUP BY u.id HAVING COUNT(o.id) > 0 ORDER BY u.id DESC LIMIT 20 OFFSET 40"
    );
}

#[test]
fn clause_order_is_fixed_regardless_of_mutation_order() {
    let forward = SelectStatement::new()
        .from("t")
        .where_clause(|w| {
            w.compare("a", CompareOp::Eq, 1);
        })
        .order_by_asc("a")
        .limit(5);
    let shuffled = SelectStatement::new()
        .limit(5)
        .order_by_asc("a")
        .where_clause(|w| {
            w.compare("a", CompareOp::Eq, 1);
        })
        .from("t");
    assert_eq!(forward.to_sql().unwrap(), shuffled.to_sql().unwrap());
}

#[test]
fn rendering_is_deterministic_between_mutations() {
    let statement = SelectStatement::new()
        .from("users")
        .where_clause(|w| {
            w.is_not_null("email");
        });
    let first = statement.to_sql().unwrap();
    assert_eq!(statement.to_sql().unwrap(), first);
    assert_eq!(statement.to_sql().unwrap(), first);
}

#[test]
fn clone_is_fully_independent() {
    let original = SelectStatement::new().from("users").limit(10);
    let mutated = original
        .clone()
        .reset_columns()
        .column_with_alias("COUNT(*)", "total")
        .where_clause(|w| {
            w.compare("banned", CompareOp::Eq, true);
        })
        .limit_offset(10, 30);

    assert_eq!(
        original.to_sql().unwrap(),
        "SELECT * FROM users LIMIT 10 OFFSET 0"
    );
    assert!(mutated.to_sql().unwrap().contains("COUNT(*)"));
}

#[test]
fn select_star_when_no_columns() {
    let sql = SelectStatement::new().from("users").to_sql().unwrap();
    assert_eq!(sql, "SELECT * FROM users");
}

#[test]
fn select_from_subquery_requires_alias() {
    let inner = SelectStatement::new().from("events").group_by("kind");
    let sql = SelectStatement::new()
        .from_subquery(&inner, "per_kind")
        .to_sql()
        .unwrap();
    assert_eq!(
        sql,
        "SELECT * FROM (SELECT * FROM events GROUP BY kind) AS per_kind"
    );

    let err = SelectStatement::new()
        .from_subquery(&inner, "  ")
        .to_sql()
        .unwrap_err();
    assert!(err.is_generate());
}

#[test]
fn subquery_generation_error_propagates_to_outer_statement() {
    let broken = SelectStatement::new().from("");
    let err = SelectStatement::new()
        .from_subquery(&broken, "b")
        .to_sql()
        .unwrap_err();
    assert!(err.is_generate());
}

#[test]
fn select_hint_lock_mode_and_remark() {
    let sql = SelectStatement::new()
        .from("jobs")
        .set_max_execution_time(2500)
        .set_lock_mode("FOR UPDATE")
        .set_remark("sweep\nnightly")
        .to_sql()
        .unwrap();
    assert_eq!(
        sql,
        "SELECT /*+ MAX_EXECUTION_TIME(2500) */ * FROM jobs FOR UPDATE\n-- sweep¦nightly\n"
    );
}

#[test]
fn select_blank_table_is_generation_error() {
    let err = SelectStatement::new().from("  ").to_sql().unwrap_err();
    assert!(err.is_generate());
    // Re-rendering the same state fails identically.
    let statement = SelectStatement::new().from("");
    let a = statement.to_sql().unwrap_err().to_string();
    let b = statement.to_sql().unwrap_err().to_string();
    assert_eq!(a, b);
}

#[test]
fn join_without_table_is_generation_error() {
    let err = SelectStatement::new()
        .from("users")
        .inner_join(|j| j.on_raw("1=1"))
        .to_sql()
        .unwrap_err();
    assert!(err.is_generate());
}

#[test]
fn join_condition_built_from_group() {
    let sql = SelectStatement::new()
        .from_aliased("users", "u")
        .inner_join(|j| {
            j.table("orders").alias("o").on_and_group(|g| {
                g.raw("o.user_id = u.id")
                    .compare("o.state", CompareOp::Ne, "void");
            })
        })
        .to_sql()
        .unwrap();
    assert_eq!(
        sql,
        "SELECT * FROM users AS u INNER JOIN orders AS o \
         ON (o.user_id = u.id AND o.state != 'void')"
    );
}

// ==================== UPDATE ====================

#[test]
fn update_end_to_end_text() {
    let sql = UpdateStatement::new()
        .table("users")
        .set_with_value("state", "archived")
        .set_with_expression("updated_at", "NOW()")
        .where_clause(|w| {
            w.compare("last_seen", CompareOp::Lt, "2020-01-01");
        })
        .order_by_asc("id")
        .limit(100)
        .to_sql()
        .unwrap();
    assert_eq!(
        sql,
        "UPDATE users SET state = 'archived', updated_at = NOW() \
         WHERE last_seen < '2020-01-01' ORDER BY id LIMIT 100"
    );
}

#[test]
fn update_keeps_duplicate_assignments_in_call_order() {
    let sql = UpdateStatement::new()
        .table("t")
        .set_with_value("a", 1)
        .set_with_value("a", 2)
        .to_sql()
        .unwrap();
    assert_eq!(sql, "UPDATE t SET a = 1, a = 2");
}

#[test]
fn update_batch_expressions_keep_iteration_order() {
    let sql = UpdateStatement::new()
        .table("metrics")
        .set_with_expressions([
            ("hits", "hits + 1"),
            ("seen_at", "NOW()"),
        ])
        .set_with_value("flag", true)
        .to_sql()
        .unwrap();
    assert_eq!(
        sql,
        "UPDATE metrics SET hits = hits + 1, seen_at = NOW(), flag = TRUE"
    );

    let err = UpdateStatement::new()
        .table("metrics")
        .set_with_expressions([("hits", "  ")])
        .to_sql()
        .unwrap_err();
    assert!(err.is_generate());
}

#[test]
fn update_ignore_and_schema_qualified_table() {
    let sql = UpdateStatement::new()
        .table_in_schema("app", "users")
        .ignore()
        .set_with_value("n", 0)
        .to_sql()
        .unwrap();
    assert_eq!(sql, "UPDATE IGNORE app.users SET n = 0");
}

#[test]
fn update_without_assignments_or_table_is_generation_error() {
    assert!(
        UpdateStatement::new()
            .table("users")
            .to_sql()
            .unwrap_err()
            .is_generate()
    );
    assert!(
        UpdateStatement::new()
            .set_with_value("a", 1)
            .to_sql()
            .unwrap_err()
            .is_generate()
    );
}

#[test]
fn update_literal_quoting_goes_through_single_point() {
    let sql = UpdateStatement::new()
        .table("users")
        .set_with_value("name", "O'Brien")
        .to_sql()
        .unwrap();
    assert_eq!(sql, "UPDATE users SET name = 'O''Brien'");
}

// ==================== UNION ====================

#[test]
fn union_chain_mixes_distinct_and_all() {
    let a = SelectStatement::new().from("a");
    let b = SelectStatement::new().from("b");
    let c = SelectStatement::new().from("c");
    let sql = UnionStatement::new(&a)
        .union_all(&b)
        .union(&c)
        .to_sql()
        .unwrap();
    assert_eq!(
        sql,
        "( SELECT * FROM a ) UNION ALL ( SELECT * FROM b ) UNION ( SELECT * FROM c )"
    );
}

#[test]
fn union_batch_appends_in_order() {
    let head = SelectStatement::new().from("a");
    let tail = [
        SelectStatement::new().from("b"),
        SelectStatement::new().from("c"),
    ];
    let sql = UnionStatement::new(&head)
        .union_all_batch(&tail)
        .to_sql()
        .unwrap();
    assert_eq!(
        sql,
        "( SELECT * FROM a ) UNION ALL ( SELECT * FROM b ) UNION ALL ( SELECT * FROM c )"
    );
}

#[test]
fn union_captures_selection_text_at_append_time() {
    let a = SelectStatement::new().from("a");
    let chain = UnionStatement::new(&a);
    let moved = a.limit(1);
    assert_eq!(chain.to_sql().unwrap(), "( SELECT * FROM a )");
    assert_eq!(moved.to_sql().unwrap(), "SELECT * FROM a LIMIT 1 OFFSET 0");
}

#[test]
fn union_member_generation_error_propagates() {
    let broken = SelectStatement::new().from("");
    assert!(
        UnionStatement::new(&broken)
            .to_sql()
            .unwrap_err()
            .is_generate()
    );
    assert!(UnionStatement::default().to_sql().unwrap_err().is_generate());
    assert!(
        UnionStatement::from_raw("  ")
            .to_sql()
            .unwrap_err()
            .is_generate()
    );
}
