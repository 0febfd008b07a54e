#![cfg(feature = "sqlite")]

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sql_template_middleware::prelude::*;
use sql_template_middleware::{BindingError, DecodeError, query};
use tempfile::tempdir;
use uuid::Uuid;

fn unique_db_path(prefix: &str) -> String {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join(format!("{prefix}.db"));
    // Leak the tempdir so the file persists for the duration of the test binary.
    std::mem::forget(dir);
    path.to_string_lossy().into_owned()
}

fn init_tracing() {
    // Set RUST_LOG=sql_template_middleware=debug to see resolved statements.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

async fn memory_db() -> Result<MiddlewareDatabase, SqlMiddlewareDbError> {
    init_tracing();
    let cap = ConfigAndPool::sqlite_builder(":memory:").build().await?;
    Ok(MiddlewareDatabase::new(cap))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Todo {
    id: i64,
    title: String,
    done: bool,
    due: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Address {
    street: String,
    zip: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Customer {
    id: Uuid,
    name: String,
    address: Address,
    tags: Vec<String>,
}

#[tokio::test]
async fn records_round_trip_through_named_placeholders() -> Result<(), Box<dyn std::error::Error>> {
    let db = memory_db().await?;
    db.execute_one(Query::new(
        "CREATE TABLE todos (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            done INTEGER NOT NULL,
            due TEXT
        )",
    ))
    .await?;

    let due = NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    let todos = vec![
        Todo {
            id: 1,
            title: "write docs".into(),
            done: false,
            due: Some(due),
        },
        Todo {
            id: 2,
            title: "ship".into(),
            done: true,
            due: None,
        },
    ];
    let inserts = todos
        .iter()
        .map(|todo| {
            Query::new(
                "INSERT INTO todos (id, title, done, due) VALUES (:id:, :title:, :done:, :due:)",
            )
            .bind_serialize(todo)
        })
        .collect::<Result<Vec<_>, _>>()?;
    db.execute(&inserts).await?;

    let back: Vec<Todo> = db
        .execute_as(Query::new("SELECT id, title, done, due FROM todos ORDER BY id"))
        .await?;
    assert_eq!(back, todos);

    db.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn nested_values_fall_back_to_json_text() -> Result<(), Box<dyn std::error::Error>> {
    let db = memory_db().await?;
    db.execute_one(Query::new(
        "CREATE TABLE customers (id TEXT, name TEXT, address TEXT, tags TEXT)",
    ))
    .await?;

    let customer = Customer {
        id: Uuid::new_v4(),
        name: "Ada".into(),
        address: Address {
            street: "1 Loop Rd".into(),
            zip: 12345,
        },
        tags: vec!["vip".into(), "early".into()],
    };
    db.execute_one(
        Query::new("INSERT INTO customers VALUES (:id:, :name:, :address:, :tags:)")
            .bind_serialize(&customer)?,
    )
    .await?;

    let rs = db
        .fetch(Query::new("SELECT address, tags FROM customers"))
        .await?;
    assert_eq!(
        rs.results[0].get("address").and_then(ColumnValue::as_text),
        Some(r#"{"street":"1 Loop Rd","zip":12345}"#)
    );

    let back: Vec<Customer> = db
        .execute_as(Query::new("SELECT id, name, address, tags FROM customers"))
        .await?;
    assert_eq!(back, vec![customer]);
    Ok(())
}

#[tokio::test]
async fn positional_keys_and_question_marks() -> Result<(), Box<dyn std::error::Error>> {
    let db = memory_db().await?;
    db.execute_one(Query::new("CREATE TABLE t (v TEXT)")).await?;
    db.execute_one(
        Query::new("INSERT INTO t (v) VALUES (:0:), (:1:)")
            .bind(42_i32)
            .bind("six"),
    )
    .await?;
    db.execute_one(query!("INSERT INTO t (v) VALUES ({})", "seven"))
        .await?;

    let values: Vec<(String,)> = db
        .execute_as(Query::new("SELECT CAST(v AS TEXT) FROM t ORDER BY rowid"))
        .await?;
    assert_eq!(
        values,
        vec![("42".to_string(),), ("six".to_string(),), ("seven".to_string(),)]
    );
    Ok(())
}

#[tokio::test]
async fn resolution_failure_sends_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let db = memory_db().await?;
    db.execute_one(Query::new("CREATE TABLE t (v INTEGER)")).await?;

    let batch = vec![
        Query::new("INSERT INTO t (v) VALUES (?)").bind(1_i64),
        Query::new("INSERT INTO t (v) VALUES (:v"),
    ];
    let err = db.execute(&batch).await.unwrap_err();
    assert!(matches!(
        err,
        SqlMiddlewareDbError::BindingError(BindingError::UnterminatedPlaceholder { .. })
    ));

    let count: Vec<i64> = db.execute_as(Query::new("SELECT COUNT(*) FROM t")).await?;
    assert_eq!(count, vec![0]);
    Ok(())
}

#[tokio::test]
async fn statement_failure_stops_the_batch_without_rollback()
-> Result<(), Box<dyn std::error::Error>> {
    let db = memory_db().await?;
    db.execute_one(Query::new("CREATE TABLE t (v INTEGER NOT NULL)"))
        .await?;

    let batch = vec![
        Query::new("INSERT INTO t (v) VALUES (?)").bind(1_i64),
        Query::new("INSERT INTO t (v) VALUES (?)").bind(Value::Null),
        Query::new("INSERT INTO t (v) VALUES (?)").bind(3_i64),
    ];
    assert!(db.execute(&batch).await.is_err());

    let values: Vec<i64> = db.execute_as(Query::new("SELECT v FROM t")).await?;
    assert_eq!(values, vec![1]);
    Ok(())
}

#[tokio::test]
async fn missing_column_is_reported_by_name() -> Result<(), Box<dyn std::error::Error>> {
    let db = memory_db().await?;
    let without_due = db
        .execute_as::<Todo>(Query::new("SELECT 1 AS id, 'x' AS title, 0 AS done"))
        .await?;
    // `due` is optional, so a missing column decodes as None.
    assert_eq!(without_due[0].due, None);

    let err = db
        .execute_as::<Todo>(Query::new("SELECT 1 AS id, 0 AS done"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SqlMiddlewareDbError::DecodeError(DecodeError::MissingKey(ref k)) if k == "title"
    ));
    Ok(())
}

#[tokio::test]
async fn null_aggregate_decodes_as_none() -> Result<(), Box<dyn std::error::Error>> {
    let db = memory_db().await?;
    db.execute_one(Query::new("CREATE TABLE t (v INTEGER)")).await?;

    let max: Vec<Option<i64>> = db.execute_as(Query::new("SELECT MAX(v) FROM t")).await?;
    assert_eq!(max, vec![None]);

    db.execute_one(Query::new("INSERT INTO t (v) VALUES (?), (?)").bind(4_i64).bind(9_i64))
        .await?;
    let max: Vec<Option<i64>> = db.execute_as(Query::new("SELECT MAX(v) FROM t")).await?;
    assert_eq!(max, vec![Some(9)]);
    Ok(())
}

#[derive(Debug, PartialEq, Deserialize)]
struct Attachment {
    name: String,
    body: Vec<u8>,
}

#[tokio::test]
async fn blob_bytes_round_trip_unchanged() -> Result<(), Box<dyn std::error::Error>> {
    let db = memory_db().await?;
    db.execute_one(Query::new("CREATE TABLE attachments (name TEXT, body BLOB)"))
        .await?;

    // Raw bytes that also happen to be valid JSON.
    let body = b"[1,2]".to_vec();
    db.execute_one(
        Query::new("INSERT INTO attachments (name, body) VALUES (?, ?)")
            .bind("list.json")
            .bind(Value::Bytes(body.clone())),
    )
    .await?;

    let back: Vec<Attachment> = db
        .execute_as(Query::new("SELECT name, body FROM attachments"))
        .await?;
    assert_eq!(
        back,
        vec![Attachment {
            name: "list.json".into(),
            body,
        }]
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn file_database_pool_lease_and_shutdown() -> Result<(), Box<dyn std::error::Error>> {
    let cap = ConfigAndPool::sqlite_builder(unique_db_path("lease"))
        .max_size(3)
        .build()
        .await?;

    cap.lease(|conn| async move {
        conn.execute_batch("CREATE TABLE counters (name TEXT PRIMARY KEY, n INTEGER NOT NULL);")
            .await?;
        conn.execute(
            &Query::new("INSERT INTO counters (name, n) VALUES (?, ?)")
                .bind("hits")
                .bind(0_i64),
            &EncoderOptions::default(),
        )
        .await?;
        Ok::<(), SqlMiddlewareDbError>(())
    })
    .await?;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let cap = cap.clone();
        handles.push(tokio::spawn(async move {
            cap.lease(|conn| async move {
                conn.execute(
                    &Query::new("UPDATE counters SET n = n + 1 WHERE name = ?").bind("hits"),
                    &EncoderOptions::default(),
                )
                .await
            })
            .await
        }));
    }
    for handle in handles {
        assert_eq!(handle.await??, 1);
    }

    let rs = cap
        .lease(|conn| async move {
            conn.fetch(
                &Query::new("SELECT n FROM counters WHERE name = ?").bind("hits"),
                &EncoderOptions::default(),
            )
            .await
        })
        .await?;
    assert_eq!(rs.results[0].get("n").and_then(ColumnValue::as_int), Some(8));
    assert!(cap.pool.connections() <= 3);

    cap.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn lease_returns_the_connection_on_error() -> Result<(), Box<dyn std::error::Error>> {
    let cap = ConfigAndPool::sqlite_builder(":memory:").build().await?;
    let failed: Result<(), SqlMiddlewareDbError> = cap
        .lease(|conn| async move { conn.execute_batch("NOT VALID SQL").await })
        .await;
    assert!(failed.is_err());

    // The single in-memory connection must be back in the pool.
    let ok = cap
        .lease(|conn| async move { conn.execute_batch("SELECT 1").await })
        .await;
    assert!(ok.is_ok());
    Ok(())
}
