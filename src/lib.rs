//! Query templating, parameter binding and row decoding over
//! `tokio-postgres` and `rusqlite`.
//!
//! A [`Query`] pairs SQL text with bindings. `?` takes the next binding in
//! order; `:name:` takes a field of any record binding (a `#[derive(Serialize)]`
//! struct) and `:N:` takes the binding at index `N`. The template is rewritten
//! to the backend's own placeholder syntax, values the backend has a column
//! type for are bound directly, and everything else is bound as a JSON
//! document. Rows come back through serde: any `#[derive(Deserialize)]` type
//! can be decoded from a [`Row`].
//!
//! ```rust,no_run
//! use serde::{Deserialize, Serialize};
//! use sql_template_middleware::prelude::*;
//!
//! #[derive(Serialize, Deserialize)]
//! struct Todo {
//!     id: i64,
//!     title: String,
//! }
//!
//! # async fn run() -> Result<(), SqlMiddlewareDbError> {
//! let cap = ConfigAndPool::sqlite_builder(":memory:").build().await?;
//! let db = MiddlewareDatabase::new(cap);
//! db.execute_one(Query::new("CREATE TABLE todos (id INTEGER, title TEXT)")).await?;
//! let todo = Todo { id: 1, title: "write docs".into() };
//! db.execute_one(
//!     Query::new("INSERT INTO todos (id, title) VALUES (:id:, :title:)").bind_serialize(&todo)?,
//! )
//! .await?;
//! let todos: Vec<Todo> = db.execute_as(Query::new("SELECT id, title FROM todos")).await?;
//! assert_eq!(todos.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod codec;
pub mod database;
pub mod error;
pub mod executor;
pub mod middleware;
pub mod pool;
pub mod prelude;
pub mod query;
pub mod results;
pub mod template;
pub mod types;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "test-utils-postgres")]
pub mod test_utils;

pub use database::{Database, MiddlewareDatabase};
pub use error::{BindingError, DecodeError, EncodeError, SqlMiddlewareDbError};
pub use pool::{ConfigAndPool, MiddlewarePool, MiddlewarePoolConnection};
pub use query::Query;
pub use results::{ColumnValue, ResultSet, Row};
pub use types::{DatabaseType, Integer, Value};
