//! Embedded relational store used by the audit log (spec §4.4, §6: "backed
//! by a relational store with schema fixed in §6").
//!
//! Wraps an embedded SurrealDB instance (SurrealKV engine, on-disk at
//! `<state_dir>/audit.db`) behind a thin, crate-agnostic query surface.
//! `unclaude-audit` owns the actual `audit_events` schema and SurrealQL.

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, SurrealKv};
use surrealdb::opt::auth::Root;

use crate::error::{StorageError, StorageResult};

/// Embedded SurrealDB handle for a single namespace/database pair.
pub struct Database {
    db: Surreal<Db>,
}

impl Database {
    /// Open (or create) the database file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Database`] if the embedded engine fails to
    /// start or the namespace/database cannot be selected.
    pub async fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Surreal::new::<SurrealKv>(path.as_ref())
            .await
            .map_err(|e| StorageError::Database(e.to_string()))?;

        db.use_ns("unclaude")
            .use_db("core")
            .await
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(Self { db })
    }

    /// Open an in-memory database, used by tests.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Database`] if the embedded engine fails to start.
    pub async fn open_memory() -> StorageResult<Self> {
        use surrealdb::engine::local::Mem;
        let db = Surreal::new::<Mem>(())
            .await
            .map_err(|e| StorageError::Database(e.to_string()))?;
        db.use_ns("unclaude")
            .use_db("core")
            .await
            .map_err(|e| StorageError::Database(e.to_string()))?;
        Ok(Self { db })
    }

    /// Authenticate with root credentials, used when the embedded engine is
    /// configured to require auth (not the default for local engines, kept
    /// for parity with remote-deployment SurrealDB configurations).
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Database`] if authentication fails.
    pub async fn sign_in_root(&self, username: &str, password: &str) -> StorageResult<()> {
        self.db
            .signin(Root { username, password })
            .await
            .map_err(|e| StorageError::Database(e.to_string()))?;
        Ok(())
    }

    /// Run schema-definition statements (idempotent `DEFINE TABLE`/`DEFINE
    /// FIELD`/`DEFINE INDEX`).
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Database`] if the DDL fails to apply.
    pub async fn define_schema(&self, ddl: &str) -> StorageResult<()> {
        self.db
            .query(ddl)
            .await
            .map_err(|e| StorageError::Database(e.to_string()))?;
        Ok(())
    }

    /// Run a query with bound parameters and decode every statement's first
    /// result set as `Vec<T>`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Database`] if the query fails or the result
    /// cannot be decoded as `T`.
    pub async fn query<T: DeserializeOwned>(
        &self,
        sql: &str,
        bindings: Vec<(&str, serde_json::Value)>,
    ) -> StorageResult<Vec<T>> {
        let mut query = self.db.query(sql);
        for (name, value) in bindings {
            query = query.bind((name.to_owned(), value));
        }
        let mut response = query.await.map_err(|e| StorageError::Database(e.to_string()))?;
        response
            .take(0)
            .map_err(|e| StorageError::Database(e.to_string()))
    }

    /// Run a statement purely for its side effect (e.g. `INSERT IGNORE`,
    /// `UPDATE`), discarding the result set.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Database`] if the statement fails.
    pub async fn execute(&self, sql: &str, bindings: Vec<(&str, serde_json::Value)>) -> StorageResult<()> {
        let mut query = self.db.query(sql);
        for (name, value) in bindings {
            query = query.bind((name.to_owned(), value));
        }
        query.await.map_err(|e| StorageError::Database(e.to_string()))?;
        Ok(())
    }

    /// Insert (or upsert) a record, serialized from `value`, into `table`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Database`] if serialization or the write fails.
    pub async fn create<T: Serialize>(&self, table: &str, value: T) -> StorageResult<()> {
        self.db
            .create::<Option<serde_json::Value>>(table)
            .content(value)
            .await
            .map_err(|e| StorageError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Row {
        n: i64,
    }

    #[tokio::test]
    async fn memory_db_round_trips_a_query() {
        let db = Database::open_memory().await.unwrap();
        db.define_schema("DEFINE TABLE rows SCHEMALESS;").await.unwrap();
        db.execute(
            "CREATE rows SET n = $n",
            vec![("n", serde_json::json!(7))],
        )
        .await
        .unwrap();
        let rows: Vec<Row> = db.query("SELECT n FROM rows", vec![]).await.unwrap();
        assert_eq!(rows, vec![Row { n: 7 }]);
    }
}
