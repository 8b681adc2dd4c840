//! PostgreSQL-backed repository: one JSONB table per repository binding, living in the schema
//! named by `SEARCH_API_SCHEMA` (default `search_api`). A bulk request runs in one transaction.

use super::{BulkAction, BulkItem, BulkOperation, BulkResponse, Document, DocumentRepository};
use crate::error::RepositoryError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::ConnectOptions;
use sqlx::PgPool;
use std::str::FromStr;

/// Schema for repository tables. From env `SEARCH_API_SCHEMA`, default `search_api`.
pub fn repository_schema() -> String {
    std::env::var("SEARCH_API_SCHEMA").unwrap_or_else(|_| "search_api".into())
}

/// Longest readable part of a table name; leaves room for `_` and the digest within
/// the 63-byte identifier limit of PostgreSQL.
const TABLE_PREFIX_MAX: usize = 54;

/// Table name for a repository id: the id lowercased with anything outside `[a-z0-9]`
/// turned into `_`, followed by eight hex digits of a SHA-1 name digest of the exact id,
/// so `a.b`, `a_b` and `A.b` get separate tables
/// (e.g. `es.manager.default.products` -> `es_manager_default_products_<digest>`).
pub fn table_name(repository_id: &str) -> String {
    let readable: String = repository_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .take(TABLE_PREFIX_MAX)
        .collect();
    let digest = uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, repository_id.as_bytes())
        .simple()
        .to_string();
    format!("{}_{}", readable, &digest[..8])
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub struct PgRepository {
    pool: PgPool,
    /// Schema-qualified, quoted table name.
    table: String,
}

impl PgRepository {
    /// Bind a repository id to its table, creating schema and table if missing.
    pub async fn connect(pool: PgPool, repository_id: &str) -> Result<Self, RepositoryError> {
        let schema = repository_schema();
        let table = format!("{}.{}", quote_ident(&schema), quote_ident(&table_name(repository_id)));
        sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(&schema)))
            .execute(&pool)
            .await?;
        let ddl = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id TEXT PRIMARY KEY,
                source JSONB NOT NULL,
                version BIGINT NOT NULL DEFAULT 1,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            table
        );
        sqlx::query(&ddl).execute(&pool).await?;
        tracing::info!(repository = %repository_id, table = %table, "postgres repository ready");
        Ok(PgRepository { pool, table })
    }

    async fn apply(
        tx: &mut sqlx::PgConnection,
        table: &str,
        op: BulkOperation,
    ) -> Result<BulkItem, RepositoryError> {
        let action = op.action();
        let (sql, id, payload) = match op {
            BulkOperation::Create { id, source } => (
                format!(
                    "INSERT INTO {} (id, source) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING RETURNING id",
                    table
                ),
                id,
                Some(Value::Object(source)),
            ),
            BulkOperation::Update { id, patch } => (
                format!(
                    "UPDATE {} SET source = source || $2, version = version + 1, updated_at = NOW() WHERE id = $1 RETURNING id",
                    table
                ),
                id,
                Some(Value::Object(patch)),
            ),
            BulkOperation::Delete { id } => (format!("DELETE FROM {} WHERE id = $1 RETURNING id", table), id, None),
        };
        tracing::debug!(sql = %sql, id = %id, "query (tx)");
        let mut query = sqlx::query_scalar::<_, String>(&sql).bind(&id);
        if let Some(payload) = payload {
            query = query.bind(payload);
        }
        let applied = query.fetch_optional(&mut *tx).await?;
        Ok(match (applied, action) {
            (Some(_), _) => BulkItem::ok(action, id),
            (None, BulkAction::Create) => {
                let reason = format!("document '{}' already exists", id);
                BulkItem::failed(action, id, RepositoryError::Conflict(reason))
            }
            (None, _) => {
                let reason = format!("document '{}' does not exist", id);
                BulkItem::failed(action, id, RepositoryError::NotFound(reason))
            }
        })
    }
}

fn into_document(id: String, source: Value) -> Document {
    let source = match source {
        Value::Object(m) => m,
        _ => Map::new(),
    };
    Document { id, source }
}

#[async_trait]
impl DocumentRepository for PgRepository {
    async fn find(&self, id: &str) -> Result<Option<Document>, RepositoryError> {
        let sql = format!("SELECT id, source FROM {} WHERE id = $1", self.table);
        tracing::debug!(sql = %sql, id = %id, "query");
        let row = sqlx::query_as::<_, (String, Value)>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(id, source)| into_document(id, source)))
    }

    async fn find_all(&self) -> Result<Vec<Document>, RepositoryError> {
        let sql = format!("SELECT id, source FROM {} ORDER BY id", self.table);
        tracing::debug!(sql = %sql, "query");
        let rows = sqlx::query_as::<_, (String, Value)>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(id, source)| into_document(id, source)).collect())
    }

    async fn bulk(&self, operations: Vec<BulkOperation>) -> Result<BulkResponse, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let mut items = Vec::with_capacity(operations.len());
        for op in operations {
            items.push(Self::apply(&mut tx, &self.table, op).await?);
        }
        tx.commit().await?;
        Ok(BulkResponse::from_items(items))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }
}

/// Ensure the database in `database_url` exists; create it if not. Connects to the
/// default `postgres` database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), RepositoryError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| RepositoryError::Backend(format!("invalid DATABASE_URL: {}", e)))?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
        tracing::info!(database = %db_name, "created database");
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), RepositoryError> {
    let path_start = url
        .rfind('/')
        .ok_or_else(|| RepositoryError::Backend("DATABASE_URL: no path".into()))?
        + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    let admin_url = format!("{}postgres", base);
    Ok((admin_url, db_name.to_string()))
}
