//! Postgres session checkpoint backend
//!
//! Serializes the full conversation state as JSON, one row per session.
//! Schema bootstrap happens lazily on first use.

use crate::models::ConversationState;
use crate::session::SessionStore;
use crate::Result;
use sqlx::{PgPool, Row};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

pub struct PostgresSessionStore {
    pool: PgPool,
    schema_ready: Arc<OnceCell<()>>,
}

impl PostgresSessionStore {
    pub fn connect_lazy(database_url: &str) -> Result<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect_lazy(database_url)
            .map_err(|e| {
                crate::error::OrchestrationError::DatabaseError(format!(
                    "Failed to initialize session store pool: {}",
                    e
                ))
            })?;

        info!("Session store backend: postgres");
        Ok(Self {
            pool,
            schema_ready: Arc::new(OnceCell::new()),
        })
    }

    async fn ensure_schema(&self) -> Result<()> {
        self.schema_ready
            .get_or_try_init(|| async {
                sqlx::query(
                    r#"
                    CREATE TABLE IF NOT EXISTS conversation_sessions (
                      session_id TEXT PRIMARY KEY,
                      state TEXT NOT NULL,
                      pending_interrupt BOOLEAN NOT NULL DEFAULT FALSE,
                      updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                    );
                    "#,
                )
                .execute(&self.pool)
                .await?;

                Ok::<(), sqlx::Error>(())
            })
            .await
            .map_err(|e| {
                crate::error::OrchestrationError::DatabaseError(format!(
                    "Failed to initialize session schema: {}",
                    e
                ))
            })?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl SessionStore for PostgresSessionStore {
    async fn load(&self, session_id: &str) -> Result<Option<ConversationState>> {
        self.ensure_schema().await?;

        let row = sqlx::query("SELECT state FROM conversation_sessions WHERE session_id = $1")
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                crate::error::OrchestrationError::DatabaseError(format!(
                    "Failed to load session: {}",
                    e
                ))
            })?;

        match row {
            Some(row) => {
                let raw: String = row.try_get("state").map_err(|e| {
                    crate::error::OrchestrationError::DatabaseError(format!(
                        "Failed to read session state column: {}",
                        e
                    ))
                })?;
                let state = serde_json::from_str(&raw)?;
                Ok(Some(state))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, session_id: &str, state: &ConversationState) -> Result<()> {
        self.ensure_schema().await?;

        let value = serde_json::to_string(state)?;
        sqlx::query(
            r#"
            INSERT INTO conversation_sessions (session_id, state, pending_interrupt, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (session_id)
            DO UPDATE SET state = $2, pending_interrupt = $3, updated_at = NOW()
            "#,
        )
        .bind(session_id)
        .bind(value)
        .bind(state.has_pending_interrupt())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            crate::error::OrchestrationError::DatabaseError(format!(
                "Failed to save session: {}",
                e
            ))
        })?;

        Ok(())
    }

    async fn has_pending_interrupt(&self, session_id: &str) -> Result<bool> {
        self.ensure_schema().await?;

        let row = sqlx::query(
            "SELECT pending_interrupt FROM conversation_sessions WHERE session_id = $1",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            crate::error::OrchestrationError::DatabaseError(format!(
                "Failed to query pending interrupt: {}",
                e
            ))
        })?;

        Ok(row
            .map(|row| row.try_get("pending_interrupt").unwrap_or(false))
            .unwrap_or(false))
    }
}
