//! PostgreSQL session and message persistence.
//!
//! The pool is shared through `AppState`; each handler call checks out a
//! connection implicitly via sqlx. Schema setup is idempotent and runs at
//! startup.

use crate::types::{AppError, ChatMessage, MessageRole, Result};
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions};

pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL and run idempotent schema setup.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to PostgreSQL: {}", e)))?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Wrap an existing pool (used by tests).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to enable pgvector extension: {}", e))
            })?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS agent_sessions (
                id TEXT PRIMARY KEY,
                user_id TEXT,
                agent_type TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to create agent_sessions: {}", e)))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS session_messages (
                id TEXT PRIMARY KEY,
                session_id TEXT NOT NULL REFERENCES agent_sessions(id) ON DELETE CASCADE,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to create session_messages: {}", e)))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_session_messages_session
             ON session_messages (session_id, created_at)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to create message index: {}", e)))?;

        Ok(())
    }

    // ============== Session Operations ==============

    pub async fn create_session(
        &self,
        id: &str,
        user_id: Option<&str>,
        agent_type: &str,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO agent_sessions (id, user_id, agent_type)
             VALUES ($1, $2, $3)
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(id)
        .bind(user_id)
        .bind(agent_type)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to create session: {}", e)))?;

        Ok(())
    }

    pub async fn session_exists(&self, session_id: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM agent_sessions WHERE id = $1")
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to check session: {}", e)))?;

        Ok(row.is_some())
    }

    // ============== Message Operations ==============

    pub async fn add_message(
        &self,
        id: &str,
        session_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO session_messages (id, session_id, role, content)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(session_id)
        .bind(role.as_str())
        .bind(content)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to add message: {}", e)))?;

        Ok(())
    }

    pub async fn get_session_history(&self, session_id: &str) -> Result<Vec<ChatMessage>> {
        let rows = sqlx::query(
            "SELECT role, content, created_at
             FROM session_messages
             WHERE session_id = $1
             ORDER BY created_at ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to query messages: {}", e)))?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in rows {
            let role: String = row
                .try_get("role")
                .map_err(|e| AppError::Database(e.to_string()))?;
            let content: String = row
                .try_get("content")
                .map_err(|e| AppError::Database(e.to_string()))?;
            let timestamp: DateTime<Utc> = row
                .try_get("created_at")
                .map_err(|e| AppError::Database(e.to_string()))?;

            let role = match role.as_str() {
                "system" => MessageRole::System,
                "assistant" => MessageRole::Assistant,
                _ => MessageRole::User,
            };

            messages.push(ChatMessage {
                role,
                content,
                timestamp,
            });
        }

        Ok(messages)
    }
}
