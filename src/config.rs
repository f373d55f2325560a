//! Environment-based configuration.
//!
//! All configuration is read from environment variables once at process
//! start. A missing `OPENAI_API_KEY` is a hard startup error; everything
//! else carries a default. There is no dynamic reload.

use crate::types::{AppError, Result};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub llm: LlmSettings,
    pub telegram: TelegramSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmSettings {
    pub openai_api_key: String,
    pub openai_api_base: String,
    pub default_model: String,
    pub embedding_model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramSettings {
    pub bot_token: Option<String>,
    pub admin_chat_id: Option<String>,
}

/// Read an optional variable, treating empty strings and the literal
/// `"None"` (leaks in from docker-compose interpolation) as unset.
fn env_or(key: &str, default: &str) -> String {
    match env::var(key) {
        Ok(value) if !value.is_empty() && value != "None" => value,
        _ => default.to_string(),
    }
}

impl Settings {
    /// Load settings from the environment, `.env` file included.
    ///
    /// Fails fast when `OPENAI_API_KEY` is absent so the process never
    /// starts serving routes it cannot back.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let openai_api_key = env::var("OPENAI_API_KEY").map_err(|_| {
            AppError::Configuration(
                "OPENAI_API_KEY is required but not set".to_string(),
            )
        })?;
        if openai_api_key.is_empty() {
            return Err(AppError::Configuration(
                "OPENAI_API_KEY is required but empty".to_string(),
            ));
        }

        Ok(Settings {
            server: ServerSettings {
                host: env_or("HOST", "0.0.0.0"),
                port: env_or("PORT", "8000")
                    .parse()
                    .map_err(|e| AppError::Configuration(format!("Invalid PORT: {}", e)))?,
            },
            database: DatabaseSettings {
                user: env_or("DB_USER", "ai"),
                password: env_or("DB_PASS", "ai"),
                host: env_or("DB_HOST", "localhost"),
                port: env_or("DB_PORT", "5432")
                    .parse()
                    .map_err(|e| AppError::Configuration(format!("Invalid DB_PORT: {}", e)))?,
                database: env_or("DB_DATABASE", "ai"),
            },
            llm: LlmSettings {
                openai_api_key,
                openai_api_base: env_or("OPENAI_API_BASE", "https://api.openai.com/v1"),
                default_model: env_or("DEFAULT_MODEL", "gpt-4.1"),
                embedding_model: env_or("EMBEDDING_MODEL", "text-embedding-3-small"),
            },
            telegram: TelegramSettings {
                bot_token: env::var("TELEGRAM_BOT_TOKEN")
                    .ok()
                    .filter(|v| !v.is_empty() && v != "None"),
                admin_chat_id: env::var("TELEGRAM_ADMIN_CHAT_ID")
                    .ok()
                    .filter(|v| !v.is_empty() && v != "None"),
            },
        })
    }

    /// Assemble the PostgreSQL connection URL from the database settings.
    pub fn database_url(&self) -> String {
        let DatabaseSettings {
            user,
            password,
            host,
            port,
            database,
        } = &self.database;

        if password.is_empty() {
            format!("postgres://{}@{}:{}/{}", user, host, port, database)
        } else {
            format!(
                "postgres://{}:{}@{}:{}/{}",
                user, password, host, port, database
            )
        }
    }

    /// Socket address the HTTP server binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_settings() -> Settings {
        Settings {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 8000,
            },
            database: DatabaseSettings {
                user: "ai".to_string(),
                password: "ai".to_string(),
                host: "localhost".to_string(),
                port: 5432,
                database: "ai".to_string(),
            },
            llm: LlmSettings {
                openai_api_key: "sk-test".to_string(),
                openai_api_base: "https://api.openai.com/v1".to_string(),
                default_model: "gpt-4.1".to_string(),
                embedding_model: "text-embedding-3-small".to_string(),
            },
            telegram: TelegramSettings {
                bot_token: None,
                admin_chat_id: None,
            },
        }
    }

    #[test]
    fn test_database_url_with_defaults() {
        let settings = test_settings();
        assert_eq!(settings.database_url(), "postgres://ai:ai@localhost:5432/ai");
    }

    #[test]
    fn test_database_url_without_password() {
        let mut settings = test_settings();
        settings.database.password = String::new();
        assert_eq!(settings.database_url(), "postgres://ai@localhost:5432/ai");
    }

    #[test]
    fn test_bind_addr() {
        let settings = test_settings();
        assert_eq!(settings.bind_addr(), "127.0.0.1:8000");
    }

    // One test for all from_env scenarios: the environment is process-global
    // and parallel test threads would otherwise race on these variables.
    #[test]
    fn test_from_env_requires_api_key_and_reflects_values() {
        env::remove_var("OPENAI_API_KEY");
        let err = Settings::from_env().err().expect("must fail without key");
        assert!(matches!(err, AppError::Configuration(_)));
        assert!(err.to_string().contains("OPENAI_API_KEY"));

        env::set_var("OPENAI_API_KEY", "");
        let err = Settings::from_env().err().expect("must fail on empty key");
        assert!(matches!(err, AppError::Configuration(_)));

        env::set_var("OPENAI_API_KEY", "sk-test");
        env::set_var("HOST", "127.0.0.1");
        env::set_var("PORT", "9100");
        env::set_var("DB_HOST", "db.internal");
        env::set_var("DEFAULT_MODEL", "gpt-4o-mini");
        env::set_var("TELEGRAM_BOT_TOKEN", "123:abc");

        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.llm.openai_api_key, "sk-test");
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 9100);
        assert_eq!(settings.database.host, "db.internal");
        assert_eq!(settings.database.user, "ai");
        assert_eq!(settings.llm.default_model, "gpt-4o-mini");
        assert_eq!(settings.telegram.bot_token.as_deref(), Some("123:abc"));
        assert_eq!(settings.telegram.admin_chat_id, None);

        for key in [
            "OPENAI_API_KEY",
            "HOST",
            "PORT",
            "DB_HOST",
            "DEFAULT_MODEL",
            "TELEGRAM_BOT_TOKEN",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_env_or_treats_none_string_as_unset() {
        // DB_HOST set to the literal "None" must fall back to the default
        let key = "ATLAS_TEST_ENV_OR_NONE";
        env::set_var(key, "None");
        assert_eq!(env_or(key, "localhost"), "localhost");

        env::set_var(key, "");
        assert_eq!(env_or(key, "localhost"), "localhost");

        env::set_var(key, "db.internal");
        assert_eq!(env_or(key, "localhost"), "db.internal");
        env::remove_var(key);
    }
}
