use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;

use crate::engine::Neo4jSettings;
use crate::guard_error::ConfigError;
use crate::validator::{KeywordSet, PlanPolicy};

const CONFIG_FILE_NAME: &str = "query-guard.toml";
const ENV_PREFIX: &str = "WIKIGRAPH_GUARD";

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub url: String,
    pub database: String,
    pub username: String,
    pub password: String,
    pub request_timeout_ms: u64,
    pub max_rows: usize,
    /// Read-only user for the explain path
    pub validation_username: Option<String>,
    pub validation_password: Option<String>,
    /// Explain with the execution credential when no validation user is set
    #[serde(default)]
    pub allow_shared_credential: bool,
}

impl EngineConfig {
    pub fn execution_settings(&self) -> Neo4jSettings {
        Neo4jSettings {
            url: self.url.clone(),
            database: self.database.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            max_rows: self.max_rows,
        }
    }

    /// `None` when the execution credential is reused for explaining
    pub fn validation_settings(&self) -> Option<Neo4jSettings> {
        let username = self.validation_username.clone()?;
        Some(Neo4jSettings {
            username,
            password: self.validation_password.clone().unwrap_or_default(),
            ..self.execution_settings()
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidationConfig {
    pub timeout_ms: u64,
    pub explain_timeout_ms: u64,
    pub keyword_set: Option<KeywordSet>,
    #[serde(default)]
    pub allowed_procedures: Vec<String>,
    pub write_operators: Option<Vec<String>>,
}

impl ValidationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn explain_timeout(&self) -> Duration {
        Duration::from_millis(self.explain_timeout_ms)
    }

    pub fn keyword_set(&self) -> KeywordSet {
        self.keyword_set.clone().unwrap_or_default()
    }

    pub fn plan_policy(&self) -> PlanPolicy {
        let mut policy =
            PlanPolicy::default().with_allowed_procedures(self.allowed_procedures.clone());
        if let Some(write_operators) = &self.write_operators {
            policy.write_operators = write_operators.clone();
        }
        policy
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GuardConfig {
    pub engine: EngineConfig,
    pub validation: ValidationConfig,
    pub logging: LoggingConfig,
}

impl GuardConfig {
    /// Defaults, then `query-guard.toml` in the working directory, then the
    /// user config directory, then environment variables such as
    /// `WIKIGRAPH_GUARD_ENGINE__URL`
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Self::defaults()?;

        let settings = if let Ok(current_dir) = env::current_dir() {
            settings.add_source(File::from(current_dir.join(CONFIG_FILE_NAME)).required(false))
        } else {
            settings
        };

        let settings = if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("wikigraph").join(CONFIG_FILE_NAME);
            settings.add_source(File::from(config_path).required(false))
        } else {
            settings
        };

        settings
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::defaults()?
            .add_source(File::from(path))
            .build()?
            .try_deserialize()
    }

    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        Self::defaults()?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("engine.url", "http://localhost:7474")?
            .set_default("engine.database", "neo4j")?
            .set_default("engine.username", "neo4j")?
            .set_default("engine.password", "")?
            .set_default("engine.request_timeout_ms", 10_000)?
            .set_default("engine.max_rows", 1000)?
            .set_default("engine.allow_shared_credential", false)?
            .set_default("validation.timeout_ms", 5_000)?
            .set_default("validation.explain_timeout_ms", 3_000)?
            .set_default("logging.level", "info")
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig {
                url: "http://localhost:7474".to_string(),
                database: "neo4j".to_string(),
                username: "neo4j".to_string(),
                password: String::new(),
                request_timeout_ms: 10_000,
                max_rows: 1000,
                validation_username: None,
                validation_password: None,
                allow_shared_credential: false,
            },
            validation: ValidationConfig {
                timeout_ms: 5_000,
                explain_timeout_ms: 3_000,
                keyword_set: None,
                allowed_procedures: Vec::new(),
                write_operators: None,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::BUILTIN_KEYWORD_SET_VERSION;
    use std::io::Write;

    #[test]
    fn test_defaults_when_no_sources() {
        let config = GuardConfig::from_toml_str("").unwrap();
        assert_eq!(config.engine.url, "http://localhost:7474");
        assert_eq!(config.engine.max_rows, 1000);
        assert_eq!(config.validation.timeout(), Duration::from_secs(5));
        assert_eq!(config.validation.explain_timeout(), Duration::from_secs(3));
        assert_eq!(config.logging.level, "info");
        assert_eq!(
            config.validation.keyword_set().version(),
            BUILTIN_KEYWORD_SET_VERSION
        );
        assert!(config.engine.validation_settings().is_none());
        assert!(!config.engine.allow_shared_credential);
        assert_eq!(config.validation.plan_policy(), PlanPolicy::default());
    }

    #[test]
    fn test_overrides_from_toml() {
        let config = GuardConfig::from_toml_str(
            r#"
            [engine]
            url = "https://graph.internal:7473"
            database = "wiki"
            password = "secret"
            validation_username = "wiki_reader"
            validation_password = "reader-secret"

            [validation]
            timeout_ms = 2000
            allowed_procedures = ["db.labels"]
            write_operators = ["Create", "Delete"]

            [validation.keyword_set]
            version = "site-2"
            keywords = ["create", "delete", "call"]
            "#,
        )
        .unwrap();

        let execution = config.engine.execution_settings();
        assert_eq!(execution.database, "wiki");
        assert_eq!(execution.username, "neo4j");

        let validation = config.engine.validation_settings().unwrap();
        assert_eq!(validation.username, "wiki_reader");
        assert_eq!(validation.password, "reader-secret");
        assert_eq!(validation.url, "https://graph.internal:7473");

        assert_eq!(config.validation.timeout(), Duration::from_secs(2));
        let keyword_set = config.validation.keyword_set();
        assert_eq!(keyword_set.version(), "site-2");
        assert_eq!(keyword_set.keywords().len(), 3);

        let policy = config.validation.plan_policy();
        assert_eq!(policy.allowed_procedures, vec!["db.labels".to_string()]);
        assert_eq!(policy.write_operators.len(), 2);
    }

    #[test]
    fn test_invalid_keyword_set_is_a_config_error() {
        let result = GuardConfig::from_toml_str(
            r#"
            [validation.keyword_set]
            version = "broken"
            keywords = ["DROP TABLE"]
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[logging]\nlevel = \"debug\"").unwrap();

        let config = GuardConfig::from_file(file.path()).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.engine.database, "neo4j");
    }

    #[test]
    fn test_default_matches_builder_defaults() {
        let built = GuardConfig::from_toml_str("").unwrap();
        let default = GuardConfig::default();
        assert_eq!(built.engine.url, default.engine.url);
        assert_eq!(built.engine.request_timeout_ms, default.engine.request_timeout_ms);
        assert_eq!(built.validation.timeout_ms, default.validation.timeout_ms);
        assert_eq!(built.logging.level, default.logging.level);
    }
}
