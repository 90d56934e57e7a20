use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use stixkb::auth::capabilities;
use stixkb::database::entities::connectors::ConnectorType;
use stixkb::pagination::PageSettings;
use stixkb::services::ConnectorRegistration;
use tracing::warn;

pub const ADMIN_TOKEN_ENV: &str = "STIXKB_ADMIN_TOKEN";
const FALLBACK_ADMIN_TOKEN: &str = "changeme";

/// Platform configuration, read from an optional TOML file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PlatformConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub database: DatabaseSection,
    #[serde(default)]
    pub bus: BusSection,
    #[serde(default)]
    pub pagination: PaginationSection,
    #[serde(default)]
    pub users: Vec<UserConfig>,
    #[serde(default)]
    pub connectors: Vec<ConnectorConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSection {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origin; any origin when unset
    #[serde(default)]
    pub cors_origin: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseSection {
    /// SQLite file, or `:memory:`
    #[serde(default = "default_database_path")]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BusSection {
    #[serde(default = "default_bus_buffer")]
    pub buffer_size: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaginationSection {
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UserConfig {
    pub id: String,
    pub name: String,
    pub token: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectorConfig {
    pub id: String,
    pub name: String,
    /// `INTERNAL_ENRICHMENT` or `INTERNAL_EXPORT_FILE`
    pub connector_type: ConnectorType,
    #[serde(default)]
    pub scope: Vec<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_port() -> u16 {
    4000
}

fn default_database_path() -> String {
    "stixkb.db".to_string()
}

fn default_bus_buffer() -> usize {
    stixkb::app_context::DEFAULT_BUS_BUFFER
}

fn default_page_size() -> u64 {
    25
}

fn default_max_page_size() -> u64 {
    500
}

fn default_active() -> bool {
    true
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            port: default_port(),
            cors_origin: None,
        }
    }
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

impl Default for BusSection {
    fn default() -> Self {
        Self {
            buffer_size: default_bus_buffer(),
        }
    }
}

impl Default for PaginationSection {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

/// Command line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub port: Option<u16>,
    pub database: Option<String>,
    pub cors_origin: Option<String>,
}

impl PlatformConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `path` when given, otherwise starts from defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn apply(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(database) = overrides.database {
            self.database.path = database;
        }
        if overrides.cors_origin.is_some() {
            self.server.cors_origin = overrides.cors_origin;
        }
        self
    }

    fn validate(&self) -> Result<()> {
        if self.pagination.default_page_size == 0 {
            anyhow::bail!("pagination.default_page_size must be positive");
        }
        if self.pagination.default_page_size > self.pagination.max_page_size {
            anyhow::bail!("pagination.default_page_size exceeds pagination.max_page_size");
        }
        if self.bus.buffer_size == 0 {
            anyhow::bail!("bus.buffer_size must be positive");
        }
        let mut tokens = std::collections::HashSet::new();
        for user in &self.users {
            if !tokens.insert(user.token.as_str()) {
                anyhow::bail!("token of user {} is already in use", user.id);
            }
        }
        Ok(())
    }

    pub fn page_settings(&self) -> PageSettings {
        PageSettings {
            default_page_size: self.pagination.default_page_size,
            max_page_size: self.pagination.max_page_size,
        }
    }

    /// Configured users, or a single bypass admin when there are none.
    pub fn effective_users(&self) -> Vec<UserConfig> {
        if !self.users.is_empty() {
            return self.users.clone();
        }
        let token = match std::env::var(ADMIN_TOKEN_ENV) {
            Ok(token) if !token.trim().is_empty() => token,
            _ => {
                warn!(
                    "No users configured and {} is unset, admin token falls back to '{}'",
                    ADMIN_TOKEN_ENV, FALLBACK_ADMIN_TOKEN
                );
                FALLBACK_ADMIN_TOKEN.to_string()
            }
        };
        vec![UserConfig {
            id: "admin".to_string(),
            name: "admin".to_string(),
            token,
            capabilities: vec![capabilities::BYPASS.to_string()],
        }]
    }

    pub fn connector_registrations(&self) -> Vec<ConnectorRegistration> {
        self.connectors
            .iter()
            .map(|c| ConnectorRegistration {
                id: c.id.clone(),
                name: c.name.clone(),
                connector_type: c.connector_type,
                scope: c.scope.clone(),
                active: c.active,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = PlatformConfig::from_toml("").unwrap();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.database.path, "stixkb.db");
        assert_eq!(config.bus.buffer_size, 1024);
        assert_eq!(config.page_settings(), PageSettings::default());
    }

    #[test]
    fn sections_are_parsed() {
        let config = PlatformConfig::from_toml(
            r#"
            [server]
            port = 8080

            [pagination]
            max_page_size = 100

            [[users]]
            id = "u1"
            name = "alice"
            token = "t1"
            capabilities = ["KNOWLEDGE"]

            [[connectors]]
            id = "c1"
            name = "ExportFileStix"
            connector_type = "INTERNAL_EXPORT_FILE"
            scope = ["application/json"]
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.pagination.max_page_size, 100);
        assert_eq!(config.effective_users().len(), 1);
        let connectors = config.connector_registrations();
        assert_eq!(connectors[0].connector_type, ConnectorType::InternalExportFile);
        assert!(connectors[0].active);
    }

    #[test]
    fn duplicate_tokens_are_rejected() {
        let err = PlatformConfig::from_toml(
            r#"
            [[users]]
            id = "u1"
            name = "a"
            token = "same"

            [[users]]
            id = "u2"
            name = "b"
            token = "same"
            "#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn overrides_win() {
        let config = PlatformConfig::default().apply(ConfigOverrides {
            port: Some(9000),
            database: Some(":memory:".to_string()),
            cors_origin: None,
        });
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.database.path, ":memory:");
        assert_eq!(config.server.cors_origin, None);
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stixkb.toml");
        std::fs::write(&path, "[database]\npath = \"kb.db\"\n").unwrap();

        let config = PlatformConfig::load(Some(&path)).unwrap();
        assert_eq!(config.database.path, "kb.db");
        assert!(PlatformConfig::load(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn without_users_a_bypass_admin_exists() {
        let users = PlatformConfig::default().effective_users();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].capabilities, vec![capabilities::BYPASS.to_string()]);
    }
}
