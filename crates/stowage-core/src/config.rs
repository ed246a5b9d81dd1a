//! Configuration module
//!
//! Process configuration is loaded once from the environment at startup.
//! Container definitions are explicit values passed to constructors; the
//! process-wide registry below exists only for production wiring in `main`
//! and refuses to answer in test builds.

use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// Common constants
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const CLEANUP_INTERVAL_SECS: u64 = 3600;
const RESIZE_SWEEP_INTERVAL_SECS: u64 = 3600;
const DEFAULT_REGION: &str = "us-east-1";

/// Credentials and visibility for one object-store container.
///
/// Immutable once built. Services receive these explicitly; only `main`
/// resolves them through the global registry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContainerConfig {
    pub name: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// Custom endpoint for S3-compatible providers (MinIO, DigitalOcean Spaces, etc.)
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

impl ContainerConfig {
    /// Root URL objects in a public container are served from.
    pub fn public_root(&self) -> String {
        format!("https://{}.s3.amazonaws.com/", self.name)
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    /// Local directory downloads are staged in before reads and resizes.
    pub scratch_dir: PathBuf,
    pub containers: Vec<ContainerConfig>,
    /// Container the built-in image kind claims into.
    pub image_container: Option<String>,
    /// Containers that are safe targets for destructive reconciliation.
    /// `None` means never declared, which blocks reconciler deletes.
    pub non_production_containers: Option<Vec<String>>,
    /// `None` means the deployment never said either way, which also blocks
    /// reconciler deletes outside the allow-list.
    pub production: Option<bool>,
    pub cleanup_interval_seconds: u64,
    pub resize_sweep_interval_seconds: u64,
    pub environment: String,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let cors_origins = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let containers_json = env::var("STORAGE_CONTAINERS").map_err(|_| {
            anyhow::anyhow!("STORAGE_CONTAINERS must be set (JSON array of container configs)")
        })?;
        let containers: Vec<ContainerConfig> = serde_json::from_str(&containers_json)
            .map_err(|e| anyhow::anyhow!("STORAGE_CONTAINERS is not valid JSON: {}", e))?;

        // Comma-separated list; absent is deliberately distinct from empty.
        let non_production_containers = env::var("NON_PRODUCTION_CONTAINERS").ok().map(|raw| {
            raw.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        // Anything other than "true"/"false" counts as undeclared, which is
        // the blocking value for destructive actions.
        let production = env::var("PRODUCTION")
            .ok()
            .and_then(|raw| match raw.trim().to_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            });

        Ok(Config {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            scratch_dir: env::var("SCRATCH_DIR")
                .unwrap_or_else(|_| "/tmp/stowage".to_string())
                .into(),
            containers,
            image_container: env::var("IMAGE_CONTAINER").ok(),
            non_production_containers,
            production,
            cleanup_interval_seconds: env::var("CLEANUP_INTERVAL_SECONDS")
                .unwrap_or_else(|_| CLEANUP_INTERVAL_SECS.to_string())
                .parse()
                .unwrap_or(CLEANUP_INTERVAL_SECS),
            resize_sweep_interval_seconds: env::var("RESIZE_SWEEP_INTERVAL_SECONDS")
                .unwrap_or_else(|_| RESIZE_SWEEP_INTERVAL_SECS.to_string())
                .parse()
                .unwrap_or(RESIZE_SWEEP_INTERVAL_SECS),
            environment,
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.database_url.is_empty() {
            return Err(anyhow::anyhow!("DATABASE_URL must not be empty"));
        }
        if self.containers.is_empty() {
            return Err(anyhow::anyhow!(
                "at least one container must be configured in STORAGE_CONTAINERS"
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for container in &self.containers {
            if container.name.is_empty() {
                return Err(anyhow::anyhow!("container names must not be empty"));
            }
            if !seen.insert(container.name.as_str()) {
                return Err(anyhow::anyhow!(
                    "container '{}' is configured twice",
                    container.name
                ));
            }
            if container.access_key_id.is_empty() || container.secret_access_key.is_empty() {
                return Err(anyhow::anyhow!(
                    "container '{}' is missing credentials",
                    container.name
                ));
            }
        }
        if let Some(name) = &self.image_container {
            if !self.containers.iter().any(|c| &c.name == name) {
                return Err(anyhow::anyhow!(
                    "IMAGE_CONTAINER '{}' is not in STORAGE_CONTAINERS",
                    name
                ));
            }
        }
        Ok(())
    }

    pub fn container(&self, name: &str) -> Result<&ContainerConfig, ConfigError> {
        self.containers
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| ConfigError::UnknownContainer(name.to_string()))
    }
}

static GLOBAL_CONTAINERS: OnceLock<Vec<ContainerConfig>> = OnceLock::new();

/// Install the process-wide container registry. Production wiring only;
/// fails if called twice.
pub fn install_global_containers(containers: Vec<ContainerConfig>) -> Result<(), ConfigError> {
    GLOBAL_CONTAINERS
        .set(containers)
        .map_err(|_| ConfigError::Invalid("global container registry already installed".into()))
}

/// Resolve a container from the process-wide registry.
///
/// Test builds always get `ConfigError::TestContext`: tests must construct
/// services with explicit `ContainerConfig` values instead of leaning on
/// ambient process state.
pub fn global_container(name: &str) -> Result<ContainerConfig, ConfigError> {
    if cfg!(test) {
        return Err(ConfigError::TestContext);
    }
    let containers = GLOBAL_CONTAINERS
        .get()
        .ok_or_else(|| ConfigError::Invalid("global container registry not installed".into()))?;
    containers
        .iter()
        .find(|c| c.name == name)
        .cloned()
        .ok_or_else(|| ConfigError::UnknownContainer(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container(name: &str) -> ContainerConfig {
        ContainerConfig {
            name: name.to_string(),
            access_key_id: "AKIATEST".to_string(),
            secret_access_key: "secret".to_string(),
            region: DEFAULT_REGION.to_string(),
            endpoint: None,
            is_public: false,
        }
    }

    fn base_config() -> Config {
        Config {
            server_port: 4000,
            cors_origins: vec!["*".to_string()],
            database_url: "postgres://localhost/stowage".to_string(),
            db_max_connections: MAX_CONNECTIONS,
            db_timeout_seconds: CONNECTION_TIMEOUT_SECS,
            scratch_dir: "/tmp/stowage".into(),
            containers: vec![container("bucket-a")],
            image_container: None,
            non_production_containers: None,
            production: None,
            cleanup_interval_seconds: CLEANUP_INTERVAL_SECS,
            resize_sweep_interval_seconds: RESIZE_SWEEP_INTERVAL_SECS,
            environment: "test".to_string(),
        }
    }

    #[test]
    fn container_config_parses_from_json() {
        let json = r#"[{"name": "bucket-a", "access_key_id": "AKIA", "secret_access_key": "s3cr3t", "is_public": true}]"#;
        let parsed: Vec<ContainerConfig> = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].name, "bucket-a");
        assert_eq!(parsed[0].region, DEFAULT_REGION);
        assert!(parsed[0].is_public);
    }

    #[test]
    fn validate_rejects_duplicate_container_names() {
        let mut config = base_config();
        config.containers.push(container("bucket-a"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_image_container() {
        let mut config = base_config();
        config.image_container = Some("nope".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_accepts_well_formed_config() {
        let mut config = base_config();
        config.image_container = Some("bucket-a".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn public_root_derives_from_container_name() {
        assert_eq!(
            container("photos").public_root(),
            "https://photos.s3.amazonaws.com/"
        );
    }

    #[test]
    fn global_registry_refuses_test_builds() {
        let err = global_container("bucket-a").unwrap_err();
        assert!(matches!(err, ConfigError::TestContext));
    }
}
