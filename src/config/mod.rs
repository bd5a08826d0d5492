use std::env;
use std::time::Duration;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub hierarchy: HierarchyConfig,
    pub provisioning: ProvisioningConfig,
    pub audit: AuditConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub bootstrap: BootstrapConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchyConfig {
    /// Hard cap on tree walks; the real tree is six levels deep
    pub max_traversal_depth: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisioningConfig {
    pub store_timeout_ms: u64,
    pub identity_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Municipal coverage ratio under which the auditor emits a suggestion
    pub min_municipal_coverage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    pub root_email: Option<String>,
    pub root_name: String,
}

impl ProvisioningConfig {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn identity_timeout(&self) -> Duration {
        Duration::from_millis(self.identity_timeout_ms)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Hierarchy overrides
        if let Ok(v) = env::var("HIERARCHY_MAX_TRAVERSAL_DEPTH") {
            self.hierarchy.max_traversal_depth = v.parse().unwrap_or(self.hierarchy.max_traversal_depth);
        }

        // Provisioning overrides
        if let Ok(v) = env::var("PROVISIONING_STORE_TIMEOUT_MS") {
            self.provisioning.store_timeout_ms = v.parse().unwrap_or(self.provisioning.store_timeout_ms);
        }
        if let Ok(v) = env::var("PROVISIONING_IDENTITY_TIMEOUT_MS") {
            self.provisioning.identity_timeout_ms = v.parse().unwrap_or(self.provisioning.identity_timeout_ms);
        }

        // Audit overrides
        if let Ok(v) = env::var("AUDIT_MIN_MUNICIPAL_COVERAGE") {
            self.audit.min_municipal_coverage = v
                .parse::<f64>()
                .ok()
                .filter(|ratio| (0.0..=1.0).contains(ratio))
                .unwrap_or(self.audit.min_municipal_coverage);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_BACKEND") {
            self.database.backend = match v.as_str() {
                "memory" => StoreBackend::Memory,
                "postgres" | "postgresql" => StoreBackend::Postgres,
                _ => self.database.backend,
            };
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // API overrides
        if let Ok(v) = env::var("ORG_API_PORT").or_else(|_| env::var("PORT")) {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }

        // Bootstrap overrides
        if let Ok(v) = env::var("ORG_ROOT_EMAIL") {
            self.bootstrap.root_email = Some(v).filter(|e| !e.trim().is_empty());
        }
        if let Ok(v) = env::var("ORG_ROOT_NAME") {
            self.bootstrap.root_name = v;
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            hierarchy: HierarchyConfig {
                max_traversal_depth: 16,
            },
            provisioning: ProvisioningConfig {
                store_timeout_ms: 5_000,
                identity_timeout_ms: 5_000,
            },
            audit: AuditConfig {
                min_municipal_coverage: 0.5,
            },
            database: DatabaseConfig {
                backend: StoreBackend::Memory,
                max_connections: 10,
                connection_timeout: 30,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                jwt_secret: "development-secret-change-me".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
            },
            bootstrap: BootstrapConfig {
                root_email: Some("coordinacion@cauca.local".to_string()),
                root_name: "Coordinación Departamental".to_string(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            hierarchy: HierarchyConfig {
                max_traversal_depth: 16,
            },
            provisioning: ProvisioningConfig {
                store_timeout_ms: 3_000,
                identity_timeout_ms: 3_000,
            },
            audit: AuditConfig {
                min_municipal_coverage: 0.5,
            },
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                max_connections: 20,
                connection_timeout: 10,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
            },
            bootstrap: BootstrapConfig {
                root_email: None,
                root_name: "Coordinación Departamental".to_string(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            hierarchy: HierarchyConfig {
                max_traversal_depth: 12,
            },
            provisioning: ProvisioningConfig {
                store_timeout_ms: 2_000,
                identity_timeout_ms: 2_000,
            },
            audit: AuditConfig {
                min_municipal_coverage: 0.8,
            },
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                max_connections: 50,
                connection_timeout: 5,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: false,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
            },
            bootstrap: BootstrapConfig {
                root_email: None,
                root_name: "Coordinación Departamental".to_string(),
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_development {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Development)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.database.backend, StoreBackend::Memory);
        assert_eq!(config.hierarchy.max_traversal_depth, 16);
        assert!(config.bootstrap.root_email.is_some());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.database.backend, StoreBackend::Postgres);
        assert!(config.security.jwt_secret.is_empty());
        assert!(config.audit.min_municipal_coverage > AppConfig::development().audit.min_municipal_coverage);
        assert_eq!(config.provisioning.store_timeout(), Duration::from_secs(2));
    }
}
