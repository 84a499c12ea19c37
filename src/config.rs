use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bus: BusConfig,
    #[serde(default)]
    pub scopes: ScopesConfig,
    #[serde(default)]
    pub breadcrumb: BreadcrumbConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Event bus tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusConfig {
    /// Maximum number of nested publish rounds before a publish is refused
    /// (default: 32). A publish issued from inside a listener counts as one
    /// level deeper than the publish that triggered it.
    #[serde(default = "default_max_publish_depth")]
    pub max_publish_depth: usize,
}

fn default_max_publish_depth() -> usize {
    32
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            max_publish_depth: default_max_publish_depth(),
        }
    }
}

/// Scope names each coordinator is wired to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopesConfig {
    /// Scope the breadcrumb listens on for `update_breadcrumb`
    #[serde(default = "default_breadcrumb_scope")]
    pub breadcrumb: String,
    /// Scope breadcrumb navigation and close-edit events are published on
    #[serde(default = "default_navigation_scope")]
    pub navigation: String,
    /// Scope shared by confirmation requests and their confirmed replies
    #[serde(default = "default_confirmation_scope")]
    pub confirmation: String,
    /// Scope of the usage impact drawer
    #[serde(default = "default_drawer_scope")]
    pub drawer: String,
}

fn default_breadcrumb_scope() -> String {
    "breadcrumb".to_string()
}

fn default_navigation_scope() -> String {
    "navigation".to_string()
}

fn default_confirmation_scope() -> String {
    "confirmation".to_string()
}

fn default_drawer_scope() -> String {
    "usage_impact_drawer".to_string()
}

impl Default for ScopesConfig {
    fn default() -> Self {
        Self {
            breadcrumb: default_breadcrumb_scope(),
            navigation: default_navigation_scope(),
            confirmation: default_confirmation_scope(),
            drawer: default_drawer_scope(),
        }
    }
}

/// Breadcrumb navigation rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreadcrumbConfig {
    /// Targets that navigate directly, without closing open edits first
    #[serde(default = "default_view_targets")]
    pub view_targets: Vec<String>,
}

fn default_view_targets() -> Vec<String> {
    vec![
        "MAPPINGS".to_string(),
        "MODELS".to_string(),
        "RULES".to_string(),
        "CODESETS".to_string(),
    ]
}

impl Default for BreadcrumbConfig {
    fn default() -> Self {
        Self {
            view_targets: default_view_targets(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to log to a file instead of stderr
    #[serde(default)]
    pub to_file: bool,

    /// Directory for log files when `to_file` is set
    #[serde(default = "default_log_dir")]
    pub dir: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    ".switchboard/logs".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            to_file: false,
            dir: default_log_dir(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bus: BusConfig::default(),
            scopes: ScopesConfig::default(),
            breadcrumb: BreadcrumbConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        // Start with embedded defaults so switchboard works without config files
        let defaults = Config::default();
        let defaults_json =
            serde_json::to_string(&defaults).context("Failed to serialize default config")?;

        let mut builder = config::Config::builder().add_source(config::File::from_str(
            &defaults_json,
            config::FileFormat::Json,
        ));

        // Project config in the working directory
        let local_config = Self::local_config_path();
        if local_config.exists() {
            builder = builder.add_source(config::File::from(local_config));
        }

        // User config in ~/.config/switchboard/ (optional global overrides)
        if let Some(user_config) = Self::user_config_path() {
            if user_config.exists() {
                builder = builder.add_source(config::File::from(user_config));
            }
        }

        // Explicit config file (CLI override)
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment variables with SWITCHBOARD_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("SWITCHBOARD")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to load configuration")?;
        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Path of the project-local config file
    pub fn local_config_path() -> PathBuf {
        PathBuf::from("switchboard.toml")
    }

    /// Path of the per-user config file, if the platform has a config dir
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("switchboard").join("config.toml"))
    }

    /// Directory log files are written to
    pub fn logs_path(&self) -> PathBuf {
        PathBuf::from(&self.logging.dir)
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}
