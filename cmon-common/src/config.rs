//! Configuration loading and root folder resolution
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`CMON_ROOT_FOLDER`, then `CMON_ROOT`)
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or unreadable TOML file is never fatal: a warning is logged and
//! compiled defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Primary root folder environment variable
pub const ENV_ROOT_FOLDER: &str = "CMON_ROOT_FOLDER";

/// Alternative (shorter) root folder environment variable
pub const ENV_ROOT: &str = "CMON_ROOT";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "cmon.db";

/// Defaults compiled into the binary
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub log_level: String,
    pub bind: String,
    pub port: u16,
    pub webhook_timeout_secs: u64,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
            log_level: "info".to_string(),
            bind: "127.0.0.1".to_string(),
            port: 5740,
            webhook_timeout_secs: 30,
        }
    }
}

/// `[logging]` table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// tracing filter directive, e.g. "info" or "cmon_server=debug"
    pub level: Option<String>,
}

/// Contents of `~/.config/cmon/<module>.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Ingestion relay webhook (workflow automation endpoint)
    pub webhook_url: Option<String>,
    pub webhook_timeout_secs: Option<u64>,
    pub bind: Option<String>,
    pub port: Option<u16>,
}

impl TomlConfig {
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    TomlConfig::parse(&content)
}

/// Candidate config file for a module
///
/// `~/.config/cmon/<module>.toml` is preferred; `~/.config/cmon/config.toml`
/// is shared by all modules. On Linux `/etc/cmon/config.toml` is tried last.
pub fn config_file_path(module_name: &str) -> Option<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("cmon").join(format!("{}.toml", module_name)));
        candidates.push(dir.join("cmon").join("config.toml"));
    }
    if cfg!(target_os = "linux") {
        candidates.push(PathBuf::from("/etc/cmon/config.toml"));
    }

    candidates.into_iter().find(|path| path.exists())
}

/// Load the module's TOML config, falling back to defaults
pub fn load_module_config(module_name: &str) -> TomlConfig {
    let Some(path) = config_file_path(module_name) else {
        debug!("No config file found for {}; using compiled defaults", module_name);
        return TomlConfig::default();
    };

    match load_toml_config(&path) {
        Ok(config) => {
            debug!("Loaded config from {}", path.display());
            config
        }
        Err(e) => {
            warn!("Ignoring config file {}: {}", path.display(), e);
            TomlConfig::default()
        }
    }
}

/// Resolves the root folder holding the database
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
    toml_config: Option<TomlConfig>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_arg: None,
            toml_config: None,
        }
    }

    pub fn with_cli_arg(mut self, cli_arg: Option<PathBuf>) -> Self {
        self.cli_arg = cli_arg;
        self
    }

    /// Use an already-loaded config instead of reading the file again
    pub fn with_toml_config(mut self, config: TomlConfig) -> Self {
        self.toml_config = Some(config);
        self
    }

    pub fn resolve(&self) -> PathBuf {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        // Priority 2: Environment variables
        for var in [ENV_ROOT_FOLDER, ENV_ROOT] {
            if let Ok(path) = std::env::var(var) {
                if !path.trim().is_empty() {
                    return PathBuf::from(path);
                }
            }
        }

        // Priority 3: TOML config file
        let toml_root = match &self.toml_config {
            Some(config) => config.root_folder.clone(),
            None => load_module_config(&self.module_name).root_folder,
        };
        if let Some(path) = toml_root {
            return path;
        }

        // Priority 4: OS-dependent compiled default
        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Creates the root folder and locates the database inside it
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    /// Idempotent
    pub fn ensure_directory_exists(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root_folder)?;
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/cmon (or /var/lib/cmon for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("cmon"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/cmon"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/cmon
        dirs::data_dir()
            .map(|d| d.join("cmon"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/cmon"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\cmon
        dirs::data_local_dir()
            .map(|d| d.join("cmon"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\cmon"))
    } else {
        PathBuf::from("./cmon_data")
    }
}
