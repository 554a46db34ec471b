//! Configuration management for herakles-process-census.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::census::{CensusOptions, DEFAULT_PROC_ROOT};
use crate::cli::{Args, ConfigFormat};
use crate::process::{FacetSet, Pid, ScanLimits};
use crate::system::CLK_TCK;
use crate::tree::{TraversalOptions, DEFAULT_MAX_DEPTH, DEFAULT_ROOT_PID};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

/// Locations searched when no config file is given.
pub const DEFAULT_CONFIG_PATHS: [&str; 6] = [
    "/etc/herakles/process-census.yaml",
    "/etc/herakles/process-census.yml",
    "/etc/herakles/process-census.json",
    "./herakles-process-census.yaml",
    "./herakles-process-census.yml",
    "./herakles-process-census.json",
];

const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("{0}")]
    Invalid(String),
}

/// Census configuration. Unset fields fall back to built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    // Data source
    pub proc_root: Option<PathBuf>,
    /// Overrides the host clock-tick rate; only useful for replaying a
    /// process table captured on another machine.
    pub clock_ticks: Option<i64>,

    // Scan scope
    pub facets: Option<Vec<String>>,
    pub max_pid: Option<Pid>,
    pub max_processes: Option<usize>,
    pub parallelism: Option<usize>,

    // Tree traversal
    pub root_pid: Option<Pid>,
    pub max_depth: Option<usize>,

    // Logging
    pub log_level: Option<String>,
}

impl Config {
    /// Configuration with every default spelled out, as written by
    /// `config` and shown by `--show-config`.
    pub fn with_defaults() -> Self {
        Self {
            proc_root: Some(PathBuf::from(DEFAULT_PROC_ROOT)),
            clock_ticks: None,
            facets: Some(Vec::new()),
            max_pid: None,
            max_processes: None,
            parallelism: None,
            root_pid: Some(DEFAULT_ROOT_PID),
            max_depth: Some(DEFAULT_MAX_DEPTH),
            log_level: Some("info".to_string()),
        }
    }

    pub fn proc_root(&self) -> PathBuf {
        self.proc_root
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROC_ROOT))
    }

    pub fn facet_set(&self) -> Result<FacetSet, ConfigError> {
        let list = self.facets.as_deref().unwrap_or_default().join(",");
        FacetSet::parse_list(&list).map_err(ConfigError::Invalid)
    }

    pub fn census_options(&self) -> Result<CensusOptions, ConfigError> {
        Ok(CensusOptions {
            proc_root: self.proc_root(),
            facets: self.facet_set()?,
            clock_ticks: self.clock_ticks.unwrap_or(*CLK_TCK),
            limits: ScanLimits {
                max_pid: self.max_pid,
                max_processes: self.max_processes,
            },
        })
    }

    pub fn traversal_options(&self) -> TraversalOptions {
        TraversalOptions {
            root: self.root_pid.unwrap_or(DEFAULT_ROOT_PID),
            max_depth: self.max_depth.unwrap_or(DEFAULT_MAX_DEPTH),
        }
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), ConfigError> {
    cfg.facet_set()?;

    if let Some(ticks) = cfg.clock_ticks {
        if ticks <= 0 {
            return Err(ConfigError::Invalid(format!(
                "clock_ticks must be positive, got {}",
                ticks
            )));
        }
    }

    if cfg.root_pid == Some(0) {
        return Err(ConfigError::Invalid("root_pid must be positive".into()));
    }
    if cfg.max_pid == Some(0) {
        return Err(ConfigError::Invalid("max_pid must be positive".into()));
    }
    if cfg.max_depth == Some(0) {
        return Err(ConfigError::Invalid("max_depth must be at least 1".into()));
    }
    if cfg.parallelism == Some(0) {
        return Err(ConfigError::Invalid(
            "parallelism must be at least 1 (omit it for automatic sizing)".into(),
        ));
    }

    if let Some(level) = cfg.log_level.as_deref() {
        if !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log_level '{}', expected one of: {}",
                level,
                LOG_LEVELS.join(", ")
            )));
        }
    }

    let root = cfg.proc_root();
    if root.as_os_str().is_empty() {
        return Err(ConfigError::Invalid("proc_root must not be empty".into()));
    }

    Ok(())
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, ConfigError> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(root) = &args.proc_root {
        config.proc_root = Some(root.clone());
    }

    if let Some(list) = &args.facets {
        config.facets = Some(
            list.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        );
    }

    if let Some(pid) = args.root_pid {
        config.root_pid = Some(pid);
    }
    if let Some(depth) = args.max_depth {
        config.max_depth = Some(depth);
    }
    if let Some(pid) = args.max_pid {
        config.max_pid = Some(pid);
    }
    if let Some(n) = args.parallelism {
        config.parallelism = Some(n);
    }
    if let Some(n) = args.max_processes {
        config.max_processes = Some(n);
    }
    if let Some(level) = args.log_level {
        config.log_level = Some(level.as_str().to_string());
    }

    Ok(config)
}

/// Loads a config file, or the first existing default location. Missing
/// files yield the default configuration.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match DEFAULT_CONFIG_PATHS.iter().find(|p| Path::new(p).exists()) {
            Some(p) => PathBuf::from(p),
            None => return Ok(Config::default()),
        },
    };

    if !path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;

    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => {
            let config: Config =
                serde_json::from_str(&content).map_err(|source| ConfigError::Json {
                    path: path.clone(),
                    source,
                })?;
            info!("Loaded JSON configuration from: {}", path.display());
            Ok(config)
        }
        Some("toml") => {
            let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Toml {
                path: path.clone(),
                source,
            })?;
            info!("Loaded TOML configuration from: {}", path.display());
            Ok(config)
        }
        _ => {
            // Default to YAML
            let config: Config =
                serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
                    path: path.clone(),
                    source,
                })?;
            info!("Loaded YAML configuration from: {}", path.display());
            Ok(config)
        }
    }
}

/// Serializes configuration in the requested format.
pub fn render_config(
    config: &Config,
    format: ConfigFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    let output = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };
    Ok(output)
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render_config(config, format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::Facet;
    use clap::Parser;
    use tempfile::tempdir;

    // -------------------------------------------------------------------------
    // Tests for load_config
    // -------------------------------------------------------------------------

    #[test]
    fn test_load_yaml_config() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("census.yaml");
        fs::write(
            &path,
            "proc_root: /host/proc\nfacets: [cpu, memory]\nroot_pid: 2\n",
        )
        .expect("write");

        let cfg = load_config(Some(&path)).unwrap();
        assert_eq!(cfg.proc_root, Some(PathBuf::from("/host/proc")));
        assert_eq!(cfg.root_pid, Some(2));
        let facets = cfg.facet_set().unwrap();
        assert!(facets.contains(Facet::Cpu));
        assert!(facets.contains(Facet::Memory));
    }

    #[test]
    fn test_load_json_and_toml_config() {
        let dir = tempdir().expect("Failed to create temp dir");
        let json = dir.path().join("census.json");
        fs::write(&json, r#"{"max_depth": 12, "parallelism": 4}"#).expect("write");
        let cfg = load_config(Some(&json)).unwrap();
        assert_eq!(cfg.max_depth, Some(12));
        assert_eq!(cfg.parallelism, Some(4));

        let toml_path = dir.path().join("census.toml");
        fs::write(&toml_path, "max_processes = 50\nfacets = [\"threads\"]\n").expect("write");
        let cfg = load_config(Some(&toml_path)).unwrap();
        assert_eq!(cfg.max_processes, Some(50));
        assert!(cfg.facet_set().unwrap().contains(Facet::Threads));
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempdir().expect("Failed to create temp dir");
        let cfg = load_config(Some(&dir.path().join("absent.yaml"))).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn test_load_invalid_yaml() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("bad.yaml");
        fs::write(&path, "root_pid: [not, a, number]\n").expect("write");
        assert!(matches!(
            load_config(Some(&path)),
            Err(ConfigError::Yaml { .. })
        ));
    }

    // -------------------------------------------------------------------------
    // Tests for resolve_config / validate_effective_config
    // -------------------------------------------------------------------------

    #[test]
    fn test_cli_overrides_file() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("census.yaml");
        fs::write(&path, "root_pid: 5\nmax_depth: 10\n").expect("write");
        let path_str = path.to_string_lossy().to_string();

        let args = Args::parse_from([
            "herakles-process-census",
            "--config",
            path_str.as_str(),
            "--root-pid",
            "7",
            "--facets",
            "cpu, uptime",
        ]);
        let cfg = resolve_config(&args).unwrap();
        assert_eq!(cfg.root_pid, Some(7));
        assert_eq!(cfg.max_depth, Some(10));
        assert_eq!(
            cfg.facets,
            Some(vec!["cpu".to_string(), "uptime".to_string()])
        );
        assert_eq!(cfg.traversal_options().root, 7);
    }

    #[test]
    fn test_no_config_uses_defaults() {
        let args = Args::parse_from(["herakles-process-census", "--no-config"]);
        let cfg = resolve_config(&args).unwrap();
        let opts = cfg.census_options().unwrap();
        assert_eq!(opts.proc_root, PathBuf::from("/proc"));
        assert!(opts.facets.is_empty());
        assert_eq!(cfg.traversal_options().root, 1);
        assert_eq!(cfg.traversal_options().max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(validate_effective_config(&Config::with_defaults()).is_ok());

        let cfg = Config {
            clock_ticks: Some(0),
            ..Default::default()
        };
        assert!(validate_effective_config(&cfg).is_err());

        let cfg = Config {
            facets: Some(vec!["cpu".into(), "smaps".into()]),
            ..Default::default()
        };
        assert!(validate_effective_config(&cfg).is_err());

        let cfg = Config {
            log_level: Some("loud".into()),
            ..Default::default()
        };
        assert!(validate_effective_config(&cfg).is_err());

        let cfg = Config {
            parallelism: Some(0),
            ..Default::default()
        };
        assert!(validate_effective_config(&cfg).is_err());
    }

    #[test]
    fn test_render_config_formats() {
        let cfg = Config::with_defaults();
        let yaml = render_config(&cfg, ConfigFormat::Yaml).unwrap();
        assert!(yaml.contains("root_pid: 1"));
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, cfg);

        let toml_out = render_config(&cfg, ConfigFormat::Toml).unwrap();
        assert!(toml_out.contains("max_depth = 4096"));
    }
}
