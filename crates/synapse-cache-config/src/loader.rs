// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Values are resolved in three layers, later layers winning:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ConfigError, ConfigResult, SynapseCacheConfig, CONFIG_FILE_NAME};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "SYNAPSE_CACHE_CONFIG_PATH";

/// Find the configuration file
///
/// Search order:
/// 1. `SYNAPSE_CACHE_CONFIG_PATH` environment variable
/// 2. Current working directory: `./synapse_cache.toml`
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by {} not found: {}",
            CONFIG_PATH_ENV,
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    if let Some(path) = search_paths.iter().find(|p| p.exists()) {
        return Ok(path.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet {} to specify a custom location.",
        CONFIG_FILE_NAME, search_list, CONFIG_PATH_ENV
    )))
}

/// Load configuration from a TOML file
///
/// * `config_path` - Optional path to config file. If `None`, the file is searched for.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if the config file is not found or contains invalid TOML.
/// Values are not validated here; call [`crate::validate_config`].
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<SynapseCacheConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: SynapseCacheConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    Ok(config)
}

/// Apply environment variable overrides
///
/// Supported environment variables:
/// - `SYNAPSE_CACHE_COLUMN_ALIGNMENT` -> `cache.column_alignment`
/// - `SYNAPSE_CACHE_DEFAULT_PREFETCH` -> `cache.default_prefetch`
/// - `SYNAPSE_CACHE_LOG_LEVEL` -> `logging.level`
///
/// Unparseable numbers are ignored.
pub fn apply_environment_overrides(config: &mut SynapseCacheConfig) {
    if let Ok(value) = env::var("SYNAPSE_CACHE_COLUMN_ALIGNMENT") {
        if let Ok(alignment) = value.parse::<usize>() {
            config.cache.column_alignment = alignment;
        }
    }
    if let Ok(value) = env::var("SYNAPSE_CACHE_DEFAULT_PREFETCH") {
        config.cache.default_prefetch = value;
    }
    if let Ok(value) = env::var("SYNAPSE_CACHE_LOG_LEVEL") {
        config.logging.level = value;
    }
}

/// Apply CLI argument overrides
///
/// Keys: `column_alignment`, `default_prefetch`, `log_level`.
pub fn apply_cli_overrides(config: &mut SynapseCacheConfig, cli_args: &HashMap<String, String>) {
    if let Some(value) = cli_args.get("column_alignment") {
        if let Ok(alignment) = value.parse::<usize>() {
            config.cache.column_alignment = alignment;
        }
    }
    if let Some(value) = cli_args.get("default_prefetch") {
        config.cache.default_prefetch = value.clone();
    }
    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const OVERRIDE_VARS: [&str; 3] = [
        "SYNAPSE_CACHE_COLUMN_ALIGNMENT",
        "SYNAPSE_CACHE_DEFAULT_PREFETCH",
        "SYNAPSE_CACHE_LOG_LEVEL",
    ];

    fn clear_override_vars() {
        for var in OVERRIDE_VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom_config.toml");
        File::create(&config_path).unwrap();

        env::set_var(CONFIG_PATH_ENV, config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var(CONFIG_PATH_ENV);

        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    fn test_find_config_file_env_var_missing() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("absent.toml");

        env::set_var(CONFIG_PATH_ENV, config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var(CONFIG_PATH_ENV);

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_minimal_config() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        clear_override_vars();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[cache]").unwrap();
        writeln!(file, "column_alignment = 64").unwrap();

        let config = load_config(Some(&config_path), None).unwrap();

        assert_eq!(config.cache.column_alignment, 64);
        assert_eq!(config.cache.default_prefetch, "none");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&config_path, "[cache\ncolumn_alignment = ").unwrap();

        let result = load_config(Some(&config_path), None);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_environment_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut config = SynapseCacheConfig::default();

        env::set_var("SYNAPSE_CACHE_COLUMN_ALIGNMENT", "128");
        env::set_var("SYNAPSE_CACHE_DEFAULT_PREFETCH", "all");
        env::set_var("SYNAPSE_CACHE_LOG_LEVEL", "debug");

        apply_environment_overrides(&mut config);
        clear_override_vars();

        assert_eq!(config.cache.column_alignment, 128);
        assert_eq!(config.cache.default_prefetch, "all");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_unparseable_alignment_is_ignored() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut config = SynapseCacheConfig::default();

        env::set_var("SYNAPSE_CACHE_COLUMN_ALIGNMENT", "wide");
        apply_environment_overrides(&mut config);
        clear_override_vars();

        assert_eq!(config.cache.column_alignment, 32);
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = SynapseCacheConfig::default();
        let mut cli_args = HashMap::new();
        cli_args.insert("column_alignment".to_string(), "16".to_string());
        cli_args.insert("default_prefetch".to_string(), "positions".to_string());
        cli_args.insert("log_level".to_string(), "trace".to_string());

        apply_cli_overrides(&mut config, &cli_args);

        assert_eq!(config.cache.column_alignment, 16);
        assert_eq!(config.cache.default_prefetch, "positions");
        assert_eq!(config.logging.level, "trace");
    }

    #[test]
    fn test_override_precedence() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        clear_override_vars();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[cache]").unwrap();
        writeln!(file, "column_alignment = 16").unwrap();
        writeln!(file, "default_prefetch = \"attributes\"").unwrap();

        env::set_var("SYNAPSE_CACHE_COLUMN_ALIGNMENT", "64");
        env::set_var("SYNAPSE_CACHE_DEFAULT_PREFETCH", "positions");

        let mut cli_args = HashMap::new();
        cli_args.insert("default_prefetch".to_string(), "all".to_string());

        let config = load_config(Some(&config_path), Some(&cli_args)).unwrap();
        clear_override_vars();

        // CLI wins for prefetch, env wins for alignment (no CLI override)
        assert_eq!(config.cache.default_prefetch, "all");
        assert_eq!(config.cache.column_alignment, 64);
    }
}
