//! Config file discovery and layered loading.
//!
//! 1. Parse the embedded `defaults.toml`
//! 2. Merge the user file (`~/.herald/config.toml`, else `$HERALD_HOME/config.toml`)
//! 3. Merge `{workspace}/.herald/config.toml`
//! 4. Apply `HERALD_*` fallbacks to fields no file set
//! 5. Deserialize and validate

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::env::{apply_env_fallbacks, collect_env_vars};
use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, FieldSources, deep_merge_tracking, record_leaves};
use crate::show::ResolvedConfig;
use crate::types::Config;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Maximum allowed config file size (1 MiB).
pub const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// Directory name used under the home and workspace roots.
const CONFIG_DIR: &str = ".herald";

/// File name inside [`CONFIG_DIR`].
const CONFIG_FILE: &str = "config.toml";

/// Load the configuration from the process environment.
///
/// `home_override` names the herald home directory itself (the directory
/// holding `config.toml`), bypassing `~/.herald` and `HERALD_HOME`.
///
/// # Errors
///
/// Returns a [`ConfigError`] if any config file is malformed, or if the
/// merged configuration fails validation.
pub fn load(
    workspace_root: Option<&Path>,
    home_override: Option<&Path>,
) -> ConfigResult<ResolvedConfig> {
    load_with_env(workspace_root, home_override, &collect_env_vars())
}

/// Like [`load`], with an explicit set of `HERALD_*` variables.
///
/// # Errors
///
/// Returns a [`ConfigError`] if any config file is malformed, or if the
/// merged configuration fails validation.
pub fn load_with_env(
    workspace_root: Option<&Path>,
    home_override: Option<&Path>,
    env_vars: &HashMap<String, String>,
) -> ConfigResult<ResolvedConfig> {
    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;

    let mut field_sources = FieldSources::new();
    let mut loaded_files = Vec::new();
    record_leaves(&merged, "", ConfigLayer::Defaults, &mut field_sources);

    if let Some((overlay, path)) = load_user_layer(home_override, env_vars)? {
        deep_merge_tracking(&mut merged, &overlay, "", ConfigLayer::User, &mut field_sources);
        info!(path = %path.display(), "loaded user config");
        loaded_files.push(path.display().to_string());
    }

    if let Some(root) = workspace_root {
        let path = root.join(CONFIG_DIR).join(CONFIG_FILE);
        if let Some(overlay) = try_load_file(&path)? {
            deep_merge_tracking(
                &mut merged,
                &overlay,
                "",
                ConfigLayer::Workspace,
                &mut field_sources,
            );
            info!(path = %path.display(), "loaded workspace config");
            loaded_files.push(path.display().to_string());
        }
    }

    let env_count = apply_env_fallbacks(&mut merged, &mut field_sources, env_vars);
    if env_count > 0 {
        debug!(count = env_count, "applied environment variable fallbacks");
    }

    let config: Config =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: "<merged config>".to_owned(),
                source: e,
            })?;

    validate::validate(&config)?;

    Ok(ResolvedConfig {
        config,
        field_sources,
        loaded_files,
    })
}

/// Load a config from a single file, without layering or env fallbacks.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file is missing, too large, malformed
/// or invalid.
pub fn load_file(path: &Path) -> ConfigResult<Config> {
    let content = read_bounded(path)?;
    let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;

    validate::validate(&config)?;
    Ok(config)
}

fn load_user_layer(
    home_override: Option<&Path>,
    env_vars: &HashMap<String, String>,
) -> ConfigResult<Option<(toml::Value, PathBuf)>> {
    if let Some(home) = home_override {
        let path = home.join(CONFIG_FILE);
        return Ok(try_load_file(&path)?.map(|overlay| (overlay, path)));
    }

    let path = home_directory()?.join(CONFIG_DIR).join(CONFIG_FILE);
    if let Some(overlay) = try_load_file(&path)? {
        return Ok(Some((overlay, path)));
    }

    let Some(raw) = env_vars.get("HERALD_HOME") else {
        return Ok(None);
    };
    let Some(dir) = PathBuf::from(raw).canonicalize().ok().filter(|p| p.is_dir()) else {
        warn!(path = %raw, "HERALD_HOME is not a directory; ignoring");
        return Ok(None);
    };
    let path = dir.join(CONFIG_FILE);
    Ok(try_load_file(&path)?.map(|overlay| (overlay, path)))
}

/// Try to load a file as a raw TOML tree, returning `None` if it does not
/// exist.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let content = match read_bounded(path) {
        Ok(c) => c,
        Err(ConfigError::ReadError { source, .. })
            if source.kind() == std::io::ErrorKind::NotFound =>
        {
            debug!(path = %path.display(), "config file not found, skipping");
            return Ok(None);
        },
        Err(e) => return Err(e),
    };

    let value: toml::Value = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(Some(value))
}

/// Read a file in one call, then reject it if it exceeds
/// [`MAX_CONFIG_FILE_SIZE`].
fn read_bounded(path: &Path) -> ConfigResult<String> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    if content.len() as u64 > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {MAX_CONFIG_FILE_SIZE} byte limit",
                content.len()
            ),
        });
    }

    Ok(content)
}

fn home_directory() -> ConfigResult<PathBuf> {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .ok_or(ConfigError::NoHomeDir)
}
