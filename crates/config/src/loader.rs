use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{
    env_subst::substitute_env,
    error::{Context, Error, Result},
    schema::StreamifyConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "streamify.toml",
    "streamify.yaml",
    "streamify.yml",
    "streamify.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<StreamifyConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.display().to_string(),
        source,
    })?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./streamify.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/streamify/streamify.{toml,yaml,yml,json}` (user-global)
///
/// Returns `StreamifyConfig::default()` if no config file is found. A file
/// that exists but fails to parse is an error: credentials may live in it.
pub fn discover_and_load() -> Result<StreamifyConfig> {
    match find_config_file() {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(&path)
        },
        None => {
            debug!("no config file found, using defaults");
            Ok(StreamifyConfig::default())
        },
    }
}

/// Find the first config file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let config_dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| config_dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/streamify/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "streamify").map(|d| d.config_dir().to_path_buf())
}

/// Returns the data directory used for staging when none is configured.
pub fn data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "streamify")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| {
            warn!("could not determine a data directory, using ./.streamify");
            PathBuf::from(".streamify")
        })
}

/// Apply `STREAMIFY_*` overrides from the process environment.
pub fn apply_env_overrides(config: &mut StreamifyConfig) {
    apply_env_overrides_with(config, |name| std::env::var(name).ok());
}

/// Apply overrides using a custom lookup function.
///
/// `TOKEN` is accepted as a fallback for the bot token so `.env` files
/// written for older deployments keep working.
pub fn apply_env_overrides_with(
    config: &mut StreamifyConfig,
    lookup: impl Fn(&str) -> Option<String>,
) {
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("STREAMIFY_API_ID") {
        config.telegram.api_id = Some(v);
    }
    if let Some(v) = get("STREAMIFY_API_HASH") {
        config.telegram.api_hash = Some(Secret::new(v));
    }
    if let Some(v) = get("STREAMIFY_BOT_TOKEN").or_else(|| get("TOKEN")) {
        config.telegram.bot_token = Some(Secret::new(v));
    }
    if let Some(v) = get("STREAMIFY_API_URL") {
        config.telegram.api_url = Some(v);
    }
    if let Some(v) = get("STREAMIFY_STAGING_DIR") {
        config.staging.dir = Some(PathBuf::from(v));
    }
}

fn parse_config(raw: &str, path: &Path) -> Result<StreamifyConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
    let shown = path.display();

    match ext {
        "toml" => toml::from_str(raw).with_context(|| format!("parse {shown}")),
        "yaml" | "yml" => serde_yaml::from_str(raw).with_context(|| format!("parse {shown}")),
        "json" => serde_json::from_str(raw).with_context(|| format!("parse {shown}")),
        _ => Err(Error::UnsupportedFormat(ext.to_string())),
    }
}
