//! Configuration loading, env substitution, and startup validation.
//!
//! Config files: `streamify.toml`, `streamify.yaml`, or `streamify.json`
//! Searched in `./` then `~/.config/streamify/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values, and
//! `STREAMIFY_*` environment overrides applied after parsing.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{
        apply_env_overrides, apply_env_overrides_with, config_dir, data_dir, discover_and_load,
        load_config,
    },
    schema::{
        Credentials, PUBLIC_API_MAX_FILE_BYTES, RelayConfig, SELF_HOSTED_MAX_FILE_BYTES,
        StagingConfig, StreamifyConfig,
    },
    validate::{ValidCredentials, validate},
};
