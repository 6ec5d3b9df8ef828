// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Layered TOML configuration (§2.1, §4.9): a `[defaults]` profile merged
//! with a per-app `[apps.<name>]` override, validated once at load time so
//! a misconfigured app is rejected before the daemon ever starts it rather
//! than misbehaving at runtime.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use warden_core::{AppDescriptor, Profile, ProfileError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("app '{app}' has an invalid profile: {source}")]
    InvalidProfile {
        app: String,
        #[source]
        source: ProfileError,
    },
}

/// Every field optional so `[defaults]` and a per-app `[apps.x.profile]`
/// table only need to name the knobs they actually override; unset fields
/// fall through to the next layer down (app override -> defaults -> `Profile::default()`).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ProfileOverride {
    pool_limit: Option<u32>,
    queue_limit: Option<u32>,
    spawn_timeout_ms: Option<u64>,
    handshake_timeout_ms: Option<u64>,
    heartbeat_timeout_ms: Option<u64>,
    idle_timeout_ms: Option<u64>,
    terminate_timeout_ms: Option<u64>,
    seal_timeout_ms: Option<u64>,
    crashlog_limit: Option<u32>,
    concurrency: Option<u32>,
    grow_threshold: Option<f64>,
    kill_timeout_ms: Option<u64>,
}

impl ProfileOverride {
    fn layer_onto(&self, base: Profile) -> Profile {
        Profile {
            pool_limit: self.pool_limit.unwrap_or(base.pool_limit),
            queue_limit: self.queue_limit.unwrap_or(base.queue_limit),
            spawn_timeout_ms: self.spawn_timeout_ms.unwrap_or(base.spawn_timeout_ms),
            handshake_timeout_ms: self.handshake_timeout_ms.unwrap_or(base.handshake_timeout_ms),
            heartbeat_timeout_ms: self.heartbeat_timeout_ms.unwrap_or(base.heartbeat_timeout_ms),
            idle_timeout_ms: self.idle_timeout_ms.unwrap_or(base.idle_timeout_ms),
            terminate_timeout_ms: self.terminate_timeout_ms.unwrap_or(base.terminate_timeout_ms),
            seal_timeout_ms: self.seal_timeout_ms.unwrap_or(base.seal_timeout_ms),
            crashlog_limit: self.crashlog_limit.unwrap_or(base.crashlog_limit),
            concurrency: self.concurrency.unwrap_or(base.concurrency),
            grow_threshold: self.grow_threshold.unwrap_or(base.grow_threshold),
            kill_timeout_ms: self.kill_timeout_ms.unwrap_or(base.kill_timeout_ms),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AppSection {
    executable: PathBuf,
    endpoint: PathBuf,
    #[serde(default)]
    env: HashMap<String, String>,
    #[serde(default)]
    profile: ProfileOverride,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct DaemonConfigFile {
    #[serde(default)]
    defaults: ProfileOverride,
    #[serde(default)]
    apps: HashMap<String, AppSection>,
}

/// Fully validated daemon configuration: one ready-to-start
/// [`AppDescriptor`] per app named in the file, sorted by name so startup
/// order (and therefore log/listener ordering) is deterministic.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub apps: Vec<AppDescriptor>,
}

impl DaemonConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text, path)
    }

    fn from_toml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let file: DaemonConfigFile = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let base_profile = file.defaults.layer_onto(Profile::default());

        let mut apps = Vec::with_capacity(file.apps.len());
        for (name, section) in file.apps {
            let profile = section.profile.layer_onto(base_profile);
            profile.validate().map_err(|source| ConfigError::InvalidProfile {
                app: name.clone(),
                source,
            })?;
            apps.push(AppDescriptor::new(name, section.executable, section.endpoint, profile).with_env(section.env));
        }
        apps.sort_by(|a, b| a.name.as_str().cmp(b.name.as_str()));
        Ok(Self { apps })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
