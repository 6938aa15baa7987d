// streamctl - CLI for HTTP+JSON network audio streamers
// Copyright (C) 2024 The streamctl contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 15081;
pub const DEFAULT_TIMEOUT_SECS: u64 = 3;
pub const DEFAULT_RETRIES: u8 = 0;
pub const HOST_ENV: &str = "STREAMCTL_HOST";
pub const CONFIG_DIR_ENV: &str = "STREAMCTL_CONFIG_DIR";

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retries: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Local,
    User,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not locate a writable config directory for the current user")]
    MissingConfigDir,
    #[error("no device host; pass --host, set STREAMCTL_HOST, or save one with `streamctl --host <ip> --save`")]
    MissingHost,
    #[error("timeout must be between 1 and 5 seconds (got {0})")]
    InvalidTimeout(u64),
    #[error("retries must be 0 or 1 (got {0})")]
    InvalidRetries(u8),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub retries: u8,
}

pub fn config_path(scope: Scope, cwd: &Path) -> Result<PathBuf> {
    match scope {
        Scope::Local => Ok(cwd.join(".streamctl.yaml")),
        Scope::User => {
            if let Ok(custom) = env::var(CONFIG_DIR_ENV) {
                return Ok(PathBuf::from(custom).join("config.yaml"));
            }
            let base = config_dir().ok_or(ConfigError::MissingConfigDir)?;
            Ok(base.join("streamctl").join("config.yaml"))
        }
    }
}

pub fn load(cwd: &Path) -> Result<Config> {
    let user = read_if_exists(&config_path(Scope::User, cwd)?)?.unwrap_or_default();
    let local = read_if_exists(&config_path(Scope::Local, cwd)?)?.unwrap_or_default();
    Ok(merge(user, local))
}

pub fn load_scope(scope: Scope, cwd: &Path) -> Result<Config> {
    Ok(read_if_exists(&config_path(scope, cwd)?)?.unwrap_or_default())
}

pub fn save(scope: Scope, config: &Config, cwd: &Path) -> Result<PathBuf> {
    let path = config_path(scope, cwd)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
    }
    let serialized = serde_yaml::to_string(config).context("serializing config")?;
    fs::write(&path, serialized).with_context(|| format!("writing {:?}", path))?;
    Ok(path)
}

/// Merge files, environment and flags (later wins) and validate.
pub fn resolve(cwd: &Path, overrides: Config) -> Result<EffectiveConfig> {
    let mut merged = load(cwd)?;
    if let Ok(host) = env::var(HOST_ENV)
        && !host.trim().is_empty()
    {
        merged.host = Some(host);
    }
    let merged = merge(merged, overrides);

    let host = merged
        .host
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .ok_or(ConfigError::MissingHost)?;
    let port = merged.port.unwrap_or(DEFAULT_PORT);

    let timeout_secs = merged.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
    if !(1..=5).contains(&timeout_secs) {
        return Err(ConfigError::InvalidTimeout(timeout_secs).into());
    }
    let retries = merged.retries.unwrap_or(DEFAULT_RETRIES);
    if retries > 1 {
        return Err(ConfigError::InvalidRetries(retries).into());
    }

    Ok(EffectiveConfig {
        base_url: base_url(&host, port),
        timeout: Duration::from_secs(timeout_secs),
        retries,
    })
}

/// A bare host becomes `http://host:port/`; a full URL is used as given.
pub fn base_url(host: &str, port: u16) -> String {
    if host.contains("://") {
        let mut url = host.to_string();
        if !url.ends_with('/') {
            url.push('/');
        }
        url
    } else {
        format!("http://{host}:{port}/")
    }
}

fn read_if_exists(path: &Path) -> Result<Option<Config>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    let config = serde_yaml::from_str(&contents).with_context(|| format!("parsing {:?}", path))?;
    Ok(Some(config))
}

/// Fields set in `over` replace those in `base`.
pub fn merge(base: Config, over: Config) -> Config {
    Config {
        host: over.host.or(base.host),
        port: over.port.or(base.port),
        timeout_secs: over.timeout_secs.or(base.timeout_secs),
        retries: over.retries.or(base.retries),
    }
}
