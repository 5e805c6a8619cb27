//! Configuration loading and validation.
//!
//! Settings are merged from, lowest precedence first:
//!
//! 1. Built-in defaults.
//! 2. `config.toml` in the platform configuration directory, if present.
//! 3. A TOML file named on the command line (must exist).
//! 4. Environment variables.
//!
//! ```toml
//! owner = "gino-vi"
//! repo = "Wangfang-Suite"
//! port = 5000
//! bind = "0.0.0.0"
//! api_url = "https://api.github.com"
//! # Prefer GITHUB_TOKEN in the environment over committing this.
//! token = "ghp_..."
//! ```
//!
//! | Variable         | Setting   |
//! |------------------|-----------|
//! | `GITHUB_TOKEN`   | `token`   |
//! | `REPO_OWNER`     | `owner`   |
//! | `REPO_NAME`      | `repo`    |
//! | `PORT`           | `port`    |
//! | `BIND_ADDRESS`   | `bind`    |
//! | `GITHUB_API_URL` | `api_url` |

pub mod error;

use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use vitrine_upstream::Credential;
use vitrine_upstream::backend::DEFAULT_API_URL;

/// Variables taken verbatim. Figment would otherwise read `REPO_NAME=2024`
/// as a number and refuse it for a string setting.
const VERBATIM_ENV_KEYS: &[(&str, &str)] = &[
    ("GITHUB_TOKEN", "token"),
    ("REPO_OWNER", "owner"),
    ("REPO_NAME", "repo"),
    ("GITHUB_API_URL", "api_url"),
];
const PARSED_ENV_KEYS: &[(&str, &str)] = &[("PORT", "port"), ("BIND_ADDRESS", "bind")];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Shared credential for the upstream host. Required to serve anything.
    pub token: Option<Credential>,
    pub owner: String,
    pub repo: String,
    pub port: u16,
    pub bind: IpAddr,
    pub api_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token: None,
            owner: "gino-vi".to_string(),
            repo: "Wangfang-Suite".to_string(),
            port: 5000,
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from every source, with `explicit` as an extra
    /// TOML file layered over the platform default.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::load_from(default_config_file(), explicit)
    }

    fn load_from(default_file: Option<PathBuf>, explicit: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();
        if let Some(path) = default_file {
            tracing::debug!(path = %path.display(), "Merging default config file (if present)");
            figment = figment.merge(Toml::file(path));
        }
        if let Some(path) = explicit {
            if !path.is_file() {
                exn::bail!(ErrorKind::FileNotFound(path.to_path_buf()));
            }
            figment = figment.merge(Toml::file(path));
        }
        let verbatim: BTreeMap<String, String> = env_provider(VERBATIM_ENV_KEYS)
            .iter()
            .map(|(key, value)| (key.as_str().to_string(), value))
            .collect();
        figment = figment.merge(env_provider(PARSED_ENV_KEYS)).merge(Serialized::defaults(verbatim));
        figment.extract().or_raise(|| ErrorKind::Invalid)
    }

    /// Check the settings the service cannot start without, returning the
    /// credential on success.
    pub fn validate(&self) -> Result<&Credential> {
        if self.owner.trim().is_empty() {
            exn::bail!(ErrorKind::InvalidValue("owner"));
        }
        if self.repo.trim().is_empty() {
            exn::bail!(ErrorKind::InvalidValue("repo"));
        }
        self.token.as_ref().filter(|token| !token.is_blank()).ok_or_raise(|| ErrorKind::MissingCredential)
    }

    /// `owner/repo`
    pub fn repository(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

/// Environment variables named in `keys`, renamed to their settings.
fn env_provider(keys: &'static [(&'static str, &'static str)]) -> Env {
    Env::raw().filter_map(move |key| {
        keys.iter()
            .find(|(env, _)| key.as_str().eq_ignore_ascii_case(env))
            .map(|(_, field)| (*field).into())
    })
}

fn default_config_file() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "vitrine").map(|dirs| dirs.config_dir().join("config.toml"))
}
