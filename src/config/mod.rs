// Configuration loading and management.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::driver::DriverConfig;
use crate::probe::DEFAULT_SCRIPT_TIMEOUT;
use crate::registry::{consul, RegistryConfig, DEFAULT_REGISTRY_ADDR, DEFAULT_REQUEST_TIMEOUT};
use crate::tags::TagPrefix;

mod test_config;
#[allow(dead_code)]
pub use test_config::new_test_config;

pub const PROD: &str = "prod";
pub const DEV: &str = "dev";

/// File looked up in the home directory when no `--config` is given.
pub const HOME_CONFIG_FILE: &str = ".tagit.yaml";

pub const DEFAULT_TAG_PREFIX: &str = "tagged";
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(rename = "tagit", default)]
    pub tagit: TagitBox,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TagitBox {
    pub env: String,
    pub logs: Logs,
    pub consul: Consul,
    pub service: Service,
}

impl Default for TagitBox {
    fn default() -> Self {
        Self {
            env: DEV.to_string(),
            logs: Logs::default(),
            consul: Consul::default(),
            service: Service::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Logs {
    pub level: String,
}

impl Default for Logs {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Consul {
    pub addr: String,
    pub token: Option<String>,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for Consul {
    fn default() -> Self {
        Self {
            addr: DEFAULT_REGISTRY_ADDR.to_string(),
            token: None,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Service {
    pub id: String,
    pub script: String,
    pub tag_prefix: String,
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    #[serde(with = "humantime_serde")]
    pub script_timeout: Duration,
}

impl Default for Service {
    fn default() -> Self {
        Self {
            id: String::new(),
            script: String::new(),
            tag_prefix: DEFAULT_TAG_PREFIX.to_string(),
            interval: DEFAULT_INTERVAL,
            script_timeout: DEFAULT_SCRIPT_TIMEOUT,
        }
    }
}

/// Values given on the command line or through `TAGIT_*` variables.
/// `None` keeps whatever the file or the defaults say.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub consul_addr: Option<String>,
    pub token: Option<String>,
    pub service_id: Option<String>,
    pub script: Option<String>,
    pub tag_prefix: Option<String>,
    pub interval: Option<Duration>,
    pub script_timeout: Option<Duration>,
    pub log_level: Option<String>,
}

/// Which subcommand the configuration is validated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Run,
    Cleanup,
}

impl Config {
    /// Loads configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let abs_path = path
            .canonicalize()
            .with_context(|| format!("failed to resolve absolute config filepath: {:?}", path))?;

        let data = std::fs::read_to_string(&abs_path)
            .with_context(|| format!("read config yaml file {:?}", abs_path))?;

        Self::from_yaml(&data).with_context(|| format!("unmarshal yaml from {:?}", abs_path))
    }

    pub fn from_yaml(data: &str) -> Result<Self> {
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(data)?)
    }

    /// Explicit path if given, else `~/.tagit.yaml` when it exists, else defaults.
    ///
    /// Returns the file actually used, if any.
    pub fn discover(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            return Ok((Self::load(path)?, Some(path.to_path_buf())));
        }
        match dirs::home_dir().map(|home| home.join(HOME_CONFIG_FILE)) {
            Some(path) if path.is_file() => Ok((Self::load(&path)?, Some(path))),
            _ => Ok((Self::default(), None)),
        }
    }

    pub fn apply(&mut self, overrides: Overrides) {
        let cfg = &mut self.tagit;
        if let Some(v) = overrides.consul_addr {
            cfg.consul.addr = v;
        }
        if let Some(v) = overrides.token {
            cfg.consul.token = Some(v);
        }
        if let Some(v) = overrides.service_id {
            cfg.service.id = v;
        }
        if let Some(v) = overrides.script {
            cfg.service.script = v;
        }
        if let Some(v) = overrides.tag_prefix {
            cfg.service.tag_prefix = v;
        }
        if let Some(v) = overrides.interval {
            cfg.service.interval = v;
        }
        if let Some(v) = overrides.script_timeout {
            cfg.service.script_timeout = v;
        }
        if let Some(v) = overrides.log_level {
            cfg.logs.level = v;
        }
    }

    pub fn validate(&self, mode: Mode) -> Result<()> {
        let svc = &self.tagit.service;
        if svc.id.trim().is_empty() {
            bail!("service-id is required");
        }
        if svc.tag_prefix.is_empty() {
            bail!("tag-prefix is required and cannot be empty");
        }
        if svc.tag_prefix.chars().any(char::is_whitespace) {
            bail!("tag-prefix {:?} must not contain whitespace", svc.tag_prefix);
        }
        consul::base_url(&self.tagit.consul.addr)?;

        if mode == Mode::Run {
            if svc.script.trim().is_empty() {
                bail!("script is required");
            }
            if svc.interval.is_zero() {
                bail!("interval is required and cannot be empty or zero");
            }
            if svc.script_timeout.is_zero() {
                bail!("script-timeout cannot be zero");
            }
        }
        Ok(())
    }

    pub fn logs(&self) -> &Logs {
        &self.tagit.logs
    }

    pub fn is_prod(&self) -> bool {
        self.tagit.env == PROD
    }

    pub fn service(&self) -> &Service {
        &self.tagit.service
    }

    pub fn registry(&self) -> RegistryConfig {
        RegistryConfig {
            address: self.tagit.consul.addr.clone(),
            token: self.tagit.consul.token.clone(),
            timeout: self.tagit.consul.timeout,
        }
    }

    pub fn driver(&self) -> DriverConfig {
        let svc = &self.tagit.service;
        DriverConfig {
            service_id: svc.id.clone(),
            command: svc.script.clone(),
            prefix: TagPrefix::new(&svc.tag_prefix),
            interval: svc.interval,
        }
    }
}
