use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use crate::paths::home_dir::resolve_home_dir;

/// Subdirectory of `$HOME` used when `host.home_dir` is empty.
pub const DEFAULT_HOME_SUBDIR: &str = ".aethos";

/// Prefix for environment overrides; `__` separates nesting levels.
pub const ENV_PREFIX: &str = "APP__";

/// Everything the host reads at startup.
///
/// `container` drives the registry and loaders. `services` is a free-form bag
/// keyed by service (or module) name that each service decodes on its own
/// via [`AppConfig::service_config`].
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub host: HostConfig,
    /// `None` means "use [`default_logging_config`]".
    pub logging: Option<LoggingConfig>,
    #[serde(default)]
    pub container: ContainerConfig,
    /// Directory of `<service>.yaml` files merged into `services`.
    #[serde(default)]
    pub services_dir: Option<String>,
    #[serde(default)]
    pub services: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HostConfig {
    /// Absolute after loading; empty in raw input means `$HOME/.aethos`.
    pub home_dir: String,
}

/// Options recognized by the service container and its module loaders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ContainerConfig {
    /// Directory the folder loader scans for module manifests.
    #[serde(default, alias = "serviceFolder")]
    pub service_folder: Option<String>,
    /// Module identifiers the loaders must skip entirely.
    #[serde(default, alias = "disableModules")]
    pub disable_modules: BTreeSet<String>,
    /// Logical service names the registry must leave uninstalled.
    #[serde(default, alias = "disableServices")]
    pub disable_services: BTreeSet<String>,
    /// Alias table: logical dependency name → registered service name.
    #[serde(default, alias = "serviceMap")]
    pub service_map: HashMap<String, String>,
}

/// Per-subsystem logging. The key is a target prefix (`aethos_container`,
/// `greeter::service`); `"default"` covers everything else.
pub type LoggingConfig = HashMap<String, Section>;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Section {
    /// trace | debug | info | warn | error | off
    pub console_level: String,
    /// Relative paths resolve against `host.home_dir`; empty disables the file sink.
    pub file: String,
    #[serde(default)]
    pub file_level: String,
    pub max_age_days: Option<u32>,
    #[serde(default)]
    pub max_backups: Option<usize>,
    #[serde(default)]
    pub max_size_mb: Option<u64>,
}

pub fn default_logging_config() -> LoggingConfig {
    HashMap::from([(
        "default".to_owned(),
        Section {
            console_level: "info".into(),
            file: "logs/aethos.log".into(),
            file_level: "debug".into(),
            max_age_days: Some(7),
            max_backups: Some(3),
            max_size_mb: Some(100),
        },
    )])
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: HostConfig::default(),
            logging: Some(default_logging_config()),
            container: ContainerConfig::default(),
            services_dir: None,
            services: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// Defaults, then the YAML file, then `APP__*` environment variables.
    ///
    /// `APP__CONTAINER__SERVICE_FOLDER=/srv/mods` sets `container.service_folder`.
    /// The result has an absolute, existing `host.home_dir` and any
    /// `services_dir` files merged in.
    pub fn load_layered<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let path = config_path.as_ref();
        let unlayered = AppConfig {
            logging: None,
            ..AppConfig::default()
        };

        let config: AppConfig = Figment::from(Serialized::defaults(unlayered))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;

        config.finish()
    }

    /// [`load_layered`](Self::load_layered) when a path is given, defaults otherwise.
    pub fn load_or_default<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_layered(path),
            None => Self::default().finish(),
        }
    }

    fn finish(mut self) -> Result<Self> {
        let configured = Some(self.host.home_dir.trim().to_owned()).filter(|s| !s.is_empty());
        let home = resolve_home_dir(configured, DEFAULT_HOME_SUBDIR, true)
            .context("Failed to resolve host.home_dir")?;
        self.host.home_dir = home.to_string_lossy().into_owned();

        if let Some(dir) = self.services_dir.clone() {
            merge_service_files(&mut self.services, Path::new(&dir))?;
        }
        Ok(self)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config to YAML")
    }

    /// CLI flags win over every other layer.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(folder) = &args.service_folder {
            self.container.service_folder = Some(folder.clone());
        }

        let level = match args.verbose {
            0 => None,
            1 => Some("debug"),
            _ => Some("trace"),
        };
        let logging = self.logging.get_or_insert_with(default_logging_config);
        if let (Some(level), Some(section)) = (level, logging.get_mut("default")) {
            section.console_level = level.to_owned();
        }
    }

    /// Typed view of a service's configuration entry.
    ///
    /// A missing entry yields `T::default()`; a malformed one is an error.
    pub fn service_config<T>(&self, service: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        match self.services.get(service) {
            None => Ok(T::default()),
            Some(raw) => serde_json::from_value(raw.clone())
                .with_context(|| format!("Invalid configuration for service '{service}'")),
        }
    }
}

/// Flags from the host binary that override loaded configuration.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config: Option<String>,
    pub service_folder: Option<String>,
    pub print_config: bool,
    pub verbose: u8,
}

/// `<name>.yaml` / `<name>.yml` in `dir` becomes `services[name]`, replacing
/// any inline entry. A missing directory is not an error.
fn merge_service_files(bag: &mut HashMap<String, serde_json::Value>, dir: &Path) -> Result<()> {
    if !dir.exists() {
        return Ok(());
    }

    let listing = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to list services_dir {}", dir.display()))?;
    let mut files: Vec<_> = listing
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
        })
        .collect();
    files.sort();

    for path in files {
        let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(str::to_owned) else {
            continue;
        };
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read service config {}", path.display()))?;
        let value: serde_yaml::Value = serde_yaml::from_str(&raw)
            .with_context(|| format!("Invalid YAML in {}", path.display()))?;
        bag.insert(name, serde_json::to_value(value)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests;
