//! Module loaders: turn a set of compiled-in [`ServiceModule`]s into
//! registrations.
//!
//! Modules are linked statically. A crate submits a [`ModuleRegistrator`]
//! through `inventory`, or the host builds a [`ModuleCatalog`] by hand. The
//! [`FolderLoader`] keeps the older folder-driven setup: a directory whose
//! file names pick which catalog modules to configure.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::context::AppContext;
use crate::contracts::ServiceModule;
use crate::error::ContainerError;
use crate::registry::ServiceRegistry;

/// Submitted by module crates via `inventory::submit!`.
pub struct ModuleRegistrator {
    pub id: &'static str,
    pub make: fn() -> Arc<dyn ServiceModule>,
}

inventory::collect!(ModuleRegistrator);

#[derive(Clone)]
pub struct ModuleEntry {
    pub id: String,
    pub module: Arc<dyn ServiceModule>,
}

impl std::fmt::Debug for ModuleEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleEntry").field("id", &self.id).finish()
    }
}

/// Something that configures modules against a registry.
pub trait ModuleLoader: Send + Sync {
    /// Returns how many modules were configured.
    fn load(&self, app: &AppContext, registry: &mut ServiceRegistry)
        -> Result<usize, ContainerError>;
}

/// Ordered set of known modules, keyed by id.
#[derive(Clone, Debug, Default)]
pub struct ModuleCatalog {
    entries: Vec<ModuleEntry>,
}

impl ModuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every module submitted through `inventory`, sorted by id.
    ///
    /// Link order is not stable, so sorting is what keeps registration (and
    /// hence start) order reproducible.
    pub fn discover() -> Self {
        let mut catalog = Self::new();
        let mut found: Vec<&ModuleRegistrator> = inventory::iter::<ModuleRegistrator>
            .into_iter()
            .collect();
        found.sort_by_key(|r| r.id);
        for r in found {
            catalog.insert(r.id, (r.make)());
        }
        debug!(modules = ?catalog.ids().collect::<Vec<_>>(), "Discovered modules");
        catalog
    }

    pub fn with_module(mut self, id: impl Into<String>, module: impl ServiceModule) -> Self {
        self.insert(id, Arc::new(module));
        self
    }

    /// Add a module; an existing entry with the same id is replaced in place.
    pub fn insert(&mut self, id: impl Into<String>, module: Arc<dyn ServiceModule>) {
        let id = id.into();
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(existing) => existing.module = module,
            None => self.entries.push(ModuleEntry { id, module }),
        }
    }

    pub fn get(&self, id: &str) -> Option<&ModuleEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Configure one module unless it is disabled. Returns whether it ran.
fn configure_entry(
    entry: &ModuleEntry,
    app: &AppContext,
    registry: &mut ServiceRegistry,
) -> Result<bool, ContainerError> {
    if registry.is_module_disabled(&entry.id) {
        info!(module = %entry.id, "Module disabled by configuration; skipping");
        return Ok(false);
    }
    debug!(module = %entry.id, "Configuring module");
    entry
        .module
        .configure(app, registry)
        .map_err(|source| ContainerError::ModuleConfigure {
            module: entry.id.clone(),
            source,
        })?;
    Ok(true)
}

impl ModuleLoader for ModuleCatalog {
    fn load(
        &self,
        app: &AppContext,
        registry: &mut ServiceRegistry,
    ) -> Result<usize, ContainerError> {
        let mut configured = 0;
        for entry in &self.entries {
            if configure_entry(entry, app, registry)? {
                configured += 1;
            }
        }
        info!(configured, known = self.entries.len(), "Modules loaded");
        Ok(configured)
    }
}

/// Loader driven by `container.service_folder`.
///
/// Every regular, non-hidden file in the folder names a module by its stem
/// (`greeter.yaml`, `greeter.toml` and `greeter` all select `greeter`).
/// Modules are configured in file-name order.
#[derive(Clone, Debug)]
pub struct FolderLoader {
    catalog: ModuleCatalog,
}

impl FolderLoader {
    pub fn new(catalog: ModuleCatalog) -> Self {
        Self { catalog }
    }

    /// Module ids named by the folder's files, sorted and de-duplicated.
    pub fn scan(folder: &Path) -> Result<Vec<String>, ContainerError> {
        let read = std::fs::read_dir(folder).map_err(|e| {
            ContainerError::Configuration(format!(
                "cannot read service folder '{}': {e}",
                folder.display()
            ))
        })?;

        let mut ids = Vec::new();
        for entry in read {
            let path = entry
                .map_err(|e| {
                    ContainerError::Configuration(format!(
                        "cannot list service folder '{}': {e}",
                        folder.display()
                    ))
                })?
                .path();
            if !path.is_file() {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if stem.is_empty() || stem.starts_with('.') {
                continue;
            }
            ids.push(stem.to_owned());
        }
        ids.sort();
        ids.dedup();
        Ok(ids)
    }
}

impl ModuleLoader for FolderLoader {
    fn load(
        &self,
        app: &AppContext,
        registry: &mut ServiceRegistry,
    ) -> Result<usize, ContainerError> {
        let Some(folder) = registry.config().container.service_folder.clone() else {
            return Err(ContainerError::Configuration(
                "container.service_folder is required by the folder loader".into(),
            ));
        };

        let ids = Self::scan(Path::new(&folder))?;
        let mut configured = 0;
        for id in &ids {
            match self.catalog.get(id) {
                Some(entry) => {
                    if configure_entry(entry, app, registry)? {
                        configured += 1;
                    }
                }
                None => warn!(module = %id, folder = %folder, "No compiled-in module matches; skipping"),
            }
        }
        info!(configured, folder = %folder, "Modules loaded from service folder");
        Ok(configured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::Service;
    use crate::descriptor::ServiceDescriptor;
    use aethos_bootstrap::AppConfig;

    struct Dummy;
    impl Service for Dummy {}

    /// Registers one service named after itself.
    struct Single(&'static str);

    impl ServiceModule for Single {
        fn configure(&self, _app: &AppContext, registry: &mut ServiceRegistry) -> anyhow::Result<()> {
            registry.register(ServiceDescriptor::new(self.0).with_instance(Dummy));
            Ok(())
        }
    }

    struct Failing;

    impl ServiceModule for Failing {
        fn configure(&self, _app: &AppContext, _registry: &mut ServiceRegistry) -> anyhow::Result<()> {
            anyhow::bail!("missing credentials")
        }
    }

    fn registry_with(f: impl FnOnce(&mut AppConfig)) -> ServiceRegistry {
        let mut cfg = AppConfig::default();
        f(&mut cfg);
        ServiceRegistry::new(Arc::new(cfg))
    }

    #[test]
    fn catalog_loads_in_order_and_skips_disabled() {
        let catalog = ModuleCatalog::new()
            .with_module("b", Single("svc_b"))
            .with_module("a", Single("svc_a"))
            .with_module("c", Single("svc_c"));
        let mut registry = registry_with(|c| {
            c.container.disable_modules.insert("c".into());
        });

        let n = catalog.load(&AppContext::empty(), &mut registry).unwrap();
        assert_eq!(n, 2);
        assert_eq!(
            registry.service_names().collect::<Vec<_>>(),
            vec!["svc_b", "svc_a"]
        );
    }

    #[test]
    fn catalog_insert_replaces_same_id() {
        let catalog = ModuleCatalog::new()
            .with_module("a", Single("first"))
            .with_module("a", Single("second"));
        assert_eq!(catalog.len(), 1);

        let mut registry = ServiceRegistry::default();
        catalog.load(&AppContext::empty(), &mut registry).unwrap();
        assert!(registry.contains("second"));
        assert!(!registry.contains("first"));
    }

    #[test]
    fn configure_failure_names_module() {
        let catalog = ModuleCatalog::new().with_module("broken", Failing);
        let mut registry = ServiceRegistry::default();
        let err = catalog
            .load(&AppContext::empty(), &mut registry)
            .unwrap_err();
        match err {
            ContainerError::ModuleConfigure { module, source } => {
                assert_eq!(module, "broken");
                assert!(source.to_string().contains("credentials"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn folder_loader_requires_service_folder() {
        let loader = FolderLoader::new(ModuleCatalog::new());
        let mut registry = ServiceRegistry::default();
        let err = loader
            .load(&AppContext::empty(), &mut registry)
            .unwrap_err();
        assert!(matches!(err, ContainerError::Configuration(ref m) if m.contains("service_folder")));
    }

    #[test]
    fn folder_loader_rejects_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope");
        let loader = FolderLoader::new(ModuleCatalog::new());
        let mut registry = registry_with(|c| {
            c.container.service_folder = Some(missing.to_string_lossy().into_owned());
        });
        let err = loader
            .load(&AppContext::empty(), &mut registry)
            .unwrap_err();
        assert!(matches!(err, ContainerError::Configuration(ref m) if m.contains("nope")));
    }

    #[test]
    fn folder_scan_uses_sorted_unique_stems() {
        let tmp = tempfile::tempdir().unwrap();
        for f in ["zeta.yaml", "alpha.toml", "alpha.yaml", ".hidden", "beta"] {
            std::fs::write(tmp.path().join(f), "").unwrap();
        }
        std::fs::create_dir(tmp.path().join("subdir")).unwrap();

        let ids = FolderLoader::scan(tmp.path()).unwrap();
        assert_eq!(ids, vec!["alpha", "beta", "zeta"]);
    }

    #[test]
    fn folder_loader_honors_disabled_and_unknown() {
        let tmp = tempfile::tempdir().unwrap();
        for f in ["alpha.yaml", "beta.yaml", "ghost.yaml"] {
            std::fs::write(tmp.path().join(f), "").unwrap();
        }
        let catalog = ModuleCatalog::new()
            .with_module("alpha", Single("svc_alpha"))
            .with_module("beta", Single("svc_beta"))
            .with_module("gamma", Single("svc_gamma"));
        let mut registry = registry_with(|c| {
            c.container.service_folder = Some(tmp.path().to_string_lossy().into_owned());
            c.container.disable_modules.insert("beta".into());
        });

        let n = FolderLoader::new(catalog)
            .load(&AppContext::empty(), &mut registry)
            .unwrap();
        assert_eq!(n, 1);
        assert_eq!(registry.service_names().collect::<Vec<_>>(), vec!["svc_alpha"]);
    }
}
