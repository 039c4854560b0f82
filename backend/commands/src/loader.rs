//! Module loader: discovers command module files under the commands root and
//! keeps the registry in sync with them.
//!
//! Every file's registered names are remembered so that reloading or deleting
//! the file removes exactly what it declared.
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use slashforge_core::ModuleError;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::handlers::HandlerTable;
use crate::module::{CommandModule, parse_module};
use crate::registry::SharedRegistry;

pub const SUPPORTED_EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];

pub fn is_supported_module(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Lowercased file stem, the implicit command name of a module file.
pub fn command_stem(path: &Path) -> Option<String> {
    path.file_stem().and_then(|s| s.to_str()).map(str::to_lowercase)
}

/// All supported module files below `root`, ordered by their `/`-joined
/// relative path. A missing root yields nothing.
pub fn discover_module_files(root: &Path) -> Vec<PathBuf> {
    if !root.exists() {
        return Vec::new();
    }
    let mut files: Vec<(String, PathBuf)> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "[Loader] Skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_supported_module(entry.path()))
        .map(|entry| {
            let key = relative_key(root, entry.path());
            (key, entry.into_path())
        })
        .collect();
    files.sort_by(|a, b| a.0.cmp(&b.0));
    files.into_iter().map(|(_, path)| path).collect()
}

fn relative_key(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Result of a full load.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub files: usize,
    /// Registered names in load order.
    pub registered: Vec<String>,
    /// Relative path and error of each file that failed to load.
    pub failures: Vec<(String, String)>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

pub struct ModuleLoader {
    root: PathBuf,
    registry: SharedRegistry,
    handlers: HandlerTable,
    modules: Mutex<HashMap<PathBuf, Vec<String>>>,
}

impl ModuleLoader {
    pub fn new(root: impl Into<PathBuf>, registry: SharedRegistry, handlers: HandlerTable) -> Self {
        let root = root.into();
        let root = std::fs::canonicalize(&root).unwrap_or(root);
        Self { root, registry, handlers, modules: Mutex::new(HashMap::new()) }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    pub fn relative(&self, path: &Path) -> String {
        relative_key(&self.root, path)
    }

    /// Load every module file under the root, in path order.
    pub async fn load_all(&self) -> LoadReport {
        let mut report = LoadReport::default();
        let files = discover_module_files(&self.root);
        if files.is_empty() {
            warn!("[Loader] No command modules found in {}", self.root.display());
            return report;
        }
        report.files = files.len();

        for path in files {
            let rel = self.relative(&path);
            match self.load_file(&path).await {
                Ok(names) if names.is_empty() => {
                    warn!("[Loader] {} declared no commands", rel);
                }
                Ok(names) => {
                    for name in &names {
                        info!("[Loader] Loaded command: /{}", name);
                    }
                    report.registered.extend(names);
                }
                Err(e) => {
                    error!(file = %rel, error = %e, "[Loader] Failed to load module");
                    report.failures.push((rel, e.to_string()));
                }
            }
        }

        info!("[Loader] Total commands loaded: {}", report.registered.len());
        report
    }

    /// Read and register one file, replacing whatever it declared before.
    pub async fn load_file(&self, path: &Path) -> Result<Vec<String>, ModuleError> {
        let module = read_module(path)?;
        Ok(self.install(path, module, false).await)
    }

    /// Like `load_file`, but also drops the command named after the file's
    /// stem. On error the previous definitions stay registered.
    pub async fn reload_file(&self, path: &Path) -> Result<Vec<String>, ModuleError> {
        let module = read_module(path)?;
        Ok(self.install(path, module, true).await)
    }

    /// Remove everything the file declared. Falls back to the file stem
    /// when the file was never loaded.
    pub async fn unload_file(&self, path: &Path) -> Vec<String> {
        let mut modules = self.modules.lock().await;
        let mut registry = self.registry.write().await;

        let names = match modules.remove(path) {
            Some(names) => names,
            None => command_stem(path).into_iter().collect(),
        };
        names.into_iter().filter(|name| registry.remove(name)).collect()
    }

    /// Names currently registered from `path`.
    pub async fn module_names(&self, path: &Path) -> Vec<String> {
        self.modules.lock().await.get(path).cloned().unwrap_or_default()
    }

    async fn install(&self, path: &Path, module: CommandModule, drop_stem: bool) -> Vec<String> {
        let (defs, errors) = module.into_definitions(&self.handlers, path);
        for e in &errors {
            warn!(file = %self.relative(path), error = %e, "[Loader] Skipping invalid command");
        }

        let mut modules = self.modules.lock().await;
        let mut registry = self.registry.write().await;

        for name in modules.remove(path).unwrap_or_default() {
            registry.remove(&name);
        }
        if drop_stem {
            if let Some(stem) = command_stem(path) {
                registry.remove(&stem);
            }
        }

        let mut registered = Vec::with_capacity(defs.len());
        for def in defs {
            if let Ok(name) = registry.register(def) {
                registered.push(name);
            }
        }
        debug!(file = %self.relative(path), count = registered.len(), "[Loader] Installed module");
        modules.insert(path.to_path_buf(), registered.clone());
        registered
    }
}

/// Read the file fresh from disk; nothing is cached between loads.
fn read_module(path: &Path) -> Result<CommandModule, ModuleError> {
    let source = std::fs::read_to_string(path)
        .map_err(|source| ModuleError::Read { path: path.to_path_buf(), source })?;
    parse_module(path, &source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CommandRegistry;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, body: &str) -> PathBuf {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, body).unwrap();
        path
    }

    fn loader(dir: &TempDir) -> ModuleLoader {
        ModuleLoader::new(dir.path(), CommandRegistry::shared(), HandlerTable::with_builtins())
    }

    fn reply_module(name: &str, text: &str) -> String {
        format!("name = \"{name}\"\ndescription = \"{text}\"\nreply = \"{text}\"\n")
    }

    #[test]
    fn discovery_is_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "b.toml", "");
        write(dir.path(), "a/z.yaml", "");
        write(dir.path(), "a.json", "");
        write(dir.path(), "notes.md", "");
        write(dir.path(), "c.YML", "");

        let files: Vec<String> = discover_module_files(dir.path())
            .iter()
            .map(|p| relative_key(dir.path(), p))
            .collect();
        assert_eq!(files, ["a.json", "a/z.yaml", "b.toml", "c.YML"]);
    }

    #[test]
    fn missing_root_discovers_nothing() {
        let dir = TempDir::new().unwrap();
        assert!(discover_module_files(&dir.path().join("nope")).is_empty());
    }

    #[tokio::test]
    async fn load_all_registers_in_path_order_and_reports_failures() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "zeta.toml", &reply_module("zeta", "last"));
        write(dir.path(), "alpha.toml", &reply_module("alpha", "first"));
        write(dir.path(), "broken.json", "{ nope");
        let loader = loader(&dir);

        let report = loader.load_all().await;

        assert_eq!(report.files, 3);
        assert_eq!(report.registered, ["alpha", "zeta"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, "broken.json");
        assert_eq!(loader.registry().read().await.len(), 2);
    }

    #[tokio::test]
    async fn reload_replaces_previous_definitions() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "greet.toml", &reply_module("hello", "v1"));
        let loader = loader(&dir);
        let path = fs::canonicalize(path).unwrap();
        loader.load_file(&path).await.unwrap();

        fs::write(&path, reply_module("howdy", "v2")).unwrap();
        let names = loader.reload_file(&path).await.unwrap();

        let registry = loader.registry().read().await;
        assert_eq!(names, ["howdy"]);
        assert!(!registry.has("hello"));
        assert_eq!(registry.get("howdy").unwrap().description, "v2");
    }

    #[tokio::test]
    async fn failed_reload_keeps_old_commands() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "greet.toml", &reply_module("hello", "v1"));
        let loader = loader(&dir);
        loader.load_file(&path).await.unwrap();

        fs::write(&path, "name = [unterminated").unwrap();
        assert!(loader.reload_file(&path).await.is_err());

        assert!(loader.registry().read().await.has("hello"));
    }

    #[tokio::test]
    async fn unload_removes_recorded_names_or_falls_back_to_stem() {
        let dir = TempDir::new().unwrap();
        let path = write(
            dir.path(),
            "pack.yaml",
            "commands:\n  - name: one\n    description: One\n    reply: one\n  - name: two\n    description: Two\n    reply: two\n",
        );
        let loader = loader(&dir);
        loader.load_file(&path).await.unwrap();

        let mut removed = loader.unload_file(&path).await;
        removed.sort();
        assert_eq!(removed, ["one", "two"]);
        assert!(loader.registry().read().await.is_empty());

        // Never loaded: the stem is the best guess.
        let stray = dir.path().join("stray.toml");
        loader
            .registry()
            .write()
            .await
            .register(crate::types::CommandDef::new(
                "stray",
                "left behind",
                std::sync::Arc::new(crate::handlers::EchoHandler),
            ))
            .unwrap();
        assert_eq!(loader.unload_file(&stray).await, ["stray"]);
    }

    #[tokio::test]
    async fn empty_directory_loads_nothing() {
        let dir = TempDir::new().unwrap();
        let report = loader(&dir).load_all().await;
        assert_eq!(report.files, 0);
        assert!(report.registered.is_empty());
        assert!(report.is_clean());
    }
}
