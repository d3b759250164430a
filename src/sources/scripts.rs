//! Script assets checked into the project tree

use super::DependencySource;
use crate::config::AuditConfig;
use crate::error::Result;
use crate::types::{Bucket, LiveDependency};
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Walks the configured search roots for script files
#[derive(Debug, Clone)]
pub struct ScriptSource {
    project_root: PathBuf,
    search_paths: Vec<PathBuf>,
    whitelist_paths: Vec<PathBuf>,
    extensions: Vec<String>,
}

impl ScriptSource {
    pub fn from_config(config: &AuditConfig) -> Self {
        Self {
            project_root: config.project_root.clone(),
            search_paths: config
                .scripts
                .search_paths
                .iter()
                .map(|p| config.resolve(p))
                .collect(),
            whitelist_paths: config
                .scripts
                .whitelist_paths
                .iter()
                .map(|p| config.resolve(p))
                .collect(),
            extensions: config.scripts.extensions.clone(),
        }
    }

    fn is_script(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|known| known == ext))
    }

    fn is_whitelisted(&self, path: &Path) -> bool {
        self.whitelist_paths.iter().any(|prefix| path.starts_with(prefix))
    }

    /// Path relative to the project root, `/`-separated
    fn identity(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.project_root).unwrap_or(path);
        relative
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                Component::RootDir => Some(String::new()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl DependencySource for ScriptSource {
    fn bucket(&self) -> Bucket {
        Bucket::Scripts
    }

    fn introspect(&self) -> Result<Vec<LiveDependency>> {
        let mut scripts = Vec::new();

        for root in &self.search_paths {
            if !root.is_dir() {
                debug!("Skipping missing script directory {}", root.display());
                continue;
            }

            for entry in WalkDir::new(root).sort_by_file_name() {
                let entry = entry?;
                let path = entry.path();
                if !entry.file_type().is_file() || !self.is_script(path) || self.is_whitelisted(path) {
                    continue;
                }
                scripts.push(LiveDependency::bare(self.identity(path)));
            }
        }

        Ok(scripts)
    }
}
