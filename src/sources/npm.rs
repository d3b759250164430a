//! npm packages declared in the project's package.json

use super::DependencySource;
use crate::config::AuditConfig;
use crate::error::{AuditError, Result};
use crate::types::{Bucket, LiveDependency};
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;

/// Reads declared dependencies from one package.json
#[derive(Debug, Clone)]
pub struct NpmSource {
    package_json_path: PathBuf,
    ignore_dev_dependencies: bool,
}

impl NpmSource {
    pub fn from_config(config: &AuditConfig) -> Self {
        Self {
            package_json_path: config.resolve(&config.npm_packages.package_json_path),
            ignore_dev_dependencies: config.npm_packages.ignore_dev_dependencies,
        }
    }

    /// Parsed package.json; a missing file declares nothing
    fn package(&self) -> Result<Value> {
        let content = match std::fs::read_to_string(&self.package_json_path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No package.json at {}", self.package_json_path.display());
                return Ok(Value::Object(Map::new()));
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&content).map_err(|e| AuditError::descriptor(&self.package_json_path, e))
    }

    /// `(name, version)` pairs from dependencies, then devDependencies.
    ///
    /// A dev entry with the same name as a runtime one replaces its version
    /// in place. Versions lose their leading non-digit characters.
    fn declared(&self, package: &Value) -> Vec<(String, String)> {
        let mut declared: Map<String, Value> = section(package, "dependencies");
        if !self.ignore_dev_dependencies {
            for (name, version) in section(package, "devDependencies") {
                declared.insert(name, version);
            }
        }

        declared
            .into_iter()
            .map(|(name, version)| {
                let version = normalize_version(version.as_str().unwrap_or_default());
                (name, version)
            })
            .collect()
    }
}

fn section(package: &Value, key: &str) -> Map<String, Value> {
    package
        .get(key)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

/// Drop the range operator from a version requirement: `^1.2.3` is `1.2.3`.
///
/// Git and tarball specifiers are not understood and come out mangled; a
/// requirement with no digits at all becomes empty.
pub fn normalize_version(requirement: &str) -> String {
    requirement
        .trim_start_matches(|c: char| !c.is_ascii_digit())
        .to_string()
}

impl DependencySource for NpmSource {
    fn bucket(&self) -> Bucket {
        Bucket::NpmPackages
    }

    fn introspect(&self) -> Result<Vec<LiveDependency>> {
        let package = self.package()?;
        Ok(self
            .declared(&package)
            .into_iter()
            .map(|(name, version)| {
                let mut dep = LiveDependency::versioned(name, version);
                if dep.version.as_deref() == Some("") {
                    dep.version = None;
                }
                dep
            })
            .collect())
    }
}
