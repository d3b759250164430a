//! Bower components installed under the components directory

use super::DependencySource;
use crate::config::{AuditConfig, LicensePolicy};
use crate::error::{AuditError, Result};
use crate::types::{Bucket, LiveDependency};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

const DESCRIPTOR_FILE: &str = ".bower.json";

/// Reads the `.bower.json` descriptor of every installed component
#[derive(Debug, Clone)]
pub struct BowerSource {
    components_path: PathBuf,
    policy: LicensePolicy,
}

/// The parts of `.bower.json` the manifest cares about
#[derive(Debug, Deserialize)]
struct BowerDescriptor {
    name: String,
    #[serde(rename = "_release", default)]
    release: Option<String>,
    #[serde(default)]
    homepage: Option<String>,
    #[serde(default)]
    license: Option<BowerLicense>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BowerLicense {
    Single(String),
    Many(Vec<String>),
    /// Legacy `{"type": "MIT", "url": "..."}` form
    Typed {
        #[serde(rename = "type")]
        kind: String,
    },
    Other(serde_json::Value),
}

impl BowerLicense {
    fn text(&self) -> Option<String> {
        match self {
            Self::Single(license) => Some(license.clone()),
            Self::Many(licenses) => Some(licenses.join(" OR ")),
            Self::Typed { kind } => Some(kind.clone()),
            Self::Other(value) => {
                debug!("Ignoring unrecognised bower license {}", value);
                None
            }
        }
    }
}

impl BowerSource {
    pub fn from_config(config: &AuditConfig) -> Self {
        Self {
            components_path: config.resolve(&config.bower_components.components_path),
            policy: config.license_policy.clone(),
        }
    }

    /// Descriptor paths, sorted by component directory
    fn descriptor_paths(&self) -> Result<Vec<PathBuf>> {
        if !self.components_path.is_dir() {
            debug!(
                "No bower components directory at {}",
                self.components_path.display()
            );
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(&self.components_path)? {
            let descriptor = entry?.path().join(DESCRIPTOR_FILE);
            if descriptor.is_file() {
                paths.push(descriptor);
            }
        }
        paths.sort();
        Ok(paths)
    }

    fn read_descriptor(path: &Path) -> Result<BowerDescriptor> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| AuditError::descriptor(path, e))
    }

    fn live_dependency(&self, descriptor: BowerDescriptor) -> LiveDependency {
        let license = descriptor.license.as_ref().and_then(BowerLicense::text);
        let release = descriptor.release.unwrap_or_default();

        let mut dep = LiveDependency::versioned(descriptor.name.clone(), release);
        if self.policy.is_version_exempt(license.as_deref()) {
            dep.identity = descriptor.name;
        }
        if let Some(license) = license {
            dep = dep.with_license(license);
        }
        if let Some(homepage) = descriptor.homepage {
            dep = dep.with_homepage(homepage);
        }
        dep
    }
}

impl DependencySource for BowerSource {
    fn bucket(&self) -> Bucket {
        Bucket::BowerComponents
    }

    fn introspect(&self) -> Result<Vec<LiveDependency>> {
        let mut components = Vec::new();
        for path in self.descriptor_paths()? {
            let descriptor = Self::read_descriptor(&path)?;
            components.push(self.live_dependency(descriptor));
        }
        Ok(components)
    }
}
