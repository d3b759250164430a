//! Cargo packages resolved for the project, via `cargo metadata`

use super::DependencySource;
use crate::config::{AuditConfig, LicensePolicy};
use crate::error::{AuditError, Result};
use crate::types::{Bucket, LiveDependency};
use cargo_metadata::{CargoOpt, Metadata, MetadataCommand, Package};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::debug;

/// Enumerates every package in the resolved dependency graph
#[derive(Debug, Clone)]
pub struct CargoSource {
    project_dir: PathBuf,
    bootstrap_package: Option<String>,
    policy: LicensePolicy,
}

/// The fields of a resolved package that decide its manifest entry
#[derive(Debug, Clone, Copy)]
struct PackageInfo<'a> {
    name: &'a str,
    version: &'a str,
    license: Option<&'a str>,
    homepage: Option<&'a str>,
}

impl CargoSource {
    pub fn from_config(config: &AuditConfig) -> Self {
        let project_dir = match &config.packages.project_dir {
            Some(dir) => config.resolve(dir),
            None => config.project_root.clone(),
        };

        Self {
            project_dir,
            bootstrap_package: config.packages.bootstrap_package.clone(),
            policy: config.license_policy.clone(),
        }
    }

    fn metadata(&self) -> Result<Metadata> {
        let manifest_path = self.project_dir.join("Cargo.toml");

        if !manifest_path.exists() {
            return Err(AuditError::introspection(format!(
                "Cargo.toml not found at {}",
                manifest_path.display()
            )));
        }

        let metadata = MetadataCommand::new()
            .manifest_path(&manifest_path)
            .features(CargoOpt::AllFeatures)
            .exec()?;

        Ok(metadata)
    }

    /// Live entries for every third-party package in the metadata
    fn extract(&self, metadata: &Metadata) -> Vec<LiveDependency> {
        let members: HashSet<_> = metadata.workspace_members.iter().collect();

        let mut packages: Vec<&Package> = metadata
            .packages
            .iter()
            .filter(|pkg| !members.contains(&pkg.id))
            .collect();
        packages.sort_by(|a, b| {
            (a.name.to_lowercase(), &a.version).cmp(&(b.name.to_lowercase(), &b.version))
        });

        packages
            .into_iter()
            .map(|pkg| {
                let version = pkg.version.to_string();
                self.live_dependency(PackageInfo {
                    name: &pkg.name,
                    version: &version,
                    license: pkg.license.as_deref(),
                    homepage: pkg.homepage.as_deref().or(pkg.repository.as_deref()),
                })
            })
            .collect()
    }

    fn live_dependency(&self, info: PackageInfo<'_>) -> LiveDependency {
        let unversioned = self.bootstrap_package.as_deref() == Some(info.name)
            || self.policy.is_version_exempt(info.license);

        let mut dep = LiveDependency::versioned(info.name, info.version);
        if unversioned {
            dep.identity = info.name.to_string();
        }
        if let Some(license) = info.license {
            dep = dep.with_license(license);
        }
        if let Some(homepage) = info.homepage {
            dep = dep.with_homepage(homepage);
        }
        dep
    }
}

impl DependencySource for CargoSource {
    fn bucket(&self) -> Bucket {
        Bucket::Packages
    }

    fn introspect(&self) -> Result<Vec<LiveDependency>> {
        debug!("Reading cargo metadata in {}", self.project_dir.display());
        let metadata = self.metadata()?;
        Ok(self.extract(&metadata))
    }
}
