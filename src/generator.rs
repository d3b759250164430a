//! Bootstrap a manifest from the live project

use crate::config::AuditConfig;
use crate::error::{AuditError, Result};
use crate::homepage::ensure_valid_url;
use crate::manifest::{Entries, Manifest};
use crate::sources::SourceSet;
use crate::types::{Bucket, DependencyRecord};
use std::path::{Path, PathBuf};
use tracing::info;

/// Creates the manifest when none exists yet
pub struct ManifestGenerator {
    path: PathBuf,
    sources: SourceSet,
}

impl ManifestGenerator {
    pub fn new(path: impl Into<PathBuf>, sources: SourceSet) -> Self {
        Self {
            path: path.into(),
            sources,
        }
    }

    pub fn from_config(config: &AuditConfig) -> Self {
        Self::new(config.manifest_path(), SourceSet::from_config(config))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Build and write the manifest; refuses to overwrite an existing file
    pub fn generate(&self) -> Result<Manifest> {
        if self.path.exists() {
            return Err(AuditError::ManifestAlreadyExists {
                path: self.path.clone(),
            });
        }

        let manifest = self.build()?;
        manifest.write(&self.path)?;
        info!("Created manifest at {}", self.path.display());
        Ok(manifest)
    }

    /// Fresh manifest covering every enabled bucket
    pub fn build(&self) -> Result<Manifest> {
        let mut manifest = Manifest::default();

        for bucket in Bucket::ALL {
            let Some(live) = self.sources.introspect(bucket)? else {
                continue;
            };

            let mut entries = Entries::new();
            for dep in &live {
                let record = match bucket {
                    Bucket::Packages => DependencyRecord::from_live(dep),
                    _ => DependencyRecord::placeholder(
                        dep.homepage.as_deref().and_then(ensure_valid_url),
                    ),
                };
                entries.insert(dep.identity.clone(), record);
            }
            *manifest.bucket_mut(bucket) = Some(entries);
        }

        Ok(manifest)
    }
}
