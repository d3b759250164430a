//! Live dependency sources, one per manifest bucket

pub mod bower;
pub mod cargo;
pub mod npm;
pub mod scripts;

pub use bower::BowerSource;
pub use cargo::CargoSource;
pub use npm::NpmSource;
pub use scripts::ScriptSource;

use crate::config::AuditConfig;
use crate::error::Result;
use crate::types::{Bucket, LiveDependency};
use std::collections::BTreeMap;
use tracing::debug;

/// Something that can enumerate the dependencies a project ships today
pub trait DependencySource {
    /// Bucket the introspected dependencies are recorded under
    fn bucket(&self) -> Bucket;

    /// Enumerate live dependencies, in a stable order
    fn introspect(&self) -> Result<Vec<LiveDependency>>;
}

/// A fixed list of live dependencies, for replaying a known snapshot
#[derive(Debug, Clone)]
pub struct StaticSource {
    bucket: Bucket,
    entries: Vec<LiveDependency>,
}

impl StaticSource {
    pub fn new(bucket: Bucket, entries: Vec<LiveDependency>) -> Self {
        Self { bucket, entries }
    }
}

impl DependencySource for StaticSource {
    fn bucket(&self) -> Bucket {
        self.bucket
    }

    fn introspect(&self) -> Result<Vec<LiveDependency>> {
        Ok(self.entries.clone())
    }
}

/// The enabled sources, keyed by bucket.
///
/// A bucket without a source is disabled: it is never introspected and the
/// validator and updater leave its manifest section alone.
#[derive(Default)]
pub struct SourceSet {
    sources: BTreeMap<Bucket, Box<dyn DependencySource>>,
}

impl SourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the sources enabled in the configuration
    pub fn from_config(config: &AuditConfig) -> Self {
        let mut set = Self::new();
        if config.packages.enabled {
            set = set.with(CargoSource::from_config(config));
        }
        if config.scripts.enabled {
            set = set.with(ScriptSource::from_config(config));
        }
        if config.bower_components.enabled {
            set = set.with(BowerSource::from_config(config));
        }
        if config.npm_packages.enabled {
            set = set.with(NpmSource::from_config(config));
        }
        set
    }

    /// Add a source, replacing any previous one for the same bucket
    pub fn with(mut self, source: impl DependencySource + 'static) -> Self {
        self.sources.insert(source.bucket(), Box::new(source));
        self
    }

    pub fn is_enabled(&self, bucket: Bucket) -> bool {
        self.sources.contains_key(&bucket)
    }

    /// Enabled buckets, in manifest order
    pub fn buckets(&self) -> impl Iterator<Item = Bucket> + '_ {
        self.sources.keys().copied()
    }

    /// Introspect one bucket; `None` when it is disabled
    pub fn introspect(&self, bucket: Bucket) -> Result<Option<Vec<LiveDependency>>> {
        let Some(source) = self.sources.get(&bucket) else {
            return Ok(None);
        };

        let entries = source.introspect()?;
        debug!("Introspected {} live {}", entries.len(), bucket);
        Ok(Some(entries))
    }
}

impl std::fmt::Debug for SourceSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.sources.keys()).finish()
    }
}
