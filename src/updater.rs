//! Merge live dependency state into an existing, possibly hand-edited manifest

use crate::config::AuditConfig;
use crate::error::{AuditError, Result};
use crate::homepage::ensure_valid_url;
use crate::license::license_change_note;
use crate::manifest::{write_text, Entries, Manifest};
use crate::sources::SourceSet;
use crate::types::{base_name, Bucket, DependencyRecord, LiveDependency};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Rewrites the manifest so it matches the project again
pub struct ManifestUpdater {
    path: PathBuf,
    sources: SourceSet,
}

impl ManifestUpdater {
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

    /// Update the manifest file in place
    pub fn update_file(&self) -> Result<()> {
        if !self.path.exists() {
            return Err(AuditError::ManifestMissing {
                path: self.path.clone(),
            });
        }

        info!("Updating manifest at {}", self.path.display());
        let existing = std::fs::read_to_string(&self.path)?;
        let updated = self.update(&existing)?;
        write_text(&self.path, &updated)
    }

    /// Merge live state into manifest text and return the new text.
    ///
    /// Running this on its own output with the same live state returns the
    /// same text.
    pub fn update(&self, existing: &str) -> Result<String> {
        let mut manifest = Manifest::parse(existing).map_err(|source| AuditError::ManifestParse {
            path: self.path.clone(),
            source,
        })?;

        for bucket in Bucket::ALL {
            let Some(current) = manifest.bucket(bucket) else {
                debug!("{} is not tracked by the manifest, leaving it alone", bucket);
                continue;
            };
            let Some(live) = self.sources.introspect(bucket)? else {
                debug!("{} is disabled, leaving it alone", bucket);
                continue;
            };

            let merged = match bucket {
                Bucket::Packages => merge_packages(current, &live),
                _ => merge_assets(current, &live),
            };
            *manifest.bucket_mut(bucket) = Some(merged);
        }

        manifest.render()
    }
}

/// Merge live packages into the recorded ones.
///
/// Every live package first claims the recorded entry keyed by its identity
/// or its bare name. Packages left without one then claim the first
/// unclaimed entry whose base name equals the package name. A claimed entry
/// keeps its manual edits and moves to the package's current identity (a
/// bare key stays bare); if the live license differs from the recorded one,
/// the license is replaced by a change note. Unclaimed entries belong to
/// packages that are gone and are dropped.
pub fn merge_packages(existing: &Entries, live: &[LiveDependency]) -> Entries {
    let mut claimed: HashSet<&str> = HashSet::new();
    let mut claims: Vec<Option<&str>> = Vec::with_capacity(live.len());

    for dep in live {
        let claim = [dep.identity.as_str(), dep.name.as_str()]
            .into_iter()
            .filter_map(|key| existing.get_key_value(key))
            .map(|(key, _)| key.as_str())
            .find(|key| claimed.insert(*key));
        claims.push(claim);
    }

    let mut by_base: HashMap<&str, Vec<&str>> = HashMap::new();
    for key in existing.keys() {
        by_base.entry(base_name(key)).or_default().push(key);
    }
    for (dep, claim) in live.iter().zip(claims.iter_mut()) {
        if claim.is_some() {
            continue;
        }
        *claim = by_base
            .get(dep.name.as_str())
            .and_then(|keys| keys.iter().copied().find(|key| !claimed.contains(key)));
        if let Some(key) = *claim {
            claimed.insert(key);
        }
    }

    let mut merged = Entries::new();
    for (dep, claim) in live.iter().zip(claims) {
        let Some((old_key, record)) = claim.and_then(|key| existing.get_key_value(key)) else {
            debug!("New package {}", dep.identity);
            merged.insert(dep.identity.clone(), DependencyRecord::from_live(dep));
            continue;
        };

        let mut record = record.clone();
        if let Some(license) = dep.license.as_deref().filter(|l| !l.trim().is_empty()) {
            if record.license.as_deref() != Some(license) {
                let licenses = if dep.licenses.is_empty() {
                    vec![license.to_string()]
                } else {
                    dep.licenses.clone()
                };
                let note = license_change_note(record.license.as_deref(), &licenses);
                if record.license.as_deref() != Some(note.as_str()) {
                    warn!(
                        "License of {} changed from {:?} to {}",
                        dep.name,
                        record.license.as_deref().unwrap_or_default(),
                        license
                    );
                }
                record.license = Some(note);
            }
        }

        let key = if *old_key == dep.name {
            dep.name.clone()
        } else {
            dep.identity.clone()
        };
        if key != *old_key {
            debug!("Renaming {} to {}", old_key, key);
        }
        merged.insert(key, record);
    }

    for key in existing.keys().filter(|key| !claimed.contains(key.as_str())) {
        debug!("Dropping {}, no longer part of the project", key);
    }

    merged
}

/// Merge live assets into the recorded ones.
///
/// The result holds exactly the live identities, in live order; recorded
/// metadata wins over placeholders wherever an identity is already known.
/// An empty live set empties the bucket rather than leaving it as recorded.
pub fn merge_assets(existing: &Entries, live: &[LiveDependency]) -> Entries {
    let mut merged = Entries::new();

    for dep in live {
        let record = match existing.get(&dep.identity) {
            Some(record) => record.clone(),
            None => {
                debug!("New asset {}", dep.identity);
                DependencyRecord::placeholder(dep.homepage.as_deref().and_then(ensure_valid_url))
            }
        };
        merged.insert(dep.identity.clone(), record);
    }

    for key in existing.keys().filter(|key| !merged.contains_key(*key)) {
        debug!("Dropping {}, no longer part of the project", key);
    }

    merged
}
