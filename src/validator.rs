//! Reconciliation of the manifest against live dependencies and the license policy

use crate::config::{AuditConfig, LicensePolicy};
use crate::error::Result;
use crate::manifest::{Manifest, ManifestStore};
use crate::sources::SourceSet;
use crate::types::{case_insensitive_key, Bucket, PrettyEntry, ValidationError};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info};

/// Outcome of one validation run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Human-readable error lines
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

/// Checks that the manifest matches the project and that every license is acceptable
pub struct LicenseValidator {
    store: ManifestStore,
    sources: SourceSet,
    policy: LicensePolicy,
}

impl LicenseValidator {
    pub fn new(store: ManifestStore, sources: SourceSet, policy: LicensePolicy) -> Self {
        Self {
            store,
            sources,
            policy,
        }
    }

    /// Validator over the configured manifest and enabled sources
    pub fn from_config(config: &AuditConfig) -> Self {
        Self::new(
            ManifestStore::new(config.manifest_path()),
            SourceSet::from_config(config),
            config.license_policy.clone(),
        )
    }

    pub fn manifest(&self) -> Result<&Manifest> {
        self.store.manifest()
    }

    /// Run every enabled bucket's checks, in bucket order
    pub fn validate(&self) -> Result<ValidationReport> {
        let manifest = self.store.manifest()?;
        let mut report = ValidationReport::default();

        for bucket in self.sources.buckets() {
            let errors = self.validate_bucket(manifest, bucket)?;
            debug!("{} produced {} validation errors", bucket, errors.len());
            report.errors.extend(errors);
        }

        info!(
            "Validation finished with {} errors across {} buckets",
            report.errors.len(),
            self.sources.buckets().count()
        );
        Ok(report)
    }

    /// Shorthand for `validate()?.is_valid()`
    pub fn is_valid(&self) -> Result<bool> {
        Ok(self.validate()?.is_valid())
    }

    fn validate_bucket(&self, manifest: &Manifest, bucket: Bucket) -> Result<Vec<ValidationError>> {
        let Some(live) = self.sources.introspect(bucket)? else {
            return Ok(Vec::new());
        };

        let live: HashSet<String> = live.into_iter().map(|dep| dep.identity).collect();
        let recorded = manifest.sorted_identities(bucket);
        let recorded_set: HashSet<&str> = recorded.iter().copied().collect();

        let mut missing: Vec<&String> = live
            .iter()
            .filter(|identity| !recorded_set.contains(identity.as_str()))
            .collect();
        missing.sort_by_cached_key(|identity| case_insensitive_key(identity));

        let mut errors: Vec<ValidationError> = missing
            .into_iter()
            .map(|identity| ValidationError::MissingFromManifest {
                bucket,
                identity: identity.clone(),
            })
            .collect();

        errors.extend(
            recorded
                .iter()
                .filter(|identity| !live.contains(**identity))
                .map(|identity| ValidationError::UnknownInManifest {
                    bucket,
                    identity: identity.to_string(),
                }),
        );

        if let Some(entries) = manifest.bucket(bucket) {
            for identity in &recorded {
                let record = &entries[*identity];
                if !self.policy.acceptable(record, identity) {
                    errors.push(ValidationError::LicenseNotWhitelisted {
                        bucket,
                        identity: identity.to_string(),
                        license: record.license.clone(),
                    });
                }
            }
        }

        Ok(errors)
    }

    /// Display list of a recorded bucket
    pub fn pretty_list(&self, bucket: Bucket) -> Result<Vec<PrettyEntry>> {
        Ok(self.store.manifest()?.pretty_list(bucket))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Entries;
    use crate::sources::StaticSource;
    use crate::types::{DependencyRecord, LiveDependency};

    fn record(license: &str) -> DependencyRecord {
        DependencyRecord {
            license: Some(license.to_string()),
            ..DependencyRecord::default()
        }
    }

    fn packages(entries: &[(&str, &str)]) -> Manifest {
        let mut recorded = Entries::new();
        for (identity, license) in entries {
            recorded.insert(identity.to_string(), record(license));
        }
        Manifest {
            packages: Some(recorded),
            scripts: Some(Entries::new()),
            ..Manifest::default()
        }
    }

    fn live(identities: &[&str]) -> StaticSource {
        StaticSource::new(
            Bucket::Packages,
            identities.iter().map(|id| LiveDependency::bare(*id)).collect(),
        )
    }

    fn validator(manifest: Manifest, sources: SourceSet) -> LicenseValidator {
        let mut policy = LicensePolicy::default();
        policy.version_whitelisted_license = Some("New Relic".to_string());
        LicenseValidator::new(
            ManifestStore::from_manifest("dependency_manifest.yml", manifest),
            sources,
            policy,
        )
    }

    #[test]
    fn test_empty_manifest_and_no_dependencies() {
        let v = validator(packages(&[]), SourceSet::new().with(live(&[])));
        assert!(v.is_valid().unwrap());
    }

    #[test]
    fn test_matching_sets_are_valid() {
        let v = validator(
            packages(&[("rails-4.2.0", "MIT"), ("newrelic_rpm", "New Relic")]),
            SourceSet::new().with(live(&["rails-4.2.0", "newrelic_rpm"])),
        );
        let report = v.validate().unwrap();
        assert!(report.is_valid());
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_detects_mismatched_packages() {
        let v = validator(
            packages(&[("foo-1.2", "MIT"), ("baz-1.3", "BSD")]),
            SourceSet::new().with(live(&["bar-1.2", "baz-1.3"])),
        );
        assert_eq!(
            v.validate().unwrap().messages(),
            vec![
                "bar-1.2 is included in the application, but not in the manifest",
                "foo-1.2 is included in the manifest, but not in the application",
            ]
        );
    }

    #[test]
    fn test_detects_mismatched_versions() {
        let v = validator(
            packages(&[("foo-1.2", "MIT"), ("baz-1.3", "BSD")]),
            SourceSet::new().with(live(&["foo-1.2", "baz-1.2"])),
        );
        assert_eq!(
            v.validate().unwrap().messages(),
            vec![
                "baz-1.2 is included in the application, but not in the manifest",
                "baz-1.3 is included in the manifest, but not in the application",
            ]
        );
    }

    #[test]
    fn test_missing_sorted_case_insensitively() {
        let v = validator(
            packages(&[]),
            SourceSet::new().with(live(&["zeta-1", "Alpha-1", "beta-1"])),
        );
        let identities: Vec<String> = v
            .validate()
            .unwrap()
            .errors
            .iter()
            .map(|e| e.identity().to_string())
            .collect();
        assert_eq!(identities, vec!["Alpha-1", "beta-1", "zeta-1"]);
    }

    #[test]
    fn test_complains_about_license() {
        let v = validator(
            packages(&[("foo-1.2", "MIT"), ("baz-1.3", "GPL")]),
            SourceSet::new().with(live(&["foo-1.2", "baz-1.3"])),
        );
        let report = v.validate().unwrap();
        assert!(!report.is_valid());
        assert_eq!(
            report.errors,
            vec![ValidationError::LicenseNotWhitelisted {
                bucket: Bucket::Packages,
                identity: "baz-1.3".to_string(),
                license: Some("GPL".to_string()),
            }]
        );
    }

    #[test]
    fn test_package_whitelist_accepts_any_license() {
        let mut v = validator(
            packages(&[("odd-1.0", "Proprietary")]),
            SourceSet::new().with(live(&["odd-1.0"])),
        );
        v.policy.package_whitelist.insert("odd-1.0".to_string());
        assert!(v.is_valid().unwrap());
    }

    #[test]
    fn test_disabled_bucket_contributes_nothing() {
        let mut manifest = packages(&[("rails-4.2.0", "MIT")]);
        let mut scripts = Entries::new();
        scripts.insert("app/gone.js".to_string(), record("GPL"));
        manifest.scripts = Some(scripts);

        let v = validator(manifest, SourceSet::new().with(live(&["rails-4.2.0"])));
        assert!(v.is_valid().unwrap());
    }

    #[test]
    fn test_untracked_bucket_reports_everything_missing() {
        let manifest = Manifest::default();
        let sources = SourceSet::new().with(StaticSource::new(
            Bucket::NpmPackages,
            vec![LiveDependency::versioned("react", "15.4.2")],
        ));
        let v = validator(manifest, sources);
        assert_eq!(
            v.validate().unwrap().messages(),
            vec!["npm package react-15.4.2 is included in the application, but not in the manifest"]
        );
    }
}
