//! End-to-end validate/update runs against recorded dependency snapshots

use dependency_license_manifest::{
    AuditConfig, Bucket, LicenseValidator, LiveDependency, Manifest, ManifestStore,
    ManifestUpdater, SourceSet, StaticSource, MANIFEST_HEADER,
};
use std::fs;

const RAILS_MANIFEST: &str = "\
packages:
  rails-4.2.0:
    license: MIT
    license_url:
    project_url: https://github.com/rails/rails
  newrelic_rpm:
    license: New Relic
    license_url:
    project_url: https://github.com/newrelic/rpm
";

fn config() -> AuditConfig {
    let mut config = AuditConfig::default();
    config.license_policy.version_whitelisted_license = Some("New Relic".to_string());
    config
}

fn newrelic() -> LiveDependency {
    let mut dep = LiveDependency::versioned("newrelic_rpm", "3.16.2.321").with_license("New Relic");
    dep.identity = "newrelic_rpm".to_string();
    dep
}

fn packages(entries: Vec<LiveDependency>) -> SourceSet {
    SourceSet::new().with(StaticSource::new(Bucket::Packages, entries))
}

fn validator(text: &str, sources: SourceSet) -> LicenseValidator {
    let manifest = Manifest::parse(text).unwrap();
    LicenseValidator::new(
        ManifestStore::from_manifest("dependency_manifest.yml", manifest),
        sources,
        config().license_policy,
    )
}

#[test]
fn test_matching_snapshot_is_valid() {
    let live = vec![
        LiveDependency::versioned("rails", "4.2.0").with_license("MIT"),
        newrelic(),
    ];
    let report = validator(RAILS_MANIFEST, packages(live)).validate().unwrap();
    assert!(report.is_valid());
    assert!(report.errors.is_empty());
}

#[test]
fn test_new_package_is_reported_then_recorded() {
    let live = vec![
        LiveDependency::versioned("rails", "4.2.0").with_license("MIT"),
        newrelic(),
        LiveDependency::versioned("shoes", "4.0.0")
            .with_license("MIT")
            .with_homepage(" http://shoesrb.com "),
    ];

    let report = validator(RAILS_MANIFEST, packages(live.clone())).validate().unwrap();
    assert_eq!(
        report.messages(),
        vec!["shoes-4.0.0 is included in the application, but not in the manifest"]
    );

    let updated = ManifestUpdater::new("dependency_manifest.yml", packages(live.clone()))
        .update(RAILS_MANIFEST)
        .unwrap();
    let manifest = Manifest::parse(&updated).unwrap();
    let shoes = &manifest.packages.as_ref().unwrap()["shoes-4.0.0"];
    assert_eq!(shoes.license.as_deref(), Some("MIT"));
    assert_eq!(shoes.project_url.as_deref(), Some("http://shoesrb.com"));

    assert!(validator(&updated, packages(live)).validate().unwrap().is_valid());
}

#[test]
fn test_license_change_renames_and_annotates_once() {
    let live = vec![
        LiveDependency::versioned("rails", "5.0.0").with_license("NOT-MIT"),
        newrelic(),
    ];
    let updater = ManifestUpdater::new("dependency_manifest.yml", packages(live));

    let once = updater.update(RAILS_MANIFEST).unwrap();
    let manifest = Manifest::parse(&once).unwrap();
    let recorded = manifest.packages.as_ref().unwrap();
    assert!(!recorded.contains_key("rails-4.2.0"));
    assert_eq!(
        recorded["rails-5.0.0"].license.as_deref(),
        Some("License Change! Was 'MIT', is now [\"NOT-MIT\"]")
    );
    assert_eq!(
        recorded["rails-5.0.0"].project_url.as_deref(),
        Some("https://github.com/rails/rails")
    );

    let twice = updater.update(&once).unwrap();
    assert_eq!(twice, once);
}

#[test]
fn test_packages_written_case_insensitively() {
    let live = vec![
        LiveDependency::versioned("rails", "4.2.0").with_license("MIT"),
        newrelic(),
        LiveDependency::versioned("Zlib", "1.0.0").with_license("MIT"),
        LiveDependency::versioned("actionpack", "4.2.0").with_license("MIT"),
    ];
    let updated = ManifestUpdater::new("dependency_manifest.yml", packages(live))
        .update(RAILS_MANIFEST)
        .unwrap();

    assert!(updated.starts_with(MANIFEST_HEADER));
    let keys: Vec<&str> = updated
        .lines()
        .filter(|line| line.starts_with("  ") && !line.starts_with("    "))
        .map(|line| line.trim().trim_end_matches(':'))
        .collect();
    assert_eq!(keys, vec!["actionpack-4.2.0", "newrelic_rpm", "rails-4.2.0", "Zlib-1.0.0"]);
}

#[test]
fn test_npm_versions_are_normalized() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("package.json"),
        r#"{"dependencies": {"bar": "^1.2.3", "foo": "latest"}}"#,
    )
    .unwrap();

    let mut config = config();
    config.project_root = dir.path().to_path_buf();
    config.packages.enabled = false;
    config.npm_packages.enabled = true;
    let manifest_path = config.manifest_path();
    fs::create_dir_all(manifest_path.parent().unwrap()).unwrap();
    fs::write(&manifest_path, "npm_packages:\n  bar-1.2.3:\n    license: MIT\n").unwrap();

    let report = LicenseValidator::from_config(&config).validate().unwrap();
    assert_eq!(
        report.messages(),
        vec!["npm package foo- is included in the application, but not in the manifest"]
    );

    ManifestUpdater::from_config(&config).update_file().unwrap();

    let validator = LicenseValidator::from_config(&config);
    let names: Vec<String> = validator
        .pretty_list(Bucket::NpmPackages)
        .unwrap()
        .into_iter()
        .map(|entry| entry.name)
        .collect();
    assert_eq!(names, vec!["bar", "foo"]);
}

#[test]
fn test_disabled_bucket_is_ignored_everywhere() {
    let text = "\
packages:
  rails-4.2.0:
    license: MIT
scripts:
  app/assets/javascripts/removed.js:
    license: GPL
";
    let live = vec![LiveDependency::versioned("rails", "4.2.0").with_license("MIT")];

    assert!(validator(text, packages(live.clone())).validate().unwrap().is_valid());

    let updated = ManifestUpdater::new("dependency_manifest.yml", packages(live))
        .update(text)
        .unwrap();
    assert!(updated.contains("app/assets/javascripts/removed.js"));
}
