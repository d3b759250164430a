//! The persisted dependency manifest

use crate::error::{AuditError, Result};
use crate::types::{base_name, case_insensitive_key, Bucket, DependencyRecord, PrettyEntry};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Identity to record mapping for one bucket, in document order
pub type Entries = IndexMap<String, DependencyRecord>;

/// Comment block written at the top of every manifest
pub const MANIFEST_HEADER: &str = "\
# Dependency Manifest for the license-manifest tool
# Used to test your dependencies against the license whitelist
#
# Regenerate with `license-manifest generate`, refresh with `license-manifest update`
---
";

/// In-memory form of the manifest document.
///
/// A bucket set to `None` is not tracked and is left out of the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packages: Option<Entries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scripts: Option<Entries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bower_components: Option<Entries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub npm_packages: Option<Entries>,
    /// Top-level keys this tool does not manage
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl Manifest {
    /// Parse manifest text; an empty document is an empty manifest
    pub fn parse(text: &str) -> std::result::Result<Self, serde_yaml::Error> {
        let blank = text.lines().map(str::trim).all(|line| {
            line.is_empty() || line.starts_with('#') || line == "---"
        });
        if blank {
            return Ok(Manifest::default());
        }

        let manifest: Option<Manifest> = serde_yaml::from_str(text)?;
        Ok(manifest.unwrap_or_default())
    }

    /// Load and parse the manifest at `path`
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AuditError::ManifestMissing {
                path: path.to_path_buf(),
            });
        }

        debug!("Loading manifest from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text).map_err(|source| AuditError::ManifestParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn bucket(&self, bucket: Bucket) -> Option<&Entries> {
        match bucket {
            Bucket::Packages => self.packages.as_ref(),
            Bucket::Scripts => self.scripts.as_ref(),
            Bucket::BowerComponents => self.bower_components.as_ref(),
            Bucket::NpmPackages => self.npm_packages.as_ref(),
        }
    }

    pub fn bucket_mut(&mut self, bucket: Bucket) -> &mut Option<Entries> {
        match bucket {
            Bucket::Packages => &mut self.packages,
            Bucket::Scripts => &mut self.scripts,
            Bucket::BowerComponents => &mut self.bower_components,
            Bucket::NpmPackages => &mut self.npm_packages,
        }
    }

    /// Recorded identities of a bucket, case-insensitively sorted
    pub fn sorted_identities(&self, bucket: Bucket) -> Vec<&str> {
        let mut identities: Vec<&str> = self
            .bucket(bucket)
            .map(|entries| entries.keys().map(String::as_str).collect())
            .unwrap_or_default();
        identities.sort_by_cached_key(|identity| case_insensitive_key(identity));
        identities
    }

    /// Display list of a bucket with version suffixes stripped
    pub fn pretty_list(&self, bucket: Bucket) -> Vec<PrettyEntry> {
        let Some(entries) = self.bucket(bucket) else {
            return Vec::new();
        };

        let mut list: Vec<(&String, PrettyEntry)> = entries
            .iter()
            .map(|(identity, record)| {
                let name = if bucket.is_versioned() {
                    base_name(identity)
                } else {
                    identity.as_str()
                };
                let entry = PrettyEntry {
                    name: name.to_string(),
                    license: record.license.clone(),
                    license_url: record.license_url.clone(),
                    project_url: record.project_url.clone(),
                };
                (identity, entry)
            })
            .collect();

        list.sort_by_cached_key(|(identity, entry)| {
            (case_insensitive_key(&entry.name), case_insensitive_key(identity))
        });
        list.into_iter().map(|(_, entry)| entry).collect()
    }

    /// Serialize with the canonical header.
    ///
    /// The packages bucket is written in case-insensitive key order, the
    /// others in the order they hold. Trailing whitespace is stripped and the
    /// text ends with exactly one newline.
    pub fn render(&self) -> Result<String> {
        let mut ordered = self.clone();
        if let Some(packages) = ordered.packages.as_mut() {
            packages.sort_by(|a, _, b, _| case_insensitive_key(a).cmp(&case_insensitive_key(b)));
        }

        let body = if ordered == Manifest::default() {
            String::new()
        } else {
            serde_yaml::to_string(&ordered)?
        };

        Ok(normalize_text(&format!("{}{}", MANIFEST_HEADER, body)))
    }

    /// Render and write the manifest, creating parent directories
    pub fn write(&self, path: &Path) -> Result<()> {
        let text = self.render()?;
        write_text(path, &text)
    }
}

/// Write manifest text, creating parent directories
pub(crate) fn write_text(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, text)?;
    Ok(())
}

fn normalize_text(text: &str) -> String {
    let mut out: String = text
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");
    let kept = out.trim_end().len();
    out.truncate(kept);
    out.push('\n');
    out
}

/// Manifest loaded once per invocation
#[derive(Debug)]
pub struct ManifestStore {
    path: PathBuf,
    cached: OnceCell<Manifest>,
}

impl ManifestStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cached: OnceCell::new(),
        }
    }

    /// Store over an already parsed manifest
    pub fn from_manifest(path: impl Into<PathBuf>, manifest: Manifest) -> Self {
        let cached = OnceCell::new();
        let _ = cached.set(manifest);
        Self {
            path: path.into(),
            cached,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// The manifest, read from disk on first use
    pub fn manifest(&self) -> Result<&Manifest> {
        if let Some(manifest) = self.cached.get() {
            return Ok(manifest);
        }
        let manifest = Manifest::load(&self.path)?;
        Ok(self.cached.get_or_init(|| manifest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(license: &str) -> DependencyRecord {
        DependencyRecord {
            license: Some(license.to_string()),
            ..DependencyRecord::default()
        }
    }

    #[test]
    fn test_parse_empty_values() {
        let manifest = Manifest::parse(
            "# comment\n---\npackages:\n  rails-4.2.0:\n    license: MIT\n    license_url:\n    project_url: https://github.com/rails/rails\n",
        )
        .unwrap();

        let packages = manifest.packages.as_ref().unwrap();
        let rails = &packages["rails-4.2.0"];
        assert_eq!(rails.license.as_deref(), Some("MIT"));
        assert_eq!(rails.license_url, None);
        assert_eq!(rails.project_url.as_deref(), Some("https://github.com/rails/rails"));
        assert!(manifest.scripts.is_none());
    }

    #[test]
    fn test_parse_empty_document() {
        assert_eq!(Manifest::parse("").unwrap(), Manifest::default());
        assert_eq!(Manifest::parse("# only a comment\n").unwrap(), Manifest::default());
    }

    #[test]
    fn test_render_sorts_packages_only() {
        let mut manifest = Manifest::default();
        let mut packages = Entries::new();
        packages.insert("rails-4.2.0".to_string(), record("MIT"));
        packages.insert("Newrelic_rpm".to_string(), record("New Relic"));
        manifest.packages = Some(packages);

        let mut scripts = Entries::new();
        scripts.insert("b.js".to_string(), record("MIT"));
        scripts.insert("a.js".to_string(), record("MIT"));
        manifest.scripts = Some(scripts);

        let text = manifest.render().unwrap();
        assert!(text.starts_with(MANIFEST_HEADER));
        assert!(text.find("Newrelic_rpm").unwrap() < text.find("rails-4.2.0").unwrap());
        assert!(text.find("b.js").unwrap() < text.find("a.js").unwrap());
        assert!(text.ends_with('\n') && !text.ends_with("\n\n"));
        assert!(text.lines().all(|line| line == line.trim_end()));
    }

    #[test]
    fn test_render_round_trips() {
        let mut manifest = Manifest::default();
        let mut packages = Entries::new();
        packages.insert(
            "rails-5.0.0".to_string(),
            record("License Change! Was 'MIT', is now [\"NOT-MIT\"]"),
        );
        manifest.packages = Some(packages);
        manifest.npm_packages = Some(Entries::new());

        let text = manifest.render().unwrap();
        let reparsed = Manifest::parse(&text).unwrap();
        assert_eq!(reparsed, manifest);
        assert_eq!(reparsed.render().unwrap(), text);
    }

    #[test]
    fn test_pretty_list_strips_versions() {
        let mut manifest = Manifest::default();
        let mut packages = Entries::new();
        packages.insert("foo-1.2".to_string(), record("MIT"));
        packages.insert("baz-1.3".to_string(), record("BSD"));
        packages.insert("with-hyphens-1.4".to_string(), record("MIT"));
        manifest.packages = Some(packages);

        let names: Vec<String> = manifest
            .pretty_list(Bucket::Packages)
            .into_iter()
            .map(|entry| entry.name)
            .collect();
        assert_eq!(names, vec!["baz", "foo", "with-hyphens"]);
    }

    #[test]
    fn test_pretty_list_keeps_script_paths() {
        let mut manifest = Manifest::default();
        let mut scripts = Entries::new();
        scripts.insert("/path/to/newrelic.js".to_string(), record("New Relic"));
        scripts.insert("/path/to/foo.js".to_string(), record("MIT"));
        scripts.insert("/path/to/jquery-ui.js".to_string(), record("MIT"));
        manifest.scripts = Some(scripts);

        let names: Vec<String> = manifest
            .pretty_list(Bucket::Scripts)
            .into_iter()
            .map(|entry| entry.name)
            .collect();
        assert_eq!(
            names,
            vec!["/path/to/foo.js", "/path/to/jquery-ui.js", "/path/to/newrelic.js"]
        );
    }

    #[test]
    fn test_store_reports_missing_file() {
        let store = ManifestStore::new("/nonexistent/dependency_manifest.yml");
        assert!(matches!(
            store.manifest(),
            Err(AuditError::ManifestMissing { .. })
        ));
    }
}
