//! Configuration for dependency sources, the license policy and the manifest location

use crate::error::{AuditError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Main configuration, constructed once and passed to every component
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Root of the audited project; relative paths below resolve against it
    pub project_root: PathBuf,
    /// Location of the persisted manifest
    pub manifest_file: PathBuf,
    /// License policy configuration
    pub license_policy: LicensePolicy,
    /// Cargo package source
    pub packages: PackageSourceConfig,
    /// Script asset source
    pub scripts: ScriptSourceConfig,
    /// Bower component source
    pub bower_components: BowerSourceConfig,
    /// npm package source
    pub npm_packages: NpmSourceConfig,
}

/// License policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LicensePolicy {
    /// Licenses acceptable without further review
    pub whitelist: HashSet<String>,
    /// License whose packages are recorded without a version
    pub version_whitelisted_license: Option<String>,
    /// Identities accepted regardless of their license
    pub package_whitelist: HashSet<String>,
}

/// Cargo package source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageSourceConfig {
    pub enabled: bool,
    /// Directory holding the Cargo.toml to introspect (defaults to the project root)
    pub project_dir: Option<PathBuf>,
    /// Package whose version is not pinned by the lockfile; always recorded by bare name
    pub bootstrap_package: Option<String>,
}

/// Script asset source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptSourceConfig {
    pub enabled: bool,
    /// Directories searched for scripts
    pub search_paths: Vec<PathBuf>,
    /// Paths excluded from the search, matched by prefix
    pub whitelist_paths: Vec<PathBuf>,
    /// Recognized file extensions, without the leading dot
    pub extensions: Vec<String>,
}

/// Bower component source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BowerSourceConfig {
    pub enabled: bool,
    /// Directory containing one subdirectory per installed component
    pub components_path: PathBuf,
}

/// npm package source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NpmSourceConfig {
    pub enabled: bool,
    pub package_json_path: PathBuf,
    /// Skip the devDependencies section
    pub ignore_dev_dependencies: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            manifest_file: PathBuf::from("config").join("dependency_manifest.yml"),
            license_policy: LicensePolicy::default(),
            packages: PackageSourceConfig::default(),
            scripts: ScriptSourceConfig::default(),
            bower_components: BowerSourceConfig::default(),
            npm_packages: NpmSourceConfig::default(),
        }
    }
}

impl Default for LicensePolicy {
    fn default() -> Self {
        let whitelist = [
            "MIT",
            "BSD",
            "Apache 2.0",
            "Apache-2.0",
            "MIT OR Apache-2.0",
            "Apache-2.0 OR MIT",
            "LGPLv2.1",
            "LGPLv3",
            "None",
        ];

        Self {
            whitelist: whitelist.iter().map(|l| l.to_string()).collect(),
            version_whitelisted_license: None,
            package_whitelist: HashSet::new(),
        }
    }
}

impl Default for PackageSourceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            project_dir: None,
            bootstrap_package: None,
        }
    }
}

impl Default for ScriptSourceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            search_paths: vec![
                Path::new("app").join("assets").join("javascripts"),
                Path::new("lib").join("assets").join("javascripts"),
                Path::new("vendor").join("assets").join("javascripts"),
            ],
            whitelist_paths: Vec::new(),
            extensions: vec!["js".to_string(), "coffee".to_string()],
        }
    }
}

impl Default for BowerSourceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            components_path: PathBuf::from("bower_components"),
        }
    }
}

impl Default for NpmSourceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            package_json_path: PathBuf::from("package.json"),
            ignore_dev_dependencies: false,
        }
    }
}

impl AuditConfig {
    /// Create a new builder for AuditConfig
    pub fn builder() -> AuditConfigBuilder {
        AuditConfigBuilder::default()
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AuditConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve a configured path against the project root
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }

    /// Absolute (or root-relative) location of the manifest
    pub fn manifest_path(&self) -> PathBuf {
        self.resolve(&self.manifest_file)
    }

    /// Reject configurations that cannot produce a meaningful manifest
    pub fn validate(&self) -> Result<()> {
        if self.manifest_file.as_os_str().is_empty() {
            return Err(AuditError::config("manifest_file must not be empty"));
        }
        if self.scripts.enabled && self.scripts.extensions.is_empty() {
            return Err(AuditError::config(
                "scripts source is enabled but no extensions are configured",
            ));
        }
        if let Some(ext) = self
            .scripts
            .extensions
            .iter()
            .find(|ext| ext.starts_with('.') || ext.is_empty())
        {
            return Err(AuditError::config(format!(
                "script extension {:?} must be given without a leading dot",
                ext
            )));
        }
        Ok(())
    }
}

/// Builder for AuditConfig
#[derive(Default)]
pub struct AuditConfigBuilder {
    project_root: Option<PathBuf>,
    manifest_file: Option<PathBuf>,
    license_policy: Option<LicensePolicy>,
    packages: Option<PackageSourceConfig>,
    scripts: Option<ScriptSourceConfig>,
    bower_components: Option<BowerSourceConfig>,
    npm_packages: Option<NpmSourceConfig>,
}

impl AuditConfigBuilder {
    pub fn project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = Some(root.into());
        self
    }

    pub fn manifest_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest_file = Some(path.into());
        self
    }

    pub fn license_policy(mut self, policy: LicensePolicy) -> Self {
        self.license_policy = Some(policy);
        self
    }

    pub fn packages(mut self, packages: PackageSourceConfig) -> Self {
        self.packages = Some(packages);
        self
    }

    pub fn scripts(mut self, scripts: ScriptSourceConfig) -> Self {
        self.scripts = Some(scripts);
        self
    }

    pub fn bower_components(mut self, bower: BowerSourceConfig) -> Self {
        self.bower_components = Some(bower);
        self
    }

    pub fn npm_packages(mut self, npm: NpmSourceConfig) -> Self {
        self.npm_packages = Some(npm);
        self
    }

    pub fn build(self) -> AuditConfig {
        let defaults = AuditConfig::default();
        AuditConfig {
            project_root: self.project_root.unwrap_or(defaults.project_root),
            manifest_file: self.manifest_file.unwrap_or(defaults.manifest_file),
            license_policy: self.license_policy.unwrap_or_default(),
            packages: self.packages.unwrap_or_default(),
            scripts: self.scripts.unwrap_or_default(),
            bower_components: self.bower_components.unwrap_or_default(),
            npm_packages: self.npm_packages.unwrap_or_default(),
        }
    }
}
