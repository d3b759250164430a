//! Core data types shared by the sources, the validator and the updater

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One of the dependency categories tracked by the manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    /// Cargo packages
    Packages,
    /// Script files checked into the project
    Scripts,
    /// Bower components
    BowerComponents,
    /// npm packages declared in package.json
    NpmPackages,
}

impl Bucket {
    /// All buckets, in manifest order
    pub const ALL: [Bucket; 4] = [
        Bucket::Packages,
        Bucket::Scripts,
        Bucket::BowerComponents,
        Bucket::NpmPackages,
    ];

    /// Top-level key of this bucket in the manifest document
    pub fn key(self) -> &'static str {
        match self {
            Self::Packages => "packages",
            Self::Scripts => "scripts",
            Self::BowerComponents => "bower_components",
            Self::NpmPackages => "npm_packages",
        }
    }

    /// Human name used as a prefix in validation messages
    pub fn asset_type_name(self) -> Option<&'static str> {
        match self {
            Self::Packages => None,
            Self::Scripts => Some("script"),
            Self::BowerComponents => Some("bower component"),
            Self::NpmPackages => Some("npm package"),
        }
    }

    /// Whether identities in this bucket carry a version suffix
    pub fn is_versioned(self) -> bool {
        !matches!(self, Self::Scripts)
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl std::str::FromStr for Bucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Bucket::ALL
            .into_iter()
            .find(|bucket| bucket.key() == s.to_lowercase())
            .ok_or_else(|| format!("Unknown bucket: {}", s))
    }
}

/// Strip the rightmost hyphen-delimited suffix from an identity.
///
/// `rails-4.2.0` becomes `rails`, `with-hyphens-1.4` becomes `with-hyphens`
/// and a version-less `foo-` becomes `foo`. Bare names without a hyphen are
/// returned unchanged. A hyphenated bare name loses its last segment; there
/// is no way to tell it apart from a name-version pair here.
pub fn base_name(identity: &str) -> &str {
    match identity.rsplit_once('-') {
        Some((name, _)) => name,
        None => identity,
    }
}

/// Build the usual `name-version` identity
pub fn versioned_identity(name: &str, version: &str) -> String {
    format!("{}-{}", name, version)
}

/// Sort key used for every case-insensitive ordering in the manifest
pub(crate) fn case_insensitive_key(value: &str) -> (String, String) {
    (value.to_lowercase(), value.to_string())
}

/// License metadata recorded for one dependency
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRecord {
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub license_url: Option<String>,
    #[serde(default)]
    pub project_url: Option<String>,
    /// Hand-added fields, carried through updates untouched
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

/// License assigned to freshly discovered dependencies
pub const UNKNOWN_LICENSE: &str = "Unknown";

impl DependencyRecord {
    /// Record with placeholder metadata for a newly seen dependency
    pub fn placeholder(project_url: Option<String>) -> Self {
        Self {
            license: Some(UNKNOWN_LICENSE.to_string()),
            license_url: None,
            project_url,
            extra: IndexMap::new(),
        }
    }

    /// Record seeded from what the live source reports
    pub fn from_live(dep: &LiveDependency) -> Self {
        let license = dep
            .license
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(UNKNOWN_LICENSE);

        Self {
            license: Some(license.to_string()),
            license_url: None,
            project_url: dep
                .homepage
                .as_deref()
                .and_then(crate::homepage::ensure_valid_url),
            extra: IndexMap::new(),
        }
    }
}

/// A dependency as reported by live introspection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveDependency {
    /// Key under which the dependency is recorded in its bucket
    pub identity: String,
    /// Name without version
    pub name: String,
    pub version: Option<String>,
    /// Declared license, verbatim
    pub license: Option<String>,
    /// Individual licenses making up the declared license
    #[serde(default)]
    pub licenses: Vec<String>,
    pub homepage: Option<String>,
}

impl LiveDependency {
    /// A dependency known only by its identity
    pub fn bare(identity: impl Into<String>) -> Self {
        let identity = identity.into();
        Self {
            name: identity.clone(),
            identity,
            version: None,
            license: None,
            licenses: Vec::new(),
            homepage: None,
        }
    }

    /// A versioned dependency recorded as `name-version`
    pub fn versioned(name: impl Into<String>, version: impl Into<String>) -> Self {
        let name = name.into();
        let version = version.into();
        Self {
            identity: versioned_identity(&name, &version),
            name,
            version: Some(version),
            license: None,
            licenses: Vec::new(),
            homepage: None,
        }
    }

    pub fn with_license(mut self, license: impl Into<String>) -> Self {
        let license = license.into();
        self.licenses = crate::license::license_ids(&license);
        self.license = Some(license);
        self
    }

    pub fn with_homepage(mut self, homepage: impl Into<String>) -> Self {
        self.homepage = Some(homepage.into());
        self
    }
}

/// A mismatch between the manifest, the live project and the license policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    /// Present in the project but not recorded
    MissingFromManifest { bucket: Bucket, identity: String },
    /// Recorded but no longer present in the project
    UnknownInManifest { bucket: Bucket, identity: String },
    /// Recorded with a license the policy does not accept
    LicenseNotWhitelisted {
        bucket: Bucket,
        identity: String,
        license: Option<String>,
    },
}

impl ValidationError {
    pub fn bucket(&self) -> Bucket {
        match self {
            Self::MissingFromManifest { bucket, .. }
            | Self::UnknownInManifest { bucket, .. }
            | Self::LicenseNotWhitelisted { bucket, .. } => *bucket,
        }
    }

    pub fn identity(&self) -> &str {
        match self {
            Self::MissingFromManifest { identity, .. }
            | Self::UnknownInManifest { identity, .. }
            | Self::LicenseNotWhitelisted { identity, .. } => identity,
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(prefix) = self.bucket().asset_type_name() {
            write!(f, "{} ", prefix)?;
        }
        match self {
            Self::MissingFromManifest { identity, .. } => write!(
                f,
                "{} is included in the application, but not in the manifest",
                identity
            ),
            Self::UnknownInManifest { identity, .. } => write!(
                f,
                "{} is included in the manifest, but not in the application",
                identity
            ),
            Self::LicenseNotWhitelisted {
                identity, license, ..
            } => write!(
                f,
                "{} is licensed under {}, which is not whitelisted",
                identity,
                license.as_deref().unwrap_or("no license")
            ),
        }
    }
}

/// Display form of a manifest entry, version stripped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrettyEntry {
    pub name: String,
    pub license: Option<String>,
    pub license_url: Option<String>,
    pub project_url: Option<String>,
}
