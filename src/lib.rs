//! # dependency_license_manifest
//!
//! Keeps a manifest of a project's third-party dependencies, and their
//! licenses, in sync with what the project actually ships:
//! - **Validation**: report dependencies missing from the manifest, manifest
//!   entries that are no longer used, and licenses outside the whitelist
//! - **Generation**: bootstrap a manifest from the live project
//! - **Update**: merge the live project into an existing manifest without
//!   losing hand-written license notes
//!
//! ## Quick Start
//!
//! ```no_run
//! use dependency_license_manifest::{AuditConfig, LicenseValidator};
//!
//! # fn main() -> dependency_license_manifest::Result<()> {
//! let config = AuditConfig::default();
//! let report = LicenseValidator::from_config(&config).validate()?;
//!
//! for message in report.messages() {
//!     println!("{}", message);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Sources
//!
//! - Cargo packages resolved by `cargo metadata`
//! - Script files under configurable asset directories
//! - Bower components (`.bower.json` descriptors)
//! - npm packages declared in `package.json`

mod config;
mod error;
mod generator;
mod homepage;
mod license;
mod manifest;
pub mod sources;
mod types;
mod updater;
mod validator;

// Re-export public API
pub use config::{
    AuditConfig, AuditConfigBuilder, BowerSourceConfig, LicensePolicy, NpmSourceConfig,
    PackageSourceConfig, ScriptSourceConfig,
};
pub use error::{AuditError, Result};
pub use generator::ManifestGenerator;
pub use homepage::ensure_valid_url;
pub use license::{license_change_note, license_ids, LICENSE_CHANGE_MARKER};
pub use manifest::{Entries, Manifest, ManifestStore, MANIFEST_HEADER};
pub use sources::{DependencySource, SourceSet, StaticSource};
pub use types::{
    base_name, versioned_identity, Bucket, DependencyRecord, LiveDependency, PrettyEntry,
    ValidationError, UNKNOWN_LICENSE,
};
pub use updater::{merge_assets, merge_packages, ManifestUpdater};
pub use validator::{LicenseValidator, ValidationReport};
