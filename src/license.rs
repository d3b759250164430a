//! License policy checks and license change annotations

use crate::config::LicensePolicy;
use crate::types::DependencyRecord;

/// Prefix of the sentinel written into a record whose live license changed
pub const LICENSE_CHANGE_MARKER: &str = "License Change! Was '";
const LICENSE_CHANGE_SEPARATOR: &str = "', is now ";

impl LicensePolicy {
    /// Whether a recorded dependency passes the policy.
    ///
    /// A whitelisted identity is accepted whatever its license says.
    pub fn acceptable(&self, record: &DependencyRecord, identity: &str) -> bool {
        if self.package_whitelist.contains(identity) {
            return true;
        }

        let Some(license) = record.license.as_deref() else {
            return false;
        };

        self.whitelist.contains(license)
            || self.version_whitelisted_license.as_deref() == Some(license)
    }

    /// Whether packages under this license are recorded without a version
    pub fn is_version_exempt(&self, license: Option<&str>) -> bool {
        match (license, self.version_whitelisted_license.as_deref()) {
            (Some(license), Some(exempt)) => license == exempt,
            _ => false,
        }
    }
}

/// Split a declared license into its individual license ids.
///
/// SPDX expressions yield their ids in order; anything else is kept whole.
pub fn license_ids(license: &str) -> Vec<String> {
    let trimmed = license.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let Ok(expression) = spdx::Expression::parse(trimmed) else {
        return vec![trimmed.to_string()];
    };

    let mut ids: Vec<String> = Vec::new();
    for requirement in expression.requirements() {
        if let spdx::LicenseItem::Spdx { id, .. } = &requirement.req.license {
            if !ids.iter().any(|existing| existing == id.name) {
                ids.push(id.name.to_string());
            }
        }
    }

    if ids.is_empty() {
        ids.push(trimmed.to_string());
    }
    ids
}

/// Build the license change note for a record whose live license differs.
///
/// When the stored value already is a change note, the license it recorded
/// before the first change is carried over instead of nesting notes, so a
/// rerun against the same live state writes the same text.
pub fn license_change_note(stored: Option<&str>, new_licenses: &[String]) -> String {
    let stored = stored.unwrap_or_default();
    let previous = original_license(stored).unwrap_or(stored);

    format!(
        "{}{}{}{:?}",
        LICENSE_CHANGE_MARKER, previous, LICENSE_CHANGE_SEPARATOR, new_licenses
    )
}

/// License recorded before the change, if `stored` is a change note
fn original_license(stored: &str) -> Option<&str> {
    let rest = stored.strip_prefix(LICENSE_CHANGE_MARKER)?;
    rest.rfind(LICENSE_CHANGE_SEPARATOR).map(|end| &rest[..end])
}
