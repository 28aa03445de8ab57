//! ---
//! mkp_section: "01-core-functionality"
//! mkp_subsection: "module"
//! mkp_type: "source"
//! mkp_scope: "code"
//! mkp_description: "Resource kind identity used by managers and gates."
//! mkp_version: "v0.0.0-prealpha"
//! mkp_owner: "tbd"
//! ---
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// API group, version and kind of a managed resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupVersionKind {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl GroupVersionKind {
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }

    /// `group/version`, or just `version` for the core group.
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

/// Formats as `group/version, Kind=Kind`.
impl fmt::Display for GroupVersionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, Kind={}", self.api_version(), self.kind)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid group/version/kind '{input}': expected 'group/version, Kind=Kind'")]
pub struct ParseGvkError {
    input: String,
}

impl FromStr for GroupVersionKind {
    type Err = ParseGvkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseGvkError {
            input: s.to_owned(),
        };
        let (api_version, kind) = s.split_once(", Kind=").ok_or_else(invalid)?;
        let kind = kind.trim();
        if kind.is_empty() {
            return Err(invalid());
        }
        let (group, version) = match api_version.trim().rsplit_once('/') {
            Some((group, version)) => (group, version),
            None => ("", api_version.trim()),
        };
        if version.is_empty() {
            return Err(invalid());
        }
        Ok(Self::new(group, version, kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_parse_agree() {
        let gvk = GroupVersionKind::new("metakube.syseleven.de", "v1alpha1", "Cluster");
        let rendered = gvk.to_string();
        assert_eq!(rendered, "metakube.syseleven.de/v1alpha1, Kind=Cluster");
        assert_eq!(rendered.parse::<GroupVersionKind>().unwrap(), gvk);
    }

    #[test]
    fn core_group_has_no_prefix() {
        let gvk: GroupVersionKind = "v1, Kind=Secret".parse().unwrap();
        assert_eq!(gvk.group, "");
        assert_eq!(gvk.api_version(), "v1");
    }

    #[test]
    fn rejects_missing_kind() {
        assert!("metakube.syseleven.de/v1alpha1".parse::<GroupVersionKind>().is_err());
        assert!("metakube.syseleven.de/v1alpha1, Kind=".parse::<GroupVersionKind>().is_err());
    }
}
