//! Module coordinates and version canonicalization.

use std::fmt;

use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;

#[derive(Parser)]
#[grammar = "base/version.pest"]
struct VersionParser;

/// Build metadata that survives canonicalization
const INCOMPATIBLE: &str = "+incompatible";

/// A module path paired with a version
///
/// The version is empty for unversioned coordinates (directory replacements,
/// or a replace rule that applies to every version of a path).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub struct ModuleVersion {
    pub path: String,
    pub version: String,
}

impl ModuleVersion {
    pub fn new(path: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            version: version.into(),
        }
    }

    /// A coordinate with no version
    pub fn unversioned(path: impl Into<String>) -> Self {
        Self::new(path, String::new())
    }

    /// Whether this coordinate points at a local directory
    pub fn is_local(&self) -> bool {
        self.version.is_empty() && is_directory_path(&self.path)
    }
}

impl fmt::Display for ModuleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version.is_empty() {
            write!(f, "{}", self.path)
        } else {
            write!(f, "{}@{}", self.path, self.version)
        }
    }
}

/// Errors raised while checking versions and module paths
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("version {version:?} invalid: {reason}")]
    Invalid { version: String, reason: String },
    #[error("invalid module path")]
    InvalidModulePath { path: String },
}

impl VersionError {
    pub fn malformed(version: impl Into<String>) -> Self {
        Self::Invalid {
            version: version.into(),
            reason: "must be of the form v1.2.3".to_string(),
        }
    }
}

/// The components of a parsed semantic version
#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Semver<'a> {
    major: &'a str,
    minor: &'a str,
    patch: &'a str,
    prerelease: &'a str,
    build: &'a str,
}

fn parse_semver(v: &str) -> Option<Semver<'_>> {
    let pairs = VersionParser::parse(Rule::version, v).ok()?;
    let mut sv = Semver {
        minor: "0",
        patch: "0",
        ..Semver::default()
    };
    for pair in pairs.flatten() {
        match pair.as_rule() {
            Rule::major => sv.major = pair.as_str(),
            Rule::minor => sv.minor = pair.as_str(),
            Rule::patch => sv.patch = pair.as_str(),
            Rule::prerelease => sv.prerelease = pair.as_str(),
            Rule::build => sv.build = pair.as_str(),
            _ => {}
        }
    }
    Some(sv)
}

/// Canonical form of `v`, or `None` when it is not a valid version
///
/// `v1` and `v1.2` expand to `v1.0.0` and `v1.2.0`. Build metadata is dropped
/// except for `+incompatible`. Canonicalizing a canonical version returns it
/// unchanged.
pub fn canonical_version(v: &str) -> Option<String> {
    let sv = parse_semver(v)?;
    let mut out = format!("v{}.{}.{}{}", sv.major, sv.minor, sv.patch, sv.prerelease);
    if sv.build == INCOMPATIBLE {
        out.push_str(INCOMPATIBLE);
    }
    Some(out)
}

/// The major version prefix of `v` (`v2` for `v2.3.4`), empty when invalid
pub fn major(v: &str) -> String {
    parse_semver(v)
        .map(|sv| format!("v{}", sv.major))
        .unwrap_or_default()
}

/// Whether `path` names a local directory rather than a module
///
/// Rooted paths, drive-letter paths and paths starting with `.` or `..`
/// followed by a separator (or nothing) qualify.
pub fn is_directory_path(path: &str) -> bool {
    const PREFIXES: [&str; 6] = ["./", ".\\", "../", "..\\", "/", "\\"];
    if path == "." || path == ".." {
        return true;
    }
    if PREFIXES.iter().any(|p| path.starts_with(p)) {
        return true;
    }
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Split a module path into its prefix and major-version suffix
///
/// `example.com/m/v2` splits into `("example.com/m", "/v2")`; a path without a
/// version suffix returns an empty suffix. Suffixes such as `/v1`, `/v0`,
/// `/v02` or `/v2.1` make the path invalid.
pub fn split_path_major(path: &str) -> Result<(&str, &str), VersionError> {
    let bytes = path.as_bytes();
    let mut i = bytes.len();
    let mut dot = false;
    while i > 0 && (bytes[i - 1].is_ascii_digit() || bytes[i - 1] == b'.') {
        if bytes[i - 1] == b'.' {
            dot = true;
        }
        i -= 1;
    }
    if i <= 1 || i == bytes.len() || bytes[i - 1] != b'v' || bytes[i - 2] != b'/' {
        return Ok((path, ""));
    }
    let (prefix, path_major) = path.split_at(i - 2);
    let digits = &path_major[2..];
    if dot || digits.starts_with('0') || path_major == "/v1" {
        return Err(VersionError::InvalidModulePath {
            path: path.to_string(),
        });
    }
    Ok((prefix, path_major))
}

/// Check that version `v` agrees with a path's major-version suffix
///
/// A path without a suffix accepts v0 and v1 versions (or any version marked
/// `+incompatible`); a `/vN` suffix demands major version N.
pub fn check_path_major(v: &str, path_major: &str) -> Result<(), VersionError> {
    let m = major(v);
    let ok = if path_major.is_empty() {
        m == "v0" || m == "v1" || v.ends_with(INCOMPATIBLE)
    } else {
        path_major.len() > 1 && m == path_major[1..]
    };
    if ok {
        return Ok(());
    }
    let expected = if path_major.is_empty() {
        "v0 or v1"
    } else {
        path_major.trim_start_matches('/')
    };
    Err(VersionError::Invalid {
        version: v.to_string(),
        reason: format!("should be {expected}, not {m}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_version_expands_shorthand() {
        assert_eq!(canonical_version("v1").as_deref(), Some("v1.0.0"));
        assert_eq!(canonical_version("v1.2").as_deref(), Some("v1.2.0"));
        assert_eq!(canonical_version("v1.2.3").as_deref(), Some("v1.2.3"));
    }

    #[test]
    fn test_canonical_version_build_metadata() {
        assert_eq!(
            canonical_version("v1.2.3-rc.1+build.5").as_deref(),
            Some("v1.2.3-rc.1")
        );
        assert_eq!(
            canonical_version("v2.0.0+incompatible").as_deref(),
            Some("v2.0.0+incompatible")
        );
    }

    #[test]
    fn test_canonical_version_is_idempotent() {
        for v in ["v0.0.0-20200101000000-abcdef123456", "v1.2", "v3.0.0+incompatible"] {
            let once = canonical_version(v).unwrap();
            assert_eq!(canonical_version(&once).as_deref(), Some(once.as_str()));
        }
    }

    #[test]
    fn test_invalid_versions() {
        for v in ["", "1.2.3", "v", "v01.2.3", "v1.2.3.4", "v1.2-pre", "v1.2.3-", "latest"] {
            assert!(canonical_version(v).is_none(), "{v} should be invalid");
        }
    }

    #[test]
    fn test_is_directory_path() {
        assert!(is_directory_path("./local"));
        assert!(is_directory_path("../up"));
        assert!(is_directory_path("/abs/dir"));
        assert!(is_directory_path("."));
        assert!(is_directory_path("C:\\mods"));
        assert!(!is_directory_path("gno.land/p/demo/avl"));
        assert!(!is_directory_path(".hidden"));
    }

    #[test]
    fn test_split_path_major() {
        assert_eq!(split_path_major("example.com/m").unwrap(), ("example.com/m", ""));
        assert_eq!(split_path_major("example.com/m/v2").unwrap(), ("example.com/m", "/v2"));
        assert!(split_path_major("example.com/m/v1").is_err());
        assert!(split_path_major("example.com/m/v02").is_err());
        assert!(split_path_major("example.com/m/v2.1").is_err());
    }

    #[test]
    fn test_check_path_major() {
        assert!(check_path_major("v1.4.0", "").is_ok());
        assert!(check_path_major("v2.0.0", "/v2").is_ok());
        assert!(check_path_major("v2.0.0+incompatible", "").is_ok());
        let err = check_path_major("v2.0.0", "").unwrap_err();
        assert_eq!(
            err.to_string(),
            "version \"v2.0.0\" invalid: should be v0 or v1, not v2"
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(ModuleVersion::new("a.b/c", "v1.0.0").to_string(), "a.b/c@v1.0.0");
        assert_eq!(ModuleVersion::unversioned("../c").to_string(), "../c");
        assert!(ModuleVersion::unversioned("../c").is_local());
    }
}
