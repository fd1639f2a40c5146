//! Index data models

use cmirror_errors::{Error, IndexError};
use cmirror_hash::Hash;
use cmirror_types::{is_path_safe, PackageId};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One published version of one package, as listed in the index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageVersionRecord {
    pub name: String,
    pub version: String,
    /// Expected SHA-256 of the artifact
    pub checksum: Hash,
    /// Yanked versions are still mirrored
    pub yanked: bool,
}

/// Wire shape of one index line; unknown fields (deps, features, ...) are ignored
#[derive(Debug, Serialize, Deserialize)]
struct RawRecord {
    name: String,
    vers: String,
    cksum: String,
    #[serde(default)]
    yanked: bool,
}

impl PackageVersionRecord {
    /// Create a record from already validated parts
    pub fn new(name: impl Into<String>, version: impl Into<String>, checksum: Hash) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            checksum,
            yanked: false,
        }
    }

    /// Decode one newline-delimited metadata line
    ///
    /// `path` and `line_no` only label the error.
    ///
    /// # Errors
    ///
    /// Returns an error if the line is not valid JSON, lacks a required field,
    /// carries a checksum that is not 64 hex digits, or has a name or version
    /// that cannot be used as part of a file name.
    pub fn parse_line(line: &str, path: &Path, line_no: usize) -> Result<Self, Error> {
        let raw: RawRecord = serde_json::from_str(line).map_err(|e| IndexError::RecordParse {
            path: path.display().to_string(),
            line: line_no,
            message: e.to_string(),
        })?;

        for (field, value) in [("name", &raw.name), ("vers", &raw.vers)] {
            if !is_path_safe(value) {
                return Err(IndexError::InvalidRecordField {
                    field: field.to_string(),
                    value: value.clone(),
                }
                .into());
            }
        }

        let checksum = Hash::from_hex(&raw.cksum).map_err(|_| IndexError::InvalidRecordField {
            field: "cksum".to_string(),
            value: raw.cksum.clone(),
        })?;

        Ok(Self {
            name: raw.name,
            version: raw.vers,
            checksum,
            yanked: raw.yanked,
        })
    }

    /// Identity of this record
    #[must_use]
    pub fn id(&self) -> PackageId {
        PackageId::new(self.name.clone(), self.version.clone())
    }

    /// Canonical file name of the committed artifact
    #[must_use]
    pub fn artifact_file_name(&self) -> String {
        self.id().artifact_file_name()
    }
}

/// Registry description stored at the index root (`config.json`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryIndexConfig {
    /// Download URL template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dl: Option<String>,
    /// Web API base
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const CKSUM: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    fn parse(line: &str) -> Result<PackageVersionRecord, Error> {
        PackageVersionRecord::parse_line(line, Path::new("3/f/foo"), 1)
    }

    #[test]
    fn test_parse_registry_line() {
        let line = format!(
            r#"{{"name":"foo","vers":"1.0.0","deps":[],"cksum":"{CKSUM}","features":{{}},"yanked":true}}"#
        );
        let record = parse(&line).unwrap();
        assert_eq!(record.name, "foo");
        assert_eq!(record.version, "1.0.0");
        assert_eq!(record.checksum.to_hex(), CKSUM);
        assert!(record.yanked);
        assert_eq!(record.artifact_file_name(), "foo-1.0.0.crate");
    }

    #[test]
    fn test_yanked_defaults_to_false() {
        let line = format!(r#"{{"name":"foo","vers":"1.0.0","cksum":"{CKSUM}"}}"#);
        assert!(!parse(&line).unwrap().yanked);
    }

    #[test]
    fn test_rejects_malformed_lines() {
        let err = parse("{not json").unwrap_err();
        assert!(err.to_string().contains("3/f/foo line 1"));
        assert!(parse(r#"{"name":"foo","vers":"1.0.0"}"#).is_err());

        let short = r#"{"name":"foo","vers":"1.0.0","cksum":"abcd"}"#;
        let err = parse(short).unwrap_err();
        assert!(matches!(
            err,
            Error::Index(IndexError::InvalidRecordField { ref field, .. }) if field == "cksum"
        ));
    }

    #[test]
    fn test_rejects_unsafe_names() {
        for (name, vers) in [("../evil", "1.0.0"), ("foo", "1/0"), (".hidden", "1.0.0")] {
            let line = format!(r#"{{"name":"{name}","vers":"{vers}","cksum":"{CKSUM}"}}"#);
            assert!(
                parse(&line).is_err(),
                "{name} {vers} accepted"
            );
        }
    }
}
