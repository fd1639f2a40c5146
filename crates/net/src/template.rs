//! Download URL templates
//!
//! A registry publishes its artifact location as a template. The markers
//! `{crate}`, `{version}`, `{prefix}`, `{lowerprefix}` and `{sha256-checksum}`
//! are substituted per record; a template with no marker is a base URL that
//! gets `/{crate}/{version}/download` appended.

use cmirror_config::constants::DEFAULT_DOWNLOAD_URL;
use cmirror_errors::{Error, NetworkError};
use cmirror_hash::Hash;
use cmirror_types::PackageId;

const MARKERS: [&str; 5] = [
    "{crate}",
    "{version}",
    "{prefix}",
    "{lowerprefix}",
    "{sha256-checksum}",
];

/// Resolved download location for artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTemplate {
    template: String,
}

impl DownloadTemplate {
    /// Parse a template or base URL
    ///
    /// # Errors
    ///
    /// Returns an error if the template, once expanded for a sample record,
    /// is not an absolute URL.
    pub fn parse(template: &str) -> Result<Self, Error> {
        let template = if MARKERS.iter().any(|marker| template.contains(marker)) {
            template.to_string()
        } else {
            format!("{}/{{crate}}/{{version}}/download", template.trim_end_matches('/'))
        };

        let parsed = Self { template };
        let sample = parsed.url_for(&PackageId::new("sample", "0.0.0"), &Hash::from_data(b""));
        url::Url::parse(&sample)
            .map_err(|e| NetworkError::InvalidUrl(format!("{}: {e}", parsed.template)))?;
        Ok(parsed)
    }

    /// Choose the template for a mirror
    ///
    /// An explicitly configured template wins over the one published in the
    /// index, which wins over the public registry default.
    ///
    /// # Errors
    ///
    /// Returns an error if the chosen template is not a valid URL.
    pub fn resolve(configured: Option<&str>, published: Option<&str>) -> Result<Self, Error> {
        Self::parse(configured.or(published).unwrap_or(DEFAULT_DOWNLOAD_URL))
    }

    /// Expanded URL for one record
    #[must_use]
    pub fn url_for(&self, id: &PackageId, checksum: &Hash) -> String {
        let prefix = index_prefix(&id.name);
        self.template
            .replace("{crate}", &id.name)
            .replace("{version}", &id.version)
            .replace("{lowerprefix}", &prefix.to_lowercase())
            .replace("{prefix}", &prefix)
            .replace("{sha256-checksum}", &checksum.to_hex())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.template
    }
}

/// Directory prefix of a package in the index tree
///
/// `a` → `1`, `ab` → `2`, `abc` → `3/a`, `serde` → `se/rd`
#[must_use]
pub fn index_prefix(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    match chars.len() {
        0 => String::new(),
        1 => "1".to_string(),
        2 => "2".to_string(),
        3 => format!("3/{}", chars[0]),
        _ => format!(
            "{}/{}",
            chars[..2].iter().collect::<String>(),
            chars[2..4].iter().collect::<String>()
        ),
    }
}
