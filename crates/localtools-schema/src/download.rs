//! Remote artifacts and how they are stored in the download cache.

use serde::{Deserialize, Serialize};

/// A remote artifact together with the file name it is cached under.
///
/// The cache key must be unique per distinct artifact content, so it
/// normally embeds the package version and platform (e.g.
/// `node-v18.16.0-linux-x64.tar.xz`). Two specs sharing a key share a cache
/// entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DownloadSpec {
    /// Where to fetch the artifact from.
    pub url: String,
    /// File name of the artifact inside the cache directory.
    pub cache_key: String,
}

impl DownloadSpec {
    /// Create a spec from a URL and cache key.
    pub fn new(url: impl Into<String>, cache_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            cache_key: cache_key.into(),
        }
    }
}

/// Compression applied to a tar archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TarCompression {
    /// `.tar.gz` / `.tgz`
    Gzip,
    /// `.tar.xz`
    Xz,
}

impl TarCompression {
    /// Short name used in log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Xz => "xz",
        }
    }
}

impl std::fmt::Display for TarCompression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_serializes_with_snake_case_fields() {
        let spec = DownloadSpec::new("https://x/t-v1", "t-v1");
        let json = serde_json::to_string(&spec).unwrap();
        assert_eq!(json, r#"{"url":"https://x/t-v1","cache_key":"t-v1"}"#);
    }
}
