//! Target host identity.
//!
//! # Responsibilities
//! - Validate that a host is an absolute `http`/`https` URL
//! - Preserve the string exactly as registered (it is used as a redirect prefix)

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use url::Url;

use crate::registry::RegistryError;

/// A validated target host, e.g. `https://tmpnb.example.org`.
///
/// The original string is kept verbatim; two hosts are the same key only if
/// their strings are identical.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Host(String);

impl Host {
    /// Parse and validate a host string.
    pub fn parse(raw: &str) -> Result<Self, RegistryError> {
        let url = Url::parse(raw).map_err(|e| {
            RegistryError::InvalidHost(format!("{raw}: {e}"))
        })?;

        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(RegistryError::InvalidHost(format!(
                    "{raw}: scheme must be http or https, got {other}"
                )))
            }
        }

        if url.host_str().map_or(true, str::is_empty) {
            return Err(RegistryError::InvalidHost(format!("{raw}: missing authority")));
        }

        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build a URL below this host by plain concatenation, e.g. `host + "/stats"`.
    pub fn join_path(&self, path: &str) -> String {
        format!("{}{}", self.0, path)
    }
}

impl FromStr for Host {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Host {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Host {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_http_and_https() {
        assert!(Host::parse("http://127.0.0.1:8000").is_ok());
        assert!(Host::parse("https://tmpnb.org").is_ok());
    }

    #[test]
    fn test_rejects_other_schemes() {
        assert!(matches!(Host::parse("ftp://x"), Err(RegistryError::InvalidHost(_))));
        assert!(matches!(Host::parse("tmpnb.org"), Err(RegistryError::InvalidHost(_))));
        assert!(matches!(Host::parse(""), Err(RegistryError::InvalidHost(_))));
    }

    #[test]
    fn test_preserves_original_text() {
        let host = Host::parse("https://TmpNB.org").unwrap();
        assert_eq!(host.as_str(), "https://TmpNB.org");
        assert_eq!(host.join_path("/stats"), "https://TmpNB.org/stats");
    }
}
