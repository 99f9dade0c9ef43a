//! # Library Registry Client
//!
//! The registry describes every library: its current version and the
//! platforms it supports. The publisher only needs
//! `GET <registry>/lib/info/<id>`, which answers with a JSON document of the
//! form:
//!
//! ```json
//! {
//!   "version": {"name": "1.0.3", "released": "2015-02-06 10:15:00"},
//!   "platforms": ["atmelavr", "teensy"],
//!   ...
//! }
//! ```
//!
//! The [`Registry`] trait is the seam used by the publisher; [`HttpRegistry`]
//! is the real client, built on a blocking `reqwest` client.

use crate::error::{Error, Result};
use crate::version::LibraryVersion;
use log::debug;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

/// What the publisher needs to know about a library.
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryInfo {
    pub version: LibraryVersion,
    pub platforms: Vec<String>,
}

#[derive(Deserialize)]
struct RawLibraryInfo {
    version: Value,
    #[serde(default)]
    platforms: Vec<String>,
}

impl LibraryInfo {
    /// Parse a `lib/info` response body.
    pub fn from_json(body: &str) -> Result<Self> {
        Self::from_raw(serde_json::from_str(body)?)
    }

    fn from_raw(raw: RawLibraryInfo) -> Result<Self> {
        Ok(Self {
            version: LibraryVersion::new(raw.version)?,
            platforms: raw.platforms,
        })
    }
}

/// Source of library metadata.
pub trait Registry {
    fn library_info(&self, library_id: u64) -> Result<LibraryInfo>;
}

/// Registry client speaking HTTP.
pub struct HttpRegistry {
    base_url: Url,
    client: reqwest::blocking::Client,
}

impl HttpRegistry {
    /// A client for the registry rooted at `base_url`.
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        // keep any path prefix when joining relative paths
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("pio-libbuild/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Registry {
                url: base_url.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self { base_url, client })
    }

    /// URL of the `lib/info` endpoint for a library.
    pub fn info_url(&self, library_id: u64) -> Result<Url> {
        Ok(self.base_url.join(&format!("lib/info/{}", library_id))?)
    }
}

impl Registry for HttpRegistry {
    fn library_info(&self, library_id: u64) -> Result<LibraryInfo> {
        let url = self.info_url(library_id)?;
        debug!("GET {}", url);

        let registry_error = |message: String| Error::Registry {
            url: url.to_string(),
            message,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| registry_error(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(registry_error(format!("HTTP status {}", status)));
        }
        let raw = response
            .json::<RawLibraryInfo>()
            .map_err(|e| registry_error(e.to_string()))?;

        LibraryInfo::from_raw(raw).map_err(|e| registry_error(e.to_string()))
    }
}
