//! Default transfer options.
//!
//! [`CurlDefaults`] holds the values that fill every option a request did not
//! set explicitly. The stock values follow what a scraping client usually
//! wants: follow redirects (at most 5), send the referer along, give up after
//! 30 seconds, and do not verify the peer certificate.
//!
//! Defaults can be loaded from JSON. Missing fields keep their stock value:
//!
//! ```
//! use curl_request::config::CurlDefaults;
//!
//! let defaults = CurlDefaults::from_json(r#"{ "timeout": 5 }"#).unwrap();
//! assert_eq!(defaults.timeout, 5);
//! assert_eq!(defaults.connect_timeout, 30);
//! ```
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::CurlError;
use crate::options::{CurlOpt, CurlOptions};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurlDefaults {
    /// Follow `Location:` redirects
    pub follow_location: bool,
    /// Set the `Referer:` header automatically when following a redirect
    pub auto_referer: bool,
    /// Maximum number of redirects to follow
    pub max_redirects: i64,
    /// Seconds allowed for the connect phase
    pub connect_timeout: i64,
    /// Seconds allowed for the whole transfer
    pub timeout: i64,
    /// Verify the peer's TLS certificate
    pub ssl_verify_peer: bool,
}

impl Default for CurlDefaults {
    fn default() -> Self {
        Self {
            follow_location: true,
            auto_referer: true,
            max_redirects: 5,
            connect_timeout: 30,
            timeout: 30,
            ssl_verify_peer: false,
        }
    }
}

impl CurlDefaults {
    /// Parses defaults from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, CurlError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads defaults from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CurlError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    /// The defaults as an option map.
    pub fn to_options(&self) -> CurlOptions {
        let mut options = CurlOptions::new();
        options.set(CurlOpt::FollowLocation, self.follow_location);
        options.set(CurlOpt::AutoReferer, self.auto_referer);
        options.set(CurlOpt::MaxRedirs, self.max_redirects);
        options.set(CurlOpt::ConnectTimeout, self.connect_timeout);
        options.set(CurlOpt::Timeout, self.timeout);
        options.set(CurlOpt::SslVerifyPeer, self.ssl_verify_peer);
        options
    }
}
