//! Transfer metadata.
use std::time::Duration;

use curl::easy::{Easy2, Handler};
use serde::Serialize;

/// Metadata the engine reports for a finished transfer.
///
/// Timings are in seconds, measured from the start of the transfer. Fields the
/// engine could not report hold their zero value or `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransferInfo {
    /// Last effective URL (after redirects)
    pub url: Option<String>,
    /// Last received HTTP status, `0` when no response arrived
    pub http_code: u32,
    pub content_type: Option<String>,
    pub header_size: u64,
    pub request_size: u64,
    pub redirect_count: u32,
    /// Where the next redirect would have gone when redirects are not followed
    pub redirect_url: Option<String>,
    pub total_time: f64,
    pub namelookup_time: f64,
    pub connect_time: f64,
    pub pretransfer_time: f64,
    pub starttransfer_time: f64,
    pub redirect_time: f64,
    pub size_download: f64,
    pub download_content_length: f64,
    pub primary_ip: Option<String>,
    pub primary_port: u16,
}

impl TransferInfo {
    /// Reads the metadata of a handle after `perform`.
    pub fn from_easy<H: Handler>(easy: &mut Easy2<H>) -> Self {
        Self {
            url: owned(easy.effective_url()),
            http_code: easy.response_code().unwrap_or_default(),
            content_type: owned(easy.content_type()),
            header_size: easy.header_size().unwrap_or_default(),
            request_size: easy.request_size().unwrap_or_default(),
            redirect_count: easy.redirect_count().unwrap_or_default(),
            redirect_url: owned(easy.redirect_url()),
            total_time: secs(easy.total_time()),
            namelookup_time: secs(easy.namelookup_time()),
            connect_time: secs(easy.connect_time()),
            pretransfer_time: secs(easy.pretransfer_time()),
            starttransfer_time: secs(easy.starttransfer_time()),
            redirect_time: secs(easy.redirect_time()),
            size_download: easy.download_size().unwrap_or_default(),
            download_content_length: easy.content_length_download().unwrap_or_default(),
            primary_ip: owned(easy.primary_ip()),
            primary_port: easy.primary_port().unwrap_or_default(),
        }
    }

    /// Whether the status code, read as text, starts with `2`.
    ///
    /// This compares the leading digit only: `2` or `20` count as success
    /// just like `200` and `299` do.
    pub fn is_http_ok(&self) -> bool {
        self.http_code.to_string().starts_with('2')
    }
}

fn secs(d: Result<Duration, curl::Error>) -> f64 {
    d.map(|d| d.as_secs_f64()).unwrap_or_default()
}

fn owned(s: Result<Option<&str>, curl::Error>) -> Option<String> {
    s.ok().flatten().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_code(code: u32) -> TransferInfo {
        TransferInfo {
            http_code: code,
            ..Default::default()
        }
    }

    #[test]
    fn leading_two_is_ok() {
        assert!(with_code(200).is_http_ok());
        assert!(with_code(204).is_http_ok());
        assert!(with_code(299).is_http_ok());
    }

    #[test]
    fn other_codes_are_not_ok() {
        assert!(!with_code(0).is_http_ok());
        assert!(!with_code(301).is_http_ok());
        assert!(!with_code(404).is_http_ok());
        assert!(!with_code(500).is_http_ok());
    }

    #[test]
    fn prefix_semantics_not_range() {
        // Not a 200..=299 check
        assert!(with_code(2).is_http_ok());
        assert!(with_code(2000).is_http_ok());
    }

    #[test]
    fn serializes_like_an_info_array() {
        let info = TransferInfo {
            url: Some("http://a.test/".into()),
            http_code: 200,
            ..Default::default()
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["http_code"], 200);
        assert_eq!(json["url"], "http://a.test/");
        assert!(json["content_type"].is_null());
    }

    #[test]
    fn unperformed_handle_reports_zero_values() {
        let mut easy = Easy2::new(crate::collector::Collector::default());
        let info = TransferInfo::from_easy(&mut easy);
        assert_eq!(info.http_code, 0);
        assert!(!info.is_http_ok());
    }
}
